//! Password hashing

use medora_common::MedoraError;

use crate::model::MAX_PASSWORD_LENGTH;

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    validate_password(password)?;
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify a password against a stored hash; malformed hashes never match
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn validate_password(password: &str) -> Result<(), MedoraError> {
    if password.is_empty() {
        return Err(MedoraError::ValidationFailed(
            "password must not be empty".to_string(),
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(MedoraError::ValidationFailed(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!", 4).unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("").is_err());
        assert!(validate_password(&"a".repeat(73)).is_err());
        assert!(validate_password(&"a".repeat(72)).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn any_accepted_password_verifies(password in "[ -~]{1,72}") {
            let hash = hash_password(&password, 4).unwrap();
            prop_assert!(verify_password(&password, &hash));
        }
    }
}

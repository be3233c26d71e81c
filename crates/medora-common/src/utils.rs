//! Utility functions for Medora

/// Returns true when the string is empty or whitespace only
///
/// # Examples
///
/// ```
/// use medora_common::is_blank;
///
/// assert!(is_blank(""));
/// assert!(is_blank("  \t"));
/// assert!(!is_blank("a@x.com"));
/// ```
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Canonical form of an email used as the identity store key.
///
/// Identity lookups are case-insensitive, so keys are trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use medora_common::normalize_email;
///
/// assert_eq!(normalize_email(" Admin@Example.COM "), "admin@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" "));
        assert!(!is_blank(" x "));
    }

    proptest! {
        #[test]
        fn normalize_email_is_idempotent(s in "[ a-zA-Z0-9@._-]{0,40}") {
            let once = normalize_email(&s);
            prop_assert_eq!(normalize_email(&once), once.clone());
            prop_assert_eq!(once.trim(), once.as_str());
        }
    }
}

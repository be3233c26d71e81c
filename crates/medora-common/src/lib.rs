//! Medora Common - Shared error types and helpers
//!
//! This crate provides the foundational types used across all Medora components:
//! - Error types and error codes
//! - Role labels shared by the identity store and the auth layer
//! - Small string helpers

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, MedoraError, medora_error};
pub use utils::{is_blank, normalize_email};

/// Role held by hospital administrators
pub const ROLE_ADMIN: &str = "admin";

/// Role held by doctors
pub const ROLE_DOCTOR: &str = "doctor";

/// Role held by patients
pub const ROLE_PATIENT: &str = "patient";

/// All role labels known to the identity store
pub const ALL_ROLES: [&str; 3] = [ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        assert_eq!(ROLE_ADMIN, "admin");
        assert_eq!(ROLE_DOCTOR, "doctor");
        assert_eq!(ROLE_PATIENT, "patient");
        assert_eq!(ALL_ROLES.len(), 3);
    }
}

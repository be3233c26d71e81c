//! Error types and error codes for Medora
//!
//! This module defines:
//! - `MedoraError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MedoraError {
    #[error("{0} not found.")]
    NotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("{0} already exists.")]
    AlreadyExists(String),

    #[error("Doctor with ID {doctor_id} has no email associated.")]
    MissingContactInfo { doctor_id: i32 },

    #[error("Failed to remove roles for user {email}: {detail}")]
    RoleRevocationFailed { email: String, detail: String },

    #[error("Failed to delete user {email}: {detail}")]
    IdentityDeletionFailed { email: String, detail: String },

    #[error("{0} was modified concurrently, reload and retry.")]
    ConcurrencyConflict(String),

    #[error("Invalid appointment status '{0}'.")]
    InvalidStatus(String),

    #[error("{0} still has dependent records.")]
    HasDependents(String),

    #[error("authentication error: {0}")]
    AuthError(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl MedoraError {
    /// Machine-checkable category name, returned in failure bodies
    pub fn category(&self) -> &'static str {
        match self {
            MedoraError::NotFound(_) => "NotFound",
            MedoraError::ValidationFailed(_) => "ValidationFailed",
            MedoraError::AlreadyExists(_) => "AlreadyExists",
            MedoraError::MissingContactInfo { .. } => "MissingContactInfo",
            MedoraError::RoleRevocationFailed { .. } => "RoleRevocationFailed",
            MedoraError::IdentityDeletionFailed { .. } => "IdentityDeletionFailed",
            MedoraError::ConcurrencyConflict(_) => "ConcurrencyConflict",
            MedoraError::InvalidStatus(_) => "InvalidStatus",
            MedoraError::HasDependents(_) => "HasDependents",
            MedoraError::AuthError(_) => "AuthError",
            MedoraError::AccessDenied(_) => "AccessDenied",
            MedoraError::DatabaseError(_) => "DatabaseError",
            MedoraError::InternalError(_) => "InternalError",
        }
    }

    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            MedoraError::NotFound(_) => RESOURCE_NOT_FOUND,
            MedoraError::ValidationFailed(_) => PARAMETER_VALIDATE_ERROR,
            MedoraError::AlreadyExists(_) => RESOURCE_CONFLICT,
            MedoraError::MissingContactInfo { .. } => MISSING_CONTACT_INFO,
            MedoraError::RoleRevocationFailed { .. } => ROLE_REVOCATION_FAILED,
            MedoraError::IdentityDeletionFailed { .. } => IDENTITY_DELETION_FAILED,
            MedoraError::ConcurrencyConflict(_) => CONCURRENCY_CONFLICT,
            MedoraError::InvalidStatus(_) => INVALID_STATUS,
            MedoraError::HasDependents(_) => HAS_DEPENDENTS,
            MedoraError::AuthError(_) | MedoraError::AccessDenied(_) => ACCESS_DENIED,
            MedoraError::DatabaseError(_) => DATA_ACCESS_ERROR,
            MedoraError::InternalError(_) => SERVER_ERROR,
        }
    }

    pub fn not_found(resource: impl Display, id: impl Display) -> Self {
        MedoraError::NotFound(format!("{} {}", resource, id))
    }
}

/// Returns the `MedoraError` carried by an `anyhow::Error`, if any
pub fn medora_error(err: &anyhow::Error) -> Option<&MedoraError> {
    err.downcast_ref::<MedoraError>()
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

// General success and error codes
pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const MEDIA_TYPE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20003,
    message: "MediaType Error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

// Cascade and consistency errors
pub const MISSING_CONTACT_INFO: ErrorCode<'static> = ErrorCode {
    code: 24001,
    message: "dependent record has no contact email",
};

pub const ROLE_REVOCATION_FAILED: ErrorCode<'static> = ErrorCode {
    code: 24002,
    message: "identity store rejected role revocation",
};

pub const IDENTITY_DELETION_FAILED: ErrorCode<'static> = ErrorCode {
    code: 24003,
    message: "identity store rejected account deletion",
};

pub const CONCURRENCY_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 24004,
    message: "concurrent modification",
};

pub const INVALID_STATUS: ErrorCode<'static> = ErrorCode {
    code: 24005,
    message: "invalid appointment status",
};

pub const HAS_DEPENDENTS: ErrorCode<'static> = ErrorCode {
    code: 24006,
    message: "record still has dependents",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medora_error_display() {
        let err = MedoraError::MissingContactInfo { doctor_id: 7 };
        assert_eq!(err.to_string(), "Doctor with ID 7 has no email associated.");

        let err = MedoraError::not_found("Department", 3);
        assert_eq!(err.to_string(), "Department 3 not found.");

        let err = MedoraError::RoleRevocationFailed {
            email: "a@x.com".to_string(),
            detail: "locked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to remove roles for user a@x.com: locked"
        );
    }

    #[test]
    fn test_category_and_code() {
        let err = MedoraError::InvalidStatus("Pending".to_string());
        assert_eq!(err.category(), "InvalidStatus");
        assert_eq!(err.error_code(), INVALID_STATUS);

        let err = MedoraError::ConcurrencyConflict("Hospital 1".to_string());
        assert_eq!(err.category(), "ConcurrencyConflict");
        assert_eq!(err.error_code().code, 24004);
    }

    #[test]
    fn test_error_code_constants() {
        assert_eq!(SUCCESS.code, 0);
        assert_eq!(SUCCESS.message, "success");
        assert_eq!(RESOURCE_NOT_FOUND.code, 20004);
        assert_eq!(ACCESS_DENIED.code, 10001);
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = MedoraError::HasDependents("Hospital 2".to_string()).into();
        assert_eq!(
            medora_error(&err),
            Some(&MedoraError::HasDependents("Hospital 2".to_string()))
        );
        assert!(medora_error(&anyhow::anyhow!("plain")).is_none());
    }
}

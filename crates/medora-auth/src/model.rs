//! Authentication and authorization models
//!
//! This file defines request context, JWT payload and login result types

use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

pub use medora_common::{ALL_ROLES, ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT};

// Auth configuration keys
pub const AUTH_ENABLED: &str = "medora.auth.enabled";
pub const TOKEN_SECRET_KEY: &str = "medora.auth.token.secret.key";
pub const TOKEN_EXPIRE_SECONDS: &str = "medora.auth.token.expire.seconds";
pub const DEFAULT_TOKEN_EXPIRE_SECONDS: i64 = 18000;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ACCESS_TOKEN: &str = "accessToken";
pub const TOKEN_PREFIX: &str = "Bearer ";

/// bcrypt ignores input beyond 72 bytes
pub const MAX_PASSWORD_LENGTH: usize = 72;
pub const USER_NOT_FOUND_MESSAGE: &str = "Invalid email or password.";

/// JWT payload for Medora authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPayload {
    /// Account email
    pub sub: String,
    pub exp: i64,
}

/// Auth context passed through request extensions
#[derive(Debug, Default, Clone)]
pub struct AuthContext {
    pub email: String,
    pub jwt_error: Option<jsonwebtoken::errors::Error>,
    pub token_provided: bool,
}

impl AuthContext {
    pub fn jwt_error_string(&self) -> String {
        if let Some(e) = &self.jwt_error {
            match e.kind() {
                ErrorKind::ExpiredSignature => "token expired!".to_string(),
                _ => e.to_string(),
            }
        } else {
            String::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_provided && self.jwt_error.is_none() && !self.email.is_empty()
    }
}

/// Successful login response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub token_ttl: i64,
    pub email: String,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_default_is_anonymous() {
        let ctx = AuthContext::default();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.jwt_error_string(), "");
    }

    #[test]
    fn test_expired_error_message() {
        let ctx = AuthContext {
            email: "a@x.com".to_string(),
            jwt_error: Some(ErrorKind::ExpiredSignature.into()),
            token_provided: true,
        };
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.jwt_error_string(), "token expired!");
    }
}

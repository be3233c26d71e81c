//! Account authentication and role resolution
//!
//! Roles are always read from the identity store at check time, so removing
//! an account or its roles takes effect for tokens that are still valid.

use medora_common::MedoraError;
use medora_persistence::{AccountInfo, AccountRef, IdentityPersistence};

use crate::model::USER_NOT_FOUND_MESSAGE;
use crate::service::password::verify_password;

/// An account whose password was verified
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: AccountInfo,
    pub roles: Vec<String>,
}

/// Verify credentials against the identity store
pub async fn authenticate(
    identity: &dyn IdentityPersistence,
    email: &str,
    password: &str,
) -> anyhow::Result<AuthenticatedAccount> {
    let Some(account_ref) = AccountRef::from_email(email) else {
        return Err(MedoraError::AuthError(USER_NOT_FOUND_MESSAGE.to_string()).into());
    };

    let account = match identity.account_find_by_email(&account_ref).await? {
        Some(account) if account.enabled && verify_password(password, &account.password_hash) => {
            account
        }
        _ => {
            tracing::info!(email = %account_ref, "login rejected");
            return Err(MedoraError::AuthError(USER_NOT_FOUND_MESSAGE.to_string()).into());
        }
    };

    let roles = identity.account_roles(&account).await?;
    Ok(AuthenticatedAccount { account, roles })
}

/// Roles currently held by the account behind `email`, empty when it has none
pub async fn resolve_roles(
    identity: &dyn IdentityPersistence,
    email: &str,
) -> anyhow::Result<Vec<String>> {
    let Some(account_ref) = AccountRef::from_email(email) else {
        return Ok(Vec::new());
    };
    match identity.account_find_by_email(&account_ref).await? {
        Some(account) if account.enabled => identity.account_roles(&account).await,
        _ => Ok(Vec::new()),
    }
}

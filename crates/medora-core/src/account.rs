//! Identity account provisioning
//!
//! Entity rows that carry an email get a matching identity account. The row is
//! written first; if the account cannot be created the row is removed again.

use medora_auth::service::password::hash_password;
use medora_common::{MedoraError, ROLE_ADMIN};
use medora_persistence::{AccountRef, EntityPersistence, IdentityPersistence, NewAdmin};

/// Password hashing settings for new accounts
#[derive(Debug, Clone, Copy)]
pub struct AccountSettings {
    pub bcrypt_cost: u32,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt_default_cost(),
        }
    }
}

fn bcrypt_default_cost() -> u32 {
    10
}

/// Parse a contact email into an account reference, rejecting blanks
pub fn require_account_ref(email: &str) -> Result<AccountRef, MedoraError> {
    AccountRef::from_email(email)
        .ok_or_else(|| MedoraError::ValidationFailed("email must not be blank".to_string()))
}

/// Fails with `AlreadyExists` when an account already uses the email
pub async fn ensure_email_available(
    identity: &dyn IdentityPersistence,
    account: &AccountRef,
) -> anyhow::Result<()> {
    if identity.account_find_by_email(account).await?.is_some() {
        return Err(MedoraError::AlreadyExists(format!("Account {}", account)).into());
    }
    Ok(())
}

/// Create an account holding exactly `role`
pub async fn provision_account(
    identity: &dyn IdentityPersistence,
    settings: AccountSettings,
    account: &AccountRef,
    password: &str,
    role: &str,
) -> anyhow::Result<()> {
    let hash = hash_password(password, settings.bcrypt_cost)?;
    let result = identity
        .account_create(account, &hash, &[role.to_string()])
        .await?;

    if !result.succeeded {
        if result.errors.iter().any(|e| e.code == "DuplicateEmail") {
            return Err(MedoraError::AlreadyExists(format!("Account {}", account)).into());
        }
        return Err(MedoraError::ValidationFailed(result.describe()).into());
    }

    tracing::info!(email = %account, role, "identity account created");
    Ok(())
}

/// Run `compensate` after a failed account creation and return the original error
pub async fn compensate_on_error<F, Fut>(
    outcome: anyhow::Result<()>,
    resource: &str,
    id: i32,
    compensate: F,
) -> anyhow::Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    let Err(err) = outcome else {
        return Ok(());
    };
    match compensate().await {
        Ok(_) => tracing::warn!(resource, id, error = %err, "account creation failed, row removed"),
        Err(undo) => tracing::error!(
            resource,
            id,
            error = %err,
            undo_error = %undo,
            "account creation failed and row could not be removed"
        ),
    }
    Err(err)
}

/// Create the configured admin when no account holds the admin role yet.
///
/// Returns whether an admin was created.
pub async fn bootstrap_admin(
    entities: &dyn EntityPersistence,
    identity: &dyn IdentityPersistence,
    settings: AccountSettings,
    email: &str,
    password: &str,
) -> anyhow::Result<bool> {
    if identity.account_exists_with_role(ROLE_ADMIN).await? {
        return Ok(false);
    }
    let account = require_account_ref(email)?;

    match identity.account_find_by_email(&account).await? {
        Some(existing) => {
            identity
                .account_add_roles(&existing, &[ROLE_ADMIN.to_string()])
                .await?;
        }
        None => provision_account(identity, settings, &account, password, ROLE_ADMIN).await?,
    }
    if entities.admin_find_by_email(account.email()).await?.is_none() {
        entities
            .admin_create(NewAdmin {
                name: "Administrator".to_string(),
                email: account.email().to_string(),
            })
            .await?;
    }

    tracing::info!(email = %account, "bootstrap admin created");
    Ok(true)
}

//! Identity persistence trait
//!
//! Accounts and role assignments keyed by email. Mutations report failures
//! through `IdentityResult` instead of an `Err`, which is reserved for
//! storage faults.

use async_trait::async_trait;

use crate::model::{AccountInfo, AccountRef, IdentityResult};

#[async_trait]
pub trait IdentityPersistence: Send + Sync {
    /// Find an account by its email, case-insensitively
    async fn account_find_by_email(
        &self,
        account: &AccountRef,
    ) -> anyhow::Result<Option<AccountInfo>>;

    /// Create an account holding `roles`. A taken email fails with code `DuplicateEmail`.
    async fn account_create(
        &self,
        account: &AccountRef,
        password_hash: &str,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult>;

    async fn account_roles(&self, account: &AccountInfo) -> anyhow::Result<Vec<String>>;

    async fn account_add_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult>;

    async fn account_remove_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult>;

    async fn account_delete(&self, account: &AccountInfo) -> anyhow::Result<IdentityResult>;

    /// Whether any account holds `role`
    async fn account_exists_with_role(&self, role: &str) -> anyhow::Result<bool>;
}

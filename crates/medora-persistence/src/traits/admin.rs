//! Admin persistence trait

use async_trait::async_trait;

use crate::model::{AdminChanges, AdminInfo, NewAdmin, UpdateOutcome};

#[async_trait]
pub trait AdminPersistence: Send + Sync {
    async fn admin_find_all(&self) -> anyhow::Result<Vec<AdminInfo>>;

    async fn admin_find_by_id(&self, id: i32) -> anyhow::Result<Option<AdminInfo>>;

    async fn admin_find_by_email(&self, email: &str) -> anyhow::Result<Option<AdminInfo>>;

    async fn admin_create(&self, admin: NewAdmin) -> anyhow::Result<AdminInfo>;

    async fn admin_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AdminChanges,
    ) -> anyhow::Result<UpdateOutcome<AdminInfo>>;

    /// Returns `false` when the admin does not exist
    async fn admin_delete(&self, id: i32) -> anyhow::Result<bool>;
}

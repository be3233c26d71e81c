//! Department persistence trait

use async_trait::async_trait;

use crate::model::{DepartmentChanges, DepartmentInfo, NewDepartment, UpdateOutcome};

#[async_trait]
pub trait DepartmentPersistence: Send + Sync {
    async fn department_find_all(&self) -> anyhow::Result<Vec<DepartmentInfo>>;

    async fn department_find_by_id(&self, id: i32) -> anyhow::Result<Option<DepartmentInfo>>;

    async fn department_find_by_hospital(
        &self,
        hospital_id: i32,
    ) -> anyhow::Result<Vec<DepartmentInfo>>;

    async fn department_exists(&self, id: i32) -> anyhow::Result<bool>;

    async fn department_create(&self, department: NewDepartment)
    -> anyhow::Result<DepartmentInfo>;

    async fn department_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DepartmentChanges,
    ) -> anyhow::Result<UpdateOutcome<DepartmentInfo>>;

    /// Delete a department together with its doctors, their appointments and
    /// treatment records in one transaction, using set-based deletes.
    ///
    /// Returns `false` when the department does not exist.
    async fn department_delete_cascade(&self, id: i32) -> anyhow::Result<bool>;
}

//! Doctor persistence trait

use async_trait::async_trait;

use crate::model::{DoctorChanges, DoctorInfo, NewDoctor, UpdateOutcome};

#[async_trait]
pub trait DoctorPersistence: Send + Sync {
    async fn doctor_find_all(&self) -> anyhow::Result<Vec<DoctorInfo>>;

    async fn doctor_find_by_id(&self, id: i32) -> anyhow::Result<Option<DoctorInfo>>;

    async fn doctor_find_by_department(&self, department_id: i32)
    -> anyhow::Result<Vec<DoctorInfo>>;

    async fn doctor_exists(&self, id: i32) -> anyhow::Result<bool>;

    async fn doctor_create(&self, doctor: NewDoctor) -> anyhow::Result<DoctorInfo>;

    async fn doctor_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DoctorChanges,
    ) -> anyhow::Result<UpdateOutcome<DoctorInfo>>;

    /// Delete a doctor with its appointments and treatment records in one transaction.
    ///
    /// Returns `false` when the doctor does not exist.
    async fn doctor_delete_cascade(&self, id: i32) -> anyhow::Result<bool>;
}

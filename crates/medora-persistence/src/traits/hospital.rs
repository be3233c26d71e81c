//! Hospital persistence trait

use async_trait::async_trait;

use crate::model::{HospitalChanges, HospitalInfo, NewHospital, UpdateOutcome};

#[async_trait]
pub trait HospitalPersistence: Send + Sync {
    async fn hospital_find_all(&self) -> anyhow::Result<Vec<HospitalInfo>>;

    async fn hospital_find_by_id(&self, id: i32) -> anyhow::Result<Option<HospitalInfo>>;

    async fn hospital_exists(&self, id: i32) -> anyhow::Result<bool>;

    async fn hospital_create(&self, hospital: NewHospital) -> anyhow::Result<HospitalInfo>;

    /// Apply `changes` only if the row still carries `expected_version`
    async fn hospital_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: HospitalChanges,
    ) -> anyhow::Result<UpdateOutcome<HospitalInfo>>;

    /// Delete a hospital that no department references.
    ///
    /// Fails with `MedoraError::HasDependents` when departments exist.
    /// Returns `false` when the hospital does not exist.
    async fn hospital_delete(&self, id: i32) -> anyhow::Result<bool>;
}

//! Patient persistence trait

use async_trait::async_trait;

use crate::model::{NewPatient, PatientInfo};

#[async_trait]
pub trait PatientPersistence: Send + Sync {
    async fn patient_find_all(&self) -> anyhow::Result<Vec<PatientInfo>>;

    async fn patient_find_by_id(&self, id: i32) -> anyhow::Result<Option<PatientInfo>>;

    async fn patient_find_by_email(&self, email: &str) -> anyhow::Result<Option<PatientInfo>>;

    async fn patient_exists(&self, id: i32) -> anyhow::Result<bool>;

    async fn patient_create(&self, patient: NewPatient) -> anyhow::Result<PatientInfo>;

    /// Delete a patient with its appointments. Returns `false` when absent.
    async fn patient_delete(&self, id: i32) -> anyhow::Result<bool>;
}

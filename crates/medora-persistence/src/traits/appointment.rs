//! Appointment and treatment record persistence trait

use async_trait::async_trait;

use crate::model::{
    AppointmentChanges, AppointmentInfo, NewAppointment, NewTreatmentRecord, TreatmentRecordInfo,
    UpdateOutcome,
};

#[async_trait]
pub trait AppointmentPersistence: Send + Sync {
    // ==================== Appointment Operations ====================

    async fn appointment_find_all(&self) -> anyhow::Result<Vec<AppointmentInfo>>;

    async fn appointment_find_by_id(&self, id: i32) -> anyhow::Result<Option<AppointmentInfo>>;

    async fn appointment_find_by_doctor(&self, doctor_id: i32)
    -> anyhow::Result<Vec<AppointmentInfo>>;

    async fn appointment_find_by_patient(
        &self,
        patient_id: i32,
    ) -> anyhow::Result<Vec<AppointmentInfo>>;

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
    ) -> anyhow::Result<AppointmentInfo>;

    async fn appointment_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AppointmentChanges,
    ) -> anyhow::Result<UpdateOutcome<AppointmentInfo>>;

    /// Delete an appointment and its treatment record, if any, in one transaction.
    ///
    /// Returns `false` when the appointment does not exist.
    async fn appointment_delete(&self, id: i32) -> anyhow::Result<bool>;

    // ==================== Treatment Record Operations ====================

    async fn treatment_record_find_by_appointment(
        &self,
        appointment_id: i32,
    ) -> anyhow::Result<Option<TreatmentRecordInfo>>;

    /// Insert a record and link the appointment to it.
    ///
    /// Fails with `MedoraError::NotFound` when the appointment is gone and
    /// with `MedoraError::AlreadyExists` when it already has a record.
    async fn treatment_record_create(
        &self,
        record: NewTreatmentRecord,
    ) -> anyhow::Result<TreatmentRecordInfo>;
}

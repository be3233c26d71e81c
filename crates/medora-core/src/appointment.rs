//! Appointments, status transitions and treatment records

use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use medora_common::MedoraError;
use medora_persistence::{
    AppointmentChanges, AppointmentInfo, AppointmentStatus, EntityPersistence, NewAppointment,
    NewTreatmentRecord, TreatmentRecordInfo,
};

use crate::guard::update_guarded;
use crate::require_text;

/// A status as sent by clients: a numeric code or a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(i64),
    Name(String),
}

impl Display for StatusValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusValue::Code(code) => write!(f, "{}", code),
            StatusValue::Name(name) => f.write_str(name),
        }
    }
}

impl From<AppointmentStatus> for StatusValue {
    fn from(status: AppointmentStatus) -> Self {
        StatusValue::Name(status.as_str().to_string())
    }
}

/// Accepts the four known statuses by name (any case) or code 0..=3
pub fn validate_status(value: &StatusValue) -> Result<AppointmentStatus, MedoraError> {
    let status = match value {
        StatusValue::Code(code) => AppointmentStatus::from_code(*code),
        StatusValue::Name(name) => AppointmentStatus::parse(name),
    };
    status.ok_or_else(|| MedoraError::InvalidStatus(value.to_string()))
}

/// Client-supplied appointment fields, used for both create and full update
#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: Option<StatusValue>,
}

/// Appointment joined with the display names of its patient and doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: i32,
    pub patient_id: i32,
    pub patient_name: String,
    pub doctor_id: i32,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub treatment_record_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

async fn require_participants(
    entities: &dyn EntityPersistence,
    patient_id: i32,
    doctor_id: i32,
) -> anyhow::Result<()> {
    if !entities.patient_exists(patient_id).await? {
        return Err(MedoraError::not_found("Patient", patient_id).into());
    }
    if !entities.doctor_exists(doctor_id).await? {
        return Err(MedoraError::not_found("Doctor", doctor_id).into());
    }
    Ok(())
}

/// Book an appointment; the status defaults to `Scheduled`
pub async fn create_appointment(
    entities: &dyn EntityPersistence,
    draft: AppointmentDraft,
) -> anyhow::Result<AppointmentInfo> {
    let status = match &draft.status {
        Some(value) => validate_status(value)?,
        None => AppointmentStatus::Scheduled,
    };
    require_text("reason", &draft.reason)?;
    require_participants(entities, draft.patient_id, draft.doctor_id).await?;

    let created = entities
        .appointment_create(NewAppointment {
            patient_id: draft.patient_id,
            doctor_id: draft.doctor_id,
            date: draft.date,
            time: draft.time,
            reason: draft.reason,
            status,
        })
        .await?;
    tracing::info!(id = created.id, doctor_id = created.doctor_id, "appointment created");
    Ok(created)
}

/// Replace every client-owned field. A missing status keeps the stored one.
pub async fn update_appointment(
    entities: &dyn EntityPersistence,
    id: i32,
    draft: AppointmentDraft,
) -> anyhow::Result<AppointmentInfo> {
    let status = draft.status.as_ref().map(validate_status).transpose()?;
    require_text("reason", &draft.reason)?;

    update_guarded(
        "Appointment",
        id,
        || entities.appointment_find_by_id(id),
        move |current: AppointmentInfo| async move {
            require_participants(entities, draft.patient_id, draft.doctor_id).await?;
            let changes = AppointmentChanges {
                patient_id: Some(draft.patient_id),
                doctor_id: Some(draft.doctor_id),
                date: Some(draft.date),
                time: Some(draft.time),
                reason: Some(draft.reason),
                status,
            };
            entities
                .appointment_update(id, current.version, changes)
                .await
        },
    )
    .await
}

/// Overwrite the status. Invalid values are rejected before the row is read.
pub async fn update_status(
    entities: &dyn EntityPersistence,
    id: i32,
    value: &StatusValue,
) -> anyhow::Result<AppointmentInfo> {
    let status = validate_status(value)?;

    let updated = update_guarded(
        "Appointment",
        id,
        || entities.appointment_find_by_id(id),
        move |current: AppointmentInfo| {
            entities.appointment_update(id, current.version, AppointmentChanges::status(status))
        },
    )
    .await?;
    tracing::info!(id, status = %status, "appointment status changed");
    Ok(updated)
}

/// Delete the appointment together with its treatment record
pub async fn delete_appointment(entities: &dyn EntityPersistence, id: i32) -> anyhow::Result<()> {
    if !entities.appointment_delete(id).await? {
        return Err(MedoraError::not_found("Appointment", id).into());
    }
    tracing::info!(id, "appointment deleted");
    Ok(())
}

pub async fn find_appointment(
    entities: &dyn EntityPersistence,
    id: i32,
) -> anyhow::Result<AppointmentInfo> {
    entities
        .appointment_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Appointment", id).into())
}

pub async fn submit_treatment(
    entities: &dyn EntityPersistence,
    record: NewTreatmentRecord,
) -> anyhow::Result<TreatmentRecordInfo> {
    require_text("diagnosis", &record.diagnosis)?;
    require_text("treatment", &record.treatment)?;

    let created = entities.treatment_record_create(record).await?;
    tracing::info!(
        id = created.id,
        appointment_id = created.appointment_id,
        "treatment record submitted"
    );
    Ok(created)
}

/// The record of an appointment; `NotFound` when either is missing
pub async fn find_treatment(
    entities: &dyn EntityPersistence,
    appointment_id: i32,
) -> anyhow::Result<TreatmentRecordInfo> {
    find_appointment(entities, appointment_id).await?;
    entities
        .treatment_record_find_by_appointment(appointment_id)
        .await?
        .ok_or_else(|| {
            MedoraError::NotFound(format!(
                "Treatment record for appointment {}",
                appointment_id
            ))
            .into()
        })
}

/// Attach patient and doctor names. Participants that vanished render as empty names.
pub async fn appointment_views(
    entities: &dyn EntityPersistence,
    appointments: Vec<AppointmentInfo>,
) -> anyhow::Result<Vec<AppointmentView>> {
    let mut views = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        let patient_name = entities
            .patient_find_by_id(appointment.patient_id)
            .await?
            .map(|p| format!("{} {}", p.first_name, p.last_name))
            .unwrap_or_default();
        let doctor_name = entities
            .doctor_find_by_id(appointment.doctor_id)
            .await?
            .map(|d| d.name)
            .unwrap_or_default();

        views.push(AppointmentView {
            id: appointment.id,
            patient_id: appointment.patient_id,
            patient_name,
            doctor_id: appointment.doctor_id,
            doctor_name,
            date: appointment.date,
            time: appointment.time,
            reason: appointment.reason,
            status: appointment.status,
            treatment_record_id: appointment.treatment_record_id,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        });
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medora_persistence::AppointmentPersistence;
    use crate::testing::*;

    async fn booked() -> (medora_persistence::MemoryPersistService, AppointmentInfo) {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let doctor = seed_doctor(&store, &department, "a@x.com").await;
        let appointment = seed_appointment(&store, &doctor).await;
        (store, appointment)
    }

    fn record(appointment_id: i32) -> NewTreatmentRecord {
        NewTreatmentRecord {
            appointment_id,
            diagnosis: "Flu".to_string(),
            treatment: "Rest".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_status() {
        assert_eq!(
            validate_status(&StatusValue::Name("confirmed".to_string())),
            Ok(AppointmentStatus::Confirmed)
        );
        assert_eq!(
            validate_status(&StatusValue::Code(3)),
            Ok(AppointmentStatus::Cancelled)
        );
        assert_eq!(
            validate_status(&StatusValue::Code(4)),
            Err(MedoraError::InvalidStatus("4".to_string()))
        );
        assert!(validate_status(&StatusValue::Name("Done".to_string())).is_err());
    }

    #[test]
    fn test_status_value_deserializes_code_or_name() {
        let code: StatusValue = serde_json::from_str("2").unwrap();
        let name: StatusValue = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(validate_status(&code), validate_status(&name));
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_row_untouched() {
        let (store, appointment) = booked().await;

        let err = update_status(&store, appointment.id, &StatusValue::Name("Lost".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::InvalidStatus(_))
        ));
        let stored = find_appointment(&store, appointment.id).await.unwrap();
        assert_eq!(stored.status, AppointmentStatus::Scheduled);
        assert_eq!(stored.updated_at, appointment.updated_at);
        assert_eq!(stored.version, appointment.version);
    }

    #[tokio::test]
    async fn test_invalid_status_on_missing_row_is_invalid_status() {
        let store = store();

        let err = update_status(&store, 77, &StatusValue::Code(-1))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::InvalidStatus(_))
        ));
    }

    #[tokio::test]
    async fn test_any_status_moves_to_any_other() {
        let (store, appointment) = booked().await;

        for status in [
            AppointmentStatus::Cancelled,
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
        ] {
            let updated = update_status(&store, appointment.id, &status.into())
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn test_create_appointment_requires_participants() {
        let (store, appointment) = booked().await;

        let err = create_appointment(
            &store,
            AppointmentDraft {
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id + 10,
                date: appointment.date,
                time: appointment.time,
                reason: "Follow-up".to_string(),
                status: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<MedoraError>(),
            Some(&MedoraError::not_found("Doctor", appointment.doctor_id + 10))
        );
    }

    #[tokio::test]
    async fn test_update_appointment_keeps_status_when_absent() {
        let (store, appointment) = booked().await;
        update_status(&store, appointment.id, &StatusValue::Code(1))
            .await
            .unwrap();

        let updated = update_appointment(
            &store,
            appointment.id,
            AppointmentDraft {
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id,
                date: appointment.date,
                time: appointment.time,
                reason: "Moved".to_string(),
                status: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.reason, "Moved");
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_treatment_record_lifecycle() {
        let (store, appointment) = booked().await;

        assert!(find_treatment(&store, appointment.id).await.is_err());

        let created = submit_treatment(&store, record(appointment.id)).await.unwrap();
        let linked = find_appointment(&store, appointment.id).await.unwrap();
        assert_eq!(linked.treatment_record_id, Some(created.id));
        assert_eq!(find_treatment(&store, appointment.id).await.unwrap(), created);

        let err = submit_treatment(&store, record(appointment.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_appointment_twice() {
        let (store, appointment) = booked().await;
        submit_treatment(&store, record(appointment.id)).await.unwrap();

        delete_appointment(&store, appointment.id).await.unwrap();
        assert!(
            store
                .treatment_record_find_by_appointment(appointment.id)
                .await
                .unwrap()
                .is_none()
        );

        let err = delete_appointment(&store, appointment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_appointment_views_carry_names() {
        let (store, appointment) = booked().await;

        let views = appointment_views(&store, vec![appointment.clone()])
            .await
            .unwrap();
        assert_eq!(views[0].patient_name, "Pat Ient");
        assert_eq!(views[0].doctor_name, "Dr. a@x.com");
        assert_eq!(views[0].id, appointment.id);
    }
}

//! Patient self-registration

use medora_common::{MedoraError, ROLE_PATIENT};
use medora_persistence::{
    EntityPersistence, IdentityPersistence, NewPatient, PatientInfo,
};

use crate::account::{
    AccountSettings, compensate_on_error, ensure_email_available, provision_account,
    require_account_ref,
};
use crate::require_text;

/// Insert the patient row and a `patient` account for the same email
pub async fn register_patient(
    entities: &dyn EntityPersistence,
    identity: &dyn IdentityPersistence,
    settings: AccountSettings,
    mut patient: NewPatient,
    password: &str,
) -> anyhow::Result<PatientInfo> {
    require_text("firstName", &patient.first_name)?;
    require_text("lastName", &patient.last_name)?;
    let account = require_account_ref(&patient.email)?;
    medora_auth::service::password::validate_password(password)?;

    if entities.patient_find_by_email(account.email()).await?.is_some() {
        return Err(MedoraError::AlreadyExists(format!("Patient {}", account)).into());
    }
    ensure_email_available(identity, &account).await?;

    patient.email = account.email().to_string();
    let created = entities.patient_create(patient).await?;

    let provisioned =
        provision_account(identity, settings, &account, password, ROLE_PATIENT).await;
    compensate_on_error(provisioned, "Patient", created.id, || {
        entities.patient_delete(created.id)
    })
    .await?;

    tracing::info!(id = created.id, "patient registered");
    Ok(created)
}

pub async fn find_patient(
    entities: &dyn EntityPersistence,
    id: i32,
) -> anyhow::Result<PatientInfo> {
    entities
        .patient_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Patient", id).into())
}

//! Doctor create and update flows
//!
//! A doctor row always comes with a `doctor` identity account under the same
//! email. Deletion goes through the cascade service.

use medora_common::{MedoraError, ROLE_DOCTOR};
use medora_persistence::{
    DoctorChanges, DoctorInfo, EntityPersistence, IdentityPersistence, NewDoctor,
};

use crate::account::{
    AccountSettings, compensate_on_error, ensure_email_available, provision_account,
    require_account_ref,
};
use crate::guard::update_guarded;
use crate::{require_text, require_text_if_present};

/// Fails unless `department_id` exists and belongs to `hospital_id`
pub async fn check_placement(
    entities: &dyn EntityPersistence,
    department_id: i32,
    hospital_id: i32,
) -> anyhow::Result<()> {
    let department = entities
        .department_find_by_id(department_id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Department", department_id))?;

    if department.hospital_id != hospital_id {
        return Err(MedoraError::ValidationFailed(format!(
            "Department {} does not belong to hospital {}",
            department_id, hospital_id
        ))
        .into());
    }
    Ok(())
}

pub async fn create_doctor(
    entities: &dyn EntityPersistence,
    identity: &dyn IdentityPersistence,
    settings: AccountSettings,
    mut doctor: NewDoctor,
    password: &str,
) -> anyhow::Result<DoctorInfo> {
    require_text("name", &doctor.name)?;
    let account = require_account_ref(&doctor.email)?;
    medora_auth::service::password::validate_password(password)?;

    check_placement(entities, doctor.department_id, doctor.hospital_id).await?;
    ensure_email_available(identity, &account).await?;

    doctor.email = account.email().to_string();
    let created = entities.doctor_create(doctor).await?;

    let provisioned = provision_account(identity, settings, &account, password, ROLE_DOCTOR).await;
    compensate_on_error(provisioned, "Doctor", created.id, || {
        entities.doctor_delete_cascade(created.id)
    })
    .await?;

    tracing::info!(id = created.id, email = %account, "doctor created");
    Ok(created)
}

/// Apply a partial update. Moving a doctor re-checks the department placement.
pub async fn update_doctor(
    entities: &dyn EntityPersistence,
    id: i32,
    changes: DoctorChanges,
) -> anyhow::Result<DoctorInfo> {
    require_text_if_present("name", changes.name.as_deref())?;

    update_guarded(
        "Doctor",
        id,
        || entities.doctor_find_by_id(id),
        move |current: DoctorInfo| async move {
            let department_id = changes.department_id.unwrap_or(current.department_id);
            let hospital_id = changes.hospital_id.unwrap_or(current.hospital_id);
            if department_id != current.department_id || hospital_id != current.hospital_id {
                check_placement(entities, department_id, hospital_id).await?;
            }
            entities.doctor_update(id, current.version, changes).await
        },
    )
    .await
}

pub async fn find_doctor(entities: &dyn EntityPersistence, id: i32) -> anyhow::Result<DoctorInfo> {
    entities
        .doctor_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Doctor", id).into())
}

#[cfg(test)]
mod tests {
    use medora_persistence::{DepartmentInfo, DepartmentPersistence, DoctorPersistence, NewDepartment};

    use super::*;
    use crate::testing::*;

    const FAST: AccountSettings = AccountSettings { bcrypt_cost: 4 };

    fn new_doctor(department: &DepartmentInfo, email: &str) -> NewDoctor {
        NewDoctor {
            department_id: department.id,
            hospital_id: department.hospital_id,
            name: "Dr. House".to_string(),
            specialization: "Diagnostics".to_string(),
            phone: "555-0102".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_doctor_provisions_account() {
        let store = store();
        let (_, department) = seed_department(&store).await;

        let doctor = create_doctor(
            &store,
            &store,
            FAST,
            new_doctor(&department, " House@X.com "),
            "secret",
        )
        .await
        .unwrap();

        assert_eq!(doctor.email, "house@x.com");
        assert_eq!(roles_of(&store, "house@x.com").await, vec![ROLE_DOCTOR]);
    }

    #[tokio::test]
    async fn test_create_doctor_rejects_foreign_department() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let other = seed_hospital(&store, "North").await;

        let mut doctor = new_doctor(&department, "a@x.com");
        doctor.hospital_id = other.id;
        let err = create_doctor(&store, &store, FAST, doctor, "secret")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::ValidationFailed(_))
        ));
        assert!(!account_exists(&store, "a@x.com").await);
    }

    #[tokio::test]
    async fn test_create_doctor_with_taken_email() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        seed_admin(&store, "taken@x.com").await;

        let err = create_doctor(
            &store,
            &store,
            FAST,
            new_doctor(&department, "taken@x.com"),
            "secret",
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::AlreadyExists(_))
        ));
        assert!(store.doctor_find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_doctor_removes_row_when_account_fails() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let identity = FailingIdentity::new(&store).fail_create();

        let result = create_doctor(
            &store,
            &identity,
            FAST,
            new_doctor(&department, "a@x.com"),
            "secret",
        )
        .await;

        assert!(result.is_err());
        assert!(store.doctor_find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_doctor_checks_new_department() {
        let store = store();
        let (hospital, department) = seed_department(&store).await;
        let doctor = seed_doctor(&store, &department, "a@x.com").await;
        let sibling = store
            .department_create(NewDepartment {
                hospital_id: hospital.id,
                name: "Neurology".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let moved = update_doctor(
            &store,
            doctor.id,
            DoctorChanges {
                department_id: Some(sibling.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.department_id, sibling.id);
        assert_eq!(moved.email, "a@x.com");

        let err = update_doctor(
            &store,
            doctor.id,
            DoctorChanges {
                department_id: Some(sibling.id + 50),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::NotFound(_))
        ));
    }
}

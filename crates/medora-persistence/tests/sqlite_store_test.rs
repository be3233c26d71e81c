//! SeaORM backend tests against in-memory SQLite

use chrono::{NaiveDate, NaiveTime};
use medora_common::MedoraError;
use medora_persistence::sea_orm::{ConnectOptions, Database};
use medora_persistence::*;

async fn setup() -> ExternalDbPersistService {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    schema::create_schema(&db).await.unwrap();
    ExternalDbPersistService::new(db)
}

async fn seed(store: &ExternalDbPersistService) -> (HospitalInfo, DepartmentInfo, DoctorInfo) {
    let hospital = store
        .hospital_create(NewHospital {
            name: "General".to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            email: "info@general.test".to_string(),
            image: Some(vec![0x89, 0x50, 0x4e, 0x47]),
        })
        .await
        .unwrap();
    let department = store
        .department_create(NewDepartment {
            hospital_id: hospital.id,
            name: "Cardiology".to_string(),
            description: "Heart".to_string(),
            image: None,
        })
        .await
        .unwrap();
    let doctor = store
        .doctor_create(NewDoctor {
            department_id: department.id,
            hospital_id: hospital.id,
            name: "Dr. A".to_string(),
            specialization: "Cardiology".to_string(),
            phone: "555-0101".to_string(),
            email: "a@x.com".to_string(),
        })
        .await
        .unwrap();
    (hospital, department, doctor)
}

#[tokio::test]
async fn test_schema_is_idempotent() {
    let store = setup().await;
    schema::create_schema(store.db()).await.unwrap();
    store.health_check().await.unwrap();
    assert_eq!(store.storage_mode(), StorageMode::ExternalDb);
}

#[tokio::test]
async fn test_image_bytes_roundtrip() {
    let store = setup().await;
    let (hospital, _, _) = seed(&store).await;

    let loaded = store.hospital_find_by_id(hospital.id).await.unwrap().unwrap();
    assert_eq!(loaded.image, Some(vec![0x89, 0x50, 0x4e, 0x47]));
}

#[tokio::test]
async fn test_hospital_delete_restricted_by_departments() {
    let store = setup().await;
    let (hospital, department, _) = seed(&store).await;

    let err = store.hospital_delete(hospital.id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MedoraError>(),
        Some(MedoraError::HasDependents(_))
    ));
    assert!(store.hospital_exists(hospital.id).await.unwrap());
    assert!(store.department_exists(department.id).await.unwrap());

    assert!(store.department_delete_cascade(department.id).await.unwrap());
    assert!(store.hospital_delete(hospital.id).await.unwrap());
    assert!(!store.hospital_delete(hospital.id).await.unwrap());
}

#[tokio::test]
async fn test_department_cascade_removes_doctors_and_appointments() {
    let store = setup().await;
    let (_, department, doctor) = seed(&store).await;
    let patient = store
        .patient_create(NewPatient {
            first_name: "Pat".to_string(),
            last_name: "Ient".to_string(),
            email: "p@x.com".to_string(),
            phone: "555-0199".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let appointment = store
        .appointment_create(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            reason: "Chest pain".to_string(),
            status: AppointmentStatus::Scheduled,
        })
        .await
        .unwrap();
    let record = store
        .treatment_record_create(NewTreatmentRecord {
            appointment_id: appointment.id,
            diagnosis: "Angina".to_string(),
            treatment: "Rest".to_string(),
            prescription: Some("Nitroglycerin".to_string()),
            notes: None,
        })
        .await
        .unwrap();

    let linked = store
        .appointment_find_by_id(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.treatment_record_id, Some(record.id));
    assert_eq!(linked.version, 2);

    assert!(store.department_delete_cascade(department.id).await.unwrap());
    assert!(!store.department_exists(department.id).await.unwrap());
    assert!(!store.doctor_exists(doctor.id).await.unwrap());
    assert!(
        store
            .appointment_find_by_patient(patient.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        store
            .treatment_record_find_by_appointment(appointment.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(store.patient_exists(patient.id).await.unwrap());
}

#[tokio::test]
async fn test_versioned_update_conflict() {
    let store = setup().await;
    let (_, department, _) = seed(&store).await;

    let changes = DepartmentChanges {
        name: Some("Cardio".to_string()),
        ..Default::default()
    };
    let updated = store
        .department_update(department.id, department.version, changes.clone())
        .await
        .unwrap();
    let UpdateOutcome::Updated(updated) = updated else {
        panic!("expected update");
    };
    assert_eq!(updated.name, "Cardio");
    assert_eq!(updated.description, "Heart");
    assert_eq!(updated.version, department.version + 1);

    let stale = store
        .department_update(department.id, department.version, changes)
        .await
        .unwrap();
    assert_eq!(stale, UpdateOutcome::Conflict);
}

#[tokio::test]
async fn test_department_move_carries_doctors() {
    let store = setup().await;
    let (hospital, department, doctor) = seed(&store).await;
    let north = store
        .hospital_create(NewHospital {
            name: "North".to_string(),
            address: "2 North St".to_string(),
            phone: "555-0200".to_string(),
            email: "info@north.test".to_string(),
            image: None,
        })
        .await
        .unwrap();

    let moved = store
        .department_update(
            department.id,
            department.version,
            DepartmentChanges {
                hospital_id: Some(north.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let UpdateOutcome::Updated(moved) = moved else {
        panic!("expected update");
    };
    assert_eq!(moved.hospital_id, north.id);

    let doctor = store.doctor_find_by_id(doctor.id).await.unwrap().unwrap();
    assert_eq!(doctor.hospital_id, north.id);
    assert_eq!(doctor.department_id, department.id);

    assert!(store.hospital_delete(hospital.id).await.unwrap());
    let err = store.hospital_delete(north.id).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MedoraError>(),
        Some(MedoraError::HasDependents(_))
    ));
}

#[tokio::test]
async fn test_identity_store_roles() {
    let store = setup().await;
    let email = AccountRef::from_email("Admin@X.com").unwrap();
    let roles = vec!["admin".to_string(), "doctor".to_string()];

    assert!(store.account_create(&email, "hash", &roles).await.unwrap().succeeded);
    let duplicate = store.account_create(&email, "hash", &[]).await.unwrap();
    assert_eq!(duplicate.errors[0].code, "DuplicateEmail");

    let account = store.account_find_by_email(&email).await.unwrap().unwrap();
    let mut held = store.account_roles(&account).await.unwrap();
    held.sort();
    assert_eq!(held, roles);
    assert!(store.account_exists_with_role("admin").await.unwrap());

    assert!(
        store
            .account_remove_roles(&account, &roles)
            .await
            .unwrap()
            .succeeded
    );
    assert!(store.account_roles(&account).await.unwrap().is_empty());
    assert!(!store.account_exists_with_role("admin").await.unwrap());

    assert!(store.account_delete(&account).await.unwrap().succeeded);
    assert!(store.account_find_by_email(&email).await.unwrap().is_none());
}

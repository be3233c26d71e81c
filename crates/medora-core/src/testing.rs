//! Fixtures shared by the unit tests of this crate

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use medora_common::{ROLE_ADMIN, ROLE_DOCTOR};
use medora_persistence::*;

pub fn store() -> MemoryPersistService {
    MemoryPersistService::new()
}

pub async fn seed_hospital(store: &MemoryPersistService, name: &str) -> HospitalInfo {
    store
        .hospital_create(NewHospital {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            email: "info@hospital.test".to_string(),
            image: None,
        })
        .await
        .unwrap()
}

pub async fn seed_department(store: &MemoryPersistService) -> (HospitalInfo, DepartmentInfo) {
    let hospital = seed_hospital(store, "General").await;
    let department = store
        .department_create(NewDepartment {
            hospital_id: hospital.id,
            name: "Cardiology".to_string(),
            description: "Heart".to_string(),
            image: None,
        })
        .await
        .unwrap();
    (hospital, department)
}

async fn seed_account(store: &MemoryPersistService, email: &str, role: &str) {
    if let Some(account) = AccountRef::from_email(email) {
        store
            .account_create(&account, "hash", &[role.to_string()])
            .await
            .unwrap();
    }
}

/// Doctor row plus a `doctor` account when the email is not blank
pub async fn seed_doctor(
    store: &MemoryPersistService,
    department: &DepartmentInfo,
    email: &str,
) -> DoctorInfo {
    let doctor = store
        .doctor_create(NewDoctor {
            department_id: department.id,
            hospital_id: department.hospital_id,
            name: format!("Dr. {}", email),
            specialization: "General".to_string(),
            phone: "555-0101".to_string(),
            email: email.to_string(),
        })
        .await
        .unwrap();
    seed_account(store, email, ROLE_DOCTOR).await;
    doctor
}

/// Admin row plus an `admin` account when the email is not blank
pub async fn seed_admin(store: &MemoryPersistService, email: &str) -> AdminInfo {
    let admin = store
        .admin_create(NewAdmin {
            name: "Admin".to_string(),
            email: email.to_string(),
        })
        .await
        .unwrap();
    seed_account(store, email, ROLE_ADMIN).await;
    admin
}

pub async fn seed_patient(store: &MemoryPersistService) -> PatientInfo {
    store
        .patient_create(NewPatient {
            first_name: "Pat".to_string(),
            last_name: "Ient".to_string(),
            email: "pat@x.com".to_string(),
            phone: "555-0199".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn seed_appointment(store: &MemoryPersistService, doctor: &DoctorInfo) -> AppointmentInfo {
    let patient = seed_patient(store).await;
    store
        .appointment_create(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            reason: "Checkup".to_string(),
            status: AppointmentStatus::Scheduled,
        })
        .await
        .unwrap()
}

pub async fn account_exists(store: &MemoryPersistService, email: &str) -> bool {
    let account = AccountRef::from_email(email).unwrap();
    store.account_find_by_email(&account).await.unwrap().is_some()
}

pub async fn roles_of(store: &MemoryPersistService, email: &str) -> Vec<String> {
    let account = AccountRef::from_email(email).unwrap();
    match store.account_find_by_email(&account).await.unwrap() {
        Some(info) => store.account_roles(&info).await.unwrap(),
        None => Vec::new(),
    }
}

pub async fn remove_account(store: &MemoryPersistService, email: &str) {
    let account = AccountRef::from_email(email).unwrap();
    if let Some(info) = store.account_find_by_email(&account).await.unwrap() {
        store.account_delete(&info).await.unwrap();
    }
}

/// Identity store that rejects selected mutations and delegates the rest
pub struct FailingIdentity<'a> {
    inner: &'a MemoryPersistService,
    remove_roles: bool,
    delete: bool,
    create: bool,
}

impl<'a> FailingIdentity<'a> {
    pub fn new(inner: &'a MemoryPersistService) -> Self {
        Self {
            inner,
            remove_roles: false,
            delete: false,
            create: false,
        }
    }

    pub fn fail_remove_roles(mut self) -> Self {
        self.remove_roles = true;
        self
    }

    pub fn fail_delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn fail_create(mut self) -> Self {
        self.create = true;
        self
    }
}

fn unavailable() -> IdentityResult {
    IdentityResult::failed("Unavailable", "identity store unavailable")
}

#[async_trait]
impl IdentityPersistence for FailingIdentity<'_> {
    async fn account_find_by_email(
        &self,
        account: &AccountRef,
    ) -> anyhow::Result<Option<AccountInfo>> {
        self.inner.account_find_by_email(account).await
    }

    async fn account_create(
        &self,
        account: &AccountRef,
        password_hash: &str,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        if self.create {
            return Ok(unavailable());
        }
        self.inner.account_create(account, password_hash, roles).await
    }

    async fn account_roles(&self, account: &AccountInfo) -> anyhow::Result<Vec<String>> {
        self.inner.account_roles(account).await
    }

    async fn account_add_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        self.inner.account_add_roles(account, roles).await
    }

    async fn account_remove_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        if self.remove_roles {
            return Ok(unavailable());
        }
        self.inner.account_remove_roles(account, roles).await
    }

    async fn account_delete(&self, account: &AccountInfo) -> anyhow::Result<IdentityResult> {
        if self.delete {
            return Ok(unavailable());
        }
        self.inner.account_delete(account).await
    }

    async fn account_exists_with_role(&self, role: &str) -> anyhow::Result<bool> {
        self.inner.account_exists_with_role(role).await
    }
}

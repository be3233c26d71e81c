//! In-memory persistence backend
//!
//! All tables live behind a single `RwLock`, so every multi-table mutation
//! (cascading deletes, record linking) is applied atomically. Ids come from
//! per-table counters that only grow.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use medora_common::MedoraError;

use crate::model::*;
use crate::traits::*;

#[derive(Default)]
struct Sequences {
    hospital: i32,
    department: i32,
    doctor: i32,
    patient: i32,
    admin: i32,
    appointment: i32,
    treatment_record: i32,
    account: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    hospitals: BTreeMap<i32, HospitalInfo>,
    departments: BTreeMap<i32, DepartmentInfo>,
    doctors: BTreeMap<i32, DoctorInfo>,
    patients: BTreeMap<i32, PatientInfo>,
    admins: BTreeMap<i32, AdminInfo>,
    appointments: BTreeMap<i32, AppointmentInfo>,
    treatment_records: BTreeMap<i32, TreatmentRecordInfo>,
    accounts: BTreeMap<i32, AccountInfo>,
    account_roles: BTreeMap<i32, BTreeSet<String>>,
}

impl Tables {
    /// Removes appointments matching `pred` along with their treatment records
    fn remove_appointments_where(&mut self, pred: impl Fn(&AppointmentInfo) -> bool) {
        let removed: BTreeSet<i32> = self
            .appointments
            .values()
            .filter(|a| pred(a))
            .map(|a| a.id)
            .collect();
        self.appointments.retain(|id, _| !removed.contains(id));
        self.treatment_records
            .retain(|_, r| !removed.contains(&r.appointment_id));
    }
}

/// In-memory persistence service
///
/// Used for `storage.mode = memory` and as the backend of unit tests.
#[derive(Default)]
pub struct MemoryPersistService {
    tables: RwLock<Tables>,
}

impl MemoryPersistService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityPersistence for MemoryPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// HospitalPersistence implementation
// ============================================================================

#[async_trait]
impl HospitalPersistence for MemoryPersistService {
    async fn hospital_find_all(&self) -> anyhow::Result<Vec<HospitalInfo>> {
        Ok(self.tables.read().hospitals.values().cloned().collect())
    }

    async fn hospital_find_by_id(&self, id: i32) -> anyhow::Result<Option<HospitalInfo>> {
        Ok(self.tables.read().hospitals.get(&id).cloned())
    }

    async fn hospital_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.read().hospitals.contains_key(&id))
    }

    async fn hospital_create(&self, hospital: NewHospital) -> anyhow::Result<HospitalInfo> {
        let mut tables = self.tables.write();
        let now = now();
        let info = HospitalInfo {
            id: next_id(&mut tables.seq.hospital),
            name: hospital.name,
            address: hospital.address,
            phone: hospital.phone,
            email: hospital.email,
            image: hospital.image,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.hospitals.insert(info.id, info.clone());
        Ok(info)
    }

    async fn hospital_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: HospitalChanges,
    ) -> anyhow::Result<UpdateOutcome<HospitalInfo>> {
        let mut tables = self.tables.write();
        let Some(row) = tables
            .hospitals
            .get_mut(&id)
            .filter(|h| h.version == expected_version)
        else {
            return Ok(UpdateOutcome::Conflict);
        };

        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(address) = changes.address {
            row.address = address;
        }
        if let Some(phone) = changes.phone {
            row.phone = phone;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(image) = changes.image {
            row.image = Some(image);
        }
        row.updated_at = now();
        row.version += 1;

        Ok(UpdateOutcome::Updated(row.clone()))
    }

    async fn hospital_delete(&self, id: i32) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if !tables.hospitals.contains_key(&id) {
            return Ok(false);
        }
        if tables.departments.values().any(|d| d.hospital_id == id)
            || tables.doctors.values().any(|d| d.hospital_id == id)
        {
            return Err(MedoraError::HasDependents(format!("Hospital {}", id)).into());
        }
        tables.hospitals.remove(&id);
        Ok(true)
    }
}

// ============================================================================
// DepartmentPersistence implementation
// ============================================================================

#[async_trait]
impl DepartmentPersistence for MemoryPersistService {
    async fn department_find_all(&self) -> anyhow::Result<Vec<DepartmentInfo>> {
        Ok(self.tables.read().departments.values().cloned().collect())
    }

    async fn department_find_by_id(&self, id: i32) -> anyhow::Result<Option<DepartmentInfo>> {
        Ok(self.tables.read().departments.get(&id).cloned())
    }

    async fn department_find_by_hospital(
        &self,
        hospital_id: i32,
    ) -> anyhow::Result<Vec<DepartmentInfo>> {
        Ok(self
            .tables
            .read()
            .departments
            .values()
            .filter(|d| d.hospital_id == hospital_id)
            .cloned()
            .collect())
    }

    async fn department_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.read().departments.contains_key(&id))
    }

    async fn department_create(
        &self,
        department: NewDepartment,
    ) -> anyhow::Result<DepartmentInfo> {
        let mut tables = self.tables.write();
        if !tables.hospitals.contains_key(&department.hospital_id) {
            return Err(MedoraError::not_found("Hospital", department.hospital_id).into());
        }
        let now = now();
        let info = DepartmentInfo {
            id: next_id(&mut tables.seq.department),
            hospital_id: department.hospital_id,
            name: department.name,
            description: department.description,
            image: department.image,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.departments.insert(info.id, info.clone());
        Ok(info)
    }

    async fn department_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DepartmentChanges,
    ) -> anyhow::Result<UpdateOutcome<DepartmentInfo>> {
        let mut tables = self.tables.write();
        if let Some(hospital_id) = changes.hospital_id
            && !tables.hospitals.contains_key(&hospital_id)
        {
            return Err(MedoraError::not_found("Hospital", hospital_id).into());
        }
        let Some(row) = tables
            .departments
            .get_mut(&id)
            .filter(|d| d.version == expected_version)
        else {
            return Ok(UpdateOutcome::Conflict);
        };

        if let Some(hospital_id) = changes.hospital_id {
            row.hospital_id = hospital_id;
        }
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(image) = changes.image {
            row.image = Some(image);
        }
        row.updated_at = now();
        row.version += 1;
        let updated = row.clone();

        // Doctors follow their department to its new hospital
        for doctor in tables
            .doctors
            .values_mut()
            .filter(|d| d.department_id == id && d.hospital_id != updated.hospital_id)
        {
            doctor.hospital_id = updated.hospital_id;
            doctor.updated_at = updated.updated_at;
            doctor.version += 1;
        }

        Ok(UpdateOutcome::Updated(updated))
    }

    async fn department_delete_cascade(&self, id: i32) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if tables.departments.remove(&id).is_none() {
            return Ok(false);
        }
        let doctor_ids: BTreeSet<i32> = tables
            .doctors
            .values()
            .filter(|d| d.department_id == id)
            .map(|d| d.id)
            .collect();
        tables.remove_appointments_where(|a| doctor_ids.contains(&a.doctor_id));
        tables.doctors.retain(|_, d| d.department_id != id);
        Ok(true)
    }
}

// ============================================================================
// DoctorPersistence implementation
// ============================================================================

#[async_trait]
impl DoctorPersistence for MemoryPersistService {
    async fn doctor_find_all(&self) -> anyhow::Result<Vec<DoctorInfo>> {
        Ok(self.tables.read().doctors.values().cloned().collect())
    }

    async fn doctor_find_by_id(&self, id: i32) -> anyhow::Result<Option<DoctorInfo>> {
        Ok(self.tables.read().doctors.get(&id).cloned())
    }

    async fn doctor_find_by_department(
        &self,
        department_id: i32,
    ) -> anyhow::Result<Vec<DoctorInfo>> {
        Ok(self
            .tables
            .read()
            .doctors
            .values()
            .filter(|d| d.department_id == department_id)
            .cloned()
            .collect())
    }

    async fn doctor_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.read().doctors.contains_key(&id))
    }

    async fn doctor_create(&self, doctor: NewDoctor) -> anyhow::Result<DoctorInfo> {
        let mut tables = self.tables.write();
        if !tables.departments.contains_key(&doctor.department_id) {
            return Err(MedoraError::not_found("Department", doctor.department_id).into());
        }
        let now = now();
        let info = DoctorInfo {
            id: next_id(&mut tables.seq.doctor),
            department_id: doctor.department_id,
            hospital_id: doctor.hospital_id,
            name: doctor.name,
            specialization: doctor.specialization,
            phone: doctor.phone,
            email: doctor.email,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.doctors.insert(info.id, info.clone());
        Ok(info)
    }

    async fn doctor_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DoctorChanges,
    ) -> anyhow::Result<UpdateOutcome<DoctorInfo>> {
        let mut tables = self.tables.write();
        let Some(row) = tables
            .doctors
            .get_mut(&id)
            .filter(|d| d.version == expected_version)
        else {
            return Ok(UpdateOutcome::Conflict);
        };

        if let Some(department_id) = changes.department_id {
            row.department_id = department_id;
        }
        if let Some(hospital_id) = changes.hospital_id {
            row.hospital_id = hospital_id;
        }
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(specialization) = changes.specialization {
            row.specialization = specialization;
        }
        if let Some(phone) = changes.phone {
            row.phone = phone;
        }
        row.updated_at = now();
        row.version += 1;

        Ok(UpdateOutcome::Updated(row.clone()))
    }

    async fn doctor_delete_cascade(&self, id: i32) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if tables.doctors.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_appointments_where(|a| a.doctor_id == id);
        Ok(true)
    }
}

// ============================================================================
// PatientPersistence implementation
// ============================================================================

#[async_trait]
impl PatientPersistence for MemoryPersistService {
    async fn patient_find_all(&self) -> anyhow::Result<Vec<PatientInfo>> {
        Ok(self.tables.read().patients.values().cloned().collect())
    }

    async fn patient_find_by_id(&self, id: i32) -> anyhow::Result<Option<PatientInfo>> {
        Ok(self.tables.read().patients.get(&id).cloned())
    }

    async fn patient_find_by_email(&self, email: &str) -> anyhow::Result<Option<PatientInfo>> {
        Ok(self
            .tables
            .read()
            .patients
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn patient_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.read().patients.contains_key(&id))
    }

    async fn patient_create(&self, patient: NewPatient) -> anyhow::Result<PatientInfo> {
        let mut tables = self.tables.write();
        let now = now();
        let info = PatientInfo {
            id: next_id(&mut tables.seq.patient),
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
            date_of_birth: patient.date_of_birth,
            address: patient.address,
            created_at: now,
            updated_at: now,
        };
        tables.patients.insert(info.id, info.clone());
        Ok(info)
    }

    async fn patient_delete(&self, id: i32) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if tables.patients.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_appointments_where(|a| a.patient_id == id);
        Ok(true)
    }
}

// ============================================================================
// AdminPersistence implementation
// ============================================================================

#[async_trait]
impl AdminPersistence for MemoryPersistService {
    async fn admin_find_all(&self) -> anyhow::Result<Vec<AdminInfo>> {
        Ok(self.tables.read().admins.values().cloned().collect())
    }

    async fn admin_find_by_id(&self, id: i32) -> anyhow::Result<Option<AdminInfo>> {
        Ok(self.tables.read().admins.get(&id).cloned())
    }

    async fn admin_find_by_email(&self, email: &str) -> anyhow::Result<Option<AdminInfo>> {
        Ok(self
            .tables
            .read()
            .admins
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn admin_create(&self, admin: NewAdmin) -> anyhow::Result<AdminInfo> {
        let mut tables = self.tables.write();
        let now = now();
        let info = AdminInfo {
            id: next_id(&mut tables.seq.admin),
            name: admin.name,
            email: admin.email,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.admins.insert(info.id, info.clone());
        Ok(info)
    }

    async fn admin_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AdminChanges,
    ) -> anyhow::Result<UpdateOutcome<AdminInfo>> {
        let mut tables = self.tables.write();
        let Some(row) = tables
            .admins
            .get_mut(&id)
            .filter(|a| a.version == expected_version)
        else {
            return Ok(UpdateOutcome::Conflict);
        };

        if let Some(name) = changes.name {
            row.name = name;
        }
        row.updated_at = now();
        row.version += 1;

        Ok(UpdateOutcome::Updated(row.clone()))
    }

    async fn admin_delete(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.write().admins.remove(&id).is_some())
    }
}

// ============================================================================
// AppointmentPersistence implementation
// ============================================================================

#[async_trait]
impl AppointmentPersistence for MemoryPersistService {
    async fn appointment_find_all(&self) -> anyhow::Result<Vec<AppointmentInfo>> {
        Ok(self.tables.read().appointments.values().cloned().collect())
    }

    async fn appointment_find_by_id(&self, id: i32) -> anyhow::Result<Option<AppointmentInfo>> {
        Ok(self.tables.read().appointments.get(&id).cloned())
    }

    async fn appointment_find_by_doctor(
        &self,
        doctor_id: i32,
    ) -> anyhow::Result<Vec<AppointmentInfo>> {
        Ok(self
            .tables
            .read()
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect())
    }

    async fn appointment_find_by_patient(
        &self,
        patient_id: i32,
    ) -> anyhow::Result<Vec<AppointmentInfo>> {
        Ok(self
            .tables
            .read()
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
    ) -> anyhow::Result<AppointmentInfo> {
        let mut tables = self.tables.write();
        if !tables.patients.contains_key(&appointment.patient_id) {
            return Err(MedoraError::not_found("Patient", appointment.patient_id).into());
        }
        if !tables.doctors.contains_key(&appointment.doctor_id) {
            return Err(MedoraError::not_found("Doctor", appointment.doctor_id).into());
        }
        let now = now();
        let info = AppointmentInfo {
            id: next_id(&mut tables.seq.appointment),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            time: appointment.time,
            reason: appointment.reason,
            status: appointment.status,
            treatment_record_id: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.appointments.insert(info.id, info.clone());
        Ok(info)
    }

    async fn appointment_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AppointmentChanges,
    ) -> anyhow::Result<UpdateOutcome<AppointmentInfo>> {
        let mut tables = self.tables.write();
        let Some(row) = tables
            .appointments
            .get_mut(&id)
            .filter(|a| a.version == expected_version)
        else {
            return Ok(UpdateOutcome::Conflict);
        };

        if let Some(patient_id) = changes.patient_id {
            row.patient_id = patient_id;
        }
        if let Some(doctor_id) = changes.doctor_id {
            row.doctor_id = doctor_id;
        }
        if let Some(date) = changes.date {
            row.date = date;
        }
        if let Some(time) = changes.time {
            row.time = time;
        }
        if let Some(reason) = changes.reason {
            row.reason = reason;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        row.updated_at = now();
        row.version += 1;

        Ok(UpdateOutcome::Updated(row.clone()))
    }

    async fn appointment_delete(&self, id: i32) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if !tables.appointments.contains_key(&id) {
            return Ok(false);
        }
        tables.remove_appointments_where(|a| a.id == id);
        Ok(true)
    }

    async fn treatment_record_find_by_appointment(
        &self,
        appointment_id: i32,
    ) -> anyhow::Result<Option<TreatmentRecordInfo>> {
        Ok(self
            .tables
            .read()
            .treatment_records
            .values()
            .find(|r| r.appointment_id == appointment_id)
            .cloned())
    }

    async fn treatment_record_create(
        &self,
        record: NewTreatmentRecord,
    ) -> anyhow::Result<TreatmentRecordInfo> {
        let mut tables = self.tables.write();
        if !tables.appointments.contains_key(&record.appointment_id) {
            return Err(MedoraError::not_found("Appointment", record.appointment_id).into());
        }
        if tables
            .treatment_records
            .values()
            .any(|r| r.appointment_id == record.appointment_id)
        {
            return Err(MedoraError::AlreadyExists(format!(
                "Treatment record for appointment {}",
                record.appointment_id
            ))
            .into());
        }

        let now = now();
        let info = TreatmentRecordInfo {
            id: next_id(&mut tables.seq.treatment_record),
            appointment_id: record.appointment_id,
            diagnosis: record.diagnosis,
            treatment: record.treatment,
            prescription: record.prescription,
            notes: record.notes,
            created_at: now,
            updated_at: now,
        };
        tables.treatment_records.insert(info.id, info.clone());
        if let Some(appointment) = tables.appointments.get_mut(&info.appointment_id) {
            appointment.treatment_record_id = Some(info.id);
            appointment.updated_at = now;
            appointment.version += 1;
        }
        Ok(info)
    }
}

// ============================================================================
// IdentityPersistence implementation
// ============================================================================

#[async_trait]
impl IdentityPersistence for MemoryPersistService {
    async fn account_find_by_email(
        &self,
        account: &AccountRef,
    ) -> anyhow::Result<Option<AccountInfo>> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .find(|a| a.email == account.email())
            .cloned())
    }

    async fn account_create(
        &self,
        account: &AccountRef,
        password_hash: &str,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        let mut tables = self.tables.write();
        if tables.accounts.values().any(|a| a.email == account.email()) {
            return Ok(IdentityResult::failed(
                "DuplicateEmail",
                format!("Email '{}' is already taken.", account),
            ));
        }
        let info = AccountInfo {
            id: next_id(&mut tables.seq.account),
            email: account.email().to_string(),
            password_hash: password_hash.to_string(),
            enabled: true,
            created_at: now(),
        };
        tables
            .account_roles
            .insert(info.id, roles.iter().cloned().collect());
        tables.accounts.insert(info.id, info);
        Ok(IdentityResult::success())
    }

    async fn account_roles(&self, account: &AccountInfo) -> anyhow::Result<Vec<String>> {
        Ok(self
            .tables
            .read()
            .account_roles
            .get(&account.id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn account_add_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&account.id) {
            return Ok(account_missing(account));
        }
        tables
            .account_roles
            .entry(account.id)
            .or_default()
            .extend(roles.iter().cloned());
        Ok(IdentityResult::success())
    }

    async fn account_remove_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&account.id) {
            return Ok(account_missing(account));
        }
        if let Some(held) = tables.account_roles.get_mut(&account.id) {
            for role in roles {
                held.remove(role);
            }
        }
        Ok(IdentityResult::success())
    }

    async fn account_delete(&self, account: &AccountInfo) -> anyhow::Result<IdentityResult> {
        let mut tables = self.tables.write();
        if tables.accounts.remove(&account.id).is_none() {
            return Ok(account_missing(account));
        }
        tables.account_roles.remove(&account.id);
        Ok(IdentityResult::success())
    }

    async fn account_exists_with_role(&self, role: &str) -> anyhow::Result<bool> {
        Ok(self
            .tables
            .read()
            .account_roles
            .values()
            .any(|roles| roles.contains(role)))
    }
}

fn account_missing(account: &AccountInfo) -> IdentityResult {
    IdentityResult::failed(
        "AccountNotFound",
        format!("Account '{}' does not exist.", account.email),
    )
}

//! SQL-based persistence backend (MySQL/PostgreSQL/SQLite via SeaORM)
//!
//! Multi-table deletes run inside one transaction and use set-based
//! `DELETE ... WHERE .. IN (subquery)` statements rather than row iteration.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Query, SelectStatement, SimpleExpr};
use sea_orm::*;

use medora_common::MedoraError;

use crate::entity::{
    account, account_role, admin, appointment, department, doctor, hospital, patient,
    treatment_record,
};
use crate::model::*;
use crate::traits::*;

/// External database persistence service
///
/// Wraps a SeaORM `DatabaseConnection` and implements all persistence traits
/// with direct database queries.
pub struct ExternalDbPersistService {
    db: DatabaseConnection,
}

impl ExternalDbPersistService {
    /// Create a new ExternalDbPersistService with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get a reference to the underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// ============================================================================
// Model conversions
// ============================================================================

impl From<hospital::Model> for HospitalInfo {
    fn from(m: hospital::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            address: m.address,
            phone: m.phone,
            email: m.email,
            image: m.image,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        }
    }
}

impl From<department::Model> for DepartmentInfo {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            hospital_id: m.hospital_id,
            name: m.name,
            description: m.description,
            image: m.image,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        }
    }
}

impl From<doctor::Model> for DoctorInfo {
    fn from(m: doctor::Model) -> Self {
        Self {
            id: m.id,
            department_id: m.department_id,
            hospital_id: m.hospital_id,
            name: m.name,
            specialization: m.specialization,
            phone: m.phone,
            email: m.email,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        }
    }
}

impl From<patient::Model> for PatientInfo {
    fn from(m: patient::Model) -> Self {
        Self {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
            date_of_birth: m.date_of_birth,
            address: m.address,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<admin::Model> for AdminInfo {
    fn from(m: admin::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        }
    }
}

impl TryFrom<appointment::Model> for AppointmentInfo {
    type Error = anyhow::Error;

    fn try_from(m: appointment::Model) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&m.status).ok_or_else(|| {
            MedoraError::DatabaseError(format!(
                "appointment {} has unknown status '{}'",
                m.id, m.status
            ))
        })?;
        Ok(Self {
            id: m.id,
            patient_id: m.patient_id,
            doctor_id: m.doctor_id,
            date: m.date,
            time: m.time,
            reason: m.reason,
            status,
            treatment_record_id: m.treatment_record_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
        })
    }
}

fn appointment_list(models: Vec<appointment::Model>) -> anyhow::Result<Vec<AppointmentInfo>> {
    models.into_iter().map(AppointmentInfo::try_from).collect()
}

impl From<treatment_record::Model> for TreatmentRecordInfo {
    fn from(m: treatment_record::Model) -> Self {
        Self {
            id: m.id,
            appointment_id: m.appointment_id,
            diagnosis: m.diagnosis,
            treatment: m.treatment,
            prescription: m.prescription,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<account::Model> for AccountInfo {
    fn from(m: account::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            password_hash: m.password_hash,
            enabled: m.enabled,
            created_at: m.created_at,
        }
    }
}

/// `SELECT doctor.id FROM doctor WHERE <condition>`
fn doctor_ids_where(condition: SimpleExpr) -> SelectStatement {
    Query::select()
        .column(doctor::Column::Id)
        .from(doctor::Entity)
        .and_where(condition)
        .to_owned()
}

/// `SELECT appointment.id FROM appointment WHERE <condition>`
fn appointment_ids_where(condition: SimpleExpr) -> SelectStatement {
    Query::select()
        .column(appointment::Column::Id)
        .from(appointment::Entity)
        .and_where(condition)
        .to_owned()
}

/// Deletes appointments matching `condition` and their treatment records
async fn delete_appointments_where<C: ConnectionTrait>(
    conn: &C,
    condition: SimpleExpr,
) -> Result<(), DbErr> {
    treatment_record::Entity::delete_many()
        .filter(
            treatment_record::Column::AppointmentId
                .in_subquery(appointment_ids_where(condition.clone())),
        )
        .exec(conn)
        .await?;
    appointment::Entity::delete_many()
        .filter(condition)
        .exec(conn)
        .await?;
    Ok(())
}

// ============================================================================
// EntityPersistence implementation
// ============================================================================

#[async_trait]
impl EntityPersistence for ExternalDbPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::ExternalDb
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        self.db.ping().await?;
        Ok(())
    }
}

// ============================================================================
// HospitalPersistence implementation
// ============================================================================

#[async_trait]
impl HospitalPersistence for ExternalDbPersistService {
    async fn hospital_find_all(&self) -> anyhow::Result<Vec<HospitalInfo>> {
        let hospitals = hospital::Entity::find()
            .order_by_asc(hospital::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(HospitalInfo::from)
            .collect();

        Ok(hospitals)
    }

    async fn hospital_find_by_id(&self, id: i32) -> anyhow::Result<Option<HospitalInfo>> {
        Ok(hospital::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(HospitalInfo::from))
    }

    async fn hospital_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(hospital::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn hospital_create(&self, hospital: NewHospital) -> anyhow::Result<HospitalInfo> {
        let now = now();
        let entity = hospital::ActiveModel {
            name: Set(hospital.name),
            address: Set(hospital.address),
            phone: Set(hospital.phone),
            email: Set(hospital.email),
            image: Set(hospital.image),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        Ok(entity.insert(&self.db).await?.into())
    }

    async fn hospital_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: HospitalChanges,
    ) -> anyhow::Result<UpdateOutcome<HospitalInfo>> {
        let mut entity = hospital::ActiveModel {
            updated_at: Set(now()),
            version: Set(expected_version + 1),
            ..Default::default()
        };
        if let Some(name) = changes.name {
            entity.name = Set(name);
        }
        if let Some(address) = changes.address {
            entity.address = Set(address);
        }
        if let Some(phone) = changes.phone {
            entity.phone = Set(phone);
        }
        if let Some(email) = changes.email {
            entity.email = Set(email);
        }
        if let Some(image) = changes.image {
            entity.image = Set(Some(image));
        }

        let result = hospital::Entity::update_many()
            .set(entity)
            .filter(hospital::Column::Id.eq(id))
            .filter(hospital::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(UpdateOutcome::Conflict);
        }

        Ok(self
            .hospital_find_by_id(id)
            .await?
            .map_or(UpdateOutcome::Conflict, UpdateOutcome::Updated))
    }

    async fn hospital_delete(&self, id: i32) -> anyhow::Result<bool> {
        let tx = self.db.begin().await?;

        if hospital::Entity::find_by_id(id).count(&tx).await? == 0 {
            return Ok(false);
        }
        let dependents = department::Entity::find()
            .filter(department::Column::HospitalId.eq(id))
            .count(&tx)
            .await?
            + doctor::Entity::find()
                .filter(doctor::Column::HospitalId.eq(id))
                .count(&tx)
                .await?;
        if dependents > 0 {
            tracing::debug!(hospital_id = id, dependents, "hospital delete restricted");
            return Err(MedoraError::HasDependents(format!("Hospital {}", id)).into());
        }

        hospital::Entity::delete_by_id(id).exec(&tx).await?;
        tx.commit().await?;
        Ok(true)
    }
}

// ============================================================================
// DepartmentPersistence implementation
// ============================================================================

#[async_trait]
impl DepartmentPersistence for ExternalDbPersistService {
    async fn department_find_all(&self) -> anyhow::Result<Vec<DepartmentInfo>> {
        Ok(department::Entity::find()
            .order_by_asc(department::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(DepartmentInfo::from)
            .collect())
    }

    async fn department_find_by_id(&self, id: i32) -> anyhow::Result<Option<DepartmentInfo>> {
        Ok(department::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(DepartmentInfo::from))
    }

    async fn department_find_by_hospital(
        &self,
        hospital_id: i32,
    ) -> anyhow::Result<Vec<DepartmentInfo>> {
        Ok(department::Entity::find()
            .filter(department::Column::HospitalId.eq(hospital_id))
            .order_by_asc(department::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(DepartmentInfo::from)
            .collect())
    }

    async fn department_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(department::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn department_create(
        &self,
        department: NewDepartment,
    ) -> anyhow::Result<DepartmentInfo> {
        if !self.hospital_exists(department.hospital_id).await? {
            return Err(MedoraError::not_found("Hospital", department.hospital_id).into());
        }

        let now = now();
        let entity = department::ActiveModel {
            hospital_id: Set(department.hospital_id),
            name: Set(department.name),
            description: Set(department.description),
            image: Set(department.image),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        Ok(entity.insert(&self.db).await?.into())
    }

    async fn department_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DepartmentChanges,
    ) -> anyhow::Result<UpdateOutcome<DepartmentInfo>> {
        let tx = self.db.begin().await?;

        let now = now();
        let mut entity = department::ActiveModel {
            updated_at: Set(now),
            version: Set(expected_version + 1),
            ..Default::default()
        };
        if let Some(hospital_id) = changes.hospital_id {
            if hospital::Entity::find_by_id(hospital_id).count(&tx).await? == 0 {
                return Err(MedoraError::not_found("Hospital", hospital_id).into());
            }
            entity.hospital_id = Set(hospital_id);
        }
        if let Some(name) = changes.name {
            entity.name = Set(name);
        }
        if let Some(description) = changes.description {
            entity.description = Set(description);
        }
        if let Some(image) = changes.image {
            entity.image = Set(Some(image));
        }

        let result = department::Entity::update_many()
            .set(entity)
            .filter(department::Column::Id.eq(id))
            .filter(department::Column::Version.eq(expected_version))
            .exec(&tx)
            .await?;
        if result.rows_affected == 0 {
            return Ok(UpdateOutcome::Conflict);
        }

        // Doctors follow their department to its new hospital
        if let Some(hospital_id) = changes.hospital_id {
            let moved = doctor::Entity::update_many()
                .col_expr(doctor::Column::HospitalId, Expr::value(hospital_id))
                .col_expr(doctor::Column::UpdatedAt, Expr::value(now))
                .col_expr(
                    doctor::Column::Version,
                    Expr::col(doctor::Column::Version).add(1),
                )
                .filter(doctor::Column::DepartmentId.eq(id))
                .filter(doctor::Column::HospitalId.ne(hospital_id))
                .exec(&tx)
                .await?;
            tracing::debug!(
                department_id = id,
                hospital_id,
                doctors = moved.rows_affected,
                "department moved"
            );
        }

        let updated = department::Entity::find_by_id(id).one(&tx).await?;
        tx.commit().await?;

        Ok(updated.map_or(UpdateOutcome::Conflict, |m| UpdateOutcome::Updated(m.into())))
    }

    async fn department_delete_cascade(&self, id: i32) -> anyhow::Result<bool> {
        let tx = self.db.begin().await?;

        if department::Entity::find_by_id(id).count(&tx).await? == 0 {
            return Ok(false);
        }

        let doctors = doctor_ids_where(doctor::Column::DepartmentId.eq(id));
        delete_appointments_where(&tx, appointment::Column::DoctorId.in_subquery(doctors)).await?;
        let removed = doctor::Entity::delete_many()
            .filter(doctor::Column::DepartmentId.eq(id))
            .exec(&tx)
            .await?;
        department::Entity::delete_by_id(id).exec(&tx).await?;

        tx.commit().await?;
        tracing::debug!(
            department_id = id,
            doctors = removed.rows_affected,
            "department deleted with doctors"
        );
        Ok(true)
    }
}

// ============================================================================
// DoctorPersistence implementation
// ============================================================================

#[async_trait]
impl DoctorPersistence for ExternalDbPersistService {
    async fn doctor_find_all(&self) -> anyhow::Result<Vec<DoctorInfo>> {
        Ok(doctor::Entity::find()
            .order_by_asc(doctor::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(DoctorInfo::from)
            .collect())
    }

    async fn doctor_find_by_id(&self, id: i32) -> anyhow::Result<Option<DoctorInfo>> {
        Ok(doctor::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(DoctorInfo::from))
    }

    async fn doctor_find_by_department(
        &self,
        department_id: i32,
    ) -> anyhow::Result<Vec<DoctorInfo>> {
        Ok(doctor::Entity::find()
            .filter(doctor::Column::DepartmentId.eq(department_id))
            .order_by_asc(doctor::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(DoctorInfo::from)
            .collect())
    }

    async fn doctor_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(doctor::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn doctor_create(&self, doctor: NewDoctor) -> anyhow::Result<DoctorInfo> {
        if !self.department_exists(doctor.department_id).await? {
            return Err(MedoraError::not_found("Department", doctor.department_id).into());
        }

        let now = now();
        let entity = doctor::ActiveModel {
            department_id: Set(doctor.department_id),
            hospital_id: Set(doctor.hospital_id),
            name: Set(doctor.name),
            specialization: Set(doctor.specialization),
            phone: Set(doctor.phone),
            email: Set(doctor.email),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        Ok(entity.insert(&self.db).await?.into())
    }

    async fn doctor_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: DoctorChanges,
    ) -> anyhow::Result<UpdateOutcome<DoctorInfo>> {
        let mut entity = doctor::ActiveModel {
            updated_at: Set(now()),
            version: Set(expected_version + 1),
            ..Default::default()
        };
        if let Some(department_id) = changes.department_id {
            entity.department_id = Set(department_id);
        }
        if let Some(hospital_id) = changes.hospital_id {
            entity.hospital_id = Set(hospital_id);
        }
        if let Some(name) = changes.name {
            entity.name = Set(name);
        }
        if let Some(specialization) = changes.specialization {
            entity.specialization = Set(specialization);
        }
        if let Some(phone) = changes.phone {
            entity.phone = Set(phone);
        }

        let result = doctor::Entity::update_many()
            .set(entity)
            .filter(doctor::Column::Id.eq(id))
            .filter(doctor::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(UpdateOutcome::Conflict);
        }

        Ok(self
            .doctor_find_by_id(id)
            .await?
            .map_or(UpdateOutcome::Conflict, UpdateOutcome::Updated))
    }

    async fn doctor_delete_cascade(&self, id: i32) -> anyhow::Result<bool> {
        let tx = self.db.begin().await?;

        if doctor::Entity::find_by_id(id).count(&tx).await? == 0 {
            return Ok(false);
        }
        delete_appointments_where(&tx, appointment::Column::DoctorId.eq(id)).await?;
        doctor::Entity::delete_by_id(id).exec(&tx).await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ============================================================================
// PatientPersistence implementation
// ============================================================================

#[async_trait]
impl PatientPersistence for ExternalDbPersistService {
    async fn patient_find_all(&self) -> anyhow::Result<Vec<PatientInfo>> {
        Ok(patient::Entity::find()
            .order_by_asc(patient::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(PatientInfo::from)
            .collect())
    }

    async fn patient_find_by_id(&self, id: i32) -> anyhow::Result<Option<PatientInfo>> {
        Ok(patient::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(PatientInfo::from))
    }

    async fn patient_find_by_email(&self, email: &str) -> anyhow::Result<Option<PatientInfo>> {
        Ok(patient::Entity::find()
            .filter(patient::Column::Email.eq(email.trim()))
            .one(&self.db)
            .await?
            .map(PatientInfo::from))
    }

    async fn patient_exists(&self, id: i32) -> anyhow::Result<bool> {
        Ok(patient::Entity::find_by_id(id).count(&self.db).await? > 0)
    }

    async fn patient_create(&self, patient: NewPatient) -> anyhow::Result<PatientInfo> {
        let now = now();
        let entity = patient::ActiveModel {
            first_name: Set(patient.first_name),
            last_name: Set(patient.last_name),
            email: Set(patient.email),
            phone: Set(patient.phone),
            date_of_birth: Set(patient.date_of_birth),
            address: Set(patient.address),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(entity.insert(&self.db).await?.into())
    }

    async fn patient_delete(&self, id: i32) -> anyhow::Result<bool> {
        let tx = self.db.begin().await?;

        if patient::Entity::find_by_id(id).count(&tx).await? == 0 {
            return Ok(false);
        }
        delete_appointments_where(&tx, appointment::Column::PatientId.eq(id)).await?;
        patient::Entity::delete_by_id(id).exec(&tx).await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ============================================================================
// AdminPersistence implementation
// ============================================================================

#[async_trait]
impl AdminPersistence for ExternalDbPersistService {
    async fn admin_find_all(&self) -> anyhow::Result<Vec<AdminInfo>> {
        Ok(admin::Entity::find()
            .order_by_asc(admin::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(AdminInfo::from)
            .collect())
    }

    async fn admin_find_by_id(&self, id: i32) -> anyhow::Result<Option<AdminInfo>> {
        Ok(admin::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(AdminInfo::from))
    }

    async fn admin_find_by_email(&self, email: &str) -> anyhow::Result<Option<AdminInfo>> {
        Ok(admin::Entity::find()
            .filter(admin::Column::Email.eq(email.trim()))
            .one(&self.db)
            .await?
            .map(AdminInfo::from))
    }

    async fn admin_create(&self, admin: NewAdmin) -> anyhow::Result<AdminInfo> {
        let now = now();
        let entity = admin::ActiveModel {
            name: Set(admin.name),
            email: Set(admin.email),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        Ok(entity.insert(&self.db).await?.into())
    }

    async fn admin_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AdminChanges,
    ) -> anyhow::Result<UpdateOutcome<AdminInfo>> {
        let mut entity = admin::ActiveModel {
            updated_at: Set(now()),
            version: Set(expected_version + 1),
            ..Default::default()
        };
        if let Some(name) = changes.name {
            entity.name = Set(name);
        }

        let result = admin::Entity::update_many()
            .set(entity)
            .filter(admin::Column::Id.eq(id))
            .filter(admin::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(UpdateOutcome::Conflict);
        }

        Ok(self
            .admin_find_by_id(id)
            .await?
            .map_or(UpdateOutcome::Conflict, UpdateOutcome::Updated))
    }

    async fn admin_delete(&self, id: i32) -> anyhow::Result<bool> {
        let result = admin::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// AppointmentPersistence implementation
// ============================================================================

#[async_trait]
impl AppointmentPersistence for ExternalDbPersistService {
    async fn appointment_find_all(&self) -> anyhow::Result<Vec<AppointmentInfo>> {
        appointment_list(
            appointment::Entity::find()
                .order_by_asc(appointment::Column::Id)
                .all(&self.db)
                .await?,
        )
    }

    async fn appointment_find_by_id(&self, id: i32) -> anyhow::Result<Option<AppointmentInfo>> {
        appointment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(AppointmentInfo::try_from)
            .transpose()
    }

    async fn appointment_find_by_doctor(
        &self,
        doctor_id: i32,
    ) -> anyhow::Result<Vec<AppointmentInfo>> {
        appointment_list(
            appointment::Entity::find()
                .filter(appointment::Column::DoctorId.eq(doctor_id))
                .order_by_asc(appointment::Column::Id)
                .all(&self.db)
                .await?,
        )
    }

    async fn appointment_find_by_patient(
        &self,
        patient_id: i32,
    ) -> anyhow::Result<Vec<AppointmentInfo>> {
        appointment_list(
            appointment::Entity::find()
                .filter(appointment::Column::PatientId.eq(patient_id))
                .order_by_asc(appointment::Column::Id)
                .all(&self.db)
                .await?,
        )
    }

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
    ) -> anyhow::Result<AppointmentInfo> {
        if !self.patient_exists(appointment.patient_id).await? {
            return Err(MedoraError::not_found("Patient", appointment.patient_id).into());
        }
        if !self.doctor_exists(appointment.doctor_id).await? {
            return Err(MedoraError::not_found("Doctor", appointment.doctor_id).into());
        }

        let now = now();
        let entity = appointment::ActiveModel {
            patient_id: Set(appointment.patient_id),
            doctor_id: Set(appointment.doctor_id),
            date: Set(appointment.date),
            time: Set(appointment.time),
            reason: Set(appointment.reason),
            status: Set(appointment.status.as_str().to_string()),
            treatment_record_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        entity.insert(&self.db).await?.try_into()
    }

    async fn appointment_update(
        &self,
        id: i32,
        expected_version: i32,
        changes: AppointmentChanges,
    ) -> anyhow::Result<UpdateOutcome<AppointmentInfo>> {
        let mut entity = appointment::ActiveModel {
            updated_at: Set(now()),
            version: Set(expected_version + 1),
            ..Default::default()
        };
        if let Some(patient_id) = changes.patient_id {
            entity.patient_id = Set(patient_id);
        }
        if let Some(doctor_id) = changes.doctor_id {
            entity.doctor_id = Set(doctor_id);
        }
        if let Some(date) = changes.date {
            entity.date = Set(date);
        }
        if let Some(time) = changes.time {
            entity.time = Set(time);
        }
        if let Some(reason) = changes.reason {
            entity.reason = Set(reason);
        }
        if let Some(status) = changes.status {
            entity.status = Set(status.as_str().to_string());
        }

        let result = appointment::Entity::update_many()
            .set(entity)
            .filter(appointment::Column::Id.eq(id))
            .filter(appointment::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(UpdateOutcome::Conflict);
        }

        Ok(self
            .appointment_find_by_id(id)
            .await?
            .map_or(UpdateOutcome::Conflict, UpdateOutcome::Updated))
    }

    async fn appointment_delete(&self, id: i32) -> anyhow::Result<bool> {
        let tx = self.db.begin().await?;

        if appointment::Entity::find_by_id(id).count(&tx).await? == 0 {
            return Ok(false);
        }
        delete_appointments_where(&tx, appointment::Column::Id.eq(id)).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn treatment_record_find_by_appointment(
        &self,
        appointment_id: i32,
    ) -> anyhow::Result<Option<TreatmentRecordInfo>> {
        Ok(treatment_record::Entity::find()
            .filter(treatment_record::Column::AppointmentId.eq(appointment_id))
            .one(&self.db)
            .await?
            .map(TreatmentRecordInfo::from))
    }

    async fn treatment_record_create(
        &self,
        record: NewTreatmentRecord,
    ) -> anyhow::Result<TreatmentRecordInfo> {
        let tx = self.db.begin().await?;

        let Some(linked) = appointment::Entity::find_by_id(record.appointment_id)
            .one(&tx)
            .await?
        else {
            return Err(MedoraError::not_found("Appointment", record.appointment_id).into());
        };
        let existing = treatment_record::Entity::find()
            .filter(treatment_record::Column::AppointmentId.eq(record.appointment_id))
            .count(&tx)
            .await?;
        if existing > 0 {
            return Err(MedoraError::AlreadyExists(format!(
                "Treatment record for appointment {}",
                record.appointment_id
            ))
            .into());
        }

        let now = now();
        let created = treatment_record::ActiveModel {
            appointment_id: Set(record.appointment_id),
            diagnosis: Set(record.diagnosis),
            treatment: Set(record.treatment),
            prescription: Set(record.prescription),
            notes: Set(record.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&tx)
        .await?;

        let version = linked.version;
        let mut appointment: appointment::ActiveModel = linked.into();
        appointment.treatment_record_id = Set(Some(created.id));
        appointment.updated_at = Set(now);
        appointment.version = Set(version + 1);
        appointment.update(&tx).await?;

        tx.commit().await?;
        Ok(created.into())
    }
}

// ============================================================================
// IdentityPersistence implementation
// ============================================================================

#[async_trait]
impl IdentityPersistence for ExternalDbPersistService {
    async fn account_find_by_email(
        &self,
        account: &AccountRef,
    ) -> anyhow::Result<Option<AccountInfo>> {
        Ok(account::Entity::find()
            .filter(account::Column::Email.eq(account.email()))
            .one(&self.db)
            .await?
            .map(AccountInfo::from))
    }

    async fn account_create(
        &self,
        account: &AccountRef,
        password_hash: &str,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        let tx = self.db.begin().await?;

        let taken = account::Entity::find()
            .filter(account::Column::Email.eq(account.email()))
            .count(&tx)
            .await?;
        if taken > 0 {
            return Ok(IdentityResult::failed(
                "DuplicateEmail",
                format!("Email '{}' is already taken.", account),
            ));
        }

        let created = account::ActiveModel {
            email: Set(account.email().to_string()),
            password_hash: Set(password_hash.to_string()),
            enabled: Set(true),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(&tx)
        .await?;

        if !roles.is_empty() {
            let assignments = roles.iter().map(|role| account_role::ActiveModel {
                account_id: Set(created.id),
                role: Set(role.clone()),
            });
            account_role::Entity::insert_many(assignments)
                .exec_without_returning(&tx)
                .await?;
        }

        tx.commit().await?;
        Ok(IdentityResult::success())
    }

    async fn account_roles(&self, account: &AccountInfo) -> anyhow::Result<Vec<String>> {
        let roles = account_role::Entity::find()
            .select_only()
            .column(account_role::Column::Role)
            .filter(account_role::Column::AccountId.eq(account.id))
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(roles)
    }

    async fn account_add_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        if account::Entity::find_by_id(account.id).count(&self.db).await? == 0 {
            return Ok(account_missing(account));
        }

        let held = self.account_roles(account).await?;
        let missing: Vec<_> = roles
            .iter()
            .filter(|role| !held.contains(role))
            .map(|role| account_role::ActiveModel {
                account_id: Set(account.id),
                role: Set(role.clone()),
            })
            .collect();
        if !missing.is_empty() {
            account_role::Entity::insert_many(missing)
                .exec_without_returning(&self.db)
                .await?;
        }

        Ok(IdentityResult::success())
    }

    async fn account_remove_roles(
        &self,
        account: &AccountInfo,
        roles: &[String],
    ) -> anyhow::Result<IdentityResult> {
        if account::Entity::find_by_id(account.id).count(&self.db).await? == 0 {
            return Ok(account_missing(account));
        }

        account_role::Entity::delete_many()
            .filter(account_role::Column::AccountId.eq(account.id))
            .filter(account_role::Column::Role.is_in(roles.iter().cloned()))
            .exec(&self.db)
            .await?;

        Ok(IdentityResult::success())
    }

    async fn account_delete(&self, account: &AccountInfo) -> anyhow::Result<IdentityResult> {
        let tx = self.db.begin().await?;

        account_role::Entity::delete_many()
            .filter(account_role::Column::AccountId.eq(account.id))
            .exec(&tx)
            .await?;
        let result = account::Entity::delete_by_id(account.id).exec(&tx).await?;
        if result.rows_affected == 0 {
            return Ok(account_missing(account));
        }

        tx.commit().await?;
        Ok(IdentityResult::success())
    }

    async fn account_exists_with_role(&self, role: &str) -> anyhow::Result<bool> {
        let count = account_role::Entity::find()
            .filter(account_role::Column::Role.eq(role))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

fn account_missing(account: &AccountInfo) -> IdentityResult {
    IdentityResult::failed(
        "AccountNotFound",
        format!("Account '{}' does not exist.", account.email),
    )
}

//! Medora Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions for the entity store and the identity store
//! - Persistence trait abstractions over the storage backends
//! - Domain model types for persistence operations

pub mod entity;
pub mod memory;
pub mod model;
pub mod schema;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export persistence traits
pub use traits::{
    AdminPersistence, AppointmentPersistence, DepartmentPersistence, DoctorPersistence,
    EntityPersistence, HospitalPersistence, IdentityPersistence, PatientPersistence,
};

// Re-export SQL backend
pub use sql::ExternalDbPersistService;

// Re-export memory backend
pub use memory::MemoryPersistService;

// Re-export model types
pub use model::{
    AccountInfo, AccountRef, AdminChanges, AdminInfo, AppointmentChanges, AppointmentInfo,
    AppointmentStatus, DepartmentChanges, DepartmentInfo, DoctorChanges, DoctorInfo,
    HospitalChanges, HospitalInfo, IdentityError, IdentityResult, ImageMode, ImageRef, NewAdmin,
    NewAppointment, NewDepartment, NewDoctor, NewHospital, NewPatient, NewTreatmentRecord,
    PatientInfo, StorageMode, TreatmentRecordInfo, UpdateOutcome,
};

//! Persistence traits for the unified storage abstraction layer
//!
//! This module defines the persistence traits that abstract over the storage
//! backends: an external database (MySQL/PostgreSQL/SQLite) and in-process
//! memory tables. The entity store and the identity store are separate
//! traits; they share no transaction.

pub mod admin;
pub mod appointment;
pub mod department;
pub mod doctor;
pub mod hospital;
pub mod identity;
pub mod patient;

pub use admin::AdminPersistence;
pub use appointment::AppointmentPersistence;
pub use department::DepartmentPersistence;
pub use doctor::DoctorPersistence;
pub use hospital::HospitalPersistence;
pub use identity::IdentityPersistence;
pub use patient::PatientPersistence;

use async_trait::async_trait;

use crate::model::StorageMode;

/// Unified entity store trait
///
/// This is the main interface for all domain-entity storage operations.
#[async_trait]
pub trait EntityPersistence:
    HospitalPersistence
    + DepartmentPersistence
    + DoctorPersistence
    + PatientPersistence
    + AdminPersistence
    + AppointmentPersistence
    + Send
    + Sync
{
    /// Get the current storage mode
    fn storage_mode(&self) -> StorageMode;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}

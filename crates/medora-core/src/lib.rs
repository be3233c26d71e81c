//! Medora Core - Entity services and cascade consistency
//!
//! This crate provides:
//! - The cascade-consistency service that removes identity accounts before
//!   the entity-store rows they belong to
//! - Appointment status validation and treatment records
//! - The optimistic update guard
//! - Creation and update flows for every entity

pub mod account;
pub mod admin;
pub mod appointment;
pub mod cascade;
pub mod department;
pub mod doctor;
pub mod guard;
pub mod hospital;
pub mod patient;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountSettings;
pub use cascade::{CascadeService, CascadeSummary, ParentKind};
pub use guard::update_guarded;

use medora_common::{MedoraError, is_blank};

/// Rejects blank values of a required text field
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), MedoraError> {
    if is_blank(value) {
        return Err(MedoraError::ValidationFailed(format!("{} is required", field)));
    }
    Ok(())
}

/// Like [`require_text`] for a field that may be left out of a partial update
pub(crate) fn require_text_if_present(field: &str, value: Option<&str>) -> Result<(), MedoraError> {
    match value {
        Some(value) => require_text(field, value),
        None => Ok(()),
    }
}

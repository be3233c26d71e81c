//! Cascade-consistency service
//!
//! Deleting a parent that owns identity-bearing dependents runs in three
//! ordered phases:
//!
//! 1. resolve: load dependents, require contact emails, look up accounts
//! 2. release: strip roles, then delete each resolved account
//! 3. remove: delete the parent and its structural children in one
//!    entity-store transaction
//!
//! A failure in phase 1 or 2 leaves the entity store untouched. The two
//! stores share no transaction, so a failure in phase 3 leaves accounts
//! already removed; that window is logged at error level.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use medora_common::MedoraError;
use medora_persistence::{AccountInfo, AccountRef, DoctorInfo, EntityPersistence, IdentityPersistence};

/// Kind of entity whose deletion cascades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Hospital,
    Department,
    Admin,
    Doctor,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Hospital => "Hospital",
            ParentKind::Department => "Department",
            ParentKind::Admin => "Admin",
            ParentKind::Doctor => "Doctor",
        }
    }
}

impl Display for ParentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful cascade removed besides the parent row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub accounts_removed: usize,
    pub doctors_removed: usize,
}

pub struct CascadeService<'a> {
    entities: &'a dyn EntityPersistence,
    identity: &'a dyn IdentityPersistence,
}

impl<'a> CascadeService<'a> {
    pub fn new(entities: &'a dyn EntityPersistence, identity: &'a dyn IdentityPersistence) -> Self {
        Self { entities, identity }
    }

    /// Delete `parent_kind` row `parent_id` and everything that depends on it.
    ///
    /// Errors: `NotFound` when the parent is absent, `MissingContactInfo`
    /// when a doctor has no email, `RoleRevocationFailed` and
    /// `IdentityDeletionFailed` when the identity store refuses, and
    /// `HasDependents` for a hospital that still has departments.
    pub async fn delete_with_cascade(
        &self,
        parent_kind: ParentKind,
        parent_id: i32,
    ) -> anyhow::Result<CascadeSummary> {
        tracing::info!(parent = %parent_kind, id = parent_id, "cascade delete requested");

        let summary = match parent_kind {
            ParentKind::Hospital => self.delete_hospital(parent_id).await?,
            ParentKind::Department => self.delete_department(parent_id).await?,
            ParentKind::Admin => self.delete_admin(parent_id).await?,
            ParentKind::Doctor => self.delete_doctor(parent_id).await?,
        };

        tracing::info!(
            parent = %parent_kind,
            id = parent_id,
            accounts_removed = summary.accounts_removed,
            doctors_removed = summary.doctors_removed,
            "cascade delete completed"
        );
        Ok(summary)
    }

    async fn delete_hospital(&self, id: i32) -> anyhow::Result<CascadeSummary> {
        if !self.entities.hospital_exists(id).await? {
            return Err(MedoraError::not_found(ParentKind::Hospital, id).into());
        }
        if !self.entities.hospital_delete(id).await? {
            return Err(MedoraError::not_found(ParentKind::Hospital, id).into());
        }
        Ok(CascadeSummary::default())
    }

    async fn delete_department(&self, id: i32) -> anyhow::Result<CascadeSummary> {
        if self.entities.department_find_by_id(id).await?.is_none() {
            return Err(MedoraError::not_found(ParentKind::Department, id).into());
        }
        let doctors = self.entities.doctor_find_by_department(id).await?;

        let contacts = require_contacts(&doctors)?;
        let accounts = self.resolve_accounts(&contacts).await?;
        self.release_accounts(&accounts).await?;

        let removed = self.entities.department_delete_cascade(id).await;
        self.finish_structural_delete(ParentKind::Department, id, removed, accounts.len())?;

        Ok(CascadeSummary {
            accounts_removed: accounts.len(),
            doctors_removed: doctors.len(),
        })
    }

    async fn delete_doctor(&self, id: i32) -> anyhow::Result<CascadeSummary> {
        let Some(doctor) = self.entities.doctor_find_by_id(id).await? else {
            return Err(MedoraError::not_found(ParentKind::Doctor, id).into());
        };

        let contacts = require_contacts(std::slice::from_ref(&doctor))?;
        let accounts = self.resolve_accounts(&contacts).await?;
        self.release_accounts(&accounts).await?;

        let removed = self.entities.doctor_delete_cascade(id).await;
        self.finish_structural_delete(ParentKind::Doctor, id, removed, accounts.len())?;

        Ok(CascadeSummary {
            accounts_removed: accounts.len(),
            doctors_removed: 1,
        })
    }

    async fn delete_admin(&self, id: i32) -> anyhow::Result<CascadeSummary> {
        let Some(admin) = self.entities.admin_find_by_id(id).await? else {
            return Err(MedoraError::not_found(ParentKind::Admin, id).into());
        };

        // a blank email or a missing account only skips the identity pass
        let contacts: Vec<AccountRef> = admin.account_ref().into_iter().collect();
        let accounts = self.resolve_accounts(&contacts).await?;
        self.release_accounts(&accounts).await?;

        let removed = self.entities.admin_delete(id).await;
        self.finish_structural_delete(ParentKind::Admin, id, removed, accounts.len())?;

        Ok(CascadeSummary {
            accounts_removed: accounts.len(),
            doctors_removed: 0,
        })
    }

    /// Look up every account before any is modified. Shared emails resolve once.
    async fn resolve_accounts(&self, contacts: &[AccountRef]) -> anyhow::Result<Vec<AccountInfo>> {
        let mut resolved = BTreeMap::new();
        for contact in contacts {
            match self.identity.account_find_by_email(contact).await? {
                Some(account) => {
                    resolved.insert(account.id, account);
                }
                None => tracing::debug!(email = %contact, "no identity account to remove"),
            }
        }
        Ok(resolved.into_values().collect())
    }

    async fn release_accounts(&self, accounts: &[AccountInfo]) -> anyhow::Result<()> {
        for account in accounts {
            let roles = self.identity.account_roles(account).await?;
            if !roles.is_empty() {
                let result = self.identity.account_remove_roles(account, &roles).await?;
                if !result.succeeded {
                    tracing::warn!(email = %account.email, errors = %result.describe(), "role revocation rejected");
                    return Err(MedoraError::RoleRevocationFailed {
                        email: account.email.clone(),
                        detail: result.describe(),
                    }
                    .into());
                }
            }

            let result = self.identity.account_delete(account).await?;
            if !result.succeeded {
                tracing::warn!(email = %account.email, errors = %result.describe(), "account deletion rejected");
                return Err(MedoraError::IdentityDeletionFailed {
                    email: account.email.clone(),
                    detail: result.describe(),
                }
                .into());
            }
            tracing::debug!(email = %account.email, "identity account removed");
        }
        Ok(())
    }

    /// Maps the structural delete result, logging accounts left without a parent row
    fn finish_structural_delete(
        &self,
        kind: ParentKind,
        id: i32,
        removed: anyhow::Result<bool>,
        accounts_removed: usize,
    ) -> anyhow::Result<()> {
        match removed {
            Ok(true) => Ok(()),
            Ok(false) => {
                if accounts_removed > 0 {
                    tracing::error!(
                        parent = %kind,
                        id,
                        accounts_removed,
                        "identity accounts removed but parent row vanished before structural delete"
                    );
                }
                Err(MedoraError::not_found(kind, id).into())
            }
            Err(e) => {
                tracing::error!(
                    parent = %kind,
                    id,
                    accounts_removed,
                    error = %e,
                    "identity accounts removed but structural delete failed, parent row orphaned"
                );
                Err(e)
            }
        }
    }
}

/// All-or-nothing contact check run before any mutation
fn require_contacts(doctors: &[DoctorInfo]) -> Result<Vec<AccountRef>, MedoraError> {
    doctors
        .iter()
        .map(|doctor| {
            doctor
                .account_ref()
                .ok_or(MedoraError::MissingContactInfo {
                    doctor_id: doctor.id,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use medora_persistence::{
        AdminPersistence, AppointmentPersistence, DepartmentPersistence, DoctorPersistence,
        HospitalPersistence,
    };

    use super::*;
    use crate::testing::*;

    fn category(err: &anyhow::Error) -> Option<&'static str> {
        err.downcast_ref::<MedoraError>().map(MedoraError::category)
    }

    #[tokio::test]
    async fn test_department_with_blank_doctor_email_is_untouched() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let a = seed_doctor(&store, &department, "a@x.com").await;
        let b = seed_doctor(&store, &department, "").await;

        let err = CascadeService::new(&store, &store)
            .delete_with_cascade(ParentKind::Department, department.id)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<MedoraError>(),
            Some(&MedoraError::MissingContactInfo { doctor_id: b.id })
        );
        assert!(store.department_exists(department.id).await.unwrap());
        assert!(store.doctor_exists(a.id).await.unwrap());
        assert!(store.doctor_exists(b.id).await.unwrap());
        assert!(account_exists(&store, "a@x.com").await);
    }

    #[tokio::test]
    async fn test_department_delete_removes_doctor_accounts() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let a = seed_doctor(&store, &department, "a@x.com").await;
        let b = seed_doctor(&store, &department, "b@x.com").await;
        // b has no identity account, which is not an error
        remove_account(&store, "b@x.com").await;
        let appointment = seed_appointment(&store, &a).await;

        let summary = CascadeService::new(&store, &store)
            .delete_with_cascade(ParentKind::Department, department.id)
            .await
            .unwrap();

        assert_eq!(
            summary,
            CascadeSummary {
                accounts_removed: 1,
                doctors_removed: 2
            }
        );
        assert!(!store.department_exists(department.id).await.unwrap());
        assert!(!store.doctor_exists(a.id).await.unwrap());
        assert!(!store.doctor_exists(b.id).await.unwrap());
        assert!(
            store
                .appointment_find_by_id(appointment.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!account_exists(&store, "a@x.com").await);
    }

    #[tokio::test]
    async fn test_admin_delete_removes_account_and_roles() {
        let store = store();
        let admin = seed_admin(&store, "boss@x.com").await;

        CascadeService::new(&store, &store)
            .delete_with_cascade(ParentKind::Admin, admin.id)
            .await
            .unwrap();

        assert!(store.admin_find_by_id(admin.id).await.unwrap().is_none());
        assert!(!account_exists(&store, "boss@x.com").await);
        assert!(roles_of(&store, "boss@x.com").await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_delete_without_account() {
        let store = store();
        let admin = seed_admin(&store, "boss@x.com").await;
        remove_account(&store, "boss@x.com").await;
        let blank = seed_admin(&store, "").await;

        let service = CascadeService::new(&store, &store);
        let summary = service
            .delete_with_cascade(ParentKind::Admin, admin.id)
            .await
            .unwrap();
        assert_eq!(summary.accounts_removed, 0);
        service
            .delete_with_cascade(ParentKind::Admin, blank.id)
            .await
            .unwrap();

        assert!(store.admin_find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let store = store();
        let admin = seed_admin(&store, "boss@x.com").await;
        let service = CascadeService::new(&store, &store);

        service
            .delete_with_cascade(ParentKind::Admin, admin.id)
            .await
            .unwrap();
        let err = service
            .delete_with_cascade(ParentKind::Admin, admin.id)
            .await
            .unwrap_err();
        assert_eq!(category(&err), Some("NotFound"));
    }

    #[tokio::test]
    async fn test_hospital_delete_is_restricted() {
        let store = store();
        let (hospital, department) = seed_department(&store).await;
        let service = CascadeService::new(&store, &store);

        let err = service
            .delete_with_cascade(ParentKind::Hospital, hospital.id)
            .await
            .unwrap_err();
        assert_eq!(category(&err), Some("HasDependents"));
        assert!(store.hospital_exists(hospital.id).await.unwrap());
        assert!(store.department_exists(department.id).await.unwrap());

        let empty = seed_hospital(&store, "Empty").await;
        service
            .delete_with_cascade(ParentKind::Hospital, empty.id)
            .await
            .unwrap();
        assert!(!store.hospital_exists(empty.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_role_revocation_failure_aborts_before_entity_delete() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let a = seed_doctor(&store, &department, "a@x.com").await;
        let identity = FailingIdentity::new(&store).fail_remove_roles();

        let err = CascadeService::new(&store, &identity)
            .delete_with_cascade(ParentKind::Department, department.id)
            .await
            .unwrap_err();

        assert_eq!(category(&err), Some("RoleRevocationFailed"));
        assert!(store.department_exists(department.id).await.unwrap());
        assert!(store.doctor_exists(a.id).await.unwrap());
        assert!(account_exists(&store, "a@x.com").await);
    }

    #[tokio::test]
    async fn test_account_deletion_failure_aborts_before_entity_delete() {
        let store = store();
        let admin = seed_admin(&store, "boss@x.com").await;
        let identity = FailingIdentity::new(&store).fail_delete();

        let err = CascadeService::new(&store, &identity)
            .delete_with_cascade(ParentKind::Admin, admin.id)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to delete user boss@x.com: identity store unavailable"
        );
        assert!(store.admin_find_by_id(admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_doctor_delete() {
        let store = store();
        let (_, department) = seed_department(&store).await;
        let doctor = seed_doctor(&store, &department, "a@x.com").await;
        let blank = seed_doctor(&store, &department, " ").await;
        let service = CascadeService::new(&store, &store);

        service
            .delete_with_cascade(ParentKind::Doctor, doctor.id)
            .await
            .unwrap();
        assert!(!store.doctor_exists(doctor.id).await.unwrap());
        assert!(!account_exists(&store, "a@x.com").await);

        let err = service
            .delete_with_cascade(ParentKind::Doctor, blank.id)
            .await
            .unwrap_err();
        assert_eq!(category(&err), Some("MissingContactInfo"));
        assert!(store.doctor_exists(blank.id).await.unwrap());
    }
}

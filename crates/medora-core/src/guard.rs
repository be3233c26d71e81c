//! Optimistic update guard
//!
//! Writes carry the version that was read. When the store reports that no row
//! matched, the guard tells a vanished row apart from a concurrent edit.
//! There is no retry and no merge.

use std::future::Future;

use medora_common::MedoraError;
use medora_persistence::UpdateOutcome;

/// Read the row, hand it to `write`, and classify a version conflict.
///
/// `load` is called once before the write and once more after a conflict.
pub async fn update_guarded<T, L, LF, W, WF>(
    resource: &str,
    id: i32,
    load: L,
    write: W,
) -> anyhow::Result<T>
where
    L: Fn() -> LF,
    LF: Future<Output = anyhow::Result<Option<T>>>,
    W: FnOnce(T) -> WF,
    WF: Future<Output = anyhow::Result<UpdateOutcome<T>>>,
{
    let current = load()
        .await?
        .ok_or_else(|| MedoraError::not_found(resource, id))?;

    match write(current).await? {
        UpdateOutcome::Updated(updated) => Ok(updated),
        UpdateOutcome::Conflict => {
            if load().await?.is_none() {
                Err(MedoraError::not_found(resource, id).into())
            } else {
                tracing::debug!(resource, id, "stale version rejected");
                Err(MedoraError::ConcurrencyConflict(format!("{} {}", resource, id)).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use medora_persistence::{
        HospitalChanges, HospitalInfo, HospitalPersistence, MemoryPersistService, NewHospital,
    };

    use super::*;

    async fn store_with_hospital() -> (MemoryPersistService, i32) {
        let store = MemoryPersistService::new();
        let hospital = store
            .hospital_create(NewHospital {
                name: "General".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (store, hospital.id)
    }

    fn rename(name: &str) -> HospitalChanges {
        HospitalChanges {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_update_applies_with_read_version() {
        let (store, id) = store_with_hospital().await;

        let updated = update_guarded(
            "Hospital",
            id,
            || store.hospital_find_by_id(id),
            |current: HospitalInfo| store.hospital_update(id, current.version, rename("Renamed")),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let (store, id) = store_with_hospital().await;
        let store = &store;

        let err = update_guarded(
            "Hospital",
            id,
            || store.hospital_find_by_id(id),
            |current: HospitalInfo| async move {
                // another writer wins between our read and our write
                store
                    .hospital_update(id, current.version, rename("First"))
                    .await?;
                store
                    .hospital_update(id, current.version, rename("Second"))
                    .await
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::ConcurrencyConflict(_))
        ));
        let stored = store.hospital_find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "First");
    }

    #[tokio::test]
    async fn test_row_deleted_before_write_is_not_found() {
        let (store, id) = store_with_hospital().await;
        let store = &store;

        let err = update_guarded(
            "Hospital",
            id,
            || store.hospital_find_by_id(id),
            |current: HospitalInfo| async move {
                store.hospital_delete(id).await?;
                store
                    .hospital_update(id, current.version, rename("Gone"))
                    .await
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let store = MemoryPersistService::new();
        let err = update_guarded(
            "Hospital",
            42,
            || store.hospital_find_by_id(42),
            |current: HospitalInfo| store.hospital_update(42, current.version, rename("X")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Hospital 42 not found.");
    }
}

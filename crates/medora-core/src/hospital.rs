//! Hospital create and update flows

use medora_common::MedoraError;
use medora_persistence::{
    EntityPersistence, HospitalChanges, HospitalInfo, NewHospital,
};

use crate::guard::update_guarded;
use crate::{require_text, require_text_if_present};

pub async fn create_hospital(
    entities: &dyn EntityPersistence,
    hospital: NewHospital,
) -> anyhow::Result<HospitalInfo> {
    require_text("name", &hospital.name)?;

    let created = entities.hospital_create(hospital).await?;
    tracing::info!(id = created.id, name = %created.name, "hospital created");
    Ok(created)
}

/// Apply a partial update; an absent image keeps the stored one
pub async fn update_hospital(
    entities: &dyn EntityPersistence,
    id: i32,
    changes: HospitalChanges,
) -> anyhow::Result<HospitalInfo> {
    require_text_if_present("name", changes.name.as_deref())?;

    update_guarded(
        "Hospital",
        id,
        || entities.hospital_find_by_id(id),
        move |current: HospitalInfo| entities.hospital_update(id, current.version, changes),
    )
    .await
}

pub async fn find_hospital(
    entities: &dyn EntityPersistence,
    id: i32,
) -> anyhow::Result<HospitalInfo> {
    entities
        .hospital_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Hospital", id).into())
}

#[cfg(test)]
mod tests {
    use medora_persistence::HospitalPersistence;

    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn test_create_hospital_requires_name() {
        let store = store();

        let err = create_hospital(
            &store,
            NewHospital {
                name: "  ".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::ValidationFailed(_))
        ));
        assert!(store.hospital_find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_hospital_keeps_image_when_absent() {
        let store = store();
        let created = create_hospital(
            &store,
            NewHospital {
                name: "General".to_string(),
                image: Some(vec![1, 2, 3]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_hospital(
            &store,
            created.id,
            HospitalChanges {
                phone: Some("555-0199".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.phone, "555-0199");
        assert_eq!(updated.image, Some(vec![1, 2, 3]));
        assert_eq!(updated.version, created.version + 1);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_hospital() {
        let store = store();

        let err = update_hospital(&store, 41, HospitalChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::NotFound(_))
        ));
        assert!(find_hospital(&store, 41).await.is_err());
    }
}

//! Department create and update flows

use medora_common::MedoraError;
use medora_persistence::{
    DepartmentChanges, DepartmentInfo, DoctorInfo, EntityPersistence, NewDepartment,
};

use crate::guard::update_guarded;
use crate::{require_text, require_text_if_present};

async fn require_hospital(entities: &dyn EntityPersistence, hospital_id: i32) -> anyhow::Result<()> {
    if !entities.hospital_exists(hospital_id).await? {
        return Err(MedoraError::not_found("Hospital", hospital_id).into());
    }
    Ok(())
}

pub async fn create_department(
    entities: &dyn EntityPersistence,
    department: NewDepartment,
) -> anyhow::Result<DepartmentInfo> {
    require_text("name", &department.name)?;
    require_hospital(entities, department.hospital_id).await?;

    let created = entities.department_create(department).await?;
    tracing::info!(
        id = created.id,
        hospital_id = created.hospital_id,
        "department created"
    );
    Ok(created)
}

/// Apply a partial update. A new hospital id must reference an existing hospital.
pub async fn update_department(
    entities: &dyn EntityPersistence,
    id: i32,
    changes: DepartmentChanges,
) -> anyhow::Result<DepartmentInfo> {
    require_text_if_present("name", changes.name.as_deref())?;

    update_guarded(
        "Department",
        id,
        || entities.department_find_by_id(id),
        move |current: DepartmentInfo| async move {
            if let Some(hospital_id) = changes.hospital_id
                && hospital_id != current.hospital_id
            {
                require_hospital(entities, hospital_id).await?;
            }
            entities
                .department_update(id, current.version, changes)
                .await
        },
    )
    .await
}

pub async fn find_department(
    entities: &dyn EntityPersistence,
    id: i32,
) -> anyhow::Result<DepartmentInfo> {
    entities
        .department_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Department", id).into())
}

/// Doctors working in a department; `NotFound` when the department is absent
pub async fn department_doctors(
    entities: &dyn EntityPersistence,
    id: i32,
) -> anyhow::Result<Vec<DoctorInfo>> {
    if !entities.department_exists(id).await? {
        return Err(MedoraError::not_found("Department", id).into());
    }
    entities.doctor_find_by_department(id).await
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "appointment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: Date,
    pub time: Time,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    /// One of Scheduled, Confirmed, Completed, Cancelled
    pub status: String,
    /// Soft pointer to the linked treatment record; the record's
    /// `appointment_id` carries the enforced key
    #[sea_orm(nullable)]
    pub treatment_record_id: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patient::Entity",
        from = "Column::PatientId",
        to = "super::patient::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "super::doctor::Entity",
        from = "Column::DoctorId",
        to = "super::doctor::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Doctor,
    #[sea_orm(has_one = "super::treatment_record::Entity")]
    TreatmentRecord,
}

impl Related<super::patient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::doctor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctor.def()
    }
}

impl Related<super::treatment_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TreatmentRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

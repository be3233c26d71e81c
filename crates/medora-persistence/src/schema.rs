//! Schema bootstrap from entity definitions

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};

use crate::entity::{
    account, account_role, admin, appointment, department, doctor, hospital, patient,
    treatment_record,
};

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(statement.if_not_exists())).await?;
    Ok(())
}

/// Create all tables that do not exist yet, parents before children
pub async fn create_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    create_table(db, hospital::Entity).await?;
    create_table(db, department::Entity).await?;
    create_table(db, doctor::Entity).await?;
    create_table(db, patient::Entity).await?;
    create_table(db, admin::Entity).await?;
    create_table(db, appointment::Entity).await?;
    create_table(db, treatment_record::Entity).await?;
    create_table(db, account::Entity).await?;
    create_table(db, account_role::Entity).await?;

    tracing::info!(backend = ?db.get_database_backend(), "database schema ready");
    Ok(())
}

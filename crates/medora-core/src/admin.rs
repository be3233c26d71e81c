//! Admin create and update flows

use medora_common::{MedoraError, ROLE_ADMIN};
use medora_persistence::{
    AdminChanges, AdminInfo, EntityPersistence, IdentityPersistence, NewAdmin,
};

use crate::account::{
    AccountSettings, compensate_on_error, ensure_email_available, provision_account,
    require_account_ref,
};
use crate::guard::update_guarded;
use crate::{require_text, require_text_if_present};

pub async fn create_admin(
    entities: &dyn EntityPersistence,
    identity: &dyn IdentityPersistence,
    settings: AccountSettings,
    mut admin: NewAdmin,
    password: &str,
) -> anyhow::Result<AdminInfo> {
    require_text("name", &admin.name)?;
    let account = require_account_ref(&admin.email)?;
    medora_auth::service::password::validate_password(password)?;
    ensure_email_available(identity, &account).await?;

    admin.email = account.email().to_string();
    let created = entities.admin_create(admin).await?;

    let provisioned = provision_account(identity, settings, &account, password, ROLE_ADMIN).await;
    compensate_on_error(provisioned, "Admin", created.id, || {
        entities.admin_delete(created.id)
    })
    .await?;

    tracing::info!(id = created.id, email = %account, "admin created");
    Ok(created)
}

/// Only the name of an admin can change
pub async fn update_admin(
    entities: &dyn EntityPersistence,
    id: i32,
    changes: AdminChanges,
) -> anyhow::Result<AdminInfo> {
    require_text_if_present("name", changes.name.as_deref())?;

    update_guarded(
        "Admin",
        id,
        || entities.admin_find_by_id(id),
        move |current: AdminInfo| entities.admin_update(id, current.version, changes),
    )
    .await
}

pub async fn find_admin(entities: &dyn EntityPersistence, id: i32) -> anyhow::Result<AdminInfo> {
    entities
        .admin_find_by_id(id)
        .await?
        .ok_or_else(|| MedoraError::not_found("Admin", id).into())
}

#[cfg(test)]
mod tests {
    use medora_auth::service::account::authenticate;
    use medora_persistence::AdminPersistence;

    use super::*;
    use crate::testing::*;

    const FAST: AccountSettings = AccountSettings { bcrypt_cost: 4 };

    fn new_admin(email: &str) -> NewAdmin {
        NewAdmin {
            name: "Ada".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_admin_can_log_in() {
        let store = store();

        let admin = create_admin(&store, &store, FAST, new_admin("ada@x.com"), "pw1")
            .await
            .unwrap();
        assert_eq!(admin.version, 1);

        let login = authenticate(&store, "ada@x.com", "pw1").await.unwrap();
        assert_eq!(login.roles, vec![ROLE_ADMIN]);
    }

    #[tokio::test]
    async fn test_create_admin_compensates() {
        let store = store();
        let identity = FailingIdentity::new(&store).fail_create();

        let result = create_admin(&store, &identity, FAST, new_admin("ada@x.com"), "pw1").await;

        assert!(result.is_err());
        assert!(store.admin_find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_admin_name() {
        let store = store();
        let admin = seed_admin(&store, "ada@x.com").await;

        let updated = update_admin(
            &store,
            admin.id,
            AdminChanges {
                name: Some("Ada L.".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.email, admin.email);

        let err = update_admin(
            &store,
            admin.id,
            AdminChanges {
                name: Some(String::new()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MedoraError>(),
            Some(MedoraError::ValidationFailed(_))
        ));
    }
}

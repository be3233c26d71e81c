//! HTTP server setup

use std::sync::Arc;

use actix_web::{App, HttpServer, Scope, dev::Server, middleware::Logger, web};

use medora_core::account::bootstrap_admin;
use medora_persistence::{
    ExternalDbPersistService, MemoryPersistService, StorageMode, schema::create_schema,
};

use crate::api;
use crate::middleware::auth::Authentication;
use crate::model::common::{AppState, Configuration};

/// Open the configured backend and create the schema when it is a database
pub async fn build_state(configuration: Configuration) -> anyhow::Result<AppState> {
    let storage_mode = configuration.storage_mode()?;
    tracing::info!(storage_mode = %storage_mode, "opening storage");

    let state = match storage_mode {
        StorageMode::Memory => {
            AppState::new(configuration, Arc::new(MemoryPersistService::new()))
        }
        StorageMode::ExternalDb => {
            let db = configuration.database_connection().await?;
            create_schema(&db).await?;
            AppState::new(configuration, Arc::new(ExternalDbPersistService::new(db)))
        }
    };

    if let Some((email, password)) = state.configuration.bootstrap_admin()
        && bootstrap_admin(
            state.entities(),
            state.identity(),
            state.account_settings(),
            &email,
            &password,
        )
        .await?
    {
        tracing::info!(email = %email, "bootstrap admin account ready");
    }

    Ok(state)
}

/// All API routes under `context_path`
pub fn configure_routes(context_path: &str) -> Scope {
    web::scope(context_path)
        .app_data(api::model::json_config())
        .service(api::auth::routes())
        .service(api::admin::routes())
        .service(api::hospital::routes())
        .service(api::department::routes())
        .service(api::doctor::routes())
        .service(api::patient::routes())
        .service(api::appointment::routes())
        .service(api::health::health)
}

pub fn main_server(app_state: Arc<AppState>) -> Result<Server, std::io::Error> {
    let address = app_state.configuration.server_address();
    let port = app_state.configuration.server_port();
    let context_path = app_state.context_path();

    tracing::info!(address = %address, port, context_path = %context_path, "starting HTTP server");

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Authentication)
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .service(configure_routes(&context_path))
    })
    .bind((address, port))?
    .run())
}

//! Application state shared across all handlers

use std::sync::Arc;

use medora_core::{AccountSettings, CascadeService};
use medora_persistence::{EntityPersistence, IdentityPersistence, ImageMode};

use super::config::Configuration;

/// Both store handles usually point at the same backend
#[derive(Clone)]
pub struct AppState {
    pub configuration: Configuration,
    pub entities: Arc<dyn EntityPersistence>,
    pub identity: Arc<dyn IdentityPersistence>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("configuration", &self.configuration)
            .field("storage_mode", &self.entities.storage_mode())
            .field("identity", &"<dyn IdentityPersistence>")
            .finish()
    }
}

impl AppState {
    /// Serve entity and identity operations from one backend
    pub fn new<P>(configuration: Configuration, store: Arc<P>) -> Self
    where
        P: EntityPersistence + IdentityPersistence + 'static,
    {
        Self {
            configuration,
            entities: store.clone(),
            identity: store,
        }
    }

    pub fn entities(&self) -> &dyn EntityPersistence {
        self.entities.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityPersistence {
        self.identity.as_ref()
    }

    pub fn cascade(&self) -> CascadeService<'_> {
        CascadeService::new(self.entities(), self.identity())
    }

    pub fn account_settings(&self) -> AccountSettings {
        self.configuration.account_settings()
    }

    /// Falls back to inline images on an unreadable setting
    pub fn image_mode(&self) -> ImageMode {
        self.configuration.image_mode().unwrap_or_default()
    }

    pub fn context_path(&self) -> String {
        self.configuration.server_context_path()
    }
}

//! Configuration management for the Medora server
//!
//! Sources, lowest precedence first: `conf/application.yml`, `MEDORA_*`
//! environment variables, command line flags.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use medora_auth::model::{
    AUTH_ENABLED, DEFAULT_TOKEN_EXPIRE_SECONDS, TOKEN_EXPIRE_SECONDS, TOKEN_SECRET_KEY,
};
use medora_core::AccountSettings;
use medora_persistence::{ImageMode, StorageMode};

use crate::startup::LoggingConfig;

use super::constants::{
    BCRYPT_COST, BOOTSTRAP_ADMIN_EMAIL, BOOTSTRAP_ADMIN_PASSWORD, CONFIG_FILE, DB_ACQUIRE_TIMEOUT,
    DB_CONNECT_TIMEOUT, DB_IDLE_TIMEOUT, DB_MAX_LIFETIME, DB_POOL_MAX, DB_POOL_MIN,
    DB_SQLX_LOGGING, DB_URL, DEFAULT_BCRYPT_COST, DEFAULT_CONTEXT_PATH, DEFAULT_SERVER_ADDRESS,
    DEFAULT_SERVER_PORT, IMAGE_MODE, LOGS_CONSOLE, LOGS_FILE, LOGS_LEVEL, LOGS_PATH,
    SERVER_ADDRESS, SERVER_CONTEXT_PATH, SERVER_PORT, STORAGE_MODE,
};

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(version, about = "Medora multi-hospital management server")]
struct Cli {
    #[arg(long = "db-url", env = "DATABASE_URL")]
    database_url: Option<String>,
    /// `memory` or `external_db`
    #[arg(short = 's', long = "storage-mode")]
    storage_mode: Option<String>,
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
}

/// Application configuration loaded from config files, environment and flags
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> anyhow::Result<Self> {
        let args = Cli::parse();
        let mut builder = Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix("MEDORA")
                    .separator("_")
                    .keep_prefix(true)
                    .try_parsing(true),
            );

        if let Some(v) = args.database_url {
            builder = builder.set_override(DB_URL, v)?;
        }
        if let Some(v) = args.storage_mode {
            builder = builder.set_override(STORAGE_MODE, v)?;
        }
        if let Some(v) = args.port {
            builder = builder.set_override(SERVER_PORT, v as i64)?;
        }

        Ok(Configuration {
            config: builder.build()?,
        })
    }

    /// Wrap an already built config, used by tests and embedding callers
    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string(SERVER_ADDRESS)
            .unwrap_or(DEFAULT_SERVER_ADDRESS.to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int(SERVER_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Route prefix, always starting with `/` and without a trailing one
    pub fn server_context_path(&self) -> String {
        let path = self
            .config
            .get_string(SERVER_CONTEXT_PATH)
            .unwrap_or(DEFAULT_CONTEXT_PATH.to_string());
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    // ========================================================================
    // Authentication Configuration
    // ========================================================================

    pub fn auth_enabled(&self) -> bool {
        self.config.get_bool(AUTH_ENABLED).unwrap_or(true)
    }

    pub fn token_secret_key(&self) -> String {
        self.config
            .get_string(TOKEN_SECRET_KEY)
            .unwrap_or_default()
    }

    pub fn auth_token_expire_seconds(&self) -> i64 {
        self.config
            .get_int(TOKEN_EXPIRE_SECONDS)
            .unwrap_or(DEFAULT_TOKEN_EXPIRE_SECONDS)
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.config
            .get_int(BCRYPT_COST)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_BCRYPT_COST)
    }

    pub fn account_settings(&self) -> AccountSettings {
        AccountSettings {
            bcrypt_cost: self.bcrypt_cost(),
        }
    }

    /// Email and password of the admin created on first start
    pub fn bootstrap_admin(&self) -> Option<(String, String)> {
        let email = self.config.get_string(BOOTSTRAP_ADMIN_EMAIL).ok()?;
        let password = self.config.get_string(BOOTSTRAP_ADMIN_PASSWORD).ok()?;
        Some((email, password))
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    pub fn storage_mode(&self) -> anyhow::Result<StorageMode> {
        match self.config.get_string(STORAGE_MODE) {
            Ok(mode) => mode.parse().map_err(anyhow::Error::msg),
            Err(_) => Ok(StorageMode::Memory),
        }
    }

    pub fn image_mode(&self) -> anyhow::Result<ImageMode> {
        match self.config.get_string(IMAGE_MODE) {
            Ok(mode) => mode.parse().map_err(anyhow::Error::msg),
            Err(_) => Ok(ImageMode::default()),
        }
    }

    pub fn connect_options(&self) -> anyhow::Result<ConnectOptions> {
        let max_connections = self.config.get_int(DB_POOL_MAX).unwrap_or(20) as u32;
        let min_connections = self.config.get_int(DB_POOL_MIN).unwrap_or(1) as u32;
        let connect_timeout = self.config.get_int(DB_CONNECT_TIMEOUT).unwrap_or(30) as u64;
        let acquire_timeout = self.config.get_int(DB_ACQUIRE_TIMEOUT).unwrap_or(8) as u64;
        let idle_timeout = self.config.get_int(DB_IDLE_TIMEOUT).unwrap_or(600) as u64;
        let max_lifetime = self.config.get_int(DB_MAX_LIFETIME).unwrap_or(1800) as u64;
        let sqlx_logging = self.config.get_bool(DB_SQLX_LOGGING).unwrap_or(false);

        let url = self.config.get_string(DB_URL)?;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .sqlx_logging(sqlx_logging);

        tracing::info!(
            max_connections,
            min_connections,
            connect_timeout,
            idle_timeout,
            max_lifetime,
            sqlx_logging,
            "Database connection pool configured"
        );
        Ok(opt)
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        Ok(Database::connect(self.connect_options()?).await?)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGS_PATH).ok(),
            self.config.get_bool(LOGS_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGS_FILE).unwrap_or(true),
            self.config
                .get_string(LOGS_LEVEL)
                .unwrap_or("info".to_string()),
        )
    }
}

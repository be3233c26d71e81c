//! Configuration keys and defaults for the Medora server

pub const SERVER_ADDRESS: &str = "medora.server.address";
pub const SERVER_PORT: &str = "medora.server.port";
pub const SERVER_CONTEXT_PATH: &str = "medora.server.context.path";

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_CONTEXT_PATH: &str = "/api";

pub const STORAGE_MODE: &str = "medora.storage.mode";

pub const DB_URL: &str = "medora.db.url";
pub const DB_POOL_MAX: &str = "medora.db.pool.max.connections";
pub const DB_POOL_MIN: &str = "medora.db.pool.min.connections";
pub const DB_CONNECT_TIMEOUT: &str = "medora.db.pool.connect.timeout";
pub const DB_ACQUIRE_TIMEOUT: &str = "medora.db.pool.acquire.timeout";
pub const DB_IDLE_TIMEOUT: &str = "medora.db.pool.idle.timeout";
pub const DB_MAX_LIFETIME: &str = "medora.db.pool.max.lifetime";
pub const DB_SQLX_LOGGING: &str = "medora.db.pool.sqlx.logging";

pub const BCRYPT_COST: &str = "medora.auth.bcrypt.cost";
pub const DEFAULT_BCRYPT_COST: u32 = 10;

pub const IMAGE_MODE: &str = "medora.image.mode";

pub const BOOTSTRAP_ADMIN_EMAIL: &str = "medora.bootstrap.admin.email";
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "medora.bootstrap.admin.password";

pub const LOGS_PATH: &str = "medora.logs.path";
pub const LOGS_CONSOLE: &str = "medora.logs.console";
pub const LOGS_FILE: &str = "medora.logs.file";
pub const LOGS_LEVEL: &str = "medora.logs.level";

pub const CONFIG_FILE: &str = "conf/application.yml";

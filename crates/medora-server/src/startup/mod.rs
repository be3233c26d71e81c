//! Server startup: logging, storage selection and the HTTP server

pub mod http;
pub mod logging;

pub use http::{build_state, configure_routes, main_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};

// Medora HTTP server library
// Handlers, middleware and startup wiring for the multi-hospital backend

pub mod api; // HTTP handlers and request models
pub mod error; // Error to response mapping
pub mod middleware; // HTTP middleware
pub mod model; // Configuration, state and response envelopes
pub mod secured; // Role checks for handlers
pub mod startup; // Logging, storage selection and server bootstrap

pub use model::common::{AppState, Configuration, ErrorResult};
pub use secured::{Secured, SecuredBuilder};

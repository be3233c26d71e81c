//! Medora Auth - Authentication and authorization
//!
//! This crate provides:
//! - JWT token handling with a validation cache
//! - Password hashing
//! - Account authentication and role resolution against the identity store

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;

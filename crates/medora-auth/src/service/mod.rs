//! Authentication services

pub mod account;
pub mod auth;
pub mod password;

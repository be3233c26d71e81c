// HTTP handlers, one module per resource

pub mod admin;
pub mod appointment;
pub mod auth;
pub mod department;
pub mod doctor;
pub mod health;
pub mod hospital;
pub mod model;
pub mod patient;

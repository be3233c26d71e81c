//! SeaORM entity definitions
//!
//! Foreign-key actions declared on the `belongs_to` relations are emitted by
//! `schema::create_schema`, so the relational store enforces them as well.

pub mod prelude;

pub mod account;
pub mod account_role;
pub mod admin;
pub mod appointment;
pub mod department;
pub mod doctor;
pub mod hospital;
pub mod patient;
pub mod treatment_record;

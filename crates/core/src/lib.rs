//! Pure domain crate for the atelie back-office.
//!
//! Holds the shared types, the error taxonomy, and the status state
//! machines for the budget → contract → payment → project lifecycle.
//! This crate has zero internal dependencies so it can be used by the
//! DB layer, the API layer, and any future CLI tooling.

pub mod approval;
pub mod budget;
pub mod contract;
pub mod document;
pub mod error;
pub mod evaluation;
pub mod money;
pub mod payment;
pub mod project;
pub mod roles;
pub mod schedule;
pub mod types;

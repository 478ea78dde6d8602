//! Background jobs spawned by the server binary.

pub mod payment_due;
pub mod reconciliation;

//! Entity structs and request DTOs, one module per table.
//!
//! Entity structs are `FromRow + Serialize` and mirror the row exactly;
//! where a surface accepts writes, the module also carries `Deserialize`
//! request DTOs (create bodies, patch bodies with all-`Option` fields).

pub mod audit;
pub mod budget;
pub mod client;
pub mod contract;
pub mod evaluation;
pub mod event;
pub mod notification;
pub mod payment;
pub mod project;
pub mod schedule;
pub mod session;
pub mod user;

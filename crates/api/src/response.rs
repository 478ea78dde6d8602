//! Success-response envelope.
//!
//! Every successful handler answers `{ "data": ... }`; errors answer
//! `{ "error": ..., "code": ... }` via `AppError`. The typed envelope
//! keeps the two shapes from mixing.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

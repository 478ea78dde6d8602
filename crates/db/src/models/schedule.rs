//! Delivery schedule entity models and DTOs.

use atelie_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Schedule {
    pub id: DbId,
    pub project_id: DbId,
    pub date: NaiveDate,
    pub time: String,
    pub meeting_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for booking (or re-booking) a delivery appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSchedule {
    pub date: NaiveDate,
    pub time: String,
    pub meeting_type: String,
}

//! Delivery schedule status and note handling.
//!
//! A schedule is a 1:1 delivery appointment for a project. Failed
//! deliveries never delete the appointment: the failure reason is appended
//! to the notes and the appointment waits for re-booking.

use serde::{Deserialize, Serialize};

/// Closed set of schedule statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Booked and upcoming.
    Scheduled,
    /// Delivery happened. Terminal.
    Completed,
    /// Delivery failed; awaiting a new date.
    PendingReschedule,
}

impl ScheduleStatus {
    /// The string stored in the `schedules.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::PendingReschedule => "pending_reschedule",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "scheduled" => Ok(ScheduleStatus::Scheduled),
            "completed" => Ok(ScheduleStatus::Completed),
            "pending_reschedule" => Ok(ScheduleStatus::PendingReschedule),
            other => Err(format!("Unknown schedule status '{other}'")),
        }
    }
}

/// Returns the set of valid target statuses reachable from `from`.
pub fn valid_transitions(from: ScheduleStatus) -> &'static [ScheduleStatus] {
    use ScheduleStatus::*;
    match from {
        Scheduled => &[Completed, PendingReschedule],
        PendingReschedule => &[Scheduled],
        Completed => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: ScheduleStatus, to: ScheduleStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a status transition, returning an error message for invalid ones.
pub fn validate_transition(from: ScheduleStatus, to: ScheduleStatus) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid schedule transition: {} -> {}",
            from.as_str(),
            to.as_str()
        ))
    }
}

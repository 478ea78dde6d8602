//! Project status and progress milestones.
//!
//! Progress moves through the fixed milestone set {20, 50, 70, 100} and the
//! status mirrors the latest milestone (`development_20` … `development_100`).
//! Milestone updates are last-writer-wins by design; the only hard gate is
//! membership in the milestone set.

use serde::{Deserialize, Serialize};

/// Progress milestones that trigger a client notification.
pub const PROGRESS_MILESTONES: &[i32] = &[20, 50, 70, 100];

/// Closed set of project statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created at settlement; work not started.
    Planning,
    Development20,
    Development50,
    Development70,
    Development100,
    /// Delivered. Terminal.
    Finished,
}

impl ProjectStatus {
    /// The string stored in the `projects.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Development20 => "development_20",
            ProjectStatus::Development50 => "development_50",
            ProjectStatus::Development70 => "development_70",
            ProjectStatus::Development100 => "development_100",
            ProjectStatus::Finished => "finished",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "planning" => Ok(ProjectStatus::Planning),
            "development_20" => Ok(ProjectStatus::Development20),
            "development_50" => Ok(ProjectStatus::Development50),
            "development_70" => Ok(ProjectStatus::Development70),
            "development_100" => Ok(ProjectStatus::Development100),
            "finished" => Ok(ProjectStatus::Finished),
            other => Err(format!("Unknown project status '{other}'")),
        }
    }

    /// The progress percentage this status represents.
    pub fn progress(&self) -> i32 {
        match self {
            ProjectStatus::Planning => 0,
            ProjectStatus::Development20 => 20,
            ProjectStatus::Development50 => 50,
            ProjectStatus::Development70 => 70,
            ProjectStatus::Development100 => 100,
            ProjectStatus::Finished => 100,
        }
    }
}

/// Validate that a progress value is one of the notification milestones.
pub fn validate_milestone(progress: i32) -> Result<(), String> {
    if PROGRESS_MILESTONES.contains(&progress) {
        Ok(())
    } else {
        Err(format!(
            "Invalid progress {progress}. Must be one of: 20, 50, 70, 100"
        ))
    }
}

/// The status matching a milestone. Call [`validate_milestone`] first.
pub fn status_for_milestone(progress: i32) -> Result<ProjectStatus, String> {
    match progress {
        20 => Ok(ProjectStatus::Development20),
        50 => Ok(ProjectStatus::Development50),
        70 => Ok(ProjectStatus::Development70),
        100 => Ok(ProjectStatus::Development100),
        other => Err(format!("No status for progress {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_are_valid() {
        for m in PROGRESS_MILESTONES {
            assert!(validate_milestone(*m).is_ok());
        }
    }

    #[test]
    fn off_milestone_values_rejected() {
        for bad in [0, 10, 30, 60, 99, 101, -20] {
            assert!(validate_milestone(bad).is_err());
        }
    }

    #[test]
    fn milestone_maps_to_matching_status() {
        assert_eq!(status_for_milestone(20), Ok(ProjectStatus::Development20));
        assert_eq!(status_for_milestone(50), Ok(ProjectStatus::Development50));
        assert_eq!(status_for_milestone(70), Ok(ProjectStatus::Development70));
        assert_eq!(status_for_milestone(100), Ok(ProjectStatus::Development100));
    }

    #[test]
    fn status_reports_its_progress() {
        assert_eq!(ProjectStatus::Planning.progress(), 0);
        assert_eq!(ProjectStatus::Development70.progress(), 70);
        assert_eq!(ProjectStatus::Finished.progress(), 100);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ProjectStatus::Planning,
            ProjectStatus::Development20,
            ProjectStatus::Development50,
            ProjectStatus::Development70,
            ProjectStatus::Development100,
            ProjectStatus::Finished,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Ok(status));
        }
    }
}

//! Evaluation rating rules.
//!
//! An evaluation is a 1–5 rating tied to `(project, evaluator, target,
//! kind)`; the uniqueness of that tuple is enforced by the database and
//! surfaced as a conflict ("already evaluated").

/// Lowest accepted rating.
pub const RATING_MIN: i32 = 1;

/// Highest accepted rating.
pub const RATING_MAX: i32 = 5;

/// Evaluation of a team member's work on the project.
pub const KIND_TEAM_MEMBER: &str = "team_member";

/// Evaluation of the project outcome itself.
pub const KIND_PROJECT: &str = "project";

/// Evaluation of the client relationship.
pub const KIND_CLIENT: &str = "client";

/// All valid evaluation kinds.
pub const VALID_KINDS: &[&str] = &[KIND_TEAM_MEMBER, KIND_PROJECT, KIND_CLIENT];

/// Validate that a rating is within bounds.
pub fn validate_rating(rating: i32) -> Result<(), String> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        Err(format!(
            "Rating must be between {RATING_MIN} and {RATING_MAX}, got {rating}"
        ))
    }
}

/// Validate that an evaluation kind is one of the accepted values.
pub fn validate_kind(kind: &str) -> Result<(), String> {
    if VALID_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(format!(
            "Invalid evaluation kind '{kind}'. Must be one of: {}",
            VALID_KINDS.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_ratings_accepted() {
        for r in RATING_MIN..=RATING_MAX {
            assert!(validate_rating(r).is_ok());
        }
    }

    #[test]
    fn out_of_range_ratings_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-1).is_err());
    }

    #[test]
    fn known_kinds_accepted() {
        for kind in VALID_KINDS {
            assert!(validate_kind(kind).is_ok());
        }
    }

    #[test]
    fn unknown_kind_rejected() {
        assert!(validate_kind("vendor").is_err());
    }
}

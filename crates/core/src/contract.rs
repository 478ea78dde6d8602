//! Contract status state machine.
//!
//! Statuses are monotone: `Draft → SignedByClient → Confirmed`. Staff
//! confirmation straight from `Draft` is allowed — the original workflow
//! never required a client signature before confirmation and product has
//! not asked for that guard, so the edge is kept.

use serde::{Deserialize, Serialize};

/// Closed set of contract statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Drafted by staff; awaiting the client's signed upload.
    Draft,
    /// The client uploaded a signed document.
    SignedByClient,
    /// Staff confirmed the contract. Terminal.
    Confirmed,
}

impl ContractStatus {
    /// The string stored in the `contracts.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::SignedByClient => "signed_by_client",
            ContractStatus::Confirmed => "confirmed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "draft" => Ok(ContractStatus::Draft),
            "signed_by_client" => Ok(ContractStatus::SignedByClient),
            "confirmed" => Ok(ContractStatus::Confirmed),
            other => Err(format!("Unknown contract status '{other}'")),
        }
    }

    /// Whether a signed-document upload is still accepted.
    pub fn accepts_upload(&self) -> bool {
        matches!(self, ContractStatus::Draft)
    }
}

/// Returns the set of valid target statuses reachable from `from`.
pub fn valid_transitions(from: ContractStatus) -> &'static [ContractStatus] {
    use ContractStatus::*;
    match from {
        Draft => &[SignedByClient, Confirmed],
        SignedByClient => &[Confirmed],
        Confirmed => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: ContractStatus, to: ContractStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a status transition, returning an error message for invalid ones.
pub fn validate_transition(from: ContractStatus, to: ContractStatus) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid contract transition: {} -> {}",
            from.as_str(),
            to.as_str()
        ))
    }
}

/// Magic bytes every PDF file starts with.
const PDF_MAGIC: &[u8] = b"%PDF";

/// Validate that an uploaded document is a PDF by its leading bytes.
pub fn validate_pdf(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() >= PDF_MAGIC.len() && &bytes[..PDF_MAGIC.len()] == PDF_MAGIC {
        Ok(())
    } else {
        Err("Uploaded document must be a PDF".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContractStatus::*;

    #[test]
    fn draft_to_signed_by_client() {
        assert!(can_transition(Draft, SignedByClient));
    }

    #[test]
    fn signed_by_client_to_confirmed() {
        assert!(can_transition(SignedByClient, Confirmed));
    }

    #[test]
    fn draft_straight_to_confirmed_is_allowed() {
        // Current behavior: confirmation is not blocked on a client signature.
        assert!(can_transition(Draft, Confirmed));
    }

    #[test]
    fn confirmed_is_terminal() {
        assert!(valid_transitions(Confirmed).is_empty());
    }

    #[test]
    fn cannot_sign_twice() {
        assert!(!can_transition(SignedByClient, SignedByClient));
    }

    #[test]
    fn cannot_return_to_draft() {
        assert!(!can_transition(SignedByClient, Draft));
        assert!(!can_transition(Confirmed, Draft));
    }

    #[test]
    fn upload_only_accepted_in_draft() {
        assert!(Draft.accepts_upload());
        assert!(!SignedByClient.accepts_upload());
        assert!(!Confirmed.accepts_upload());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [Draft, SignedByClient, Confirmed] {
            assert_eq!(ContractStatus::parse(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn pdf_magic_accepted() {
        assert!(validate_pdf(b"%PDF-1.7 rest of file").is_ok());
    }

    #[test]
    fn non_pdf_rejected() {
        assert!(validate_pdf(b"PK\x03\x04 zip archive").is_err());
        assert!(validate_pdf(b"").is_err());
    }
}

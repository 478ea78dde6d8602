//! Budget lifecycle state machine.
//!
//! A budget moves `Pending → Sent → Accepted | Rejected`; once accepted it
//! advances through `ContractSigned → DownPaymentPaid → FinalPaymentPaid →
//! Completed`. `Rejected` is terminal. `Completed` has a single sanctioned
//! rollback edge to `FinalPaymentPaid`, taken when a delivery appointment
//! fails and the project must be re-scheduled.
//!
//! Statuses are persisted as plain strings, so every write must round-trip
//! through [`BudgetStatus::parse`] / [`BudgetStatus::as_str`] and every
//! status change must pass [`validate_transition`].

use serde::{Deserialize, Serialize};

/// Closed set of budget statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Created by public intake, not yet sent to the client.
    Pending,
    /// Proposal sent; an approval token is live.
    Sent,
    /// Accepted by the client or by staff.
    Accepted,
    /// Declined. Terminal.
    Rejected,
    /// The client uploaded a signed contract.
    ContractSigned,
    /// The 25% down payment settled.
    DownPaymentPaid,
    /// The final payment settled; delivery can be scheduled.
    FinalPaymentPaid,
    /// Delivered and closed. Terminal apart from the delivery-failure edge.
    Completed,
}

impl BudgetStatus {
    /// The string stored in the `budgets.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Pending => "pending",
            BudgetStatus::Sent => "sent",
            BudgetStatus::Accepted => "accepted",
            BudgetStatus::Rejected => "rejected",
            BudgetStatus::ContractSigned => "contract_signed",
            BudgetStatus::DownPaymentPaid => "down_payment_paid",
            BudgetStatus::FinalPaymentPaid => "final_payment_paid",
            BudgetStatus::Completed => "completed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(BudgetStatus::Pending),
            "sent" => Ok(BudgetStatus::Sent),
            "accepted" => Ok(BudgetStatus::Accepted),
            "rejected" => Ok(BudgetStatus::Rejected),
            "contract_signed" => Ok(BudgetStatus::ContractSigned),
            "down_payment_paid" => Ok(BudgetStatus::DownPaymentPaid),
            "final_payment_paid" => Ok(BudgetStatus::FinalPaymentPaid),
            "completed" => Ok(BudgetStatus::Completed),
            other => Err(format!("Unknown budget status '{other}'")),
        }
    }

    /// Whether the budget has already been decided (no token response or
    /// staff decision may be applied on top).
    pub fn is_decided(&self) -> bool {
        !matches!(self, BudgetStatus::Pending | BudgetStatus::Sent)
    }

    /// Whether the lifecycle has not yet recorded the down payment.
    ///
    /// Settlement only advances the status when this holds, which is what
    /// makes replayed "checkout completed" events no-ops.
    pub fn is_before_down_payment(&self) -> bool {
        matches!(
            self,
            BudgetStatus::Pending
                | BudgetStatus::Sent
                | BudgetStatus::Accepted
                | BudgetStatus::ContractSigned
        )
    }

    /// Whether the lifecycle has not yet recorded the final payment.
    pub fn is_before_final_payment(&self) -> bool {
        self.is_before_down_payment() || matches!(self, BudgetStatus::DownPaymentPaid)
    }
}

/// Returns the set of valid target statuses reachable from `from`.
///
/// `Rejected` returns an empty slice; `Completed` only allows the
/// delivery-failure rollback to `FinalPaymentPaid`.
pub fn valid_transitions(from: BudgetStatus) -> &'static [BudgetStatus] {
    use BudgetStatus::*;
    match from {
        Pending => &[Sent, Accepted, Rejected],
        Sent => &[Accepted, Rejected],
        // The down payment may settle before the signed contract arrives.
        Accepted => &[ContractSigned, DownPaymentPaid],
        ContractSigned => &[DownPaymentPaid],
        DownPaymentPaid => &[FinalPaymentPaid],
        FinalPaymentPaid => &[Completed],
        // Delivery failure re-opens the budget for re-scheduling.
        Completed => &[FinalPaymentPaid],
        Rejected => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: BudgetStatus, to: BudgetStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a status transition, returning an error message for invalid ones.
pub fn validate_transition(from: BudgetStatus, to: BudgetStatus) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid budget transition: {} -> {}",
            from.as_str(),
            to.as_str()
        ))
    }
}

/// Validate the intake form fields for budget creation.
pub fn validate_intake(project_type: &str, client_name: &str, client_email: &str) -> Result<(), String> {
    if project_type.trim().is_empty() {
        return Err("project_type must not be empty".to_string());
    }
    if client_name.trim().is_empty() {
        return Err("client_name must not be empty".to_string());
    }
    let email = client_email.trim();
    if email.is_empty() {
        return Err("client_email must not be empty".to_string());
    }
    // Cheap shape check; full deliverability is the mail relay's problem.
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(format!("'{email}' is not a valid email address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use BudgetStatus::*;

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn pending_to_sent() {
        assert!(can_transition(Pending, Sent));
    }

    #[test]
    fn pending_to_accepted_staff_shortcut() {
        assert!(can_transition(Pending, Accepted));
    }

    #[test]
    fn pending_to_rejected() {
        assert!(can_transition(Pending, Rejected));
    }

    #[test]
    fn sent_to_accepted() {
        assert!(can_transition(Sent, Accepted));
    }

    #[test]
    fn sent_to_rejected() {
        assert!(can_transition(Sent, Rejected));
    }

    #[test]
    fn accepted_to_contract_signed() {
        assert!(can_transition(Accepted, ContractSigned));
    }

    #[test]
    fn accepted_to_down_payment_paid_without_contract() {
        assert!(can_transition(Accepted, DownPaymentPaid));
    }

    #[test]
    fn contract_signed_to_down_payment_paid() {
        assert!(can_transition(ContractSigned, DownPaymentPaid));
    }

    #[test]
    fn down_payment_paid_to_final_payment_paid() {
        assert!(can_transition(DownPaymentPaid, FinalPaymentPaid));
    }

    #[test]
    fn final_payment_paid_to_completed() {
        assert!(can_transition(FinalPaymentPaid, Completed));
    }

    #[test]
    fn completed_rolls_back_on_delivery_failure() {
        assert!(can_transition(Completed, FinalPaymentPaid));
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn rejected_is_terminal() {
        assert!(valid_transitions(Rejected).is_empty());
    }

    #[test]
    fn completed_cannot_reopen_to_pending() {
        assert!(!can_transition(Completed, Pending));
    }

    #[test]
    fn accepted_cannot_be_rejected_afterwards() {
        assert!(!can_transition(Accepted, Rejected));
    }

    #[test]
    fn pending_cannot_skip_to_completed() {
        assert!(!can_transition(Pending, Completed));
    }

    #[test]
    fn sent_cannot_skip_to_down_payment() {
        assert!(!can_transition(Sent, DownPaymentPaid));
    }

    #[test]
    fn validate_transition_reports_both_states() {
        let err = validate_transition(Rejected, Accepted).unwrap_err();
        assert!(err.contains("rejected"));
        assert!(err.contains("accepted"));
    }

    // -----------------------------------------------------------------------
    // String round-trip
    // -----------------------------------------------------------------------

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            Pending,
            Sent,
            Accepted,
            Rejected,
            ContractSigned,
            DownPaymentPaid,
            FinalPaymentPaid,
            Completed,
        ] {
            assert_eq!(BudgetStatus::parse(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert!(BudgetStatus::parse("archived").is_err());
    }

    #[test]
    fn settlement_ordering_helpers() {
        assert!(Accepted.is_before_down_payment());
        assert!(ContractSigned.is_before_down_payment());
        assert!(!DownPaymentPaid.is_before_down_payment());
        assert!(DownPaymentPaid.is_before_final_payment());
        assert!(!FinalPaymentPaid.is_before_final_payment());
        assert!(!Completed.is_before_final_payment());
    }

    #[test]
    fn decided_statuses() {
        assert!(!Pending.is_decided());
        assert!(!Sent.is_decided());
        assert!(Accepted.is_decided());
        assert!(Rejected.is_decided());
        assert!(Completed.is_decided());
    }

    // -----------------------------------------------------------------------
    // Intake validation
    // -----------------------------------------------------------------------

    #[test]
    fn intake_accepts_complete_form() {
        assert!(validate_intake("website", "Ana Souza", "ana@example.com").is_ok());
    }

    #[test]
    fn intake_rejects_empty_project_type() {
        assert!(validate_intake("  ", "Ana", "ana@example.com").is_err());
    }

    #[test]
    fn intake_rejects_empty_name() {
        assert!(validate_intake("website", "", "ana@example.com").is_err());
    }

    #[test]
    fn intake_rejects_malformed_email() {
        assert!(validate_intake("website", "Ana", "not-an-email").is_err());
        assert!(validate_intake("website", "Ana", "@example.com").is_err());
    }
}

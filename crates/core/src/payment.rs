//! Payment type and status definitions.
//!
//! A budget carries at most one payment per type (unique index), and a
//! payment's status only ever moves `Pending → Paid`.

use serde::{Deserialize, Serialize};

/// Which milestone a payment covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// 25% of the final value, required before project work starts.
    DownPayment,
    /// The remaining balance, required before delivery.
    FinalPayment,
}

impl PaymentType {
    /// The string stored in the `payments.payment_type` column and carried
    /// in gateway metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::DownPayment => "down_payment",
            PaymentType::FinalPayment => "final_payment",
        }
    }

    /// Parse a stored or metadata payment-type string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "down_payment" => Ok(PaymentType::DownPayment),
            "final_payment" => Ok(PaymentType::FinalPayment),
            other => Err(format!("Unknown payment type '{other}'")),
        }
    }
}

/// Payment settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    /// The string stored in the `payments.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("Unknown payment status '{other}'")),
        }
    }
}

/// Days a generated payment link stays payable.
pub const PAYMENT_DUE_DAYS: i64 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_type_round_trips() {
        for t in [PaymentType::DownPayment, PaymentType::FinalPayment] {
            assert_eq!(PaymentType::parse(t.as_str()), Ok(t));
        }
    }

    #[test]
    fn payment_type_rejects_unknown() {
        assert!(PaymentType::parse("installment").is_err());
    }

    #[test]
    fn payment_status_round_trips() {
        for s in [PaymentStatus::Pending, PaymentStatus::Paid] {
            assert_eq!(PaymentStatus::parse(s.as_str()), Ok(s));
        }
    }

    #[test]
    fn due_window_is_five_days() {
        assert_eq!(PAYMENT_DUE_DAYS, 5);
    }
}

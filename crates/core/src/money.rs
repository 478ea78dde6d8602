//! Integer-cent money helpers.
//!
//! All monetary values are carried as integer cents (`i64`) end-to-end, so
//! the only rounding point in the system is the 25% down-payment split.

/// Down payment share of the final value, in percent.
pub const DOWN_PAYMENT_PERCENT: i64 = 25;

/// The down payment is 25% of the final value, in cents, rounded half-up.
pub fn down_payment_amount(final_value_cents: i64) -> i64 {
    (final_value_cents * DOWN_PAYMENT_PERCENT + 50) / 100
}

/// The final payment is whatever remains after the down payment.
pub fn final_payment_amount(final_value_cents: i64) -> i64 {
    final_value_cents - down_payment_amount(final_value_cents)
}

/// Format cents as a BRL display string for emails and message drafts.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}R$ {},{:02}", abs / 100, abs % 100)
}

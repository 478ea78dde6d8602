//! Approval-token policy.
//!
//! The approval token is a capability, not an identity: anyone holding the
//! URL can accept or decline the budget once, until the token expires or a
//! newer send replaces it. Tokens are opaque random strings; minting a new
//! one on every send invalidates the previous link.

use chrono::Duration;
use rand::Rng;

use crate::types::Timestamp;

/// How long an approval link stays valid after a proposal is sent.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Random bytes per token (hex-encoded to 64 chars).
const TOKEN_BYTES: usize = 32;

/// Mint a fresh opaque approval token.
pub fn mint_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The expiry timestamp for a token minted at `now`.
pub fn token_expiry(now: Timestamp) -> Timestamp {
    now + Duration::days(TOKEN_TTL_DAYS)
}

/// Validate that a stored token is still within its validity window.
///
/// A missing expiry means the token fields were already cleared (used or
/// superseded) and the link must fail closed.
pub fn validate_token_window(expires: Option<Timestamp>, now: Timestamp) -> Result<(), String> {
    match expires {
        Some(expiry) if expiry >= now => Ok(()),
        Some(_) => Err("Approval link has expired".to_string()),
        None => Err("Approval link is no longer valid".to_string()),
    }
}

/// Valid client responses carried by the approval link.
pub const RESPONSE_ACCEPT: &str = "accept";
pub const RESPONSE_REJECT: &str = "reject";

/// Validate a client response value.
pub fn validate_response(response: &str) -> Result<bool, String> {
    match response {
        RESPONSE_ACCEPT => Ok(true),
        RESPONSE_REJECT => Ok(false),
        other => Err(format!(
            "Invalid response '{other}'. Must be '{RESPONSE_ACCEPT}' or '{RESPONSE_REJECT}'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn minted_tokens_are_unique_and_opaque() {
        let a = mint_token();
        let b = mint_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn expiry_is_seven_days_out() {
        let now = Utc::now();
        assert_eq!(token_expiry(now) - now, Duration::days(7));
    }

    #[test]
    fn live_token_passes_window_check() {
        let now = Utc::now();
        assert!(validate_token_window(Some(now + Duration::hours(1)), now).is_ok());
    }

    #[test]
    fn expired_token_fails_even_if_unused() {
        let now = Utc::now();
        let result = validate_token_window(Some(now - Duration::seconds(1)), now);
        assert!(result.unwrap_err().contains("expired"));
    }

    #[test]
    fn cleared_token_fails_closed() {
        assert!(validate_token_window(None, Utc::now()).is_err());
    }

    #[test]
    fn boundary_expiry_is_still_valid() {
        // expires >= now: exact boundary accepted.
        let now = Utc::now();
        assert!(validate_token_window(Some(now), now).is_ok());
    }

    #[test]
    fn response_values() {
        assert_eq!(validate_response("accept"), Ok(true));
        assert_eq!(validate_response("reject"), Ok(false));
        assert!(validate_response("maybe").is_err());
    }
}

//! Staff password storage.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings, so the
//! salt and cost parameters travel with each hash and can be raised later
//! without invalidating existing accounts.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Shortest password accepted when creating or updating a staff account.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; `Err` is reserved for malformed hashes and
/// other non-password failures.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Enforce the minimum length policy for new passwords.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.len() < min_length {
        Err(format!("Password must be at least {min_length} characters"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_accepts_the_original_password() {
        let hash = hash_password("um-segredo-bem-longo").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("um-segredo-bem-longo", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_is_a_clean_false() {
        let hash = hash_password("the-real-one").expect("hash");
        assert!(!verify_password("an-impostor", &hash).expect("verify"));
    }

    #[test]
    fn malformed_hash_is_an_error_not_false() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let a = hash_password("repeat-me-please").expect("hash");
        let b = hash_password("repeat-me-please").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn length_policy() {
        assert!(validate_password_strength("tiny", MIN_PASSWORD_LENGTH).is_err());
        assert!(validate_password_strength("plenty-long-enough", MIN_PASSWORD_LENGTH).is_ok());
    }
}

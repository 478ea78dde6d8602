//! Access- and refresh-token primitives.
//!
//! An access token is a short-lived HS256 JWT whose [`Claims`] carry the
//! caller's id, role, and team-role designation so the RBAC extractors can
//! gate a request without touching the database. A refresh token is an
//! opaque random string; the server keeps only its SHA-256 digest, so a
//! leaked `sessions` table cannot be replayed against the API.

use atelie_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Lifetime defaults, overridable per deployment.
const ACCESS_TTL_MINS_DEFAULT: i64 = 15;
const REFRESH_TTL_DAYS_DEFAULT: i64 = 7;

/// Random bytes per refresh token (hex-encoded to 64 chars).
const REFRESH_TOKEN_BYTES: usize = 32;

/// Payload of every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The authenticated user's database id.
    pub sub: DbId,
    /// Role name, one of the closed set in `atelie_core::roles`.
    pub role: String,
    /// Team-role designation carried verbatim (e.g. "Gerente de Projetos");
    /// `None` for users without one.
    pub team_role: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,
    /// Per-token UUID so individual tokens can be traced in audit output.
    pub jti: String,
}

/// Signing secret and lifetimes for token issuance.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Read the JWT settings from the environment.
    ///
    /// `JWT_SECRET` is mandatory and must be non-empty; the process refuses
    /// to start without it rather than fall back to a guessable default.
    /// `JWT_ACCESS_EXPIRY_MINS` (15) and `JWT_REFRESH_EXPIRY_DAYS` (7) are
    /// optional.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self {
            secret,
            access_token_expiry_mins: env_i64("JWT_ACCESS_EXPIRY_MINS", ACCESS_TTL_MINS_DEFAULT),
            refresh_token_expiry_days: env_i64("JWT_REFRESH_EXPIRY_DAYS", REFRESH_TTL_DAYS_DEFAULT),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be an integer, got '{raw}'")),
        Err(_) => default,
    }
}

/// Issue a signed access token for a user.
pub fn issue_access_token(
    user_id: DbId,
    role: &str,
    team_role: Option<&str>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_owned(),
        team_role: team_role.map(str::to_owned),
        exp: issued_at + config.access_token_expiry_mins * 60,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check an access token's signature and expiry and return its [`Claims`].
pub fn decode_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Mint a refresh token, returning `(plaintext, digest)`.
///
/// The plaintext goes to the client once and is never stored; the digest
/// is what the `sessions` table keeps.
pub fn mint_refresh_token() -> (String, String) {
    let bytes: [u8; REFRESH_TOKEN_BYTES] = rand::rng().random();
    let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let digest = refresh_token_digest(&plaintext);
    (plaintext, digest)
}

/// SHA-256 hex digest of a refresh token, for storage and lookup.
pub fn refresh_token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Primary keys across the schema are Postgres BIGSERIAL values.
pub type DbId = i64;

/// Every timestamp in the system is UTC; local time exists only in
/// client-facing message text.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

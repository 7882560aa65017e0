pub mod auth;
pub mod error;
pub mod jokes;
pub mod session;

use chrono::{DateTime, Utc};
use tracing::warn;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC when the RFC 3339 parse fails.
pub(crate) fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

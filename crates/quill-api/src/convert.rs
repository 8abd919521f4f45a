use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Row ids are stored as text; a corrupt value is logged and mapped to the
/// nil UUID rather than failing the whole response.
pub(crate) fn uuid_field(raw: &str, field: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", field, raw, e);
        Uuid::default()
    })
}

pub(crate) fn opt_uuid_field(raw: Option<&str>, field: &str) -> Option<Uuid> {
    raw.map(|raw| uuid_field(raw, field))
}

pub(crate) fn timestamp_field(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let ts = timestamp_field("2024-06-01 12:30:00");
        assert_eq!(ts.to_rfc3339(), "2024-06-01T12:30:00+00:00");
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        assert_eq!(uuid_field("garbage", "id"), Uuid::default());
        assert_eq!(timestamp_field("garbage"), DateTime::<Utc>::default());
    }
}

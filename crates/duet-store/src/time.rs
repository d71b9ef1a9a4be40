use chrono::{DateTime, Utc};

use crate::StoreError;

/// Fixed-width RFC3339 UTC with microsecond precision. Lexicographic order
/// of the stored strings equals chronological order, which lets SQL compare
/// timestamps as plain text.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn decode_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn roundtrip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 1, 59, 26).unwrap();
        assert_eq!(decode_ts(&encode_ts(ts)).unwrap(), ts);
    }

    #[test]
    fn encoding_is_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 6).unwrap();
        let (ea, eb) = (encode_ts(a), encode_ts(b));
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_ts("yesterday").is_err());
    }
}

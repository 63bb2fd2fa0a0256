//! Timestamp normalisation.
//!
//! Backends report times in their own offsets and use the zero value (the
//! Unix epoch) for "not set". Everything handed to the assembler is UTC, and
//! zero-valued times become `None`.

use chrono::{DateTime, TimeZone, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Converts to UTC, treating the Unix epoch as absent.
#[must_use]
pub fn normalize_utc<Tz: TimeZone>(time: &DateTime<Tz>) -> Option<Timestamp> {
    let utc = time.with_timezone(&Utc);
    if utc.timestamp() == 0 && utc.timestamp_subsec_nanos() == 0 {
        None
    } else {
        Some(utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_normalize_converts_offset_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let utc = normalize_utc(&local).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_normalize_epoch_is_absent() {
        assert_eq!(normalize_utc(&Utc.timestamp_opt(0, 0).unwrap()), None);
    }
}

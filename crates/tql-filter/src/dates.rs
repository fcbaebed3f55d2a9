//! Timezone shifting of date range bounds.
//!
//! TQL carries date bounds as UTC-midnight epoch milliseconds; filters keep
//! them as local-midnight epoch milliseconds so labels and UI widgets line up
//! with the user's calendar. Both conversions keep the calendar day and only
//! move the instant, so they are inverse to each other on midnight bounds.
//! Date filters hold whole days: the engine snaps intra-day bounds to the
//! local midnight of their day with [`local_midnight`].

use chrono::{DateTime, FixedOffset, TimeZone};

/// Shift a UTC bound to the local midnight of the same calendar day.
pub fn utc_to_local_midnight(utc_millis: f64, offset: FixedOffset) -> f64 {
    DateTime::from_timestamp_millis(utc_millis as i64)
        .and_then(|utc| utc.date_naive().and_hms_opt(0, 0, 0))
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|local| local.timestamp_millis() as f64)
        .unwrap_or(utc_millis)
}

/// Truncate a local bound to the local midnight of its calendar day.
pub fn local_midnight(local_millis: f64, offset: FixedOffset) -> f64 {
    offset
        .timestamp_millis_opt(local_millis as i64)
        .single()
        .and_then(|local| local.date_naive().and_hms_opt(0, 0, 0))
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|local| local.timestamp_millis() as f64)
        .unwrap_or(local_millis)
}

/// Shift a local bound back to the UTC midnight of the same calendar day.
pub fn local_to_utc_midnight(local_millis: f64, offset: FixedOffset) -> f64 {
    offset
        .timestamp_millis_opt(local_millis as i64)
        .single()
        .and_then(|local| local.date_naive().and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis() as f64)
        .unwrap_or(local_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_1_2016_UTC: f64 = 1_451_606_400_000.0;
    const HOUR: f64 = 3_600_000.0;

    #[test]
    fn test_east_of_utc_moves_backwards() {
        let paris = FixedOffset::east_opt(3600).unwrap();
        let local = utc_to_local_midnight(JAN_1_2016_UTC, paris);
        assert_eq!(local, JAN_1_2016_UTC - HOUR);
        assert_eq!(local_to_utc_midnight(local, paris), JAN_1_2016_UTC);
    }

    #[test]
    fn test_west_of_utc_moves_forwards() {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = utc_to_local_midnight(JAN_1_2016_UTC, new_york);
        assert_eq!(local, JAN_1_2016_UTC + 5.0 * HOUR);
        assert_eq!(local_to_utc_midnight(local, new_york), JAN_1_2016_UTC);
    }

    #[test]
    fn test_local_midnight_truncates_to_day() {
        let paris = FixedOffset::east_opt(3600).unwrap();
        let midnight = JAN_1_2016_UTC - HOUR;
        assert_eq!(local_midnight(midnight, paris), midnight);
        assert_eq!(local_midnight(midnight + 15.5 * HOUR, paris), midnight);
        assert_eq!(local_midnight(midnight - HOUR, paris), midnight - 24.0 * HOUR);
    }

    #[test]
    fn test_utc_is_identity() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(utc_to_local_midnight(JAN_1_2016_UTC, utc), JAN_1_2016_UTC);
        assert_eq!(local_to_utc_midnight(JAN_1_2016_UTC, utc), JAN_1_2016_UTC);
    }
}

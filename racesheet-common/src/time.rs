//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Get current local timestamp
pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// Map a naive local wall-clock time onto the local timezone.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times that
/// do not exist (DST spring-forward gap) are pushed forward one hour.
pub fn local_from_naive(naive: NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt,
        None => {
            let shifted = naive + chrono::Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| Local.from_utc_datetime(&naive))
        }
    }
}

/// Format a timestamp as wall-clock `HH:MM` for operator messages
pub fn format_clock<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn test_now_local_is_recent() {
        let timestamp = now_local();
        // Between 2000-01-01 and 2100-01-01
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[test]
    fn test_format_clock_pads_hours_and_minutes() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let dt = tz.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
        assert_eq!(format_clock(&dt), "09:05");
    }

    #[test]
    fn test_local_from_naive_keeps_wall_clock() {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let local = local_from_naive(naive);
        assert_eq!(local.naive_local(), naive);
    }
}

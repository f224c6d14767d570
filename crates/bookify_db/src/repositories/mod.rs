//! Repositories for the Bookify schema
//!
//! Each entity gets a trait describing its operations and a SQL
//! implementation over the shared [`DbClient`](crate::DbClient). Instants are
//! stored as RFC 3339 TEXT and clock times as `HH:MM:SS` TEXT, since the Any
//! driver has no portable date-time decoding.

pub mod availability;
pub mod availability_sql;
pub mod booking;
pub mod booking_sql;
pub mod calendar_event_link;
pub mod calendar_event_link_sql;
pub mod event_type;
pub mod event_type_sql;
pub mod profile;
pub mod profile_sql;

pub use availability::{AvailabilityRepository, AvailabilityWindow};
pub use availability_sql::SqlAvailabilityRepository;
pub use booking::{Booking, BookingRepository, BookingStatus};
pub use booking_sql::SqlBookingRepository;
pub use calendar_event_link::{CalendarEventLink, CalendarEventLinkRepository};
pub use calendar_event_link_sql::SqlCalendarEventLinkRepository;
pub use event_type::{EventType, EventTypeRepository};
pub use event_type_sql::SqlEventTypeRepository;
pub use profile::{Profile, ProfileRepository};
pub use profile_sql::SqlProfileRepository;

use crate::error::DbError;
use chrono::{DateTime, NaiveTime, Utc};

/// Format an instant for storage.
pub(crate) fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

/// Parse a stored instant back into a `DateTime<Utc>`.
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::ValueError(format!("invalid stored instant '{}': {}", raw, e)))
}

/// Parse a stored clock time (`HH:MM:SS`, or `HH:MM` for hand-entered rows).
pub(crate) fn parse_clock_time(raw: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| DbError::ValueError(format!("invalid stored clock time '{}': {}", raw, e)))
}

/// Format a clock time for storage.
pub(crate) fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    #[test]
    fn instant_round_trips_through_text() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 9, 9, 30, 0).unwrap();
        assert_eq!(parse_instant(&format_instant(instant)).unwrap(), instant);
    }

    #[test]
    fn clock_time_accepts_short_form() {
        let expected = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_clock_time("09:30").unwrap(), expected);
        assert_eq!(parse_clock_time("09:30:00").unwrap(), expected);
        assert!(parse_clock_time("9h30").is_err());
    }
}

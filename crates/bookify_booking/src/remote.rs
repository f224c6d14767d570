// --- File: crates/bookify_booking/src/remote.rs ---
//! Remote conflict filtering against the host's live calendar.
//!
//! Error handling is deliberately asymmetric. A connection-level failure
//! (listing calendars) aborts remote filtering for the whole request and
//! hands back the locally filtered set unchanged. A failure on a single
//! slot's free/busy query keeps that slot. A total remote outage must not
//! silently empty the host's bookable day, while one flaky query should not
//! block the other slots either.

use bookify_common::services::{CalendarInfo, CalendarProvider, Credentials};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Which sources of truth produced a slot or availability answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Local schedule and bookings only.
    Database,
    /// Local filtering plus live free/busy data.
    GoogleCalendar,
}

impl SlotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotSource::Database => "database",
            SlotSource::GoogleCalendar => "google_calendar",
        }
    }
}

/// Picks the calendar to query: the one flagged primary, else the first.
pub fn select_primary_calendar(calendars: &[CalendarInfo]) -> Option<&CalendarInfo> {
    calendars
        .iter()
        .find(|calendar| calendar.primary)
        .or_else(|| calendars.first())
}

/// Narrows locally filtered candidates against the provider's free/busy
/// data, returning the surviving slots and a provenance tag.
pub async fn filter_remote_conflicts<P>(
    provider: &P,
    credentials: &Credentials,
    candidates: Vec<DateTime<Utc>>,
    duration: Duration,
) -> (Vec<DateTime<Utc>>, SlotSource)
where
    P: CalendarProvider + ?Sized,
{
    let calendars = match provider.list_calendars(credentials).await {
        Ok(calendars) => calendars,
        Err(e) => {
            warn!("Listing calendars failed, falling back to local-only slots: {}", e);
            return (candidates, SlotSource::Database);
        }
    };

    let Some(calendar) = select_primary_calendar(&calendars) else {
        debug!("Host has no calendars, skipping remote filtering");
        return (candidates, SlotSource::Database);
    };

    let mut remote_available = Vec::with_capacity(candidates.len());
    for slot_start in candidates {
        let slot_end = slot_start + duration;
        match provider
            .query_free_busy(credentials, &calendar.id, slot_start, slot_end)
            .await
        {
            Ok(busy) => {
                if busy.is_empty() {
                    remote_available.push(slot_start);
                }
            }
            Err(e) => {
                // Fail open: an unanswered slot is offered rather than hidden
                debug!("Free/busy query failed for slot {}: {}", slot_start, e);
                remote_available.push(slot_start);
            }
        }
    }

    (remote_available, SlotSource::GoogleCalendar)
}

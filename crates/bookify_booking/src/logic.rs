// --- File: crates/bookify_booking/src/logic.rs ---
//! Candidate slot generation and local conflict filtering.
//!
//! Both functions are pure over their inputs; "now" is passed in so the
//! handlers decide what the current instant is and tests can pin it.

use bookify_db::{AvailabilityWindow, Booking};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Generates candidate start instants for one day from the host's weekly
/// availability windows.
///
/// Each window is walked independently from its start time in fixed `step`
/// increments (the step is a deployment constant, independent of the event
/// duration — a 15 minute event on a 30 minute step still yields :00/:30
/// starts only). A step instant is a candidate when the full `duration`
/// still fits inside the window (landing exactly on the window end is
/// allowed) and the instant lies strictly in the future.
///
/// Overlapping windows may emit the same instant; the aggregated output is
/// sorted chronologically and exact duplicates are dropped.
//
// TODO: apply EventType::buffer_minutes here once the product decides how
// buffers interact with the step grid; the value is stored and surfaced but
// has no effect on generation yet.
pub fn generate_candidate_slots(
    windows: &[AvailabilityWindow],
    date: NaiveDate,
    duration: Duration,
    now: DateTime<Utc>,
    step: Duration,
) -> Vec<DateTime<Utc>> {
    let mut candidates: Vec<DateTime<Utc>> = Vec::new();
    if step <= Duration::zero() || duration <= Duration::zero() {
        return candidates;
    }

    for window in windows.iter().filter(|w| w.is_available) {
        let window_start = date.and_time(window.start_time).and_utc();
        let window_end = date.and_time(window.end_time).and_utc();

        let mut current = window_start;
        while current + duration <= window_end {
            if current > now {
                candidates.push(current);
            }
            current += step;
        }
    }

    candidates.sort();
    candidates.dedup();
    candidates
}

/// Removes candidate slots that overlap a confirmed booking.
///
/// Overlap is checked half-open: a slot `[s, s+d)` conflicts with a booking
/// `[bs, be)` iff `s < be && s+d > bs`. Touching intervals (a slot starting
/// exactly when a booking ends, or ending exactly when one starts) do not
/// conflict. Input ordering is preserved.
pub fn filter_local_conflicts(
    candidates: &[DateTime<Utc>],
    duration: Duration,
    bookings: &[Booking],
) -> Vec<DateTime<Utc>> {
    candidates
        .iter()
        .copied()
        .filter(|&slot_start| {
            let slot_end = slot_start + duration;
            !bookings
                .iter()
                .any(|booking| slot_start < booking.end_time && slot_end > booking.start_time)
        })
        .collect()
}

use crate::logic::{filter_local_conflicts, generate_candidate_slots};
use bookify_db::{AvailabilityWindow, Booking, BookingStatus};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

fn window(start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
    AvailabilityWindow {
        id: format!("w-{}-{}", start.0, start.1),
        host_id: "host-1".to_string(),
        day_of_week: 1,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        is_available: true,
    }
}

fn booking(start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
    Booking {
        id: "b-1".to_string(),
        host_id: "host-1".to_string(),
        event_type_id: "et-1".to_string(),
        client_name: "Robin Client".to_string(),
        client_email: "robin@example.com".to_string(),
        client_phone: None,
        start_time: start,
        end_time: end,
        status: BookingStatus::Confirmed,
        payment_status: None,
        notes: None,
        meeting_link: None,
        created_at: start - Duration::days(1),
    }
}

fn day() -> NaiveDate {
    // A Monday
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, hour, minute, 0).unwrap()
}

fn long_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap()
}

#[test]
fn thirty_minute_event_fills_an_hour_window() {
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0))],
        day(),
        Duration::minutes(30),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0), at(9, 30)]);
}

#[test]
fn forty_five_minute_event_only_fits_at_window_start() {
    // 09:30 + 45 = 10:15, past the window end
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0))],
        day(),
        Duration::minutes(45),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0)]);
}

#[test]
fn slot_landing_exactly_on_window_end_is_allowed() {
    let slots = generate_candidate_slots(
        &[window((9, 0), (9, 30))],
        day(),
        Duration::minutes(30),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0)]);
}

#[test]
fn step_is_independent_of_event_duration() {
    // A 15 minute event on a 60 minute window yields :00 and :30 starts
    // only, never :15/:45.
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0))],
        day(),
        Duration::minutes(15),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0), at(9, 30)]);
}

#[test]
fn past_slots_are_excluded_strictly() {
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0))],
        day(),
        Duration::minutes(30),
        at(9, 15),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 30)]);

    // A candidate equal to "now" is not in the future
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0))],
        day(),
        Duration::minutes(30),
        at(9, 30),
        Duration::minutes(30),
    );
    assert!(slots.is_empty());
}

#[test]
fn split_shift_windows_generate_independently_and_sorted() {
    // Windows given out of order still produce chronological output
    let slots = generate_candidate_slots(
        &[window((14, 0), (15, 0)), window((9, 0), (10, 0))],
        day(),
        Duration::minutes(30),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0), at(9, 30), at(14, 0), at(14, 30)]);
}

#[test]
fn overlapping_windows_do_not_duplicate_candidates() {
    let slots = generate_candidate_slots(
        &[window((9, 0), (10, 0)), window((9, 30), (10, 30))],
        day(),
        Duration::minutes(30),
        long_before(),
        Duration::minutes(30),
    );
    assert_eq!(slots, vec![at(9, 0), at(9, 30), at(10, 0)]);
}

#[test]
fn unavailable_windows_are_ignored() {
    let mut closed = window((9, 0), (10, 0));
    closed.is_available = false;
    let slots = generate_candidate_slots(
        &[closed],
        day(),
        Duration::minutes(30),
        long_before(),
        Duration::minutes(30),
    );
    assert!(slots.is_empty());
}

#[test]
fn overlapping_booking_rejects_candidate() {
    // Booking [09:30, 10:00) rejects a 60 minute slot starting 09:00
    let bookings = vec![booking(at(9, 30), at(10, 0))];
    let kept = filter_local_conflicts(&[at(9, 0)], Duration::minutes(60), &bookings);
    assert!(kept.is_empty());
}

#[test]
fn touching_booking_does_not_conflict() {
    // Booking [09:30, 10:00): a slot starting exactly at 10:00 touches it
    // and a slot ending exactly at 09:30 touches it; both survive.
    let bookings = vec![booking(at(9, 30), at(10, 0))];
    let kept = filter_local_conflicts(
        &[at(9, 0), at(10, 0)],
        Duration::minutes(30),
        &bookings,
    );
    assert_eq!(kept, vec![at(9, 0), at(10, 0)]);
}

#[test]
fn local_filter_preserves_input_order() {
    let bookings = vec![booking(at(11, 0), at(12, 0))];
    let kept = filter_local_conflicts(
        &[at(14, 0), at(9, 0), at(11, 30)],
        Duration::minutes(30),
        &bookings,
    );
    assert_eq!(kept, vec![at(14, 0), at(9, 0)]);
}

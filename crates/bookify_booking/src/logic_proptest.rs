#[cfg(test)]
mod tests {
    use crate::logic::{filter_local_conflicts, generate_candidate_slots};
    use bookify_db::{AvailabilityWindow, Booking, BookingStatus};
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use proptest::prelude::*;

    // Helper function to build a window on the test day
    fn make_window(start_minute: i64, end_minute: i64) -> AvailabilityWindow {
        AvailabilityWindow {
            id: format!("w-{}", start_minute),
            host_id: "host-1".to_string(),
            day_of_week: 1,
            start_time: NaiveTime::from_num_seconds_from_midnight_opt(
                (start_minute * 60) as u32,
                0,
            )
            .unwrap(),
            end_time: NaiveTime::from_num_seconds_from_midnight_opt((end_minute * 60) as u32, 0)
                .unwrap(),
            is_available: true,
        }
    }

    fn test_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    proptest! {
        // Every candidate fits entirely inside some window and lies in the future
        #[test]
        fn candidates_fit_a_window_and_are_future(
            window_start_minute in 0..1200i64,
            window_length_minutes in 0..360i64,
            duration_minutes in 15..120i64,
            step_minutes in prop::sample::select(vec![15i64, 30, 60]),
            now_offset_minutes in -120..1560i64,
        ) {
            let window_end_minute = (window_start_minute + window_length_minutes).min(1439);
            let window = make_window(window_start_minute, window_end_minute);
            let duration = Duration::minutes(duration_minutes);
            let step = Duration::minutes(step_minutes);
            let now = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap()
                + Duration::minutes(now_offset_minutes);

            let window_start = test_day().and_time(window.start_time).and_utc();
            let window_end = test_day().and_time(window.end_time).and_utc();

            let slots = generate_candidate_slots(&[window], test_day(), duration, now, step);

            for slot in &slots {
                prop_assert!(*slot >= window_start);
                prop_assert!(*slot + duration <= window_end);
                prop_assert!(*slot > now);
                // Candidates sit on the step grid anchored at the window start
                let offset = (*slot - window_start).num_minutes();
                prop_assert_eq!(offset % step_minutes, 0);
            }
        }

        // Output is sorted and free of duplicates regardless of window layout
        #[test]
        fn candidates_are_sorted_and_unique(
            starts in prop::collection::vec(0..1320i64, 1..4),
            lengths in prop::collection::vec(30..240i64, 1..4),
            duration_minutes in 15..90i64,
        ) {
            let windows: Vec<_> = starts
                .iter()
                .zip(lengths.iter())
                .map(|(&s, &l)| make_window(s, (s + l).min(1439)))
                .collect();
            let now = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();

            let slots = generate_candidate_slots(
                &windows,
                test_day(),
                Duration::minutes(duration_minutes),
                now,
                Duration::minutes(30),
            );

            for pair in slots.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }

        // No surviving slot overlaps any confirmed booking, and every
        // rejected slot overlaps at least one
        #[test]
        fn local_filter_is_exact(
            booking_start_minute in 0..1380i64,
            booking_length_minutes in 15..180i64,
            duration_minutes in 15..90i64,
        ) {
            let day_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
            let booking_start = day_start + Duration::minutes(booking_start_minute);
            let booking_end = booking_start + Duration::minutes(booking_length_minutes);
            let booking = Booking {
                id: "b-1".to_string(),
                host_id: "host-1".to_string(),
                event_type_id: "et-1".to_string(),
                client_name: "Robin Client".to_string(),
                client_email: "robin@example.com".to_string(),
                client_phone: None,
                start_time: booking_start,
                end_time: booking_end,
                status: BookingStatus::Confirmed,
                payment_status: None,
                notes: None,
                meeting_link: None,
                created_at: day_start,
            };

            let duration = Duration::minutes(duration_minutes);
            let candidates: Vec<_> = (0..48).map(|i| day_start + Duration::minutes(i * 30)).collect();
            let kept = filter_local_conflicts(&candidates, duration, &[booking]);

            for slot in &candidates {
                let slot_end = *slot + duration;
                let overlaps = *slot < booking_end && slot_end > booking_start;
                prop_assert_eq!(kept.contains(slot), !overlaps);
            }
        }
    }
}

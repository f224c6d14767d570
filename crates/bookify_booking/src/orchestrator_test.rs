use crate::orchestrator::{BookingOrchestrator, NewBooking};
use crate::remote::SlotSource;
use crate::test_support::{
    FakeCalendarProvider, InMemoryAvailability, InMemoryBookings, InMemoryEventTypes,
    InMemoryLinks, InMemoryProfiles, RecordingHook,
};
use bookify_common::services::{BoxedError, CalendarProvider};
use bookify_common::BookifyError;
use bookify_config::BookingConfig;
use bookify_db::{
    AvailabilityWindow, Booking, BookingStatus, CalendarEventLink, EventType, Profile,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

type TestOrchestrator = BookingOrchestrator<
    InMemoryProfiles,
    InMemoryEventTypes,
    InMemoryAvailability,
    InMemoryBookings,
    InMemoryLinks,
>;

struct Harness {
    profiles: Arc<InMemoryProfiles>,
    bookings: Arc<InMemoryBookings>,
    links: Arc<InMemoryLinks>,
    provider: Arc<FakeCalendarProvider>,
    hook: Arc<RecordingHook>,
    orchestrator: TestOrchestrator,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    // The test day is Monday 2026-03-09
    Utc.with_ymd_and_hms(2026, 3, 9, hour, minute, 0).unwrap()
}

fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn plain_profile() -> Profile {
    Profile {
        id: "host-1".to_string(),
        display_name: "Dana Host".to_string(),
        company: None,
        timezone: Some("Europe/Zurich".to_string()),
        google_access_token: None,
        google_refresh_token: None,
        google_token_expires_at: None,
        google_calendar_connected: false,
    }
}

fn integrated_profile(expires_at: DateTime<Utc>) -> Profile {
    Profile {
        google_access_token: Some("stored-access".to_string()),
        google_refresh_token: Some("stored-refresh".to_string()),
        google_token_expires_at: Some(expires_at),
        google_calendar_connected: true,
        ..plain_profile()
    }
}

fn thirty_minute_event_type() -> EventType {
    EventType {
        id: "et-1".to_string(),
        host_id: "host-1".to_string(),
        title: "Intro call".to_string(),
        description: None,
        duration_minutes: 30,
        price_cents: 0,
        buffer_minutes: 0,
        color: None,
        is_active: true,
        created_at: now() - Duration::days(7),
        updated_at: now() - Duration::days(7),
    }
}

fn monday_window(start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
    AvailabilityWindow {
        id: format!("w-{}", start.0),
        host_id: "host-1".to_string(),
        day_of_week: 1,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        is_available: true,
    }
}

fn confirmed_booking(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
    Booking {
        id: id.to_string(),
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
        created_at: now() - Duration::days(1),
    }
}

fn new_booking_request(start: DateTime<Utc>) -> NewBooking {
    NewBooking {
        event_type_id: "et-1".to_string(),
        host_id: "host-1".to_string(),
        client_name: "Robin Client".to_string(),
        client_email: "robin@example.com".to_string(),
        client_phone: None,
        start_time: start,
        end_time: start + Duration::minutes(30),
        notes: Some("bring the contract".to_string()),
    }
}

struct HarnessBuilder {
    profile: Profile,
    windows: Vec<AvailabilityWindow>,
    bookings: InMemoryBookings,
    links: InMemoryLinks,
    provider: FakeCalendarProvider,
}

impl HarnessBuilder {
    fn new() -> Self {
        Self {
            profile: plain_profile(),
            windows: Vec::new(),
            bookings: InMemoryBookings::default(),
            links: InMemoryLinks::default(),
            provider: FakeCalendarProvider::with_primary_calendar(),
        }
    }

    fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    fn windows(mut self, windows: Vec<AvailabilityWindow>) -> Self {
        self.windows = windows;
        self
    }

    fn bookings(mut self, bookings: InMemoryBookings) -> Self {
        self.bookings = bookings;
        self
    }

    fn links(mut self, links: InMemoryLinks) -> Self {
        self.links = links;
        self
    }

    fn provider(mut self, provider: FakeCalendarProvider) -> Self {
        self.provider = provider;
        self
    }

    fn build(self) -> Harness {
        let profiles = Arc::new(InMemoryProfiles::with_profile(self.profile));
        let event_types = Arc::new(InMemoryEventTypes::with_event_type(
            thirty_minute_event_type(),
        ));
        let availability = Arc::new(InMemoryAvailability::with_windows(self.windows));
        let bookings = Arc::new(self.bookings);
        let links = Arc::new(self.links);
        let provider = Arc::new(self.provider);
        let hook = Arc::new(RecordingHook::default());

        let orchestrator = BookingOrchestrator::new(
            profiles.clone(),
            event_types,
            availability,
            bookings.clone(),
            links.clone(),
            Some(provider.clone() as Arc<dyn CalendarProvider<Error = BoxedError>>),
            hook.clone(),
            &BookingConfig::default(),
        );

        Harness {
            profiles,
            bookings,
            links,
            provider,
            hook,
            orchestrator,
        }
    }
}

// --- Create path ---

#[tokio::test]
async fn failed_local_insert_aborts_the_whole_operation() {
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .bookings(InMemoryBookings::failing())
        .build();

    let err = harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect_err("insert failure must surface");

    assert!(matches!(err, BookifyError::DatabaseError(_)));
    assert_eq!(harness.provider.created_count(), 0);
    assert!(harness.hook.skipped_mirrors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn booking_without_integration_is_local_only() {
    let harness = HarnessBuilder::new().build();

    let booking = harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect("booking succeeds");

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(booking.meeting_link.is_none());
    assert_eq!(harness.provider.created_count(), 0);
    assert_eq!(harness.links.count(), 0);
}

#[tokio::test]
async fn booking_is_mirrored_with_link_row_and_meeting_link() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.meeting_link = Some("https://meet.example.com/abc".to_string());
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .provider(provider)
        .build();

    let booking = harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect("booking succeeds");

    assert_eq!(
        booking.meeting_link.as_deref(),
        Some("https://meet.example.com/abc")
    );
    assert_eq!(harness.provider.created_count(), 1);
    assert_eq!(harness.links.count(), 1);

    let created = harness.provider.created_events.lock().unwrap();
    let (calendar_id, event) = &created[0];
    assert_eq!(calendar_id, "primary-cal");
    assert_eq!(event.summary, "Intro call - Robin Client");
    assert_eq!(event.time_zone, "Europe/Zurich");
    assert_eq!(event.attendee_email.as_deref(), Some("robin@example.com"));
    let description = event.description.as_deref().unwrap();
    assert!(description.contains("Robin Client (robin@example.com)"));
    assert!(description.contains("Notes: bring the contract"));

    let link = harness.links.links.lock().unwrap()[0].clone();
    assert_eq!(link.booking_id, booking.id);
    assert_eq!(link.google_event_id, "gev-1");

    // The stored row carries the meeting link too
    let stored = harness.bookings.get(&booking.id).unwrap();
    assert_eq!(
        stored.meeting_link.as_deref(),
        Some("https://meet.example.com/abc")
    );
}

#[tokio::test]
async fn remote_event_failure_leaves_booking_confirmed_without_link() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.create_event_fails = true;
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .provider(provider)
        .build();

    let booking = harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect("booking still succeeds");

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(booking.meeting_link.is_none());
    assert_eq!(harness.links.count(), 0);

    let skipped = harness.hook.skipped_mirrors.lock().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, booking.id);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted_before_the_mirror() {
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() - Duration::minutes(1)))
        .build();

    harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect("booking succeeds");

    assert_eq!(*harness.provider.refresh_calls.lock().unwrap(), 1);
    assert_eq!(harness.provider.created_count(), 1);

    let profiles = harness.profiles.profiles.lock().unwrap();
    let profile = profiles.get("host-1").unwrap();
    assert_eq!(
        profile.google_access_token.as_deref(),
        Some("refreshed-access")
    );
}

#[tokio::test]
async fn refresh_failure_skips_the_mirror_but_not_the_booking() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.refresh_fails = true;
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() - Duration::minutes(1)))
        .provider(provider)
        .build();

    let booking = harness
        .orchestrator
        .create_booking(new_booking_request(at(9, 0)), now())
        .await
        .expect("booking still succeeds");

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(harness.provider.created_count(), 0);
    assert_eq!(harness.hook.skipped_mirrors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn booking_length_must_match_event_type_duration() {
    let harness = HarnessBuilder::new().build();

    let mut request = new_booking_request(at(9, 0));
    request.end_time = request.start_time + Duration::minutes(45);

    let err = harness
        .orchestrator
        .create_booking(request, now())
        .await
        .expect_err("length mismatch");
    assert!(matches!(err, BookifyError::ValidationError(_)));
}

#[tokio::test]
async fn unknown_event_type_is_not_found() {
    let harness = HarnessBuilder::new().build();

    let mut request = new_booking_request(at(9, 0));
    request.event_type_id = "missing".to_string();

    let err = harness
        .orchestrator
        .create_booking(request, now())
        .await
        .expect_err("unknown event type");
    assert!(matches!(err, BookifyError::NotFoundError(_)));
}

// --- Cancel path ---

#[tokio::test]
async fn only_the_host_can_cancel() {
    let harness = HarnessBuilder::new()
        .bookings(InMemoryBookings::with_booking(confirmed_booking(
            "b-1",
            at(9, 0),
            at(9, 30),
        )))
        .build();

    let err = harness
        .orchestrator
        .cancel_booking("b-1", "someone-else", now())
        .await
        .expect_err("not the host");

    assert!(matches!(err, BookifyError::AuthError(_)));
    assert_eq!(
        harness.bookings.get("b-1").unwrap().status,
        BookingStatus::Confirmed
    );
}

#[tokio::test]
async fn cancel_flips_status_and_cleans_up_the_remote_event() {
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .bookings(InMemoryBookings::with_booking(confirmed_booking(
            "b-1",
            at(9, 0),
            at(9, 30),
        )))
        .links(InMemoryLinks::with_link(CalendarEventLink {
            id: "link-1".to_string(),
            host_id: "host-1".to_string(),
            booking_id: "b-1".to_string(),
            google_event_id: "gev-9".to_string(),
            calendar_id: "primary-cal".to_string(),
        }))
        .build();

    harness
        .orchestrator
        .cancel_booking("b-1", "host-1", now())
        .await
        .expect("cancel succeeds");

    assert_eq!(
        harness.bookings.get("b-1").unwrap().status,
        BookingStatus::Cancelled
    );
    let deleted = harness.provider.deleted_events.lock().unwrap();
    assert_eq!(deleted.as_slice(), &[("primary-cal".to_string(), "gev-9".to_string())]);
    assert_eq!(harness.links.count(), 0);
}

#[tokio::test]
async fn failed_remote_delete_keeps_the_booking_cancelled_and_the_link() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.delete_event_fails = true;
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .bookings(InMemoryBookings::with_booking(confirmed_booking(
            "b-1",
            at(9, 0),
            at(9, 30),
        )))
        .links(InMemoryLinks::with_link(CalendarEventLink {
            id: "link-1".to_string(),
            host_id: "host-1".to_string(),
            booking_id: "b-1".to_string(),
            google_event_id: "gev-9".to_string(),
            calendar_id: "primary-cal".to_string(),
        }))
        .provider(provider)
        .build();

    harness
        .orchestrator
        .cancel_booking("b-1", "host-1", now())
        .await
        .expect("cancel still succeeds");

    assert_eq!(
        harness.bookings.get("b-1").unwrap().status,
        BookingStatus::Cancelled
    );
    // The linkage row survives for reconciliation
    assert_eq!(harness.links.count(), 1);
    assert_eq!(harness.hook.incomplete_cleanups.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn cancelling_an_unknown_booking_is_not_found() {
    let harness = HarnessBuilder::new().build();

    let err = harness
        .orchestrator
        .cancel_booking("missing", "host-1", now())
        .await
        .expect_err("unknown booking");
    assert!(matches!(err, BookifyError::NotFoundError(_)));
}

// --- Slot resolution ---

#[tokio::test]
async fn slots_run_through_local_and_remote_filters() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.busy = vec![(at(10, 0), at(10, 30))];
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .windows(vec![monday_window((9, 0), (11, 0))])
        .bookings(InMemoryBookings::with_booking(confirmed_booking(
            "b-1",
            at(9, 30),
            at(10, 0),
        )))
        .provider(provider)
        .build();

    let (slots, source) = harness
        .orchestrator
        .available_slots("host-1", test_day(), "et-1", now())
        .await
        .expect("slots resolve");

    // 09:30 is locally booked, 10:00 is remotely busy; 09:00 touches the
    // booking and 10:30 touches the busy period, both stay offerable.
    assert_eq!(slots, vec![at(9, 0), at(10, 30)]);
    assert_eq!(source, SlotSource::GoogleCalendar);
}

#[tokio::test]
async fn slots_fall_back_to_local_data_for_unintegrated_hosts() {
    let harness = HarnessBuilder::new()
        .windows(vec![monday_window((9, 0), (10, 0))])
        .build();

    let (slots, source) = harness
        .orchestrator
        .available_slots("host-1", test_day(), "et-1", now())
        .await
        .expect("slots resolve");

    assert_eq!(slots, vec![at(9, 0), at(9, 30)]);
    assert_eq!(source, SlotSource::Database);
    assert_eq!(harness.provider.created_count(), 0);
}

#[tokio::test]
async fn no_windows_means_no_slots() {
    let harness = HarnessBuilder::new().build();

    let (slots, source) = harness
        .orchestrator
        .available_slots("host-1", test_day(), "et-1", now())
        .await
        .expect("slots resolve");

    assert!(slots.is_empty());
    assert_eq!(source, SlotSource::Database);
}

// --- Point-in-time check ---

#[tokio::test]
async fn check_reports_busy_interval_with_calendar_id() {
    let mut provider = FakeCalendarProvider::with_primary_calendar();
    provider.busy = vec![(at(9, 0), at(10, 0))];
    let harness = HarnessBuilder::new()
        .profile(integrated_profile(now() + Duration::hours(1)))
        .provider(provider)
        .build();

    let check = harness
        .orchestrator
        .check_availability("host-1", at(9, 30), at(10, 0), now())
        .await
        .expect("check resolves");

    assert!(!check.available);
    assert_eq!(check.source, SlotSource::GoogleCalendar);
    assert_eq!(check.calendar_id.as_deref(), Some("primary-cal"));
}

#[tokio::test]
async fn check_without_integration_reports_available_from_local_data() {
    let harness = HarnessBuilder::new().build();

    let check = harness
        .orchestrator
        .check_availability("host-1", at(9, 0), at(9, 30), now())
        .await
        .expect("check resolves");

    assert!(check.available);
    assert_eq!(check.source, SlotSource::Database);
    assert!(check.calendar_id.is_none());
}

#[tokio::test]
async fn check_for_unknown_host_is_not_found() {
    let harness = HarnessBuilder::new().build();

    let err = harness
        .orchestrator
        .check_availability("missing", at(9, 0), at(9, 30), now())
        .await
        .expect_err("unknown host");
    assert!(matches!(err, BookifyError::NotFoundError(_)));
}

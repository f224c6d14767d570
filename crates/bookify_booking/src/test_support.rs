//! In-memory doubles for the repository traits and the calendar provider,
//! shared by the remote-filter and orchestrator tests.

use crate::orchestrator::ReconciliationHook;
use bookify_common::services::{
    BoxFuture, BoxedError, BusyInterval, CalendarInfo, CalendarProvider, CreatedEvent,
    Credentials, EventPayload, TokenSet,
};
use bookify_db::{
    AvailabilityRepository, AvailabilityWindow, Booking, BookingRepository, BookingStatus,
    CalendarEventLink, CalendarEventLinkRepository, DbError, EventType, EventTypeRepository,
    Profile, ProfileRepository,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

fn boxed_error(message: &str) -> BoxedError {
    BoxedError(Box::new(std::io::Error::other(message.to_string())))
}

// --- Calendar provider double ---

/// Scriptable calendar provider recording every write it is asked to make.
#[derive(Default)]
pub struct FakeCalendarProvider {
    pub calendars: Vec<CalendarInfo>,
    pub list_calendars_fails: bool,
    /// Busy intervals on the fake calendar; free/busy returns the ones
    /// overlapping the queried range.
    pub busy: Vec<BusyInterval>,
    /// Query starts whose free/busy call errors out.
    pub failing_query_starts: Vec<DateTime<Utc>>,
    pub create_event_fails: bool,
    pub meeting_link: Option<String>,
    pub delete_event_fails: bool,
    pub refresh_fails: bool,
    pub created_events: Mutex<Vec<(String, EventPayload)>>,
    pub deleted_events: Mutex<Vec<(String, String)>>,
    pub refresh_calls: Mutex<u32>,
}

impl FakeCalendarProvider {
    pub fn with_primary_calendar() -> Self {
        Self {
            calendars: vec![CalendarInfo {
                id: "primary-cal".to_string(),
                summary: Some("Host calendar".to_string()),
                primary: true,
            }],
            ..Default::default()
        }
    }

    pub fn created_count(&self) -> usize {
        self.created_events.lock().unwrap().len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted_events.lock().unwrap().len()
    }
}

impl CalendarProvider for FakeCalendarProvider {
    type Error = BoxedError;

    fn exchange_code(&self, _code: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        Box::pin(async { Err(boxed_error("exchange_code not scripted")) })
    }

    fn refresh_access_token(&self, refresh_token: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        *self.refresh_calls.lock().unwrap() += 1;
        let fails = self.refresh_fails;
        let refresh_token = refresh_token.to_string();
        Box::pin(async move {
            if fails {
                return Err(boxed_error("refresh token revoked"));
            }
            Ok(TokenSet {
                access_token: "refreshed-access".to_string(),
                refresh_token: Some(refresh_token),
                expires_at: Utc::now() + Duration::hours(1),
            })
        })
    }

    fn list_calendars(
        &self,
        _credentials: &Credentials,
    ) -> BoxFuture<'_, Vec<CalendarInfo>, Self::Error> {
        let fails = self.list_calendars_fails;
        let calendars = self.calendars.clone();
        Box::pin(async move {
            if fails {
                return Err(boxed_error("calendar listing unavailable"));
            }
            Ok(calendars)
        })
    }

    fn query_free_busy(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, Self::Error> {
        let fails = self.failing_query_starts.contains(&start_time);
        let overlapping: Vec<BusyInterval> = self
            .busy
            .iter()
            .copied()
            .filter(|(busy_start, busy_end)| *busy_start < end_time && *busy_end > start_time)
            .collect();
        Box::pin(async move {
            if fails {
                return Err(boxed_error("free/busy query failed"));
            }
            Ok(overlapping)
        })
    }

    fn create_event(
        &self,
        _credentials: &Credentials,
        calendar_id: &str,
        event: EventPayload,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        if self.create_event_fails {
            return Box::pin(async { Err(boxed_error("event insert rejected")) });
        }
        let mut created = self.created_events.lock().unwrap();
        created.push((calendar_id.to_string(), event));
        let event_id = format!("gev-{}", created.len());
        let meeting_link = self.meeting_link.clone();
        Box::pin(async move {
            Ok(CreatedEvent {
                event_id,
                meeting_link,
            })
        })
    }

    fn delete_event(
        &self,
        _credentials: &Credentials,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        if self.delete_event_fails {
            return Box::pin(async { Err(boxed_error("event delete rejected")) });
        }
        self.deleted_events
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), event_id.to_string()));
        Box::pin(async { Ok(()) })
    }
}

// --- Repository doubles ---

#[derive(Default)]
pub struct InMemoryProfiles {
    pub profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryProfiles {
    pub fn with_profile(profile: Profile) -> Self {
        let store = Self::default();
        store
            .profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        store
    }
}

impl ProfileRepository for InMemoryProfiles {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DbError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>, DbError> {
        Ok(self.profiles.lock().unwrap().get(id).cloned())
    }

    async fn save_tokens(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(host_id) {
            profile.google_access_token = Some(access_token.to_string());
            profile.google_refresh_token = Some(refresh_token.to_string());
            profile.google_token_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn connect_integration(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(host_id) {
            profile.google_access_token = Some(access_token.to_string());
            profile.google_refresh_token = refresh_token.map(|t| t.to_string());
            profile.google_token_expires_at = Some(expires_at);
            profile.google_calendar_connected = true;
        }
        Ok(())
    }

    async fn clear_integration(&self, host_id: &str) -> Result<(), DbError> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(host_id) {
            profile.google_access_token = None;
            profile.google_refresh_token = None;
            profile.google_token_expires_at = None;
            profile.google_calendar_connected = false;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventTypes {
    pub event_types: Mutex<HashMap<String, EventType>>,
}

impl InMemoryEventTypes {
    pub fn with_event_type(event_type: EventType) -> Self {
        let store = Self::default();
        store
            .event_types
            .lock()
            .unwrap()
            .insert(event_type.id.clone(), event_type);
        store
    }
}

impl EventTypeRepository for InMemoryEventTypes {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create(&self, event_type: EventType) -> Result<EventType, DbError> {
        self.event_types
            .lock()
            .unwrap()
            .insert(event_type.id.clone(), event_type.clone());
        Ok(event_type)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventType>, DbError> {
        Ok(self.event_types.lock().unwrap().get(id).cloned())
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<EventType>, DbError> {
        Ok(self
            .event_types
            .lock()
            .unwrap()
            .values()
            .filter(|et| et.host_id == host_id)
            .cloned()
            .collect())
    }

    async fn update(&self, event_type: EventType) -> Result<EventType, DbError> {
        self.event_types
            .lock()
            .unwrap()
            .insert(event_type.id.clone(), event_type.clone());
        Ok(event_type)
    }

    async fn deactivate(&self, id: &str) -> Result<bool, DbError> {
        let mut event_types = self.event_types.lock().unwrap();
        match event_types.get_mut(id) {
            Some(event_type) => {
                event_type.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        Ok(self.event_types.lock().unwrap().remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryAvailability {
    pub windows: Mutex<Vec<AvailabilityWindow>>,
}

impl InMemoryAvailability {
    pub fn with_windows(windows: Vec<AvailabilityWindow>) -> Self {
        Self {
            windows: Mutex::new(windows),
        }
    }
}

impl AvailabilityRepository for InMemoryAvailability {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn list_for_day(
        &self,
        host_id: &str,
        day_of_week: i64,
    ) -> Result<Vec<AvailabilityWindow>, DbError> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.host_id == host_id && w.day_of_week == day_of_week && w.is_available)
            .cloned()
            .collect())
    }

    async fn list_for_host(&self, host_id: &str) -> Result<Vec<AvailabilityWindow>, DbError> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.host_id == host_id)
            .cloned()
            .collect())
    }

    async fn replace_for_host(
        &self,
        host_id: &str,
        new_windows: Vec<AvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, DbError> {
        let mut windows = self.windows.lock().unwrap();
        windows.retain(|w| w.host_id != host_id);
        windows.extend(new_windows.clone());
        Ok(new_windows)
    }
}

#[derive(Default)]
pub struct InMemoryBookings {
    pub bookings: Mutex<Vec<Booking>>,
    pub fail_create: bool,
}

impl InMemoryBookings {
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    pub fn with_booking(booking: Booking) -> Self {
        Self {
            bookings: Mutex::new(vec![booking]),
            fail_create: false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }
}

impl BookingRepository for InMemoryBookings {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create(&self, booking: Booking) -> Result<Booking, DbError> {
        if self.fail_create {
            return Err(DbError::QueryError("insert rejected".to_string()));
        }
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, DbError> {
        Ok(self.get(id))
    }

    async fn list_confirmed_in_range(
        &self,
        host_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DbError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.host_id == host_id
                    && b.status == BookingStatus::Confirmed
                    && b.start_time < to
                    && b.end_time > from
            })
            .cloned()
            .collect())
    }

    async fn list_for_host(
        &self,
        host_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Booking>, DbError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.host_id == host_id
                    && from.map(|f| b.end_time > f).unwrap_or(true)
                    && to.map(|t| b.start_time < t).unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<bool, DbError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.iter_mut().find(|b| b.id == id) {
            Some(booking) => {
                booking.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_meeting_link(&self, id: &str, meeting_link: &str) -> Result<(), DbError> {
        if let Some(booking) = self.bookings.lock().unwrap().iter_mut().find(|b| b.id == id) {
            booking.meeting_link = Some(meeting_link.to_string());
        }
        Ok(())
    }

    async fn count_for_event_type(&self, event_type_id: &str) -> Result<i64, DbError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.event_type_id == event_type_id)
            .count() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryLinks {
    pub links: Mutex<Vec<CalendarEventLink>>,
}

impl InMemoryLinks {
    pub fn with_link(link: CalendarEventLink) -> Self {
        Self {
            links: Mutex::new(vec![link]),
        }
    }

    pub fn count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

impl CalendarEventLinkRepository for InMemoryLinks {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create(&self, link: CalendarEventLink) -> Result<CalendarEventLink, DbError> {
        self.links.lock().unwrap().push(link.clone());
        Ok(link)
    }

    async fn find_by_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<CalendarEventLink>, DbError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.booking_id == booking_id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() < before)
    }
}

// --- Reconciliation hook double ---

#[derive(Default)]
pub struct RecordingHook {
    pub skipped_mirrors: Mutex<Vec<(String, String)>>,
    pub incomplete_cleanups: Mutex<Vec<(String, String)>>,
}

impl ReconciliationHook for RecordingHook {
    fn mirror_skipped(&self, booking_id: &str, reason: &str) {
        self.skipped_mirrors
            .lock()
            .unwrap()
            .push((booking_id.to_string(), reason.to_string()));
    }

    fn cleanup_incomplete(&self, booking_id: &str, reason: &str) {
        self.incomplete_cleanups
            .lock()
            .unwrap()
            .push((booking_id.to_string(), reason.to_string()));
    }
}

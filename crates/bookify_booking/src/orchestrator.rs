// --- File: crates/bookify_booking/src/orchestrator.rs ---
//! Availability resolution and the two-phase booking commit.
//!
//! A booking is committed in two stages: the local row is the source of
//! truth and must succeed; the remote calendar mirror is best-effort and
//! never rolls the local write back. There is no transaction spanning both
//! systems — the [`ReconciliationHook`] is the explicit seam where a future
//! sweep reconciling linkage rows against provider state would attach.
//!
//! Concurrency note: slot listing reads a snapshot of confirmed bookings
//! with no lock, so a concurrent create for an overlapping interval can
//! still double-book between read and write. Closing that window (an
//! advisory lock keyed by host and day, or a store-level exclusion
//! constraint) belongs behind [`BookingRepository::create`].

use crate::logic::{filter_local_conflicts, generate_candidate_slots};
use crate::remote::{filter_remote_conflicts, select_primary_calendar, SlotSource};
use bookify_common::services::{BoxedError, CalendarProvider, EventPayload};
use bookify_common::BookifyError;
use bookify_config::BookingConfig;
use bookify_db::{
    AvailabilityRepository, Booking, BookingRepository, BookingStatus, CalendarEventLink,
    CalendarEventLinkRepository, DbError, EventType, EventTypeRepository, Profile,
    ProfileRepository,
};
use bookify_gcal::token::ensure_fresh_credentials;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Hook receiving the cross-system inconsistencies the two-phase commit can
/// leave behind: a confirmed booking with no remote mirror, or a cancelled
/// booking whose remote event or linkage row survived cleanup.
pub trait ReconciliationHook: Send + Sync {
    /// A confirmed booking exists locally with no remote event.
    fn mirror_skipped(&self, booking_id: &str, reason: &str);
    /// A cancelled booking may still have a remote event or linkage row.
    fn cleanup_incomplete(&self, booking_id: &str, reason: &str);
}

/// Default hook: records the inconsistency and nothing else.
pub struct LoggingReconciliationHook;

impl ReconciliationHook for LoggingReconciliationHook {
    fn mirror_skipped(&self, booking_id: &str, reason: &str) {
        warn!("Booking {} has no remote mirror: {}", booking_id, reason);
    }

    fn cleanup_incomplete(&self, booking_id: &str, reason: &str) {
        warn!(
            "Cancelled booking {} may have an orphaned remote event: {}",
            booking_id, reason
        );
    }
}

/// Input for a booking creation.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub event_type_id: String,
    pub host_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Result of a point-in-time availability check.
#[derive(Debug, Clone)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub source: SlotSource,
    pub calendar_id: Option<String>,
}

/// Coordinates repositories and the calendar provider for the availability
/// and booking flows.
pub struct BookingOrchestrator<PR, ET, AV, BK, LN>
where
    PR: ProfileRepository,
    ET: EventTypeRepository,
    AV: AvailabilityRepository,
    BK: BookingRepository,
    LN: CalendarEventLinkRepository,
{
    profiles: Arc<PR>,
    event_types: Arc<ET>,
    availability: Arc<AV>,
    bookings: Arc<BK>,
    links: Arc<LN>,
    provider: Option<Arc<dyn CalendarProvider<Error = BoxedError>>>,
    hook: Arc<dyn ReconciliationHook>,
    slot_step: Duration,
    default_time_zone: String,
}

impl<PR, ET, AV, BK, LN> BookingOrchestrator<PR, ET, AV, BK, LN>
where
    PR: ProfileRepository,
    ET: EventTypeRepository,
    AV: AvailabilityRepository,
    BK: BookingRepository,
    LN: CalendarEventLinkRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        profiles: Arc<PR>,
        event_types: Arc<ET>,
        availability: Arc<AV>,
        bookings: Arc<BK>,
        links: Arc<LN>,
        provider: Option<Arc<dyn CalendarProvider<Error = BoxedError>>>,
        hook: Arc<dyn ReconciliationHook>,
        booking_config: &BookingConfig,
    ) -> Self {
        Self {
            profiles,
            event_types,
            availability,
            bookings,
            links,
            provider,
            hook,
            slot_step: Duration::minutes(booking_config.slot_step_minutes()),
            default_time_zone: booking_config.default_time_zone().to_string(),
        }
    }

    /// Offerable slots for one host, day and event type.
    ///
    /// Candidates come from the weekly schedule, are narrowed against
    /// confirmed local bookings, and, for integrated hosts, against live
    /// free/busy data. Remote problems never fail the request; the source
    /// tag tells the caller which filters actually applied.
    pub async fn available_slots(
        &self,
        host_id: &str,
        date: NaiveDate,
        event_type_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Vec<DateTime<Utc>>, SlotSource), BookifyError> {
        let event_type = self.require_event_type(event_type_id).await?;
        let duration = Duration::minutes(event_type.duration_minutes);

        let day_of_week = date.weekday().num_days_from_sunday() as i64;
        let windows = self
            .availability
            .list_for_day(host_id, day_of_week)
            .await
            .map_err(db_error)?;

        if windows.is_empty() {
            return Ok((Vec::new(), SlotSource::Database));
        }

        let candidates = generate_candidate_slots(&windows, date, duration, now, self.slot_step);

        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = day_start + Duration::days(1);
        let confirmed = self
            .bookings
            .list_confirmed_in_range(host_id, day_start, day_end)
            .await
            .map_err(db_error)?;

        let local = filter_local_conflicts(&candidates, duration, &confirmed);

        let Some(provider) = self.provider.as_deref() else {
            return Ok((local, SlotSource::Database));
        };
        let profile = self.profiles.find_by_id(host_id).await.map_err(db_error)?;
        let Some(profile) = profile.filter(|p| p.is_integrated()) else {
            return Ok((local, SlotSource::Database));
        };

        let credentials =
            match ensure_fresh_credentials(provider, self.profiles.as_ref(), &profile, now).await {
                Ok(credentials) => credentials,
                Err(e) => {
                    warn!(
                        "Could not resolve calendar credentials for host {}: {}",
                        host_id, e
                    );
                    return Ok((local, SlotSource::Database));
                }
            };

        Ok(filter_remote_conflicts(provider, &credentials, local, duration).await)
    }

    /// Point-in-time check of one interval against the host's live calendar.
    ///
    /// Hosts without integration are reported available from the local data
    /// alone, and every remote failure degrades to that same answer.
    pub async fn check_availability(
        &self,
        host_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityCheck, BookifyError> {
        let profile = self
            .profiles
            .find_by_id(host_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookifyError::NotFoundError("host not found".to_string()))?;

        let local_only = AvailabilityCheck {
            available: true,
            source: SlotSource::Database,
            calendar_id: None,
        };

        let Some(provider) = self.provider.as_deref() else {
            return Ok(local_only);
        };
        if !profile.is_integrated() {
            return Ok(local_only);
        }

        let credentials =
            match ensure_fresh_credentials(provider, self.profiles.as_ref(), &profile, now).await {
                Ok(credentials) => credentials,
                Err(e) => {
                    warn!("Error refreshing tokens for host {}: {}", host_id, e);
                    return Ok(local_only);
                }
            };

        let calendars = match provider.list_calendars(&credentials).await {
            Ok(calendars) => calendars,
            Err(e) => {
                warn!("Error listing calendars for host {}: {}", host_id, e);
                return Ok(local_only);
            }
        };
        let Some(calendar) = select_primary_calendar(&calendars) else {
            return Ok(local_only);
        };

        match provider
            .query_free_busy(&credentials, &calendar.id, start_time, end_time)
            .await
        {
            Ok(busy) => Ok(AvailabilityCheck {
                available: busy.is_empty(),
                source: SlotSource::GoogleCalendar,
                calendar_id: Some(calendar.id.clone()),
            }),
            Err(e) => {
                warn!("Error checking calendar availability: {}", e);
                Ok(local_only)
            }
        }
    }

    /// Creates a booking: required local write, then best-effort remote
    /// mirror. The returned booking reflects the local row, including the
    /// meeting link when the mirror produced one.
    pub async fn create_booking(
        &self,
        request: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookifyError> {
        if request.client_name.trim().is_empty() {
            return Err(BookifyError::ValidationError(
                "client_name is required".to_string(),
            ));
        }
        if request.client_email.trim().is_empty() {
            return Err(BookifyError::ValidationError(
                "client_email is required".to_string(),
            ));
        }
        if request.start_time >= request.end_time {
            return Err(BookifyError::ValidationError(
                "start_time must be before end_time".to_string(),
            ));
        }

        let event_type = self.require_event_type(&request.event_type_id).await?;
        let booked_duration = request.end_time - request.start_time;
        if booked_duration != Duration::minutes(event_type.duration_minutes) {
            return Err(BookifyError::ValidationError(format!(
                "booking length must match the event type duration of {} minutes",
                event_type.duration_minutes
            )));
        }

        let profile = self
            .profiles
            .find_by_id(&request.host_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookifyError::NotFoundError("host not found".to_string()))?;

        // Stage 1: the local row. A failure here fails the whole operation.
        let mut booking = Booking {
            id: Uuid::new_v4().to_string(),
            host_id: request.host_id,
            event_type_id: request.event_type_id,
            client_name: request.client_name,
            client_email: request.client_email,
            client_phone: request.client_phone,
            start_time: request.start_time,
            end_time: request.end_time,
            status: BookingStatus::Confirmed,
            payment_status: Some("unpaid".to_string()),
            notes: request.notes,
            meeting_link: None,
            created_at: now,
        };
        booking = self.bookings.create(booking).await.map_err(db_error)?;
        info!("Created booking {} for host {}", booking.id, booking.host_id);

        // Stage 2: the remote mirror. Nothing past this point can fail the
        // request; the booking stays confirmed without a mirror instead.
        if let Err(reason) = self.mirror_booking(&profile, &event_type, &mut booking, now).await {
            warn!("Error creating calendar event for booking {}: {}", booking.id, reason);
            self.hook.mirror_skipped(&booking.id, &reason);
        }

        Ok(booking)
    }

    async fn mirror_booking(
        &self,
        profile: &Profile,
        event_type: &EventType,
        booking: &mut Booking,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        let Some(provider) = self.provider.as_deref() else {
            return Ok(());
        };
        if !profile.is_integrated() {
            return Ok(());
        }

        let credentials =
            ensure_fresh_credentials(provider, self.profiles.as_ref(), profile, now)
                .await
                .map_err(|e| e.to_string())?;

        let calendars = provider
            .list_calendars(&credentials)
            .await
            .map_err(|e| e.to_string())?;
        let Some(calendar) = select_primary_calendar(&calendars) else {
            return Err("host has no calendars".to_string());
        };

        let event = EventPayload {
            summary: format!("{} - {}", event_type.title, booking.client_name),
            description: Some(event_description(booking)),
            start_time: booking.start_time,
            end_time: booking.end_time,
            time_zone: self.host_time_zone(profile),
            attendee_email: Some(booking.client_email.clone()),
        };

        let created = provider
            .create_event(&credentials, &calendar.id, event)
            .await
            .map_err(|e| e.to_string())?;

        self.links
            .create(CalendarEventLink {
                id: Uuid::new_v4().to_string(),
                host_id: booking.host_id.clone(),
                booking_id: booking.id.clone(),
                google_event_id: created.event_id.clone(),
                calendar_id: calendar.id.clone(),
            })
            .await
            .map_err(|e| e.to_string())?;

        if let Some(meeting_link) = created.meeting_link {
            self.bookings
                .set_meeting_link(&booking.id, &meeting_link)
                .await
                .map_err(|e| e.to_string())?;
            booking.meeting_link = Some(meeting_link);
        }

        info!(
            "Mirrored booking {} to calendar event {}",
            booking.id, created.event_id
        );
        Ok(())
    }

    /// Cancels a booking on behalf of its host: required status flip, then
    /// best-effort remote cleanup.
    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        acting_host_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BookifyError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookifyError::NotFoundError("booking not found".to_string()))?;

        if booking.host_id != acting_host_id {
            return Err(BookifyError::AuthError(
                "only the booking's host can cancel it".to_string(),
            ));
        }

        // Required step: the status flip. A failure aborts before any
        // remote side effect is attempted.
        let updated = self
            .bookings
            .update_status(booking_id, BookingStatus::Cancelled)
            .await
            .map_err(db_error)?;
        if !updated {
            return Err(BookifyError::NotFoundError("booking not found".to_string()));
        }
        info!("Cancelled booking {}", booking_id);

        // Best-effort cleanup; the booking stays cancelled regardless.
        if let Err(reason) = self.cleanup_remote_event(&booking, now).await {
            warn!(
                "Error deleting calendar event for booking {}: {}",
                booking_id, reason
            );
            self.hook.cleanup_incomplete(booking_id, &reason);
        }

        Ok(())
    }

    async fn cleanup_remote_event(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        let link = self
            .links
            .find_by_booking(&booking.id)
            .await
            .map_err(|e| e.to_string())?;
        let Some(link) = link else {
            return Ok(());
        };
        let Some(provider) = self.provider.as_deref() else {
            return Ok(());
        };

        let profile = self
            .profiles
            .find_by_id(&booking.host_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "host profile missing".to_string())?;
        if !profile.is_integrated() {
            return Ok(());
        }

        let credentials =
            ensure_fresh_credentials(provider, self.profiles.as_ref(), &profile, now)
                .await
                .map_err(|e| e.to_string())?;

        provider
            .delete_event(&credentials, &link.calendar_id, &link.google_event_id)
            .await
            .map_err(|e| e.to_string())?;

        // The linkage row goes only after the remote delete; a failure
        // above leaves it behind for reconciliation.
        self.links.delete(&link.id).await.map_err(|e| e.to_string())?;

        Ok(())
    }

    /// The IANA timezone remote events are presented in: the host's, when
    /// it parses, else the deployment default.
    fn host_time_zone(&self, profile: &Profile) -> String {
        profile
            .timezone
            .clone()
            .filter(|tz| tz.parse::<chrono_tz::Tz>().is_ok())
            .unwrap_or_else(|| self.default_time_zone.clone())
    }

    async fn require_event_type(&self, event_type_id: &str) -> Result<EventType, BookifyError> {
        self.event_types
            .find_by_id(event_type_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookifyError::NotFoundError("event type not found".to_string()))
    }
}

fn event_description(booking: &Booking) -> String {
    let mut description = format!(
        "Meeting with {} ({})",
        booking.client_name, booking.client_email
    );
    if let Some(notes) = booking.notes.as_deref() {
        description.push_str(&format!("\n\nNotes: {}", notes));
    }
    description.push_str("\n\nBooked via your booking platform");
    description
}

fn db_error(e: DbError) -> BookifyError {
    BookifyError::DatabaseError(e.to_string())
}

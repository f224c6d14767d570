// File: crates/bookify_booking/src/handlers.rs
//! HTTP handlers for the availability and booking surface, plus the
//! host-facing management endpoints for event types and weekly schedules.

use crate::orchestrator::{BookingOrchestrator, LoggingReconciliationHook, NewBooking};
use crate::remote::SlotSource;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use bookify_common::services::{BoxedError, CalendarProvider};
use bookify_common::{BookifyError, HostIdentity};
use bookify_config::AppConfig;
use bookify_db::{
    AvailabilityRepository, AvailabilityWindow, Booking, BookingRepository, EventType,
    EventTypeRepository, Repositories, SqlAvailabilityRepository, SqlBookingRepository,
    SqlCalendarEventLinkRepository, SqlEventTypeRepository, SqlProfileRepository,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// The orchestrator over the production SQL repositories.
pub type AppOrchestrator = BookingOrchestrator<
    SqlProfileRepository,
    SqlEventTypeRepository,
    SqlAvailabilityRepository,
    SqlBookingRepository,
    SqlCalendarEventLinkRepository,
>;

// Define shared state needed by the booking handlers
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub repos: Arc<Repositories>,
    pub orchestrator: AppOrchestrator,
}

impl BookingState {
    pub fn new(
        config: Arc<AppConfig>,
        repos: Arc<Repositories>,
        provider: Option<Arc<dyn CalendarProvider<Error = BoxedError>>>,
    ) -> Self {
        let orchestrator = BookingOrchestrator::new(
            Arc::new(repos.profiles.clone()),
            Arc::new(repos.event_types.clone()),
            Arc::new(repos.availability.clone()),
            Arc::new(repos.bookings.clone()),
            Arc::new(repos.calendar_event_links.clone()),
            provider,
            Arc::new(LoggingReconciliationHook),
            &config.booking(),
        );
        Self {
            config,
            repos,
            orchestrator,
        }
    }
}

// --- Availability ---

#[derive(Deserialize, Debug)]
pub struct SlotsRequest {
    pub host_id: String,
    /// Target day in YYYY-MM-DD format
    pub date: String,
    pub event_type_id: String,
}

#[derive(Serialize, Debug)]
pub struct SlotEntry {
    /// Clock time of the slot start, HH:MM
    pub time: String,
    /// Full start instant, RFC 3339
    pub datetime: String,
}

#[derive(Serialize, Debug)]
pub struct SlotsResponse {
    pub slots: Vec<SlotEntry>,
    pub source: SlotSource,
}

/// Handler to get offerable time slots for a host, day and event type.
#[axum::debug_handler]
pub async fn get_slots_handler(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<SlotsRequest>,
) -> Result<Json<SlotsResponse>, BookifyError> {
    let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d").map_err(|_| {
        BookifyError::ValidationError("Invalid date format (YYYY-MM-DD)".to_string())
    })?;

    let (slots, source) = state
        .orchestrator
        .available_slots(&request.host_id, date, &request.event_type_id, Utc::now())
        .await?;

    let slots = slots
        .into_iter()
        .map(|slot| SlotEntry {
            time: slot.format("%H:%M").to_string(),
            datetime: slot.to_rfc3339(),
        })
        .collect();

    Ok(Json(SlotsResponse { slots, source }))
}

#[derive(Deserialize, Debug)]
pub struct CheckRequest {
    pub host_id: String,
    /// Interval start, RFC 3339
    pub start_time: String,
    /// Interval end, RFC 3339
    pub end_time: String,
}

#[derive(Serialize, Debug)]
pub struct CheckResponse {
    pub available: bool,
    pub source: SlotSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
}

/// Handler to check one interval against the host's live calendar.
#[axum::debug_handler]
pub async fn check_availability_handler(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, BookifyError> {
    let start_time = parse_instant(&request.start_time, "start_time")?;
    let end_time = parse_instant(&request.end_time, "end_time")?;

    let check = state
        .orchestrator
        .check_availability(&request.host_id, start_time, end_time, Utc::now())
        .await?;

    Ok(Json(CheckResponse {
        available: check.available,
        source: check.source,
        calendar_id: check.calendar_id,
    }))
}

// --- Bookings ---

#[derive(Deserialize, Debug)]
pub struct CreateBookingRequest {
    pub event_type_id: String,
    pub host_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    /// Slot start, RFC 3339
    pub start_time: String,
    /// Slot end, RFC 3339
    pub end_time: String,
    pub notes: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CreateBookingResponse {
    pub booking: Booking,
    pub success: bool,
}

/// Handler to create a booking.
///
/// The response reports the local write; a failed remote mirror leaves
/// success true and the booking without a meeting link.
#[axum::debug_handler]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, BookifyError> {
    let start_time = parse_instant(&request.start_time, "start_time")?;
    let end_time = parse_instant(&request.end_time, "end_time")?;

    let booking = state
        .orchestrator
        .create_booking(
            NewBooking {
                event_type_id: request.event_type_id,
                host_id: request.host_id,
                client_name: request.client_name,
                client_email: request.client_email,
                client_phone: request.client_phone,
                start_time,
                end_time,
                notes: request.notes,
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(CreateBookingResponse {
        booking,
        success: true,
    }))
}

#[derive(Deserialize, Debug)]
pub struct CancelBookingRequest {
    pub booking_id: String,
}

#[derive(Serialize, Debug)]
pub struct CancelBookingResponse {
    pub success: bool,
}

/// Handler to cancel a booking as its host.
#[axum::debug_handler]
pub async fn cancel_booking_handler(
    State(state): State<Arc<BookingState>>,
    HostIdentity(host_id): HostIdentity,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, BookifyError> {
    state
        .orchestrator
        .cancel_booking(&request.booking_id, &host_id, Utc::now())
        .await?;

    Ok(Json(CancelBookingResponse { success: true }))
}

#[derive(Deserialize, Debug)]
pub struct BookingsQuery {
    pub host_id: String,
    /// Lower bound, RFC 3339
    pub from: Option<String>,
    /// Upper bound, RFC 3339
    pub to: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BookingsResponse {
    pub bookings: Vec<Booking>,
}

/// Handler listing a host's bookings for the dashboard.
#[axum::debug_handler]
pub async fn list_bookings_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingsResponse>, BookifyError> {
    let from = query
        .from
        .as_deref()
        .map(|raw| parse_instant(raw, "from"))
        .transpose()?;
    let to = query
        .to
        .as_deref()
        .map(|raw| parse_instant(raw, "to"))
        .transpose()?;

    let bookings = state
        .repos
        .bookings
        .list_for_host(&query.host_id, from, to)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(BookingsResponse { bookings }))
}

// --- Event type management ---

#[derive(Deserialize, Debug)]
pub struct CreateEventTypeRequest {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price_cents: Option<i64>,
    pub buffer_minutes: Option<i64>,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateEventTypeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub price_cents: Option<i64>,
    pub buffer_minutes: Option<i64>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct EventTypesResponse {
    pub event_types: Vec<EventType>,
}

#[derive(Serialize, Debug)]
pub struct DeleteEventTypeResponse {
    pub success: bool,
    /// True when the event type still had bookings and was disabled
    /// instead of deleted.
    pub deactivated: bool,
}

fn validate_event_type_numbers(
    duration_minutes: i64,
    price_cents: i64,
    buffer_minutes: i64,
) -> Result<(), BookifyError> {
    if duration_minutes <= 0 {
        return Err(BookifyError::ValidationError(
            "duration_minutes must be positive".to_string(),
        ));
    }
    if price_cents < 0 {
        return Err(BookifyError::ValidationError(
            "price_cents must not be negative".to_string(),
        ));
    }
    if buffer_minutes < 0 {
        return Err(BookifyError::ValidationError(
            "buffer_minutes must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Handler creating an event type for the acting host.
#[axum::debug_handler]
pub async fn create_event_type_handler(
    State(state): State<Arc<BookingState>>,
    HostIdentity(host_id): HostIdentity,
    Json(request): Json<CreateEventTypeRequest>,
) -> Result<Json<EventType>, BookifyError> {
    if request.title.trim().is_empty() {
        return Err(BookifyError::ValidationError(
            "title is required".to_string(),
        ));
    }
    let price_cents = request.price_cents.unwrap_or(0);
    let buffer_minutes = request.buffer_minutes.unwrap_or(0);
    validate_event_type_numbers(request.duration_minutes, price_cents, buffer_minutes)?;

    let now = Utc::now();
    let event_type = state
        .repos
        .event_types
        .create(EventType {
            id: Uuid::new_v4().to_string(),
            host_id,
            title: request.title,
            description: request.description,
            duration_minutes: request.duration_minutes,
            price_cents,
            buffer_minutes,
            color: request.color,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(event_type))
}

#[derive(Deserialize, Debug)]
pub struct EventTypesQuery {
    pub host_id: String,
}

/// Handler listing a host's event types (used by the public booking page).
#[axum::debug_handler]
pub async fn list_event_types_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<EventTypesQuery>,
) -> Result<Json<EventTypesResponse>, BookifyError> {
    let event_types = state
        .repos
        .event_types
        .list_by_host(&query.host_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(EventTypesResponse { event_types }))
}

/// Handler editing an event type owned by the acting host.
#[axum::debug_handler]
pub async fn update_event_type_handler(
    State(state): State<Arc<BookingState>>,
    HostIdentity(host_id): HostIdentity,
    Path(event_type_id): Path<String>,
    Json(request): Json<UpdateEventTypeRequest>,
) -> Result<Json<EventType>, BookifyError> {
    let mut event_type = require_owned_event_type(&state, &event_type_id, &host_id).await?;

    if let Some(title) = request.title {
        if title.trim().is_empty() {
            return Err(BookifyError::ValidationError(
                "title must not be empty".to_string(),
            ));
        }
        event_type.title = title;
    }
    if let Some(description) = request.description {
        event_type.description = Some(description);
    }
    if let Some(duration_minutes) = request.duration_minutes {
        event_type.duration_minutes = duration_minutes;
    }
    if let Some(price_cents) = request.price_cents {
        event_type.price_cents = price_cents;
    }
    if let Some(buffer_minutes) = request.buffer_minutes {
        event_type.buffer_minutes = buffer_minutes;
    }
    if let Some(color) = request.color {
        event_type.color = Some(color);
    }
    if let Some(is_active) = request.is_active {
        event_type.is_active = is_active;
    }
    validate_event_type_numbers(
        event_type.duration_minutes,
        event_type.price_cents,
        event_type.buffer_minutes,
    )?;
    event_type.updated_at = Utc::now();

    let event_type = state
        .repos
        .event_types
        .update(event_type)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(event_type))
}

/// Handler deleting an event type owned by the acting host.
///
/// An event type that bookings still reference is disabled rather than
/// deleted, so history keeps resolving.
#[axum::debug_handler]
pub async fn delete_event_type_handler(
    State(state): State<Arc<BookingState>>,
    HostIdentity(host_id): HostIdentity,
    Path(event_type_id): Path<String>,
) -> Result<Json<DeleteEventTypeResponse>, BookifyError> {
    require_owned_event_type(&state, &event_type_id, &host_id).await?;

    let booking_count = state
        .repos
        .bookings
        .count_for_event_type(&event_type_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    if booking_count > 0 {
        state
            .repos
            .event_types
            .deactivate(&event_type_id)
            .await
            .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;
        info!(
            "Event type {} has {} bookings, deactivated instead of deleted",
            event_type_id, booking_count
        );
        return Ok(Json(DeleteEventTypeResponse {
            success: true,
            deactivated: true,
        }));
    }

    state
        .repos
        .event_types
        .delete(&event_type_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(DeleteEventTypeResponse {
        success: true,
        deactivated: false,
    }))
}

async fn require_owned_event_type(
    state: &BookingState,
    event_type_id: &str,
    host_id: &str,
) -> Result<EventType, BookifyError> {
    let event_type = state
        .repos
        .event_types
        .find_by_id(event_type_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?
        .ok_or_else(|| BookifyError::NotFoundError("event type not found".to_string()))?;

    if event_type.host_id != host_id {
        return Err(BookifyError::AuthError(
            "event type belongs to another host".to_string(),
        ));
    }
    Ok(event_type)
}

// --- Weekly schedule management ---

#[derive(Deserialize, Debug)]
pub struct ScheduleWindowInput {
    /// Day of week, 0 = Sunday through 6 = Saturday
    pub day_of_week: i64,
    /// Window start, HH:MM
    pub start_time: String,
    /// Window end, HH:MM
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct ReplaceScheduleRequest {
    pub windows: Vec<ScheduleWindowInput>,
}

#[derive(Serialize, Debug)]
pub struct ScheduleWindow {
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

#[derive(Serialize, Debug)]
pub struct ScheduleResponse {
    pub windows: Vec<ScheduleWindow>,
}

fn schedule_window(window: &AvailabilityWindow) -> ScheduleWindow {
    ScheduleWindow {
        day_of_week: window.day_of_week,
        start_time: window.start_time.format("%H:%M").to_string(),
        end_time: window.end_time.format("%H:%M").to_string(),
        is_available: window.is_available,
    }
}

#[derive(Deserialize, Debug)]
pub struct ScheduleQuery {
    pub host_id: String,
}

/// Handler returning a host's weekly schedule.
#[axum::debug_handler]
pub async fn get_schedule_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, BookifyError> {
    let windows = state
        .repos
        .availability
        .list_for_host(&query.host_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(ScheduleResponse {
        windows: windows.iter().map(schedule_window).collect(),
    }))
}

/// Handler replacing the acting host's weekly schedule.
#[axum::debug_handler]
pub async fn put_schedule_handler(
    State(state): State<Arc<BookingState>>,
    HostIdentity(host_id): HostIdentity,
    Json(request): Json<ReplaceScheduleRequest>,
) -> Result<Json<ScheduleResponse>, BookifyError> {
    let mut windows = Vec::with_capacity(request.windows.len());
    for input in &request.windows {
        if !(0..=6).contains(&input.day_of_week) {
            return Err(BookifyError::ValidationError(
                "day_of_week must be between 0 and 6".to_string(),
            ));
        }
        let start_time = parse_clock_time(&input.start_time, "start_time")?;
        let end_time = parse_clock_time(&input.end_time, "end_time")?;
        if start_time >= end_time {
            return Err(BookifyError::ValidationError(
                "start_time must be before end_time".to_string(),
            ));
        }
        windows.push(AvailabilityWindow {
            id: Uuid::new_v4().to_string(),
            host_id: host_id.clone(),
            day_of_week: input.day_of_week,
            start_time,
            end_time,
            is_available: input.is_available,
        });
    }

    let windows = state
        .repos
        .availability
        .replace_for_host(&host_id, windows)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    Ok(Json(ScheduleResponse {
        windows: windows.iter().map(schedule_window).collect(),
    }))
}

// --- Parsing helpers ---

fn parse_instant(raw: &str, field: &str) -> Result<DateTime<Utc>, BookifyError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BookifyError::ValidationError(format!("Invalid {} format", field)))
}

fn parse_clock_time(raw: &str, field: &str) -> Result<NaiveTime, BookifyError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| BookifyError::ValidationError(format!("Invalid {} format (HH:MM)", field)))
}

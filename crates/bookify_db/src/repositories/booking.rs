//! Booking storage

use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a booking.
///
/// The only modeled transition is confirmed → cancelled, performed by the
/// cancel path. `Completed` exists in the data model but nothing in scope
/// transitions into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DbError> {
        match raw {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(DbError::ValueError(format!(
                "unknown booking status '{}'",
                other
            ))),
        }
    }
}

/// A confirmed or historical booking of one event type with one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub host_id: String,
    pub event_type_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
    /// Filled in after creation when the remote mirror returns a
    /// conference link.
    pub meeting_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for bookings.
pub trait BookingRepository: Send + Sync {
    /// Create the backing table if it does not exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a new booking row.
    fn create(
        &self,
        booking: Booking,
    ) -> impl std::future::Future<Output = Result<Booking, DbError>> + Send;

    /// Fetch a booking by id.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, DbError>> + Send;

    /// Confirmed bookings for a host whose interval intersects [from, to].
    fn list_confirmed_in_range(
        &self,
        host_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    /// A host's bookings, optionally bounded, newest first.
    fn list_for_host(
        &self,
        host_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    /// Set the status of a booking. Returns false when the id is unknown.
    fn update_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Attach the provider's meeting link to a booking.
    fn set_meeting_link(
        &self,
        id: &str,
        meeting_link: &str,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Number of bookings referencing an event type, any status.
    fn count_for_event_type(
        &self,
        event_type_id: &str,
    ) -> impl std::future::Future<Output = Result<i64, DbError>> + Send;
}

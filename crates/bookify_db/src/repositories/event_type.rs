//! Bookable event type storage

use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bookable service definition owned by one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventType {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Appointment length in minutes, always positive.
    pub duration_minutes: i64,
    /// Price in cents, never negative.
    pub price_cents: i64,
    /// Stored but not applied to slot generation; see the availability
    /// logic for the seam where it would take effect.
    pub buffer_minutes: i64,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for event types.
pub trait EventTypeRepository: Send + Sync {
    /// Create the backing table if it does not exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a new event type.
    fn create(
        &self,
        event_type: EventType,
    ) -> impl std::future::Future<Output = Result<EventType, DbError>> + Send;

    /// Fetch an event type by id.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<EventType>, DbError>> + Send;

    /// All event types belonging to a host, newest first.
    fn list_by_host(
        &self,
        host_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<EventType>, DbError>> + Send;

    /// Overwrite the editable fields of an event type.
    fn update(
        &self,
        event_type: EventType,
    ) -> impl std::future::Future<Output = Result<EventType, DbError>> + Send;

    /// Soft-disable an event type instead of deleting it, used when
    /// bookings still reference it.
    fn deactivate(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Hard-delete an event type row.
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}

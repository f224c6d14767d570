//! Calendar event linkage storage
//!
//! A linkage row ties one local booking to its mirrored remote calendar
//! event. It exists only while both sides do: created on successful remote
//! event creation, deleted when the booking is cancelled and the remote
//! delete has been attempted. A failed remote delete can leave it orphaned.

use crate::error::DbError;
use serde::{Deserialize, Serialize};

/// Mapping of one booking to one external calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventLink {
    pub id: String,
    pub host_id: String,
    pub booking_id: String,
    pub google_event_id: String,
    pub calendar_id: String,
}

/// Repository for booking ↔ remote event links.
pub trait CalendarEventLinkRepository: Send + Sync {
    /// Create the backing table if it does not exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a linkage row.
    fn create(
        &self,
        link: CalendarEventLink,
    ) -> impl std::future::Future<Output = Result<CalendarEventLink, DbError>> + Send;

    /// The linkage row for a booking, when one exists.
    fn find_by_booking(
        &self,
        booking_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<CalendarEventLink>, DbError>> + Send;

    /// Remove a linkage row. Returns false when the id is unknown.
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}

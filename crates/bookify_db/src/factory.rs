//! Repository bundle built from a database client
//!
//! One `Repositories` value holds the SQL repository for every entity in the
//! schema, sharing a single pool underneath.

use crate::error::DbError;
use crate::repositories::{
    AvailabilityRepository, BookingRepository, CalendarEventLinkRepository, EventTypeRepository,
    ProfileRepository, SqlAvailabilityRepository, SqlBookingRepository,
    SqlCalendarEventLinkRepository, SqlEventTypeRepository, SqlProfileRepository,
};
use crate::DbClient;
use tracing::info;

/// All SQL repositories over one shared client.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub profiles: SqlProfileRepository,
    pub event_types: SqlEventTypeRepository,
    pub availability: SqlAvailabilityRepository,
    pub bookings: SqlBookingRepository,
    pub calendar_event_links: SqlCalendarEventLinkRepository,
}

impl Repositories {
    /// Build the repository bundle from a database client.
    pub fn new(db_client: DbClient) -> Self {
        Self {
            profiles: SqlProfileRepository::new(db_client.clone()),
            event_types: SqlEventTypeRepository::new(db_client.clone()),
            availability: SqlAvailabilityRepository::new(db_client.clone()),
            bookings: SqlBookingRepository::new(db_client.clone()),
            calendar_event_links: SqlCalendarEventLinkRepository::new(db_client),
        }
    }

    /// Create every backing table that does not exist yet.
    pub async fn init_schemas(&self) -> Result<(), DbError> {
        self.profiles.init_schema().await?;
        self.event_types.init_schema().await?;
        self.availability.init_schema().await?;
        self.bookings.init_schema().await?;
        self.calendar_event_links.init_schema().await?;
        info!("Database schemas initialized");
        Ok(())
    }
}

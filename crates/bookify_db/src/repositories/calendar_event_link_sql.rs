//! SQL implementation of the calendar event link repository

use crate::error::DbError;
use crate::repositories::calendar_event_link::{CalendarEventLink, CalendarEventLinkRepository};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the calendar event link repository
#[derive(Debug, Clone)]
pub struct SqlCalendarEventLinkRepository {
    db_client: DbClient,
}

impl SqlCalendarEventLinkRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn map_row(row: &AnyRow) -> Result<CalendarEventLink, DbError> {
        Ok(CalendarEventLink {
            id: row
                .try_get("id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            host_id: row.try_get("host_id").unwrap_or_default(),
            booking_id: row
                .try_get("booking_id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            google_event_id: row
                .try_get("google_event_id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            calendar_id: row.try_get("calendar_id").unwrap_or_default(),
        })
    }
}

impl CalendarEventLinkRepository for SqlCalendarEventLinkRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing calendar event link schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS calendar_event_links (
                id TEXT PRIMARY KEY,
                host_id TEXT NOT NULL,
                booking_id TEXT NOT NULL,
                google_event_id TEXT NOT NULL,
                calendar_id TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn create(&self, link: CalendarEventLink) -> Result<CalendarEventLink, DbError> {
        debug!(
            "Linking booking {} to remote event {}",
            link.booking_id, link.google_event_id
        );

        let query = r#"
            INSERT INTO calendar_event_links (id, host_id, booking_id, google_event_id, calendar_id)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(&link.id)
            .bind(&link.host_id)
            .bind(&link.booking_id)
            .bind(&link.google_event_id)
            .bind(&link.calendar_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert calendar event link: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(link)
    }

    async fn find_by_booking(
        &self,
        booking_id: &str,
    ) -> Result<Option<CalendarEventLink>, DbError> {
        let query = r#"
            SELECT id, host_id, booking_id, google_event_id, calendar_id
            FROM calendar_event_links
            WHERE booking_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(booking_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find calendar event link: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        debug!("Deleting calendar event link: {}", id);

        let result = sqlx::query("DELETE FROM calendar_event_links WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete calendar event link: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}

//! SQL implementation of the booking repository

use crate::error::DbError;
use crate::repositories::booking::{Booking, BookingRepository, BookingStatus};
use crate::repositories::{format_instant, parse_instant};
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the booking repository
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn map_row(row: &AnyRow) -> Result<Booking, DbError> {
        let start_time: String = row
            .try_get("start_time")
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let end_time: String = row
            .try_get("end_time")
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(Booking {
            id: row
                .try_get("id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            host_id: row
                .try_get("host_id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            event_type_id: row.try_get("event_type_id").unwrap_or_default(),
            client_name: row.try_get("client_name").unwrap_or_default(),
            client_email: row.try_get("client_email").unwrap_or_default(),
            client_phone: row.try_get("client_phone").ok().flatten(),
            start_time: parse_instant(&start_time)?,
            end_time: parse_instant(&end_time)?,
            status: BookingStatus::parse(&status)?,
            payment_status: row.try_get("payment_status").ok().flatten(),
            notes: row.try_get("notes").ok().flatten(),
            meeting_link: row.try_get("meeting_link").ok().flatten(),
            created_at: parse_instant(&created_at)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, host_id, event_type_id, client_name, client_email, client_phone,
           start_time, end_time, status, payment_status, notes, meeting_link,
           created_at
    FROM bookings
"#;

impl BookingRepository for SqlBookingRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                host_id TEXT NOT NULL,
                event_type_id TEXT NOT NULL,
                client_name TEXT NOT NULL,
                client_email TEXT NOT NULL,
                client_phone TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                status TEXT NOT NULL,
                payment_status TEXT,
                notes TEXT,
                meeting_link TEXT,
                created_at TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn create(&self, booking: Booking) -> Result<Booking, DbError> {
        debug!(
            "Creating booking for host {} at {}",
            booking.host_id, booking.start_time
        );

        let query = r#"
            INSERT INTO bookings (
                id, host_id, event_type_id, client_name, client_email,
                client_phone, start_time, end_time, status, payment_status,
                notes, meeting_link, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#;

        sqlx::query(query)
            .bind(&booking.id)
            .bind(&booking.host_id)
            .bind(&booking.event_type_id)
            .bind(&booking.client_name)
            .bind(&booking.client_email)
            .bind(&booking.client_phone)
            .bind(format_instant(booking.start_time))
            .bind(format_instant(booking.end_time))
            .bind(booking.status.as_str())
            .bind(&booking.payment_status)
            .bind(&booking.notes)
            .bind(&booking.meeting_link)
            .bind(format_instant(booking.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert booking: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(booking)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, DbError> {
        let query = format!("{} WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find booking: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_confirmed_in_range(
        &self,
        host_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DbError> {
        // RFC 3339 strings in UTC compare lexicographically in time order,
        // so the half-open interval intersection works directly on TEXT.
        let query = format!(
            "{} WHERE host_id = $1 AND status = 'confirmed' AND start_time < $2 AND end_time > $3",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(host_id)
            .bind(format_instant(to))
            .bind(format_instant(from))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list confirmed bookings: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn list_for_host(
        &self,
        host_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Booking>, DbError> {
        let mut query = format!("{} WHERE host_id = $1", SELECT_COLUMNS);
        if from.is_some() {
            query.push_str(" AND end_time > $2");
        }
        if to.is_some() {
            query.push_str(&format!(
                " AND start_time < ${}",
                if from.is_some() { 3 } else { 2 }
            ));
        }
        query.push_str(" ORDER BY start_time DESC");

        let mut q = sqlx::query(&query).bind(host_id);
        if let Some(from) = from {
            q = q.bind(format_instant(from));
        }
        if let Some(to) = to {
            q = q.bind(format_instant(to));
        }

        let rows = q.fetch_all(self.db_client.pool()).await.map_err(|e| {
            error!("Failed to list bookings for host: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<bool, DbError> {
        debug!("Updating booking {} status to {}", id, status.as_str());

        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update booking status: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_meeting_link(&self, id: &str, meeting_link: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE bookings SET meeting_link = $1 WHERE id = $2")
            .bind(meeting_link)
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to set meeting link: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn count_for_event_type(&self, event_type_id: &str) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM bookings WHERE event_type_id = $1")
            .bind(event_type_id)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to count bookings for event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.try_get("n").map_err(|e| DbError::QueryError(e.to_string()))
    }
}

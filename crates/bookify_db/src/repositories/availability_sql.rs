//! SQL implementation of the availability repository

use crate::error::DbError;
use crate::repositories::availability::{AvailabilityRepository, AvailabilityWindow};
use crate::repositories::{format_clock_time, parse_clock_time};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the availability repository
#[derive(Debug, Clone)]
pub struct SqlAvailabilityRepository {
    db_client: DbClient,
}

impl SqlAvailabilityRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn map_row(row: &AnyRow) -> Result<AvailabilityWindow, DbError> {
        let start_time: String = row
            .try_get("start_time")
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let end_time: String = row
            .try_get("end_time")
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(AvailabilityWindow {
            id: row
                .try_get("id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            host_id: row
                .try_get("host_id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            day_of_week: row.try_get("day_of_week").unwrap_or(0),
            start_time: parse_clock_time(&start_time)?,
            end_time: parse_clock_time(&end_time)?,
            is_available: row.try_get::<i64, _>("is_available").unwrap_or(0) != 0,
        })
    }
}

impl AvailabilityRepository for SqlAvailabilityRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing availability schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS availability (
                id TEXT PRIMARY KEY,
                host_id TEXT NOT NULL,
                day_of_week INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                is_available INTEGER NOT NULL DEFAULT 1
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn list_for_day(
        &self,
        host_id: &str,
        day_of_week: i64,
    ) -> Result<Vec<AvailabilityWindow>, DbError> {
        let query = r#"
            SELECT id, host_id, day_of_week, start_time, end_time, is_available
            FROM availability
            WHERE host_id = $1 AND day_of_week = $2 AND is_available = 1
        "#;

        let rows = sqlx::query(query)
            .bind(host_id)
            .bind(day_of_week)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list availability for day: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn list_for_host(&self, host_id: &str) -> Result<Vec<AvailabilityWindow>, DbError> {
        let query = r#"
            SELECT id, host_id, day_of_week, start_time, end_time, is_available
            FROM availability
            WHERE host_id = $1
            ORDER BY day_of_week, start_time
        "#;

        let rows = sqlx::query(query)
            .bind(host_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list availability for host: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn replace_for_host(
        &self,
        host_id: &str,
        windows: Vec<AvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, DbError> {
        debug!(
            "Replacing weekly schedule for host {} with {} windows",
            host_id,
            windows.len()
        );

        let mut tx = self
            .db_client
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        sqlx::query("DELETE FROM availability WHERE host_id = $1")
            .bind(host_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to clear existing schedule: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        for window in &windows {
            sqlx::query(
                r#"
                INSERT INTO availability (id, host_id, day_of_week, start_time, end_time, is_available)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&window.id)
            .bind(host_id)
            .bind(window.day_of_week)
            .bind(format_clock_time(window.start_time))
            .bind(format_clock_time(window.end_time))
            .bind(window.is_available as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert availability window: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(windows)
    }
}

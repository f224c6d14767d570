//! SQL implementation of the event type repository

use crate::error::DbError;
use crate::repositories::event_type::{EventType, EventTypeRepository};
use crate::repositories::{format_instant, parse_instant};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the event type repository
#[derive(Debug, Clone)]
pub struct SqlEventTypeRepository {
    db_client: DbClient,
}

impl SqlEventTypeRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn map_row(row: &AnyRow) -> Result<EventType, DbError> {
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(EventType {
            id: row
                .try_get("id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            host_id: row
                .try_get("host_id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            title: row.try_get("title").unwrap_or_default(),
            description: row.try_get("description").ok().flatten(),
            duration_minutes: row.try_get("duration_minutes").unwrap_or(0),
            price_cents: row.try_get("price_cents").unwrap_or(0),
            buffer_minutes: row.try_get("buffer_minutes").unwrap_or(0),
            color: row.try_get("color").ok().flatten(),
            is_active: row.try_get::<i64, _>("is_active").unwrap_or(0) != 0,
            created_at: parse_instant(&created_at)?,
            updated_at: parse_instant(&updated_at)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, host_id, title, description, duration_minutes, price_cents,
           buffer_minutes, color, is_active, created_at, updated_at
    FROM event_types
"#;

impl EventTypeRepository for SqlEventTypeRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing event type schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS event_types (
                id TEXT PRIMARY KEY,
                host_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                duration_minutes INTEGER NOT NULL,
                price_cents INTEGER NOT NULL DEFAULT 0,
                buffer_minutes INTEGER NOT NULL DEFAULT 0,
                color TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn create(&self, event_type: EventType) -> Result<EventType, DbError> {
        debug!(
            "Creating event type '{}' for host {}",
            event_type.title, event_type.host_id
        );

        let query = r#"
            INSERT INTO event_types (
                id, host_id, title, description, duration_minutes, price_cents,
                buffer_minutes, color, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#;

        sqlx::query(query)
            .bind(&event_type.id)
            .bind(&event_type.host_id)
            .bind(&event_type.title)
            .bind(&event_type.description)
            .bind(event_type.duration_minutes)
            .bind(event_type.price_cents)
            .bind(event_type.buffer_minutes)
            .bind(&event_type.color)
            .bind(event_type.is_active as i64)
            .bind(format_instant(event_type.created_at))
            .bind(format_instant(event_type.updated_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(event_type)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventType>, DbError> {
        let query = format!("{} WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<EventType>, DbError> {
        let query = format!(
            "{} WHERE host_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(host_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list event types: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn update(&self, event_type: EventType) -> Result<EventType, DbError> {
        debug!("Updating event type: {}", event_type.id);

        let query = r#"
            UPDATE event_types
            SET title = $1, description = $2, duration_minutes = $3,
                price_cents = $4, buffer_minutes = $5, color = $6,
                is_active = $7, updated_at = $8
            WHERE id = $9
        "#;

        sqlx::query(query)
            .bind(&event_type.title)
            .bind(&event_type.description)
            .bind(event_type.duration_minutes)
            .bind(event_type.price_cents)
            .bind(event_type.buffer_minutes)
            .bind(&event_type.color)
            .bind(event_type.is_active as i64)
            .bind(format_instant(event_type.updated_at))
            .bind(&event_type.id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(event_type)
    }

    async fn deactivate(&self, id: &str) -> Result<bool, DbError> {
        debug!("Deactivating event type: {}", id);

        let result = sqlx::query("UPDATE event_types SET is_active = 0 WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to deactivate event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        debug!("Deleting event type: {}", id);

        let result = sqlx::query("DELETE FROM event_types WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete event type: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}

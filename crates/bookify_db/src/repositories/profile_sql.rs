//! SQL implementation of the profile repository

use crate::error::DbError;
use crate::repositories::profile::{Profile, ProfileRepository};
use crate::repositories::{format_instant, parse_instant};
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the profile repository
#[derive(Debug, Clone)]
pub struct SqlProfileRepository {
    db_client: DbClient,
}

impl SqlProfileRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn map_row(row: &AnyRow) -> Result<Profile, DbError> {
        let expires_at: Option<String> = row.try_get("google_token_expires_at").ok().flatten();
        let expires_at = match expires_at {
            Some(raw) => Some(parse_instant(&raw)?),
            None => None,
        };

        Ok(Profile {
            id: row
                .try_get("id")
                .map_err(|e| DbError::QueryError(e.to_string()))?,
            display_name: row.try_get("display_name").unwrap_or_default(),
            company: row.try_get("company").ok().flatten(),
            timezone: row.try_get("timezone").ok().flatten(),
            google_access_token: row.try_get("google_access_token").ok().flatten(),
            google_refresh_token: row.try_get("google_refresh_token").ok().flatten(),
            google_token_expires_at: expires_at,
            google_calendar_connected: row
                .try_get::<i64, _>("google_calendar_connected")
                .unwrap_or(0)
                != 0,
        })
    }
}

impl ProfileRepository for SqlProfileRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing profile schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                company TEXT,
                timezone TEXT,
                google_access_token TEXT,
                google_refresh_token TEXT,
                google_token_expires_at TEXT,
                google_calendar_connected INTEGER NOT NULL DEFAULT 0
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DbError> {
        debug!("Creating profile: {}", profile.id);

        let query = r#"
            INSERT INTO profiles (
                id, display_name, company, timezone,
                google_access_token, google_refresh_token,
                google_token_expires_at, google_calendar_connected
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        sqlx::query(query)
            .bind(&profile.id)
            .bind(&profile.display_name)
            .bind(&profile.company)
            .bind(&profile.timezone)
            .bind(&profile.google_access_token)
            .bind(&profile.google_refresh_token)
            .bind(profile.google_token_expires_at.map(format_instant))
            .bind(profile.google_calendar_connected as i64)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert profile: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(profile)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>, DbError> {
        let query = r#"
            SELECT id, display_name, company, timezone,
                   google_access_token, google_refresh_token,
                   google_token_expires_at, google_calendar_connected
            FROM profiles
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find profile: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn save_tokens(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        debug!("Persisting refreshed tokens for host: {}", host_id);

        let query = r#"
            UPDATE profiles
            SET google_access_token = $1,
                google_refresh_token = $2,
                google_token_expires_at = $3
            WHERE id = $4
        "#;

        sqlx::query(query)
            .bind(access_token)
            .bind(refresh_token)
            .bind(format_instant(expires_at))
            .bind(host_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to persist refreshed tokens: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn connect_integration(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        debug!("Connecting calendar integration for host: {}", host_id);

        let query = r#"
            UPDATE profiles
            SET google_access_token = $1,
                google_refresh_token = $2,
                google_token_expires_at = $3,
                google_calendar_connected = 1
            WHERE id = $4
        "#;

        sqlx::query(query)
            .bind(access_token)
            .bind(refresh_token)
            .bind(format_instant(expires_at))
            .bind(host_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to connect integration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn clear_integration(&self, host_id: &str) -> Result<(), DbError> {
        debug!("Clearing calendar integration for host: {}", host_id);

        // All four fields in one statement, so a reader never observes a
        // half-cleared integration.
        let query = r#"
            UPDATE profiles
            SET google_access_token = NULL,
                google_refresh_token = NULL,
                google_token_expires_at = NULL,
                google_calendar_connected = 0
            WHERE id = $1
        "#;

        sqlx::query(query)
            .bind(host_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to clear integration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }
}

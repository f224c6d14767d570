//! Host profile storage
//!
//! A profile row carries the host's display data plus the nullable Google
//! Calendar integration block. `google_calendar_connected` is true only while
//! an access token is on file; disconnecting clears all four integration
//! fields in one statement.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A host profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub company: Option<String>,
    /// IANA timezone name, e.g. "Europe/Zurich". Falls back to the
    /// deployment default when absent.
    pub timezone: Option<String>,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_token_expires_at: Option<DateTime<Utc>>,
    pub google_calendar_connected: bool,
}

impl Profile {
    /// Whether this host has a usable calendar integration: the connected
    /// flag is set and an access token is present.
    pub fn is_integrated(&self) -> bool {
        self.google_calendar_connected && self.google_access_token.is_some()
    }
}

/// Repository for host profiles.
pub trait ProfileRepository: Send + Sync {
    /// Create the backing table if it does not exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a new profile.
    fn create(
        &self,
        profile: Profile,
    ) -> impl std::future::Future<Output = Result<Profile, DbError>> + Send;

    /// Fetch a profile by host id.
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, DbError>> + Send;

    /// Persist a refreshed token pair for a host. Idempotent upsert keyed by
    /// host id; the connected flag is left untouched.
    fn save_tokens(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Store a fresh integration after an OAuth exchange: all three token
    /// fields plus connected=true, in one statement.
    fn connect_integration(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Clear the integration: access token, refresh token, expiry and the
    /// connected flag are nulled together — never a partial state.
    fn clear_integration(
        &self,
        host_id: &str,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;
}

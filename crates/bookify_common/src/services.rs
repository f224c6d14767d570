// --- File: crates/bookify_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! This module provides trait definitions for the external services used by
//! the application. These traits allow for dependency injection and easier
//! testing by decoupling the application logic from specific implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Access credentials for calendar provider calls.
///
/// Credentials are passed explicitly through each call chain; no client
/// holds ambient mutable auth state between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// The bearer access token.
    pub access_token: String,
    /// The refresh token, when one is on file for the host.
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

/// Token material returned by an OAuth code exchange or token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// The new access token.
    pub access_token: String,
    /// The refresh token; providers may omit it on refresh, in which case
    /// the caller keeps the previously stored one.
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

/// One entry of a host's calendar list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarInfo {
    /// The provider-side calendar id.
    pub id: String,
    /// Display name, when the provider returns one.
    pub summary: Option<String>,
    /// Whether the provider flags this as the primary calendar.
    pub primary: bool,
}

/// A busy period as (start, end) instants.
pub type BusyInterval = (DateTime<Utc>, DateTime<Utc>);

/// The event details sent to the provider when mirroring a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// The start instant of the event.
    pub start_time: DateTime<Utc>,
    /// The end instant of the event.
    pub end_time: DateTime<Utc>,
    /// IANA timezone the event times are presented in on the host's calendar.
    pub time_zone: String,
    /// Email of the sole attendee (the booking client), when known.
    pub attendee_email: Option<String>,
}

/// The provider-side result of creating an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    /// The provider-side id of the created event.
    pub event_id: String,
    /// A conference/meeting link, when the provider attached one.
    pub meeting_link: Option<String>,
}

/// A trait for calendar provider operations.
///
/// This trait defines the operations performed against the remote calendar
/// service: OAuth token lifecycle, calendar listing, free/busy queries and
/// event create/delete.
pub trait CalendarProvider: Send + Sync {
    /// Error type returned by calendar provider operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Exchange an OAuth authorization code for a token set.
    fn exchange_code(&self, code: &str) -> BoxFuture<'_, TokenSet, Self::Error>;

    /// Refresh an access token using the stored refresh token.
    fn refresh_access_token(&self, refresh_token: &str) -> BoxFuture<'_, TokenSet, Self::Error>;

    /// List the calendars visible to the given credentials.
    fn list_calendars(
        &self,
        credentials: &Credentials,
    ) -> BoxFuture<'_, Vec<CalendarInfo>, Self::Error>;

    /// Get busy intervals for a calendar within a time range.
    #[allow(clippy::type_complexity)]
    fn query_free_busy(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, Self::Error>;

    /// Create a calendar event.
    fn create_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event: EventPayload,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error>;

    /// Delete a calendar event. Providers reporting the event as already
    /// gone must be treated as success by implementations.
    fn delete_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error>;
}

/// A factory for creating service instances.
///
/// This trait provides methods for creating instances of the external
/// services. It's used by the application to get access to the services it
/// needs without knowing their concrete types.
pub trait ServiceFactory: Send + Sync {
    /// Get a calendar provider instance, when the integration is configured.
    fn calendar_provider(&self) -> Option<Arc<dyn CalendarProvider<Error = BoxedError>>>;
}

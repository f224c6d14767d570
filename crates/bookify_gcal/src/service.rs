// --- File: crates/bookify_gcal/src/service.rs ---
//! Google Calendar provider implementation.
//!
//! This module implements the [`CalendarProvider`] trait over the Calendar
//! v3 REST API. Calls carry the host's bearer token explicitly; the client
//! itself only holds the OAuth app registration and endpoint URLs.

use bookify_common::services::{
    BusyInterval, CalendarInfo, CalendarProvider, CreatedEvent, Credentials, EventPayload,
    TokenSet,
};
use bookify_common::HTTP_CLIENT;
use bookify_config::GoogleConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::auth::DEFAULT_TOKEN_URL;

/// Default Calendar API base, overridable through config for tests.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Google API error ({status_code}): {message}")]
    ApiError { status_code: u16, message: String },
    #[error("OAuth error: {0}")]
    AuthError(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Google integration is not configured")]
    NotConfigured,
}

/// Google Calendar client holding the OAuth app registration.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    api_base_url: String,
}

impl GoogleCalendarClient {
    /// Build a client from the `[google]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`GcalError::NotConfigured`] when the client secret is absent
    /// (it arrives via env override and is easy to lose in deployment).
    pub fn from_config(config: &GoogleConfig) -> Result<Self, GcalError> {
        let client_secret = config
            .client_secret
            .clone()
            .ok_or(GcalError::NotConfigured)?;

        Ok(Self {
            http: HTTP_CLIENT.clone(),
            client_id: config.client_id.clone(),
            client_secret,
            redirect_uri: config.redirect_uri.clone(),
            token_url: config
                .token_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub(crate) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub(crate) fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn list_calendars_impl(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<CalendarInfo>, GcalError> {
        let url = format!("{}/users/me/calendarList", self.api_base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credentials.access_token)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(extract_api_error(status.as_u16(), &body_text));
        }

        let wire: CalendarListWire = serde_json::from_str(&body_text)
            .map_err(|e| GcalError::ParseError(format!("calendar list: {}", e)))?;

        Ok(wire
            .items
            .into_iter()
            .map(|entry| CalendarInfo {
                id: entry.id,
                summary: entry.summary,
                primary: entry.primary.unwrap_or(false),
            })
            .collect())
    }

    async fn query_free_busy_impl(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, GcalError> {
        let url = format!("{}/freeBusy", self.api_base_url);

        let request = FreeBusyRequestWire {
            time_min: format_instant(start_time),
            time_max: format_instant(end_time),
            items: vec![FreeBusyItemWire {
                id: calendar_id.to_string(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(extract_api_error(status.as_u16(), &body_text));
        }

        let wire: FreeBusyResponseWire = serde_json::from_str(&body_text)
            .map_err(|e| GcalError::ParseError(format!("free/busy response: {}", e)))?;

        let mut busy_periods = Vec::new();
        if let Some(calendar) = wire.calendars.get(calendar_id) {
            for period in &calendar.busy {
                let start = parse_instant(&period.start)?;
                let end = parse_instant(&period.end)?;
                busy_periods.push((start, end));
            }
        }
        // Sort busy periods for easier processing downstream
        busy_periods.sort_by_key(|k| k.0);
        Ok(busy_periods)
    }

    async fn create_event_impl(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event: EventPayload,
    ) -> Result<CreatedEvent, GcalError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base_url,
            urlencoding::encode(calendar_id)
        );

        let attendees = event
            .attendee_email
            .map(|email| vec![AttendeeWire { email }]);

        let request = EventWire {
            summary: event.summary,
            description: event.description,
            start: EventDateTimeWire {
                date_time: format_instant(event.start_time),
                time_zone: event.time_zone.clone(),
            },
            end: EventDateTimeWire {
                date_time: format_instant(event.end_time),
                time_zone: event.time_zone,
            },
            attendees,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(extract_api_error(status.as_u16(), &body_text));
        }

        let wire: CreatedEventWire = serde_json::from_str(&body_text)
            .map_err(|e| GcalError::ParseError(format!("created event: {}", e)))?;

        Ok(CreatedEvent {
            event_id: wire.id,
            meeting_link: wire.hangout_link,
        })
    }

    async fn delete_event_impl(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), GcalError> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.api_base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&credentials.access_token)
            .send()
            .await?;

        let status = response.status();
        // An event that is already gone counts as deleted
        if status.as_u16() == 404 || status.as_u16() == 410 {
            info!("Remote event {} already gone, treating as deleted", event_id);
            return Ok(());
        }

        if !status.is_success() {
            let body_text = response.text().await?;
            return Err(extract_api_error(status.as_u16(), &body_text));
        }

        Ok(())
    }
}

impl CalendarProvider for GoogleCalendarClient {
    type Error = GcalError;

    fn exchange_code(
        &self,
        code: &str,
    ) -> bookify_common::services::BoxFuture<'_, TokenSet, Self::Error> {
        let code = code.to_string();
        Box::pin(async move { self.exchange_code_impl(&code).await })
    }

    fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> bookify_common::services::BoxFuture<'_, TokenSet, Self::Error> {
        let refresh_token = refresh_token.to_string();
        Box::pin(async move { self.refresh_access_token_impl(&refresh_token).await })
    }

    fn list_calendars(
        &self,
        credentials: &Credentials,
    ) -> bookify_common::services::BoxFuture<'_, Vec<CalendarInfo>, Self::Error> {
        let credentials = credentials.clone();
        Box::pin(async move { self.list_calendars_impl(&credentials).await })
    }

    fn query_free_busy(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> bookify_common::services::BoxFuture<'_, Vec<BusyInterval>, Self::Error> {
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            self.query_free_busy_impl(&credentials, &calendar_id, start_time, end_time)
                .await
        })
    }

    fn create_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event: EventPayload,
    ) -> bookify_common::services::BoxFuture<'_, CreatedEvent, Self::Error> {
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            self.create_event_impl(&credentials, &calendar_id, event)
                .await
        })
    }

    fn delete_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event_id: &str,
    ) -> bookify_common::services::BoxFuture<'_, (), Self::Error> {
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move {
            self.delete_event_impl(&credentials, &calendar_id, &event_id)
                .await
        })
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, GcalError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GcalError::ParseError(format!("instant '{}': {}", raw, e)))
}

/// Pull `error.message` out of a Calendar API error body, falling back to
/// the raw text.
fn extract_api_error(status_code: u16, body_text: &str) -> GcalError {
    let message = match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body_text)
            .to_string(),
        Err(_) => body_text.to_string(),
    };
    GcalError::ApiError {
        status_code,
        message,
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct CalendarListWire {
    #[serde(default)]
    items: Vec<CalendarListEntryWire>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntryWire {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    primary: Option<bool>,
}

#[derive(Debug, Serialize)]
struct FreeBusyRequestWire {
    #[serde(rename = "timeMin")]
    time_min: String,
    #[serde(rename = "timeMax")]
    time_max: String,
    items: Vec<FreeBusyItemWire>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItemWire {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponseWire {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendarWire>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendarWire {
    #[serde(default)]
    busy: Vec<BusyPeriodWire>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriodWire {
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
struct EventWire {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    start: EventDateTimeWire,
    end: EventDateTimeWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendees: Option<Vec<AttendeeWire>>,
}

#[derive(Debug, Serialize)]
struct EventDateTimeWire {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Debug, Serialize)]
struct AttendeeWire {
    email: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEventWire {
    id: String,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
}

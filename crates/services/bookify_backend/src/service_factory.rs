// --- File: crates/services/bookify_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Builds the external-service instances the backend needs and exposes them
//! behind the [`ServiceFactory`] trait, so handlers depend on trait objects
//! rather than concrete clients.

use bookify_common::services::{
    BoxFuture, BoxedError, BusyInterval, CalendarInfo, CalendarProvider, CreatedEvent,
    Credentials, EventPayload, ServiceFactory, TokenSet,
};
use bookify_config::AppConfig;
use bookify_gcal::service::GoogleCalendarClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Wrapper erasing the concrete provider error into [`BoxedError`], so the
/// rest of the application can hold one trait-object type.
struct BoxedCalendarProvider {
    inner: Arc<GoogleCalendarClient>,
}

impl CalendarProvider for BoxedCalendarProvider {
    type Error = BoxedError;

    fn exchange_code(&self, code: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        let inner = self.inner.clone();
        let code = code.to_string();
        Box::pin(async move {
            inner
                .exchange_code(&code)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn refresh_access_token(&self, refresh_token: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        let inner = self.inner.clone();
        let refresh_token = refresh_token.to_string();
        Box::pin(async move {
            inner
                .refresh_access_token(&refresh_token)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn list_calendars(
        &self,
        credentials: &Credentials,
    ) -> BoxFuture<'_, Vec<CalendarInfo>, Self::Error> {
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        Box::pin(async move {
            inner
                .list_calendars(&credentials)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn query_free_busy(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, Self::Error> {
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            inner
                .query_free_busy(&credentials, &calendar_id, start_time, end_time)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn create_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event: EventPayload,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            inner
                .create_event(&credentials, &calendar_id, event)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn delete_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move {
            inner
                .delete_event(&credentials, &calendar_id, &event_id)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

/// Service factory for the backend: initializes the Google Calendar client
/// from configuration when the integration is enabled.
pub struct BookifyServiceFactory {
    google_client: Option<Arc<GoogleCalendarClient>>,
    calendar_provider: Option<Arc<dyn CalendarProvider<Error = BoxedError>>>,
}

impl BookifyServiceFactory {
    /// Create a new service factory.
    pub fn new(config: &Arc<AppConfig>) -> Self {
        let google_client = if config.use_gcal {
            match config.google.as_ref() {
                Some(google_config) => match GoogleCalendarClient::from_config(google_config) {
                    Ok(client) => {
                        info!("Google Calendar integration enabled");
                        Some(Arc::new(client))
                    }
                    Err(e) => {
                        warn!("Google Calendar integration not usable: {}", e);
                        None
                    }
                },
                None => {
                    warn!("use_gcal is set but the [google] config section is missing");
                    None
                }
            }
        } else {
            None
        };

        let calendar_provider = google_client.clone().map(|inner| {
            Arc::new(BoxedCalendarProvider { inner }) as Arc<dyn CalendarProvider<Error = BoxedError>>
        });

        Self {
            google_client,
            calendar_provider,
        }
    }

    /// The concrete Google client, needed by the OAuth redirect surface.
    pub fn google_client(&self) -> Option<Arc<GoogleCalendarClient>> {
        self.google_client.clone()
    }
}

impl ServiceFactory for BookifyServiceFactory {
    fn calendar_provider(&self) -> Option<Arc<dyn CalendarProvider<Error = BoxedError>>> {
        self.calendar_provider.clone()
    }
}

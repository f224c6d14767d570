// File: crates/bookify_gcal/src/handlers.rs
//! HTTP surface for the per-host calendar integration: OAuth connect and
//! callback redirects, disconnect, and the connection status probe.

use crate::service::GoogleCalendarClient;
use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use bookify_common::services::CalendarProvider;
use bookify_common::{BookifyError, HostIdentity};
use bookify_config::AppConfig;
use bookify_db::{ProfileRepository, Repositories};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// Define shared state needed by the integration handlers
#[derive(Clone)]
pub struct GcalState {
    pub config: Arc<AppConfig>,
    pub repos: Arc<Repositories>,
    pub client: Arc<GoogleCalendarClient>,
}

#[derive(Deserialize, Debug)]
pub struct ConnectQuery {
    pub host_id: String,
}

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// The host id, round-tripped through the provider.
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StatusQuery {
    pub host_id: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CalendarStatusResponse {
    pub connected: bool,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DisconnectResponse {
    pub success: bool,
}

/// Handler starting the OAuth consent flow for a host.
#[axum::debug_handler]
pub async fn connect_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<Redirect, BookifyError> {
    let profile = state
        .repos
        .profiles
        .find_by_id(&query.host_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    if profile.is_none() {
        return Err(BookifyError::NotFoundError("host not found".to_string()));
    }

    Ok(Redirect::temporary(&state.client.consent_url(&query.host_id)))
}

/// Handler for the OAuth callback redirect.
///
/// Exchanges the authorization code and persists the token material on the
/// host profile; every outcome redirects back to the dashboard with a
/// success or error marker. The code exchange is the one provider call in
/// the system whose failure is surfaced rather than swallowed.
#[axum::debug_handler]
pub async fn callback_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = query.error {
        info!("Google OAuth consent denied or failed: {}", error);
        return Redirect::temporary("/dashboard?error=google_auth_failed");
    }

    let Some(code) = query.code else {
        return Redirect::temporary("/dashboard?error=no_auth_code");
    };
    let Some(host_id) = query.state else {
        return Redirect::temporary("/dashboard?error=missing_state");
    };

    let tokens = match state.client.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Error in Google OAuth code exchange: {}", e);
            return Redirect::temporary("/dashboard?error=auth_callback_failed");
        }
    };

    let result = state
        .repos
        .profiles
        .connect_integration(
            &host_id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            tokens.expires_at,
        )
        .await;

    if let Err(e) = result {
        error!("Error saving Google tokens: {}", e);
        return Redirect::temporary("/dashboard?error=token_save_failed");
    }

    Redirect::temporary("/dashboard?success=google_connected")
}

/// Handler disconnecting the acting host's calendar integration.
///
/// Clears the access token, refresh token, expiry and the connected flag in
/// one statement, so no reader can observe a half-cleared integration.
#[axum::debug_handler]
pub async fn disconnect_handler(
    State(state): State<Arc<GcalState>>,
    HostIdentity(host_id): HostIdentity,
) -> Result<Json<DisconnectResponse>, BookifyError> {
    state
        .repos
        .profiles
        .clear_integration(&host_id)
        .await
        .map_err(|e| {
            error!("Error disconnecting Google Calendar: {}", e);
            BookifyError::DatabaseError(e.to_string())
        })?;

    info!("Disconnected Google Calendar for host {}", host_id);
    Ok(Json(DisconnectResponse { success: true }))
}

/// Handler reporting whether a host has a usable calendar integration.
#[axum::debug_handler]
pub async fn status_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<CalendarStatusResponse>, BookifyError> {
    let profile = state
        .repos
        .profiles
        .find_by_id(&query.host_id)
        .await
        .map_err(|e| BookifyError::DatabaseError(e.to_string()))?;

    let connected = profile.map(|p| p.is_integrated()).unwrap_or(false);

    Ok(Json(CalendarStatusResponse { connected }))
}

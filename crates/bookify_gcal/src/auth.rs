// --- File: crates/bookify_gcal/src/auth.rs ---
//! OAuth token lifecycle against Google's token endpoint.
//!
//! Credentials are per host: each host connects their own calendar through
//! the consent flow, and the resulting token pair lives on the host's
//! profile row, never in process state.

use crate::service::{GcalError, GoogleCalendarClient};
use bookify_common::services::TokenSet;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;

/// Default token endpoint, overridable through config for tests.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested during consent: read calendars/free-busy, write events.
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Lifetime Google grants when the token response omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Wire shape of a Google token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenWireResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<TokenWireResponse> for TokenSet {
    fn from(wire: TokenWireResponse) -> Self {
        let expires_in = wire.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        TokenSet {
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }
}

impl GoogleCalendarClient {
    /// The consent URL a host is redirected to when connecting their
    /// calendar. `state` round-trips the host id through the provider.
    pub fn consent_url(&self, state: &str) -> String {
        format!(
            "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            urlencoding::encode(self.client_id()),
            urlencoding::encode(self.redirect_uri()),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a token set.
    pub(crate) async fn exchange_code_impl(&self, code: &str) -> Result<TokenSet, GcalError> {
        let form = [
            ("client_id", self.client_id()),
            ("client_secret", self.client_secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri()),
        ];

        self.token_request(&form).await
    }

    /// Refresh an access token using a stored refresh token.
    pub(crate) async fn refresh_access_token_impl(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, GcalError> {
        let form = [
            ("client_id", self.client_id()),
            ("client_secret", self.client_secret()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        self.token_request(&form).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, GcalError> {
        let response = self
            .http()
            .post(self.token_url())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            info!("Google token endpoint returned {}: {}", status, body_text);
            return Err(GcalError::AuthError(extract_oauth_error(&body_text)));
        }

        let wire: TokenWireResponse = serde_json::from_str(&body_text)
            .map_err(|e| GcalError::ParseError(format!("token response: {}", e)))?;

        Ok(wire.into())
    }
}

/// Pull the `error_description`/`error` out of an OAuth error body, falling
/// back to the raw text.
fn extract_oauth_error(body_text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json_body) => json_body
            .get("error_description")
            .or_else(|| json_body.get("error"))
            .and_then(|m| m.as_str())
            .unwrap_or(body_text)
            .to_string(),
        Err(_) => body_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_error_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Token has been revoked"}"#;
        assert_eq!(extract_oauth_error(body), "Token has been revoked");
    }

    #[test]
    fn oauth_error_falls_back_to_raw_body() {
        assert_eq!(extract_oauth_error("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn token_response_defaults_expiry() {
        let wire = TokenWireResponse {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_in: None,
        };
        let before = Utc::now();
        let tokens: TokenSet = wire.into();
        let lifetime = tokens.expires_at - before;
        assert!(lifetime >= Duration::seconds(3590) && lifetime <= Duration::seconds(3610));
    }
}

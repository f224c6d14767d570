// --- File: crates/bookify_gcal/src/token.rs ---
//! Token refresh policy.
//!
//! Decides, given a host profile's stored token material, whether the access
//! token must be refreshed before use, performs the refresh, and persists
//! the new pair before handing usable credentials back. Callers treat every
//! failure here as "this host is not integrated for this request" and fall
//! back to local-only behavior; a failed refresh is never fatal to the
//! surrounding operation.

use bookify_common::services::{CalendarProvider, Credentials};
use bookify_db::{DbError, Profile, ProfileRepository};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Why usable credentials could not be produced for a host.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The profile has no usable integration (not connected, token missing,
    /// or expired with no refresh token on file).
    #[error("host has no usable calendar integration")]
    NotIntegrated,
    /// The provider rejected the refresh attempt.
    #[error("token refresh failed: {0}")]
    Refresh(String),
    /// The refreshed pair could not be persisted.
    #[error("failed to persist refreshed tokens: {0}")]
    Persist(#[from] DbError),
}

/// Whether the stored access token must be refreshed before use.
///
/// A missing expiry means the token is used as-is; only a recorded expiry
/// at or before `now` triggers a refresh.
pub fn needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(expiry) if now >= expiry)
}

/// Resolve usable credentials for a host, refreshing and persisting first
/// when the stored access token has expired.
///
/// On refresh the provider may omit a new refresh token; the stored one is
/// kept in that case. The refreshed pair is written back through an
/// idempotent upsert keyed by host id before the credentials are returned,
/// so concurrent refreshes last-write-win without a version check.
pub async fn ensure_fresh_credentials<P, R>(
    provider: &P,
    profiles: &R,
    profile: &Profile,
    now: DateTime<Utc>,
) -> Result<Credentials, CredentialError>
where
    P: CalendarProvider + ?Sized,
    R: ProfileRepository,
{
    if !profile.is_integrated() {
        return Err(CredentialError::NotIntegrated);
    }

    let access_token = profile
        .google_access_token
        .clone()
        .ok_or(CredentialError::NotIntegrated)?;

    if !needs_refresh(profile.google_token_expires_at, now) {
        return Ok(Credentials::new(
            access_token,
            profile.google_refresh_token.clone(),
        ));
    }

    let refresh_token = profile
        .google_refresh_token
        .as_deref()
        .ok_or(CredentialError::NotIntegrated)?;

    debug!("Access token expired for host {}, refreshing", profile.id);
    let tokens = provider
        .refresh_access_token(refresh_token)
        .await
        .map_err(|e| CredentialError::Refresh(e.to_string()))?;

    // Provider may rotate the refresh token; fall back to the stored one
    let new_refresh_token = tokens
        .refresh_token
        .clone()
        .unwrap_or_else(|| refresh_token.to_string());

    profiles
        .save_tokens(
            &profile.id,
            &tokens.access_token,
            &new_refresh_token,
            tokens.expires_at,
        )
        .await?;

    Ok(Credentials::new(
        tokens.access_token,
        Some(new_refresh_token),
    ))
}

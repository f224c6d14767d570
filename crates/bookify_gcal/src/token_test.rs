use crate::service::GcalError;
use crate::token::{ensure_fresh_credentials, needs_refresh, CredentialError};
use bookify_common::services::{
    BoxFuture, BusyInterval, CalendarInfo, CalendarProvider, CreatedEvent, Credentials,
    EventPayload, TokenSet,
};
use bookify_db::{DbError, Profile, ProfileRepository};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

/// Provider double that only answers token refreshes.
struct FakeProvider {
    /// Token set to hand back; `None` makes the refresh fail.
    refresh_response: Option<TokenSet>,
    refresh_calls: Mutex<u32>,
}

impl FakeProvider {
    fn refusing() -> Self {
        Self {
            refresh_response: None,
            refresh_calls: Mutex::new(0),
        }
    }

    fn returning(tokens: TokenSet) -> Self {
        Self {
            refresh_response: Some(tokens),
            refresh_calls: Mutex::new(0),
        }
    }

    fn refresh_count(&self) -> u32 {
        *self.refresh_calls.lock().unwrap()
    }
}

impl CalendarProvider for FakeProvider {
    type Error = GcalError;

    fn exchange_code(&self, _code: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        unimplemented!("not used by the refresh policy")
    }

    fn refresh_access_token(&self, _refresh_token: &str) -> BoxFuture<'_, TokenSet, Self::Error> {
        *self.refresh_calls.lock().unwrap() += 1;
        let response = self.refresh_response.clone();
        Box::pin(async move {
            response.ok_or_else(|| GcalError::AuthError("Token has been revoked".to_string()))
        })
    }

    fn list_calendars(
        &self,
        _credentials: &Credentials,
    ) -> BoxFuture<'_, Vec<CalendarInfo>, Self::Error> {
        unimplemented!("not used by the refresh policy")
    }

    fn query_free_busy(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, Self::Error> {
        unimplemented!("not used by the refresh policy")
    }

    fn create_event(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        _event: EventPayload,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        unimplemented!("not used by the refresh policy")
    }

    fn delete_event(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        _event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        unimplemented!("not used by the refresh policy")
    }
}

/// Profile store double recording persisted token pairs.
#[derive(Default)]
struct FakeProfileStore {
    saved: Mutex<Vec<(String, String, String, DateTime<Utc>)>>,
}

impl ProfileRepository for FakeProfileStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DbError> {
        Ok(profile)
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<Profile>, DbError> {
        Ok(None)
    }

    async fn save_tokens(
        &self,
        host_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.saved.lock().unwrap().push((
            host_id.to_string(),
            access_token.to_string(),
            refresh_token.to_string(),
            expires_at,
        ));
        Ok(())
    }

    async fn connect_integration(
        &self,
        _host_id: &str,
        _access_token: &str,
        _refresh_token: Option<&str>,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        Ok(())
    }

    async fn clear_integration(&self, _host_id: &str) -> Result<(), DbError> {
        Ok(())
    }
}

fn integrated_profile(expires_at: Option<DateTime<Utc>>) -> Profile {
    Profile {
        id: "host-1".to_string(),
        display_name: "Dana Host".to_string(),
        company: None,
        timezone: Some("Europe/Zurich".to_string()),
        google_access_token: Some("stored-access".to_string()),
        google_refresh_token: Some("stored-refresh".to_string()),
        google_token_expires_at: expires_at,
        google_calendar_connected: true,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap()
}

#[test]
fn refresh_needed_only_at_or_after_expiry() {
    assert!(!needs_refresh(None, now()));
    assert!(!needs_refresh(Some(now() + Duration::minutes(5)), now()));
    assert!(needs_refresh(Some(now()), now()));
    assert!(needs_refresh(Some(now() - Duration::minutes(5)), now()));
}

#[tokio::test]
async fn unexpired_token_is_reused_without_refreshing() {
    let provider = FakeProvider::refusing();
    let store = FakeProfileStore::default();
    let profile = integrated_profile(Some(now() + Duration::hours(1)));

    let credentials = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect("credentials");

    assert_eq!(credentials.access_token, "stored-access");
    assert_eq!(provider.refresh_count(), 0);
    assert!(store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted_first() {
    let new_expiry = now() + Duration::hours(1);
    let provider = FakeProvider::returning(TokenSet {
        access_token: "new-access".to_string(),
        refresh_token: Some("new-refresh".to_string()),
        expires_at: new_expiry,
    });
    let store = FakeProfileStore::default();
    let profile = integrated_profile(Some(now() - Duration::minutes(1)));

    let credentials = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect("credentials");

    assert_eq!(credentials.access_token, "new-access");
    assert_eq!(provider.refresh_count(), 1);

    let saved = store.saved.lock().unwrap();
    assert_eq!(
        saved.as_slice(),
        &[(
            "host-1".to_string(),
            "new-access".to_string(),
            "new-refresh".to_string(),
            new_expiry
        )]
    );
}

#[tokio::test]
async fn omitted_refresh_token_falls_back_to_stored_one() {
    let provider = FakeProvider::returning(TokenSet {
        access_token: "new-access".to_string(),
        refresh_token: None,
        expires_at: now() + Duration::hours(1),
    });
    let store = FakeProfileStore::default();
    let profile = integrated_profile(Some(now()));

    let credentials = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect("credentials");

    assert_eq!(credentials.refresh_token.as_deref(), Some("stored-refresh"));
    let saved = store.saved.lock().unwrap();
    assert_eq!(saved[0].2, "stored-refresh");
}

#[tokio::test]
async fn failed_refresh_is_reported_not_fatal() {
    let provider = FakeProvider::refusing();
    let store = FakeProfileStore::default();
    let profile = integrated_profile(Some(now() - Duration::minutes(1)));

    let err = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect_err("refresh must fail");

    assert!(matches!(err, CredentialError::Refresh(_)));
    assert!(store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disconnected_profile_is_not_integrated() {
    let provider = FakeProvider::refusing();
    let store = FakeProfileStore::default();
    let mut profile = integrated_profile(None);
    profile.google_calendar_connected = false;

    let err = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect_err("no integration");
    assert!(matches!(err, CredentialError::NotIntegrated));
}

#[tokio::test]
async fn expired_token_without_refresh_token_is_not_integrated() {
    let provider = FakeProvider::refusing();
    let store = FakeProfileStore::default();
    let mut profile = integrated_profile(Some(now() - Duration::minutes(1)));
    profile.google_refresh_token = None;

    let err = ensure_fresh_credentials(&provider, &store, &profile, now())
        .await
        .expect_err("no refresh token on file");
    assert!(matches!(err, CredentialError::NotIntegrated));
}

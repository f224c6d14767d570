// --- File: crates/bookify_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., DATABASE_URL loaded via BOOKIFY__DATABASE__URL or DATABASE_URL
}

// --- Google OAuth / Calendar Config ---
// Holds the OAuth client registration. The client secret is expected via
// env override: BOOKIFY__GOOGLE__CLIENT_SECRET.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// Override for the OAuth token endpoint; tests point this at a local mock.
    #[serde(default)]
    pub token_url: Option<String>,
    /// Override for the Calendar API base URL; tests point this at a local mock.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

// --- Booking Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BookingConfig {
    /// Step between candidate slot starts, in minutes. Fixed per deployment,
    /// independent of event duration. Defaults to 30.
    #[serde(default)]
    pub slot_step_minutes: Option<i64>,
    /// Fallback IANA timezone for hosts with no timezone on their profile.
    #[serde(default)]
    pub default_time_zone: Option<String>,
}

impl BookingConfig {
    pub fn slot_step_minutes(&self) -> i64 {
        self.slot_step_minutes.unwrap_or(30)
    }

    pub fn default_time_zone(&self) -> &str {
        self.default_time_zone.as_deref().unwrap_or("UTC")
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    /// Kill switch for the Google Calendar integration surface. Hosts still
    /// connect individually; this disables the whole feature at once.
    #[serde(default)]
    pub use_gcal: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub booking: Option<BookingConfig>,
}

impl AppConfig {
    /// Booking defaults, falling back to the built-in values when the
    /// `[booking]` section is absent.
    pub fn booking(&self) -> BookingConfig {
        self.booking.clone().unwrap_or_default()
    }
}

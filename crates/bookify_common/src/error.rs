// --- File: crates/bookify_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Bookify errors.
///
/// This enum provides a common set of error variants that can be used across all crates.
/// Each crate can extend this by implementing From<SpecificError> for BookifyError.
#[derive(Error, Debug)]
pub enum BookifyError {
    /// Missing or malformed request input, rejected before any side effect
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A referenced host, event type or booking does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Unauthenticated request, or acting user is not the owner
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Local store read/write failure, always fatal to the operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Remote calendar provider failure
    #[error("Provider error: {service_name} - {message}")]
    ProviderError {
        service_name: String,
        message: String,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error that doesn't fit into any other category
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BookifyError {
    fn status_code(&self) -> u16 {
        match self {
            BookifyError::ValidationError(_) => 400,
            BookifyError::NotFoundError(_) => 404,
            BookifyError::AuthError(_) => 401,
            BookifyError::DatabaseError(_) => 500,
            BookifyError::ProviderError { .. } => 502,
            BookifyError::ConfigError(_) => 500,
            BookifyError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, BookifyError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, BookifyError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, BookifyError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| BookifyError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, BookifyError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| BookifyError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for BookifyError {
    fn from(err: reqwest::Error) -> Self {
        BookifyError::ProviderError {
            service_name: "http".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BookifyError {
    fn from(err: serde_json::Error) -> Self {
        BookifyError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for BookifyError {
    fn from(err: std::io::Error) -> Self {
        BookifyError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::NotFoundError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::AuthError(message.to_string())
}

pub fn database_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::DatabaseError(message.to_string())
}

pub fn provider_error<T: fmt::Display>(service_name: &str, message: T) -> BookifyError {
    BookifyError::ProviderError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::InternalError(message.to_string())
}

//! Database integration for Bookify
//!
//! This crate provides a database client that is designed to be database
//! agnostic, using SQLx as the underlying database library, plus the
//! repositories for the Bookify schema: profiles, event types, weekly
//! availability, bookings and calendar event links.
//!
//! # Features
//!
//! - Database agnostic design (SQLite by default, PostgreSQL via feature)
//! - Connection pooling
//! - Integration with the Bookify configuration system

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;

// Re-export the client and factory for ease of use
pub use client::DbClient;
pub use error::DbError;
pub use factory::Repositories;

// Re-export the repository traits and models for ease of use
pub use repositories::{
    AvailabilityRepository, AvailabilityWindow, Booking, BookingRepository, BookingStatus,
    CalendarEventLink, CalendarEventLinkRepository, EventType, EventTypeRepository, Profile,
    ProfileRepository, SqlAvailabilityRepository, SqlBookingRepository,
    SqlCalendarEventLinkRepository, SqlEventTypeRepository, SqlProfileRepository,
};

//! Weekly availability window storage

use crate::error::DbError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One recurring weekly window during which a host accepts bookings.
///
/// `start_time`/`end_time` are local clock times, not instants; they are
/// anchored to a concrete date at slot-generation time. Multiple windows per
/// host and day are allowed (split shifts) and nothing prevents them from
/// overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: String,
    pub host_id: String,
    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub day_of_week: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

/// Repository for weekly availability windows.
pub trait AvailabilityRepository: Send + Sync {
    /// Create the backing table if it does not exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Available windows for one host and weekday, in insertion order.
    fn list_for_day(
        &self,
        host_id: &str,
        day_of_week: i64,
    ) -> impl std::future::Future<Output = Result<Vec<AvailabilityWindow>, DbError>> + Send;

    /// Every window of a host's weekly schedule, available or not.
    fn list_for_host(
        &self,
        host_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<AvailabilityWindow>, DbError>> + Send;

    /// Replace a host's whole weekly schedule in one transaction.
    fn replace_for_host(
        &self,
        host_id: &str,
        windows: Vec<AvailabilityWindow>,
    ) -> impl std::future::Future<Output = Result<Vec<AvailabilityWindow>, DbError>> + Send;
}

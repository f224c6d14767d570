// --- File: crates/bookify_booking/src/routes.rs ---

use crate::handlers::{
    cancel_booking_handler, check_availability_handler, create_booking_handler,
    create_event_type_handler, delete_event_type_handler, get_schedule_handler,
    get_slots_handler, list_bookings_handler, list_event_types_handler,
    put_schedule_handler, update_event_type_handler, BookingState,
};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the availability and booking
/// feature. Requires BookingState to be built by the backend service.
pub fn routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/availability/slots", post(get_slots_handler))
        .route("/availability/check", post(check_availability_handler))
        .route("/availability/schedule", get(get_schedule_handler))
        .route("/availability/schedule", put(put_schedule_handler))
        .route("/bookings", get(list_bookings_handler))
        .route("/bookings/create", post(create_booking_handler))
        .route("/bookings/cancel", post(cancel_booking_handler))
        .route("/event-types", post(create_event_type_handler))
        .route("/event-types", get(list_event_types_handler))
        .route("/event-types/{event_type_id}", patch(update_event_type_handler))
        .route("/event-types/{event_type_id}", delete(delete_event_type_handler))
        .with_state(state)
}

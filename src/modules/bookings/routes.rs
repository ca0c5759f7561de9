use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;

use super::handlers::{
    create_booking, get_booking, list_bookings, mark_booking_read, patch_booking_status,
    review_booking,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/{id}", get(get_booking))
        .route("/{id}/status", patch(patch_booking_status))
        .route("/{id}/read", post(mark_booking_read))
        .route("/{id}/review", post(review_booking))
}

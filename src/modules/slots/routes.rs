use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;

use super::handlers::{availability, list_slots, reconcile_slots, slot_edit_grid};

pub fn slot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_slots))
        .route("/reconcile", post(reconcile_slots))
        .route("/availability", get(availability))
        .route("/edit-grid", get(slot_edit_grid))
}

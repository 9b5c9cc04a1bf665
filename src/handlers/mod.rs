pub mod admin;
pub mod bookings;
pub mod clients;
pub mod loyalty;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};

use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/services", get(bookings::list_services))
        .route("/api/slots", get(bookings::get_slots))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/clients", post(clients::register_client))
        .route("/api/clients/:user_id", get(clients::get_client))
        .route(
            "/api/clients/:user_id/bookings",
            get(bookings::list_client_bookings),
        )
        .route(
            "/api/clients/:user_id/bookings/upcoming",
            get(bookings::upcoming_client_bookings),
        )
        .route(
            "/api/clients/:user_id/bookings/:booking_id/cancel",
            post(bookings::cancel_client_booking),
        )
        .route(
            "/api/clients/:user_id/bookings/:booking_id/rating",
            post(bookings::rate_booking),
        )
        .route("/api/clients/:user_id/ratings", get(bookings::list_ratings))
        .route("/api/clients/:user_id/loyalty", get(loyalty::get_loyalty))
        .route("/api/clients/:user_id/draw", post(loyalty::enter_draw))
        .route("/api/clients/:user_id/prizes", get(loyalty::list_prizes))
        .route("/api/admin/dashboard", get(admin::get_dashboard))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(admin::update_booking_status),
        )
        .route("/api/admin/clients/top", get(admin::get_top_clients))
        .route(
            "/api/admin/clients/:user_id/points",
            post(admin::adjust_points),
        )
        .route("/api/admin/prizes/:id/used", post(admin::mark_prize_used))
        .route("/api/admin/automation", get(admin::automation_status))
        .with_state(state)
}

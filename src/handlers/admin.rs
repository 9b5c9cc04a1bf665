use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::collections;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PrizeRecord, UserStats};
use crate::services::automation::{self, AutomationEvent, NotificationOutcome};
use crate::services::loyalty;
use crate::services::reports::{self, DashboardStats, TopClient};
use crate::services::scheduling;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (bookings, total_clients) = {
        let db = state.db();
        let bookings = collections::bookings(&db)?.items;
        let total_clients = collections::clients(&db)?.items.len();
        (bookings, total_clients)
    };

    Ok(Json(reports::dashboard(
        &bookings,
        total_clients,
        state.clock.today(),
    )))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Invalid(format!("unknown status: {s}")))?,
        ),
    };
    let limit = query.limit.unwrap_or(50).min(500);

    let bookings = {
        let db = state.db();
        collections::bookings(&db)?.items
    };

    Ok(Json(reports::recent_bookings(&bookings, status, limit)))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::Invalid(format!("unknown status: {}", body.status)))?;

    let booking = {
        let mut db = state.db();
        scheduling::update_status(&mut db, state.clock.as_ref(), &id, status)?
    };
    Ok(Json(booking))
}

// GET /api/admin/clients/top
#[derive(Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

pub async fn get_top_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<TopClient>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (bookings, clients) = {
        let db = state.db();
        (
            collections::bookings(&db)?.items,
            collections::clients(&db)?.items,
        )
    };

    Ok(Json(reports::top_clients(
        &bookings,
        &clients,
        query.limit.unwrap_or(5),
    )))
}

// POST /api/admin/clients/:user_id/points
#[derive(Deserialize)]
pub struct PointsAdjustment {
    pub delta: i64,
}

pub async fn adjust_points(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(body): Json<PointsAdjustment>,
) -> Result<Json<UserStats>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let mut db = state.db();
        loyalty::adjust_points(&mut db, &user_id, body.delta)?
    };
    Ok(Json(stats))
}

// POST /api/admin/prizes/:id/used
pub async fn mark_prize_used(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PrizeRecord>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let prize = {
        let mut db = state.db();
        loyalty::mark_prize_used(&mut db, &id)?
    };
    tracing::info!(prize_id = %prize.id, user_id = %prize.user_id, "prize redeemed");
    Ok(Json(prize))
}

// GET /api/admin/automation
#[derive(Serialize)]
pub struct AutomationStatus {
    configured: bool,
    #[serde(flatten)]
    outcome: NotificationOutcome,
}

pub async fn automation_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AutomationStatus>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let outcome = automation::dispatch(
        state.gateway.as_ref(),
        &AutomationEvent::HealthCheck,
        state.config.automation_timeout(),
    )
    .await;

    Ok(Json(AutomationStatus {
        configured: !state.gateway.is_local(),
        outcome,
    }))
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::collections;
use crate::errors::AppError;
use crate::models::schedule;
use crate::models::{Booking, Rating, Service, SlotAvailability};
use crate::services::ratings::{self, RatingReceipt};
use crate::services::scheduling::{self, BookingReceipt, BookingRequest, CancellationReceipt};
use crate::state::AppState;

const UPCOMING_LIMIT: usize = 3;

// GET /api/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<Service>> {
    Json(state.catalog.services.clone())
}

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: NaiveDate,
    open: bool,
    slots: Vec<SlotAvailability>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let bookings = {
        let db = state.db();
        collections::bookings(&db)?.items
    };

    Ok(Json(SlotsResponse {
        date: query.date,
        open: schedule::is_open_day(query.date),
        slots: scheduling::available_slots(&bookings, query.date),
    }))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = scheduling::book(&state, body).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/clients/:user_id/bookings
pub async fn list_client_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = {
        let db = state.db();
        collections::bookings(&db)?.items
    };
    Ok(Json(scheduling::bookings_for_user(&bookings, &user_id)))
}

// GET /api/clients/:user_id/bookings/upcoming
pub async fn upcoming_client_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = {
        let db = state.db();
        collections::bookings(&db)?.items
    };
    let now = state.clock.now();
    Ok(Json(scheduling::upcoming_for_user(
        &bookings,
        &user_id,
        now,
        UPCOMING_LIMIT,
    )))
}

// POST /api/clients/:user_id/bookings/:booking_id/cancel
pub async fn cancel_client_booking(
    State(state): State<Arc<AppState>>,
    Path((user_id, booking_id)): Path<(String, String)>,
) -> Result<Json<CancellationReceipt>, AppError> {
    let receipt = scheduling::cancel(&state, &user_id, &booking_id).await?;
    Ok(Json(receipt))
}

// POST /api/clients/:user_id/bookings/:booking_id/rating
#[derive(Deserialize)]
pub struct RatingBody {
    pub score: u8,
    pub comment: Option<String>,
}

pub async fn rate_booking(
    State(state): State<Arc<AppState>>,
    Path((user_id, booking_id)): Path<(String, String)>,
    Json(body): Json<RatingBody>,
) -> Result<Json<RatingReceipt>, AppError> {
    let receipt = {
        let mut db = state.db();
        ratings::submit_rating(
            &mut db,
            state.clock.as_ref(),
            &user_id,
            &booking_id,
            body.score,
            body.comment,
        )?
    };
    Ok(Json(receipt))
}

// GET /api/clients/:user_id/ratings
pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Rating>>, AppError> {
    let ratings = {
        let db = state.db();
        ratings::ratings_for_user(&db, &user_id)?
    };
    Ok(Json(ratings))
}

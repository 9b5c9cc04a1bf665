use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::PrizeRecord;
use crate::services::loyalty::{self, DrawReceipt, LoyaltyStatus};
use crate::state::AppState;

// GET /api/clients/:user_id/loyalty
pub async fn get_loyalty(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<LoyaltyStatus>, AppError> {
    let now = state.clock.now();
    let status = {
        let db = state.db();
        loyalty::loyalty_status(&db, now, &user_id)?
    };
    Ok(Json(status))
}

// POST /api/clients/:user_id/draw
pub async fn enter_draw(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DrawReceipt>, AppError> {
    let receipt = loyalty::draw(&state, &user_id).await?;
    Ok(Json(receipt))
}

// GET /api/clients/:user_id/prizes
pub async fn list_prizes(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PrizeRecord>>, AppError> {
    let prizes = {
        let db = state.db();
        loyalty::prizes_for_user(&db, &user_id)?
    };
    Ok(Json(prizes))
}

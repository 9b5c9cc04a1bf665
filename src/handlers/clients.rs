use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::collections;
use crate::errors::AppError;
use crate::models::Client;
use crate::state::AppState;

// POST /api/clients
#[derive(Deserialize)]
pub struct RegisterClientRequest {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

pub async fn register_client(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Invalid("name is required".to_string()));
    }

    let client = Client {
        id: body
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: body.name.trim().to_string(),
        email: body.email,
        phone: body.phone,
        birth_date: body.birth_date,
        created_at: state.clock.now(),
    };

    let stored = {
        let mut db = state.db();
        collections::upsert_client(&mut db, client.clone())?;
        collections::find_client(&db, &client.id)?.unwrap_or(client)
    };

    tracing::info!(user_id = %stored.id, "client registered");
    Ok((StatusCode::CREATED, Json(stored)))
}

// GET /api/clients/:user_id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Client>, AppError> {
    let client = {
        let db = state.db();
        collections::find_client(&db, &user_id)?
    };
    client
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("client {user_id}")))
}

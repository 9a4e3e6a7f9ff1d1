use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::response::{validated, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{Hall, NewHall};
use crate::services::halls;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/halls", get(list_halls).post(create_hall))
        .route(
            "/halls/{id}",
            get(get_hall).put(update_hall).delete(delete_hall),
        )
        .route("/halls/{id}/seats", get(hall_seats))
}

#[derive(Debug, Deserialize, Validate)]
struct HallRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 1))]
    pub seat_count: i32,
    #[validate(range(min = 1))]
    pub rows: i32,
    #[validate(range(min = 1))]
    pub cols: i32,
}

/* ---------- HALLS ---------- */

// GET /api/halls
async fn list_halls(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(halls::list_halls(state.store.as_ref()).await?))
}

// GET /api/halls/{id}
async fn get_hall(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(halls::get_hall(state.store.as_ref(), id).await?))
}

// GET /api/halls/{id}/seats
async fn hall_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(halls::hall_seats(state.store.as_ref(), id).await?))
}

// POST /api/halls
async fn create_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<HallRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let hall = halls::create_hall(
        state.store.as_ref(),
        NewHall {
            name: req.name,
            seat_count: req.seat_count,
            rows: req.rows,
            cols: req.cols,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(hall)))
}

// PUT /api/halls/{id}
async fn update_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<HallRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let hall = Hall {
        id,
        name: req.name,
        seat_count: req.seat_count,
        rows: req.rows,
        cols: req.cols,
    };
    halls::update_hall(state.store.as_ref(), hall.clone()).await?;
    Ok(Json(hall))
}

// DELETE /api/halls/{id}
async fn delete_hall(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    halls::delete_hall(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::response::{validated, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{NewShowtime, ShowtimeChanges};
use crate::services::{capacity, reservations, showtimes};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes", get(list_showtimes).post(create_showtime))
        .route(
            "/showtimes/{id}",
            get(get_showtime).put(update_showtime).delete(delete_showtime),
        )
        .route("/showtimes/{id}/availability", get(availability))
        .route("/showtimes/{id}/seats", get(seat_map))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateShowtimeRequest {
    #[validate(range(min = 1))]
    pub movie_id: i64,
    #[validate(range(min = 1))]
    pub hall_id: i64,
    pub start_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateShowtimeRequest {
    pub start_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub hall_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    pub showtime_id: i64,
    pub remaining_tickets: i64,
}

/* ---------- SHOWTIMES ---------- */

// GET /api/showtimes
async fn list_showtimes(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(showtimes::list_showtimes(state.store.as_ref()).await?))
}

// GET /api/showtimes/{id}
async fn get_showtime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(showtimes::get_showtime(state.store.as_ref(), id).await?))
}

// POST /api/showtimes
async fn create_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<CreateShowtimeRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let showtime = showtimes::create_showtime(
        state.store.as_ref(),
        NewShowtime {
            movie_id: req.movie_id,
            hall_id: req.hall_id,
            start_at: req.start_at,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(showtime)))
}

// PUT /api/showtimes/{id}
async fn update_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateShowtimeRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let showtime = showtimes::update_showtime(
        state.store.as_ref(),
        id,
        ShowtimeChanges {
            start_at: req.start_at,
            hall_id: req.hall_id,
        },
    )
    .await?;
    Ok(Json(showtime))
}

// DELETE /api/showtimes/{id}
async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    showtimes::delete_showtime(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- SEATS ---------- */

// GET /api/showtimes/{id}/availability
async fn availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let remaining_tickets = capacity::get_remaining_tickets(state.store.as_ref(), id).await?;
    Ok(Json(AvailabilityResponse {
        showtime_id: id,
        remaining_tickets,
    }))
}

// GET /api/showtimes/{id}/seats
async fn seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(reservations::showtime_seat_map(state.store.as_ref(), id).await?))
}

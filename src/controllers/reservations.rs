use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::response::{validated, ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::services::reservations;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/reservations/me", get(my_reservations))
        .route("/reservations/{id}", delete(cancel_reservation))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateReservationRequest {
    #[validate(range(min = 1))]
    pub showtime_id: i64,
    #[validate(range(min = 1))]
    pub seat_id: i64,
}

/* ---------- RESERVATIONS ---------- */

// POST /api/reservations
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateReservationRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let reservation =
        reservations::reserve(state.store.as_ref(), user.user_id, req.showtime_id, req.seat_id)
            .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

// GET /api/reservations/me
async fn my_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        reservations::reservations_for_user(state.store.as_ref(), user.user_id).await?,
    ))
}

// DELETE /api/reservations/{id}
async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let reservation = reservations::reservation_by_id(state.store.as_ref(), id).await?;
    if reservation.user_id != user.user_id {
        tracing::warn!(
            "user {} tried to cancel reservation {} owned by {}",
            user.user_id,
            id,
            reservation.user_id
        );
        return Err(ApiError::forbidden("reservation belongs to another user"));
    }
    reservations::cancel_reservation(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

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
use crate::models::{Movie, NewMovie};
use crate::services::movies;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route("/movies/{id}/showtimes", get(movie_showtimes))
}

#[derive(Debug, Deserialize, Validate)]
struct MovieRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(movies::list_movies(state.store.as_ref()).await?))
}

// GET /api/movies/{id}
async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(movies::get_movie(state.store.as_ref(), id).await?))
}

// GET /api/movies/{id}/showtimes
async fn movie_showtimes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(movies::movie_showtimes(state.store.as_ref(), id).await?))
}

// POST /api/movies
async fn create_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<MovieRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let movie = movies::create_movie(
        state.store.as_ref(),
        NewMovie {
            title: req.title,
            description: req.description,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

// PUT /api/movies/{id}
async fn update_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<MovieRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let movie = Movie {
        id,
        title: req.title,
        description: req.description,
    };
    movies::update_movie(state.store.as_ref(), movie.clone()).await?;
    Ok(Json(movie))
}

// DELETE /api/movies/{id}
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    movies::delete_movie(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

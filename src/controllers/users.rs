use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::response::{validated, ApiError, ApiResult};
use crate::models::UserRole;
use crate::security::{self, SESSION_COOKIE};
use crate::services::{captcha, users};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 6, max = 72))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    pub key: Option<String>,
    pub admin_role_password: Option<String>,
}

fn default_role() -> UserRole {
    UserRole::User
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: UserRole,
}

/* ---------- helpers ---------- */

/// Register and login each spend one passed challenge, unless the gate is switched off.
async fn require_challenge(state: &AppState, key: Option<&str>) -> ApiResult<()> {
    if !state.config.features.enable_captcha {
        return Ok(());
    }
    let key = key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::unauthorized("captcha not passed"))?;
    captcha::consume_pass(state.challenges.as_ref(), key).await?;
    Ok(())
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/* ---------- USERS ---------- */

// POST /api/users/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    require_challenge(&state, req.key.as_deref()).await?;

    let user = users::register(
        state.store.as_ref(),
        users::Registration {
            name: req.username,
            password: req.password,
            role: req.role,
            admin_password: req.admin_role_password,
        },
        &state.config.auth,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.name,
            role: user.role,
        }),
    ))
}

// POST /api/users/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    require_challenge(&state, req.key.as_deref()).await?;

    let user = users::authenticate(state.store.as_ref(), &req.username, &req.password).await?;
    let token = security::issue_token(&user, &state.config.jwt).map_err(|e| {
        tracing::error!("token issue failed for user {}: {:?}", user.id, e);
        ApiError::internal()
    })?;

    tracing::info!("user {} logged in", user.id);
    let cookie = session_cookie(
        &token,
        state.config.jwt.token_ttl().num_seconds(),
        state.config.app.is_production(),
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            username: user.name,
            role: user.role,
        }),
    ))
}

// POST /api/users/logout
async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie("", 0, state.config.app.is_production()))],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_secure_only_when_asked() {
        let plain = session_cookie("tok", 3600, false);
        assert!(plain.starts_with("jwt=tok; "));
        assert!(plain.contains("Max-Age=3600"));
        assert!(!plain.contains("Secure"));

        assert!(session_cookie("tok", 3600, true).ends_with("; Secure"));
    }
}

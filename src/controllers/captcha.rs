use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::response::{validated, ApiResult};
use crate::services::captcha;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/captcha", get(issue_challenge).post(verify_challenge))
}

#[derive(Debug, Serialize)]
struct ChallengeResponse {
    pub key: String,
    pub question: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize, Validate)]
struct VerifyRequest {
    #[validate(length(min = 1))]
    pub key: String,
    #[validate(length(min = 1, max = 16))]
    pub answer: String,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    pub success: bool,
}

// GET /api/captcha
async fn issue_challenge(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let challenge = captcha::issue(state.challenges.as_ref()).await?;
    Ok(Json(ChallengeResponse {
        key: challenge.key,
        question: challenge.question,
        expires_in: captcha::CHALLENGE_TTL_SECS,
    }))
}

// POST /api/captcha
async fn verify_challenge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let success = captcha::verify(state.challenges.as_ref(), &req.key, &req.answer).await?;
    Ok(Json(VerifyResponse { success }))
}

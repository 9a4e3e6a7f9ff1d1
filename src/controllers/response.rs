use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::error::ServiceError;

/// Error body every handler answers with: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "internal server error",
        )
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::NotFound(_) | ServiceError::ShowtimeNotExist => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            ServiceError::AlreadyExists(resource) => {
                let code = match resource {
                    "hall" => "HALL_EXISTS",
                    "movie" => "MOVIE_EXISTS",
                    "user" => "USER_EXISTS",
                    _ => "ALREADY_EXISTS",
                };
                Self::new(StatusCode::CONFLICT, code, message)
            }
            ServiceError::RelatedResourceExists(_) => {
                Self::new(StatusCode::CONFLICT, "RELATED_RESOURCE_EXISTS", message)
            }
            ServiceError::NoTicketsAvailable => Self::new(StatusCode::CONFLICT, "NO_TICKETS", message),
            ServiceError::AlreadyReserved => {
                Self::new(StatusCode::CONFLICT, "ALREADY_RESERVED", message)
            }
            ServiceError::SeatTaken => Self::new(StatusCode::CONFLICT, "SEAT_TAKEN", message),
            ServiceError::ShowtimeSeatStatusNotChange => {
                Self::new(StatusCode::CONFLICT, "INVALID_STATE", message)
            }
            ServiceError::ShowtimeSeatNotExist | ServiceError::InvalidInput(_) => {
                Self::bad_request(message)
            }
            ServiceError::InvalidCredential | ServiceError::Unauthorized(_) => {
                Self::unauthorized(message)
            }
            ServiceError::Store(_)
            | ServiceError::Cache(_)
            | ServiceError::Hashing(_)
            | ServiceError::Blocking(_) => {
                tracing::error!("request failed: {:?}", err);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

/// Runs the request's `validator` rules and turns a failure into a 400.
pub fn validated<T: Validate>(req: T) -> ApiResult<T> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_keep_distinct_codes() {
        let taken = ApiError::from(ServiceError::SeatTaken);
        let reserved = ApiError::from(ServiceError::AlreadyReserved);
        assert_eq!(taken.status, StatusCode::CONFLICT);
        assert_eq!(taken.code, "SEAT_TAKEN");
        assert_eq!(reserved.code, "ALREADY_RESERVED");
        assert_eq!(ApiError::from(ServiceError::AlreadyExists("hall")).code, "HALL_EXISTS");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(ServiceError::Store(crate::store::StoreError::Database(
            sqlx::Error::PoolTimedOut,
        )));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid location format: {0}")]
    LocationFormat(String),

    #[error("No location available for edition {0}")]
    NoLocation(uuid::Uuid),

    #[error("Weather already fetched for edition {0}; use force=true to fetch again")]
    AlreadyFetched(uuid::Uuid),

    #[error("Edition {0} has not taken place yet; historical weather is unavailable")]
    FutureDate(uuid::Uuid),

    #[error("Weather data unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Weather fetch failed: {0}")]
    WeatherFetch(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::WeatherUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::NoLocation(_)
            | AppError::AlreadyFetched(_)
            | AppError::FutureDate(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::LocationFormat(_)
            | AppError::WeatherFetch(_)
            | AppError::InternalError(_)
            | AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                "Internal database error".to_string()
            }
            AppError::LocationFormat(_) | AppError::WeatherFetch(_) | AppError::InternalError(_) => {
                tracing::error!("{}", self);
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single upstream GET.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned status {status}")]
    Status { status: u16 },
}

#[derive(Debug, Error)]
pub enum MovieError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("JSON parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Movie not found")]
    NotFound,
}

pub type MovieResult<T> = std::result::Result<T, MovieError>;

/// Error envelope returned by every handler as `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Route not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    pub fn movie_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Movie not found")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<MovieError> for ApiError {
    fn from(err: MovieError) -> Self {
        match err {
            MovieError::NotFound => Self::movie_not_found(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_envelope() {
        let api: ApiError = MovieError::NotFound.into();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.message(), "Movie not found");
    }

    #[test]
    fn transport_failure_maps_to_500_with_message() {
        let api: ApiError = MovieError::from(TransportError::Status { status: 503 }).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message(), "upstream returned status 503");
    }
}

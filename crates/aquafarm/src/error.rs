use crate::config::ConfigError;
use crate::farm::FarmError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Process-level failure surfaced by the binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("farm error: {0}")]
    Farm(#[from] FarmError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Farm(FarmError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Farm(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farm::RepositoryError;
    use std::error::Error as _;

    #[test]
    fn config_failures_keep_their_source() {
        let err = AppError::from(ConfigError::InvalidPort);
        assert_eq!(
            err.to_string(),
            "configuration error: APP_PORT must be a valid u16"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn farm_failures_map_to_client_or_server_status() {
        let invalid = AppError::from(FarmError::Validation("fish_count is required".to_string()));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let outage = AppError::from(FarmError::Repository(RepositoryError::Unavailable(
            "store offline".to_string(),
        )));
        assert_eq!(
            outage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

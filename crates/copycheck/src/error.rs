use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::analysis::AnalysisError;
use crate::workflows::delivery::DeliveryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Analysis(AnalysisError),
    Delivery(DeliveryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Analysis(err) => match err {
                AnalysisError::EmptyInput
                | AnalysisError::ContentExtractionFailed { .. }
                | AnalysisError::InvalidInput => StatusCode::BAD_REQUEST,
                AnalysisError::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::ModelCallFailed(_) | AnalysisError::EmptyModelResponse => {
                    StatusCode::BAD_GATEWAY
                }
            },
            AppError::Delivery(err) => match err {
                DeliveryError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
                DeliveryError::Mail(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Analysis(err) => err.user_message().to_string(),
            AppError::Delivery(err) => err.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Analysis(err) => write!(f, "analysis error: {}", err),
            AppError::Delivery(err) => write!(f, "delivery error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Analysis(err) => Some(err),
            AppError::Delivery(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.user_message() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AnalysisError> for AppError {
    fn from(value: AnalysisError) -> Self {
        Self::Analysis(value)
    }
}

impl From<DeliveryError> for AppError {
    fn from(value: DeliveryError) -> Self {
        Self::Delivery(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::analysis::ModelError;

    #[test]
    fn analysis_failures_map_to_distinct_statuses() {
        let cases = [
            (AnalysisError::EmptyInput, StatusCode::BAD_REQUEST),
            (
                AnalysisError::ContentExtractionFailed {
                    url: "https://example.com".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (AnalysisError::ExtractionFailed, StatusCode::UNPROCESSABLE_ENTITY),
            (
                AnalysisError::ModelCallFailed(ModelError::RateLimited),
                StatusCode::BAD_GATEWAY,
            ),
            (AnalysisError::EmptyModelResponse, StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn user_message_hides_internal_detail() {
        let err = AppError::from(AnalysisError::ModelCallFailed(ModelError::Status {
            status: 400,
            body: "secret upstream detail".to_string(),
        }));
        assert!(!err.user_message().contains("secret upstream detail"));
        assert!(err.to_string().contains("status 400"));
    }
}

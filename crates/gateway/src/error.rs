//! Error types for the gateway layer

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use depot_hub::HubError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unprocessable request: {0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<HubError> for GatewayError {
    fn from(error: HubError) -> Self {
        match error {
            HubError::RoomNotFound { .. } => GatewayError::NotFound("room doesn't exist".to_string()),
            HubError::RoomAlreadyExists { id } => {
                GatewayError::Conflict(format!("room {id} already exists"))
            }
            HubError::Closed => GatewayError::ServiceUnavailable,
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                GatewayError::UnprocessableEntity(rejection.body_text())
            }
            _ => GatewayError::InvalidRequest(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use fleet_domain::DomainError;

/// Standard API error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            code: 400,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DeviceNotFound(_) => ApiError {
                code: 404,
                message: err.to_string(),
            },
            DomainError::DeviceInUse(_)
            | DomainError::InvalidDeviceId(_)
            | DomainError::InvalidDeviceName(_)
            | DomainError::InvalidDeviceBrand(_)
            | DomainError::CreationTimeImmutable(_)
            | DomainError::InvalidPageRequest(_) => ApiError {
                code: 400,
                message: err.to_string(),
            },
            DomainError::ConcurrentModification(_) => ApiError {
                code: 409,
                message: err.to_string(),
            },
            DomainError::RepositoryError(source) => {
                // Full detail stays in the logs; external callers get a
                // generic failure.
                error!(error = %source, "Repository failure");
                ApiError {
                    code: 500,
                    message: "Internal server error".to_string(),
                }
            }
        }
    }
}

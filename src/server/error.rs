use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::engine::ErrorKind;
use crate::flavors::FlavorError;
use crate::service::{ErrorResponse, InputError, ServiceError};

/// Handler error, rendered as an [`ErrorResponse`]
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Service(ServiceError::Input(InputError::Malformed(
            rejection.body_text(),
        )))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let ApiError::Service(err) = self else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match err {
            ServiceError::Input(_) | ServiceError::GitOpsDisabled => StatusCode::BAD_REQUEST,
            ServiceError::Generation(e) => match e.kind() {
                ErrorKind::DomainValidation => StatusCode::BAD_REQUEST,
                ErrorKind::DataAvailability | ErrorKind::AssemblyInvariant => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServiceError::Flavor(FlavorError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Flavor(_) | ServiceError::Registry(_) | ServiceError::GitOps(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn details(&self) -> Option<Value> {
        let ApiError::Service(err) = self else {
            return None;
        };
        match err {
            ServiceError::Input(e) => Some(e.details()),
            ServiceError::Generation(e) => {
                let mut details = e.details();
                if let Some(map) = details.as_object_mut() {
                    map.insert("kind".to_string(), json!(e.kind()));
                }
                Some(details)
            }
            ServiceError::Flavor(FlavorError::NotFound { name, available }) => Some(json!({
                "flavor": name,
                "available_flavors": available,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        let body = ErrorResponse::new(self.to_string(), self.details());
        (status, Json(body)).into_response()
    }
}

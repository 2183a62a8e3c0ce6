//! Mapping of [`DeployError`] onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use launchpad_common::ErrorResponse;
use tracing::warn;

use crate::domain::DeployError;

const fn error_to_status(error: &DeployError) -> StatusCode {
    match error {
        DeployError::InvalidRequest(_) | DeployError::InvalidInstanceId(_) => {
            StatusCode::BAD_REQUEST
        }
        DeployError::InstanceNotFound(_) | DeployError::DeploymentNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        DeployError::Provision(_)
        | DeployError::Dispatch { .. }
        | DeployError::Inspect { .. }
        | DeployError::AgentTimeout { .. } => StatusCode::BAD_GATEWAY,
        DeployError::IdentifierUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DeployError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        let status = error_to_status(&self);
        if status.is_server_error() {
            warn!(kind = self.kind(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

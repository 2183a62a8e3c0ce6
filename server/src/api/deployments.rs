//! Deployment endpoints.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use launchpad_common::{
    ADDRESS_PENDING, DeployResponse, DeploymentRecord, DeploymentRequest, STATUS_COMPLETE,
    STATUS_DEPLOYING, STATUS_PROVISIONING, StatusResponse,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::domain::DeployError;

/// Query parameters of `GET /status`.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "instanceID")]
    pub instance_id: Option<String>,
}

/// Launch an instance and start its setup.
///
/// Responds as soon as the instance exists; the setup continues after the
/// response and its outcome is only visible through the deployment record.
pub async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeploymentRequest>, JsonRejection>,
) -> Result<Json<DeployResponse>, DeployError> {
    let Json(request) = payload.map_err(|e| DeployError::InvalidRequest(e.body_text()))?;

    let accepted = state.orchestrator.deploy(request).await?;
    info!(
        identifier = %accepted.identifier,
        instance_id = %accepted.instance.instance_id,
        "deployment accepted"
    );

    Ok(Json(DeployResponse {
        status: STATUS_DEPLOYING.to_owned(),
        identifier: accepted.identifier,
        instance_id: accepted.instance.instance_id,
        url: ADDRESS_PENDING.to_owned(),
    }))
}

/// Report whether an instance has a public address yet.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, DeployError> {
    let instance_id = query
        .instance_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| DeployError::InvalidRequest("instanceID query parameter is required".to_owned()))?;

    let instance = state.orchestrator.status(&instance_id).await?;
    let response = match instance.public_address {
        Some(address) => StatusResponse {
            status: STATUS_COMPLETE.to_owned(),
            project_url: Some(address),
        },
        None => StatusResponse {
            status: STATUS_PROVISIONING.to_owned(),
            project_url: None,
        },
    };
    Ok(Json(response))
}

/// Get a deployment record by identifier.
pub async fn get_deployment(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<DeploymentRecord>, DeployError> {
    state.orchestrator.deployment(&identifier).await.map(Json)
}

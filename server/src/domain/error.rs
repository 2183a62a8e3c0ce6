//! Typed domain error enum.
//!
//! Infrastructure adapters return `anyhow::Result`; the orchestrator maps
//! those failures onto [`DeployError`] at the service boundary, and the API
//! maps [`DeployError`] onto HTTP status codes.

use thiserror::Error;

/// Everything that can go wrong while deploying or inspecting.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid deployment request: {0}")]
    InvalidRequest(String),

    #[error("invalid instance id '{0}': expected i- followed by 8 or 17 hex characters")]
    InvalidInstanceId(String),

    /// The provider refused or failed to launch the instance.
    #[error("failed to provision instance: {0}")]
    Provision(String),

    /// The setup script could not be submitted.
    #[error("failed to dispatch setup script to {instance_id}: {reason}")]
    Dispatch { instance_id: String, reason: String },

    #[error("instance {0} not found")]
    InstanceNotFound(String),

    #[error("failed to inspect instance {instance_id}: {reason}")]
    Inspect { instance_id: String, reason: String },

    #[error("command agent on {instance_id} did not register within {waited_secs}s")]
    AgentTimeout { instance_id: String, waited_secs: u64 },

    /// Every identifier drawn for a new deployment was already taken.
    #[error("no unused deployment identifier after {attempts} attempts")]
    IdentifierUnavailable { attempts: u32 },

    #[error("deployment '{0}' not found")]
    DeploymentNotFound(String),

    #[error("deployment store error: {0}")]
    Store(String),
}

impl DeployError {
    /// Stable machine-readable name, sent as `kind` in API error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidInstanceId(_) => "invalid_instance_id",
            Self::Provision(_) => "provision",
            Self::Dispatch { .. } => "dispatch",
            Self::InstanceNotFound(_) => "not_found",
            Self::Inspect { .. } => "inspect",
            Self::AgentTimeout { .. } => "agent_timeout",
            Self::IdentifierUnavailable { .. } => "identifier_unavailable",
            Self::DeploymentNotFound(_) => "deployment_not_found",
            Self::Store(_) => "store",
        }
    }

    /// Classify an inspector failure, preserving a typed not-found raised by
    /// the adapter.
    #[must_use]
    pub fn from_inspect(instance_id: &str, err: &anyhow::Error) -> Self {
        if let Some(Self::InstanceNotFound(id)) = err.downcast_ref::<Self>() {
            return Self::InstanceNotFound(id.clone());
        }
        Self::Inspect {
            instance_id: instance_id.to_owned(),
            reason: format!("{err:#}"),
        }
    }
}

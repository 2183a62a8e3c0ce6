use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /deploy`.
///
/// Field names follow the JSON accepted by earlier releases of the service
/// (`gitURL`, `envVariables`, ...), so existing front-ends keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Repository to clone onto the instance.
    #[serde(rename = "gitURL")]
    pub git_url: String,
    /// Framework hint from the caller. Advisory only, never executed.
    #[serde(default)]
    pub framework: String,
    /// Sub-directory of the repository the application lives in.
    #[serde(default, rename = "rootDirectory")]
    pub root_directory: String,
    /// Optional build step, run from `root_directory`.
    #[serde(default, rename = "buildCommand")]
    pub build_command: String,
    /// Command that launches the application.
    #[serde(rename = "startCommand")]
    pub start_command: String,
    /// Raw `KEY=value` block written to `.env` when non-empty.
    #[serde(default, rename = "envVariables")]
    pub env_variables: String,
}

/// A launched compute instance. Never terminated by Launchpad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceHandle {
    pub instance_id: String,
    pub region: String,
}

/// Point-in-time view of an instance as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceStatus {
    pub instance_id: String,
    /// Absent until the provider assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    /// Provider lifecycle state, e.g. `pending` or `running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Last known step of a deployment's background setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    /// Instance launched, setup not started yet.
    Provisioned,
    /// Waiting for the instance's command agent to come up.
    AwaitingAgent,
    /// Setup script accepted by the remote executor.
    Dispatched,
    /// Setup dispatched and the instance was inspected afterwards.
    Running,
    Failed,
}

impl DeploymentPhase {
    /// Whether the background setup has stopped advancing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::AwaitingAgent => "awaiting_agent",
            Self::Dispatched => "dispatched",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition to apply to a [`DeploymentRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseChange {
    pub phase: DeploymentPhase,
    pub error: Option<String>,
    pub public_address: Option<String>,
}

impl PhaseChange {
    #[must_use]
    pub fn to(phase: DeploymentPhase) -> Self {
        Self {
            phase,
            error: None,
            public_address: None,
        }
    }

    #[must_use]
    pub fn running(public_address: Option<String>) -> Self {
        Self {
            phase: DeploymentPhase::Running,
            error: None,
            public_address,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            phase: DeploymentPhase::Failed,
            error: Some(error.into()),
            public_address: None,
        }
    }
}

/// Association between a deployment identifier and its instance, plus the
/// last phase the background setup reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub identifier: String,
    pub instance: InstanceHandle,
    pub phase: DeploymentPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// A freshly provisioned deployment.
    #[must_use]
    pub fn new(identifier: impl Into<String>, instance: InstanceHandle) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            instance,
            phase: DeploymentPhase::Provisioned,
            error: None,
            public_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `change`, keeping a previously seen address when the change
    /// carries none. A record in a terminal phase is left untouched and
    /// `false` is returned.
    pub fn apply(&mut self, change: PhaseChange) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = change.phase;
        self.error = change.error;
        if change.public_address.is_some() {
            self.public_address = change.public_address;
        }
        self.updated_at = Utc::now();
        true
    }
}

/// Body of a successful `POST /deploy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployResponse {
    pub status: String,
    pub identifier: String,
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    /// Always the pending placeholder: the address is not known yet.
    pub url: String,
}

/// Body of a successful `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
    #[serde(rename = "projectUrl")]
    pub project_url: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error class, e.g. `not_found` or `provision`.
    pub kind: String,
}

//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared types crate,
//! never from `crate::infra` or `crate::api`.
//!
//! Every port is `Send + Sync` and object safe: the orchestrator holds its
//! collaborators as `Arc<dyn Port>` and moves clones into detached tasks.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use launchpad_common::{DeploymentRecord, InstanceHandle, InstanceStatus, PhaseChange};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Launch parameters for a new compute instance.
#[derive(Debug, Clone)]
pub struct LaunchSpec<'a> {
    /// Machine image, e.g. `"ami-0a51a22a987dc45fd"`.
    pub image: &'a str,
    /// Instance size, e.g. `"t2.micro"`.
    pub instance_type: &'a str,
    pub security_group_ids: &'a [String],
    /// Instance profile granting the command agent its permissions.
    pub iam_instance_profile: &'a str,
    /// `(key, value)` tags applied to the instance at launch.
    pub tags: &'a [(&'a str, &'a str)],
}

// ── Provider Ports ────────────────────────────────────────────────────────────

/// Launches compute instances.
#[async_trait]
pub trait ComputeProvisioner: Send + Sync {
    /// Launch exactly one instance. Not safe to retry: every call creates
    /// (and bills for) a new instance.
    async fn create(&self, spec: &LaunchSpec<'_>) -> Result<InstanceHandle>;
}

/// Submits scripts to an instance's command agent.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Submit `script` for asynchronous execution and return the provider's
    /// command id. Acceptance says nothing about the script's outcome.
    async fn run_async(&self, instance_id: &str, script: &str) -> Result<String>;

    /// Whether the instance's command agent is registered and online.
    async fn agent_registered(&self, instance_id: &str) -> Result<bool>;
}

/// Read-only instance queries.
#[async_trait]
pub trait InstanceInspector: Send + Sync {
    /// Describe an instance. Unknown ids must fail with
    /// `DeployError::InstanceNotFound` inside the returned error.
    async fn describe(&self, instance_id: &str) -> Result<InstanceStatus>;
}

// ── Identifier Port ───────────────────────────────────────────────────────────

/// Produces deployment identifiers.
pub trait SlugSource: Send + Sync {
    fn next_slug(&self) -> String;
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Persistence for deployment records, keyed by identifier.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Insert a new record. Fails if the identifier is already taken.
    async fn insert(&self, record: &DeploymentRecord) -> Result<()>;
    /// Load a record, returning `None` when the identifier is unknown.
    async fn get(&self, identifier: &str) -> Result<Option<DeploymentRecord>>;
    /// Apply `change` to an existing record.
    async fn update(&self, identifier: &str, change: PhaseChange) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

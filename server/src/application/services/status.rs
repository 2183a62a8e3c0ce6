//! Application service: instance status and deployment lookups.
//!
//! Both queries are read-only and uncached: every call reaches the
//! inspector or the store.

use launchpad_common::{DeploymentRecord, InstanceStatus};

use super::deploy::Orchestrator;
use crate::domain::{DeployError, validate_instance_id};

impl Orchestrator {
    /// Describe `instance_id` through the inspector.
    ///
    /// An instance without a public address yet is a successful result with
    /// `public_address: None`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInstanceId`] for malformed ids,
    /// [`DeployError::InstanceNotFound`] when the provider does not know the
    /// instance, and [`DeployError::Inspect`] for any other failure.
    pub async fn status(&self, instance_id: &str) -> Result<InstanceStatus, DeployError> {
        validate_instance_id(instance_id)?;
        self.ports
            .inspector
            .describe(instance_id)
            .await
            .map_err(|e| DeployError::from_inspect(instance_id, &e))
    }

    /// Load the record of a deployment by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::DeploymentNotFound`] for unknown identifiers and
    /// [`DeployError::Store`] when the store cannot be read.
    pub async fn deployment(&self, identifier: &str) -> Result<DeploymentRecord, DeployError> {
        self.ports
            .store
            .get(identifier)
            .await
            .map_err(|e| DeployError::Store(format!("{e:#}")))?
            .ok_or_else(|| DeployError::DeploymentNotFound(identifier.to_owned()))
    }
}

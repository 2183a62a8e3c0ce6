//! In-memory implementation of the `DeploymentStore` port.
//!
//! Records are lost when the process exits. Used when no state file is
//! configured, and by tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use launchpad_common::{DeploymentRecord, PhaseChange};
use tokio::sync::RwLock;

use crate::application::ports::DeploymentStore;
use crate::domain::DeployError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DeploymentRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn insert(&self, record: &DeploymentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        anyhow::ensure!(
            !records.contains_key(&record.identifier),
            "deployment {} already exists",
            record.identifier
        );
        records.insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, identifier: &str) -> Result<Option<DeploymentRecord>> {
        Ok(self.records.read().await.get(identifier).cloned())
    }

    async fn update(&self, identifier: &str, change: PhaseChange) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(identifier)
            .ok_or_else(|| DeployError::DeploymentNotFound(identifier.to_owned()))?;
        anyhow::ensure!(
            record.apply(change),
            "deployment {identifier} already finished"
        );
        Ok(())
    }
}

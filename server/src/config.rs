//! Server configuration loaded from `LAUNCHPAD_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::services::DeploySettings;
use crate::domain::ReadinessPolicy;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "LAUNCHPAD_";

/// How the background setup waits for a new instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessMode {
    /// Sleep `settle_delay_secs`, then dispatch.
    #[default]
    Fixed,
    /// Poll the command agent every `poll_interval_secs` for at most
    /// `readiness_timeout_secs`.
    Poll,
}

/// Server configuration loaded from environment variables via `envy`.
///
/// Each field maps to `LAUNCHPAD_<FIELD>`:
///   - `LAUNCHPAD_LISTEN_ADDR`            (default `0.0.0.0:9000`)
///   - `LAUNCHPAD_REGION`                 (default `ap-south-1`)
///   - `LAUNCHPAD_IMAGE_ID`               (default `ami-0a51a22a987dc45fd`)
///   - `LAUNCHPAD_INSTANCE_TYPE`          (default `t2.micro`)
///   - `LAUNCHPAD_SECURITY_GROUP_IDS`     (comma separated)
///   - `LAUNCHPAD_IAM_INSTANCE_PROFILE`   (default `AmazonEC2RoleforSSM`)
///   - `LAUNCHPAD_PROJECT_TAG`            (default `DynamicDeployment`)
///   - `LAUNCHPAD_READINESS`              (`fixed` or `poll`)
///   - `LAUNCHPAD_SETTLE_DELAY_SECS`      (default `180`)
///   - `LAUNCHPAD_POLL_INTERVAL_SECS`     (default `10`)
///   - `LAUNCHPAD_READINESS_TIMEOUT_SECS` (default `600`)
///   - `LAUNCHPAD_AWS_CLI`                (default `aws`)
///   - `LAUNCHPAD_COMMAND_TIMEOUT_SECS`   (default `60`)
///   - `LAUNCHPAD_STATE_FILE`             (optional, JSON store path)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Socket address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_image_id")]
    pub image_id: String,

    #[serde(default = "default_instance_type")]
    pub instance_type: String,

    #[serde(default = "default_security_group_ids")]
    pub security_group_ids: Vec<String>,

    #[serde(default = "default_iam_instance_profile")]
    pub iam_instance_profile: String,

    #[serde(default = "default_project_tag")]
    pub project_tag: String,

    #[serde(default)]
    pub readiness: ReadinessMode,

    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,

    /// Program used to reach the provider.
    #[serde(default = "default_aws_cli")]
    pub aws_cli: String,

    /// Upper bound for a single provider CLI call.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Persist deployment records here; in memory when unset.
    pub state_file: Option<PathBuf>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:9000".to_string()
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

fn default_image_id() -> String {
    "ami-0a51a22a987dc45fd".to_string()
}

fn default_instance_type() -> String {
    "t2.micro".to_string()
}

fn default_security_group_ids() -> Vec<String> {
    vec!["sg-0b34e34d59a58cb23".to_string()]
}

fn default_iam_instance_profile() -> String {
    "AmazonEC2RoleforSSM".to_string()
}

fn default_project_tag() -> String {
    "DynamicDeployment".to_string()
}

fn default_settle_delay_secs() -> u64 {
    180
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_readiness_timeout_secs() -> u64 {
    600
}

fn default_aws_cli() -> String {
    "aws".to_string()
}

fn default_command_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value of the wrong type.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value of the wrong type.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("failed to load config from LAUNCHPAD_* env vars")?;
        anyhow::ensure!(
            config.readiness != ReadinessMode::Poll || config.poll_interval_secs > 0,
            "LAUNCHPAD_POLL_INTERVAL_SECS must be greater than zero"
        );
        Ok(config)
    }

    #[must_use]
    pub fn readiness_policy(&self) -> ReadinessPolicy {
        match self.readiness {
            ReadinessMode::Fixed => {
                ReadinessPolicy::FixedDelay(Duration::from_secs(self.settle_delay_secs))
            }
            ReadinessMode::Poll => ReadinessPolicy::Poll {
                interval: Duration::from_secs(self.poll_interval_secs),
                timeout: Duration::from_secs(self.readiness_timeout_secs),
            },
        }
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Launch parameters shared by every deployment.
    #[must_use]
    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            image_id: self.image_id.clone(),
            instance_type: self.instance_type.clone(),
            security_group_ids: self
                .security_group_ids
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            iam_instance_profile: self.iam_instance_profile.clone(),
            project_tag: self.project_tag.clone(),
            readiness: self.readiness_policy(),
        }
    }
}

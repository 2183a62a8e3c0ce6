//! Deployment domain rules and pure validation functions.
//!
//! This module is free of I/O and async. All functions take data in and
//! return data out.

use std::path::{Component, Path};
use std::time::Duration;

use launchpad_common::DeploymentRequest;

use crate::domain::error::DeployError;
use crate::domain::script::ENV_TERMINATOR;

/// How the background setup decides the instance can accept commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPolicy {
    /// Sleep for a fixed settle delay, then dispatch unconditionally.
    FixedDelay(Duration),
    /// Ask the executor whether the command agent has registered, every
    /// `interval`, giving up after `timeout`.
    Poll { interval: Duration, timeout: Duration },
}

/// Reject requests that cannot produce a well-formed setup script.
///
/// Build and start commands are shell by nature and are not inspected
/// beyond the start command being present.
///
/// # Errors
///
/// Returns [`DeployError::InvalidRequest`] describing the first offending field.
pub fn validate_request(request: &DeploymentRequest) -> Result<(), DeployError> {
    if request.git_url.trim().is_empty() {
        return Err(invalid("gitURL must not be empty"));
    }
    if request.git_url.contains(['\n', '\r']) {
        return Err(invalid("gitURL must be a single line"));
    }
    if request.start_command.trim().is_empty() {
        return Err(invalid("startCommand must not be empty"));
    }
    validate_root_directory(&request.root_directory)?;
    if request
        .env_variables
        .lines()
        .any(|line| line.trim_end_matches('\r') == ENV_TERMINATOR)
    {
        return Err(invalid(&format!(
            "envVariables must not contain a line reading {ENV_TERMINATOR}"
        )));
    }
    Ok(())
}

/// `rootDirectory` must stay inside the cloned repository.
fn validate_root_directory(dir: &str) -> Result<(), DeployError> {
    if dir.contains(['\n', '\r', '\0']) {
        return Err(invalid("rootDirectory must be a single line"));
    }
    let path = Path::new(dir);
    if path.has_root() {
        return Err(invalid("rootDirectory must be relative to the repository"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid("rootDirectory must not contain '..'"));
    }
    Ok(())
}

/// Check that `id` looks like a provider instance id (`i-` + 8 or 17 hex).
///
/// # Errors
///
/// Returns [`DeployError::InvalidInstanceId`] when the format is wrong.
pub fn validate_instance_id(id: &str) -> Result<(), DeployError> {
    let Some(hex) = id.strip_prefix("i-") else {
        return Err(DeployError::InvalidInstanceId(id.to_string()));
    };
    let well_formed = matches!(hex.len(), 8 | 17)
        && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !well_formed {
        return Err(DeployError::InvalidInstanceId(id.to_string()));
    }
    Ok(())
}

fn invalid(msg: &str) -> DeployError {
    DeployError::InvalidRequest(msg.to_string())
}

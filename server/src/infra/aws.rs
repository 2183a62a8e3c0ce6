//! Infrastructure implementation of the provider port traits.
//!
//! `AwsCliProvider<R>` routes every provider call through the `aws` command
//! line client via a `CommandRunner`, always with `--output json`, and parses
//! the documented response shapes. Credentials are resolved by the CLI
//! itself (environment, shared profile or instance role).

use std::process::Output;

use anyhow::{Context, Result};
use async_trait::async_trait;
use launchpad_common::{InstanceHandle, InstanceStatus};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{
    CommandRunner, ComputeProvisioner, InstanceInspector, LaunchSpec, RemoteExecutor,
};
use crate::domain::DeployError;

/// SSM document that runs its `commands` parameter as a shell script.
pub const RUN_SHELL_DOCUMENT: &str = "AWS-RunShellScript";

/// Error codes the EC2 API uses for ids it does not know.
const NOT_FOUND_CODES: &[&str] = &["InvalidInstanceID.NotFound", "InvalidInstanceID.Malformed"];

/// Infrastructure adapter that routes all provider calls through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct AwsCliProvider<R: CommandRunner> {
    runner: R,
    program: String,
    region: String,
}

impl<R: CommandRunner> AwsCliProvider<R> {
    /// Create a provider that invokes `program` (usually `aws`) against `region`.
    pub fn new(runner: R, program: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            region: region.into(),
        }
    }

    /// Report the CLI version, e.g. `aws-cli/2.15.0 Python/3.11.6 ...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CLI cannot be run or exits non-zero.
    pub async fn version(&self) -> Result<String> {
        let output = self
            .runner
            .run(&self.program, &["--version"])
            .await
            .context("aws --version")?;
        ensure_success(&output, "aws --version")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run `aws <args> --region R --output json`.
    async fn invoke(&self, args: &[&str]) -> Result<Output> {
        let mut full: Vec<&str> = args.to_vec();
        full.extend_from_slice(&["--region", self.region.as_str(), "--output", "json"]);
        self.runner.run(&self.program, &full).await
    }
}

#[async_trait]
impl<R: CommandRunner> ComputeProvisioner for AwsCliProvider<R> {
    async fn create(&self, spec: &LaunchSpec<'_>) -> Result<InstanceHandle> {
        let tags: Vec<serde_json::Value> = spec
            .tags
            .iter()
            .map(|(key, value)| serde_json::json!({ "Key": key, "Value": value }))
            .collect();
        let tag_spec =
            serde_json::json!([{ "ResourceType": "instance", "Tags": tags }]).to_string();
        let profile = format!("Name={}", spec.iam_instance_profile);

        let mut args = vec![
            "ec2",
            "run-instances",
            "--image-id",
            spec.image,
            "--instance-type",
            spec.instance_type,
            "--count",
            "1",
            "--iam-instance-profile",
            profile.as_str(),
            "--tag-specifications",
            tag_spec.as_str(),
        ];
        if !spec.security_group_ids.is_empty() {
            args.push("--security-group-ids");
            args.extend(spec.security_group_ids.iter().map(String::as_str));
        }

        let output = self.invoke(&args).await.context("aws ec2 run-instances")?;
        ensure_success(&output, "aws ec2 run-instances")?;
        let parsed: RunInstancesOutput = parse_json(&output, "aws ec2 run-instances")?;
        let instance_id = parsed
            .instances
            .into_iter()
            .next()
            .map(|i| i.instance_id)
            .ok_or_else(|| anyhow::anyhow!("aws ec2 run-instances returned no instance"))?;

        Ok(InstanceHandle {
            instance_id,
            region: self.region.clone(),
        })
    }
}

#[async_trait]
impl<R: CommandRunner> RemoteExecutor for AwsCliProvider<R> {
    async fn run_async(&self, instance_id: &str, script: &str) -> Result<String> {
        let parameters = serde_json::json!({ "commands": [script] }).to_string();
        let args = [
            "ssm",
            "send-command",
            "--document-name",
            RUN_SHELL_DOCUMENT,
            "--instance-ids",
            instance_id,
            "--parameters",
            parameters.as_str(),
        ];
        let output = self.invoke(&args).await.context("aws ssm send-command")?;
        ensure_success(&output, "aws ssm send-command")?;
        let parsed: SendCommandOutput = parse_json(&output, "aws ssm send-command")?;
        Ok(parsed.command.command_id)
    }

    async fn agent_registered(&self, instance_id: &str) -> Result<bool> {
        let filter = format!("Key=InstanceIds,Values={instance_id}");
        let args = [
            "ssm",
            "describe-instance-information",
            "--filters",
            filter.as_str(),
        ];
        let output = self
            .invoke(&args)
            .await
            .context("aws ssm describe-instance-information")?;
        ensure_success(&output, "aws ssm describe-instance-information")?;
        let parsed: InstanceInformationOutput =
            parse_json(&output, "aws ssm describe-instance-information")?;
        Ok(parsed
            .instance_information_list
            .iter()
            .any(|i| i.instance_id == instance_id && i.ping_status == "Online"))
    }
}

#[async_trait]
impl<R: CommandRunner> InstanceInspector for AwsCliProvider<R> {
    async fn describe(&self, instance_id: &str) -> Result<InstanceStatus> {
        let args = ["ec2", "describe-instances", "--instance-ids", instance_id];
        let output = self
            .invoke(&args)
            .await
            .context("aws ec2 describe-instances")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if NOT_FOUND_CODES.iter().any(|code| stderr.contains(code)) {
                return Err(DeployError::InstanceNotFound(instance_id.to_owned()).into());
            }
            anyhow::bail!("aws ec2 describe-instances failed: {}", stderr.trim());
        }
        let parsed: DescribeInstancesOutput = parse_json(&output, "aws ec2 describe-instances")?;
        let instance = parsed
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .find(|i| i.instance_id == instance_id)
            .ok_or_else(|| DeployError::InstanceNotFound(instance_id.to_owned()))?;

        Ok(InstanceStatus {
            instance_id: instance.instance_id,
            public_address: instance.public_ip_address,
            state: instance.state.map(|s| s.name),
        })
    }
}

// ── Response shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunInstancesOutput {
    #[serde(default)]
    instances: Vec<LaunchedInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LaunchedInstance {
    instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommandOutput {
    command: SentCommand,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SentCommand {
    command_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceInformationOutput {
    #[serde(default)]
    instance_information_list: Vec<ManagedInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ManagedInstance {
    instance_id: String,
    #[serde(default)]
    ping_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOutput {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<DescribedInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedInstance {
    instance_id: String,
    public_ip_address: Option<String>,
    state: Option<InstanceStateName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceStateName {
    name: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ensure_success(output: &Output, what: &str) -> Result<()> {
    anyhow::ensure!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

fn parse_json<T: DeserializeOwned>(output: &Output, what: &str) -> Result<T> {
    serde_json::from_slice(&output.stdout).with_context(|| format!("parsing {what} output"))
}

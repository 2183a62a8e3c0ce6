//! Tests for `AwsCliProvider`.
//!
//! These tests verify that the adapter builds the exact `aws` argument lists
//! for every provider call, parses the documented JSON responses, and maps
//! the provider's not-found errors onto `DeployError::InstanceNotFound`.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use launchpad_server::application::ports::{
    CommandRunner, ComputeProvisioner, InstanceInspector, LaunchSpec, RemoteExecutor,
};
use launchpad_server::domain::DeployError;
use launchpad_server::infra::AwsCliProvider;
use launchpad_server::infra::aws::RUN_SHELL_DOCUMENT;

use crate::helpers::{err_output, ok_output};

// ─── RecordingRunner ──────────────────────────────────────────────────────────

/// A `CommandRunner` that records every `(program, args)` call and replies
/// with queued outputs in order.
///
/// Cloneable so the test keeps a handle after moving one into the provider.
#[derive(Clone, Default)]
struct RecordingRunner {
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    replies: Arc<Mutex<VecDeque<Output>>>,
}

impl RecordingRunner {
    fn replying(replies: Vec<Output>) -> Self {
        Self {
            calls: Arc::default(),
            replies: Arc::new(Mutex::new(replies.into())),
        }
    }

    fn recorded_calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("mutex poisoned").clone()
    }

    fn only_args(&self) -> Vec<String> {
        let calls = self.recorded_calls();
        assert_eq!(calls.len(), 1, "expected exactly one call: {calls:?}");
        calls.into_iter().next().map(|(_, args)| args).unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_owned(),
            args.iter().map(ToString::to_string).collect(),
        ));
        match self.replies.lock().expect("mutex poisoned").pop_front() {
            Some(output) => Ok(output),
            None => bail!("no reply queued"),
        }
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.run(program, args).await
    }
}

fn provider(runner: &RecordingRunner) -> AwsCliProvider<RecordingRunner> {
    AwsCliProvider::new(runner.clone(), "aws", "ap-south-1")
}

const GLOBAL_ARGS: [&str; 4] = ["--region", "ap-south-1", "--output", "json"];

fn position(args: &[String], flag: &str) -> usize {
    args.iter()
        .position(|a| a == flag)
        .unwrap_or_else(|| panic!("{flag} missing from {args:?}"))
}

// ─── ComputeProvisioner ───────────────────────────────────────────────────────

const SECURITY_GROUPS: [&str; 1] = ["sg-0b34e34d59a58cb23"];

fn launch_spec<'a>(
    groups: &'a [String],
    tags: &'a [(&'a str, &'a str)],
) -> LaunchSpec<'a> {
    LaunchSpec {
        image: "ami-0a51a22a987dc45fd",
        instance_type: "t2.micro",
        security_group_ids: groups,
        iam_instance_profile: "AmazonEC2RoleforSSM",
        tags,
    }
}

#[tokio::test]
async fn create_builds_run_instances_arguments() {
    let runner = RecordingRunner::replying(vec![ok_output(
        br#"{"Instances":[{"InstanceId":"i-0123456789abcdef0","State":{"Name":"pending"}}]}"#,
    )]);
    let groups: Vec<String> = SECURITY_GROUPS.iter().map(ToString::to_string).collect();
    let tags = [("Project", "DynamicDeployment"), ("Name", "quiet-amber-otter")];

    let handle = provider(&runner)
        .create(&launch_spec(&groups, &tags))
        .await
        .expect("create");

    assert_eq!(handle.instance_id, "i-0123456789abcdef0");
    assert_eq!(handle.region, "ap-south-1");

    let calls = runner.recorded_calls();
    assert_eq!(calls[0].0, "aws");
    let args = runner.only_args();
    assert_eq!(
        &args[..10],
        [
            "ec2",
            "run-instances",
            "--image-id",
            "ami-0a51a22a987dc45fd",
            "--instance-type",
            "t2.micro",
            "--count",
            "1",
            "--iam-instance-profile",
            "Name=AmazonEC2RoleforSSM",
        ]
    );
    let sg = position(&args, "--security-group-ids");
    assert_eq!(args[sg + 1], "sg-0b34e34d59a58cb23");
    assert_eq!(&args[args.len() - 4..], GLOBAL_ARGS);

    let spec = position(&args, "--tag-specifications");
    let tag_spec: serde_json::Value = serde_json::from_str(&args[spec + 1]).expect("tag json");
    assert_eq!(
        tag_spec,
        serde_json::json!([{
            "ResourceType": "instance",
            "Tags": [
                { "Key": "Project", "Value": "DynamicDeployment" },
                { "Key": "Name", "Value": "quiet-amber-otter" },
            ],
        }])
    );
}

#[tokio::test]
async fn create_without_security_groups_omits_the_flag() {
    let runner = RecordingRunner::replying(vec![ok_output(
        br#"{"Instances":[{"InstanceId":"i-0123456789abcdef0"}]}"#,
    )]);
    provider(&runner)
        .create(&launch_spec(&[], &[]))
        .await
        .expect("create");
    assert!(!runner.only_args().iter().any(|a| a == "--security-group-ids"));
}

#[tokio::test]
async fn create_surfaces_provider_stderr() {
    let runner = RecordingRunner::replying(vec![err_output(
        254,
        b"An error occurred (InstanceLimitExceeded) when calling the RunInstances operation",
    )]);
    let err = provider(&runner)
        .create(&launch_spec(&[], &[]))
        .await
        .expect_err("launch rejected");
    assert!(format!("{err:#}").contains("InstanceLimitExceeded"));
}

#[tokio::test]
async fn create_with_empty_instance_list_is_an_error() {
    let runner = RecordingRunner::replying(vec![ok_output(br#"{"Instances":[]}"#)]);
    let err = provider(&runner)
        .create(&launch_spec(&[], &[]))
        .await
        .expect_err("no instance");
    assert!(err.to_string().contains("no instance"));
}

#[tokio::test]
async fn create_with_garbage_output_is_an_error() {
    let runner = RecordingRunner::replying(vec![ok_output(b"not json")]);
    let err = provider(&runner)
        .create(&launch_spec(&[], &[]))
        .await
        .expect_err("unparseable");
    assert!(format!("{err:#}").contains("parsing aws ec2 run-instances output"));
}

// ─── RemoteExecutor ───────────────────────────────────────────────────────────

#[tokio::test]
async fn run_async_sends_script_through_run_shell_document() {
    let runner = RecordingRunner::replying(vec![ok_output(
        br#"{"Command":{"CommandId":"4f1c2a8e-0000-4000-8000-1234567890ab","Status":"Pending"}}"#,
    )]);
    let script = "#!/bin/bash\necho \"it's $HOME\"\n";

    let command_id = provider(&runner)
        .run_async("i-0123456789abcdef0", script)
        .await
        .expect("send-command");

    assert_eq!(command_id, "4f1c2a8e-0000-4000-8000-1234567890ab");
    let args = runner.only_args();
    assert_eq!(
        &args[..6],
        [
            "ssm",
            "send-command",
            "--document-name",
            RUN_SHELL_DOCUMENT,
            "--instance-ids",
            "i-0123456789abcdef0",
        ]
    );
    assert_eq!(args[6], "--parameters");
    let parameters: serde_json::Value = serde_json::from_str(&args[7]).expect("parameters json");
    assert_eq!(parameters, serde_json::json!({ "commands": [script] }));
    assert_eq!(&args[8..], GLOBAL_ARGS);
}

#[tokio::test]
async fn agent_registered_requires_online_ping() {
    let runner = RecordingRunner::replying(vec![
        ok_output(
            br#"{"InstanceInformationList":[{"InstanceId":"i-0123456789abcdef0","PingStatus":"Online"}]}"#,
        ),
        ok_output(
            br#"{"InstanceInformationList":[{"InstanceId":"i-0123456789abcdef0","PingStatus":"ConnectionLost"}]}"#,
        ),
        ok_output(br#"{"InstanceInformationList":[]}"#),
    ]);
    let aws = provider(&runner);

    assert!(aws.agent_registered("i-0123456789abcdef0").await.expect("online"));
    assert!(!aws.agent_registered("i-0123456789abcdef0").await.expect("lost"));
    assert!(!aws.agent_registered("i-0123456789abcdef0").await.expect("absent"));

    let (_, args) = &runner.recorded_calls()[0];
    assert_eq!(
        &args[..4],
        [
            "ssm",
            "describe-instance-information",
            "--filters",
            "Key=InstanceIds,Values=i-0123456789abcdef0",
        ]
    );
}

// ─── InstanceInspector ────────────────────────────────────────────────────────

#[tokio::test]
async fn describe_reads_address_and_state() {
    let runner = RecordingRunner::replying(vec![ok_output(
        br#"{"Reservations":[{"Instances":[{
            "InstanceId":"i-0123456789abcdef0",
            "PublicIpAddress":"13.233.10.20",
            "State":{"Code":16,"Name":"running"}
        }]}]}"#,
    )]);

    let status = provider(&runner)
        .describe("i-0123456789abcdef0")
        .await
        .expect("describe");

    assert_eq!(status.public_address.as_deref(), Some("13.233.10.20"));
    assert_eq!(status.state.as_deref(), Some("running"));
    let args = runner.only_args();
    assert_eq!(
        &args[..4],
        ["ec2", "describe-instances", "--instance-ids", "i-0123456789abcdef0"]
    );
}

#[tokio::test]
async fn describe_pending_instance_has_no_address() {
    let runner = RecordingRunner::replying(vec![ok_output(
        br#"{"Reservations":[{"Instances":[{"InstanceId":"i-0123456789abcdef0","State":{"Name":"pending"}}]}]}"#,
    )]);
    let status = provider(&runner)
        .describe("i-0123456789abcdef0")
        .await
        .expect("describe");
    assert!(status.public_address.is_none());
}

#[tokio::test]
async fn describe_maps_not_found_error_code() {
    let runner = RecordingRunner::replying(vec![err_output(
        254,
        b"An error occurred (InvalidInstanceID.NotFound) when calling the DescribeInstances operation: The instance ID 'i-0123456789abcdef0' does not exist",
    )]);
    let err = provider(&runner)
        .describe("i-0123456789abcdef0")
        .await
        .expect_err("not found");
    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::InstanceNotFound(id)) if id == "i-0123456789abcdef0"
    ));
}

#[tokio::test]
async fn describe_with_no_reservation_is_not_found() {
    let runner = RecordingRunner::replying(vec![ok_output(br#"{"Reservations":[]}"#)]);
    let err = provider(&runner)
        .describe("i-0123456789abcdef0")
        .await
        .expect_err("not found");
    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::InstanceNotFound(_))
    ));
}

#[tokio::test]
async fn describe_other_failures_are_untyped() {
    let runner = RecordingRunner::replying(vec![err_output(255, b"Unable to locate credentials")]);
    let err = provider(&runner)
        .describe("i-0123456789abcdef0")
        .await
        .expect_err("no credentials");
    assert!(err.downcast_ref::<DeployError>().is_none());
    assert!(err.to_string().contains("Unable to locate credentials"));
}

#[tokio::test]
async fn version_trims_cli_banner() {
    let runner = RecordingRunner::replying(vec![ok_output(
        b"aws-cli/2.15.0 Python/3.11.6 Linux/6.1 exe/x86_64\n",
    )]);
    let version = provider(&runner).version().await.expect("version");
    assert_eq!(version, "aws-cli/2.15.0 Python/3.11.6 Linux/6.1 exe/x86_64");
    assert_eq!(runner.only_args(), ["--version"]);
}

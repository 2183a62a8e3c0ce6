//! Application service: deployment orchestration.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! A deployment runs in two phases. The synchronous phase validates the
//! request, reserves an unused identifier, launches the instance and records
//! it; the caller gets the identifier and instance id as soon as the launch
//! call returns. The detached phase waits for the instance to accept commands, dispatches the
//! setup script and inspects the instance once, recording each step.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use launchpad_common::{
    DeploymentPhase, DeploymentRecord, DeploymentRequest, InstanceHandle, InstanceStatus,
    PhaseChange,
};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::application::ports::{
    ComputeProvisioner, DeploymentStore, InstanceInspector, LaunchSpec, RemoteExecutor, SlugSource,
};
use crate::domain::{
    DeployError, ReadinessPolicy, is_valid_identifier, render_setup_script, validate_request,
};

/// Fixed launch parameters for every deployment in this environment.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub image_id: String,
    pub instance_type: String,
    pub security_group_ids: Vec<String>,
    pub iam_instance_profile: String,
    /// Value of the `Project` tag marking instances launched by this service.
    pub project_tag: String,
    pub readiness: ReadinessPolicy,
}

/// The provider and state collaborators an [`Orchestrator`] drives.
#[derive(Clone)]
pub struct Collaborators {
    pub provisioner: Arc<dyn ComputeProvisioner>,
    pub executor: Arc<dyn RemoteExecutor>,
    pub inspector: Arc<dyn InstanceInspector>,
    pub store: Arc<dyn DeploymentStore>,
    pub slugs: Arc<dyn SlugSource>,
}

/// Background setup of one deployment. Resolves to the instance status seen
/// after dispatch, or the error that stopped the setup.
pub type SetupTask = JoinHandle<Result<InstanceStatus, DeployError>>;

/// Outcome of the synchronous phase of [`Orchestrator::deploy`].
#[derive(Debug)]
pub struct Accepted {
    pub identifier: String,
    pub instance: InstanceHandle,
    /// Handle to the detached setup. Dropping it does not cancel the setup.
    pub setup: SetupTask,
}

/// How many slugs [`Orchestrator::deploy`] draws before giving up on finding
/// an unused identifier.
pub const MAX_SLUG_ATTEMPTS: u32 = 16;

/// Identifiers held by launches that have not been recorded yet.
type PendingIdentifiers = Arc<Mutex<HashSet<String>>>;

/// Sequences provisioning, remote setup and inspection.
#[derive(Clone)]
pub struct Orchestrator {
    pub(super) ports: Collaborators,
    pub(super) settings: Arc<DeploySettings>,
    pending: PendingIdentifiers,
}

/// An identifier held for one in-flight launch. Released on drop.
struct Reservation {
    identifier: String,
    pending: PendingIdentifiers,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.identifier);
    }
}

/// The deployment a detached setup works on.
struct SetupTarget {
    identifier: String,
    instance: InstanceHandle,
    /// False when the record could not be stored; phase updates are skipped
    /// so they never land on another deployment's record.
    tracked: bool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(ports: Collaborators, settings: DeploySettings) -> Self {
        Self {
            ports,
            settings: Arc::new(settings),
            pending: PendingIdentifiers::default(),
        }
    }

    /// Launch an instance for `request` and start its setup in the background.
    ///
    /// Returns once the instance exists; the setup keeps running after the
    /// caller has its answer. Later failures are logged and recorded against
    /// the identifier, never returned here.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidRequest`] before touching the provider,
    /// [`DeployError::IdentifierUnavailable`] or [`DeployError::Store`] when
    /// no unused identifier can be reserved, or [`DeployError::Provision`]
    /// when the launch is rejected. In every case no instance and no record
    /// exist.
    pub async fn deploy(&self, request: DeploymentRequest) -> Result<Accepted, DeployError> {
        validate_request(&request)?;

        let reservation = self.reserve_identifier().await?;
        let identifier = reservation.identifier.clone();
        info!(identifier = %identifier, "creating instance");

        let settings = &self.settings;
        let tags = [
            ("Project", settings.project_tag.as_str()),
            ("Name", identifier.as_str()),
        ];
        let spec = LaunchSpec {
            image: &settings.image_id,
            instance_type: &settings.instance_type,
            security_group_ids: &settings.security_group_ids,
            iam_instance_profile: &settings.iam_instance_profile,
            tags: &tags,
        };
        let instance = self.ports.provisioner.create(&spec).await.map_err(|e| {
            error!(identifier = %identifier, error = %format!("{e:#}"), "instance launch failed");
            DeployError::Provision(format!("{e:#}"))
        })?;
        info!(
            identifier = %identifier,
            instance_id = %instance.instance_id,
            region = %instance.region,
            "instance created"
        );

        // The instance exists from here on; a store failure must not hide
        // its id from the caller.
        let record = DeploymentRecord::new(identifier.clone(), instance.clone());
        let tracked = match self.ports.store.insert(&record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(identifier = %identifier, error = %format!("{e:#}"), "failed to record deployment");
                false
            }
        };
        drop(reservation);

        let this = self.clone();
        let target = SetupTarget {
            identifier: identifier.clone(),
            instance: instance.clone(),
            tracked,
        };
        let setup = tokio::spawn(async move { this.complete_setup(&target, &request).await });

        Ok(Accepted {
            identifier,
            instance,
            setup,
        })
    }

    /// Draw slugs until one is neither held by another launch nor already
    /// recorded. The reservation lasts until the record is inserted.
    async fn reserve_identifier(&self) -> Result<Reservation, DeployError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let candidate = self.ports.slugs.next_slug();
            if !is_valid_identifier(&candidate) {
                warn!(candidate = %candidate, "slug source produced a malformed identifier");
                continue;
            }
            let Some(reservation) = self.hold(candidate) else {
                continue;
            };
            match self.ports.store.get(&reservation.identifier).await {
                Ok(None) => return Ok(reservation),
                Ok(Some(_)) => {
                    debug!(identifier = %reservation.identifier, "identifier already recorded");
                }
                Err(e) => {
                    error!(error = %format!("{e:#}"), "identifier lookup failed");
                    return Err(DeployError::Store(format!("{e:#}")));
                }
            }
        }
        warn!(attempts = MAX_SLUG_ATTEMPTS, "no unused identifier found");
        Err(DeployError::IdentifierUnavailable {
            attempts: MAX_SLUG_ATTEMPTS,
        })
    }

    /// Mark `identifier` as in flight, unless another launch already holds it.
    fn hold(&self, identifier: String) -> Option<Reservation> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(identifier.clone()) {
            debug!(identifier = %identifier, "identifier held by another launch");
            return None;
        }
        Some(Reservation {
            identifier,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Detached phase: run the setup and record how it ended.
    async fn complete_setup(
        &self,
        target: &SetupTarget,
        request: &DeploymentRequest,
    ) -> Result<InstanceStatus, DeployError> {
        let outcome = self.run_setup(target, request).await;
        match &outcome {
            Ok(status) => {
                info!(
                    identifier = %target.identifier,
                    instance_id = %target.instance.instance_id,
                    address = status.public_address.as_deref().unwrap_or("unassigned"),
                    "deployment setup dispatched"
                );
                self.record(target, PhaseChange::running(status.public_address.clone()))
                    .await;
            }
            Err(e) => {
                error!(
                    identifier = %target.identifier,
                    instance_id = %target.instance.instance_id,
                    kind = e.kind(),
                    error = %e,
                    "deployment setup failed"
                );
                self.record(target, PhaseChange::failed(e.to_string()))
                    .await;
            }
        }
        outcome
    }

    async fn run_setup(
        &self,
        target: &SetupTarget,
        request: &DeploymentRequest,
    ) -> Result<InstanceStatus, DeployError> {
        let identifier = target.identifier.as_str();
        let instance_id = target.instance.instance_id.as_str();

        self.record(target, PhaseChange::to(DeploymentPhase::AwaitingAgent))
            .await;
        self.await_readiness(instance_id).await?;

        let script = render_setup_script(identifier, request);
        let command_id = self
            .ports
            .executor
            .run_async(instance_id, &script)
            .await
            .map_err(|e| DeployError::Dispatch {
                instance_id: instance_id.to_owned(),
                reason: format!("{e:#}"),
            })?;
        info!(identifier = %identifier, instance_id = %instance_id, command_id = %command_id, "setup script sent");
        self.record(target, PhaseChange::to(DeploymentPhase::Dispatched))
            .await;

        self.ports
            .inspector
            .describe(instance_id)
            .await
            .map_err(|e| DeployError::from_inspect(instance_id, &e))
    }

    /// Wait until the instance should accept commands, per the configured policy.
    async fn await_readiness(&self, instance_id: &str) -> Result<(), DeployError> {
        match self.settings.readiness {
            ReadinessPolicy::FixedDelay(delay) => {
                debug!(instance_id = %instance_id, delay_secs = delay.as_secs(), "waiting for instance to settle");
                tokio::time::sleep(delay).await;
                Ok(())
            }
            ReadinessPolicy::Poll { interval, timeout } => {
                self.poll_agent(instance_id, interval, timeout).await
            }
        }
    }

    async fn poll_agent(
        &self,
        instance_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<(), DeployError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.ports.executor.agent_registered(instance_id).await {
                Ok(true) => {
                    debug!(instance_id = %instance_id, "command agent registered");
                    return Ok(());
                }
                Ok(false) => debug!(instance_id = %instance_id, "command agent not registered yet"),
                Err(e) => warn!(
                    instance_id = %instance_id,
                    error = %format!("{e:#}"),
                    "agent registration check failed"
                ),
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(DeployError::AgentTimeout {
                    instance_id: instance_id.to_owned(),
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    /// Best-effort phase update; the setup carries on if the store fails.
    async fn record(&self, target: &SetupTarget, change: PhaseChange) {
        if !target.tracked {
            return;
        }
        let identifier = target.identifier.as_str();
        let phase = change.phase;
        if let Err(e) = self.ports.store.update(identifier, change).await {
            warn!(identifier = %identifier, phase = %phase, error = %format!("{e:#}"), "failed to record phase");
        }
    }
}

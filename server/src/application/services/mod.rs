//! Application services: the deployment use-cases.

pub mod deploy;
pub mod status;

pub use deploy::{
    Accepted, Collaborators, DeploySettings, MAX_SLUG_ATTEMPTS, Orchestrator, SetupTask,
};

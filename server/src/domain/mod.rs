//! Domain layer: pure deployment rules, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::api`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

pub mod deployment;
pub mod error;
pub mod identifier;
pub mod script;

pub use deployment::{ReadinessPolicy, validate_instance_id, validate_request};
pub use error::DeployError;
pub use identifier::{generate_identifier, is_valid_identifier};
pub use script::{ENV_TERMINATOR, render_setup_script};

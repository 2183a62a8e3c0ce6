//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! provider CLI adapter, and deployment state storage.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::api` are forbidden.

pub mod aws;
pub mod command_runner;
pub mod memory;
pub mod slug;
pub mod state;

pub use aws::AwsCliProvider;
pub use command_runner::TokioCommandRunner;
pub use memory::MemoryStore;
pub use slug::RandomSlugs;
pub use state::JsonFileStore;

pub mod status;
pub mod types;

pub use status::{ADDRESS_PENDING, STATUS_COMPLETE, STATUS_DEPLOYING, STATUS_PROVISIONING};
pub use types::*;

//! Human-readable status strings returned by the HTTP API.
//!
//! These are part of the wire contract: existing dashboards match on the
//! exact text, so they must not be reworded.

/// `status` field of a successful `POST /deploy` response.
pub const STATUS_DEPLOYING: &str = "Deploying";

/// `status` field of `GET /status` once the instance has a public address.
pub const STATUS_COMPLETE: &str = "Deployment Complete!";

/// `status` field of `GET /status` while the address is still unassigned.
pub const STATUS_PROVISIONING: &str = "Provisioning";

/// Placeholder sent in place of an address while provisioning is in progress.
pub const ADDRESS_PENDING: &str = "IP address yet to be assigned";

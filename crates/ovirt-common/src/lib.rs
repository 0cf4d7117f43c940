//! Common types for the oVirt machine controller: the Machine record, errors,
//! configuration and tracing setup

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Annotation key on a live Machine holding its encoded instance status
pub const INSTANCE_STATUS_ANNOTATION_KEY: &str = "instance-status";

/// Namespace where the machine API keeps Machine resources
pub const DEFAULT_MACHINE_API_NAMESPACE: &str = "openshift-machine-api";

/// Field manager recorded on Machine updates
pub const DEFAULT_FIELD_MANAGER: &str = "ovirt-machine-controller";

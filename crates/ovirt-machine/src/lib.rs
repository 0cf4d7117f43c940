//! Instance-status persistence for oVirt-backed Machines
//!
//! The last observed state of a VM is stored on its Machine as an encoded
//! copy of the Machine itself, under the `instance-status` annotation.
//!
//! - [`codec`] - Encoding and decoding the annotation value
//! - [`registry`] - Where live Machines are fetched from and written to
//! - [`snapshot`] - The instance status snapshot type
//! - [`status`] - Get/set of the status on a named Machine

#![deny(missing_docs)]

pub mod codec;
pub mod registry;
pub mod snapshot;
pub mod status;

pub use codec::SnapshotCodec;
pub use registry::{KubeMachineRegistry, MachineRegistry};
pub use snapshot::InstanceStatus;
pub use status::StatusStore;

//! Instance status snapshot
//!
//! The last observed state of a VM is stored as a full copy of its Machine.
//! Keeping it a distinct type from the live record makes it explicit which
//! side of an update a value belongs to.

use kube::ResourceExt;
use ovirt_common::crd::Machine;
use ovirt_common::INSTANCE_STATUS_ANNOTATION_KEY;

/// Point-in-time copy of a Machine, stored on the live Machine as an annotation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceStatus(Machine);

impl InstanceStatus {
    /// Wrap a Machine as an instance status snapshot
    pub fn new(machine: Machine) -> Self {
        Self(machine)
    }

    /// The recorded Machine
    pub fn machine(&self) -> &Machine {
        &self.0
    }

    /// Unwrap into the recorded Machine
    pub fn into_machine(self) -> Machine {
        self.0
    }

    /// Name of the recorded Machine
    pub fn name(&self) -> String {
        self.0.name_any()
    }

    /// Whether the snapshot carries no nested instance status
    pub fn is_sanitized(&self) -> bool {
        self.0
            .annotations()
            .get(INSTANCE_STATUS_ANNOTATION_KEY)
            .map_or(true, |v| v.is_empty())
    }

    /// Return a copy with its own instance-status annotation set to empty
    ///
    /// The annotation map is created when missing, so a snapshot with no
    /// annotations and one with an empty slot serialize identically.
    pub fn sanitized(&self) -> Machine {
        let mut machine = self.0.clone();
        machine
            .annotations_mut()
            .insert(INSTANCE_STATUS_ANNOTATION_KEY.to_string(), String::new());
        machine
    }
}

impl From<Machine> for InstanceStatus {
    fn from(machine: Machine) -> Self {
        Self::new(machine)
    }
}

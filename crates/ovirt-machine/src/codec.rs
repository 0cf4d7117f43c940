//! Snapshot codec
//!
//! Converts an [`InstanceStatus`] to and from the JSON text stored in the
//! `instance-status` annotation. The encoded text is self-describing: it
//! carries the `apiVersion` and `kind` the codec was built with, and decoding
//! rejects text claiming a different identity.

use std::collections::BTreeMap;

use kube::api::GroupVersionKind;
use kube::ResourceExt;
use ovirt_common::crd::{Machine, MACHINE_GROUP, MACHINE_KIND, MACHINE_VERSION};
use ovirt_common::{Error, Result, INSTANCE_STATUS_ANNOTATION_KEY};
use serde_json::Value;

use crate::snapshot::InstanceStatus;

/// Encodes and decodes instance status snapshots for one resource identity
#[derive(Clone, Debug)]
pub struct SnapshotCodec {
    gvk: GroupVersionKind,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self::for_machine()
    }
}

impl SnapshotCodec {
    /// Create a codec for the given identity
    pub fn new(gvk: GroupVersionKind) -> Self {
        Self { gvk }
    }

    /// Codec for `machine.openshift.io/v1beta1` Machines
    pub fn for_machine() -> Self {
        Self::new(GroupVersionKind::gvk(
            MACHINE_GROUP,
            MACHINE_VERSION,
            MACHINE_KIND,
        ))
    }

    /// Identity written into and expected from encoded text
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    /// Decode an annotation value
    ///
    /// Empty text means no status has been recorded yet and yields `None`.
    pub fn decode(&self, text: &str) -> Result<Option<InstanceStatus>> {
        if text.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(text).map_err(|e| Error::decode(e.to_string()))?;
        self.check_identity(&value)?;

        let machine: Machine =
            serde_json::from_value(value).map_err(|e| Error::decode(e.to_string()))?;
        Ok(Some(InstanceStatus::new(machine)))
    }

    /// Decode the instance status held in an annotation map, if any
    pub fn decode_annotations(
        &self,
        annotations: Option<&BTreeMap<String, String>>,
    ) -> Result<Option<InstanceStatus>> {
        match annotations.and_then(|a| a.get(INSTANCE_STATUS_ANNOTATION_KEY)) {
            Some(text) => self.decode(text),
            None => Ok(None),
        }
    }

    /// Encode a snapshot to annotation text
    ///
    /// The snapshot's own `instance-status` annotation is cleared on a copy
    /// first, so stored text never nests another status.
    pub fn encode(&self, status: &InstanceStatus) -> Result<String> {
        let machine = status.sanitized();

        let mut value = serde_json::to_value(&machine).map_err(|e| Error::encode(e.to_string()))?;
        let Some(object) = value.as_object_mut() else {
            return Err(Error::encode("machine did not serialize to a JSON object"));
        };
        object.insert(
            "apiVersion".to_string(),
            Value::String(self.api_version()),
        );
        object.insert("kind".to_string(), Value::String(self.gvk.kind.clone()));

        serde_json::to_string(&value).map_err(|e| Error::encode(e.to_string()))
    }

    /// Read the instance status recorded on a fetched Machine
    pub fn machine_instance_status(&self, machine: &Machine) -> Result<Option<InstanceStatus>> {
        self.decode_annotations(machine.metadata.annotations.as_ref())
    }

    /// Record `status` on `machine`, returning the updated Machine
    pub fn set_machine_instance_status(
        &self,
        mut machine: Machine,
        status: &InstanceStatus,
    ) -> Result<Machine> {
        let encoded = self.encode(status)?;
        machine
            .annotations_mut()
            .insert(INSTANCE_STATUS_ANNOTATION_KEY.to_string(), encoded);
        Ok(machine)
    }

    fn api_version(&self) -> String {
        if self.gvk.group.is_empty() {
            self.gvk.version.clone()
        } else {
            format!("{}/{}", self.gvk.group, self.gvk.version)
        }
    }

    fn check_identity(&self, value: &Value) -> Result<()> {
        let Some(object) = value.as_object() else {
            return Err(Error::decode("instance status is not a JSON object"));
        };

        // Missing identity fields default to the codec's own
        let expected_api_version = self.api_version();
        match object.get("apiVersion") {
            None => {}
            Some(Value::String(v)) if *v == expected_api_version => {}
            Some(other) => {
                return Err(Error::decode(format!(
                    "unexpected apiVersion {}, expected {}",
                    other, expected_api_version
                )))
            }
        }
        match object.get("kind") {
            None => {}
            Some(Value::String(v)) if *v == self.gvk.kind => {}
            Some(other) => {
                return Err(Error::decode(format!(
                    "unexpected kind {}, expected {}",
                    other, self.gvk.kind
                )))
            }
        }
        Ok(())
    }
}

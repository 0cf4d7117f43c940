//! Machine resource record (`machine.openshift.io/v1beta1`)
//!
//! The Machine CRD is owned by the machine API operator; this is the subset
//! of its shape the oVirt controller reads. Provider payloads and any spec or
//! status field not modelled here are kept as raw JSON, so a snapshot carries
//! the whole record.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the Machine resource
pub const MACHINE_GROUP: &str = "machine.openshift.io";

/// API version of the Machine resource
pub const MACHINE_VERSION: &str = "v1beta1";

/// Kind of the Machine resource
pub const MACHINE_KIND: &str = "Machine";

/// Spec for a Machine: one node backed by one oVirt VM
///
/// Example:
/// ```yaml
/// apiVersion: machine.openshift.io/v1beta1
/// kind: Machine
/// metadata:
///   name: worker-0
///   namespace: openshift-machine-api
/// spec:
///   providerID: ovirt://4a1c0c3e-9a2f-4a57-9b1c-0f5b3c2d1e10
///   providerSpec:
///     value:
///       template_name: rhcos-template
///       cluster_id: 2b3f
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "machine.openshift.io",
    version = "v1beta1",
    kind = "Machine",
    namespaced,
    status = "MachineStatus",
    derive = "Default",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"ProviderID","type":"string","jsonPath":".spec.providerID"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Labels and annotations propagated to the Node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,

    /// Taints registered on the Node once it joins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<MachineTaint>,

    /// Provider-specific machine configuration
    #[serde(default)]
    pub provider_spec: ProviderSpec,

    /// Identifier of the VM as reported by the cloud provider
    #[serde(
        default,
        rename = "providerID",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_id: Option<String>,

    /// Spec fields not modelled above (lifecycleHooks, authoritativeAPI, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Metadata to apply to the Node backing this Machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Node labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Node annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A taint applied to the Node
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineTaint {
    /// Taint key
    pub key: String,

    /// Taint value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// NoSchedule, PreferNoSchedule or NoExecute
    pub effect: String,
}

/// Opaque provider configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Raw provider payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Observed state of a Machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    /// Node this Machine became
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_ref: Option<NodeReference>,

    /// RFC 3339 time of the last status update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Machine-readable terminal error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// Human-readable terminal error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Raw provider status payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<serde_json::Value>,

    /// Addresses assigned to the VM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<MachineAddress>,

    /// Lifecycle phase (Provisioning, Provisioned, Running, Deleting, Failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Status fields not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Reference to the Node backing a Machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeReference {
    /// Node name
    pub name: String,

    /// Node UID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// An address assigned to a Machine
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineAddress {
    /// Address type (InternalIP, ExternalIP, Hostname, ...)
    #[serde(rename = "type")]
    pub address_type: String,

    /// The address itself
    pub address: String,
}

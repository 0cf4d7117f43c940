//! Machine registry
//!
//! The store the live Machine records are read from and written back to.
//! In production this is the Kubernetes API server; tests substitute an
//! in-memory registry or a mock.

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use ovirt_common::crd::Machine;
use ovirt_common::{Error, Result};
use serde_json::Value;
use tracing::trace;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting Machine get/update operations
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MachineRegistry: Send + Sync {
    /// Get a Machine by namespace and name
    ///
    /// Returns `Ok(None)` when the Machine does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Machine>>;

    /// Persist the annotations of a fetched Machine
    ///
    /// Spec and status are left as the registry holds them. The record's
    /// `resourceVersion` guards against concurrent writers.
    async fn update(&self, machine: &Machine) -> Result<Machine>;
}

/// Real Kubernetes registry implementation
pub struct KubeMachineRegistry {
    client: Client,
    field_manager: String,
}

impl KubeMachineRegistry {
    /// Create a registry wrapping the given kube Client
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Create a registry from the inferred kubeconfig or in-cluster config
    pub async fn try_default(field_manager: impl Into<String>) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, field_manager))
    }

    fn patch_params(&self) -> PatchParams {
        PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

/// Merge patch carrying only the Machine's annotations and resourceVersion
///
/// Fields the `Machine` type does not model never appear in the body, so the
/// server keeps them untouched.
pub fn annotation_patch(machine: &Machine) -> Value {
    let mut metadata = serde_json::Map::new();
    if let Some(rv) = machine.resource_version() {
        metadata.insert("resourceVersion".to_string(), Value::String(rv));
    }
    let annotations = machine
        .annotations()
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    metadata.insert("annotations".to_string(), Value::Object(annotations));
    serde_json::json!({ "metadata": metadata })
}

#[async_trait]
impl MachineRegistry for KubeMachineRegistry {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Machine>> {
        let api: Api<Machine> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| Error::lookup_from_kube(namespace, name, &e))
    }

    async fn update(&self, machine: &Machine) -> Result<Machine> {
        let namespace = machine.namespace().unwrap_or_default();
        let Some(name) = machine.metadata.name.clone() else {
            return Err(Error::persist(namespace, "", "machine has no name"));
        };
        if namespace.is_empty() {
            return Err(Error::persist(namespace, name, "machine has no namespace"));
        }

        trace!(namespace = %namespace, name = %name, "patching machine annotations");
        let api: Api<Machine> = Api::namespaced(self.client.clone(), &namespace);
        api.patch(
            &name,
            &self.patch_params(),
            &Patch::Merge(&annotation_patch(machine)),
        )
        .await
        .map_err(|e| Error::persist_from_kube(&namespace, &name, &e))
    }
}

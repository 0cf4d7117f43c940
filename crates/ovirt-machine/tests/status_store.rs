//! Integration tests for instance status persistence
//!
//! These tests walk a Machine through its lifecycle against an in-memory
//! registry: absent, created without status, updated with observed state,
//! and deleted while a reconcile is still in flight.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use ovirt_common::crd::{Machine, MachineAddress, MachineSpec, MachineStatus, ProviderSpec};
use ovirt_common::{Error, Result, INSTANCE_STATUS_ANNOTATION_KEY};
use ovirt_machine::{InstanceStatus, MachineRegistry, SnapshotCodec, StatusStore};

const NS: &str = "openshift-machine-api";

// =============================================================================
// In-memory registry
// =============================================================================

/// Registry keeping Machines in a map, bumping resourceVersion on update
#[derive(Default)]
struct MemoryRegistry {
    machines: Mutex<BTreeMap<(String, String), Machine>>,
    updates: Mutex<u32>,
}

impl MemoryRegistry {
    fn insert(&self, machine: Machine) {
        let key = (machine.namespace().unwrap_or_default(), machine.name_any());
        self.machines.lock().unwrap().insert(key, machine);
    }

    fn remove(&self, name: &str) {
        self.machines
            .lock()
            .unwrap()
            .remove(&(NS.to_string(), name.to_string()));
    }

    fn stored(&self, name: &str) -> Option<Machine> {
        self.machines
            .lock()
            .unwrap()
            .get(&(NS.to_string(), name.to_string()))
            .cloned()
    }

    fn update_count(&self) -> u32 {
        *self.updates.lock().unwrap()
    }
}

#[async_trait]
impl MachineRegistry for MemoryRegistry {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Machine>> {
        Ok(self
            .machines
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn update(&self, machine: &Machine) -> Result<Machine> {
        let key = (machine.namespace().unwrap_or_default(), machine.name_any());
        let mut machines = self.machines.lock().unwrap();
        let Some(existing) = machines.get(&key) else {
            return Err(Error::persist(&key.0, &key.1, "not found"));
        };
        if existing.resource_version() != machine.resource_version() {
            return Err(Error::persist(&key.0, &key.1, "resourceVersion conflict"));
        }

        let next: u64 = existing
            .resource_version()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
            + 1;
        let mut updated = machine.clone();
        updated.metadata.resource_version = Some(next.to_string());
        machines.insert(key, updated.clone());
        *self.updates.lock().unwrap() += 1;
        Ok(updated)
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

fn new_machine(name: &str) -> Machine {
    Machine {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NS.to_string()),
            resource_version: Some("1".to_string()),
            annotations: Some(BTreeMap::new()),
            ..Default::default()
        },
        spec: MachineSpec {
            provider_spec: ProviderSpec {
                value: Some(serde_json::json!({"template_name": "rhcos-4.6", "cpu": 4})),
            },
            ..Default::default()
        },
        status: None,
    }
}

/// The Machine as the actuator observed it after the VM came up
fn observed(name: &str) -> Machine {
    let mut machine = new_machine(name);
    machine.spec.provider_id = Some("ovirt://0b9e4ab2-6d3c-4b2a-a5f4-7c1e3f8a1d22".to_string());
    machine.status = Some(MachineStatus {
        phase: Some("Running".to_string()),
        addresses: vec![MachineAddress {
            address_type: "InternalIP".to_string(),
            address: "10.35.1.14".to_string(),
        }],
        ..Default::default()
    });
    machine
}

fn store_over(registry: Arc<MemoryRegistry>) -> StatusStore {
    StatusStore::new(registry, SnapshotCodec::for_machine(), NS)
}

// =============================================================================
// Lifecycle Stories
// =============================================================================

/// Story: status written for node-1 is read back without nested status
#[tokio::test]
async fn story_set_then_get_status() {
    let registry = Arc::new(MemoryRegistry::default());
    registry.insert(new_machine("node-1"));
    let store = store_over(registry.clone());

    // Freshly created Machine has no status yet
    assert!(store.get_status("node-1").await.unwrap().is_none());

    let snapshot = InstanceStatus::new(observed("node-1"));
    store.set_status("node-1", &snapshot).await.unwrap();

    let stored = registry.stored("node-1").unwrap();
    assert_eq!(
        stored.annotations()[INSTANCE_STATUS_ANNOTATION_KEY],
        SnapshotCodec::for_machine().encode(&snapshot).unwrap()
    );
    // Only the annotation changed on the live record
    assert!(stored.spec.provider_id.is_none());
    assert!(stored.status.is_none());

    let read = store.get_status("node-1").await.unwrap().expect("status");
    let mut expected = observed("node-1");
    expected
        .annotations_mut()
        .insert(INSTANCE_STATUS_ANNOTATION_KEY.to_string(), String::new());
    assert_eq!(read.machine(), &expected);
}

/// Story: repeated updates replace the status instead of nesting it
#[tokio::test]
async fn story_status_does_not_grow_across_updates() {
    let registry = Arc::new(MemoryRegistry::default());
    registry.insert(new_machine("node-2"));
    let store = store_over(registry.clone());

    store
        .update_instance_status(&observed("node-2"))
        .await
        .unwrap();
    let first = registry.stored("node-2").unwrap();
    let first_len = first.annotations()[INSTANCE_STATUS_ANNOTATION_KEY].len();

    // The caller passes back the live record, which now carries a status
    let live = registry.stored("node-2").unwrap();
    store.update_instance_status(&live).await.unwrap();
    store.update_instance_status(&live).await.unwrap();

    let status = store
        .instance_status(&live)
        .await
        .unwrap()
        .expect("status");
    assert!(status.is_sanitized());
    assert_eq!(registry.update_count(), 3);

    let last = registry.stored("node-2").unwrap();
    let last_len = last.annotations()[INSTANCE_STATUS_ANNOTATION_KEY].len();
    assert!(last_len < first_len * 2, "status nested: {} -> {}", first_len, last_len);
}

/// Story: a Machine deleted mid-reconcile
///
/// Reading reports no status; writing fails and leaves nothing behind.
#[tokio::test]
async fn story_deleted_machine() {
    let registry = Arc::new(MemoryRegistry::default());
    registry.insert(new_machine("node-3"));
    let store = store_over(registry.clone());
    registry.remove("node-3");

    assert!(store.get_status("node-3").await.unwrap().is_none());

    let err = store
        .set_status("node-3", &InstanceStatus::new(observed("node-3")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(err
        .to_string()
        .contains("cannot update status for a deleted resource"));
    assert_eq!(registry.update_count(), 0);
    assert!(registry.stored("node-3").is_none());
}

/// Story: a corrupted annotation surfaces as a decode error
#[tokio::test]
async fn story_corrupt_annotation() {
    let registry = Arc::new(MemoryRegistry::default());
    let mut machine = new_machine("node-4");
    machine.annotations_mut().insert(
        INSTANCE_STATUS_ANNOTATION_KEY.to_string(),
        "{not json".to_string(),
    );
    registry.insert(machine);
    let store = store_over(registry.clone());

    let err = store.get_status("node-4").await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert!(!err.is_retryable());

    // Writing a fresh status repairs it
    store
        .set_status("node-4", &InstanceStatus::new(observed("node-4")))
        .await
        .unwrap();
    assert!(store.get_status("node-4").await.unwrap().is_some());
}

/// Story: Machines in other namespaces are invisible to the store
#[tokio::test]
async fn story_namespace_scoping() {
    let registry = Arc::new(MemoryRegistry::default());
    let mut elsewhere = new_machine("node-5");
    elsewhere.metadata.namespace = Some("default".to_string());
    registry.insert(elsewhere);
    let store = store_over(registry.clone());

    assert!(store.get_status("node-5").await.unwrap().is_none());
    let err = store
        .set_status("node-5", &InstanceStatus::new(observed("node-5")))
        .await
        .unwrap_err();
    assert_eq!(err.resource(), Some((NS, "node-5")));
}

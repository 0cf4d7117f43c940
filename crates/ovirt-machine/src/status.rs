//! Instance status store
//!
//! Long term the current instance state should be read from the
//! virtualization platform directly. Until then the last observed state is
//! kept on the Machine itself, under the `instance-status` annotation: the
//! Machine is the instance spec and the annotation is the instance status.
//!
//! Every call re-fetches the live Machine. Nothing is cached and nothing is
//! retried; two concurrent `set_status` calls for one name are arbitrated by
//! the registry's optimistic concurrency.

use std::sync::Arc;

use kube::{Client, ResourceExt};
use ovirt_common::config::StatusStoreConfig;
use ovirt_common::crd::Machine;
use ovirt_common::{Error, Result};
use tracing::{debug, error, info, instrument};

use crate::codec::SnapshotCodec;
use crate::registry::{KubeMachineRegistry, MachineRegistry};
use crate::snapshot::InstanceStatus;

/// Reads and writes instance status snapshots on live Machines
pub struct StatusStore {
    registry: Arc<dyn MachineRegistry>,
    codec: SnapshotCodec,
    namespace: String,
}

impl StatusStore {
    /// Create a store over the given registry and codec
    pub fn new(
        registry: Arc<dyn MachineRegistry>,
        codec: SnapshotCodec,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            codec,
            namespace: namespace.into(),
        }
    }

    /// Create a store using the Machine codec and the configured namespace
    pub fn from_config(
        registry: Arc<dyn MachineRegistry>,
        config: &StatusStoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            registry,
            SnapshotCodec::for_machine(),
            config.namespace.clone(),
        ))
    }

    /// Create a store backed by the Kubernetes API server
    pub fn for_client(client: Client, config: &StatusStoreConfig) -> Result<Self> {
        let registry = KubeMachineRegistry::new(client, config.field_manager.clone());
        Self::from_config(Arc::new(registry), config)
    }

    /// Create a store backed by the inferred cluster config
    ///
    /// Fails with [`Error::Kube`] when no kubeconfig or in-cluster
    /// environment is available.
    pub async fn for_cluster(config: &StatusStoreConfig) -> Result<Self> {
        config.validate()?;
        let registry = KubeMachineRegistry::try_default(config.field_manager.clone()).await?;
        Self::from_config(Arc::new(registry), config)
    }

    /// Namespace Machines are looked up in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Codec used for the annotation value
    pub fn codec(&self) -> &SnapshotCodec {
        &self.codec
    }

    /// Get the instance status recorded on the Machine named `name`
    ///
    /// A Machine that does not exist yet (bootstrapping) or any more
    /// (deleted) has no status. Registry errors are returned as-is.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn get_status(&self, name: &str) -> Result<Option<InstanceStatus>> {
        let current = match self.registry.get(&self.namespace, name).await {
            Ok(current) => current,
            Err(e) => {
                error!(error = %e, "failed to look up machine");
                return Err(e);
            }
        };

        let Some(current) = current else {
            info!("machine not found, no instance status");
            return Ok(None);
        };

        debug!(
            resource_version = %current.resource_version().unwrap_or_default(),
            "found machine"
        );
        self.codec.machine_instance_status(&current)
    }

    /// Record `status` on the live Machine named `name`
    ///
    /// Fails with [`Error::NotFound`] when the Machine cannot be fetched,
    /// without writing anything.
    #[instrument(skip(self, status), fields(namespace = %self.namespace))]
    pub async fn set_status(&self, name: &str, status: &InstanceStatus) -> Result<()> {
        let current = match self.registry.get(&self.namespace, name).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                info!("machine already deleted, dropping instance status");
                return Err(Error::not_found(&self.namespace, name));
            }
            Err(e) => {
                error!(error = %e, "failed to look up machine");
                return Err(Error::not_found_after(&self.namespace, name, e.to_string()));
            }
        };

        let updated = self.codec.set_machine_instance_status(current, status)?;
        self.registry.update(&updated).await?;

        info!("instance status updated");
        Ok(())
    }

    /// Get the instance status for the Machine the caller holds
    ///
    /// The Machine is looked up again by name; the copy passed in is only
    /// used for its name.
    pub async fn instance_status(&self, machine: &Machine) -> Result<Option<InstanceStatus>> {
        self.get_status(&machine.name_any()).await
    }

    /// Record `machine` as the instance status of its own live record
    pub async fn update_instance_status(&self, machine: &Machine) -> Result<()> {
        let status = InstanceStatus::new(machine.clone());
        self.set_status(&machine.name_any(), &status).await
    }
}

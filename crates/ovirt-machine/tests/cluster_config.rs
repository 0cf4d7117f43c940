//! Client inference without any cluster configuration
//!
//! Kept in its own test binary because it rewrites process environment.

use ovirt_common::config::StatusStoreConfig;
use ovirt_common::Error;
use ovirt_machine::{KubeMachineRegistry, StatusStore};

#[tokio::test]
async fn missing_cluster_config_is_a_kube_error() {
    std::env::set_var("KUBECONFIG", "/nonexistent/ovirt-machine/kubeconfig");
    std::env::remove_var("KUBERNETES_SERVICE_HOST");
    std::env::remove_var("KUBERNETES_SERVICE_PORT");

    let err = KubeMachineRegistry::try_default("ovirt-machine-controller")
        .await
        .err()
        .expect("no cluster config available");
    assert!(matches!(err, Error::Kube { .. }));
    assert!(err.to_string().starts_with("kubernetes error"));

    let config = StatusStoreConfig::from_lookup(|_| None);
    let result = StatusStore::for_cluster(&config).await;
    assert!(matches!(result, Err(Error::Kube { .. })));
}

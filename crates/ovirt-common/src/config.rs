//! Configuration for the instance-status store

use crate::{Error, Result, DEFAULT_FIELD_MANAGER, DEFAULT_MACHINE_API_NAMESPACE};

/// Environment variable overriding the Machine namespace
pub const NAMESPACE_ENV: &str = "MACHINE_API_NAMESPACE";

/// Environment variable overriding the field manager used on updates
pub const FIELD_MANAGER_ENV: &str = "STATUS_FIELD_MANAGER";

/// Configuration for reading and writing instance status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusStoreConfig {
    /// Namespace the Machines live in (e.g., "openshift-machine-api")
    pub namespace: String,

    /// Field manager recorded on Machine updates
    pub field_manager: String,
}

impl Default for StatusStoreConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl StatusStoreConfig {
    /// Build a config from a key lookup, falling back to the defaults
    ///
    /// `Default` uses the process environment; tests pass a closure.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            namespace: lookup(NAMESPACE_ENV)
                .unwrap_or_else(|| DEFAULT_MACHINE_API_NAMESPACE.to_string()),
            field_manager: lookup(FIELD_MANAGER_ENV)
                .unwrap_or_else(|| DEFAULT_FIELD_MANAGER.to_string()),
        }
    }

    /// Use a different namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Reject values the API server would refuse
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::config("namespace", "must not be empty"));
        }
        if self.field_manager.trim().is_empty() {
            return Err(Error::config("field_manager", "must not be empty"));
        }
        Ok(())
    }
}

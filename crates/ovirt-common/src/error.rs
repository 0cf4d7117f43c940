//! Error types for the oVirt machine controller
//!
//! Errors are structured with fields to aid debugging in production.
//! Registry failures carry the namespace and name of the Machine involved
//! and, when the API server answered, its HTTP status code.

use thiserror::Error;

/// Main error type for instance-status operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Fetching a Machine from the registry failed
    #[error("lookup failed for machine {namespace}/{name}: {message}")]
    Lookup {
        /// Namespace that was queried
        namespace: String,
        /// Name of the Machine
        name: String,
        /// Description of what failed
        message: String,
        /// HTTP status code returned by the API server, if any
        code: Option<u16>,
    },

    /// The Machine is gone (or could not be fetched) when an update was requested
    #[error("cannot update status for a deleted resource: machine {namespace}/{name}")]
    NotFound {
        /// Namespace that was queried
        namespace: String,
        /// Name of the Machine
        name: String,
        /// Lookup failure that led to this error, if the fetch itself failed
        cause: Option<String>,
    },

    /// Stored instance status could not be parsed
    #[error("decoding failure: {message}")]
    Decode {
        /// Description of the parse failure
        message: String,
    },

    /// Instance status could not be serialized
    #[error("encoding failure: {message}")]
    Encode {
        /// Description of the serialization failure
        message: String,
    },

    /// Writing the updated Machine back to the registry failed
    #[error("failed to persist machine {namespace}/{name}: {message}")]
    Persist {
        /// Namespace of the Machine
        namespace: String,
        /// Name of the Machine
        name: String,
        /// Description of what failed
        message: String,
        /// HTTP status code returned by the API server, if any
        code: Option<u16>,
    },

    /// Invalid configuration value
    #[error("invalid configuration [{field}]: {message}")]
    Config {
        /// Configuration field (e.g., "namespace")
        field: String,
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a lookup error for the given Machine
    pub fn lookup(
        namespace: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Lookup {
            namespace: namespace.into(),
            name: name.into(),
            message: msg.into(),
            code: None,
        }
    }

    /// Create a lookup error from a kube-rs error, keeping the API status code
    pub fn lookup_from_kube(
        namespace: impl Into<String>,
        name: impl Into<String>,
        source: &kube::Error,
    ) -> Self {
        Self::Lookup {
            namespace: namespace.into(),
            name: name.into(),
            message: source.to_string(),
            code: api_status_code(source),
        }
    }

    /// Create a not-found error for a Machine that is absent
    pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
            cause: None,
        }
    }

    /// Create a not-found error for a Machine whose lookup failed
    pub fn not_found_after(
        namespace: impl Into<String>,
        name: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
            cause: Some(cause.into()),
        }
    }

    /// Create a decode error with the given message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create an encode error with the given message
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    /// Create a persistence error for the given Machine
    pub fn persist(
        namespace: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Persist {
            namespace: namespace.into(),
            name: name.into(),
            message: msg.into(),
            code: None,
        }
    }

    /// Create a persistence error from a kube-rs error, keeping the API status code
    pub fn persist_from_kube(
        namespace: impl Into<String>,
        name: impl Into<String>,
        source: &kube::Error,
    ) -> Self {
        Self::Persist {
            namespace: namespace.into(),
            name: name.into(),
            message: source.to_string(),
            code: api_status_code(source),
        }
    }

    /// Create a configuration error for the given field
    pub fn config(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Decode and encode errors mean corrupt or unrepresentable data and
    /// need a human. A missing Machine will not come back by retrying.
    /// Registry failures are retryable unless the API server rejected the
    /// request outright; write conflicts (409) are always retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code) && ae.code != 409
            ),
            Error::Lookup { code, .. } | Error::Persist { code, .. } => match code {
                Some(409) => true,
                Some(c) => !(400..500).contains(c),
                None => true,
            },
            Error::NotFound { .. } => false,
            Error::Decode { .. } => false,
            Error::Encode { .. } => false,
            Error::Config { .. } => false,
        }
    }

    /// Get the `(namespace, name)` of the Machine this error concerns, if any
    pub fn resource(&self) -> Option<(&str, &str)> {
        match self {
            Error::Lookup {
                namespace, name, ..
            }
            | Error::NotFound {
                namespace, name, ..
            }
            | Error::Persist {
                namespace, name, ..
            } => Some((namespace.as_str(), name.as_str())),
            _ => None,
        }
    }
}

fn api_status_code(source: &kube::Error) -> Option<u16> {
    match source {
        kube::Error::Api(ae) => Some(ae.code),
        _ => None,
    }
}

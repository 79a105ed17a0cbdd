use common::ObjectKind;
use thiserror::Error;

/// Errors from the cluster collaborator (get / patch / watch)
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Watch error on {kind}: {message}")]
    Watch { kind: ObjectKind, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unexpected {kind} object: {message}")]
    UnexpectedObject { kind: ObjectKind, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Worth retrying: network trouble, throttling, conflicts and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Kube(kube::Error::Api(response)) => {
                response.code == 409 || response.code == 429 || response.code >= 500
            }
            ClientError::Kube(_) => true,
            ClientError::Watch { .. } => true,
            ClientError::Timeout(_) => true,
            ClientError::UnexpectedObject { .. } => false,
            ClientError::Serialization(_) => false,
        }
    }
}

/// Gatewarden Control Plane Errors
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Election invariant violated: {0}")]
    ElectionInvariant(String),

    #[error("Event funnel closed")]
    FunnelClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ControllerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ControllerError::Client(e) if e.is_transient())
    }
}

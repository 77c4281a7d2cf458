use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes reported by the remote collection backend. The original
/// transport detail is reduced to a message; callers branch on the class.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum BackendError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a user write intent at the view-model boundary. Validation
/// failures cause no observable state change; callers may ignore them, but
/// the failure stays testable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("item name must not be empty")]
    EmptyName,
    #[error("item quantity must not be empty")]
    EmptyQuantity,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

//! # Pool Error Types
//!
//! All errors that can occur while managing pooled resources.
//!
//! Memory exhaustion is deliberately absent: running out of budget or capacity
//! is an expected condition and surfaces as `Ok(None)` from `acquire`.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Errors that can occur in the pooling core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No pool is registered under this name.
    #[error("unknown pool: {0}")]
    UnknownPool(String),

    /// A pool with this name already exists.
    #[error("pool already exists: {0}")]
    PoolAlreadyExists(String),

    /// The pool configuration violates an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A handle was released to a pool that does not own it.
    #[error("resource {resource} is not owned by pool {pool}")]
    ResourceNotOwned {
        /// Pool the handle was released to.
        pool: String,
        /// Id of the offending resource.
        resource: String,
    },

    /// The requested kind does not match the pool's kind.
    #[error("pool {pool} holds {expected} resources, requested {requested}")]
    KindMismatch {
        /// Pool that was asked.
        pool: String,
        /// Kind the pool was configured with.
        expected: ResourceKind,
        /// Kind the caller asked for.
        requested: ResourceKind,
    },

    /// The collaborator failed to construct a payload.
    #[error("construction of {kind} failed: {reason}")]
    ConstructionFailed {
        /// Kind that was being built.
        kind: ResourceKind,
        /// Collaborator's explanation.
        reason: String,
    },

    /// Resetting a resource failed. Never surfaced to `release` callers.
    #[error("cleanup of {resource} failed: {reason}")]
    CleanupFailed {
        /// Id of the resource being cleaned.
        resource: String,
        /// Why cleanup failed.
        reason: String,
    },

    /// The engine is being torn down.
    #[error("engine shutting down")]
    ShuttingDown,

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for pooling operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Error reported by an external collaborator (constructor or cleanup hook).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    /// Creates a collaborator error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

//! Shared error model.

use thiserror::Error;

/// Result type used by domain validation.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type returned by store implementations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// malformed identifiers). Persistence failures are [`StoreError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A currency code was not recognized.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Failure reported by a customer or invoice store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The row targeted by a write does not exist.
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: i64 },

    /// A persisted value could not be mapped back into a domain type.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// The backend (database, connection pool, lock) failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn missing(entity: &'static str, id: i64) -> Self {
        Self::Missing { entity, id }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

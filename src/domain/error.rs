//! Domain-level errors (no external dependencies)

use generational_arena::Index;
use thiserror::Error;

/// Domain errors represent violations of the tree model.
/// Resolution outcomes such as "not ready" are values, not errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found in tree: {0:?}")]
    NodeNotFound(Index),

    #[error("no node at path: {0}")]
    PathNotFound(String),

    #[error("tree is empty")]
    EmptyTree,

    #[error("invalid tree snapshot: {message}")]
    InvalidSnapshot { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

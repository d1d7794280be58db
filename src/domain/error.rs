//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent violations of the entities directory contract.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("entities directory not found: {0}")]
    EntitiesDirNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

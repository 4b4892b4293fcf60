//! Error types for prism-quorum.

use prism_spectrum::Band;
use thiserror::Error;

/// Errors from registry mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A validator id was registered twice.
    #[error("validator {0:?} is already registered")]
    DuplicateValidator(String),
}

/// Errors from quorum selection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Fewer distinct bands have validators than the quorum requires.
    /// `missing` names the bands with no registered validator.
    #[error("insufficient band diversity: required {required}, available {available}, missing {missing:?}")]
    InsufficientDiversity {
        required: usize,
        available: usize,
        missing: Vec<Band>,
    },
}

//! Append-only message DAG with fingerprint chaining.
//!
//! Messages form a directed acyclic graph: each message names zero or more
//! already-admitted parents, and carries a **fingerprint** that chains it to
//! them. Fingerprints are Blake3 hashes over the message's band-derived wave
//! parameters, its content hash, and every parent fingerprint in declared
//! order - so a message's position in the DAG is fixed by its fingerprint
//! and cannot be rewritten after admission.
//!
//! # Pieces
//!
//! - [`MessageId`] / [`Fingerprint`] - 32-byte Blake3 newtypes, hex on the
//!   wire.
//! - [`Message`] - the immutable admitted record.
//! - [`MessageStore`] - the persistence interface the engine consumes, with
//!   [`MemoryStore`] as the in-process reference implementation.
//! - [`validate_and_link`] - parent validation plus fingerprint derivation
//!   for a candidate message.

mod ids;
mod linker;
mod message;
mod store;

pub use ids::{Fingerprint, MessageId};
pub use linker::{derive_message_id, validate_and_link};
pub use message::Message;
pub use store::{MemoryStore, MessageStore, StoreError};

use thiserror::Error;

/// Errors from DAG validation and linking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DagError {
    /// A declared parent is not in the store. Validation short-circuits on
    /// the first miss.
    #[error("missing parent {0}")]
    MissingParent(MessageId),

    /// A candidate listed its own id among its parents.
    #[error("message {0} cannot be its own parent")]
    SelfReference(MessageId),

    /// Audit mode: the recomputed fingerprint does not match the expected
    /// value supplied by the caller.
    #[error("fingerprint mismatch: expected {expected}, computed {actual}")]
    TamperDetected {
        expected: Fingerprint,
        actual: Fingerprint,
    },

    /// The backing store failed while reading parents.
    #[error(transparent)]
    Store(#[from] StoreError),
}

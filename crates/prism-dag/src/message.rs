//! The admitted message record.

use prism_spectrum::{Band, Credits};
use serde::{Deserialize, Serialize};

use crate::ids::{Fingerprint, MessageId};

/// An admitted message.
///
/// Constructed once by the admission engine and appended to the store;
/// never mutated afterward. The DAG is append-only: no deletion, no update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id, derived at admission.
    pub id: MessageId,

    /// Sending account.
    pub sender: String,

    /// Receiving account.
    pub recipient: String,

    /// Payload. Size in bytes drives cost.
    pub content: String,

    /// Band the sender chose at submission.
    pub band: Band,

    /// Parents this message links to, deduplicated, in declared order.
    /// Empty for genesis messages.
    pub parent_ids: Vec<MessageId>,

    /// Chaining fingerprint over band parameters, content and parents.
    pub fingerprint: Fingerprint,

    /// Settlement cost charged at admission.
    pub cost: Credits,

    /// Ids of the validators that formed the admitting quorum.
    pub validators: Vec<String>,

    /// Unix milliseconds of successful admission.
    pub admitted_at: u64,
}

impl Message {
    /// Whether this is a genesis message (no parents).
    pub fn is_genesis(&self) -> bool {
        self.parent_ids.is_empty()
    }

    /// Payload size in bytes.
    pub fn content_size(&self) -> u64 {
        self.content.len() as u64
    }
}

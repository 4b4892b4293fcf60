//! Message store interface and the in-memory reference implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::ids::MessageId;
use crate::message::Message;

/// Error from a message store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected or lost the operation.
    #[error("message store failure: {0}")]
    Backend(String),

    /// An append reused an existing id. The store is append-only; this is
    /// always a caller bug or an id-derivation collision.
    #[error("message {0} already exists")]
    Duplicate(MessageId),
}

/// Persistence interface for admitted messages.
///
/// Implementations provide the append-only message history the DAG links
/// against. The engine holds the only write path; `append` is called exactly
/// once per admitted message, after payment has settled.
pub trait MessageStore: Send + Sync {
    /// Fetch a message by id.
    fn get(&self, id: &MessageId) -> Result<Option<Message>, StoreError>;

    /// Append an admitted message. Must reject duplicate ids.
    fn append(&self, message: &Message) -> Result<(), StoreError>;

    /// Check existence without fetching.
    fn exists(&self, id: &MessageId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }
}

/// In-memory message store.
///
/// Reference implementation for tests and single-process deployments.
/// Interior mutability keeps the trait object shareable across threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: Mutex<HashMap<MessageId, Message>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.lock().expect("store lock poisoned").len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageStore for MemoryStore {
    fn get(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self
            .messages
            .lock()
            .expect("store lock poisoned")
            .get(id)
            .cloned())
    }

    fn append(&self, message: &Message) -> Result<(), StoreError> {
        let mut messages = self.messages.lock().expect("store lock poisoned");
        if messages.contains_key(&message.id) {
            return Err(StoreError::Duplicate(message.id));
        }
        messages.insert(message.id, message.clone());
        Ok(())
    }

    fn exists(&self, id: &MessageId) -> Result<bool, StoreError> {
        Ok(self
            .messages
            .lock()
            .expect("store lock poisoned")
            .contains_key(id))
    }
}

//! Parent validation and fingerprint derivation.

use prism_spectrum::Band;
use tracing::trace;

use crate::ids::{Fingerprint, MessageId};
use crate::store::MessageStore;
use crate::DagError;

/// Domain separator for fingerprint hashing.
const FINGERPRINT_DOMAIN: &[u8] = b"prism.fingerprint.v1";

/// Domain separator for message-id hashing.
const MESSAGE_ID_DOMAIN: &[u8] = b"prism.message-id.v1";

/// Validate a candidate's declared parents and derive its fingerprint.
///
/// Parents are checked in declared order against the store; the first
/// missing one aborts with [`DagError::MissingParent`] - there is no partial
/// validation. A candidate with no parents is a genesis message and
/// fingerprints by self-combination of its own wave parameters and content
/// hash.
///
/// Fingerprinting is generative: the returned value *becomes* the
/// candidate's fingerprint. Only when the caller passes `expected` (replay
/// and audit paths) does a mismatch fail, with [`DagError::TamperDetected`].
///
/// Purely computational - nothing is persisted here.
pub fn validate_and_link(
    candidate_id: &MessageId,
    band: Band,
    content: &[u8],
    parent_ids: &[MessageId],
    store: &dyn MessageStore,
    expected: Option<&Fingerprint>,
) -> Result<Fingerprint, DagError> {
    if parent_ids.contains(candidate_id) {
        return Err(DagError::SelfReference(*candidate_id));
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update(FINGERPRINT_DOMAIN);
    // Wave parameters: the band's configured frequency constant.
    hasher.update(&band.frequency_hz().to_le_bytes());
    hasher.update(blake3::hash(content).as_bytes());

    for parent_id in parent_ids {
        let parent = store
            .get(parent_id)?
            .ok_or(DagError::MissingParent(*parent_id))?;
        hasher.update(&parent.fingerprint.0);
    }

    let actual = Fingerprint(*hasher.finalize().as_bytes());

    if let Some(expected) = expected {
        if *expected != actual {
            return Err(DagError::TamperDetected {
                expected: *expected,
                actual,
            });
        }
    }

    trace!(
        candidate = %candidate_id.short(),
        parents = parent_ids.len(),
        fingerprint = %actual.short(),
        "linked candidate"
    );

    Ok(actual)
}

/// Derive a fresh message id.
///
/// Hashes sender, band, content and a timestamp+nonce pair, so identical
/// submissions at different moments get distinct ids while the derivation
/// stays reproducible for a fixed input tuple.
pub fn derive_message_id(
    sender: &str,
    band: Band,
    content: &[u8],
    timestamp_millis: u64,
    nonce: u64,
) -> MessageId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(MESSAGE_ID_DOMAIN);
    hasher.update(sender.as_bytes());
    hasher.update(&band.frequency_hz().to_le_bytes());
    hasher.update(content);
    hasher.update(&timestamp_millis.to_le_bytes());
    hasher.update(&nonce.to_le_bytes());
    MessageId(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::store::MemoryStore;
    use prism_spectrum::compute_cost;

    fn admit(store: &MemoryStore, id: u8, band: Band, content: &str, parents: Vec<MessageId>) -> Message {
        let msg_id = MessageId([id; 32]);
        let fingerprint =
            validate_and_link(&msg_id, band, content.as_bytes(), &parents, store, None).unwrap();
        let msg = Message {
            id: msg_id,
            sender: "alice".into(),
            recipient: "bob".into(),
            content: content.into(),
            band,
            parent_ids: parents,
            fingerprint,
            cost: compute_cost(content.len() as u64, band),
            validators: vec![],
            admitted_at: 0,
        };
        store.append(&msg).unwrap();
        msg
    }

    #[test]
    fn genesis_fingerprint_is_deterministic() {
        let store = MemoryStore::new();
        let id = MessageId([1; 32]);

        let a = validate_and_link(&id, Band::Visible, b"hello", &[], &store, None).unwrap();
        let b = validate_and_link(&id, Band::Visible, b"hello", &[], &store, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_depends_on_band_and_content() {
        let store = MemoryStore::new();
        let id = MessageId([1; 32]);

        let base = validate_and_link(&id, Band::Visible, b"hello", &[], &store, None).unwrap();
        let other_band =
            validate_and_link(&id, Band::Radio, b"hello", &[], &store, None).unwrap();
        let other_content =
            validate_and_link(&id, Band::Visible, b"world", &[], &store, None).unwrap();

        assert_ne!(base, other_band);
        assert_ne!(base, other_content);
    }

    #[test]
    fn child_fingerprint_chains_parent() {
        let store = MemoryStore::new();
        let parent = admit(&store, 1, Band::Visible, "root", vec![]);

        let child_id = MessageId([2; 32]);
        let chained = validate_and_link(
            &child_id,
            Band::Visible,
            b"root",
            &[parent.id],
            &store,
            None,
        )
        .unwrap();
        let genesis =
            validate_and_link(&child_id, Band::Visible, b"root", &[], &store, None).unwrap();

        // Same content and band, but linking to a parent changes the result.
        assert_ne!(chained, genesis);
    }

    #[test]
    fn parent_order_matters() {
        let store = MemoryStore::new();
        let a = admit(&store, 1, Band::Radio, "a", vec![]);
        let b = admit(&store, 2, Band::Radio, "b", vec![]);

        let id = MessageId([3; 32]);
        let ab =
            validate_and_link(&id, Band::Radio, b"c", &[a.id, b.id], &store, None).unwrap();
        let ba =
            validate_and_link(&id, Band::Radio, b"c", &[b.id, a.id], &store, None).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn missing_parent_short_circuits() {
        let store = MemoryStore::new();
        let parent = admit(&store, 1, Band::Radio, "root", vec![]);
        let ghost = MessageId([9; 32]);

        let id = MessageId([3; 32]);
        let err = validate_and_link(
            &id,
            Band::Radio,
            b"x",
            &[ghost, parent.id],
            &store,
            None,
        )
        .unwrap_err();
        assert_eq!(err, DagError::MissingParent(ghost));
    }

    #[test]
    fn self_reference_rejected() {
        let store = MemoryStore::new();
        let id = MessageId([1; 32]);

        let err =
            validate_and_link(&id, Band::Radio, b"x", &[id], &store, None).unwrap_err();
        assert_eq!(err, DagError::SelfReference(id));
    }

    #[test]
    fn audit_mode_detects_tampering() {
        let store = MemoryStore::new();
        let id = MessageId([1; 32]);

        let good = validate_and_link(&id, Band::Visible, b"hello", &[], &store, None).unwrap();
        // Replay with the recorded fingerprint passes.
        validate_and_link(&id, Band::Visible, b"hello", &[], &store, Some(&good)).unwrap();

        // Replay against altered content fails.
        let err = validate_and_link(&id, Band::Visible, b"hellp", &[], &store, Some(&good))
            .unwrap_err();
        assert!(matches!(err, DagError::TamperDetected { expected, .. } if expected == good));
    }

    #[test]
    fn message_id_varies_with_nonce_and_time() {
        let a = derive_message_id("alice", Band::Visible, b"hello", 1000, 1);
        let b = derive_message_id("alice", Band::Visible, b"hello", 1000, 2);
        let c = derive_message_id("alice", Band::Visible, b"hello", 1001, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        // Reproducible for a fixed tuple.
        assert_eq!(a, derive_message_id("alice", Band::Visible, b"hello", 1000, 1));
    }
}

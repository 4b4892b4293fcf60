//! Identifier newtypes.

use serde::{Deserialize, Serialize};

/// A message identifier - a 32-byte Blake3 hash, hex-encoded on the wire.
///
/// Derived at admission from content, sender, band and a uniqueness nonce,
/// so two admissions of identical content still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(#[serde(with = "hex::serde")] pub [u8; 32]);

/// A DAG chaining fingerprint - a 32-byte Blake3 hash, hex-encoded on the
/// wire.
///
/// Unlike [`MessageId`], fingerprints carry no uniqueness nonce: identical
/// content on the same band with the same parents produces the same
/// fingerprint by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(#[serde(with = "hex::serde")] pub [u8; 32]);

impl MessageId {
    /// Hex encoding of the full id.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(MessageId(bytes))
    }

    /// Short prefix for logs and summaries.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Fingerprint {
    /// Hex encoding of the full fingerprint.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Fingerprint(bytes))
    }

    /// Short prefix for logs and summaries.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

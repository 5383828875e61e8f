//! Sub-key derivation: master key → per-role seal keys
//!
//! The meta key seals the filename and metadata blob; the data key seals the
//! chunk stream. Both are keyed-BLAKE3 outputs of the master key under
//! suite-qualified labels, so the same password and salt never yield the
//! same key for two roles or two suites.

use zeroize::Zeroize;

use aef_core::CipherSuite;

use crate::kdf::MasterKey;
use crate::KEY_SIZE;

/// A 256-bit role key handed to the AEAD layer. Zeroized on drop.
#[derive(Clone)]
pub struct SealKey {
    bytes: [u8; KEY_SIZE],
}

impl SealKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SealKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the key that seals the filename and the metadata blob.
pub fn derive_meta_key(master: &MasterKey, suite: CipherSuite) -> SealKey {
    derive_subkey(master, "file-meta:", suite)
}

/// Derive the key that seals the data chunks.
pub fn derive_data_key(master: &MasterKey, suite: CipherSuite) -> SealKey {
    derive_subkey(master, "file-data:", suite)
}

fn derive_subkey(master: &MasterKey, prefix: &str, suite: CipherSuite) -> SealKey {
    let label = format!("{prefix}{}", suite.label());
    let hash = blake3::keyed_hash(master.as_bytes(), label.as_bytes());
    SealKey::from_bytes(*hash.as_bytes())
}

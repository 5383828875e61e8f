//! aef-crypto: key schedule and AEAD layer for AEF containers
//!
//! Key hierarchy:
//! ```text
//! Master Key (256-bit, Argon2id from password + per-file salt)
//!   ├── Meta Key (keyed BLAKE3, label "file-meta:<suite>")
//!   │     └── seals the filename (nonce index 0) and the metadata blob
//!   │         (nonce index u64::MAX)
//!   └── Data Key (keyed BLAKE3, label "file-data:<suite>")
//!         └── seals data chunks (nonce indices 1..N)
//! ```
//!
//! Every unit nonce is derived from the per-file 24-byte nonce base and the
//! unit's 64-bit index; the shape of that derivation is suite-specific and
//! bit-exact (see [`nonce`]).

pub mod aead;
pub mod kdf;
pub mod keys;
pub mod names;
pub mod nonce;

mod aurora;
mod gcm_siv;

pub use aead::{open, seal, Sealed, TagMismatch};
pub use kdf::{derive_master_key, KdfParams, MasterKey};
pub use keys::{derive_data_key, derive_meta_key, SealKey};
pub use names::container_file_name;
pub use nonce::{derive_nonce, UnitNonce, FILENAME_INDEX, METADATA_INDEX};

/// Size of the master key and both sub-keys in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of the per-file KDF salt in bytes.
pub const SALT_SIZE: usize = 32;

/// Size of the per-file nonce base in bytes.
pub const NONCE_BASE_SIZE: usize = 24;

/// Size of every authentication tag in bytes, across all suites.
pub const TAG_SIZE: usize = 16;

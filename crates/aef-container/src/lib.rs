//! aef-container: the on-disk authenticated container
//!
//! Container layout (all integers little-endian):
//! ```text
//! [81 bytes: fixed header]
//! [fn_len bytes: filename ciphertext][16 bytes: filename tag]
//! [ 4 bytes: meta length][meta ciphertext][16 bytes: meta tag]   (HasMeta)
//! [ 4 bytes: chunk length][chunk ciphertext][16 bytes: chunk tag]  × N
//! ```
//!
//! The fixed header is the associated data for the filename and metadata
//! units. Chunks authenticate the full prefix — header, filename
//! ciphertext and tag, metadata ciphertext and tag — plus their own index
//! and length, so truncation, reordering, and any upstream tampering all
//! surface as verification failures.

pub mod header;
pub mod meta;
pub mod reader;
pub mod writer;

pub use header::Header;
pub use meta::FileMeta;
pub use reader::{decrypt_file, DecryptOutcome};
pub use writer::{encrypt_file, EncryptOptions, EncryptOutcome};

/// Progress callback type (bytes done, bytes total, unit label)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

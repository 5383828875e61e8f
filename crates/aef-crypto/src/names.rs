//! On-disk container naming
//!
//! The container's filename is a keyed BLAKE3 hash of the filename
//! ciphertext, keyed by the master key and salted with the first eight
//! bytes of the nonce base. The name on disk leaks neither the plaintext
//! filename nor the ciphertext, yet is reproducible given the password and
//! the same per-file randomness. The reader never consults it; decryption
//! is driven entirely by container contents.

use crate::kdf::MasterKey;
use crate::NONCE_BASE_SIZE;

/// Extension carried by every container.
pub const CONTAINER_EXT: &str = "crypt";

/// Compute the on-disk file name for a container: 64 lowercase hex chars
/// plus `.crypt`.
pub fn container_file_name(
    master: &MasterKey,
    nonce_base: &[u8; NONCE_BASE_SIZE],
    fn_ct: &[u8],
) -> String {
    let mut hasher = blake3::Hasher::new_keyed(master.as_bytes());
    hasher.update(&nonce_base[..8]);
    hasher.update(fn_ct);
    format!("{}.{CONTAINER_EXT}", hasher.finalize().to_hex())
}

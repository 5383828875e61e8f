//! Per-unit nonce derivation from the file's nonce base and a 64-bit index
//!
//! Index namespace within one container:
//! ```text
//! 0         filename
//! 1..N      data chunks, in stream order
//! u64::MAX  metadata blob
//! ```
//!
//! The byte-level mixing is suite-specific and bit-exact; two containers
//! written with the same suite and the same forced nonce base produce
//! identical unit nonces. Do not unify the shapes across suites.

use aef_core::CipherSuite;

use crate::NONCE_BASE_SIZE;

/// Nonce index reserved for the encrypted filename.
pub const FILENAME_INDEX: u64 = 0;

/// Nonce index reserved for the metadata blob.
pub const METADATA_INDEX: u64 = u64::MAX;

/// A derived unit nonce; length depends on the suite (12, 16, or 24 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitNonce {
    bytes: [u8; NONCE_BASE_SIZE],
    len: usize,
}

impl UnitNonce {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Derive the nonce for unit `index` under `suite`.
///
/// - 24-byte nonces (XChaCha20-Poly1305): the base with bytes 16..24
///   overwritten by the index in little-endian.
/// - 12-byte nonces (GCM-SIV family): base bytes 0..6 verbatim, bytes 6..12
///   XORed with the low 48 bits of the index.
/// - 16-byte nonces (Aurora-SIV): base bytes 0..8 verbatim, bytes 8..16
///   XORed with all 64 bits of the index.
pub fn derive_nonce(suite: CipherSuite, base: &[u8; NONCE_BASE_SIZE], index: u64) -> UnitNonce {
    let mut bytes = [0u8; NONCE_BASE_SIZE];
    let len = suite.nonce_len();
    match len {
        24 => {
            bytes.copy_from_slice(base);
            bytes[16..24].copy_from_slice(&index.to_le_bytes());
        }
        12 => {
            bytes[..12].copy_from_slice(&base[..12]);
            for k in 0..6 {
                bytes[6 + k] ^= (index >> (8 * k)) as u8;
            }
        }
        16 => {
            bytes[..16].copy_from_slice(&base[..16]);
            for k in 0..8 {
                bytes[8 + k] ^= (index >> (8 * k)) as u8;
            }
        }
        _ => unreachable!("nonce_len is one of 12, 16, 24"),
    }
    UnitNonce { bytes, len }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base() -> [u8; NONCE_BASE_SIZE] {
        let mut b = [0u8; NONCE_BASE_SIZE];
        for (i, v) in b.iter_mut().enumerate() {
            *v = i as u8;
        }
        b
    }

    #[test]
    fn xchacha_overwrites_trailing_eight_bytes() {
        let n = derive_nonce(CipherSuite::XChaCha20Poly1305, &base(), 0x0102030405060708);
        assert_eq!(n.as_bytes().len(), 24);
        assert_eq!(&n.as_bytes()[..16], &base()[..16]);
        assert_eq!(
            &n.as_bytes()[16..],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn gcm_siv_xors_low_48_bits() {
        let n = derive_nonce(CipherSuite::Aes256GcmSiv, &base(), 1);
        assert_eq!(n.as_bytes().len(), 12);
        assert_eq!(&n.as_bytes()[..6], &base()[..6]);
        // base[6] = 6, XOR 1 = 7; remaining XOR bytes are zero
        assert_eq!(n.as_bytes()[6], 7);
        assert_eq!(&n.as_bytes()[7..], &base()[7..12]);
    }

    #[test]
    fn aurora_xors_all_64_bits() {
        let n = derive_nonce(CipherSuite::AuroraSiv, &base(), u64::MAX);
        assert_eq!(n.as_bytes().len(), 16);
        assert_eq!(&n.as_bytes()[..8], &base()[..8]);
        for (k, b) in n.as_bytes()[8..].iter().enumerate() {
            assert_eq!(*b, base()[8 + k] ^ 0xff);
        }
    }

    #[test]
    fn index_zero_is_identity_for_xor_shapes() {
        for suite in [CipherSuite::Aes256GcmSiv, CipherSuite::AuroraSiv] {
            let n = derive_nonce(suite, &base(), FILENAME_INDEX);
            assert_eq!(n.as_bytes(), &base()[..suite.nonce_len()]);
        }
    }

    #[test]
    fn reserved_indices_do_not_collide_with_chunks() {
        for suite in CipherSuite::ALL {
            let name = derive_nonce(suite, &base(), FILENAME_INDEX);
            let meta = derive_nonce(suite, &base(), METADATA_INDEX);
            assert_ne!(name, meta);
            for i in 1..=1000u64 {
                let chunk = derive_nonce(suite, &base(), i);
                assert_ne!(chunk, name, "suite {suite}, index {i}");
                assert_ne!(chunk, meta, "suite {suite}, index {i}");
            }
        }
    }

    proptest! {
        #[test]
        fn distinct_indices_distinct_nonces(
            a in 0u64..(1 << 48),
            b in 0u64..(1 << 48),
        ) {
            prop_assume!(a != b);
            for suite in CipherSuite::ALL {
                let na = derive_nonce(suite, &base(), a);
                let nb = derive_nonce(suite, &base(), b);
                prop_assert_ne!(na, nb, "suite {}", suite);
            }
        }
    }
}

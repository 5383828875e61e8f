//! Fixed container header codec
//!
//! 81-byte layout (little-endian integers):
//! ```text
//! offset  size  field
//! 0       4     magic "AEF1"
//! 4       1     version (3)
//! 5       1     suite tag
//! 6       1     flags (bit 0 HasName, bit 1 HasMeta)
//! 7       4     Argon2id memory cost (KiB)
//! 11      4     Argon2id time cost
//! 15      4     Argon2id parallelism
//! 19      32    salt
//! 51      24    nonce base
//! 75      4     chunk size
//! 79      2     encrypted filename length
//! ```
//!
//! The encoded bytes double as the associated data for the filename and
//! metadata units, so any header tampering fails filename verification
//! even when the tampered field is not otherwise consulted.

use aef_core::{AefError, AefResult, CipherSuite, FORMAT_VERSION};
use aef_crypto::{KdfParams, NONCE_BASE_SIZE, SALT_SIZE};

pub const MAGIC: [u8; 4] = *b"AEF1";

/// Encoded length of the fixed header.
pub const FIXED_HEADER_LEN: usize = 81;

/// Maximum filename length in bytes (fits the u16 length field).
pub const MAX_FILENAME_LEN: usize = u16::MAX as usize;

pub const FLAG_HAS_NAME: u8 = 0b0000_0001;
pub const FLAG_HAS_META: u8 = 0b0000_0010;

#[derive(Debug, Clone)]
pub struct Header {
    pub suite: CipherSuite,
    pub flags: u8,
    pub kdf: KdfParams,
    pub salt: [u8; SALT_SIZE],
    pub nonce_base: [u8; NONCE_BASE_SIZE],
    pub chunk_size: u32,
    pub fn_len: u16,
}

impl Header {
    pub fn has_meta(&self) -> bool {
        self.flags & FLAG_HAS_META != 0
    }

    pub fn encode(&self) -> [u8; FIXED_HEADER_LEN] {
        let mut buf = [0u8; FIXED_HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = FORMAT_VERSION;
        buf[5] = self.suite.tag();
        buf[6] = self.flags;
        buf[7..11].copy_from_slice(&self.kdf.mem_cost_kib.to_le_bytes());
        buf[11..15].copy_from_slice(&self.kdf.time_cost.to_le_bytes());
        buf[15..19].copy_from_slice(&self.kdf.parallelism.to_le_bytes());
        buf[19..51].copy_from_slice(&self.salt);
        buf[51..75].copy_from_slice(&self.nonce_base);
        buf[75..79].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[79..81].copy_from_slice(&self.fn_len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; FIXED_HEADER_LEN]) -> AefResult<Self> {
        if buf[0..4] != MAGIC {
            return Err(AefError::BadFormat("magic mismatch"));
        }
        if buf[4] != FORMAT_VERSION {
            return Err(AefError::BadFormat("unsupported version"));
        }
        let suite = CipherSuite::from_tag(buf[5])?;
        let flags = buf[6];
        if flags & FLAG_HAS_NAME == 0 {
            return Err(AefError::BadFormat("filename flag missing"));
        }

        let kdf = KdfParams {
            mem_cost_kib: u32::from_le_bytes(buf[7..11].try_into().expect("4 bytes")),
            time_cost: u32::from_le_bytes(buf[11..15].try_into().expect("4 bytes")),
            parallelism: u32::from_le_bytes(buf[15..19].try_into().expect("4 bytes")),
        };

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&buf[19..51]);
        let mut nonce_base = [0u8; NONCE_BASE_SIZE];
        nonce_base.copy_from_slice(&buf[51..75]);

        let chunk_size = u32::from_le_bytes(buf[75..79].try_into().expect("4 bytes"));
        if chunk_size == 0 {
            return Err(AefError::BadFormat("zero chunk size"));
        }
        let fn_len = u16::from_le_bytes(buf[79..81].try_into().expect("2 bytes"));

        Ok(Header {
            suite,
            flags,
            kdf,
            salt,
            nonce_base,
            chunk_size,
            fn_len,
        })
    }
}

//! File metadata codec: (mtime, permission bits) ⇄ 10-byte blob
//!
//! Blob layout: `LE64 mtime-seconds ‖ LE16 permission-bits`. Bits 0..9 map
//! user/group/others × read/write/execute in that order; higher bits are
//! reserved and written as zero. Restoring metadata is best-effort: a
//! failure to set times or permissions is logged, never fatal.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use aef_core::{AefError, AefResult};

/// Encoded length of the metadata blob.
pub const META_BLOB_LEN: usize = 10;

/// (bit index in the packed field, UNIX mode bit)
const MODE_BITS: [(u16, u32); 9] = [
    (0, 0o400), // user read
    (1, 0o200), // user write
    (2, 0o100), // user execute
    (3, 0o040), // group read
    (4, 0o020), // group write
    (5, 0o010), // group execute
    (6, 0o004), // others read
    (7, 0o002), // others write
    (8, 0o001), // others execute
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Modification time, seconds since the epoch. Zero means "unknown";
    /// the reader does not restore a zero mtime.
    pub mtime_secs: u64,
    /// Packed permission bits (bits 0..9).
    pub mode_bits: u16,
}

impl FileMeta {
    /// Capture metadata from a file's stat result.
    pub fn from_fs(meta: &fs::Metadata) -> Self {
        let mtime_secs = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        #[cfg(unix)]
        let mode_bits = {
            use std::os::unix::fs::PermissionsExt;
            pack_mode(meta.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode_bits = 0;

        Self {
            mtime_secs,
            mode_bits,
        }
    }

    pub fn pack(&self) -> [u8; META_BLOB_LEN] {
        let mut buf = [0u8; META_BLOB_LEN];
        buf[..8].copy_from_slice(&self.mtime_secs.to_le_bytes());
        buf[8..].copy_from_slice(&self.mode_bits.to_le_bytes());
        buf
    }

    pub fn unpack(blob: &[u8]) -> AefResult<Self> {
        if blob.len() != META_BLOB_LEN {
            return Err(AefError::BadFormat("metadata blob size"));
        }
        Ok(Self {
            mtime_secs: u64::from_le_bytes(blob[..8].try_into().expect("8 bytes")),
            mode_bits: u16::from_le_bytes(blob[8..].try_into().expect("2 bytes")),
        })
    }

    /// Restore metadata onto `path`, best-effort.
    ///
    /// The mtime is applied only when non-zero; permission bits are applied
    /// whenever metadata was present. Times go first so a read-only mode
    /// cannot block the write handle needed for them.
    pub fn apply(&self, path: &Path) {
        if self.mtime_secs != 0 {
            let mtime = UNIX_EPOCH + Duration::from_secs(self.mtime_secs);
            match fs::File::options().write(true).open(path) {
                Ok(file) => {
                    if let Err(e) = file.set_modified(mtime) {
                        warn!(path = %path.display(), error = %e, "could not restore mtime");
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not open for mtime restore");
                }
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(unpack_mode(self.mode_bits));
            if let Err(e) = fs::set_permissions(path, perms) {
                warn!(path = %path.display(), error = %e, "could not restore permissions");
            }
        }
    }
}

/// Compress a UNIX mode word into the 9 packed permission bits.
pub fn pack_mode(mode: u32) -> u16 {
    let mut bits = 0u16;
    for (bit, mode_bit) in MODE_BITS {
        if mode & mode_bit != 0 {
            bits |= 1 << bit;
        }
    }
    bits
}

/// Expand packed permission bits back into a UNIX mode word.
pub fn unpack_mode(bits: u16) -> u32 {
    let mut mode = 0u32;
    for (bit, mode_bit) in MODE_BITS {
        if bits & (1 << bit) != 0 {
            mode |= mode_bit;
        }
    }
    mode
}

use serde::{Deserialize, Serialize};

/// Tool configuration (loaded from aef.toml when present).
///
/// Every field has a default so a missing or partial file is fine; CLI flags
/// override whatever the file says.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AefConfig {
    /// Default cipher suite name (see `CipherSuite::from_name`)
    pub cipher: String,
    /// Default chunk size in MiB
    pub chunk_mib: u32,
    pub kdf: KdfConfig,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub m_kib: u32,
    /// Time cost / iterations (default: 3)
    pub t: u32,
    /// Parallelism (default: 1)
    pub p: u32,
}

impl Default for AefConfig {
    fn default() -> Self {
        Self {
            cipher: "xchacha20".into(),
            chunk_mib: 1,
            kdf: KdfConfig::default(),
        }
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            m_kib: 65536,
            t: 3,
            p: 1,
        }
    }
}

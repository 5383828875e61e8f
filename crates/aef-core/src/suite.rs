//! The closed set of AEAD constructions a container may be sealed with.
//!
//! The suite tag is a single header byte; it selects the cipher, the nonce
//! shape, and the sub-key derivation labels for the whole container.

use std::fmt;

use crate::error::AefError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    XChaCha20Poly1305,
    Aes256GcmSiv,
    TwofishGcmSiv,
    SerpentGcmSiv,
    CamelliaGcmSiv,
    /// Experimental. Round-trips with itself; not recommended as a default.
    AuroraSiv,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 6] = [
        CipherSuite::XChaCha20Poly1305,
        CipherSuite::Aes256GcmSiv,
        CipherSuite::TwofishGcmSiv,
        CipherSuite::SerpentGcmSiv,
        CipherSuite::CamelliaGcmSiv,
        CipherSuite::AuroraSiv,
    ];

    /// The wire byte stored at header offset 5.
    pub fn tag(self) -> u8 {
        match self {
            CipherSuite::XChaCha20Poly1305 => 0,
            CipherSuite::Aes256GcmSiv => 1,
            CipherSuite::TwofishGcmSiv => 2,
            CipherSuite::SerpentGcmSiv => 3,
            CipherSuite::CamelliaGcmSiv => 4,
            CipherSuite::AuroraSiv => 50,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, AefError> {
        match tag {
            0 => Ok(CipherSuite::XChaCha20Poly1305),
            1 => Ok(CipherSuite::Aes256GcmSiv),
            2 => Ok(CipherSuite::TwofishGcmSiv),
            3 => Ok(CipherSuite::SerpentGcmSiv),
            4 => Ok(CipherSuite::CamelliaGcmSiv),
            50 => Ok(CipherSuite::AuroraSiv),
            other => Err(AefError::UnknownSuite(other)),
        }
    }

    /// Suite name as it appears in sub-key derivation labels.
    ///
    /// Frozen for wire compatibility. Tag 50 keeps the historical
    /// `"aurora-ctr"` label even though the advertised name is `aurora-siv`;
    /// changing it would re-key every existing container.
    pub fn label(self) -> &'static str {
        match self {
            CipherSuite::XChaCha20Poly1305 => "xchacha20",
            CipherSuite::Aes256GcmSiv => "aes-gcm-siv",
            CipherSuite::TwofishGcmSiv => "twofish-gcm-siv",
            CipherSuite::SerpentGcmSiv => "serpent-gcm-siv",
            CipherSuite::CamelliaGcmSiv => "camellia-gcm-siv",
            CipherSuite::AuroraSiv => "aurora-ctr",
        }
    }

    /// Name accepted and printed by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::XChaCha20Poly1305 => "xchacha20",
            CipherSuite::Aes256GcmSiv => "aes-gcm-siv",
            CipherSuite::TwofishGcmSiv => "twofish-gcm-siv",
            CipherSuite::SerpentGcmSiv => "serpent-gcm-siv",
            CipherSuite::CamelliaGcmSiv => "camellia-gcm-siv",
            CipherSuite::AuroraSiv => "aurora-siv",
        }
    }

    /// Nonce length in bytes for every unit sealed under this suite.
    pub fn nonce_len(self) -> usize {
        match self {
            CipherSuite::XChaCha20Poly1305 => 24,
            CipherSuite::Aes256GcmSiv
            | CipherSuite::TwofishGcmSiv
            | CipherSuite::SerpentGcmSiv
            | CipherSuite::CamelliaGcmSiv => 12,
            CipherSuite::AuroraSiv => 16,
        }
    }

    /// Parse a user-supplied suite name (case-insensitive, common aliases).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "xchacha20" | "xchacha20-poly1305" | "xchacha" => {
                Some(CipherSuite::XChaCha20Poly1305)
            }
            "aes-gcm-siv" | "aes" | "aes256-gcm-siv" => Some(CipherSuite::Aes256GcmSiv),
            "twofish-gcm-siv" | "twofish" => Some(CipherSuite::TwofishGcmSiv),
            "serpent-gcm-siv" | "serpent" => Some(CipherSuite::SerpentGcmSiv),
            "camellia-gcm-siv" | "camellia" => Some(CipherSuite::CamelliaGcmSiv),
            "aurora-siv" | "aurora" | "aurora-ctr" => Some(CipherSuite::AuroraSiv),
            _ => None,
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

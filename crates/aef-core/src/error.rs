use std::fmt;

use thiserror::Error;

pub type AefResult<T> = Result<T, AefError>;

/// Which container unit failed tag verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthContext {
    Filename,
    Metadata,
    /// Data chunk, 1-based index.
    Chunk(u64),
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthContext::Filename => f.write_str("filename"),
            AuthContext::Metadata => f.write_str("metadata"),
            AuthContext::Chunk(i) => write!(f, "chunk {i}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AefError {
    #[error("bad container format: {0}")]
    BadFormat(&'static str),

    #[error("unknown cipher suite tag {0}")]
    UnknownSuite(u8),

    #[error("file name too long: {0} bytes (max 65535)")]
    NameTooLong(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container truncated: {0}")]
    Truncated(&'static str),

    #[error("authentication failed: {0}")]
    Auth(AuthContext),

    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("random generator failure: {0}")]
    Random(String),

    #[error("cipher failure: {0}")]
    Cipher(String),
}

//! Encryption pipeline: plaintext file → authenticated container
//!
//! Strictly sequential: header → filename → metadata → chunk stream →
//! flush. The source file is unlinked only after the container is flushed
//! and synced; on any error the source is untouched and a partial
//! container may remain for the caller to discard.

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;
use tracing::debug;

use aef_core::{AefError, AefResult, CipherSuite, DEFAULT_CHUNK_SIZE};
use aef_crypto::{
    container_file_name, derive_data_key, derive_master_key, derive_meta_key, derive_nonce, seal,
    KdfParams, NONCE_BASE_SIZE, SALT_SIZE,
};

use crate::header::{Header, FLAG_HAS_META, FLAG_HAS_NAME, MAX_FILENAME_LEN};
use crate::meta::FileMeta;
use crate::ProgressFn;

#[derive(Debug, Clone)]
pub struct EncryptOptions {
    pub suite: CipherSuite,
    /// Chunk size in bytes, minimum 1.
    pub chunk_size: u32,
    pub kdf: KdfParams,
    /// Record (mtime, permissions) in the container.
    pub with_meta: bool,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            suite: CipherSuite::XChaCha20Poly1305,
            chunk_size: DEFAULT_CHUNK_SIZE,
            kdf: KdfParams::default(),
            with_meta: true,
        }
    }
}

#[derive(Debug)]
pub struct EncryptOutcome {
    /// Path of the container that replaced the plaintext.
    pub container: PathBuf,
    pub chunks: u64,
    pub plaintext_bytes: u64,
}

/// Encrypt `path` in place, replacing it with a `.crypt` container in the
/// same directory. See the module docs for the failure contract.
pub fn encrypt_file(
    path: &Path,
    password: &SecretString,
    opts: &EncryptOptions,
    progress: Option<&ProgressFn>,
) -> AefResult<EncryptOutcome> {
    if opts.chunk_size == 0 {
        return Err(AefError::BadFormat("chunk size must be at least 1"));
    }

    let name_bytes = basename_bytes(path)?;
    if name_bytes.len() > MAX_FILENAME_LEN {
        return Err(AefError::NameTooLong(name_bytes.len()));
    }

    let fs_meta = fs::metadata(path)?;
    if !fs_meta.is_file() {
        return Err(AefError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", path.display()),
        )));
    }
    let total_bytes = fs_meta.len();
    let mut source = fs::File::open(path)?;

    let mut salt = [0u8; SALT_SIZE];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AefError::Random(format!("salt: {e}")))?;
    let mut nonce_base = [0u8; NONCE_BASE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_base)
        .map_err(|e| AefError::Random(format!("nonce base: {e}")))?;

    let mut flags = FLAG_HAS_NAME;
    if opts.with_meta {
        flags |= FLAG_HAS_META;
    }
    let header = Header {
        suite: opts.suite,
        flags,
        kdf: opts.kdf,
        salt,
        nonce_base,
        chunk_size: opts.chunk_size,
        fn_len: name_bytes.len() as u16,
    };
    let header_bytes = header.encode();

    let master = derive_master_key(password, &salt, &opts.kdf)?;
    let meta_key = derive_meta_key(&master, opts.suite);
    let data_key = derive_data_key(&master, opts.suite);

    // Filename unit: nonce index 0, AD = the fixed header verbatim.
    let fn_nonce = derive_nonce(opts.suite, &nonce_base, aef_crypto::FILENAME_INDEX);
    let sealed_name = seal(opts.suite, &meta_key, &fn_nonce, &header_bytes, &name_bytes)?;

    let out_name = container_file_name(&master, &nonce_base, &sealed_name.ciphertext);
    let out_path = path.parent().unwrap_or(Path::new(".")).join(out_name);
    debug!(src = %path.display(), dst = %out_path.display(), suite = %opts.suite, "encrypting");

    let out_file = fs::File::create(&out_path)?;
    let mut out = BufWriter::new(out_file);
    out.write_all(&header_bytes)?;
    out.write_all(&sealed_name.ciphertext)?;
    out.write_all(&sealed_name.tag)?;

    // AD prefix for chunks grows with everything written before them.
    let mut ad = Vec::with_capacity(header_bytes.len() + sealed_name.ciphertext.len() + 64);
    ad.extend_from_slice(&header_bytes);
    ad.extend_from_slice(&sealed_name.ciphertext);
    ad.extend_from_slice(&sealed_name.tag);

    if opts.with_meta {
        let blob = FileMeta::from_fs(&fs_meta).pack();
        let meta_nonce = derive_nonce(opts.suite, &nonce_base, aef_crypto::METADATA_INDEX);
        let sealed_meta = seal(opts.suite, &meta_key, &meta_nonce, &header_bytes, &blob)?;
        out.write_all(&(sealed_meta.ciphertext.len() as u32).to_le_bytes())?;
        out.write_all(&sealed_meta.ciphertext)?;
        out.write_all(&sealed_meta.tag)?;
        ad.extend_from_slice(&sealed_meta.ciphertext);
        ad.extend_from_slice(&sealed_meta.tag);
    }
    let ad_prefix_len = ad.len();

    let mut buf = vec![0u8; opts.chunk_size as usize];
    let mut index = 0u64;
    let mut done = 0u64;
    loop {
        let n = read_full(&mut source, &mut buf)?;
        if n == 0 {
            break;
        }
        index += 1;

        ad.truncate(ad_prefix_len);
        ad.extend_from_slice(&index.to_le_bytes());
        ad.extend_from_slice(&(n as u32).to_le_bytes());

        let nonce = derive_nonce(opts.suite, &nonce_base, index);
        let sealed = seal(opts.suite, &data_key, &nonce, &ad, &buf[..n])?;
        out.write_all(&(n as u32).to_le_bytes())?;
        out.write_all(&sealed.ciphertext)?;
        out.write_all(&sealed.tag)?;

        done += n as u64;
        if let Some(progress) = progress {
            progress(done, total_bytes, &format!("chunk {index}"));
        }
    }

    out.flush()?;
    out.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    // Content is durable; the plaintext can go.
    fs::remove_file(path)?;

    Ok(EncryptOutcome {
        container: out_path,
        chunks: index,
        plaintext_bytes: done,
    })
}

/// The file's basename as raw bytes.
fn basename_bytes(path: &Path) -> AefResult<Vec<u8>> {
    let name = path.file_name().ok_or_else(|| {
        AefError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path has no file name: {}", path.display()),
        ))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(name.as_bytes().to_vec())
    }
    #[cfg(not(unix))]
    {
        name.to_str()
            .map(|s| s.as_bytes().to_vec())
            .ok_or(AefError::BadFormat("file name is not valid UTF-8"))
    }
}

/// Read until `buf` is full or the stream ends; returns bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_full_handles_short_reads() {
        // A reader that returns one byte at a time.
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }

        let mut r = OneByte(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 0);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let opts = EncryptOptions {
            chunk_size: 0,
            ..Default::default()
        };
        let result = encrypt_file(
            Path::new("/nonexistent"),
            &SecretString::from("pw"),
            &opts,
            None,
        );
        assert!(matches!(result, Err(AefError::BadFormat(_))));
    }
}

//! Decryption pipeline: container → verified plaintext file
//!
//! Mirrors the writer: parse header → derive keys → verify filename →
//! verify metadata → verify chunks in order → flush → restore metadata →
//! unlink container. Verification failure at any unit aborts with the
//! unit's context; the container is never removed on failure. The only
//! accepted end of file is exactly at a unit boundary.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::debug;

use aef_core::{AefError, AefResult, AuthContext};
use aef_crypto::{
    derive_data_key, derive_master_key, derive_meta_key, derive_nonce, open, TAG_SIZE,
};

use crate::header::{Header, FIXED_HEADER_LEN};
use crate::meta::FileMeta;
use crate::writer::read_full;
use crate::ProgressFn;

#[derive(Debug)]
pub struct DecryptOutcome {
    /// Path of the restored plaintext file.
    pub plaintext: PathBuf,
    pub chunks: u64,
    pub plaintext_bytes: u64,
}

/// Decrypt `path` in place, replacing the container with the original file
/// (and its recorded metadata) in the same directory.
pub fn decrypt_file(
    path: &Path,
    password: &SecretString,
    progress: Option<&ProgressFn>,
) -> AefResult<DecryptOutcome> {
    let container = fs::File::open(path)?;
    let container_bytes = container.metadata()?.len();
    let mut input = BufReader::new(container);

    let mut header_bytes = [0u8; FIXED_HEADER_LEN];
    if read_full(&mut input, &mut header_bytes)? != FIXED_HEADER_LEN {
        return Err(AefError::BadFormat("truncated header"));
    }
    let header = Header::decode(&header_bytes)?;
    let suite = header.suite;

    let master = derive_master_key(password, &header.salt, &header.kdf)?;
    let meta_key = derive_meta_key(&master, suite);
    let data_key = derive_data_key(&master, suite);

    let mut fn_ct = vec![0u8; header.fn_len as usize];
    read_exact_unit(&mut input, &mut fn_ct, "filename ciphertext")?;
    let mut fn_tag = [0u8; TAG_SIZE];
    read_exact_unit(&mut input, &mut fn_tag, "filename tag")?;

    let fn_nonce = derive_nonce(suite, &header.nonce_base, aef_crypto::FILENAME_INDEX);
    let name_bytes = open(suite, &meta_key, &fn_nonce, &header_bytes, &fn_ct, &fn_tag)
        .map_err(|_| AefError::Auth(AuthContext::Filename))?;
    let basename = decode_basename(&name_bytes)?;
    let out_path = path.parent().unwrap_or(Path::new(".")).join(&basename);
    debug!(src = %path.display(), dst = %out_path.display(), suite = %suite, "decrypting");

    let mut ad = Vec::with_capacity(FIXED_HEADER_LEN + fn_ct.len() + 64);
    ad.extend_from_slice(&header_bytes);
    ad.extend_from_slice(&fn_ct);
    ad.extend_from_slice(&fn_tag);

    let mut restored_meta = None;
    if header.has_meta() {
        let mut len_buf = [0u8; 4];
        read_exact_unit(&mut input, &mut len_buf, "metadata length")?;
        let meta_len = u32::from_le_bytes(len_buf) as usize;

        let mut meta_ct = vec![0u8; meta_len];
        read_exact_unit(&mut input, &mut meta_ct, "metadata ciphertext")?;
        let mut meta_tag = [0u8; TAG_SIZE];
        read_exact_unit(&mut input, &mut meta_tag, "metadata tag")?;

        let meta_nonce = derive_nonce(suite, &header.nonce_base, aef_crypto::METADATA_INDEX);
        let blob = open(suite, &meta_key, &meta_nonce, &header_bytes, &meta_ct, &meta_tag)
            .map_err(|_| AefError::Auth(AuthContext::Metadata))?;
        restored_meta = Some(FileMeta::unpack(&blob)?);

        ad.extend_from_slice(&meta_ct);
        ad.extend_from_slice(&meta_tag);
    }
    let ad_prefix_len = ad.len();

    let out_file = fs::File::create(&out_path)?;
    let mut out = BufWriter::new(out_file);

    let mut index = 0u64;
    let mut done = 0u64;
    // Preamble length: the AD prefix plus the metadata length field.
    let mut consumed = ad_prefix_len as u64 + if header.has_meta() { 4 } else { 0 };
    loop {
        let mut len_buf = [0u8; 4];
        let n = read_full(&mut input, &mut len_buf)?;
        if n == 0 {
            break; // clean EOF, exactly at a unit boundary
        }
        if n < 4 {
            return Err(AefError::Truncated("chunk length"));
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        index += 1;

        let mut ct = vec![0u8; len];
        read_exact_unit(&mut input, &mut ct, "chunk ciphertext")?;
        let mut tag = [0u8; TAG_SIZE];
        read_exact_unit(&mut input, &mut tag, "chunk tag")?;

        ad.truncate(ad_prefix_len);
        ad.extend_from_slice(&index.to_le_bytes());
        ad.extend_from_slice(&(len as u32).to_le_bytes());

        let nonce = derive_nonce(suite, &header.nonce_base, index);
        let plaintext = open(suite, &data_key, &nonce, &ad, &ct, &tag)
            .map_err(|_| AefError::Auth(AuthContext::Chunk(index)))?;
        out.write_all(&plaintext)?;

        done += plaintext.len() as u64;
        consumed += (4 + len + TAG_SIZE) as u64;
        if let Some(progress) = progress {
            progress(consumed.min(container_bytes), container_bytes, &format!("chunk {index}"));
        }
    }

    out.flush()?;
    out.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    if let Some(meta) = restored_meta {
        meta.apply(&out_path);
    }

    // Every unit verified and the plaintext is durable; drop the container.
    fs::remove_file(path)?;

    Ok(DecryptOutcome {
        plaintext: out_path,
        chunks: index,
        plaintext_bytes: done,
    })
}

/// Read an exact unit, failing with `Truncated(label)` if the container
/// ends first.
fn read_exact_unit<R: Read>(reader: &mut R, buf: &mut [u8], label: &'static str) -> AefResult<()> {
    if read_full(reader, buf)? != buf.len() {
        return Err(AefError::Truncated(label));
    }
    Ok(())
}

/// Validate a decrypted basename before joining it to the output directory.
fn decode_basename(bytes: &[u8]) -> AefResult<std::ffi::OsString> {
    if bytes.is_empty()
        || bytes == b"."
        || bytes == b".."
        || bytes.contains(&b'/')
        || bytes.contains(&0)
    {
        return Err(AefError::BadFormat("restored file name is invalid"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(std::ffi::OsStr::from_bytes(bytes).to_os_string())
    }
    #[cfg(not(unix))]
    {
        let s = std::str::from_utf8(bytes)
            .map_err(|_| AefError::BadFormat("restored file name is not valid UTF-8"))?;
        if s.contains('\\') {
            return Err(AefError::BadFormat("restored file name is invalid"));
        }
        Ok(s.into())
    }
}

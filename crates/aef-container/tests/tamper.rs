//! Integration tests: every byte of a container is load-bearing.
//!
//! Header tampering must fail before or at filename verification; unit
//! tampering must name the unit; chunk reordering and mid-unit truncation
//! must be rejected.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tempfile::TempDir;

use aef_container::{decrypt_file, encrypt_file, EncryptOptions};
use aef_core::{AefError, AuthContext, CipherSuite};
use aef_crypto::KdfParams;

const FIXED_HEADER_LEN: usize = 81;
const TAG: usize = 16;

fn fast_kdf() -> KdfParams {
    KdfParams {
        mem_cost_kib: 8,
        time_cost: 1,
        parallelism: 1,
    }
}

fn opts(suite: CipherSuite, chunk_size: u32) -> EncryptOptions {
    EncryptOptions {
        suite,
        chunk_size,
        kdf: fast_kdf(),
        with_meta: true,
    }
}

fn password() -> SecretString {
    SecretString::from("hunter2")
}

/// Encrypt `content` under `name`, returning the container path.
fn make_container(dir: &Path, name: &str, content: &[u8], suite: CipherSuite, chunk: u32) -> PathBuf {
    let src = dir.join(name);
    fs::write(&src, content).unwrap();
    encrypt_file(&src, &password(), &opts(suite, chunk), None)
        .unwrap()
        .container
}

/// Decrypt a mutated copy of `container`, restoring nothing on disk from
/// the original. Returns the decryption result.
fn decrypt_mutated(
    container: &Path,
    mutate: impl FnOnce(&mut Vec<u8>),
) -> Result<(), AefError> {
    let tmp = TempDir::new().unwrap();
    let copy = tmp.path().join(container.file_name().unwrap());
    let mut bytes = fs::read(container).unwrap();
    mutate(&mut bytes);
    fs::write(&copy, &bytes).unwrap();
    decrypt_file(&copy, &password(), None).map(|_| ())
}

#[test]
fn header_bit_flips_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = make_container(tmp.path(), "a.txt", b"payload bytes", CipherSuite::XChaCha20Poly1305, 1 << 20);

    // Skip the high bytes of the KDF cost fields: flipping those still
    // fails (the header is the filename AD) but would first run Argon2id
    // with a multi-GiB memory cost or millions of iterations.
    let skip = [8usize, 9, 10, 12, 13, 14, 16, 17, 18];

    for offset in 0..FIXED_HEADER_LEN {
        if skip.contains(&offset) {
            continue;
        }
        for bit in [0x01u8, 0x80] {
            let result = decrypt_mutated(&container, |b| b[offset] ^= bit);
            let err = match result {
                Err(e) => e,
                Ok(()) => panic!("header byte {offset} bit {bit:#x} accepted"),
            };
            assert!(
                matches!(
                    err,
                    AefError::BadFormat(_)
                        | AefError::UnknownSuite(_)
                        | AefError::Auth(AuthContext::Filename)
                        | AefError::Kdf(_)
                        | AefError::Truncated(_)
                ),
                "header byte {offset} bit {bit:#x}: unexpected error {err:?}"
            );
        }
    }
}

#[test]
fn filename_unit_flips_rejected() {
    let tmp = TempDir::new().unwrap();
    // "name1.txt" is 9 bytes
    let container = make_container(tmp.path(), "name1.txt", b"x", CipherSuite::Aes256GcmSiv, 1 << 20);
    let fn_len = 9;

    for offset in FIXED_HEADER_LEN..FIXED_HEADER_LEN + fn_len + TAG {
        let err = decrypt_mutated(&container, |b| b[offset] ^= 0x40).unwrap_err();
        assert!(
            matches!(err, AefError::Auth(AuthContext::Filename)),
            "offset {offset}: {err:?}"
        );
    }
}

#[test]
fn metadata_unit_flips_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = make_container(tmp.path(), "m.bin", b"x", CipherSuite::XChaCha20Poly1305, 1 << 20);
    let fn_len = 5;
    let meta_ct_start = FIXED_HEADER_LEN + fn_len + TAG + 4;

    for offset in meta_ct_start..meta_ct_start + 10 + TAG {
        let err = decrypt_mutated(&container, |b| b[offset] ^= 0x01).unwrap_err();
        assert!(
            matches!(err, AefError::Auth(AuthContext::Metadata)),
            "offset {offset}: {err:?}"
        );
    }
}

#[test]
fn chunk_flips_name_the_chunk() {
    let tmp = TempDir::new().unwrap();
    // Two 1024-byte chunks under AES-GCM-SIV.
    let content = vec![0u8; 2048];
    let container = make_container(tmp.path(), "two.bin", &content, CipherSuite::Aes256GcmSiv, 1024);
    let fn_len = 7;
    let chunks_start = FIXED_HEADER_LEN + fn_len + TAG + 4 + 10 + TAG;
    let triple = 4 + 1024 + TAG;

    // First ciphertext byte of chunk 2
    let c2_ct = chunks_start + triple + 4;
    let err = decrypt_mutated(&container, |b| b[c2_ct] ^= 0x01).unwrap_err();
    assert!(
        matches!(err, AefError::Auth(AuthContext::Chunk(2))),
        "{err:?}"
    );

    // A tag byte of chunk 1
    let c1_tag = chunks_start + 4 + 1024 + 3;
    let err = decrypt_mutated(&container, |b| b[c1_tag] ^= 0x01).unwrap_err();
    assert!(
        matches!(err, AefError::Auth(AuthContext::Chunk(1))),
        "{err:?}"
    );

    // A low bit of chunk 1's length prefix (stays within the container)
    let err = decrypt_mutated(&container, |b| b[chunks_start] ^= 0x01).unwrap_err();
    assert!(
        matches!(err, AefError::Auth(AuthContext::Chunk(1)) | AefError::Truncated(_)),
        "{err:?}"
    );
}

#[test]
fn swapped_chunks_fail_at_first_swapped_index() {
    let tmp = TempDir::new().unwrap();
    // "hello!\n" in 2-byte chunks: lengths 2, 2, 2, 1 at indices 1..4.
    let container = make_container(tmp.path(), "lorem.txt", b"hello!\n", CipherSuite::AuroraSiv, 2);
    let fn_len = 9;
    let chunks_start = FIXED_HEADER_LEN + fn_len + TAG + 4 + 10 + TAG;
    let triple = 4 + 2 + TAG;

    let err = decrypt_mutated(&container, |b| {
        let (c2, c3) = (chunks_start + triple, chunks_start + 2 * triple);
        for i in 0..triple {
            b.swap(c2 + i, c3 + i);
        }
    })
    .unwrap_err();
    assert!(
        matches!(err, AefError::Auth(AuthContext::Chunk(2))),
        "{err:?}"
    );
}

#[test]
fn mid_unit_truncation_rejected() {
    let tmp = TempDir::new().unwrap();
    let container = make_container(tmp.path(), "t.bin", b"0123456789", CipherSuite::XChaCha20Poly1305, 4);
    let total = fs::metadata(&container).unwrap().len() as usize;

    // Cut positions that land inside a unit: inside the final tag, inside
    // ciphertext, inside a length prefix, inside the filename unit.
    for k in [1usize, TAG - 1, TAG, TAG + 1, TAG + 3, TAG + 4 + 1, total - FIXED_HEADER_LEN - 1] {
        let err = decrypt_mutated(&container, |b| b.truncate(total - k)).unwrap_err();
        assert!(
            matches!(err, AefError::Truncated(_) | AefError::Auth(_) | AefError::BadFormat(_)),
            "cut {k}: {err:?}"
        );
    }

    // Cutting into the fixed header itself
    let err = decrypt_mutated(&container, |b| b.truncate(40)).unwrap_err();
    assert!(matches!(err, AefError::BadFormat(_)), "{err:?}");
}

#[test]
fn suite_byte_corruption() {
    let tmp = TempDir::new().unwrap();
    let container = make_container(tmp.path(), "s.txt", b"suite test", CipherSuite::XChaCha20Poly1305, 1 << 20);

    // Invalid tag value
    let err = decrypt_mutated(&container, |b| b[5] = 0x63).unwrap_err();
    assert!(matches!(err, AefError::UnknownSuite(0x63)), "{err:?}");

    // Valid but different suite: keys, nonce shape, and AD no longer line
    // up, so this dies at or before filename verification.
    let err = decrypt_mutated(&container, |b| b[5] = 0x04).unwrap_err();
    assert!(
        matches!(
            err,
            AefError::Auth(AuthContext::Filename) | AefError::BadFormat(_) | AefError::Truncated(_)
        ),
        "{err:?}"
    );
}

#[test]
fn cross_suite_containers_are_incompatible() {
    let tmp = TempDir::new().unwrap();
    let content = b"same plaintext, different suites";

    for (a, b) in [
        (CipherSuite::XChaCha20Poly1305, CipherSuite::Aes256GcmSiv),
        (CipherSuite::TwofishGcmSiv, CipherSuite::SerpentGcmSiv),
    ] {
        let ca = make_container(tmp.path(), "x.bin", content, a, 1 << 20);
        // Rewriting the suite byte to another valid suite must not decrypt.
        let err = decrypt_mutated(&ca, |bytes| bytes[5] = b.tag()).unwrap_err();
        assert!(
            !matches!(err, AefError::Io(_)),
            "suite {a}→{b}: unexpected {err:?}"
        );
        fs::remove_file(&ca).unwrap();
    }
}

#[test]
fn flipped_has_meta_flag_detected() {
    let tmp = TempDir::new().unwrap();
    let container = make_container(tmp.path(), "f.txt", b"flag test", CipherSuite::XChaCha20Poly1305, 1 << 20);

    // The flags byte is part of the filename AD, so toggling HasMeta is
    // caught before the reader ever mis-parses the section layout.
    let err = decrypt_mutated(&container, |b| b[6] ^= 0b10).unwrap_err();
    assert!(
        matches!(err, AefError::Auth(AuthContext::Filename)),
        "{err:?}"
    );
}

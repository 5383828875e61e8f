//! Aurora-SIV: the experimental suite behind wire tag 50
//!
//! A misuse-resistant SIV built from keyed BLAKE3 and ChaCha20. The 16-byte
//! tag is a truncated keyed MAC over `nonce ‖ LE64(|ad|) ‖ ad ‖ LE64(|pt|)
//! ‖ pt`; the keystream nonce is the tag itself, so the ciphertext depends
//! on every authenticated byte. Encryption is deterministic for a fixed
//! (key, nonce, ad, plaintext), as for the other SIV suites.
//!
//! The MAC and stream keys are separated from the 32-byte seal key by
//! keyed-BLAKE3 labels, mirroring the container's own sub-key schedule.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use aef_core::{AefError, AefResult};

use crate::aead::{Sealed, TagMismatch};
use crate::keys::SealKey;
use crate::TAG_SIZE;

pub(crate) const NONCE_LEN: usize = 16;

const MAC_LABEL: &[u8] = b"aurora-siv:mac";
const ENC_LABEL: &[u8] = b"aurora-siv:enc";

fn mac_tag(mac_key: &blake3::Hash, nonce: &[u8], ad: &[u8], plaintext: &[u8]) -> [u8; TAG_SIZE] {
    let mut hasher = blake3::Hasher::new_keyed(mac_key.as_bytes());
    hasher.update(nonce);
    hasher.update(&(ad.len() as u64).to_le_bytes());
    hasher.update(ad);
    hasher.update(&(plaintext.len() as u64).to_le_bytes());
    hasher.update(plaintext);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&hasher.finalize().as_bytes()[..TAG_SIZE]);
    tag
}

fn keystream_xor(enc_key: &blake3::Hash, tag: &[u8; TAG_SIZE], buf: &mut [u8]) {
    let mut iv = [0u8; 12];
    iv.copy_from_slice(&tag[..12]);
    let mut stream = ChaCha20::new(enc_key.as_bytes().into(), &iv.into());
    stream.apply_keystream(buf);
}

pub(crate) fn seal(key: &SealKey, nonce: &[u8], ad: &[u8], plaintext: &[u8]) -> AefResult<Sealed> {
    if nonce.len() != NONCE_LEN {
        return Err(AefError::Cipher("aurora-siv nonce must be 16 bytes".into()));
    }
    let mac_key = blake3::keyed_hash(key.as_bytes(), MAC_LABEL);
    let enc_key = blake3::keyed_hash(key.as_bytes(), ENC_LABEL);

    let tag = mac_tag(&mac_key, nonce, ad, plaintext);
    let mut ciphertext = plaintext.to_vec();
    keystream_xor(&enc_key, &tag, &mut ciphertext);

    Ok(Sealed { ciphertext, tag })
}

pub(crate) fn open(
    key: &SealKey,
    nonce: &[u8],
    ad: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>, TagMismatch> {
    if nonce.len() != NONCE_LEN {
        return Err(TagMismatch);
    }
    let mac_key = blake3::keyed_hash(key.as_bytes(), MAC_LABEL);
    let enc_key = blake3::keyed_hash(key.as_bytes(), ENC_LABEL);

    let mut plaintext = ciphertext.to_vec();
    keystream_xor(&enc_key, tag, &mut plaintext);

    let expected = mac_tag(&mac_key, nonce, ad, &plaintext);
    if bool::from(expected.ct_eq(tag)) {
        Ok(plaintext)
    } else {
        plaintext.zeroize();
        Err(TagMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    fn test_key() -> SealKey {
        SealKey::from_bytes([0x5a; KEY_SIZE])
    }

    #[test]
    fn roundtrip() {
        let key = test_key();
        let nonce = [3u8; NONCE_LEN];
        let sealed = seal(&key, &nonce, b"context", b"hello!\n").unwrap();
        assert_eq!(sealed.ciphertext.len(), 7);
        let opened = open(&key, &nonce, b"context", &sealed.ciphertext, &sealed.tag).unwrap();
        assert_eq!(opened, b"hello!\n");
    }

    #[test]
    fn empty_plaintext_still_authenticated() {
        let key = test_key();
        let nonce = [0u8; NONCE_LEN];
        let sealed = seal(&key, &nonce, b"ad", b"").unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert!(open(&key, &nonce, b"ad", &[], &sealed.tag).is_ok());
        assert!(open(&key, &nonce, b"other", &[], &sealed.tag).is_err());
    }

    #[test]
    fn tag_depends_on_nonce() {
        let key = test_key();
        let a = seal(&key, &[1u8; NONCE_LEN], b"", b"data").unwrap();
        let b = seal(&key, &[2u8; NONCE_LEN], b"", b"data").unwrap();
        assert_ne!(a.tag, b.tag);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn deterministic() {
        let key = test_key();
        let nonce = [7u8; NONCE_LEN];
        let a = seal(&key, &nonce, b"ad", b"data").unwrap();
        let b = seal(&key, &nonce, b"ad", b"data").unwrap();
        assert_eq!(a.ciphertext, b.ciphertext);
        assert_eq!(a.tag, b.tag);
    }

    #[test]
    fn flipped_tag_rejected() {
        let key = test_key();
        let nonce = [9u8; NONCE_LEN];
        let sealed = seal(&key, &nonce, b"", b"payload").unwrap();
        let mut bad_tag = sealed.tag;
        bad_tag[15] ^= 0x80;
        assert!(open(&key, &nonce, b"", &sealed.ciphertext, &bad_tag).is_err());
    }
}

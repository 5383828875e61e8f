//! Suite-polymorphic seal/open
//!
//! One interface over the six constructions. Ciphertext length always
//! equals plaintext length; the tag is always 16 bytes (for the SIV
//! family it is the synthetic IV). The caller supplies a nonce derived by
//! [`crate::nonce::derive_nonce`], whose length matches the suite.

use aes_gcm_siv::Aes256GcmSiv;
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use aef_core::{AefError, AefResult, CipherSuite};

use crate::aurora;
use crate::gcm_siv;
use crate::keys::SealKey;
use crate::nonce::UnitNonce;
use crate::TAG_SIZE;

/// Ciphertext plus detached 16-byte tag.
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

/// Opening failed verification. Carries no detail on purpose; the caller
/// knows which unit it was opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMismatch;

/// Authenticate-encrypt one unit under `suite`.
pub fn seal(
    suite: CipherSuite,
    key: &SealKey,
    nonce: &UnitNonce,
    ad: &[u8],
    plaintext: &[u8],
) -> AefResult<Sealed> {
    let nonce = nonce.as_bytes();
    debug_assert_eq!(nonce.len(), suite.nonce_len());

    match suite {
        CipherSuite::XChaCha20Poly1305 => {
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            let mut buf = plaintext.to_vec();
            let tag = cipher
                .encrypt_in_place_detached(XNonce::from_slice(nonce), ad, &mut buf)
                .map_err(|_| AefError::Cipher("xchacha20-poly1305 seal".into()))?;
            Ok(Sealed {
                ciphertext: buf,
                tag: tag.into(),
            })
        }
        CipherSuite::Aes256GcmSiv => {
            let cipher = Aes256GcmSiv::new(key.as_bytes().into());
            let mut buf = plaintext.to_vec();
            let tag = cipher
                .encrypt_in_place_detached(aes_gcm_siv::Nonce::from_slice(nonce), ad, &mut buf)
                .map_err(|_| AefError::Cipher("aes-gcm-siv seal".into()))?;
            Ok(Sealed {
                ciphertext: buf,
                tag: tag.into(),
            })
        }
        CipherSuite::TwofishGcmSiv => gcm_siv::seal::<twofish::Twofish>(key, nonce, ad, plaintext),
        CipherSuite::SerpentGcmSiv => gcm_siv::seal::<serpent::Serpent>(key, nonce, ad, plaintext),
        CipherSuite::CamelliaGcmSiv => {
            gcm_siv::seal::<camellia::Camellia256>(key, nonce, ad, plaintext)
        }
        CipherSuite::AuroraSiv => aurora::seal(key, nonce, ad, plaintext),
    }
}

/// Verify-decrypt one unit under `suite`. Fails with [`TagMismatch`] on any
/// verification failure; the plaintext is never released unverified.
pub fn open(
    suite: CipherSuite,
    key: &SealKey,
    nonce: &UnitNonce,
    ad: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>, TagMismatch> {
    let nonce = nonce.as_bytes();
    debug_assert_eq!(nonce.len(), suite.nonce_len());

    match suite {
        CipherSuite::XChaCha20Poly1305 => {
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            let mut buf = ciphertext.to_vec();
            cipher
                .decrypt_in_place_detached(XNonce::from_slice(nonce), ad, &mut buf, tag.into())
                .map_err(|_| TagMismatch)?;
            Ok(buf)
        }
        CipherSuite::Aes256GcmSiv => {
            let cipher = Aes256GcmSiv::new(key.as_bytes().into());
            let mut buf = ciphertext.to_vec();
            cipher
                .decrypt_in_place_detached(
                    aes_gcm_siv::Nonce::from_slice(nonce),
                    ad,
                    &mut buf,
                    tag.into(),
                )
                .map_err(|_| TagMismatch)?;
            Ok(buf)
        }
        CipherSuite::TwofishGcmSiv => {
            gcm_siv::open::<twofish::Twofish>(key, nonce, ad, ciphertext, tag)
        }
        CipherSuite::SerpentGcmSiv => {
            gcm_siv::open::<serpent::Serpent>(key, nonce, ad, ciphertext, tag)
        }
        CipherSuite::CamelliaGcmSiv => {
            gcm_siv::open::<camellia::Camellia256>(key, nonce, ad, ciphertext, tag)
        }
        CipherSuite::AuroraSiv => aurora::open(key, nonce, ad, ciphertext, tag),
    }
}

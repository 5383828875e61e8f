//! GCM-SIV (RFC 8452) over any 128-bit-block cipher
//!
//! The `aes-gcm-siv` crate covers the AES suite; this module provides the
//! same mode for the Twofish, Serpent, and Camellia suites, which have no
//! published AEAD packaging. POLYVAL comes from the `polyval` crate; the
//! block cipher is anything implementing the `cipher` crate's
//! `KeyInit + BlockEncrypt` with a 16-byte block.
//!
//! Key-generating key = the leading `KeySize` bytes of the 32-byte seal key
//! (all of it for 256-bit ciphers). Per-nonce keys, the POLYVAL tag, and the
//! 32-bit little-endian counter mode follow RFC 8452 exactly; the output tag
//! is the 16-byte synthetic IV.

use cipher::generic_array::typenum::U16;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, BlockSizeUser, KeyInit, KeySizeUser};
use polyval::universal_hash::UniversalHash;
use polyval::Polyval;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use aef_core::{AefError, AefResult};

use crate::aead::{Sealed, TagMismatch};
use crate::keys::SealKey;
use crate::TAG_SIZE;

pub(crate) const NONCE_LEN: usize = 12;

type Block = GenericArray<u8, U16>;

/// Derive the per-nonce POLYVAL key and message-encryption cipher from the
/// key-generating key (RFC 8452 §4).
fn per_nonce_keys<C>(seal_key: &SealKey, nonce: &[u8]) -> AefResult<([u8; 16], C)>
where
    C: KeyInit + BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    debug_assert_eq!(nonce.len(), NONCE_LEN);

    let key_len = C::key_size().min(seal_key.as_bytes().len());
    let kgk = C::new_from_slice(&seal_key.as_bytes()[..key_len])
        .map_err(|e| AefError::Cipher(format!("key-generating key setup: {e}")))?;

    // Each counter block contributes its first 8 ciphertext bytes:
    // blocks 0..2 form the POLYVAL key, the rest the encryption key.
    let mut okm = [0u8; 48];
    let blocks = 2 + key_len.div_ceil(8);
    for i in 0..blocks {
        let mut block = Block::default();
        block[..4].copy_from_slice(&(i as u32).to_le_bytes());
        block[4..].copy_from_slice(nonce);
        kgk.encrypt_block(&mut block);
        okm[i * 8..i * 8 + 8].copy_from_slice(&block[..8]);
    }

    let mut auth_key = [0u8; 16];
    auth_key.copy_from_slice(&okm[..16]);
    let enc = C::new_from_slice(&okm[16..16 + key_len])
        .map_err(|e| AefError::Cipher(format!("message key setup: {e}")))?;
    okm.zeroize();

    Ok((auth_key, enc))
}

/// POLYVAL over zero-padded AD and plaintext plus the length block, nonce
/// XORed in, top bit cleared, then one block encryption: the synthetic IV.
fn synthetic_iv<C>(auth_key: &[u8; 16], enc: &C, nonce: &[u8], ad: &[u8], plaintext: &[u8]) -> Block
where
    C: BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let mut poly = Polyval::new(GenericArray::from_slice(auth_key));
    poly.update_padded(ad);
    poly.update_padded(plaintext);

    let mut length_block = Block::default();
    length_block[..8].copy_from_slice(&(ad.len() as u64 * 8).to_le_bytes());
    length_block[8..].copy_from_slice(&(plaintext.len() as u64 * 8).to_le_bytes());
    poly.update(&[length_block]);

    let mut siv = poly.finalize();
    for (s, n) in siv.iter_mut().zip(nonce.iter()) {
        *s ^= n;
    }
    siv[15] &= 0x7f;
    enc.encrypt_block(&mut siv);
    siv
}

/// CTR keystream with a 32-bit little-endian counter in the first four
/// bytes of the tag block, top bit of the last byte forced on.
fn ctr32_xor<C>(enc: &C, tag: &Block, buf: &mut [u8])
where
    C: BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let mut counter_block = *tag;
    counter_block[15] |= 0x80;
    let mut counter = u32::from_le_bytes(counter_block[..4].try_into().expect("4 bytes"));

    for chunk in buf.chunks_mut(16) {
        let mut keystream = counter_block;
        keystream[..4].copy_from_slice(&counter.to_le_bytes());
        enc.encrypt_block(&mut keystream);
        for (b, k) in chunk.iter_mut().zip(keystream.iter()) {
            *b ^= k;
        }
        counter = counter.wrapping_add(1);
    }
}

pub(crate) fn seal<C>(
    key: &SealKey,
    nonce: &[u8],
    ad: &[u8],
    plaintext: &[u8],
) -> AefResult<Sealed>
where
    C: KeyInit + BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let (auth_key, enc) = per_nonce_keys::<C>(key, nonce)?;
    let tag = synthetic_iv(&auth_key, &enc, nonce, ad, plaintext);

    let mut ciphertext = plaintext.to_vec();
    ctr32_xor(&enc, &tag, &mut ciphertext);

    Ok(Sealed {
        ciphertext,
        tag: tag.into(),
    })
}

pub(crate) fn open<C>(
    key: &SealKey,
    nonce: &[u8],
    ad: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>, TagMismatch>
where
    C: KeyInit + BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    let (auth_key, enc) = per_nonce_keys::<C>(key, nonce).map_err(|_| TagMismatch)?;

    let tag_block = Block::clone_from_slice(tag);
    let mut plaintext = ciphertext.to_vec();
    ctr32_xor(&enc, &tag_block, &mut plaintext);

    let expected = synthetic_iv(&auth_key, &enc, nonce, ad, &plaintext);
    if bool::from(expected.as_slice().ct_eq(tag)) {
        Ok(plaintext)
    } else {
        plaintext.zeroize();
        Err(TagMismatch)
    }
}

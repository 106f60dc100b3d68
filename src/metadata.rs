//! Encrypted metadata attached to membership records.
//!
//! A UTF-8 message is packed into 250-bit field chunks and encrypted with the
//! Poseidon stream cipher under an ECDH key shared with the recipient's
//! BabyJubJub public key. The payload is a flat sequence of 32-byte
//! big-endian words:
//!
//! ```text
//! length ‖ nonce ‖ authKey.x ‖ authKey.y ‖ cipher[0] ‖ … ‖ cipher[k-1]
//! ```

use crate::babyjub::{BabyJub, Point, SecureRandom};
use crate::constants::{HASH_SIZE, METADATA_CHUNK_BITS};
use crate::error::{CurveError, MetadataError};
use crate::poseidon::{cipher_length, poseidon_decrypt, poseidon_encrypt};
use crate::utils::{field_to_bytes, strip_hex_prefix, to_hex_prefixed};
use log::debug;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand::rngs::OsRng;

/// Words before the ciphertext: length, nonce and both auth key coordinates.
const HEADER_WORDS: usize = 4;

pub const HEADER_SIZE: usize = HEADER_WORDS * HASH_SIZE;

/// Splits a UTF-8 string into little-endian 250-bit chunks of its big-endian
/// byte value. Returns the chunks and their count; `""` maps to `([0], 1)`.
#[must_use]
pub fn str2int(s: &str) -> (Vec<BigUint>, usize) {
    let mut remaining = BigUint::from_bytes_be(s.as_bytes());
    if remaining.is_zero() {
        return (vec![BigUint::zero()], 1);
    }

    let mask = (BigUint::from(1u32) << METADATA_CHUNK_BITS) - 1u32;
    let mut chunks = Vec::new();
    while !remaining.is_zero() {
        chunks.push(&remaining & &mask);
        remaining >>= METADATA_CHUNK_BITS;
    }

    let count = chunks.len();
    (chunks, count)
}

/// Inverse of [`str2int`]. Invalid UTF-8 is replaced and NUL characters
/// are dropped.
#[must_use]
pub fn int2str(chunks: &[BigUint]) -> String {
    let value = chunks
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, chunk| (acc << METADATA_CHUNK_BITS) + chunk);
    if value.is_zero() {
        return String::new();
    }

    String::from_utf8_lossy(&value.to_bytes_be()).replace('\0', "")
}

fn push_word(payload: &mut Vec<u8>, value: &BigUint) -> Result<(), MetadataError> {
    let word = field_to_bytes(value).ok_or_else(|| {
        MetadataError::MalformedPayload("value does not fit in 32 bytes".to_string())
    })?;
    payload.extend_from_slice(&word);
    Ok(())
}

/// Encrypts `message` for the holder of `public_key` using the operating
/// system generator.
///
/// # Errors
///
/// * [`MetadataError::Curve`] if no secure entropy is available or the key is
///   not on the curve.
/// * [`MetadataError::Hash`] if the key coordinates are out of the field.
pub fn encrypt_metadata(public_key: &Point, message: &str) -> Result<Vec<u8>, MetadataError> {
    encrypt_metadata_with_rng(&mut OsRng, public_key, message)
}

/// [`encrypt_metadata`] with an injected secure source.
///
/// # Errors
///
/// Same as [`encrypt_metadata`].
pub fn encrypt_metadata_with_rng<R: SecureRandom + ?Sized>(
    rng: &mut R,
    public_key: &Point,
    message: &str,
) -> Result<Vec<u8>, MetadataError> {
    let curve = BabyJub::default();
    curve.assert_in_curve(public_key)?;

    let (chunks, length) = str2int(message);

    let random = BabyJub::generate_random_value(rng)?;
    let mut nonce_bytes = [0u8; 16];
    rng.fill_secure(&mut nonce_bytes)?;
    let nonce = u128::from_be_bytes(nonce_bytes);

    let auth_key = curve.mul_with_scalar(curve.base8(), &random)?;
    let shared_key = curve.mul_with_scalar(public_key, &random)?;
    let cipher = poseidon_encrypt(&chunks, &shared_key, nonce)?;

    let mut payload = Vec::with_capacity(HEADER_SIZE + cipher.len() * HASH_SIZE);
    push_word(&mut payload, &BigUint::from(length))?;
    push_word(&mut payload, &BigUint::from(nonce))?;
    push_word(&mut payload, &auth_key.x)?;
    push_word(&mut payload, &auth_key.y)?;
    for element in &cipher {
        push_word(&mut payload, element)?;
    }

    debug!(
        "Encrypted metadata: {} chunks, {} payload bytes",
        length,
        payload.len()
    );
    Ok(payload)
}

/// Decrypts a payload produced by [`encrypt_metadata`].
///
/// # Errors
///
/// * [`MetadataError::MalformedPayload`] for a short payload, a size that is
///   not a whole number of words, a chunk count inconsistent with the
///   declared length, an oversized nonce or an auth key off the curve.
/// * [`MetadataError::DecryptionFailed`] when the key is wrong or the
///   ciphertext was altered.
pub fn decrypt_metadata(private_key: &BigUint, payload: &[u8]) -> Result<String, MetadataError> {
    if payload.len() < HEADER_SIZE {
        return Err(MetadataError::MalformedPayload(format!(
            "payload is {} bytes, header alone is {HEADER_SIZE}",
            payload.len()
        )));
    }
    if payload.len() % HASH_SIZE != 0 {
        return Err(MetadataError::MalformedPayload(format!(
            "payload length {} is not a multiple of {HASH_SIZE}",
            payload.len()
        )));
    }

    let words: Vec<BigUint> = payload
        .chunks(HASH_SIZE)
        .map(BigUint::from_bytes_be)
        .collect();
    let (header, cipher) = words.split_at(HEADER_WORDS);

    let length = header[0]
        .to_usize()
        .filter(|&len| cipher_length(len) == Some(cipher.len()))
        .ok_or_else(|| {
            MetadataError::MalformedPayload(format!(
                "declared length {} does not match {} ciphertext words",
                header[0],
                cipher.len()
            ))
        })?;
    let nonce = header[1]
        .to_u128()
        .ok_or_else(|| MetadataError::MalformedPayload("nonce exceeds 128 bits".to_string()))?;

    let curve = BabyJub::default();
    let auth_key = Point::new(header[2].clone(), header[3].clone());
    curve.assert_in_curve(&auth_key).map_err(|e| match e {
        CurveError::PointNotOnCurve => {
            MetadataError::MalformedPayload("auth key is not on the curve".to_string())
        }
        other => MetadataError::Curve(other),
    })?;

    let shared_key = curve.mul_with_scalar(&auth_key, private_key)?;
    let chunks = poseidon_decrypt(cipher, &shared_key, nonce, length)?;

    Ok(int2str(&chunks))
}

/// [`encrypt_metadata`] returning `0x`-prefixed hex.
///
/// # Errors
///
/// Same as [`encrypt_metadata`].
pub fn encrypt_metadata_hex(public_key: &Point, message: &str) -> Result<String, MetadataError> {
    encrypt_metadata(public_key, message).map(|payload| to_hex_prefixed(&payload))
}

/// [`decrypt_metadata`] over hex text, with or without `0x`.
///
/// # Errors
///
/// [`MetadataError::MalformedPayload`] for invalid hex, otherwise same as
/// [`decrypt_metadata`].
pub fn decrypt_metadata_hex(private_key: &BigUint, payload: &str) -> Result<String, MetadataError> {
    let bytes = hex::decode(strip_hex_prefix(payload))
        .map_err(|e| MetadataError::MalformedPayload(e.to_string()))?;
    decrypt_metadata(private_key, &bytes)
}

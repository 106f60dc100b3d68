//! Deterministic derivation of curve scalars from wallet signatures.
//!
//! A wallet signs a fixed seed message (see [`seed_message`]). The `r`
//! component of that signature is ground into a scalar below a target
//! modulus by rejection sampling over SHA-256, and the resulting raw key is
//! clamped into a BabyJubJub private scalar by [`format_key_for_curve`].

use crate::babyjub::{BabyJub, Point};
use crate::constants::{
    BN254_SCALAR_FIELD, GRIND_ITERATION_LIMIT, SHA256_MAX_DIGEST, SUB_GROUP_ORDER,
};
use crate::error::KeyDerivationError;
use crate::utils::{decode_hex_lenient, strip_hex_prefix};
use blake_hash::{Blake512, Digest as BlakeDigest};
use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex characters of the ECDSA `r` component at the start of a signature.
const SIGNATURE_R_HEX_LEN: usize = 64;

pub const DEFAULT_CHAIN_ID: &str = "0000";

pub const BJJ_KEY_MESSAGE_TEMPLATE: &str =
    "PrivateMembershipPoints: BJJ Key seed\naddr:{address}\nchainId:{chain_id}\nsalt:PMP/v1/BJJ-key";

pub const SECRET_ID_MESSAGE_TEMPLATE: &str =
    "PrivateMembershipPoints: sId\naddr:{address}\nchaindId:{chain_id}\nsalt:PMP/v1/SID";

pub const NULLIFIER_TRAPDOOR_MESSAGE_TEMPLATE: &str = "PrivateMembershipPoints: dervice nullifier and trapdoor seed\naddr:{address}\nchaindId:{chain_id}\nsalt:PMP/v1/trapdoor-nullifer";

/// `SHA256(seed ‖ index)` read as a big-endian integer.
///
/// The index is appended as the shortest whole number of big-endian bytes
/// (one byte below 256, two bytes above). Seed and index are joined as hex
/// text before decoding, so an odd-length seed shifts the index nibble into
/// its last byte exactly as wallet tooling does.
///
/// # Errors
///
/// [`KeyDerivationError::MalformedSeed`] if the seed is not hex.
pub fn hash_key_with_index(seed: &str, index: u16) -> Result<BigUint, KeyDerivationError> {
    let mut index_hex = format!("{index:x}");
    if index_hex.len() % 2 != 0 {
        index_hex.insert(0, '0');
    }
    let input = format!("{}{}", strip_hex_prefix(seed), index_hex);
    let bytes =
        decode_hex_lenient(&input).map_err(|e| KeyDerivationError::MalformedSeed(e.to_string()))?;
    Ok(BigUint::from_bytes_be(&Sha256::digest(&bytes)))
}

/// Grinds `seed` into a value below `limit` without modulo bias.
///
/// Candidates at or above the largest multiple of `limit` that fits in 256
/// bits are rejected. Returns lowercase hex without `0x` or zero padding.
///
/// # Errors
///
/// * [`KeyDerivationError::InvalidLimit`] for a zero limit.
/// * [`KeyDerivationError::MalformedSeed`] if the seed is not hex.
/// * [`KeyDerivationError::KeyDerivationExhausted`] when no candidate is
///   accepted within the iteration limit.
pub fn grind_key_with_limit(seed: &str, limit: &BigUint) -> Result<String, KeyDerivationError> {
    if limit.is_zero() {
        return Err(KeyDerivationError::InvalidLimit);
    }
    let max_allowed = &*SHA256_MAX_DIGEST - (&*SHA256_MAX_DIGEST % limit);

    for index in 0..GRIND_ITERATION_LIMIT {
        let candidate = hash_key_with_index(seed, index)?;
        if candidate < max_allowed {
            debug!("Grinding accepted candidate at index {}", index);
            return Ok((candidate % limit).to_str_radix(16));
        }
    }

    Err(KeyDerivationError::KeyDerivationExhausted {
        iterations: GRIND_ITERATION_LIMIT,
    })
}

/// Grinds a raw private key below the BabyJubJub subgroup order.
///
/// # Errors
///
/// See [`grind_key_with_limit`].
pub fn grind_key(seed: &str) -> Result<String, KeyDerivationError> {
    grind_key_with_limit(seed, &SUB_GROUP_ORDER)
}

/// Grinds a secret identifier below the BN254 scalar field prime.
///
/// # Errors
///
/// See [`grind_key_with_limit`].
pub fn grind_key_id(seed: &str) -> Result<String, KeyDerivationError> {
    grind_key_with_limit(seed, &BN254_SCALAR_FIELD)
}

fn signature_r(signature: &str) -> Result<&str, KeyDerivationError> {
    strip_hex_prefix(signature)
        .get(..SIGNATURE_R_HEX_LEN)
        .ok_or_else(|| {
            KeyDerivationError::MalformedSeed(format!(
                "signature must start with {SIGNATURE_R_HEX_LEN} hex characters"
            ))
        })
}

/// Raw private key from the `r` half of a signature.
///
/// # Errors
///
/// [`KeyDerivationError::MalformedSeed`] for signatures shorter than `r`,
/// otherwise see [`grind_key_with_limit`].
///
/// # Examples
///
/// ```
/// use private_membership::key::get_private_key_from_signature;
///
/// let signature = "0x21fbf0696d5e0aa2ef41a2b4ffb623bcaf070461d61cf7251c74161f82fec3a4\
///                  370854bc0a34b3ab487c1bc021cd318c734c51ae29374f2beb0e6f2dd49b4bf41c";
/// let key = get_private_key_from_signature(signature).unwrap();
/// assert_eq!(key, "91ca6a724408ee9b5dc7330702ebb8339f7b95c5041a546b2241bce05b640d");
/// ```
pub fn get_private_key_from_signature(signature: &str) -> Result<String, KeyDerivationError> {
    grind_key(signature_r(signature)?)
}

/// Secret identifier from the `r` half of a signature, ground below the
/// BN254 scalar field.
///
/// Deployed registrations were derived from the unsalted `r`, so no domain
/// separation salt is mixed in here.
///
/// # Errors
///
/// Same as [`get_private_key_from_signature`].
pub fn get_secret_id_from_signature(signature: &str) -> Result<String, KeyDerivationError> {
    grind_key_id(signature_r(signature)?)
}

/// Clamps a raw hex key into a BabyJubJub private scalar.
///
/// BLAKE-512 of the key bytes, first 32 bytes pruned Edwards-style, read
/// little-endian, shifted right by three and reduced modulo the subgroup
/// order. A trailing odd nibble in `key` is ignored.
///
/// # Errors
///
/// [`KeyDerivationError::MalformedSeed`] if `key` is not hex.
pub fn format_key_for_curve(key: &str) -> Result<BigUint, KeyDerivationError> {
    let bytes =
        decode_hex_lenient(key).map_err(|e| KeyDerivationError::MalformedSeed(e.to_string()))?;
    let digest = <Blake512 as BlakeDigest>::digest(&bytes);

    let mut pruned = [0u8; 32];
    pruned.copy_from_slice(&digest[..32]);
    pruned[0] &= 0xF8;
    pruned[31] = (pruned[31] & 0x7F) | 0x40;

    let scalar = BigUint::from_bytes_le(&pruned) >> 3u32;
    Ok(scalar % &*SUB_GROUP_ORDER)
}

/// BabyJubJub key pair derived from a wallet signature.
#[derive(Clone, PartialEq, Eq)]
pub struct BjjKeyPair {
    /// Ground key before clamping, as lowercase hex.
    pub raw_key: String,
    pub private_key: BigUint,
    pub public_key: Point,
}

impl BjjKeyPair {
    /// Signature → [`get_private_key_from_signature`] →
    /// [`format_key_for_curve`] → `sk · Base8`.
    ///
    /// # Errors
    ///
    /// Any grinding or curve failure along the way.
    pub fn from_signature(signature: &str) -> Result<Self, KeyDerivationError> {
        Self::from_signature_on(&BabyJub::default(), signature)
    }

    /// Same as [`BjjKeyPair::from_signature`] with an existing curve engine.
    ///
    /// # Errors
    ///
    /// Any grinding or curve failure along the way.
    pub fn from_signature_on(curve: &BabyJub, signature: &str) -> Result<Self, KeyDerivationError> {
        let raw_key = get_private_key_from_signature(signature)?;
        let private_key = format_key_for_curve(&raw_key)?;
        let public_key = curve.generate_public_key(&private_key)?;
        Ok(Self {
            raw_key,
            private_key,
            public_key,
        })
    }
}

// Never print secret material.
impl fmt::Debug for BjjKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BjjKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Which seed a signed message produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedPurpose {
    BjjKey,
    SecretId,
    NullifierTrapdoor,
}

impl SeedPurpose {
    pub const ALL: [SeedPurpose; 3] = [
        SeedPurpose::BjjKey,
        SeedPurpose::SecretId,
        SeedPurpose::NullifierTrapdoor,
    ];

    /// Built-in message template with `{address}` and `{chain_id}`
    /// placeholders.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            SeedPurpose::BjjKey => BJJ_KEY_MESSAGE_TEMPLATE,
            SeedPurpose::SecretId => SECRET_ID_MESSAGE_TEMPLATE,
            SeedPurpose::NullifierTrapdoor => NULLIFIER_TRAPDOOR_MESSAGE_TEMPLATE,
        }
    }
}

impl fmt::Display for SeedPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedPurpose::BjjKey => "bjj-key",
            SeedPurpose::SecretId => "secret-id",
            SeedPurpose::NullifierTrapdoor => "nullifier-trapdoor",
        };
        f.write_str(name)
    }
}

/// Fills `{address}` and `{chain_id}` in a message template.
#[must_use]
pub fn render_seed_message(template: &str, address: &str, chain_id: &str) -> String {
    template
        .replace("{address}", address)
        .replace("{chain_id}", chain_id)
}

/// The message a wallet signs to produce the seed for `purpose`.
///
/// Wording must stay byte-identical to what existing members signed.
/// `address` should already be EIP-55 checksummed.
#[must_use]
pub fn seed_message(purpose: SeedPurpose, address: &str, chain_id: &str) -> String {
    render_seed_message(purpose.default_template(), address, chain_id)
}

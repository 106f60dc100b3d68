//! Membership commitment derivation.
//!
//! `hash = Poseidon(secretId, Poseidon(nullifier, trapdoor))`, where the
//! three secrets are reduced Keccak digests of wallet signatures.

use crate::constants::{BN254_SCALAR_FIELD, HASH_SIZE};
use crate::error::MembershipHashError;
use crate::poseidon::poseidon_hash;
use crate::utils::{bytes_to_field, decimal, to_hex_prefixed};
use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

const NULLIFIER_SUFFIX: &str = "nullifier";
const TRAPDOOR_SUFFIX: &str = "trapdoor";

/// The commitment and the secrets it binds. Serialized with decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipHash {
    #[serde(with = "decimal")]
    pub hash: BigUint,
    #[serde(with = "decimal")]
    pub nullifier: BigUint,
    #[serde(with = "decimal")]
    pub trapdoor: BigUint,
    #[serde(with = "decimal")]
    pub identifiers_hash: BigUint,
    #[serde(with = "decimal")]
    pub secret_id: BigUint,
}

fn keccak256(data: &[u8]) -> [u8; HASH_SIZE] {
    Keccak256::digest(data).into()
}

/// `uint(digest) mod Fr`.
#[must_use]
pub fn field_reduce(digest: &[u8; HASH_SIZE]) -> BigUint {
    bytes_to_field(digest) % &*BN254_SCALAR_FIELD
}

/// `Keccak256(utf8(text)) mod Fr`.
#[must_use]
pub fn to_field(text: &str) -> BigUint {
    field_reduce(&keccak256(text.as_bytes()))
}

// Registered commitments hash the digest's 0x-hex text a second time.
fn derive_secret(text: &str) -> BigUint {
    to_field(&to_hex_prefixed(&keccak256(text.as_bytes())))
}

/// Derives the membership commitment from the nullifier/trapdoor seed
/// signature and the secret-id seed signature.
///
/// Deterministic: equal seeds always give equal outputs.
///
/// # Errors
///
/// Propagates Poseidon failures, which cannot occur for reduced inputs.
pub fn generate_membership_hash(
    seed: &str,
    secret_id_seed: &str,
) -> Result<MembershipHash, MembershipHashError> {
    let nullifier = derive_secret(&format!("{seed}{NULLIFIER_SUFFIX}"));
    let trapdoor = derive_secret(&format!("{seed}{TRAPDOOR_SUFFIX}"));
    let identifiers_hash = poseidon_hash(&[nullifier.clone(), trapdoor.clone()])?;

    let secret_id = derive_secret(secret_id_seed);
    let hash = poseidon_hash(&[secret_id.clone(), identifiers_hash.clone()])?;

    debug!("Derived membership commitment {}", hash);

    Ok(MembershipHash {
        hash,
        nullifier,
        trapdoor,
        identifiers_hash,
        secret_id,
    })
}

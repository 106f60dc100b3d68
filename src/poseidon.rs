//! Circom-compatible Poseidon over the BN254 scalar field.
//!
//! Hashing delegates to `light-poseidon`. The raw permutation is rebuilt from
//! the same round constants so the sponge-based stream cipher used for
//! encrypted metadata matches circuits and existing ciphertexts.

use crate::babyjub::Point;
use crate::constants::BN254_SCALAR_FIELD;
use crate::error::{MembershipHashError, MetadataError};
use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;

/// State width of the stream cipher: one capacity element and a rate of three.
const CIPHER_WIDTH: usize = 4;
const CIPHER_RATE: usize = CIPHER_WIDTH - 1;

/// Converts a canonical integer into `Fr`.
///
/// # Errors
///
/// [`MembershipHashError::InputExceedsField`] if `value ≥ Fr`.
pub fn to_fr(value: &BigUint) -> Result<Fr, MembershipHashError> {
    if value >= &*BN254_SCALAR_FIELD {
        return Err(MembershipHashError::InputExceedsField);
    }
    Ok(Fr::from_be_bytes_mod_order(&value.to_bytes_be()))
}

#[must_use]
pub fn from_fr(value: &Fr) -> BigUint {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be())
}

/// Poseidon hash of 1 to 12 field elements with circomlib parameters.
///
/// # Errors
///
/// * [`MembershipHashError::InputExceedsField`] if any input is `≥ Fr`.
/// * [`MembershipHashError::Poseidon`] for an unsupported arity.
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use private_membership::poseidon::poseidon_hash;
///
/// let h = poseidon_hash(&[BigUint::from(1u32), BigUint::from(2u32)]).unwrap();
/// assert_eq!(
///     h.to_string(),
///     "7853200120776062878684798364095072458815029376092732009249414926327459813530"
/// );
/// ```
pub fn poseidon_hash(inputs: &[BigUint]) -> Result<BigUint, MembershipHashError> {
    let elements = inputs
        .iter()
        .map(to_fr)
        .collect::<Result<Vec<_>, _>>()?;

    let mut hasher = Poseidon::<Fr>::new_circom(elements.len())
        .map_err(|e| MembershipHashError::Poseidon(e.to_string()))?;
    let digest = hasher
        .hash(&elements)
        .map_err(|e| MembershipHashError::Poseidon(e.to_string()))?;

    Ok(from_fr(&digest))
}

fn permute_in_place(state: &mut [Fr]) -> Result<(), MembershipHashError> {
    let width = u8::try_from(state.len())
        .map_err(|_| MembershipHashError::Poseidon(format!("unsupported width {}", state.len())))?;
    let params = get_poseidon_parameters::<Fr>(width)
        .map_err(|e| MembershipHashError::Poseidon(e.to_string()))?;

    let width = params.width;
    let half_full = params.full_rounds / 2;
    let total = params.full_rounds + params.partial_rounds;

    for round in 0..total {
        for (i, element) in state.iter_mut().enumerate() {
            *element += params.ark[round * width + i];
        }

        if round < half_full || round >= half_full + params.partial_rounds {
            for element in state.iter_mut() {
                *element = element.pow([params.alpha]);
            }
        } else {
            state[0] = state[0].pow([params.alpha]);
        }

        let mixed: Vec<Fr> = params
            .mds
            .iter()
            .map(|row| {
                row.iter()
                    .zip(state.iter())
                    .fold(Fr::zero(), |acc, (m, s)| acc + *m * s)
            })
            .collect();
        state.copy_from_slice(&mixed);
    }

    Ok(())
}

/// The raw Poseidon permutation of width `state.len()` (2 to 13).
///
/// # Errors
///
/// * [`MembershipHashError::InputExceedsField`] if a state element is `≥ Fr`.
/// * [`MembershipHashError::Poseidon`] for an unsupported width.
pub fn poseidon_permute(state: &[BigUint]) -> Result<Vec<BigUint>, MembershipHashError> {
    let mut elements = state
        .iter()
        .map(to_fr)
        .collect::<Result<Vec<_>, _>>()?;
    permute_in_place(&mut elements)?;
    Ok(elements.iter().map(from_fr).collect())
}

fn initial_cipher_state(
    key: &Point,
    nonce: u128,
    length: usize,
) -> Result<[Fr; CIPHER_WIDTH], MembershipHashError> {
    let domain = (BigUint::from(length) << 128u32) + BigUint::from(nonce);
    Ok([
        Fr::zero(),
        to_fr(&key.x)?,
        to_fr(&key.y)?,
        Fr::from_be_bytes_mod_order(&domain.to_bytes_be()),
    ])
}

/// Number of ciphertext elements produced for a message of `length`
/// elements: whole blocks of three plus the authentication tag. `None` when
/// the count does not fit in `usize`.
#[must_use]
pub fn cipher_length(length: usize) -> Option<usize> {
    length
        .div_ceil(CIPHER_RATE)
        .checked_mul(CIPHER_RATE)?
        .checked_add(1)
}

/// Encrypts field elements with the Poseidon duplex sponge keyed by a shared
/// curve point.
///
/// # Errors
///
/// [`MembershipHashError::InputExceedsField`] if a message element or key
/// coordinate is `≥ Fr`.
pub fn poseidon_encrypt(
    message: &[BigUint],
    key: &Point,
    nonce: u128,
) -> Result<Vec<BigUint>, MembershipHashError> {
    let mut state = initial_cipher_state(key, nonce, message.len())?;

    let mut padded = message
        .iter()
        .map(to_fr)
        .collect::<Result<Vec<_>, _>>()?;
    padded.resize(message.len().div_ceil(CIPHER_RATE) * CIPHER_RATE, Fr::zero());

    let mut cipher = Vec::with_capacity(cipher_length(message.len()).unwrap_or_default());
    for block in padded.chunks(CIPHER_RATE) {
        permute_in_place(&mut state)?;
        for (i, m) in block.iter().enumerate() {
            state[i + 1] += m;
            cipher.push(state[i + 1]);
        }
    }

    permute_in_place(&mut state)?;
    cipher.push(state[1]);

    Ok(cipher.iter().map(from_fr).collect())
}

/// Inverse of [`poseidon_encrypt`]. Verifies the zero padding and the
/// authentication tag before returning the first `length` elements.
///
/// # Errors
///
/// * [`MetadataError::DecryptionFailed`] on a length mismatch, non-zero
///   padding or a tag mismatch.
/// * [`MetadataError::Hash`] if an element or key coordinate is `≥ Fr`.
pub fn poseidon_decrypt(
    cipher: &[BigUint],
    key: &Point,
    nonce: u128,
    length: usize,
) -> Result<Vec<BigUint>, MetadataError> {
    if cipher_length(length) != Some(cipher.len()) {
        return Err(MetadataError::DecryptionFailed(
            "ciphertext length does not match message length",
        ));
    }

    let mut state = initial_cipher_state(key, nonce, length)?;
    let elements = cipher
        .iter()
        .map(to_fr)
        .collect::<Result<Vec<_>, _>>()?;
    let (blocks, tag) = elements.split_at(elements.len() - 1);

    let mut message = Vec::with_capacity(blocks.len());
    for block in blocks.chunks(CIPHER_RATE) {
        permute_in_place(&mut state)?;
        for (i, c) in block.iter().enumerate() {
            message.push(*c - state[i + 1]);
            state[i + 1] = *c;
        }
    }

    if message[length..].iter().any(|m| !m.is_zero()) {
        return Err(MetadataError::DecryptionFailed("padding is not zero"));
    }

    permute_in_place(&mut state)?;
    if state[1] != tag[0] {
        return Err(MetadataError::DecryptionFailed(
            "authentication tag does not match",
        ));
    }

    message.truncate(length);
    Ok(message.iter().map(from_fr).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::babyjub::BabyJub;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn shared_key() -> Point {
        let curve = BabyJub::default();
        curve.generate_public_key(&big(987_654_321)).unwrap()
    }

    #[test]
    fn test_poseidon_known_vector() {
        let h = poseidon_hash(&[big(1), big(2)]).unwrap();
        assert_eq!(
            h.to_string(),
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
        );
    }

    #[test]
    fn test_poseidon_rejects_out_of_field_input() {
        let too_big = BN254_SCALAR_FIELD.clone();
        assert_eq!(
            poseidon_hash(&[big(1), too_big]),
            Err(MembershipHashError::InputExceedsField)
        );
    }

    #[test]
    fn test_poseidon_rejects_empty_input() {
        assert!(matches!(
            poseidon_hash(&[]),
            Err(MembershipHashError::Poseidon(_))
        ));
    }

    #[test]
    fn test_permutation_agrees_with_hasher() {
        // Circom hashing is the permutation with a zero capacity element.
        let inputs = [big(1), big(2)];
        let permuted = poseidon_permute(&[big(0), big(1), big(2)]).unwrap();
        assert_eq!(permuted[0], poseidon_hash(&inputs).unwrap());

        let inputs = [big(7), big(8), big(9)];
        let permuted = poseidon_permute(&[big(0), big(7), big(8), big(9)]).unwrap();
        assert_eq!(permuted[0], poseidon_hash(&inputs).unwrap());
    }

    #[test]
    fn test_fr_conversion_round_trip() {
        let value = &*BN254_SCALAR_FIELD - 1u32;
        assert_eq!(from_fr(&to_fr(&value).unwrap()), value);
    }

    #[test]
    fn test_cipher_length() {
        assert_eq!(cipher_length(0), Some(1));
        assert_eq!(cipher_length(1), Some(4));
        assert_eq!(cipher_length(3), Some(4));
        assert_eq!(cipher_length(4), Some(7));
    }

    #[test]
    fn test_cipher_length_overflow() {
        assert_eq!(cipher_length(usize::MAX), None);
        assert_eq!(cipher_length(usize::MAX - 2), None);
    }

    #[test]
    fn test_decrypt_rejects_huge_length() {
        let key = shared_key();
        let cipher = poseidon_encrypt(&[big(7)], &key, 1).unwrap();
        assert_eq!(
            poseidon_decrypt(&cipher, &key, 1, usize::MAX),
            Err(MetadataError::DecryptionFailed(
                "ciphertext length does not match message length"
            ))
        );
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = shared_key();
        for length in 1..=7u64 {
            let message: Vec<BigUint> = (0..length).map(|i| big(i * 1000 + 1)).collect();
            let cipher = poseidon_encrypt(&message, &key, 42).unwrap();
            assert_eq!(Some(cipher.len()), cipher_length(message.len()));
            let plain = poseidon_decrypt(&cipher, &key, 42, message.len()).unwrap();
            assert_eq!(plain, message);
        }
    }

    #[test]
    fn test_decrypt_detects_tampering() {
        let key = shared_key();
        let message = vec![big(10)];
        let mut cipher = poseidon_encrypt(&message, &key, 5).unwrap();
        cipher[0] += 1u32;
        assert!(matches!(
            poseidon_decrypt(&cipher, &key, 5, 1),
            Err(MetadataError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_decrypt_with_wrong_nonce_fails() {
        let key = shared_key();
        let cipher = poseidon_encrypt(&[big(10), big(11)], &key, 5).unwrap();
        assert!(poseidon_decrypt(&cipher, &key, 6, 2).is_err());
    }

    #[test]
    fn test_decrypt_with_wrong_length_fails() {
        let key = shared_key();
        let cipher = poseidon_encrypt(&[big(10), big(11)], &key, 5).unwrap();
        assert!(poseidon_decrypt(&cipher, &key, 5, 4).is_err());
        assert!(poseidon_decrypt(&cipher, &key, 5, 1).is_err());
    }
}

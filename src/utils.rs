//! Utility functions for hex validation, byte/field conversion and decimal
//! serialization of big integers.

use crate::constants::HASH_SIZE;
use anyhow::{Context, Result};
use num_bigint::BigUint;

/// Removes surrounding whitespace and an optional `0x`/`0X` prefix.
#[must_use]
pub fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Returns the hex digits of `input` after checking their count.
///
/// The prefix and surrounding whitespace are dropped; letter case is kept.
///
/// # Errors
/// Fails when the digit count differs from `expected_len` or a character
/// is not a hex digit.
///
/// # Examples
///
/// ```
/// use private_membership::utils::validate_and_strip_hex;
///
/// assert_eq!(validate_and_strip_hex(" 0XdeadBEEF ", 8).unwrap(), "deadBEEF");
/// assert!(validate_and_strip_hex("0xdead", 8).is_err());
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let digits = strip_hex_prefix(input);

    if digits.len() != expected_len {
        return Err(anyhow::anyhow!(
            "Expected {expected_len} hex digits, got {}",
            digits.len()
        ));
    }

    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(anyhow::anyhow!("'{c}' is not a hex digit"));
    }

    Ok(digits.to_string())
}

/// Decodes hex the way wallet tooling does when handed an odd-length string:
/// the trailing half byte is ignored rather than rejected.
///
/// # Errors
///
/// Returns an error when the input contains non-hex characters.
pub fn decode_hex_lenient(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let stripped = strip_hex_prefix(input);
    let even = stripped.len() - stripped.len() % 2;
    if let Some((index, c)) = stripped.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(hex::FromHexError::InvalidHexCharacter { c, index });
    }
    hex::decode(&stripped[..even])
}

/// Interprets 32 bytes as a big-endian unsigned integer.
#[inline]
#[must_use]
pub fn bytes_to_field(bytes: &[u8; HASH_SIZE]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Big-endian, left-padded 32-byte encoding. `None` if the value needs more
/// than 32 bytes.
#[must_use]
pub fn field_to_bytes(value: &BigUint) -> Option<[u8; HASH_SIZE]> {
    let raw = value.to_bytes_be();
    if raw.len() > HASH_SIZE {
        return None;
    }
    let mut out = [0u8; HASH_SIZE];
    out[HASH_SIZE - raw.len()..].copy_from_slice(&raw);
    Some(out)
}

/// Lowercase `0x`-prefixed hex of a byte slice.
#[must_use]
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses a 32-byte digest from hex with or without prefix.
///
/// # Errors
/// Returns an error if the value is not 64 hex characters.
pub fn parse_bytes32(input: &str) -> Result<[u8; HASH_SIZE]> {
    let stripped = validate_and_strip_hex(input, HASH_SIZE * 2)?;
    let bytes = hex::decode(&stripped).context("Failed to decode 32-byte hex value")?;
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parses a big integer written in decimal, or in hex when prefixed `0x`.
///
/// # Errors
/// Returns an error if the digits are invalid for the detected radix.
pub fn parse_big_uint(input: &str) -> Result<BigUint> {
    let trimmed = input.trim();
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => (hex_digits, 16),
        None => (trimmed, 10),
    };
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| anyhow::anyhow!("Invalid integer literal: '{input}'"))
}

/// Serde adapter storing a [`BigUint`] as a decimal string, the format
/// expected by circuit input files.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_big_uint(&s).map_err(D::Error::custom)
    }
}

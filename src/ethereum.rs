//! Ethereum signature and address handling.
//!
//! Seeds come from `personal_sign` signatures over the messages in
//! [`crate::key::seed_message`], and those messages embed the signer's
//! EIP-55 checksummed address.

use crate::utils::validate_and_strip_hex;
use anyhow::{Context, Result};
use ethers::types::Address;
use ethers::utils::to_checksum;

/// 20-byte address as hex digits, prefix excluded.
pub const ADDRESS_HEX_LENGTH: usize = 40;

/// 32-byte secp256k1 secret as hex digits, prefix excluded.
pub const PRIVATE_KEY_HEX_LENGTH: usize = 64;

/// `r ‖ s ‖ v` = 65 bytes = 130 hex characters.
pub const SIGNATURE_HEX_LENGTH: usize = 130;

/// Lowercase address digits without `0x`, the form used for comparisons.
///
/// # Errors
///
/// Fails unless the input is exactly 40 hex digits after an optional `0x`.
///
/// # Examples
///
/// ```
/// use private_membership::ethereum::normalize_address;
///
/// let digits = normalize_address("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359").unwrap();
/// assert_eq!(digits, "fb6916095ca1df60bb79ce92ce3ea74c37c5d359");
/// ```
pub fn normalize_address(address: &str) -> Result<String> {
    let digits = validate_and_strip_hex(address, ADDRESS_HEX_LENGTH)
        .with_context(|| format!("Invalid Ethereum address '{address}'"))?;
    Ok(digits.to_lowercase())
}

/// Parses an address in any case, with or without `0x`.
///
/// # Errors
///
/// Same as [`normalize_address`].
pub fn parse_address(address: &str) -> Result<Address> {
    let bytes = hex::decode(normalize_address(address)?)
        .context("Failed to decode address from hex")?;
    Ok(Address::from_slice(&bytes))
}

/// EIP-55 checksummed form, the form embedded in seed messages.
///
/// # Errors
///
/// Same as [`normalize_address`].
///
/// # Examples
///
/// ```
/// use private_membership::ethereum::checksum_address;
///
/// let checksummed = checksum_address("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
/// assert_eq!(checksummed, "0x52908400098527886E0F7030069857D2E4169EE7");
/// ```
pub fn checksum_address(address: &str) -> Result<String> {
    Ok(to_checksum(&parse_address(address)?, None))
}

/// Checks a wallet secret before it is handed to `ethers`.
///
/// # Errors
///
/// Fails on anything other than 64 hex digits, and on the zero key.
pub fn validate_private_key(private_key: &str) -> Result<()> {
    let digits = validate_and_strip_hex(private_key, PRIVATE_KEY_HEX_LENGTH)
        .context("Private key must be 32 bytes of hex")?;

    if digits.bytes().all(|b| b == b'0') {
        return Err(anyhow::anyhow!("Private key is zero"));
    }
    Ok(())
}

/// Checks a 65-byte hex signature and returns it lowercase with `0x`.
///
/// The recovery byte must be 0, 1, 27 or 28.
///
/// # Errors
///
/// Returns an error for a wrong length, non-hex characters, or an invalid
/// recovery byte.
pub fn normalize_signature(signature: &str) -> Result<String> {
    let stripped = validate_and_strip_hex(signature, SIGNATURE_HEX_LENGTH)
        .context("Signature must be 65 bytes of hex")?
        .to_lowercase();

    let v = u8::from_str_radix(&stripped[128..], 16).context("Invalid recovery byte")?;
    if !matches!(v, 0 | 1 | 27 | 28) {
        return Err(anyhow::anyhow!(
            "Invalid signature recovery byte {v}. Expected 27 or 28."
        ));
    }

    Ok(format!("0x{stripped}"))
}

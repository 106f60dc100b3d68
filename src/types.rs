//! JSON records exchanged with the proving backend and the contract.

use crate::babyjub::{BabyJub, Point};
use crate::constants::{BN254_SCALAR_FIELD, HASH_SIZE};
use crate::key::BjjKeyPair;
use crate::membership::MembershipHash;
use crate::merkle::{verify_merkle_proof, MerkleProof};
use crate::poseidon::poseidon_hash;
use crate::utils::{decimal, parse_bytes32, to_hex_prefixed};
use anyhow::{Context, Result};
use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Circuit input for registering a new membership.
///
/// Field names follow the circuit signal names, so the JSON keys are
/// PascalCase. Every scalar is a decimal string.
///
/// # Note on Naming
///
/// `nullifier_hash` is `Poseidon(nullifier, trapdoor)`, which
/// [`MembershipHash`] calls `identifiers_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewMembershipInput {
    #[serde(with = "decimal")]
    pub sender_private_key: BigUint,
    pub sender_public_key: Point,
    #[serde(with = "decimal")]
    pub membership_hash: BigUint,
    #[serde(with = "decimal")]
    pub nullifier_hash: BigUint,
    #[serde(with = "decimal")]
    pub membership_nullifier: BigUint,
    #[serde(with = "decimal")]
    pub membership_trapdoor: BigUint,
    #[serde(with = "decimal")]
    pub membership_secret_id: BigUint,
}

impl NewMembershipInput {
    #[must_use]
    pub fn new(key_pair: &BjjKeyPair, membership: &MembershipHash) -> Self {
        Self {
            sender_private_key: key_pair.private_key.clone(),
            sender_public_key: key_pair.public_key.clone(),
            membership_hash: membership.hash.clone(),
            nullifier_hash: membership.identifiers_hash.clone(),
            membership_nullifier: membership.nullifier.clone(),
            membership_trapdoor: membership.trapdoor.clone(),
            membership_secret_id: membership.secret_id.clone(),
        }
    }

    /// Validates the input before it is handed to the prover.
    ///
    /// Performs:
    /// - Range checks on every scalar
    /// - Curve membership of the public key and its match with the private key
    /// - Recomputation of both Poseidon commitments
    ///
    /// # Errors
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        debug!("Starting membership input validation");

        let scalars = [
            ("SenderPrivateKey", &self.sender_private_key),
            ("MembershipHash", &self.membership_hash),
            ("NullifierHash", &self.nullifier_hash),
            ("MembershipNullifier", &self.membership_nullifier),
            ("MembershipTrapdoor", &self.membership_trapdoor),
            ("MembershipSecretId", &self.membership_secret_id),
        ];
        for (name, value) in scalars {
            if value >= &*BN254_SCALAR_FIELD {
                return Err(anyhow::anyhow!(
                    "{name} is not a field element. Expected a value below the BN254 scalar field."
                ));
            }
        }
        debug!("All scalars are within the field");

        let curve = BabyJub::default();
        curve
            .assert_in_curve(&self.sender_public_key)
            .context("SenderPublicKey is not a BabyJubJub point")?;
        let expected_public_key = curve
            .generate_public_key(&self.sender_private_key)
            .context("Failed to derive public key from SenderPrivateKey")?;
        if expected_public_key != self.sender_public_key {
            return Err(anyhow::anyhow!(
                "SenderPublicKey does not match SenderPrivateKey. The key pair was derived from different signatures."
            ));
        }
        debug!("Public key matches private key");

        let identifiers_hash = poseidon_hash(&[
            self.membership_nullifier.clone(),
            self.membership_trapdoor.clone(),
        ])
        .context("Failed to hash nullifier and trapdoor")?;
        if identifiers_hash != self.nullifier_hash {
            return Err(anyhow::anyhow!(
                "NullifierHash mismatch: expected Poseidon(nullifier, trapdoor) = {identifiers_hash}, got {}",
                self.nullifier_hash
            ));
        }

        let membership_hash =
            poseidon_hash(&[self.membership_secret_id.clone(), self.nullifier_hash.clone()])
                .context("Failed to hash secret id and nullifier hash")?;
        if membership_hash != self.membership_hash {
            return Err(anyhow::anyhow!(
                "MembershipHash mismatch: expected Poseidon(secretId, nullifierHash) = {membership_hash}, got {}",
                self.membership_hash
            ));
        }

        debug!("Membership input is consistent");
        Ok(())
    }

    /// Writes pretty-printed JSON to `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize membership input")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write membership input to {}", path.display()))
    }

    /// Reads an input file written by [`NewMembershipInput::write_to_file`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read membership input from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse membership input from {}", path.display()))
    }
}

/// Merkle proof in the shape the contract accepts: `0x` hex digests and the
/// leaf position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProofOutput {
    pub leaf_position: usize,
    pub merkle_proof: Vec<String>,
    pub merkle_root: String,
}

impl From<&MerkleProof> for MerkleProofOutput {
    fn from(proof: &MerkleProof) -> Self {
        Self {
            leaf_position: proof.index,
            merkle_proof: proof.siblings.iter().map(|s| to_hex_prefixed(s)).collect(),
            merkle_root: to_hex_prefixed(&proof.root),
        }
    }
}

impl MerkleProofOutput {
    /// Checks that every digest is 32 bytes of hex.
    ///
    /// # Errors
    /// Returns an error naming the first malformed digest.
    pub fn validate(&self) -> Result<()> {
        debug!("Merkle root length: {}", self.merkle_root.len());
        debug!("Proof length: {}", self.merkle_proof.len());
        debug!("Leaf position: {}", self.leaf_position);

        parse_bytes32(&self.merkle_root).with_context(|| {
            format!(
                "Invalid merkle root '{}'. Expected a {HASH_SIZE}-byte hex string.",
                self.merkle_root
            )
        })?;
        for (i, sibling) in self.merkle_proof.iter().enumerate() {
            parse_bytes32(sibling).with_context(|| {
                format!("Invalid proof element {i} '{sibling}'. Expected a {HASH_SIZE}-byte hex string.")
            })?;
        }
        Ok(())
    }

    /// Recomputes the root from `leaf` and compares it with `merkle_root`.
    ///
    /// # Errors
    /// Returns an error if any digest is malformed.
    pub fn verify(&self, leaf: &[u8; HASH_SIZE]) -> Result<bool> {
        let root = parse_bytes32(&self.merkle_root).context("Invalid merkle root")?;
        let siblings = self
            .merkle_proof
            .iter()
            .map(|s| parse_bytes32(s))
            .collect::<Result<Vec<_>>>()
            .context("Invalid proof element")?;
        Ok(verify_merkle_proof(leaf, self.leaf_position, &siblings, &root))
    }

    /// Writes pretty-printed JSON to `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize Merkle proof")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write Merkle proof to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::generate_membership_hash;
    use crate::merkle::MerkleTree;
    use tempfile::TempDir;

    const SIGNATURE: &str = "0x21fbf0696d5e0aa2ef41a2b4ffb623bcaf070461d61cf7251c74161f82fec3a4370854bc0a34b3ab487c1bc021cd318c734c51ae29374f2beb0e6f2dd49b4bf41c";

    fn sample_input() -> NewMembershipInput {
        let key_pair = BjjKeyPair::from_signature(SIGNATURE).unwrap();
        let membership = generate_membership_hash("nullifier seed", "secret id seed").unwrap();
        NewMembershipInput::new(&key_pair, &membership)
    }

    #[test]
    fn test_new_membership_input_validates() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_json_keys_match_circuit_signals() {
        let input = sample_input();
        let json = serde_json::to_value(&input).unwrap();
        for key in [
            "SenderPrivateKey",
            "SenderPublicKey",
            "MembershipHash",
            "NullifierHash",
            "MembershipNullifier",
            "MembershipTrapdoor",
            "MembershipSecretId",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["SenderPublicKey"][0], input.sender_public_key.x.to_string());
        assert_eq!(json["MembershipHash"], input.membership_hash.to_string());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let mut input = sample_input();
        input.sender_public_key = BabyJub::default().base8().clone();
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_tampered_membership_hash_rejected() {
        let mut input = sample_input();
        input.membership_hash += 1u32;
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("MembershipHash mismatch"));
    }

    #[test]
    fn test_tampered_nullifier_hash_rejected() {
        let mut input = sample_input();
        input.membership_trapdoor += 1u32;
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("NullifierHash mismatch"));
    }

    #[test]
    fn test_out_of_field_scalar_rejected() {
        let mut input = sample_input();
        input.membership_secret_id = BN254_SCALAR_FIELD.clone();
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("MembershipSecretId"));
    }

    #[test]
    fn test_membership_input_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        let input = sample_input();
        input.write_to_file(&path).unwrap();
        assert_eq!(NewMembershipInput::read_from_file(&path).unwrap(), input);
    }

    #[test]
    fn test_merkle_proof_output_shape() {
        let tree = MerkleTree::new(vec![[1u8; 32], [2u8; 32], [3u8; 32]]);
        let proof = tree.generate_proof(2).unwrap();
        let output = MerkleProofOutput::from(&proof);

        assert_eq!(output.leaf_position, 2);
        assert_eq!(output.merkle_proof.len(), 2);
        assert!(output.merkle_root.starts_with("0x"));
        output.validate().unwrap();
        assert!(output.verify(&[3u8; 32]).unwrap());
        assert!(!output.verify(&[4u8; 32]).unwrap());

        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("leafPosition").is_some());
        assert!(json.get("merkleProof").is_some());
        assert!(json.get("merkleRoot").is_some());
    }

    #[test]
    fn test_merkle_proof_output_rejects_bad_hex() {
        let output = MerkleProofOutput {
            leaf_position: 0,
            merkle_proof: vec!["0x1234".to_string()],
            merkle_root: format!("0x{}", "00".repeat(32)),
        };
        let err = output.validate().unwrap_err();
        assert!(err.to_string().contains("proof element 0"));
    }
}

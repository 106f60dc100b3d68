//! Merkle tree over membership commitments.
//!
//! This module provides a binary Merkle tree using Keccak-256, matching the
//! on-chain verifier bit for bit. An unpaired node at the end of a level is
//! hashed with itself rather than with a zero node.

use crate::constants::HASH_SIZE;
use crate::error::MerkleError;
use log::debug;
use sha3::{Digest, Keccak256};
use std::fmt;

/// Root of an empty tree.
pub const ZERO_HASH: [u8; HASH_SIZE] = [0u8; HASH_SIZE];

/// A Merkle proof for leaf inclusion.
///
/// Contains the leaf value, root hash, sibling hashes, and leaf index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: [u8; 32],
    pub root: [u8; 32],
    pub siblings: Vec<[u8; 32]>,
    pub index: usize,
}

/// A binary Merkle tree.
///
/// Stores the root hash and all leaves. Proofs are rebuilt from the leaves on
/// every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    pub root: [u8; 32],
    pub leaves: Vec<[u8; 32]>,
}

/// `Keccak256(left ‖ right)`.
#[must_use]
pub fn hash_leaves(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// `Keccak256(utf8(value))`, the usual way to turn a label into a leaf.
#[must_use]
pub fn hash_value(value: &str) -> [u8; 32] {
    Keccak256::digest(value.as_bytes()).into()
}

fn next_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_leaves(left, right)
        })
        .collect()
}

/// Number of levels above the leaves: `n` is halved (rounding up) until one
/// node remains.
#[must_use]
pub fn calculate_merkle_tree_height(leaf_count: usize) -> usize {
    let mut height = 0;
    let mut count = leaf_count;
    while count > 1 {
        count = count.div_ceil(2);
        height += 1;
    }
    height
}

/// Root of `leaves`. [`ZERO_HASH`] when empty and the leaf itself when there
/// is exactly one.
#[must_use]
pub fn calculate_merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    match leaves {
        [] => ZERO_HASH,
        [leaf] => *leaf,
        _ => {
            let mut level = next_level(leaves);
            while level.len() > 1 {
                level = next_level(&level);
            }
            level[0]
        }
    }
}

/// Sibling path for the leaf at `position`, bottom level first.
///
/// # Errors
///
/// * [`MerkleError::PositionOutOfBounds`] if `position >= leaves.len()`.
/// * [`MerkleError::InvalidProofLength`] if the path does not match the
///   tree height.
pub fn generate_merkle_proof(
    position: usize,
    leaves: &[[u8; 32]],
) -> Result<Vec<[u8; 32]>, MerkleError> {
    if position >= leaves.len() {
        return Err(MerkleError::PositionOutOfBounds {
            position,
            leaf_count: leaves.len(),
        });
    }

    let height = calculate_merkle_tree_height(leaves.len());
    let mut proof = Vec::with_capacity(height);
    let mut level = leaves.to_vec();
    let mut index = position;

    for _ in 0..height {
        let sibling = level.get(index ^ 1).unwrap_or(&level[level.len() - 1]);
        proof.push(*sibling);
        index >>= 1;
        level = next_level(&level);
    }

    if proof.len() != height {
        return Err(MerkleError::InvalidProofLength {
            expected: height,
            actual: proof.len(),
        });
    }

    debug!(
        "Generated Merkle proof for position {} of {} leaves",
        position,
        leaves.len()
    );
    Ok(proof)
}

/// Folds `leaf` up through `siblings` and compares with `root`. The running
/// hash is the left input when the index is even at that level.
#[must_use]
pub fn verify_merkle_proof(
    leaf: &[u8; 32],
    index: usize,
    siblings: &[[u8; 32]],
    root: &[u8; 32],
) -> bool {
    let mut current_hash = *leaf;
    let mut index = index;

    for sibling in siblings {
        if index.is_multiple_of(2) {
            current_hash = hash_leaves(&current_hash, sibling);
        } else {
            current_hash = hash_leaves(sibling, &current_hash);
        }
        index /= 2;
    }

    current_hash == *root
}

impl MerkleTree {
    /// Create a new Merkle tree from a list of leaves.
    ///
    /// # Arguments
    /// * `leaves` - Vector of 32-byte leaf values
    ///
    /// # Returns
    /// A MerkleTree instance with computed root hash
    #[must_use]
    pub fn new(leaves: Vec<[u8; 32]>) -> Self {
        let root = calculate_merkle_root(&leaves);
        MerkleTree { root, leaves }
    }

    #[must_use]
    pub fn height(&self) -> usize {
        calculate_merkle_tree_height(self.leaves.len())
    }

    /// Position of the first leaf equal to `leaf`.
    #[must_use]
    pub fn position_of(&self, leaf: &[u8; 32]) -> Option<usize> {
        self.leaves.iter().position(|l| l == leaf)
    }

    /// Generate a Merkle proof for a leaf at the given index.
    ///
    /// # Errors
    /// [`MerkleError::PositionOutOfBounds`] for an index past the last leaf.
    pub fn generate_proof(&self, leaf_index: usize) -> Result<MerkleProof, MerkleError> {
        let siblings = generate_merkle_proof(leaf_index, &self.leaves)?;
        Ok(MerkleProof {
            leaf: self.leaves[leaf_index],
            root: self.root,
            siblings,
            index: leaf_index,
        })
    }

    /// Verify a Merkle proof against this tree's root.
    ///
    /// # Returns
    /// `true` if the proof is valid, `false` otherwise
    #[must_use]
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        if proof.root != self.root || proof.siblings.len() != self.height() {
            return false;
        }
        verify_merkle_proof(&proof.leaf, proof.index, &proof.siblings, &self.root)
    }
}

impl fmt::Display for MerkleProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MerkleProof:\n  Leaf: 0x{}\n  Root: 0x{}\n  Index: {}\n  Siblings: {}",
            hex::encode(self.leaf),
            hex::encode(self.root),
            self.index,
            self.siblings.len()
        )?;
        for sibling in &self.siblings {
            write!(f, "\n    0x{}", hex::encode(sibling))?;
        }
        Ok(())
    }
}

//! Private Membership Cryptographic Core
//!
//! This library derives and encrypts the values a member of a private
//! loyalty program submits: BabyJubJub keys ground from wallet signatures,
//! Poseidon membership commitments, Keccak Merkle proofs for the on-chain
//! member set, and Poseidon-encrypted metadata.
//!
//! # Components
//!
//! - [`FiniteField`]: modular arithmetic over a prime field
//! - [`BabyJub`]: BabyJubJub curve engine with ElGamal encryption
//! - [`BjjKeyPair`]: key pair derived from a signature by [`key`]
//! - [`MembershipHash`]: nullifier, trapdoor and commitment pipeline
//! - [`MerkleTree`]: binary Keccak-256 Merkle tree matching the contract
//! - [`metadata`]: string chunking and Poseidon stream encryption
//! - [`NewMembershipInput`] / [`MerkleProofOutput`]: JSON records for the
//!   proving backend and the contract
//!
//! # Example
//!
//! ```no_run
//! use private_membership::{generate_membership_hash, BjjKeyPair, MerkleTree};
//!
//! let signature = "0x21fbf0696d5e0aa2ef41a2b4ffb623bcaf070461d61cf7251c74161f82fec3a4370854bc0a34b3ab487c1bc021cd318c734c51ae29374f2beb0e6f2dd49b4bf41c";
//! let key_pair = BjjKeyPair::from_signature(signature)?;
//! let membership = generate_membership_hash("nullifier seed", "secret id seed")?;
//! let tree = MerkleTree::new(vec![[1u8; 32], [2u8; 32]]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod babyjub;
pub mod config;
pub mod constants;
pub mod error;
pub mod ethereum;
pub mod field;
pub mod key;
pub mod membership;
pub mod merkle;
pub mod metadata;
pub mod poseidon;
pub mod types;
pub mod utils;

#[cfg(test)]
mod merkle_tests;

pub use babyjub::{BabyJub, ElGamalCiphertext, ElGamalEncryption, Point};
pub use config::Config;
pub use field::{FieldElement, FiniteField};
pub use key::{BjjKeyPair, SeedPurpose};
pub use membership::{generate_membership_hash, MembershipHash};
pub use merkle::{MerkleProof, MerkleTree};
pub use poseidon::poseidon_hash;
pub use types::{MerkleProofOutput, NewMembershipInput};
pub use utils::{bytes_to_field, field_to_bytes};

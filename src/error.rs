//! Error types for the membership core.
//!
//! Each component reports its own failures. Errors from lower layers are
//! nested with `#[from]` so callers can match on the root cause.

use thiserror::Error;

/// Finite-field arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("division by zero in field arithmetic")]
    DivisionByZero,

    #[error("{value} has no multiplicative inverse modulo {modulus}")]
    NoInverseExists { value: String, modulus: String },

    #[error("field modulus must be at least 2, got {0}")]
    InvalidModulus(String),
}

/// BabyJubJub curve and ElGamal failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("point is not on the BabyJubJub curve")]
    PointNotOnCurve,

    #[error("secret key is not in the field")]
    KeyNotInField,

    #[error("unable to find a secure random number generator")]
    NoSecureRandom,

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Signature-to-scalar derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDerivationError {
    #[error("could not find a valid key after {iterations} iterations")]
    KeyDerivationExhausted { iterations: u16 },

    #[error("malformed key seed: {0}")]
    MalformedSeed(String),

    #[error("grinding limit must be non-zero")]
    InvalidLimit,

    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Poseidon input and membership commitment failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipHashError {
    #[error("input exceeds field size")]
    InputExceedsField,

    #[error("poseidon hasher rejected the input: {0}")]
    Poseidon(String),
}

/// Merkle tree construction and proof failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("leaf position {position} out of bounds for {leaf_count} leaves")]
    PositionOutOfBounds { position: usize, leaf_count: usize },

    #[error("invalid proof length: expected {expected}, got {actual}")]
    InvalidProofLength { expected: usize, actual: usize },
}

/// Encrypted metadata payload failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("malformed metadata payload: {0}")]
    MalformedPayload(String),

    #[error("metadata decryption failed: {0}")]
    DecryptionFailed(&'static str),

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Hash(#[from] MembershipHashError),
}

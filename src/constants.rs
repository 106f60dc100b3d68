//! Protocol constants shared by the field, curve and key derivation code.

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::One;

/// Size in bytes of every digest, leaf and serialized field element.
pub const HASH_SIZE: usize = 32;

/// Twisted Edwards coefficient `A` of BabyJubJub.
pub const CURVE_A: u64 = 168_700;

/// Twisted Edwards coefficient `D` of BabyJubJub.
pub const CURVE_D: u64 = 168_696;

/// Maximum number of candidates tried by the key grinder.
pub const GRIND_ITERATION_LIMIT: u16 = 1_000;

/// Bit width of one metadata chunk. Stays below the 254-bit field size.
pub const METADATA_CHUNK_BITS: u64 = 250;

const BN254_SCALAR_FIELD_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";
const BASE_POINT_ORDER_DEC: &str =
    "2736030358979909402780800718157159386076813972158567259200215660948447373041";
const CURVE_ORDER_DEC: &str =
    "21888242871839275222246405745257275088614511777268538073601725287587578984328";
const BASE8_X_DEC: &str =
    "5299619240641551281634865583518297030282874472190772894086521144482721001553";
const BASE8_Y_DEC: &str =
    "16950150798460657717958625567821834550301663161624707787222815936182638968203";

fn parse_decimal(value: &str) -> BigUint {
    BigUint::parse_bytes(value.as_bytes(), 10).expect("hard-coded decimal constant")
}

lazy_static! {
    /// Prime of the BN254 scalar field, which is also the BabyJubJub base field.
    pub static ref BN254_SCALAR_FIELD: BigUint = parse_decimal(BN254_SCALAR_FIELD_DEC);

    /// Order of the prime-order subgroup generated by `Base8`.
    pub static ref BASE_POINT_ORDER: BigUint = parse_decimal(BASE_POINT_ORDER_DEC);

    /// Alias used by key derivation and scalar sampling.
    pub static ref SUB_GROUP_ORDER: BigUint = BASE_POINT_ORDER.clone();

    /// Full order of the BabyJubJub curve (cofactor 8 times the subgroup order).
    pub static ref CURVE_ORDER: BigUint = parse_decimal(CURVE_ORDER_DEC);

    /// Exclusive upper bound of a SHA-256 digest read as an integer.
    pub static ref SHA256_MAX_DIGEST: BigUint = BigUint::one() << 256u32;

    pub static ref BASE8_X: BigUint = parse_decimal(BASE8_X_DEC);
    pub static ref BASE8_Y: BigUint = parse_decimal(BASE8_Y_DEC);
}

//! BabyJubJub twisted Edwards curve and ElGamal encryption over its points.
//!
//! The curve is `A·x² + y² = 1 + D·x²·y²` over the BN254 scalar field with
//! `A = 168700` and `D = 168696`. All public keys and ciphertext components
//! live in the prime-order subgroup generated by [`BabyJub::base8`].

use crate::constants::{
    BASE8_X, BASE8_Y, CURVE_A, CURVE_D, CURVE_ORDER, SUB_GROUP_ORDER,
};
use crate::error::CurveError;
use crate::field::{FieldElement, FiniteField};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// Sampling attempts before a random source is considered broken.
const MAX_SAMPLING_ATTEMPTS: usize = 256;

/// Affine point on BabyJubJub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl Point {
    #[must_use]
    pub fn new(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// The neutral element `(0, 1)`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::one(),
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y.is_one()
    }
}

// Points travel through JSON as `["x", "y"]` decimal pairs.
impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x.to_str_radix(10), self.y.to_str_radix(10)].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y] = <[String; 2]>::deserialize(deserializer)?;
        let x = crate::utils::parse_big_uint(&x).map_err(D::Error::custom)?;
        let y = crate::utils::parse_big_uint(&y).map_err(D::Error::custom)?;
        Ok(Self { x, y })
    }
}

/// ElGamal ciphertext: `c1 = r·Base8`, `c2 = M + r·PK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalCiphertext {
    pub c1: Point,
    pub c2: Point,
}

/// Result of an encryption: the ciphertext and the ephemeral scalar used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElGamalEncryption {
    pub cipher: ElGamalCiphertext,
    pub random: BigUint,
}

/// Source of cryptographically secure bytes.
///
/// Every `RngCore + CryptoRng` generator qualifies; the operating system
/// generator is used when callers do not inject one.
pub trait SecureRandom {
    /// Fills `dest` with secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NoSecureRandom`] when the source cannot deliver.
    fn fill_secure(&mut self, dest: &mut [u8]) -> Result<(), CurveError>;
}

impl<R: RngCore + CryptoRng + ?Sized> SecureRandom for R {
    fn fill_secure(&mut self, dest: &mut [u8]) -> Result<(), CurveError> {
        self.try_fill_bytes(dest)
            .map_err(|_| CurveError::NoSecureRandom)
    }
}

/// BabyJubJub curve engine. Immutable once built and safe to share.
#[derive(Debug, Clone)]
pub struct BabyJub {
    field: FiniteField,
    a: BigUint,
    d: BigUint,
    base8: Point,
}

impl Default for BabyJub {
    fn default() -> Self {
        Self::new(FiniteField::bn254())
    }
}

impl BabyJub {
    #[must_use]
    pub fn new(field: FiniteField) -> Self {
        Self {
            field,
            a: BigUint::from(CURVE_A),
            d: BigUint::from(CURVE_D),
            base8: Point::new(BASE8_X.clone(), BASE8_Y.clone()),
        }
    }

    #[must_use]
    pub fn field(&self) -> &FiniteField {
        &self.field
    }

    /// Generator of the prime-order subgroup.
    #[must_use]
    pub fn base8(&self) -> &Point {
        &self.base8
    }

    /// Order of the whole curve.
    #[must_use]
    pub fn order() -> &'static BigUint {
        &CURVE_ORDER
    }

    /// Order of the subgroup generated by `Base8`.
    #[must_use]
    pub fn sub_group_order() -> &'static BigUint {
        &SUB_GROUP_ORDER
    }

    /// Samples an ephemeral scalar.
    ///
    /// Draws 32 bytes, rejects draws below half the subgroup order and
    /// reduces the accepted value modulo the subgroup order. The sampling
    /// shape is part of the wire contract with existing ciphertexts and is
    /// kept as is.
    ///
    /// # Errors
    ///
    /// [`CurveError::NoSecureRandom`] if the source fails or never yields an
    /// acceptable value.
    pub fn generate_random_value<R: SecureRandom + ?Sized>(
        rng: &mut R,
    ) -> Result<BigUint, CurveError> {
        let lower_bound = &*SUB_GROUP_ORDER >> 1u32;
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            let mut bytes = [0u8; 32];
            rng.fill_secure(&mut bytes)?;
            let candidate = BigUint::from_bytes_be(&bytes);
            if candidate >= lower_bound {
                return Ok(candidate % &*SUB_GROUP_ORDER);
            }
        }
        Err(CurveError::NoSecureRandom)
    }

    /// Twisted Edwards point addition.
    ///
    /// # Errors
    ///
    /// Propagates field division failures, which only occur for inputs that
    /// are not on the curve.
    pub fn add_points(&self, a: &Point, b: &Point) -> Result<Point, CurveError> {
        let f = &self.field;
        let beta = f.mul(&a.x, &b.y);
        let gamma = f.mul(&a.y, &b.x);
        let delta = f.mul(
            &f.sub(&a.y, &f.mul(&self.a, &a.x)),
            &f.add(&b.x, &b.y),
        );
        let tau = f.mul(&beta, &gamma);
        let dtau = f.mul(&self.d, &tau);

        let x = f.div(&f.add(&beta, &gamma), &f.add(&f.one(), &dtau))?;
        let y = f.div(
            &f.add(&delta, &f.sub(&f.mul(&self.a, &beta), &gamma)),
            &f.sub(&f.one(), &dtau),
        )?;

        Ok(Point { x, y })
    }

    /// `-p = (-x, y)`.
    #[must_use]
    pub fn negate_point(&self, p: &Point) -> Point {
        Point::new(self.field.negate(&p.x), p.y.clone())
    }

    /// # Errors
    ///
    /// See [`BabyJub::add_points`].
    pub fn sub_points(&self, a: &Point, b: &Point) -> Result<Point, CurveError> {
        self.add_points(a, &self.negate_point(b))
    }

    /// Double-and-add scalar multiplication, least significant bit first.
    ///
    /// # Errors
    ///
    /// See [`BabyJub::add_points`].
    pub fn mul_with_scalar(&self, p: &Point, s: &BigUint) -> Result<Point, CurveError> {
        let mut result = Point::identity();
        let mut exp = p.clone();
        let bits = s.bits();
        for i in 0..bits {
            if s.bit(i) {
                result = self.add_points(&result, &exp)?;
            }
            if i + 1 < bits {
                exp = self.add_points(&exp, &exp)?;
            }
        }
        Ok(result)
    }

    /// Checks `A·x² + y² = 1 + D·x²·y²`.
    #[must_use]
    pub fn in_curve(&self, p: &Point) -> bool {
        let f = &self.field;
        if !f.is_in_field(&p.x) || !f.is_in_field(&p.y) {
            return false;
        }
        let x2 = f.square(&p.x);
        let y2 = f.square(&p.y);
        f.eq(
            &f.add(&f.mul(&self.a, &x2), &y2),
            &f.add(&f.one(), &f.mul(&self.d, &f.mul(&x2, &y2))),
        )
    }

    /// # Errors
    ///
    /// [`CurveError::PointNotOnCurve`] when [`BabyJub::in_curve`] fails.
    pub fn assert_in_curve(&self, p: &Point) -> Result<(), CurveError> {
        if self.in_curve(p) {
            Ok(())
        } else {
            Err(CurveError::PointNotOnCurve)
        }
    }

    /// `sk · Base8`.
    ///
    /// # Errors
    ///
    /// [`CurveError::KeyNotInField`] when `sk` is not below the field prime.
    pub fn generate_public_key(&self, secret_key: &BigUint) -> Result<Point, CurveError> {
        if !self.field.is_in_field(secret_key) {
            return Err(CurveError::KeyNotInField);
        }
        self.mul_with_scalar(&self.base8, secret_key)
    }

    /// Encrypts a point message using the operating system generator.
    ///
    /// # Errors
    ///
    /// [`CurveError::NoSecureRandom`] if no secure entropy is available.
    pub fn el_gamal_encryption(
        &self,
        public_key: &Point,
        message: &Point,
    ) -> Result<ElGamalEncryption, CurveError> {
        self.el_gamal_encryption_with_rng(&mut OsRng, public_key, message)
    }

    /// Encrypts a point message with an injected secure source.
    ///
    /// # Errors
    ///
    /// [`CurveError::NoSecureRandom`] if the source fails.
    pub fn el_gamal_encryption_with_rng<R: SecureRandom + ?Sized>(
        &self,
        rng: &mut R,
        public_key: &Point,
        message: &Point,
    ) -> Result<ElGamalEncryption, CurveError> {
        let random = Self::generate_random_value(rng)?;
        let c1 = self.mul_with_scalar(&self.base8, &random)?;
        let shared = self.mul_with_scalar(public_key, &random)?;
        let c2 = self.add_points(message, &shared)?;
        Ok(ElGamalEncryption {
            cipher: ElGamalCiphertext { c1, c2 },
            random,
        })
    }

    /// Maps a small scalar to `m·Base8` and encrypts it.
    ///
    /// # Errors
    ///
    /// [`CurveError::NoSecureRandom`] if no secure entropy is available.
    pub fn el_gamal_encryption_with_scalar(
        &self,
        public_key: &Point,
        message: &BigUint,
    ) -> Result<ElGamalEncryption, CurveError> {
        self.el_gamal_encryption_with_scalar_and_rng(&mut OsRng, public_key, message)
    }

    /// # Errors
    ///
    /// [`CurveError::NoSecureRandom`] if the source fails.
    pub fn el_gamal_encryption_with_scalar_and_rng<R: SecureRandom + ?Sized>(
        &self,
        rng: &mut R,
        public_key: &Point,
        message: &BigUint,
    ) -> Result<ElGamalEncryption, CurveError> {
        let point = self.mul_with_scalar(&self.base8, message)?;
        self.el_gamal_encryption_with_rng(rng, public_key, &point)
    }

    /// Recovers the message point `c2 - sk·c1`.
    ///
    /// No plaintext check is made; use [`BabyJub::recover_scalar`] or an
    /// independent ciphertext to confirm the result.
    ///
    /// # Errors
    ///
    /// See [`BabyJub::add_points`].
    pub fn el_gamal_decryption(
        &self,
        private_key: &BigUint,
        cipher: &ElGamalCiphertext,
    ) -> Result<Point, CurveError> {
        let shared = self.mul_with_scalar(&cipher.c1, private_key)?;
        self.add_points(&cipher.c2, &self.negate_point(&shared))
    }

    /// Finds `m ≤ bound` with `m·Base8 == point` by linear search. Meant for
    /// balance-sized plaintexts produced by
    /// [`BabyJub::el_gamal_encryption_with_scalar`].
    ///
    /// # Errors
    ///
    /// See [`BabyJub::add_points`].
    pub fn recover_scalar(&self, point: &Point, bound: u64) -> Result<Option<u64>, CurveError> {
        let mut acc = Point::identity();
        for m in 0..=bound {
            if &acc == point {
                return Ok(Some(m));
            }
            acc = self.add_points(&acc, &self.base8)?;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dec(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 10).unwrap()
    }

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn test_base8_in_curve() {
        let bj = BabyJub::default();
        assert!(bj.in_curve(bj.base8()));
        assert!(bj.in_curve(&Point::identity()));
        assert!(!bj.in_curve(&Point::new(BigUint::from(1u32), BigUint::from(1u32))));
    }

    #[test]
    fn test_identity_is_neutral() {
        let bj = BabyJub::default();
        let p = bj.mul_with_scalar(bj.base8(), &BigUint::from(5u32)).unwrap();
        assert_eq!(bj.add_points(&p, &Point::identity()).unwrap(), p);
        assert_eq!(bj.add_points(&Point::identity(), &p).unwrap(), p);
    }

    #[test]
    fn test_addition_commutes() {
        let bj = BabyJub::default();
        let p = bj.mul_with_scalar(bj.base8(), &BigUint::from(3u32)).unwrap();
        let q = bj.mul_with_scalar(bj.base8(), &BigUint::from(11u32)).unwrap();
        assert_eq!(bj.add_points(&p, &q).unwrap(), bj.add_points(&q, &p).unwrap());
    }

    #[test]
    fn test_mul_by_zero_is_identity() {
        let bj = BabyJub::default();
        let r = bj.mul_with_scalar(bj.base8(), &BigUint::zero()).unwrap();
        assert!(r.is_identity());
    }

    #[test]
    fn test_mul_matches_repeated_addition() {
        let bj = BabyJub::default();
        let mut acc = Point::identity();
        for _ in 0..5 {
            acc = bj.add_points(&acc, bj.base8()).unwrap();
        }
        let expected = Point::new(
            dec("11480966271046430430613841218147196773252373073876138147006741179837832100836"),
            dec("15148236048131954717802795400425086368006776860859772698778589175317365693546"),
        );
        assert_eq!(acc, expected);
        assert_eq!(bj.mul_with_scalar(bj.base8(), &BigUint::from(5u32)).unwrap(), expected);
    }

    #[test]
    fn test_subgroup_order_annihilates_base8() {
        let bj = BabyJub::default();
        let r = bj.mul_with_scalar(bj.base8(), BabyJub::sub_group_order()).unwrap();
        assert!(r.is_identity());
    }

    #[test]
    fn test_scalar_multiples_stay_on_curve() {
        let bj = BabyJub::default();
        let scalars = [
            BigUint::from(1u32),
            BigUint::from(2u32),
            BigUint::from(0xdead_beefu64),
            BabyJub::sub_group_order() - 1u32,
            BabyJub::order().clone(),
        ];
        for s in &scalars {
            let p = bj.mul_with_scalar(bj.base8(), s).unwrap();
            assert!(bj.in_curve(&p), "scalar {s} left the curve");
        }
    }

    #[test]
    fn test_sub_points_self_is_identity() {
        let bj = BabyJub::default();
        let p = bj.mul_with_scalar(bj.base8(), &BigUint::from(42u32)).unwrap();
        assert!(bj.sub_points(&p, &p).unwrap().is_identity());
    }

    #[test]
    fn test_public_key_vector() {
        let bj = BabyJub::default();
        let sk = dec("822639697011021921516457068875962394969365908168924419839361913957889567034");
        let pk = bj.generate_public_key(&sk).unwrap();
        assert_eq!(
            pk,
            Point::new(
                dec("19291989160157729405820351311062959828169056651766621528256505338734241537531"),
                dec("473139545349045232418971573525264973196111731109735782027560459575632344878"),
            )
        );
    }

    #[test]
    fn test_public_key_rejects_out_of_field_key() {
        let bj = BabyJub::default();
        let sk = bj.field().prime().clone();
        assert_eq!(bj.generate_public_key(&sk), Err(CurveError::KeyNotInField));
    }

    #[test]
    fn test_random_value_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let r = BabyJub::generate_random_value(&mut rng).unwrap();
            assert!(&r < BabyJub::sub_group_order());
        }
    }

    #[test]
    fn test_failing_source_reports_no_secure_random() {
        let bj = BabyJub::default();
        let pk = bj.generate_public_key(&BigUint::from(9u32)).unwrap();
        let result = bj.el_gamal_encryption_with_rng(&mut FailingRng, &pk, bj.base8());
        assert_eq!(result, Err(CurveError::NoSecureRandom));
    }

    #[test]
    fn test_el_gamal_round_trip() {
        let bj = BabyJub::default();
        let mut rng = StdRng::seed_from_u64(99);
        let sk = BabyJub::generate_random_value(&mut rng).unwrap();
        let pk = bj.generate_public_key(&sk).unwrap();
        let message = bj.mul_with_scalar(bj.base8(), &BigUint::from(1234u32)).unwrap();

        let enc = bj.el_gamal_encryption_with_rng(&mut rng, &pk, &message).unwrap();
        assert!(bj.in_curve(&enc.cipher.c1));
        assert!(bj.in_curve(&enc.cipher.c2));
        assert_eq!(bj.el_gamal_decryption(&sk, &enc.cipher).unwrap(), message);
    }

    #[test]
    fn test_el_gamal_with_os_rng() {
        let bj = BabyJub::default();
        let sk = BigUint::from(123_456_789u64);
        let pk = bj.generate_public_key(&sk).unwrap();
        let message = bj.mul_with_scalar(bj.base8(), &BigUint::from(77u32)).unwrap();
        let enc = bj.el_gamal_encryption(&pk, &message).unwrap();
        assert_eq!(bj.el_gamal_decryption(&sk, &enc.cipher).unwrap(), message);
    }

    #[test]
    fn test_scalar_encryption_recovers_balance() {
        let bj = BabyJub::default();
        let mut rng = StdRng::seed_from_u64(3);
        let sk = BabyJub::generate_random_value(&mut rng).unwrap();
        let pk = bj.generate_public_key(&sk).unwrap();

        let enc = bj
            .el_gamal_encryption_with_scalar_and_rng(&mut rng, &pk, &BigUint::from(250u32))
            .unwrap();
        let decrypted = bj.el_gamal_decryption(&sk, &enc.cipher).unwrap();
        assert_eq!(bj.recover_scalar(&decrypted, 1_000).unwrap(), Some(250));
        assert_eq!(bj.recover_scalar(&decrypted, 100).unwrap(), None);
    }

    #[test]
    fn test_wrong_key_does_not_decrypt() {
        let bj = BabyJub::default();
        let mut rng = StdRng::seed_from_u64(11);
        let sk = BigUint::from(1111u32);
        let pk = bj.generate_public_key(&sk).unwrap();
        let message = bj.mul_with_scalar(bj.base8(), &BigUint::from(5u32)).unwrap();
        let enc = bj.el_gamal_encryption_with_rng(&mut rng, &pk, &message).unwrap();
        let wrong = bj.el_gamal_decryption(&BigUint::from(2222u32), &enc.cipher).unwrap();
        assert_ne!(wrong, message);
    }

    #[test]
    fn test_point_json_is_decimal_pair() {
        let p = Point::new(BigUint::from(1u32), BigUint::from(2u32));
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"["1","2"]"#);
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}

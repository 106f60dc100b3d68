//! Modular arithmetic over a prime field.
//!
//! Elements are plain [`BigUint`] values. Every operation reduces its inputs
//! and returns the canonical representative in `[0, p)`, so callers never
//! observe a negative or oversized value.

use crate::constants::BN254_SCALAR_FIELD;
use crate::error::FieldError;
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

/// A field element. Always normalized into `[0, p)` by the owning field.
pub type FieldElement = BigUint;

/// Prime field `Z/pZ` with arbitrary-precision elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FiniteField {
    prime: BigUint,
}

impl FiniteField {
    /// Creates a field over `prime`. The modulus is fixed for the lifetime of
    /// the instance and must be at least 2; use [`FiniteField::try_new`] for
    /// untrusted moduli.
    #[must_use]
    pub fn new(prime: BigUint) -> Self {
        debug_assert!(prime >= BigUint::from(2u32), "field modulus must be at least 2");
        Self { prime }
    }

    /// Checked form of [`FiniteField::new`].
    ///
    /// # Errors
    ///
    /// [`FieldError::InvalidModulus`] for a modulus of 0 or 1.
    pub fn try_new(prime: BigUint) -> Result<Self, FieldError> {
        if prime < BigUint::from(2u32) {
            return Err(FieldError::InvalidModulus(prime.to_string()));
        }
        Ok(Self { prime })
    }

    /// The BN254 scalar field, which is the base field of BabyJubJub.
    #[must_use]
    pub fn bn254() -> Self {
        Self::new(BN254_SCALAR_FIELD.clone())
    }

    #[must_use]
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    #[must_use]
    pub fn zero(&self) -> FieldElement {
        BigUint::zero()
    }

    #[must_use]
    pub fn one(&self) -> FieldElement {
        BigUint::one()
    }

    /// Builds an element from a signed integer using floor-mod semantics.
    #[must_use]
    pub fn new_element(&self, value: &BigInt) -> FieldElement {
        self.normalize(value)
    }

    /// Reduces a signed intermediate into `[0, p)`.
    #[must_use]
    pub fn normalize(&self, value: &BigInt) -> FieldElement {
        let p = BigInt::from(self.prime.clone());
        let reduced = ((value % &p) + &p) % &p;
        reduced.magnitude().clone()
    }

    /// Reduces an unsigned value into `[0, p)`.
    #[must_use]
    pub fn reduce(&self, value: &BigUint) -> FieldElement {
        value % &self.prime
    }

    #[must_use]
    pub fn add(&self, a: &BigUint, b: &BigUint) -> FieldElement {
        (a + b) % &self.prime
    }

    #[must_use]
    pub fn sub(&self, a: &BigUint, b: &BigUint) -> FieldElement {
        (self.reduce(a) + &self.prime - self.reduce(b)) % &self.prime
    }

    #[must_use]
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> FieldElement {
        (a * b) % &self.prime
    }

    #[must_use]
    pub fn square(&self, a: &BigUint) -> FieldElement {
        self.mul(a, a)
    }

    #[must_use]
    pub fn negate(&self, value: &BigUint) -> FieldElement {
        let v = self.reduce(value);
        if v.is_zero() {
            return v;
        }
        &self.prime - v
    }

    /// Computes `a / b`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::DivisionByZero`] when `b ≡ 0 (mod p)`.
    pub fn div(&self, a: &BigUint, b: &BigUint) -> Result<FieldElement, FieldError> {
        let inverse = self.mod_inverse(b)?;
        Ok(self.mul(a, &inverse))
    }

    /// Multiplicative inverse by the extended Euclidean algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::DivisionByZero`] for zero and
    /// [`FieldError::NoInverseExists`] when `gcd(a, p) != 1`, which only
    /// happens if the configured modulus is not prime.
    pub fn mod_inverse(&self, a: &BigUint) -> Result<FieldElement, FieldError> {
        let reduced = self.reduce(a);
        if reduced.is_zero() {
            return Err(FieldError::DivisionByZero);
        }

        let p = BigInt::from(self.prime.clone());
        let mut t = BigInt::zero();
        let mut new_t = BigInt::one();
        let mut r = p.clone();
        let mut new_r = BigInt::from(reduced);

        while !new_r.is_zero() {
            let quotient = &r / &new_r;
            let next_t = &t - &quotient * &new_t;
            t = std::mem::replace(&mut new_t, next_t);
            let next_r = &r - &quotient * &new_r;
            r = std::mem::replace(&mut new_r, next_r);
        }

        if r > BigInt::one() {
            return Err(FieldError::NoInverseExists {
                value: a.to_string(),
                modulus: self.prime.to_string(),
            });
        }

        if t.is_negative() {
            t += &p;
        }

        Ok(self.normalize(&t))
    }

    /// Equality of canonical representatives.
    #[must_use]
    pub fn eq(&self, a: &BigUint, b: &BigUint) -> bool {
        self.reduce(a) == self.reduce(b)
    }

    /// Whether `value` already lies in `[0, p)`.
    #[must_use]
    pub fn is_in_field(&self, value: &BigUint) -> bool {
        value < &self.prime
    }

    /// Signed variant of [`FiniteField::is_in_field`].
    #[must_use]
    pub fn is_in_field_signed(&self, value: &BigInt) -> bool {
        !value.is_negative() && value.magnitude() < &self.prime
    }
}

impl Default for FiniteField {
    fn default() -> Self {
        Self::bn254()
    }
}

use crate::halo2curves::CurveAffine;
use ff::PrimeField;
use num_bigint::BigInt;
use num_bigint::BigUint;
use num_bigint::Sign;
use num_traits::Signed;
use num_traits::{One, Zero};

// utils modified from halo2-base

pub fn modulus<F: PrimeField>() -> BigUint {
    fe_to_biguint(&-F::ONE) + 1u64
}

pub fn biguint_to_fe<F: PrimeField>(e: &BigUint) -> F {
    let modulus = modulus::<F>();
    let e = e % modulus;
    F::from_str_vartime(&e.to_str_radix(10)[..]).unwrap()
}

pub fn bigint_to_fe<F: PrimeField>(e: &BigInt) -> F {
    let modulus = BigInt::from_biguint(Sign::Plus, modulus::<F>());
    let e: BigInt = if e.is_negative() {
        let mut a: BigInt = e % &modulus;
        while a < BigInt::zero() {
            a += &modulus;
        }
        a
    } else {
        e % &modulus
    };
    F::from_str_vartime(&e.to_str_radix(10)[..]).unwrap()
}

/// Assumes `PrimeField::to_repr` is little-endian.
pub fn fe_to_biguint<F: PrimeField>(fe: &F) -> BigUint {
    BigUint::from_bytes_le(fe.to_repr().as_ref())
}

pub fn fe_to_bigint<F: PrimeField>(fe: &F) -> BigInt {
    let modulus = modulus::<F>();
    let e = fe_to_biguint(fe);
    if e <= &modulus / 2u32 {
        BigInt::from_biguint(Sign::Plus, e)
    } else {
        BigInt::from_biguint(Sign::Minus, modulus - e)
    }
}

/// Returns the canonical (non-Montgomery) little endian 64-bit limbs of a field element of at most 256 bits.
///
/// Assumes `PrimeField::to_repr` is little-endian.
#[inline(always)]
pub fn fe_to_limbs<F: PrimeField>(fe: &F) -> [u64; 4] {
    let repr = fe.to_repr();
    let bytes = repr.as_ref();
    debug_assert!(bytes.len() <= 32);
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks(8)) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        *limb = u64::from_le_bytes(buf);
    }
    limbs
}

/// Returns the little endian 64-bit limbs of `e`, which must be less than 2<sup>256</sup>.
pub fn biguint_to_limbs(e: &BigUint) -> [u64; 4] {
    debug_assert!(e.bits() <= 256);
    let mut limbs = [0u64; 4];
    for (limb, digit) in limbs.iter_mut().zip(e.iter_u64_digits()) {
        *limb = digit;
    }
    limbs
}

/// Returns `round(num / den)` for `den > 0`, rounding halves away from zero.
pub fn div_round(num: &BigInt, den: &BigUint) -> BigInt {
    let den = BigInt::from_biguint(Sign::Plus, den.clone());
    let half = &den >> 1usize;
    let magnitude = (num.abs() + half) / &den;
    if num.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Index of the most significant set bit of `x`, or `None` if `x == 0`.
#[inline(always)]
pub fn most_significant_bit(x: u64) -> Option<u32> {
    (x != 0).then(|| 63 - x.leading_zeros())
}

/// `⌊log2 n⌋` for `n > 0`.
#[inline(always)]
pub fn log2_floor(n: usize) -> u32 {
    debug_assert!(n > 0);
    usize::BITS - 1 - n.leading_zeros()
}

/// Largest power of two that is at most `n`, for `n > 0`.
#[inline(always)]
pub fn prev_power_of_two(n: usize) -> usize {
    1usize << log2_floor(n)
}

pub fn power_of_two_biguint(n: usize) -> BigUint {
    BigUint::one() << n
}

/// Helper trait for raw access to affine coordinates.
///
/// The point at infinity is represented by `(0, 0)`.
pub trait CurveAffineExt: CurveAffine {
    /// Returns the raw affine (X, Y) coordinantes
    fn into_coordinates(self) -> (Self::Base, Self::Base);

    /// Builds a point from raw coordinates without checking that it lies on the curve.
    fn from_coordinates_unchecked(x: Self::Base, y: Self::Base) -> Self;
}

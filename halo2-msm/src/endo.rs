//! Scalar decomposition along the curve endomorphism (GLV).
//!
//! For curves with `j = 0` the map `(x, y) -> (beta * x, y)` equals `[lambda] P` for a primitive
//! cube root of unity `lambda` mod `r`. Any `k` can then be written `k = k1 + k2 * lambda (mod r)`
//! with `|k1|, |k2| ~ sqrt(r)`, halving the number of bits fed to Pippenger per point.
//!
//! Reference: Gallant, Lambert, Vanstone, "Faster Point Multiplication on Elliptic Curves with
//! Efficient Endomorphisms".
use crate::error::MsmError;
use crate::halo2curves::CurveAffine;
use crate::utils::{
    biguint_to_fe, biguint_to_limbs, bigint_to_fe, div_round, fe_to_limbs, modulus,
    power_of_two_biguint, CurveAffineExt,
};
use crate::wnaf::SCALAR_BITS;
use ff::{Field, PrimeField};
use group::Curve;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed};

/// A curve with an efficiently computable endomorphism of eigenvalue `lambda`.
pub trait GlvCurve: CurveAffineExt {
    /// Validated endomorphism parameters of the curve.
    fn endo_params() -> &'static EndoParams<Self>;

    /// Returns `(beta * x, y) = [lambda] self`.
    fn endomorphism(&self) -> Self {
        let (x, y) = self.into_coordinates();
        Self::from_coordinates_unchecked(Self::endo_params().beta * x, y)
    }
}

/// A scalar split into two signed half-width scalars:
/// `k = (-1)^k1_neg * k1 + (-1)^k2_neg * k2 * lambda`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitScalar {
    pub k1: u128,
    pub k1_neg: bool,
    pub k2: u128,
    pub k2_neg: bool,
}

impl SplitScalar {
    /// Recombines the two halves into the original scalar.
    pub fn recompose<F: PrimeField>(&self, lambda: &F) -> F {
        let signed = |k: u128, neg: bool| {
            let k = F::from_u128(k);
            if neg {
                -k
            } else {
                k
            }
        };
        signed(self.k1, self.k1_neg) + signed(self.k2, self.k2_neg) * lambda
    }
}

// 2^256 * b / r, rounded, as a magnitude and a sign
#[derive(Clone, Copy, Debug)]
struct WideConstant {
    magnitude: [u64; 4],
    negative: bool,
}

impl WideConstant {
    fn new(value: &BigInt) -> Self {
        Self { magnitude: biguint_to_limbs(value.magnitude()), negative: value.is_negative() }
    }

    // round(k * b / r) up to an error below 1.125, as a field element
    #[inline(always)]
    fn approx_quotient<F: PrimeField>(&self, k: &[u64; 4]) -> F {
        let c = F::from_u128(mul_shift_256(k, &self.magnitude));
        if self.negative {
            -c
        } else {
            c
        }
    }
}

/// `(k * g) >> 256`, assuming the result fits in 128 bits.
#[inline(always)]
fn mul_shift_256(k: &[u64; 4], g: &[u64; 4]) -> u128 {
    let mut product = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0u128;
        for j in 0..4 {
            let t = (k[i] as u128) * (g[j] as u128) + product[i + j] as u128 + carry;
            product[i + j] = t as u64;
            carry = t >> 64;
        }
        product[i + 4] = carry as u64;
    }
    debug_assert!(product[6] == 0 && product[7] == 0);
    (product[4] as u128) | ((product[5] as u128) << 64)
}

/// Endomorphism constants of a curve together with a short basis of the lattice
/// `{(a, b) : a + b * lambda = 0 mod r}`.
#[derive(Clone, Debug)]
pub struct EndoParams<C: CurveAffine> {
    pub beta: C::Base,
    pub lambda: C::Scalar,
    a1: C::Scalar,
    b1: C::Scalar,
    a2: C::Scalar,
    b2: C::Scalar,
    g1: WideConstant,
    g2: WideConstant,
}

impl<C: CurveAffineExt> EndoParams<C> {
    /// Validates the constants and precomputes the fixed-point quotients
    /// `g1 = round(2^256 * b2 / r)` and `g2 = round(-2^256 * b1 / r)`.
    ///
    /// * `basis`: `[[a1, b1], [a2, b2]]`
    pub fn new(
        beta: &BigUint,
        lambda: &BigUint,
        basis: [[BigInt; 2]; 2],
    ) -> Result<Self, MsmError> {
        let r = modulus::<C::Scalar>();
        let r_signed = BigInt::from_biguint(Sign::Plus, r.clone());
        let beta_fe = biguint_to_fe::<C::Base>(beta);
        let lambda_fe = biguint_to_fe::<C::Scalar>(lambda);

        if lambda_fe == C::Scalar::ONE || lambda_fe.square() * lambda_fe != C::Scalar::ONE {
            return Err(MsmError::InvalidEndomorphism(
                "lambda is not a primitive cube root of unity",
            ));
        }
        if beta_fe == C::Base::ONE || beta_fe.square() * beta_fe != C::Base::ONE {
            return Err(MsmError::InvalidEndomorphism("beta is not a primitive cube root of unity"));
        }

        let lambda_int = BigInt::from_biguint(Sign::Plus, lambda.clone());
        for [a, b] in basis.iter() {
            let residue = (a + b * &lambda_int) % &r_signed;
            if residue.sign() != Sign::NoSign {
                return Err(MsmError::InvalidEndomorphism("basis vector is not in the lattice"));
            }
        }
        let [[a1, b1], [a2, b2]] = basis;
        // a positively oriented basis of determinant r spans the whole lattice
        if &a1 * &b2 - &a2 * &b1 != r_signed {
            return Err(MsmError::InvalidEndomorphism("basis determinant is not r"));
        }

        // each half differs from the exact rational solution by less than 1.125 basis vectors,
        // and must stay below 2^SCALAR_BITS - 1 so the skew adjustment cannot overflow
        let limit = BigInt::from_biguint(Sign::Plus, power_of_two_biguint(SCALAR_BITS)) - 2u32;
        for bound in [a1.abs() + a2.abs(), b1.abs() + b2.abs()] {
            if bound * 9u32 >= &limit * 8u32 {
                return Err(MsmError::InvalidEndomorphism("basis is not short enough"));
            }
        }

        let generator = C::generator();
        let (x, y) = generator.into_coordinates();
        if (generator * lambda_fe).to_affine() != C::from_coordinates_unchecked(beta_fe * x, y) {
            return Err(MsmError::InvalidEndomorphism("beta and lambda do not define the same map"));
        }

        let shift = BigInt::one() << 256usize;
        let g1 = div_round(&(&shift * &b2), &r);
        let g2 = div_round(&(-(&shift * &b1)), &r);
        let max_quotient = power_of_two_biguint(128);
        for g in [&g1, &g2] {
            if g.magnitude().bits() > 256 || (&r * g.magnitude()) >> 256usize >= max_quotient {
                return Err(MsmError::InvalidEndomorphism("fixed-point quotient is too wide"));
            }
        }

        Ok(Self {
            beta: beta_fe,
            lambda: lambda_fe,
            a1: bigint_to_fe(&a1),
            b1: bigint_to_fe(&b1),
            a2: bigint_to_fe(&a2),
            b2: bigint_to_fe(&b2),
            g1: WideConstant::new(&g1),
            g2: WideConstant::new(&g2),
        })
    }

    /// Splits `k` into `(k1, k2)` with `k = k1 + k2 * lambda (mod r)` and `|k1|, |k2| < 2^127`.
    ///
    /// No 512-bit division: the lattice coefficients are approximated by a truncated wide
    /// multiplication.
    pub fn split_scalar(&self, k: &C::Scalar) -> SplitScalar {
        let limbs = fe_to_limbs(k);
        let c1: C::Scalar = self.g1.approx_quotient(&limbs);
        let c2: C::Scalar = self.g2.approx_quotient(&limbs);

        let k1 = *k - c1 * self.a1 - c2 * self.a2;
        let k2 = -(c1 * self.b1 + c2 * self.b2);

        let (k1, k1_neg) = to_signed_half(&k1);
        let (k2, k2_neg) = to_signed_half(&k2);
        debug_assert!(k1 >> SCALAR_BITS == 0 && k2 >> SCALAR_BITS == 0);
        SplitScalar { k1, k1_neg, k2, k2_neg }
    }
}

// interprets a field element of small magnitude as a signed 128-bit integer
#[inline(always)]
fn to_signed_half<F: PrimeField>(v: &F) -> (u128, bool) {
    let limbs = fe_to_limbs(v);
    if limbs[2] == 0 && limbs[3] == 0 {
        return (limbs[0] as u128 | (limbs[1] as u128) << 64, false);
    }
    let limbs = fe_to_limbs(&-*v);
    debug_assert!(limbs[2] == 0 && limbs[3] == 0, "split scalar out of range");
    (limbs[0] as u128 | (limbs[1] as u128) << 64, true)
}

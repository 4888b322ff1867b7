use crate::endo::{EndoParams, GlvCurve};
use crate::halo2curves::bn256::{Fq, G1Affine};
use crate::utils::CurveAffineExt;
use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint};

/// Cube root of unity in `Fq` with `(beta * x, y) = [lambda] (x, y)` on G1.
pub const ENDO_BETA: &str = "2203960485148121921418603742825762020974279258880205651966";
/// Cube root of unity in `Fr`.
pub const ENDO_LAMBDA: &str = "4407920970296243842393367215006156084916469457145843978461";

// short basis of {(a, b) : a + b * lambda = 0 mod r}
pub const ENDO_A1: &str = "9931322734385697763";
pub const ENDO_B1: &str = "-147946756881789319000765030803803410728";
pub const ENDO_A2: &str = "147946756881789319010696353538189108491";
pub const ENDO_B2: &str = "9931322734385697763";

lazy_static! {
    static ref G1_ENDO_PARAMS: EndoParams<G1Affine> = {
        let uint = |s: &str| s.parse::<BigUint>().unwrap();
        let int = |s: &str| s.parse::<BigInt>().unwrap();
        EndoParams::new(
            &uint(ENDO_BETA),
            &uint(ENDO_LAMBDA),
            [[int(ENDO_A1), int(ENDO_B1)], [int(ENDO_A2), int(ENDO_B2)]],
        )
        .unwrap_or_else(|e| panic!("bn254 endomorphism constants are invalid: {e}"))
    };
}

impl CurveAffineExt for G1Affine {
    fn into_coordinates(self) -> (Fq, Fq) {
        (self.x, self.y)
    }

    fn from_coordinates_unchecked(x: Fq, y: Fq) -> Self {
        G1Affine { x, y }
    }
}

impl GlvCurve for G1Affine {
    fn endo_params() -> &'static EndoParams<Self> {
        &G1_ENDO_PARAMS
    }
}

#[cfg(test)]
pub(crate) mod tests;

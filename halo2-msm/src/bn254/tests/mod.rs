#![allow(non_snake_case)]
use super::*;
use crate::halo2curves::bn256::{Fr, G1};
use ff::{Field, PrimeField};
use group::{prime::PrimeCurveAffine, Curve, Group};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};


#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MsmBenchParams {
    log2_points: usize,
    trials: usize,
}

pub fn random_points(rng: &mut StdRng, n: usize) -> Vec<G1Affine> {
    let mut points = vec![G1::identity(); n];
    for point in points.iter_mut() {
        *point = G1::random(&mut *rng);
    }
    let mut affine = vec![G1Affine::identity(); n];
    G1::batch_normalize(&points, &mut affine);
    affine
}

pub fn random_scalars(rng: &mut StdRng, n: usize) -> Vec<Fr> {
    (0..n).map(|_| Fr::random(&mut *rng)).collect()
}

/// Textbook double-and-add over the canonical bits of `scalar`, most significant first.
pub fn double_and_add(point: &G1Affine, scalar: &Fr) -> G1 {
    let mut acc = G1::identity();
    for byte in scalar.to_repr().as_ref().iter().rev() {
        for i in (0..8).rev() {
            acc = acc.double();
            if (byte >> i) & 1 == 1 {
                acc += point;
            }
        }
    }
    acc
}

pub fn reference_msm(scalars: &[Fr], points: &[G1Affine]) -> G1 {
    scalars.iter().zip(points.iter()).fold(G1::identity(), |acc, (s, p)| acc + double_and_add(p, s))
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[test]
fn test_double_and_add() {
    let mut rng = rng(0);
    let p = G1::random(&mut rng).to_affine();
    let k = Fr::random(&mut rng);
    assert_eq!(double_and_add(&p, &k), p * k);
    assert_eq!(double_and_add(&p, &Fr::ZERO), G1::identity());
}

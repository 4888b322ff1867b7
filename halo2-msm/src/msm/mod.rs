//! Multi-scalar multiplication `sum_i scalars[i] * points[i]`.
//!
//! Small batches are computed directly. Larger ones run Pippenger's bucket method on the largest
//! power-of-two prefix (capped at `2^max_pippenger_log2`) and continue on the remainder, so every
//! input size is accepted.
//!
//! Two variants are offered:
//! * [`msm_safe`] uses complete addition formulas and is correct for every input, including
//!   adversarially chosen points.
//! * [`msm_unsafe`] uses incomplete affine additions, which are faster but give a wrong result if
//!   two points accumulated into the same bucket ever coincide or cancel. This is negligible for
//!   independent points such as a public reference string, and exploitable when an adversary
//!   picks the points. Never use it to verify.
use crate::config::MsmConfig;
use crate::endo::GlvCurve;
use crate::error::MsmError;
use crate::utils::prev_power_of_two;
use group::Group;
use log::debug;
use rayon::prelude::*;

pub mod accumulate;
pub mod organize;
pub mod pippenger;
pub mod point_table;
pub mod runtime_state;

pub use accumulate::AdditionMode;
pub use pippenger::PippengerShape;
pub use point_table::{generate_point_table, PointTable};
pub use runtime_state::{RuntimeState, ScratchGuard, ThreadScratch};

/// MSM driver with a reusable scratch arena.
///
/// Keep one context per prover to avoid reallocating scratch memory on every commitment.
#[derive(Debug)]
pub struct MsmContext<C: GlvCurve> {
    config: MsmConfig,
    state: RuntimeState<C>,
}

impl<C: GlvCurve> Default for MsmContext<C> {
    fn default() -> Self {
        Self { config: MsmConfig::default(), state: RuntimeState::new() }
    }
}

impl<C: GlvCurve> MsmContext<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MsmConfig) -> Result<Self, MsmError> {
        config.validate()?;
        Ok(Self { config, state: RuntimeState::new() })
    }

    pub fn config(&self) -> &MsmConfig {
        &self.config
    }

    /// Pre-sizes the arena for calls over up to `num_points` scalars on the current thread pool.
    pub fn reserve(&mut self, num_points: usize) {
        let num_threads = rayon::current_num_threads();
        if num_points <= self.config.naive_threshold(num_threads) {
            return;
        }
        let max_chunk = 1usize << self.config.max_pippenger_log2;
        let chunk = prev_power_of_two(num_points.min(max_chunk));
        if let Some(shape) = PippengerShape::for_points(chunk) {
            self.state.reserve(shape, num_threads);
        }
    }

    /// `sum_i scalars[i] * table[i]` with complete addition formulas.
    pub fn msm_safe(
        &mut self,
        scalars: &[C::Scalar],
        table: &PointTable<C>,
    ) -> Result<C::Curve, MsmError> {
        self.evaluate(scalars, table, AdditionMode::Complete)
    }

    /// `sum_i scalars[i] * table[i]` with incomplete addition formulas.
    ///
    /// Only for independent points nobody adversarial could have chosen; see the module docs.
    pub fn msm_unsafe(
        &mut self,
        scalars: &[C::Scalar],
        table: &PointTable<C>,
    ) -> Result<C::Curve, MsmError> {
        self.evaluate(scalars, table, AdditionMode::Incomplete)
    }

    fn evaluate(
        &mut self,
        scalars: &[C::Scalar],
        table: &PointTable<C>,
        mode: AdditionMode,
    ) -> Result<C::Curve, MsmError> {
        let num_scalars = scalars.len();
        if table.len() < num_scalars {
            return Err(MsmError::TableTooShort { scalars: num_scalars, points: table.len() });
        }
        let mut scratch = self.state.acquire();
        if num_scalars == 0 {
            return Ok(C::Curve::identity());
        }

        let num_threads = rayon::current_num_threads();
        let threshold = self.config.naive_threshold(num_threads);
        let max_chunk = 1usize << self.config.max_pippenger_log2;
        let table = table.as_slice();

        let mut result = C::Curve::identity();
        let mut offset = 0;
        while offset < num_scalars {
            let remaining = num_scalars - offset;
            if remaining <= threshold {
                debug!("naive msm over {remaining} scalars (threshold {threshold})");
                result += naive_msm(&scalars[offset..], &table[2 * offset..]);
                break;
            }
            let chunk = prev_power_of_two(remaining.min(max_chunk));
            let shape = PippengerShape::for_points(chunk).ok_or_else(|| {
                MsmError::InvalidConfig(format!("no pippenger shape for {chunk} points"))
            })?;
            debug!(
                "{mode:?} pippenger over {chunk} of {remaining} scalars: bucket width {}, {} rounds, {num_threads} threads",
                shape.bucket_width, shape.num_rounds
            );
            result += pippenger::pippenger(
                &scalars[offset..offset + chunk],
                &table[2 * offset..2 * (offset + chunk)],
                &mut scratch,
                shape,
                mode,
            );
            offset += chunk;
        }
        Ok(result)
    }
}

/// Multiplies each base point by its scalar in parallel and sums the products right to left.
///
/// * `table`: interleaved table as in [`PointTable`], at least `2 * scalars.len()` long
fn naive_msm<C: GlvCurve>(scalars: &[C::Scalar], table: &[C]) -> C::Curve {
    let products: Vec<C::Curve> = scalars
        .par_iter()
        .zip(table.par_chunks(2))
        .map(|(scalar, pair)| pair[0] * *scalar)
        .collect();
    products.into_iter().rev().fold(C::Curve::identity(), |acc, product| acc + product)
}

/// `sum_i scalars[i] * table[i]`, correct for every input.
///
/// `table` may hold more points than there are scalars; the extra points are ignored.
pub fn msm_safe<C: GlvCurve>(
    scalars: &[C::Scalar],
    table: &PointTable<C>,
) -> Result<C::Curve, MsmError> {
    MsmContext::new().msm_safe(scalars, table)
}

/// `sum_i scalars[i] * table[i]` with incomplete addition formulas. Prover-side only.
pub fn msm_unsafe<C: GlvCurve>(
    scalars: &[C::Scalar],
    table: &PointTable<C>,
) -> Result<C::Curve, MsmError> {
    MsmContext::new().msm_unsafe(scalars, table)
}

/// [`msm_safe`] for one-off point sets: builds the endomorphism table on the fly.
pub fn msm_safe_from_points<C: GlvCurve>(
    scalars: &[C::Scalar],
    points: &[C],
) -> Result<C::Curve, MsmError> {
    if points.len() < scalars.len() {
        return Err(MsmError::TableTooShort { scalars: scalars.len(), points: points.len() });
    }
    let table = generate_point_table(&points[..scalars.len()]);
    msm_safe(scalars, &table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::halo2curves::bn256::{Fr, G1Affine, G1};
    use ff::Field;
    use group::Curve;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_context_arena_is_reset_after_every_call() {
        let mut rng = StdRng::seed_from_u64(13);
        let points: Vec<G1Affine> = (0..600).map(|_| G1::random(&mut rng).to_affine()).collect();
        let scalars: Vec<Fr> = (0..600).map(|_| Fr::random(&mut rng)).collect();
        let table = generate_point_table(&points);

        // threshold independent of the pool size
        let config = MsmConfig { naive_points_per_thread: 0, ..Default::default() };
        let mut context = MsmContext::with_config(config).unwrap();
        context.reserve(600);
        let reserved = context.state.capacity();
        assert!(reserved > 0);
        assert!(context.state.is_reset());

        let first = context.msm_safe(&scalars, &table).unwrap();
        assert!(context.state.is_reset());
        assert_eq!(context.state.capacity(), reserved);
        let second = context.msm_unsafe(&scalars, &table).unwrap();
        assert!(context.state.is_reset());
        assert_eq!(first.to_affine(), second.to_affine());

        assert_eq!(context.msm_safe(&[], &table).unwrap(), G1::identity());
        assert!(context.state.is_reset());
        assert!(context.msm_safe(&scalars, &generate_point_table(&points[..10])).is_err());
        assert!(context.state.is_reset());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = MsmConfig { max_pippenger_log2: 1, ..Default::default() };
        assert!(matches!(
            MsmContext::<G1Affine>::with_config(config),
            Err(MsmError::InvalidConfig(_))
        ));
        let config = MsmConfig { min_naive_threshold: 64, ..Default::default() };
        let context = MsmContext::<G1Affine>::with_config(config).unwrap();
        assert_eq!(context.config().min_naive_threshold, 64);
    }
}

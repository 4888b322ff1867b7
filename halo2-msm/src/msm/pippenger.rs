//! Pippenger's bucket method over the endomorphism-split point table.
//!
//! Reference: https://jbootle.github.io/Misc/pippenger.pdf
use super::accumulate::{accumulate_round, apply_skews, AdditionMode};
use super::organize::organize_round;
use super::runtime_state::RuntimeState;
use crate::config::{MAX_PIPPENGER_LOG2, MIN_PIPPENGER_LOG2};
use crate::endo::GlvCurve;
use crate::utils::log2_floor;
use crate::wnaf::{fixed_wnaf, num_buckets, num_rounds, optimal_bucket_width, SkewFlag, WnafEntry};
use ff::Field;
use group::Group;
use lazy_static::lazy_static;
use log::trace;
use rayon::prelude::*;
use std::ops::Range;

/// Round and bucket layout of a Pippenger call over `2^log2_points` scalars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PippengerShape {
    pub log2_points: u32,
    pub num_points: usize,
    pub bucket_width: usize,
    pub num_rounds: usize,
    pub num_buckets: usize,
}

lazy_static! {
    static ref SHAPES: Vec<PippengerShape> =
        (MIN_PIPPENGER_LOG2..=MAX_PIPPENGER_LOG2).map(PippengerShape::new).collect();
}

impl PippengerShape {
    fn new(log2_points: u32) -> Self {
        let num_points = 1 << log2_points;
        let bucket_width = optimal_bucket_width(num_points);
        Self {
            log2_points,
            num_points,
            bucket_width,
            num_rounds: num_rounds(bucket_width),
            num_buckets: num_buckets(bucket_width),
        }
    }

    /// The precomputed shape for exactly `num_points` scalars, if `num_points` is a power of two
    /// in `[2^MIN_PIPPENGER_LOG2, 2^MAX_PIPPENGER_LOG2]`.
    pub fn for_points(num_points: usize) -> Option<&'static Self> {
        if !num_points.is_power_of_two() {
            return None;
        }
        let log2 = log2_floor(num_points);
        if !(MIN_PIPPENGER_LOG2..=MAX_PIPPENGER_LOG2).contains(&log2) {
            return None;
        }
        SHAPES.get((log2 - MIN_PIPPENGER_LOG2) as usize)
    }

    /// Number of points in the endomorphism table, twice the number of scalars.
    pub fn num_table_points(&self) -> usize {
        2 * self.num_points
    }
}

/// Worker `thread`'s share of `len` items: `len * thread / num_threads .. len * (thread + 1) / num_threads`.
///
/// The ranges of `0..num_threads` are disjoint and cover `0..len`.
#[inline(always)]
pub fn shard_range(len: usize, num_threads: usize, thread: usize) -> Range<usize> {
    len * thread / num_threads..len * (thread + 1) / num_threads
}

/// Computes `sum_i scalars[i] * table[2i]` for exactly `shape.num_points` scalars.
///
/// * `table`: `2 * shape.num_points` points laid out as in [`super::PointTable`]
pub fn pippenger<C: GlvCurve>(
    scalars: &[C::Scalar],
    table: &[C],
    state: &mut RuntimeState<C>,
    shape: &PippengerShape,
    mode: AdditionMode,
) -> C::Curve {
    assert_eq!(scalars.len(), shape.num_points);
    assert_eq!(table.len(), shape.num_table_points());
    let num_threads = rayon::current_num_threads();
    state.prepare(shape, num_threads);

    let RuntimeState { wnafs, skews, schedule, round_counts, bucket_offsets, threads } = state;
    let PippengerShape { bucket_width, num_rounds, num_buckets, .. } = *shape;
    let num_table_points = shape.num_table_points();

    trace!("encoding {} scalars into {num_rounds} rounds", scalars.len());
    encode_scalars(scalars, table, bucket_width, num_rounds, wnafs, skews);
    let wnafs = &*wnafs;

    trace!("sorting {num_rounds} rounds into {num_buckets} buckets");
    schedule
        .par_chunks_mut(num_table_points)
        .zip(round_counts.par_iter_mut())
        .zip(bucket_offsets.par_chunks_mut(num_buckets + 1))
        .enumerate()
        .for_each(|(round, ((out, count), offsets))| {
            *count = organize_round(wnafs, round, num_rounds, offsets, out);
        });

    trace!("accumulating buckets on {num_threads} threads");
    let schedule = &*schedule;
    let round_counts = &*round_counts;
    let skews = &*skews;
    let totals: Vec<C::Curve> = threads[..num_threads]
        .par_iter_mut()
        .enumerate()
        .map(|(thread, scratch)| {
            let mut total = C::Curve::identity();
            for round in 0..num_rounds {
                if round > 0 {
                    for _ in 0..=bucket_width {
                        total = total.double();
                    }
                }
                let start = round * num_table_points;
                let entries = &schedule[start..start + round_counts[round]];
                let shard = &entries[shard_range(entries.len(), num_threads, thread)];
                let mut acc = accumulate_round(shard, table, scratch, mode);
                if round == num_rounds - 1 {
                    let skew_range = shard_range(num_table_points, num_threads, thread);
                    apply_skews(&mut acc, &skews[skew_range.clone()], &table[skew_range]);
                }
                total += acc;
            }
            total
        })
        .collect();

    // summed in thread order so the result does not depend on scheduling
    totals.into_iter().fold(C::Curve::identity(), |acc, total| acc + total)
}

/// Splits every scalar and writes the digits of both halves into `wnafs`, point-major.
///
/// Zero scalars and points at infinity are marked [`WnafEntry::SKIP`] in every round.
fn encode_scalars<C: GlvCurve>(
    scalars: &[C::Scalar],
    table: &[C],
    bucket_width: usize,
    num_rounds: usize,
    wnafs: &mut [WnafEntry],
    skews: &mut [SkewFlag],
) {
    let endo = C::endo_params();
    wnafs
        .par_chunks_mut(2 * num_rounds)
        .zip(skews.par_chunks_mut(2))
        .zip(scalars.par_iter().zip(table.par_chunks(2)))
        .enumerate()
        .for_each(|(i, ((digits, skew), (scalar, pair)))| {
            if bool::from(scalar.is_zero()) || bool::from(pair[0].is_identity()) {
                digits.fill(WnafEntry::SKIP);
                skew.fill(SkewFlag::default());
                return;
            }
            let split = endo.split_scalar(scalar);
            let (lo, hi) = digits.split_at_mut(num_rounds);
            // k2 multiplies the table's -[lambda] P, so its sign is flipped
            let index = 2 * i as u32;
            let skew_lo = fixed_wnaf(split.k1, split.k1_neg, index, bucket_width, lo);
            let skew_hi = fixed_wnaf(split.k2, !split.k2_neg, index + 1, bucket_width, hi);
            skew[0] = SkewFlag { skew: skew_lo, negative: split.k1_neg };
            skew[1] = SkewFlag { skew: skew_hi, negative: !split.k2_neg };
        });
}

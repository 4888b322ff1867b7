//! Bucket accumulation for one worker's shard of one round.
use super::runtime_state::ThreadScratch;
use crate::utils::{most_significant_bit, CurveAffineExt};
use crate::wnaf::{SkewFlag, WnafEntry};
use ff::{BatchInvert, Field};
use group::Group;
use itertools::Itertools;

/// Which addition formulas the accumulator uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdditionMode {
    /// Mixed projective + affine additions with complete formulas.
    Complete,
    /// Batched affine additions sharing one inversion per level; wrong when two points in a
    /// bucket coincide or cancel.
    Incomplete,
}

/// Adds this shard's share of one round, `sum_k (2k + 1) B_k` over its buckets, where the shard
/// owns buckets `first..=last` of the sorted schedule.
///
/// An empty shard contributes the identity.
pub fn accumulate_round<C: CurveAffineExt>(
    shard: &[WnafEntry],
    points: &[C],
    scratch: &mut ThreadScratch<C>,
    mode: AdditionMode,
) -> C::Curve {
    let (Some(first), Some(last)) = (shard.first(), shard.last()) else {
        return C::Curve::identity();
    };
    let first_bucket = first.bucket();
    let num_buckets = last.bucket() - first_bucket + 1;
    scratch.buckets.clear();
    scratch.buckets.resize(num_buckets, C::Curve::identity());

    match mode {
        AdditionMode::Complete => {
            for entry in shard {
                let bucket = &mut scratch.buckets[entry.bucket() - first_bucket];
                let point = &points[entry.point_index()];
                if entry.is_negative() {
                    *bucket -= point;
                } else {
                    *bucket += point;
                }
            }
        }
        AdditionMode::Incomplete => {
            scratch.points.clear();
            scratch.point_buckets.clear();
            for entry in shard {
                let point = points[entry.point_index()];
                scratch.points.push(if entry.is_negative() { -point } else { point });
                scratch.point_buckets.push(entry.bucket() - first_bucket);
            }
            batch_affine_reduce(
                &mut scratch.points,
                &mut scratch.point_buckets,
                &mut scratch.inverses,
            );
            for (point, bucket) in scratch.points.iter().zip_eq(scratch.point_buckets.iter()) {
                scratch.buckets[*bucket] = point.to_curve();
            }
        }
    }
    reduce_buckets(&scratch.buckets, first_bucket)
}

/// Returns `sum_k (2 * (first_bucket + k) + 1) * buckets[k]` using the running-sum trick.
pub fn reduce_buckets<G: Group>(buckets: &[G], first_bucket: usize) -> G {
    let Some((lowest, rest)) = buckets.split_first() else {
        return G::identity();
    };
    let mut running_sum = G::identity();
    let mut acc = G::identity();
    for bucket in rest.iter().rev() {
        running_sum += bucket;
        acc += running_sum;
    }
    // acc = sum_k k * B_k, running_sum = sum_k B_k
    running_sum += lowest;
    acc = acc.double() + running_sum;

    // the shard does not start at bucket 0, so each bucket is missing 2 * first_bucket copies
    if first_bucket > 0 {
        acc += scale(running_sum, 2 * first_bucket as u64);
    }
    acc
}

// double-and-add
fn scale<G: Group>(point: G, scalar: u64) -> G {
    let Some(msb) = most_significant_bit(scalar) else {
        return G::identity();
    };
    let mut acc = point;
    for i in (0..msb).rev() {
        acc = acc.double();
        if (scalar >> i) & 1 == 1 {
            acc += point;
        }
    }
    acc
}

/// Undoes the "make it odd" adjustment of every skewed point in a shard of the table.
pub fn apply_skews<C: CurveAffineExt>(acc: &mut C::Curve, skews: &[SkewFlag], points: &[C]) {
    for (skew, point) in skews.iter().zip_eq(points.iter()) {
        if skew.skew {
            if skew.negative {
                *acc += point;
            } else {
                *acc -= point;
            }
        }
    }
}

/// Repeatedly adds adjacent points that share a bucket until every bucket holds at most one point.
///
/// Each level pairs `(points[i], points[i + 1])` within a run of equal buckets and computes all
/// pair sums with a single batch inversion. `points` and `buckets` shrink in place.
pub fn batch_affine_reduce<C: CurveAffineExt>(
    points: &mut Vec<C>,
    buckets: &mut Vec<usize>,
    inverses: &mut Vec<C::Base>,
) {
    debug_assert_eq!(points.len(), buckets.len());
    loop {
        inverses.clear();
        let mut i = 0;
        while i + 1 < points.len() {
            if buckets[i] == buckets[i + 1] {
                let (x1, _) = points[i].into_coordinates();
                let (x2, _) = points[i + 1].into_coordinates();
                inverses.push(x2 - x1);
                i += 2;
            } else {
                i += 1;
            }
        }
        if inverses.is_empty() {
            return;
        }
        // zero denominators are left as zero
        inverses.iter_mut().batch_invert();

        let (mut read, mut write, mut pair) = (0, 0, 0);
        while read < points.len() {
            if read + 1 < points.len() && buckets[read] == buckets[read + 1] {
                points[write] = add_incomplete(points[read], points[read + 1], inverses[pair]);
                pair += 1;
                read += 2;
            } else {
                points[write] = points[read];
                read += 1;
            }
            buckets[write] = buckets[read - 1];
            write += 1;
        }
        points.truncate(write);
        buckets.truncate(write);
    }
}

/// Affine chord addition given `1 / (x2 - x1)`.
#[inline(always)]
fn add_incomplete<C: CurveAffineExt>(p: C, q: C, inverse: C::Base) -> C {
    let (x1, y1) = p.into_coordinates();
    let (x2, y2) = q.into_coordinates();
    let lambda = (y2 - y1) * inverse;
    let x3 = lambda.square() - x1 - x2;
    let y3 = lambda * (x1 - x3) - y1;
    C::from_coordinates_unchecked(x3, y3)
}

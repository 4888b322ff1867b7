//! Per-round bucket sort of the digit schedule.
use crate::wnaf::WnafEntry;

/// Stable counting sort of one round's digits by bucket index.
///
/// Reads `wnafs[p * num_rounds + round]` for every table point `p`, drops [`WnafEntry::SKIP`]
/// entries and writes the rest into `out` in ascending bucket order. Returns the number of
/// entries written. `offsets` must hold `num_buckets + 1` elements.
///
/// The result lets each worker take a contiguous slice of `out` and own a contiguous range of
/// buckets.
pub fn organize_round(
    wnafs: &[WnafEntry],
    round: usize,
    num_rounds: usize,
    offsets: &mut [usize],
    out: &mut [WnafEntry],
) -> usize {
    let round_entries = || wnafs.iter().skip(round).step_by(num_rounds).filter(|e| !e.is_skip());

    offsets.fill(0);
    for entry in round_entries() {
        offsets[entry.bucket() + 1] += 1;
    }
    for bucket in 1..offsets.len() {
        offsets[bucket] += offsets[bucket - 1];
    }
    let count = offsets[offsets.len() - 1];
    debug_assert!(count <= out.len());

    for entry in round_entries() {
        let slot = &mut offsets[entry.bucket()];
        out[*slot] = *entry;
        *slot += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wnaf::num_buckets;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_organize_round_sorts_and_drops_skips() {
        let bucket_width = 4;
        let num_rounds = 3;
        let num_points = 200;
        let mut rng = StdRng::seed_from_u64(3);
        let wnafs: Vec<WnafEntry> = (0..num_points * num_rounds)
            .map(|i| {
                if rng.gen_bool(0.1) {
                    WnafEntry::SKIP
                } else {
                    let bucket = rng.gen_range(0..num_buckets(bucket_width)) as u32;
                    WnafEntry::new(bucket, rng.gen(), (i / num_rounds) as u32)
                }
            })
            .collect();

        let mut offsets = vec![0; num_buckets(bucket_width) + 1];
        for round in 0..num_rounds {
            let mut out = vec![WnafEntry::SKIP; num_points];
            let count = organize_round(&wnafs, round, num_rounds, &mut offsets, &mut out);

            let mut expected: Vec<WnafEntry> = (0..num_points)
                .map(|p| wnafs[p * num_rounds + round])
                .filter(|e| !e.is_skip())
                .collect();
            // stable sort keeps point order within a bucket
            expected.sort_by_key(|e| e.bucket());
            assert_eq!(count, expected.len());
            assert_eq!(&out[..count], &expected[..]);
            assert!(out[count..].iter().all(|e| e.is_skip()));
        }
    }

    #[test]
    fn test_organize_empty_round() {
        let wnafs = vec![WnafEntry::SKIP; 8];
        let mut offsets = vec![0; 5];
        let mut out = vec![WnafEntry::SKIP; 4];
        assert_eq!(organize_round(&wnafs, 1, 2, &mut offsets, &mut out), 0);
    }
}

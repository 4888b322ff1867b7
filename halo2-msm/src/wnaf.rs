//! Fixed-window signed digit (WNAF) encoding of half-width scalars.
//!
//! A scalar below `2^SCALAR_BITS` is written with `num_rounds(c)` odd digits in
//! `[-(2^(c+1) - 1), 2^(c+1) - 1]`, one per window of `c + 1` bits. Odd digits need only `2^c`
//! buckets per round: digit `d` lands in bucket `(|d| - 1) / 2` with the sign kept separately.
//! Even scalars are made odd first, and the resulting "skew" is subtracted once at the end.
use std::fmt;

/// Maximum bit length of a split scalar half.
pub const SCALAR_BITS: usize = 127;

// (minimum number of points, bucket width), in decreasing order
const BUCKET_WIDTHS: [(usize, usize); 14] = [
    (14617149, 21),
    (1139094, 18),
    (155975, 15),
    (144834, 14),
    (25067, 12),
    (13926, 11),
    (7659, 10),
    (2436, 9),
    (376, 7),
    (231, 6),
    (97, 5),
    (35, 4),
    (10, 3),
    (2, 2),
];

/// Empirically tuned bucket width `c` for an MSM over `num_points` scalars.
pub fn optimal_bucket_width(num_points: usize) -> usize {
    BUCKET_WIDTHS.iter().find(|(min_points, _)| num_points >= *min_points).map_or(1, |(_, c)| *c)
}

/// `ceil(SCALAR_BITS / (bucket_width + 1))`
pub const fn num_rounds(bucket_width: usize) -> usize {
    (SCALAR_BITS + bucket_width) / (bucket_width + 1)
}

pub const fn num_buckets(bucket_width: usize) -> usize {
    1 << bucket_width
}

/// One digit of one point's encoding: bucket in bits `0..31`, sign in bit 31, point index in
/// bits `32..64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct WnafEntry(u64);

impl WnafEntry {
    /// Marks a point that contributes nothing (zero scalar or point at infinity).
    pub const SKIP: Self = Self(u64::MAX);

    const SIGN_BIT: u64 = 1 << 31;
    const BUCKET_MASK: u64 = Self::SIGN_BIT - 1;

    #[inline(always)]
    pub fn new(bucket: u32, negative: bool, point_index: u32) -> Self {
        debug_assert!((bucket as u64) <= Self::BUCKET_MASK);
        let sign = if negative { Self::SIGN_BIT } else { 0 };
        Self(bucket as u64 | sign | (point_index as u64) << 32)
    }

    #[inline(always)]
    pub fn bucket(self) -> usize {
        (self.0 & Self::BUCKET_MASK) as usize
    }

    #[inline(always)]
    pub fn is_negative(self) -> bool {
        self.0 & Self::SIGN_BIT != 0
    }

    #[inline(always)]
    pub fn point_index(self) -> usize {
        (self.0 >> 32) as usize
    }

    #[inline(always)]
    pub fn is_skip(self) -> bool {
        self == Self::SKIP
    }

    /// The signed odd digit this entry encodes.
    pub fn digit(self) -> i64 {
        let magnitude = 2 * self.bucket() as i64 + 1;
        if self.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl Default for WnafEntry {
    fn default() -> Self {
        Self::SKIP
    }
}

impl fmt::Debug for WnafEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_skip() {
            return f.write_str("WnafEntry::SKIP");
        }
        f.debug_struct("WnafEntry")
            .field("bucket", &self.bucket())
            .field("negative", &self.is_negative())
            .field("point_index", &self.point_index())
            .finish()
    }
}

/// Correction owed by one point after the last round: if `skew`, the encoded value was one more
/// than the scalar, so the point is subtracted (added back when `negative`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkewFlag {
    pub skew: bool,
    pub negative: bool,
}

/// Writes the `num_rounds(bucket_width)` digits of `scalar` into `out`, most significant first,
/// and returns the skew.
///
/// When `negate` is set every digit sign is flipped, encoding `-scalar`.
///
/// Assumes `scalar < 2^SCALAR_BITS - 1`.
pub fn fixed_wnaf(
    scalar: u128,
    negate: bool,
    point_index: u32,
    bucket_width: usize,
    out: &mut [WnafEntry],
) -> bool {
    let window = bucket_width + 1;
    let rounds = num_rounds(bucket_width);
    debug_assert_eq!(out.len(), rounds);
    debug_assert!(scalar >> SCALAR_BITS == 0);

    let skew = scalar & 1 == 0;
    let scalar = scalar + skew as u128;
    let mask = (1u128 << window) - 1;
    let slice = |i: usize| ((scalar >> (i * window)) & mask) as i64;

    let encode = |digit: i64| {
        debug_assert!(digit & 1 == 1);
        let bucket = ((digit.abs() - 1) >> 1) as u32;
        WnafEntry::new(bucket, (digit < 0) ^ negate, point_index)
    };

    // an even window borrows 2^window from the window below it, so every digit stays odd
    let mut prev = slice(0);
    for i in 1..rounds {
        let cur = slice(i);
        let even = cur & 1 == 0;
        out[rounds - i] = encode(prev - if even { 1 << window } else { 0 });
        prev = cur + even as i64;
    }
    out[0] = encode(prev);
    skew
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    fn decode(entries: &[WnafEntry], bucket_width: usize) -> BigInt {
        entries.iter().fold(BigInt::from(0), |acc, entry| {
            assert!(entry.bucket() < num_buckets(bucket_width));
            (acc << (bucket_width + 1)) + entry.digit()
        })
    }

    fn check(scalar: u128, bucket_width: usize) {
        let mut out = vec![WnafEntry::SKIP; num_rounds(bucket_width)];
        for negate in [false, true] {
            let skew = fixed_wnaf(scalar, negate, 5, bucket_width, &mut out);
            assert_eq!(skew, scalar % 2 == 0);
            assert!(out.iter().all(|e| e.point_index() == 5 && !e.is_skip()));
            let expected = BigInt::from(scalar) + skew as u32;
            let decoded = decode(&out, bucket_width);
            if negate {
                assert_eq!(decoded, -expected, "scalar {scalar} width {bucket_width}");
            } else {
                assert_eq!(decoded, expected, "scalar {scalar} width {bucket_width}");
            }
        }
    }

    #[test_case(1 ; "width 1")]
    #[test_case(2 ; "width 2")]
    #[test_case(5 ; "width 5")]
    #[test_case(9 ; "width 9")]
    #[test_case(15 ; "width 15")]
    #[test_case(18 ; "width 18")]
    #[test_case(21 ; "width 21")]
    fn test_fixed_wnaf_edge_scalars(bucket_width: usize) {
        let max = (1u128 << SCALAR_BITS) - 2;
        for scalar in [0, 1, 2, 3, 1 << 64, max, max - 1] {
            check(scalar, bucket_width);
        }
    }

    #[test]
    fn test_fixed_wnaf_random_scalars() {
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..10_000 {
            let scalar = rng.gen::<u128>() >> (128 - SCALAR_BITS);
            let scalar = scalar.min((1 << SCALAR_BITS) - 2);
            check(scalar, 1 + i % 21);
        }
    }

    #[test]
    fn test_entry_packing() {
        let entry = WnafEntry::new((1 << 21) - 1, true, u32::MAX - 1);
        assert_eq!(entry.bucket(), (1 << 21) - 1);
        assert!(entry.is_negative());
        assert_eq!(entry.point_index(), (u32::MAX - 1) as usize);
        assert!(!entry.is_skip());
        assert_eq!(WnafEntry::new(3, false, 0).digit(), 7);
        assert_eq!(WnafEntry::new(0, true, 0).digit(), -1);
        assert!(WnafEntry::default().is_skip());
    }

    #[test]
    fn test_bucket_width_table() {
        assert_eq!(optimal_bucket_width(0), 1);
        assert_eq!(optimal_bucket_width(1), 1);
        assert_eq!(optimal_bucket_width(2), 2);
        assert_eq!(optimal_bucket_width(9), 2);
        assert_eq!(optimal_bucket_width(10), 3);
        assert_eq!(optimal_bucket_width(1024), 7);
        assert_eq!(optimal_bucket_width(1 << 20), 15);
        assert_eq!(optimal_bucket_width(1 << 24), 21);
        assert_eq!(num_rounds(1), 64);
        assert_eq!(num_rounds(7), 16);
        assert_eq!(num_rounds(15), 8);
        assert_eq!(num_rounds(21), 6);
        assert_eq!(num_buckets(7), 128);
    }
}

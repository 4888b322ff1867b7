use crate::endo::GlvCurve;
use rayon::prelude::*;
use std::ops::Index;

/// Base points interleaved with their negated endomorphism images:
/// `[P_0, -[lambda] P_0, P_1, -[lambda] P_1, ...]`.
///
/// `-[lambda] P = (beta * x, -y)`, so building the table costs one field multiplication per point.
/// Callers committing against the same reference string should build it once and reuse it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointTable<C> {
    points: Vec<C>,
}

impl<C: GlvCurve> PointTable<C> {
    pub fn new(points: &[C]) -> Self {
        let mut table = vec![C::identity(); 2 * points.len()];
        table.par_chunks_mut(2).zip(points.par_iter()).for_each(|(pair, point)| {
            pair[0] = *point;
            pair[1] = -point.endomorphism();
        });
        Self { points: table }
    }
}

impl<C> PointTable<C> {
    /// Number of base points.
    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The interleaved table, of length `2 * self.len()`.
    pub fn as_slice(&self) -> &[C] {
        &self.points
    }

    pub fn bases(&self) -> impl Iterator<Item = &C> {
        self.points.iter().step_by(2)
    }
}

impl<C> Index<usize> for PointTable<C> {
    type Output = C;

    /// Returns the `index`-th base point.
    fn index(&self, index: usize) -> &C {
        &self.points[2 * index]
    }
}

/// Precomputes the endomorphism table for `points`, in parallel.
pub fn generate_point_table<C: GlvCurve>(points: &[C]) -> PointTable<C> {
    PointTable::new(points)
}

use super::pippenger::PippengerShape;
use crate::halo2curves::CurveAffine;
use crate::wnaf::{SkewFlag, WnafEntry};
use std::ops::{Deref, DerefMut};

/// Scratch memory owned by one worker for the duration of a Pippenger call.
#[derive(Debug)]
pub struct ThreadScratch<C: CurveAffine> {
    pub(crate) buckets: Vec<C::Curve>,
    // incomplete-addition path: signed points of the shard in schedule order and their buckets
    pub(crate) points: Vec<C>,
    pub(crate) point_buckets: Vec<usize>,
    pub(crate) inverses: Vec<C::Base>,
}

impl<C: CurveAffine> Default for ThreadScratch<C> {
    fn default() -> Self {
        Self { buckets: vec![], points: vec![], point_buckets: vec![], inverses: vec![] }
    }
}

impl<C: CurveAffine> ThreadScratch<C> {
    fn clear(&mut self) {
        self.buckets.clear();
        self.points.clear();
        self.point_buckets.clear();
        self.inverses.clear();
    }

    fn is_empty(&self) -> bool {
        self.buckets.is_empty()
            && self.points.is_empty()
            && self.point_buckets.is_empty()
            && self.inverses.is_empty()
    }
}

/// Reusable arena for MSM calls.
///
/// Buffers are sized per Pippenger call and cleared (not freed) when the [`ScratchGuard`]
/// handed out by [`RuntimeState::acquire`] is dropped, so repeated calls of similar size do not
/// allocate.
#[derive(Debug)]
pub struct RuntimeState<C: CurveAffine> {
    /// Point-major digits: `wnafs[p * num_rounds + round]`
    pub(crate) wnafs: Vec<WnafEntry>,
    pub(crate) skews: Vec<SkewFlag>,
    /// Round-major digits sorted by bucket; round `i` occupies
    /// `schedule[i * n .. i * n + round_counts[i]]` where `n` is the number of table points
    pub(crate) schedule: Vec<WnafEntry>,
    pub(crate) round_counts: Vec<usize>,
    pub(crate) bucket_offsets: Vec<usize>,
    pub(crate) threads: Vec<ThreadScratch<C>>,
}

impl<C: CurveAffine> Default for RuntimeState<C> {
    fn default() -> Self {
        Self {
            wnafs: vec![],
            skews: vec![],
            schedule: vec![],
            round_counts: vec![],
            bucket_offsets: vec![],
            threads: vec![],
        }
    }
}

impl<C: CurveAffine> RuntimeState<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to the arena until the returned guard is dropped.
    pub fn acquire(&mut self) -> ScratchGuard<'_, C> {
        debug_assert!(self.is_reset());
        ScratchGuard { state: self }
    }

    /// Grows every buffer to fit a Pippenger call of the given shape on `num_threads` workers.
    pub fn reserve(&mut self, shape: &PippengerShape, num_threads: usize) {
        let num_points = shape.num_table_points();
        let num_entries = num_points * shape.num_rounds;
        self.wnafs.reserve(num_entries);
        self.skews.reserve(num_points);
        self.schedule.reserve(num_entries);
        self.round_counts.reserve(shape.num_rounds);
        self.bucket_offsets.reserve(shape.num_rounds * (shape.num_buckets + 1));
        if self.threads.len() < num_threads {
            self.threads.resize_with(num_threads, ThreadScratch::default);
        }
        let shard = num_points.div_ceil(num_threads.max(1));
        for scratch in self.threads.iter_mut() {
            scratch.buckets.reserve(shape.num_buckets.min(shard));
            scratch.points.reserve(shard);
            scratch.point_buckets.reserve(shard);
            scratch.inverses.reserve(shard / 2);
        }
    }

    /// Sizes the shared buffers for one Pippenger call.
    pub(crate) fn prepare(&mut self, shape: &PippengerShape, num_threads: usize) {
        let num_points = shape.num_table_points();
        let num_entries = num_points * shape.num_rounds;
        self.wnafs.clear();
        self.wnafs.resize(num_entries, WnafEntry::SKIP);
        self.skews.clear();
        self.skews.resize(num_points, SkewFlag::default());
        self.schedule.clear();
        self.schedule.resize(num_entries, WnafEntry::SKIP);
        self.round_counts.clear();
        self.round_counts.resize(shape.num_rounds, 0);
        self.bucket_offsets.clear();
        self.bucket_offsets.resize(shape.num_rounds * (shape.num_buckets + 1), 0);
        if self.threads.len() < num_threads {
            self.threads.resize_with(num_threads, ThreadScratch::default);
        }
    }

    fn reset(&mut self) {
        self.wnafs.clear();
        self.skews.clear();
        self.schedule.clear();
        self.round_counts.clear();
        self.bucket_offsets.clear();
        self.threads.iter_mut().for_each(ThreadScratch::clear);
    }

    /// Whether every buffer is empty, as it is between calls.
    pub fn is_reset(&self) -> bool {
        self.wnafs.is_empty()
            && self.skews.is_empty()
            && self.schedule.is_empty()
            && self.round_counts.is_empty()
            && self.bucket_offsets.is_empty()
            && self.threads.iter().all(ThreadScratch::is_empty)
    }

    /// Capacity of the digit table, in entries.
    pub fn capacity(&self) -> usize {
        self.wnafs.capacity()
    }
}

/// Scoped handle to a [`RuntimeState`]; resets the arena when dropped.
pub struct ScratchGuard<'a, C: CurveAffine> {
    state: &'a mut RuntimeState<C>,
}

impl<C: CurveAffine> Deref for ScratchGuard<'_, C> {
    type Target = RuntimeState<C>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl<C: CurveAffine> DerefMut for ScratchGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl<C: CurveAffine> Drop for ScratchGuard<'_, C> {
    fn drop(&mut self) {
        self.state.reset();
    }
}

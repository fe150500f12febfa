//! Execution backends for the data-parallel droplet primitives.
//!
//! Every per-droplet update is independent within a phase, so the same
//! algorithm runs either on plain iterators or across the rayon thread pool.
//! Sorting and segmented reduction are the only primitives coupling droplets.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum slice length worth splitting across threads.
const PAR_MIN_LEN: usize = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Single-threaded iteration (deterministic reference)
    Serial,
    /// Rayon work-stealing pool
    #[default]
    Parallel,
}

impl Backend {
    /// `out[i] = f(i)` for every element.
    pub fn fill_indexed<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Self::Serial => out.iter_mut().enumerate().for_each(|(i, o)| *o = f(i)),
            Self::Parallel => out
                .par_iter_mut()
                .with_min_len(PAR_MIN_LEN)
                .enumerate()
                .for_each(|(i, o)| *o = f(i)),
        }
    }

    /// Apply `f(i, &mut out[i])` to every element.
    pub fn for_each_indexed<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        match self {
            Self::Serial => out.iter_mut().enumerate().for_each(|(i, o)| f(i, o)),
            Self::Parallel => out
                .par_iter_mut()
                .with_min_len(PAR_MIN_LEN)
                .enumerate()
                .for_each(|(i, o)| f(i, o)),
        }
    }

    /// `y[i] += a * x[i]`.
    pub fn axpy(&self, y: &mut [f64], a: f64, x: &[f64]) {
        debug_assert_eq!(y.len(), x.len());
        self.for_each_indexed(y, |i, yi| *yi += a * x[i]);
    }

    /// `out[i] = y[i] + a * x[i]`.
    pub fn axpy_into(&self, out: &mut [f64], y: &[f64], a: f64, x: &[f64]) {
        debug_assert_eq!(out.len(), y.len());
        debug_assert_eq!(out.len(), x.len());
        self.fill_indexed(out, |i| y[i] + a * x[i]);
    }

    /// Stable sort of `ids` by `keys[id]`; equal keys keep ascending id order
    /// when `ids` starts as the identity permutation.
    pub fn sort_ids_by_key(&self, ids: &mut [usize], keys: &[usize]) {
        match self {
            Self::Serial => ids.sort_by_key(|&id| keys[id]),
            Self::Parallel => ids.par_sort_by_key(|&id| keys[id]),
        }
    }

    /// Segmented sum over a sorted key stream.
    ///
    /// `segment_starts` holds the first position of every run of equal keys;
    /// `sums[s]` receives the sum of `value(k)` over run `s`.
    pub fn reduce_segments<F>(&self, segment_starts: &[usize], total_len: usize, sums: &mut [f64], value: F)
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        debug_assert!(sums.len() >= segment_starts.len());
        let n_segments = segment_starts.len();
        let segment_sum = |s: usize| {
            let start = segment_starts[s];
            let end = segment_starts.get(s + 1).copied().unwrap_or(total_len);
            (start..end).map(&value).sum::<f64>()
        };
        match self {
            Self::Serial => sums[..n_segments]
                .iter_mut()
                .enumerate()
                .for_each(|(s, out)| *out = segment_sum(s)),
            Self::Parallel => sums[..n_segments]
                .par_iter_mut()
                .enumerate()
                .for_each(|(s, out)| *out = segment_sum(s)),
        }
    }

    /// Count elements satisfying `pred`.
    pub fn count_where<F>(&self, len: usize, pred: F) -> usize
    where
        F: Fn(usize) -> bool + Sync + Send,
    {
        match self {
            Self::Serial => (0..len).filter(|&i| pred(i)).count(),
            Self::Parallel => (0..len).into_par_iter().filter(|&i| pred(i)).count(),
        }
    }

    /// First index failing `ok`, if any.
    pub fn find_first_violation<F>(&self, len: usize, ok: F) -> Option<usize>
    where
        F: Fn(usize) -> bool + Sync + Send,
    {
        match self {
            Self::Serial => (0..len).find(|&i| !ok(i)),
            Self::Parallel => (0..len).into_par_iter().find_first(|&i| !ok(i)),
        }
    }
}

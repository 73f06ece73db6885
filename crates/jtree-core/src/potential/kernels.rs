//! Numeric kernels over flat mixed-radix potentials.
//!
//! All kernels take their operands as `(domain, values)` pairs and return a
//! fresh array; none of them mutate their inputs. The product kernel has a
//! parallel path behind the `rayon` feature that is threshold-gated on the
//! output size.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::model::network::VarId;
use crate::potential::domain::{Domain, StrideWalk};

/// Chunk length for the parallel product kernel.
#[cfg(feature = "rayon")]
const PARALLEL_CHUNK: usize = 1024;

/// Pointwise product of `factors`, laid out over `out`.
///
/// Every factor domain must be a subset of `out`.
pub(crate) fn product(out: &Domain, factors: &[(&Domain, &[f64])], parallel_min_size: usize) -> Vec<f64> {
    let size = out.size();
    let mut values = vec![1.0; size];

    #[cfg(feature = "rayon")]
    {
        if size >= parallel_min_size {
            let projections: Vec<_> = factors
                .iter()
                .map(|(domain, data)| (out.projection_strides(domain), *data))
                .collect();
            values
                .par_chunks_mut(PARALLEL_CHUNK)
                .enumerate()
                .for_each(|(chunk, slots)| {
                    let start = chunk * PARALLEL_CHUNK;
                    for (strides, data) in &projections {
                        let walk =
                            StrideWalk::starting_at(out.cards(), strides.clone(), start, slots.len());
                        for (slot, index) in slots.iter_mut().zip(walk) {
                            *slot *= data[index];
                        }
                    }
                });
            return values;
        }
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel_min_size;

    for (domain, data) in factors {
        let walk = StrideWalk::new(out.cards(), out.projection_strides(domain));
        for (slot, index) in values.iter_mut().zip(walk) {
            *slot *= data[index];
        }
    }
    values
}

/// Sums `values` (over `source`) down to `keep`, which must be a subset of `source`.
pub(crate) fn marginalize(source: &Domain, values: &[f64], keep: &Domain) -> Vec<f64> {
    let mut out = vec![0.0; keep.size()];
    let walk = StrideWalk::new(source.cards(), source.projection_strides(keep));
    for (value, index) in values.iter().zip(walk) {
        out[index] += value;
    }
    out
}

/// Divides `numerator` (over `out`) pointwise by `denominator` (over a subset
/// of `out`). Division by zero yields zero.
pub(crate) fn divide(out: &Domain, numerator: &[f64], denominator: (&Domain, &[f64])) -> Vec<f64> {
    let (den_domain, den) = denominator;
    let walk = StrideWalk::new(out.cards(), out.projection_strides(den_domain));
    numerator
        .iter()
        .zip(walk)
        .map(|(value, index)| {
            let d = den[index];
            if d == 0.0 {
                0.0
            } else {
                value / d
            }
        })
        .collect()
}

/// Re-lays `values` from the variable order `from` into the order `to`.
///
/// Both slices list the same `(variable, cardinality)` pairs; the first entry
/// of each is the least-significant digit of its layout.
pub(crate) fn permute(from: &[(VarId, usize)], values: &[f64], to: &[(VarId, usize)]) -> Vec<f64> {
    let mut to_strides = Vec::with_capacity(to.len());
    let mut stride = 1;
    for (_, card) in to {
        to_strides.push(stride);
        stride *= card;
    }
    let cards: Vec<usize> = from.iter().map(|(_, c)| *c).collect();
    let strides = from
        .iter()
        .map(|(var, _)| {
            to.iter()
                .position(|(v, _)| v == var)
                .map_or(0, |p| to_strides[p])
        })
        .collect();

    let mut out = vec![0.0; values.len()];
    for (value, index) in values.iter().zip(StrideWalk::new(&cards, strides)) {
        out[index] = *value;
    }
    out
}

/// Scales `values` to sum to 1 and returns the previous total. All-zero input
/// is left untouched.
pub(crate) fn normalize(values: &mut [f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
    total
}

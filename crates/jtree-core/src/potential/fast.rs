//! Evaluated potentials.

use std::sync::Arc;

use crate::engine::errors::InferenceError;
use crate::model::network::VarId;
use crate::potential::domain::Domain;
use crate::potential::kernels;

/// A flat, non-negative potential over a sorted [`Domain`].
///
/// Values are shared: cloning a `FastPotential` taken from the formula cache
/// does not copy the array.
#[derive(Debug, Clone, PartialEq)]
pub struct FastPotential {
    domain: Domain,
    values: Arc<[f64]>,
}

impl FastPotential {
    /// Wraps an array laid out over `domain`.
    pub fn new(domain: Domain, values: impl Into<Arc<[f64]>>) -> Result<Self, InferenceError> {
        let values = values.into();
        if values.len() != domain.size() {
            return Err(InferenceError::Internal(format!(
                "potential over {:?} has {} entries, expected {}",
                domain.vars(),
                values.len(),
                domain.size()
            )));
        }
        Ok(Self { domain, values })
    }

    pub(crate) fn from_parts(domain: Domain, values: Arc<[f64]>) -> Self {
        debug_assert_eq!(values.len(), domain.size());
        Self { domain, values }
    }

    /// A constant potential over the empty domain.
    pub fn scalar(value: f64) -> Self {
        Self {
            domain: Domain::empty(),
            values: Arc::from(vec![value]),
        }
    }

    /// Domain of the potential.
    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Flat values in mixed-radix order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Shared handle on the values.
    #[inline]
    pub fn shared_values(&self) -> &Arc<[f64]> {
        &self.values
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Pointwise product; the result spans the union of both domains.
    pub fn multiply(&self, other: &FastPotential) -> FastPotential {
        let domain = self.domain.union(&other.domain);
        let values = kernels::product(
            &domain,
            &[
                (&self.domain, self.values()),
                (&other.domain, other.values()),
            ],
            usize::MAX,
        );
        Self::from_parts(domain, values.into())
    }

    /// Pointwise quotient by a potential over a subset of this domain.
    /// `x / 0` is taken as 0.
    pub fn divide(&self, denominator: &FastPotential) -> Result<FastPotential, InferenceError> {
        if !denominator.domain.is_subset_of(&self.domain) {
            return Err(InferenceError::Internal(format!(
                "cannot divide potential over {:?} by one over {:?}",
                self.domain.vars(),
                denominator.domain.vars()
            )));
        }
        let values = kernels::divide(
            &self.domain,
            self.values(),
            (&denominator.domain, denominator.values()),
        );
        Ok(Self::from_parts(self.domain.clone(), values.into()))
    }

    /// Sums out every variable not in `keep`. Variables of `keep` outside this
    /// domain are ignored.
    pub fn marginalize(&self, keep: &Domain) -> FastPotential {
        let keep = self.domain.intersection(keep);
        if keep == self.domain {
            return self.clone();
        }
        let values = kernels::marginalize(&self.domain, self.values(), &keep);
        Self::from_parts(keep, values.into())
    }

    /// Returns a copy scaled to sum to 1, and the original total.
    pub fn normalized(&self) -> (FastPotential, f64) {
        let mut values = self.values.to_vec();
        let total = kernels::normalize(&mut values);
        (Self::from_parts(self.domain.clone(), values.into()), total)
    }

    /// Values re-laid out in an arbitrary variable order (first entry least
    /// significant). `order` must be a permutation of the domain.
    pub fn values_in_order(&self, order: &[VarId]) -> Result<Vec<f64>, InferenceError> {
        if order.len() != self.domain.len() || order.iter().any(|v| !self.domain.contains(*v)) {
            return Err(InferenceError::Internal(format!(
                "order {:?} is not a permutation of {:?}",
                order,
                self.domain.vars()
            )));
        }
        let from: Vec<(VarId, usize)> = self.domain.entries().collect();
        let to: Vec<(VarId, usize)> = order
            .iter()
            .map(|v| (*v, self.domain.cardinality(*v).unwrap_or(1)))
            .collect();
        Ok(kernels::permute(&from, self.values(), &to))
    }
}

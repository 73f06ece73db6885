//! Engine configuration.

use crate::engine::errors::InferenceError;

/// Default deviation from 1 a CPT row may have before it is renormalized.
/// Shared by [`EngineConfig`] and [`NetworkBuilder`].
///
/// [`NetworkBuilder`]: crate::model::network::NetworkBuilder
pub const DEFAULT_CPT_TOLERANCE: f64 = 1e-9;

/// Configuration for compiling and querying an [`InferenceEngine`].
///
/// [`InferenceEngine`]: crate::engine::inference::InferenceEngine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// CPT rows whose sum deviates from 1 by more than this are renormalized.
    ///
    /// Applies to tables replaced through `set_distribution`. The tables of
    /// the compiled network were already checked when it was built, against
    /// [`NetworkBuilder::cpt_tolerance`] (same default).
    ///
    /// [`NetworkBuilder::cpt_tolerance`]: crate::model::network::NetworkBuilder::cpt_tolerance
    pub cpt_tolerance: f64,
    /// Tolerance used when checking that a distribution is normalized.
    pub normalization_tolerance: f64,
    /// Minimum product size before the product kernel fans out across threads.
    /// Only consulted with the `rayon` feature.
    pub parallel_min_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cpt_tolerance: DEFAULT_CPT_TOLERANCE,
            normalization_tolerance: 1e-5,
            parallel_min_size: 4096,
        }
    }
}

impl EngineConfig {
    pub(crate) fn validate(self) -> Result<Self, InferenceError> {
        if !(self.cpt_tolerance.is_finite() && self.cpt_tolerance >= 0.0) {
            return Err(InferenceError::Construction(
                "engine config: cpt_tolerance must be finite and >= 0".into(),
            ));
        }
        if !(self.normalization_tolerance.is_finite() && self.normalization_tolerance > 0.0) {
            return Err(InferenceError::Construction(
                "engine config: normalization_tolerance must be finite and > 0".into(),
            ));
        }
        if self.parallel_min_size == 0 {
            return Err(InferenceError::Construction(
                "engine config: parallel_min_size must be > 0".into(),
            ));
        }
        Ok(self)
    }
}

//! Evidence assertions.
//!
//! Callers describe evidence by name ([`Evidence`] / [`Observation`]); the
//! engine resolves it against the network into per-variable weight vectors
//! ([`EvidenceState`]) that back the `EvidenceFunction` formulas.

use std::collections::BTreeMap;

use crate::engine::errors::InferenceError;
use crate::model::network::{Network, VarId};

/// What is asserted about one variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Observation {
    /// Hard evidence: the variable is in exactly this state.
    State(String),
    /// The variable is in one of these states, each equally weighted.
    States(Vec<String>),
    /// Soft evidence: likelihood weight per state. Unlisted states weigh 0.
    Weighted(Vec<(String, f64)>),
}

impl Observation {
    /// Per-state weights over `levels` of the variable `name`.
    fn weights(&self, name: &str, levels: &[String]) -> Result<Vec<f64>, InferenceError> {
        let mut weights = vec![0.0; levels.len()];
        let slot = |level: &str| {
            levels
                .iter()
                .position(|l| l == level)
                .ok_or_else(|| InferenceError::UnknownLevel {
                    variable: name.to_string(),
                    level: level.to_string(),
                })
        };
        match self {
            Observation::State(level) => weights[slot(level)?] = 1.0,
            Observation::States(states) => {
                for level in states {
                    weights[slot(level)?] = 1.0;
                }
            }
            Observation::Weighted(pairs) => {
                for (level, weight) in pairs {
                    if !weight.is_finite() || *weight < 0.0 {
                        return Err(InferenceError::Numerical(format!(
                            "evidence weight {} for '{}'='{}' must be finite and >= 0",
                            weight, name, level
                        )));
                    }
                    weights[slot(level)?] += weight;
                }
            }
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(InferenceError::Numerical(format!(
                "evidence on '{}' excludes every state",
                name
            )));
        }
        Ok(weights)
    }
}

/// A set of named assertions, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evidence {
    assertions: BTreeMap<String, Observation>,
}

impl Evidence {
    /// Empty evidence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asserts `variable = state`.
    pub fn hard(mut self, variable: impl Into<String>, state: impl Into<String>) -> Self {
        self.assertions
            .insert(variable.into(), Observation::State(state.into()));
        self
    }

    /// Asserts `variable` is one of `states`.
    pub fn any_of<S: Into<String>>(
        mut self,
        variable: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        self.assertions.insert(
            variable.into(),
            Observation::States(states.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Asserts weighted (soft) evidence on `variable`.
    pub fn soft<S: Into<String>>(
        mut self,
        variable: impl Into<String>,
        weights: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        self.assertions.insert(
            variable.into(),
            Observation::Weighted(weights.into_iter().map(|(s, w)| (s.into(), w)).collect()),
        );
        self
    }

    /// Inserts an observation, replacing any previous one for `variable`.
    pub fn insert(&mut self, variable: impl Into<String>, observation: Observation) {
        self.assertions.insert(variable.into(), observation);
    }

    /// The observation on `variable`, if any.
    pub fn get(&self, variable: &str) -> Option<&Observation> {
        self.assertions.get(variable)
    }

    /// Number of asserted variables.
    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    /// Whether nothing is asserted.
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Assertions in variable-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Observation)> {
        self.assertions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Evidence resolved against a network: one optional weight vector per variable.
#[derive(Debug, Clone, Default)]
pub struct EvidenceState {
    observations: Vec<Option<Observation>>,
    weights: Vec<Option<Vec<f64>>>,
}

impl EvidenceState {
    /// No evidence on any of `len` variables.
    pub fn new(len: usize) -> Self {
        Self {
            observations: vec![None; len],
            weights: vec![None; len],
        }
    }

    /// Weights asserted on `variable`, `None` when unobserved.
    #[inline]
    pub fn weights(&self, variable: VarId) -> Option<&[f64]> {
        self.weights[variable.index()].as_deref()
    }

    /// Whether `variable` carries evidence.
    #[inline]
    pub fn is_observed(&self, variable: VarId) -> bool {
        self.weights[variable.index()].is_some()
    }

    /// Resolves every assertion of `evidence` without applying any of them.
    pub fn resolve(
        network: &Network,
        evidence: &Evidence,
    ) -> Result<Vec<(VarId, Observation, Vec<f64>)>, InferenceError> {
        evidence
            .iter()
            .map(|(name, observation)| {
                let id = network.lookup(name)?;
                let weights = observation.weights(name, &network.variable(id).levels)?;
                Ok((id, observation.clone(), weights))
            })
            .collect()
    }

    /// Applies resolved assertions, replacing prior evidence on the same variables.
    pub fn apply(&mut self, resolved: Vec<(VarId, Observation, Vec<f64>)>) {
        for (id, observation, weights) in resolved {
            self.observations[id.index()] = Some(observation);
            self.weights[id.index()] = Some(weights);
        }
    }

    /// Clears evidence on one variable. Returns whether there was any.
    pub fn clear(&mut self, variable: VarId) -> bool {
        self.observations[variable.index()] = None;
        self.weights[variable.index()].take().is_some()
    }

    /// Clears all evidence.
    pub fn clear_all(&mut self) {
        self.observations.iter_mut().for_each(|o| *o = None);
        self.weights.iter_mut().for_each(|w| *w = None);
    }

    /// The named view of the current assertions.
    pub fn to_evidence(&self, network: &Network) -> Evidence {
        let mut evidence = Evidence::new();
        for (position, observation) in self.observations.iter().enumerate() {
            if let Some(observation) = observation {
                let name = &network.variable(VarId(position as u32)).name;
                evidence.insert(name.clone(), observation.clone());
            }
        }
        evidence
    }
}

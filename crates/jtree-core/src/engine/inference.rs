//! # Inference engine
//!
//! [`InferenceEngine`] is the public facade: it compiles a [`Network`] into a
//! junction forest, plans Hugin propagation as formulas, and answers queries
//! against the memoized posteriors.
//!
//! ## Lifecycle
//!
//! The network structure, forest and formula graph are fixed at construction.
//! Evidence changes and CPT replacements only rewrite leaf inputs and drop the
//! whole value cache; the next query recomputes exactly what it needs.
//!
//! Queries take `&mut self` because evaluation fills the cache. Callers sharing
//! an engine across threads must synchronize externally.
//!
//! ## Example
//!
//! ```rust
//! use jtree_core::{event, Evidence, InferenceEngine, NetworkBuilder, NodeDefinition, CptRow};
//!
//! let network = NetworkBuilder::new()
//!     .node("RAIN", NodeDefinition::marginal(["T", "F"], [("T", 0.2), ("F", 0.8)]))
//!     .node(
//!         "WET",
//!         NodeDefinition::conditional(
//!             ["T", "F"],
//!             ["RAIN"],
//!             vec![
//!                 CptRow::new([("RAIN", "T")], [("T", 0.9), ("F", 0.1)]),
//!                 CptRow::new([("RAIN", "F")], [("T", 0.1), ("F", 0.9)]),
//!             ],
//!         ),
//!     )
//!     .build()
//!     .expect("valid network");
//!
//! let mut engine = InferenceEngine::new(network).expect("engine");
//! engine.set_evidence(&Evidence::new().hard("WET", "T")).expect("evidence");
//! let p = engine.infer(&event([("RAIN", "T")])).expect("query");
//! assert!((p - 0.18 / 0.26).abs() < 1e-9);
//! ```

use crate::engine::config::EngineConfig;
use crate::engine::errors::InferenceError;
use crate::engine::evidence::{Evidence, EvidenceState};
use crate::engine::join::join;
use crate::engine::propagation::{plan, PropagationPlan};
use crate::model::distribution::{Distribution, DistributionVariable, Event};
use crate::model::network::{Network, VarId};
use crate::potential::evaluate::EvalContext;
use crate::potential::fast::FastPotential;
use crate::potential::formula::FormulaStore;
use crate::structure::junction::{compile, CliqueId, JunctionForest};

/// Summary of a compiled engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompilationStats {
    /// Number of variables.
    pub variables: usize,
    /// Number of cliques in the junction forest.
    pub cliques: usize,
    /// Number of distinct separators.
    pub separators: usize,
    /// Number of trees in the forest.
    pub components: usize,
    /// Fill edges added by triangulation.
    pub fill_edges: usize,
    /// Variables in the largest clique.
    pub largest_clique: usize,
    /// Entries in the largest clique potential.
    pub largest_clique_size: usize,
    /// Formulas in the formula graph.
    pub formulas: usize,
}

/// Posterior of one variable, as returned by [`InferenceEngine::infer_all`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableMarginal {
    /// Variable name.
    pub variable: String,
    /// `(level, probability)` in level order.
    pub states: Vec<(String, f64)>,
}

/// Exact junction-tree inference over a discrete Bayesian network.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    network: Network,
    config: EngineConfig,
    forest: JunctionForest,
    store: FormulaStore,
    plan: PropagationPlan,
    evidence: EvidenceState,
}

impl InferenceEngine {
    /// Compiles `network` with the default configuration.
    pub fn new(network: Network) -> Result<Self, InferenceError> {
        Self::with_config(network, EngineConfig::default())
    }

    /// Compiles `network` with an explicit configuration.
    pub fn with_config(network: Network, config: EngineConfig) -> Result<Self, InferenceError> {
        let config = config.validate()?;
        let forest = compile(&network)?;
        let mut store = FormulaStore::new();
        let plan = plan(&network, &forest, &mut store)?;
        let evidence = EvidenceState::new(network.len());
        Ok(Self {
            network,
            config,
            forest,
            store,
            plan,
            evidence,
        })
    }

    /// The compiled network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The compiled junction forest.
    pub fn junction_forest(&self) -> &JunctionForest {
        &self.forest
    }

    /// The formula graph backing propagation.
    pub fn formulas(&self) -> &FormulaStore {
        &self.store
    }

    /// The propagation plan (formula ids of priors, messages and posteriors).
    pub fn plan(&self) -> &PropagationPlan {
        &self.plan
    }

    /// Variable names in definition order.
    pub fn variables(&self) -> Vec<&str> {
        self.network
            .variables()
            .iter()
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Ordered levels of a variable.
    pub fn levels(&self, name: &str) -> Result<&[String], InferenceError> {
        let id = self.network.lookup(name)?;
        Ok(&self.network.variable(id).levels)
    }

    /// Compilation summary.
    pub fn stats(&self) -> CompilationStats {
        let largest = self
            .forest
            .cliques()
            .iter()
            .max_by_key(|c| (c.domain.len(), c.domain.size()));
        CompilationStats {
            variables: self.network.len(),
            cliques: self.forest.cliques().len(),
            separators: self.forest.separators().len(),
            components: self.forest.components().len(),
            fill_edges: self.forest.fill_edge_count(),
            largest_clique: largest.map_or(0, |c| c.domain.len()),
            largest_clique_size: largest.map_or(0, |c| c.domain.size()),
            formulas: self.store.len(),
        }
    }

    /// Replaces all evidence with `evidence`. Nothing changes if any assertion
    /// is invalid.
    pub fn set_evidence(&mut self, evidence: &Evidence) -> Result<(), InferenceError> {
        let resolved = EvidenceState::resolve(&self.network, evidence)?;
        self.evidence.clear_all();
        self.evidence.apply(resolved);
        self.invalidate();
        Ok(())
    }

    /// Adds or replaces the assertions in `evidence`, keeping evidence on other
    /// variables. Nothing changes if any assertion is invalid.
    pub fn update_evidence(&mut self, evidence: &Evidence) -> Result<(), InferenceError> {
        let resolved = EvidenceState::resolve(&self.network, evidence)?;
        self.evidence.apply(resolved);
        self.invalidate();
        Ok(())
    }

    /// Clears evidence on one variable. Returns whether there was any.
    pub fn remove_evidence(&mut self, name: &str) -> Result<bool, InferenceError> {
        let id = self.network.lookup(name)?;
        let removed = self.evidence.clear(id);
        if removed {
            self.invalidate();
        }
        Ok(removed)
    }

    /// Clears all evidence.
    pub fn remove_all_evidence(&mut self) {
        self.evidence.clear_all();
        self.invalidate();
    }

    /// Whether `name` carries evidence.
    pub fn has_evidence_for(&self, name: &str) -> Result<bool, InferenceError> {
        let id = self.network.lookup(name)?;
        Ok(self.evidence.is_observed(id))
    }

    /// The current assertions.
    pub fn evidence(&self) -> Evidence {
        self.evidence.to_evidence(&self.network)
    }

    /// Evaluates every clique, separator and variable posterior.
    pub fn propagate(&mut self) -> Result<(), InferenceError> {
        let ctx = EvalContext {
            network: &self.network,
            evidence: &self.evidence,
            parallel_min_size: self.config.parallel_min_size,
        };
        for id in self
            .plan
            .posteriors
            .iter()
            .chain(&self.plan.separator_posteriors)
            .chain(&self.plan.variable_posteriors)
        {
            self.store.evaluate(*id, &ctx)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(cached = self.store.cached_count(), "propagation complete");

        Ok(())
    }

    /// Posterior potential of one clique.
    pub fn clique_posterior(&mut self, clique: CliqueId) -> Result<FastPotential, InferenceError> {
        let formula = *self.plan.posteriors.get(clique.index()).ok_or_else(|| {
            InferenceError::Query(format!("no clique with id {}", clique.0))
        })?;
        let ctx = EvalContext {
            network: &self.network,
            evidence: &self.evidence,
            parallel_min_size: self.config.parallel_min_size,
        };
        self.store.potential(formula, &ctx)
    }

    /// Probability of a joint assignment given the current evidence.
    ///
    /// Unknown variables and levels are errors; an assignment excluded by hard
    /// evidence has probability 0. The empty event has probability 1.
    pub fn infer(&mut self, event: &Event) -> Result<f64, InferenceError> {
        let mut vars = Vec::with_capacity(event.len());
        let mut states = Vec::with_capacity(event.len());
        for (name, state) in event {
            let id = self.network.lookup(name)?;
            states.push(self.network.level_index(id, state)?);
            vars.push(id);
        }
        match vars.as_slice() {
            [] => Ok(1.0),
            [single] => {
                let marginal = self.marginal(*single)?;
                Ok(marginal[states[0]])
            }
            _ => {
                let values = self.join_ids(&vars, &[])?;
                let mut index = 0;
                let mut stride = 1;
                for (var, state) in vars.iter().zip(&states) {
                    index += state * stride;
                    stride *= self.network.cardinality(*var);
                }
                Ok(values[index])
            }
        }
    }

    /// Posterior of every variable, optionally rounded to `precision` decimals.
    /// Precisions above [`MAX_PRECISION`] are treated as `MAX_PRECISION`.
    pub fn infer_all(
        &mut self,
        precision: Option<u32>,
    ) -> Result<Vec<VariableMarginal>, InferenceError> {
        let scale = precision.map(|p| 10f64.powi(p.min(MAX_PRECISION) as i32));
        let mut out = Vec::with_capacity(self.network.len());
        for position in 0..self.network.len() {
            let id = VarId(position as u32);
            let marginal = self.marginal(id)?;
            let variable = self.network.variable(id);
            out.push(VariableMarginal {
                variable: variable.name.clone(),
                states: variable
                    .levels
                    .iter()
                    .zip(marginal.iter())
                    .map(|(level, p)| {
                        let p = match scale {
                            Some(scale) => (p * scale).round() / scale,
                            None => *p,
                        };
                        (level.clone(), p)
                    })
                    .collect(),
            });
        }
        Ok(out)
    }

    /// `P(head | parents)` given the current evidence.
    pub fn joint_distribution(
        &mut self,
        head: &[&str],
        parents: &[&str],
    ) -> Result<Distribution, InferenceError> {
        let head_ids = self.lookup_all(head)?;
        let parent_ids = self.lookup_all(parents)?;
        let values = self.join_ids(&head_ids, &parent_ids)?;
        let block: usize = head_ids.iter().map(|v| self.network.cardinality(*v)).product();
        check_blocks(&values, block, self.config.normalization_tolerance)?;
        Distribution::new(
            self.distribution_variables(&head_ids),
            self.distribution_variables(&parent_ids),
            values,
        )
    }

    /// The CPT of a variable, as `P(name | parents)` in declared parent order.
    pub fn distribution(&self, name: &str) -> Result<Distribution, InferenceError> {
        let id = self.network.lookup(name)?;
        let variable = self.network.variable(id);
        Distribution::new(
            self.distribution_variables(&[id]),
            self.distribution_variables(&variable.parents),
            variable.cpt.clone(),
        )
    }

    /// Replaces the CPT of `name`. The distribution's head must be exactly
    /// `name` and its parents exactly the variable's parents (any order), with
    /// matching levels.
    pub fn set_distribution(
        &mut self,
        name: &str,
        distribution: &Distribution,
    ) -> Result<(), InferenceError> {
        let id = self.network.lookup(name)?;
        let variable = self.network.variable(id);
        let parent_names: Vec<&str> = variable
            .parents
            .iter()
            .map(|p| self.network.variable(*p).name.as_str())
            .collect();
        let parent_levels: Vec<&[String]> = variable
            .parents
            .iter()
            .map(|p| self.network.variable(*p).levels.as_slice())
            .collect();
        let cpt = distribution.family_potential(
            &variable.name,
            &variable.levels,
            &parent_names,
            &parent_levels,
        )?;
        let cpt = self
            .network
            .normalized_cpt(id, cpt, self.config.cpt_tolerance)
            .map_err(|err| match err {
                InferenceError::Construction(message) => InferenceError::Query(message),
                other => other,
            })?;
        self.network.replace_cpt(id, cpt);
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.store.invalidate_all();
    }

    fn marginal(&mut self, id: VarId) -> Result<std::sync::Arc<[f64]>, InferenceError> {
        let ctx = EvalContext {
            network: &self.network,
            evidence: &self.evidence,
            parallel_min_size: self.config.parallel_min_size,
        };
        self.store
            .evaluate(self.plan.variable_posteriors[id.index()], &ctx)
    }

    fn join_ids(&mut self, head: &[VarId], parents: &[VarId]) -> Result<Vec<f64>, InferenceError> {
        let ctx = EvalContext {
            network: &self.network,
            evidence: &self.evidence,
            parallel_min_size: self.config.parallel_min_size,
        };
        join(&self.forest, &self.plan, &mut self.store, &ctx, head, parents)
    }

    fn lookup_all(&self, names: &[&str]) -> Result<Vec<VarId>, InferenceError> {
        names.iter().map(|n| self.network.lookup(n)).collect()
    }

    fn distribution_variables(&self, ids: &[VarId]) -> Vec<DistributionVariable> {
        ids.iter()
            .map(|id| {
                let variable = self.network.variable(*id);
                DistributionVariable::new(variable.name.clone(), variable.levels.iter().cloned())
            })
            .collect()
    }
}

/// Most decimals `infer_all` rounds to; an f64 carries no more below 1.
pub const MAX_PRECISION: u32 = 15;

/// Every block of a join result sums to 1, or to 0 for an excluded parent
/// combination.
fn check_blocks(values: &[f64], block: usize, tolerance: f64) -> Result<(), InferenceError> {
    for (index, row) in values.chunks(block.max(1)).enumerate() {
        let total: f64 = row.iter().sum();
        if !(total.abs() <= tolerance || (total - 1.0).abs() <= tolerance) {
            return Err(InferenceError::Numerical(format!(
                "block {} of joint distribution sums to {}",
                index, total
            )));
        }
    }
    Ok(())
}

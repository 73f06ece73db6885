//! Memoized evaluation of the formula DAG.
//!
//! Each formula's flat array is computed once and cached at its id until the
//! owning engine invalidates the cache. Evaluation walks children with an
//! explicit stack, so deep message chains cannot overflow the call stack.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::engine::errors::InferenceError;
use crate::engine::evidence::EvidenceState;
use crate::model::network::{Network, VarId};
use crate::potential::fast::FastPotential;
use crate::potential::formula::{FormulaId, FormulaKind, FormulaStore};
use crate::potential::kernels;

/// Read-only inputs that leaf formulas evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Network owning the CPTs.
    pub network: &'a Network,
    /// Current evidence.
    pub evidence: &'a EvidenceState,
    /// Minimum product size for the parallel kernel.
    pub parallel_min_size: usize,
}

impl FormulaStore {
    /// Evaluates `id`, computing and caching any missing descendant first.
    ///
    /// Re-evaluating an id whose cache has not been invalidated returns the
    /// same shared array.
    pub fn evaluate(
        &mut self,
        id: FormulaId,
        ctx: &EvalContext<'_>,
    ) -> Result<Arc<[f64]>, InferenceError> {
        if let Some(values) = &self.cache[id.index()] {
            return Ok(values.clone());
        }

        let mut stack = vec![id];
        while let Some(&top) = stack.last() {
            if self.cache[top.index()].is_some() {
                stack.pop();
                continue;
            }
            let pending: SmallVec<[FormulaId; 4]> = self
                .get(top)
                .children()
                .into_iter()
                .filter(|child| self.cache[child.index()].is_none())
                .collect();
            if !pending.is_empty() {
                stack.extend(pending);
                continue;
            }
            let values = self.compute(top, ctx)?;
            self.cache[top.index()] = Some(values);
            stack.pop();
        }

        self.cache[id.index()].clone().ok_or_else(|| {
            InferenceError::Internal(format!("formula #{} missing after evaluation", id.0))
        })
    }

    /// Evaluates `id` and pairs the result with its domain. The unit formula
    /// becomes the scalar 1.
    pub fn potential(
        &mut self,
        id: FormulaId,
        ctx: &EvalContext<'_>,
    ) -> Result<FastPotential, InferenceError> {
        if self.resolve(id) == self.unit() {
            return Ok(FastPotential::scalar(1.0));
        }
        let values = self.evaluate(id, ctx)?;
        FastPotential::new(self.get(id).domain.clone(), values)
    }

    /// The cached value of `id`, without evaluating.
    pub fn cached(&self, id: FormulaId) -> Option<&Arc<[f64]>> {
        self.cache[id.index()].as_ref()
    }

    fn cached_child(&self, id: FormulaId) -> Result<&Arc<[f64]>, InferenceError> {
        self.cache[id.index()].as_ref().ok_or_else(|| {
            InferenceError::Internal(format!("formula #{} evaluated before its children", id.0))
        })
    }

    fn compute(&self, id: FormulaId, ctx: &EvalContext<'_>) -> Result<Arc<[f64]>, InferenceError> {
        let formula = self.get(id);
        let values: Arc<[f64]> = match &formula.kind {
            FormulaKind::NodePotential { variable } => {
                let var = ctx.network.variable(*variable);
                let family: Vec<(VarId, usize)> = var
                    .family()
                    .iter()
                    .map(|v| (*v, ctx.network.cardinality(*v)))
                    .collect();
                let domain: Vec<(VarId, usize)> = formula.domain.entries().collect();
                kernels::permute(&family, &var.cpt, &domain).into()
            }
            FormulaKind::EvidenceFunction { variable } => {
                let mut values = match ctx.evidence.weights(*variable) {
                    Some(weights) => weights.to_vec(),
                    None => vec![1.0; ctx.network.cardinality(*variable)],
                };
                kernels::normalize(&mut values);
                values.into()
            }
            FormulaKind::Product { factors } => {
                let mut operands = Vec::with_capacity(factors.len());
                for factor in factors {
                    operands.push((&self.get(*factor).domain, &self.cached_child(*factor)?[..]));
                }
                let mut values =
                    kernels::product(&formula.domain, &operands, ctx.parallel_min_size);
                kernels::normalize(&mut values);
                values.into()
            }
            FormulaKind::Marginal { source, .. } => {
                let source_values = self.cached_child(*source)?;
                let mut values = kernels::marginalize(
                    &self.get(*source).domain,
                    source_values,
                    &formula.domain,
                );
                kernels::normalize(&mut values);
                values.into()
            }
            FormulaKind::Unit => Arc::from(Vec::<f64>::new()),
            FormulaKind::Reference { target } => self.cached_child(*target)?.clone(),
        };
        if values.len() != formula.size() {
            return Err(InferenceError::Internal(format!(
                "formula {} evaluated to {} entries, expected {}",
                formula.name,
                values.len(),
                formula.size()
            )));
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evidence::Evidence;
    use crate::model::network::{CptRow, NetworkBuilder, NodeDefinition};

    fn network() -> Network {
        NetworkBuilder::new()
            .node("A", NodeDefinition::marginal(["t", "f"], [("t", 0.3), ("f", 0.7)]))
            .node(
                "B",
                NodeDefinition::conditional(
                    ["t", "f"],
                    ["A"],
                    vec![
                        CptRow::new([("A", "t")], [("t", 0.9), ("f", 0.1)]),
                        CptRow::new([("A", "f")], [("t", 0.2), ("f", 0.8)]),
                    ],
                ),
            )
            .build()
            .expect("network")
    }

    fn ctx<'a>(network: &'a Network, evidence: &'a EvidenceState) -> EvalContext<'a> {
        EvalContext {
            network,
            evidence,
            parallel_min_size: usize::MAX,
        }
    }

    #[test]
    fn product_and_marginal_normalize() {
        let network = network();
        let evidence = EvidenceState::new(network.len());
        let mut store = FormulaStore::new();
        let a = store.node_potential(VarId(0), network.family_domain(VarId(0)));
        let b = store.node_potential(VarId(1), network.family_domain(VarId(1)));
        let joint = store.mult([a, b]);
        let marginal_b = store.marginal(joint, &network.domain_of([VarId(1)]));

        let values = store.evaluate(marginal_b, &ctx(&network, &evidence)).expect("eval");
        // P(B=t) = 0.3*0.9 + 0.7*0.2
        assert!((values[0] - 0.41).abs() < 1e-12);
        assert!((values[1] - 0.59).abs() < 1e-12);
    }

    #[test]
    fn node_potential_is_laid_out_in_domain_order() {
        // Parent id 0 precedes child id 1 in the sorted domain, so the family
        // order [B, A] is permuted to [A, B].
        let network = network();
        let evidence = EvidenceState::new(network.len());
        let mut store = FormulaStore::new();
        let b = store.node_potential(VarId(1), network.family_domain(VarId(1)));
        let values = store.evaluate(b, &ctx(&network, &evidence)).expect("eval");
        assert_eq!(&values[..], &[0.9, 0.2, 0.1, 0.8]);
    }

    #[test]
    fn evidence_function_is_uniform_until_observed() {
        let network = network();
        let mut evidence = EvidenceState::new(network.len());
        let mut store = FormulaStore::new();
        let e = store.evidence_function(VarId(0), 2);
        assert_eq!(&store.evaluate(e, &ctx(&network, &evidence)).expect("eval")[..], &[0.5, 0.5]);

        evidence.apply(
            EvidenceState::resolve(&network, &Evidence::new().soft("A", [("t", 3.0), ("f", 1.0)]))
                .expect("resolve"),
        );
        store.invalidate_all();
        assert_eq!(
            &store.evaluate(e, &ctx(&network, &evidence)).expect("eval")[..],
            &[0.75, 0.25]
        );
    }

    #[test]
    fn evaluation_is_memoized() {
        let network = network();
        let evidence = EvidenceState::new(network.len());
        let mut store = FormulaStore::new();
        let a = store.node_potential(VarId(0), network.family_domain(VarId(0)));
        let b = store.node_potential(VarId(1), network.family_domain(VarId(1)));
        let joint = store.mult([a, b]);
        let alias = store.reference(joint);

        let first = store.evaluate(joint, &ctx(&network, &evidence)).expect("first");
        let second = store.evaluate(joint, &ctx(&network, &evidence)).expect("second");
        let via_alias = store.evaluate(alias, &ctx(&network, &evidence)).expect("alias");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &via_alias));
        assert_eq!(store.cached_count(), 4);

        store.invalidate_all();
        assert!(store.cached(joint).is_none());
    }

    #[test]
    fn unit_is_an_empty_array_and_scalar_potential() {
        let network = network();
        let evidence = EvidenceState::new(network.len());
        let mut store = FormulaStore::new();
        let unit = store.unit();
        assert!(store.evaluate(unit, &ctx(&network, &evidence)).expect("unit").is_empty());
        let p = store.potential(unit, &ctx(&network, &evidence)).expect("potential");
        assert_eq!(p.values(), &[1.0]);
    }
}

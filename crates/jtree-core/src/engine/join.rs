//! Joint and conditional queries over arbitrary variable sets.
//!
//! A query is answered per connected component of the forest:
//!
//! 1. Prune the component to the smallest subtree covering the requested
//!    variables, by repeatedly dropping leaf cliques whose requested variables
//!    are all present in their only remaining neighbor.
//! 2. Walk the subtree from its root, fusing each clique posterior into a
//!    running potential with `P(X,Y) P(Y,Z) / P(Y)`, where `Y` is the separator
//!    to the clique it was reached from. After each step the running potential
//!    is summed down to the requested variables plus the separators still to
//!    be crossed.
//!
//! Components are independent, so their results combine by plain product.
//! Conditional queries then divide each head block by its parent-combination
//! total.

use smallvec::SmallVec;

use crate::engine::errors::InferenceError;
use crate::engine::propagation::PropagationPlan;
use crate::model::network::VarId;
use crate::potential::domain::Domain;
use crate::potential::evaluate::EvalContext;
use crate::potential::fast::FastPotential;
use crate::potential::formula::FormulaStore;
use crate::structure::junction::{CliqueId, JunctionForest};

/// Computes `P(head | parents)` laid out over `head ++ parents` (first head
/// variable least significant). Each head block sums to 1; with no parents a
/// zero-mass result is returned as all zeros.
pub fn join(
    forest: &JunctionForest,
    plan: &PropagationPlan,
    store: &mut FormulaStore,
    ctx: &EvalContext<'_>,
    head: &[VarId],
    parents: &[VarId],
) -> Result<Vec<f64>, InferenceError> {
    if head.is_empty() {
        return Err(InferenceError::Query("query has no head variables".into()));
    }
    let order: Vec<VarId> = head.iter().chain(parents).copied().collect();
    for (i, var) in order.iter().enumerate() {
        if order[..i].contains(var) {
            let name = &ctx.network.variable(*var).name;
            return Err(InferenceError::Query(if i >= head.len() && head.contains(var) {
                format!("'{}' is both a head and a parent variable", name)
            } else {
                format!("'{}' is requested twice", name)
            }));
        }
    }
    let requested = ctx.network.domain_of(order.iter().copied());

    let mut joint = FastPotential::scalar(1.0);
    for component in forest.components() {
        if !component
            .iter()
            .any(|c| requested.vars().iter().any(|v| forest.clique(*c).domain.contains(*v)))
        {
            continue;
        }
        let part = fuse_component(forest, plan, store, ctx, component, &requested)?;
        joint = joint.multiply(&part);
    }
    if joint.domain() != &requested {
        return Err(InferenceError::Internal(format!(
            "join produced {:?}, expected {:?}",
            joint.domain().vars(),
            requested.vars()
        )));
    }

    let (joint, _total) = joint.normalized();
    let mut values = joint.values_in_order(&order)?;
    if !parents.is_empty() {
        condition(ctx, head, parents, &mut values)?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        head = head.len(),
        parents = parents.len(),
        size = values.len(),
        "join answered"
    );

    Ok(values)
}

/// The cliques of `component` left after pruning leaves irrelevant to
/// `requested`, in component order.
pub fn steiner_subtree(
    forest: &JunctionForest,
    component: &[CliqueId],
    requested: &Domain,
) -> Vec<CliqueId> {
    let mut alive = vec![false; forest.cliques().len()];
    for clique in component {
        alive[clique.index()] = true;
    }
    let mut remaining = component.len();

    let mut changed = true;
    while changed && remaining > 1 {
        changed = false;
        for clique in component {
            if !alive[clique.index()] || remaining == 1 {
                continue;
            }
            let node = forest.clique(*clique);
            let mut live_neighbors = node.neighbors.iter().filter(|n| alive[n.index()]);
            let (Some(only), None) = (live_neighbors.next(), live_neighbors.next()) else {
                continue;
            };
            let needed = node.domain.restrict(|v| requested.contains(v));
            if needed.is_subset_of(&forest.clique(*only).domain) {
                alive[clique.index()] = false;
                remaining -= 1;
                changed = true;
            }
        }
    }

    component
        .iter()
        .copied()
        .filter(|c| alive[c.index()])
        .collect()
}

fn fuse_component(
    forest: &JunctionForest,
    plan: &PropagationPlan,
    store: &mut FormulaStore,
    ctx: &EvalContext<'_>,
    component: &[CliqueId],
    requested: &Domain,
) -> Result<FastPotential, InferenceError> {
    let subtree = steiner_subtree(forest, component, requested);
    let order = walk(forest, &subtree);
    let Some((root, _)) = order.first().copied() else {
        return Err(InferenceError::Internal("pruned subtree is empty".into()));
    };

    // Separator each later step crosses, co-indexed with `order`.
    let mut crossings: Vec<Option<Domain>> = Vec::with_capacity(order.len());
    for (clique, parent) in &order {
        crossings.push(match parent {
            Some(parent) => {
                let separator = forest.clique(*clique).separator_to(*parent).ok_or_else(|| {
                    InferenceError::Internal(format!(
                        "cliques {} and {} are not adjacent",
                        clique.0, parent.0
                    ))
                })?;
                Some(forest.separator(separator).domain.clone())
            }
            None => None,
        });
    }
    let keep_after = |step: usize| {
        crossings[step + 1..]
            .iter()
            .flatten()
            .fold(requested.clone(), |acc, d| acc.union(d))
    };

    let mut running = store
        .potential(plan.posteriors[root.index()], ctx)?
        .marginalize(&keep_after(0));
    for step in 1..order.len() {
        let (clique, _) = order[step];
        let separator = crossings[step].clone().unwrap_or_default();
        let posterior = store.potential(plan.posteriors[clique.index()], ctx)?;
        let shared = posterior.marginalize(&separator);
        running = running
            .multiply(&posterior)
            .divide(&shared)?
            .marginalize(&keep_after(step));
    }
    Ok(running)
}

/// Pre-order walk over `subtree`, each clique paired with the clique it was
/// reached from.
fn walk(forest: &JunctionForest, subtree: &[CliqueId]) -> Vec<(CliqueId, Option<CliqueId>)> {
    let mut order = Vec::with_capacity(subtree.len());
    let Some(root) = subtree.first().copied() else {
        return order;
    };
    let mut stack: SmallVec<[(CliqueId, Option<CliqueId>); 8]> = SmallVec::new();
    stack.push((root, None));
    while let Some((clique, parent)) = stack.pop() {
        order.push((clique, parent));
        for neighbor in forest.clique(clique).neighbors.iter().rev() {
            if Some(*neighbor) != parent && subtree.contains(neighbor) {
                stack.push((*neighbor, Some(clique)));
            }
        }
    }
    order
}

fn condition(
    ctx: &EvalContext<'_>,
    head: &[VarId],
    parents: &[VarId],
    values: &mut [f64],
) -> Result<(), InferenceError> {
    let block: usize = head.iter().map(|v| ctx.network.cardinality(*v)).product();
    for (row, chunk) in values.chunks_mut(block).enumerate() {
        let total: f64 = chunk.iter().sum();
        if total <= 0.0 {
            let mut rest = row;
            let assignment: Vec<String> = parents
                .iter()
                .map(|p| {
                    let variable = ctx.network.variable(*p);
                    let state = rest % variable.cardinality();
                    rest /= variable.cardinality();
                    format!("{}={}", variable.name, variable.levels[state])
                })
                .collect();
            return Err(InferenceError::ZeroProbabilityCondition(assignment.join(", ")));
        }
        chunk.iter_mut().for_each(|v| *v /= total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evidence::{Evidence, EvidenceState};
    use crate::engine::propagation::plan;
    use crate::model::network::{Network, NetworkBuilder, NodeDefinition};
    use crate::structure::junction::compile;

    fn root(values: [f64; 2]) -> NodeDefinition {
        NodeDefinition::potential(["t", "f"], Vec::<String>::new(), values.to_vec())
    }

    fn child(parent: &str, values: [f64; 4]) -> NodeDefinition {
        NodeDefinition::potential(["t", "f"], [parent], values.to_vec())
    }

    fn chain() -> Network {
        NetworkBuilder::new()
            .node("A", root([0.6, 0.4]))
            .node("B", child("A", [0.7, 0.3, 0.2, 0.8]))
            .node("C", child("B", [0.9, 0.1, 0.5, 0.5]))
            .node("D", child("C", [0.4, 0.6, 0.1, 0.9]))
            .build()
            .expect("network")
    }

    fn run(
        network: &Network,
        evidence: &EvidenceState,
        head: &[VarId],
        parents: &[VarId],
    ) -> Result<Vec<f64>, InferenceError> {
        let forest = compile(network).expect("forest");
        let mut store = FormulaStore::new();
        let plan = plan(network, &forest, &mut store).expect("plan");
        let ctx = EvalContext {
            network,
            evidence,
            parallel_min_size: usize::MAX,
        };
        join(&forest, &plan, &mut store, &ctx, head, parents)
    }

    #[test]
    fn joins_non_adjacent_variables() {
        let network = chain();
        let evidence = EvidenceState::new(network.len());
        let values = run(&network, &evidence, &[VarId(0), VarId(2)], &[]).expect("join");
        // P(A=t, C=t) = 0.6 * (0.7*0.9 + 0.3*0.5) = 0.468
        assert!((values[0] - 0.468).abs() < 1e-12);
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn conditional_blocks_sum_to_one() {
        let network = chain();
        let evidence = EvidenceState::new(network.len());
        let values = run(&network, &evidence, &[VarId(2)], &[VarId(0)]).expect("join");
        // P(C=t | A=t) = 0.78, P(C=t | A=f) = 0.2*0.9 + 0.8*0.5 = 0.58
        assert!((values[0] - 0.78).abs() < 1e-12);
        assert!((values[2] - 0.58).abs() < 1e-12);
        assert!((values[0] + values[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn output_follows_requested_order() {
        let network = chain();
        let evidence = EvidenceState::new(network.len());
        let ac = run(&network, &evidence, &[VarId(0), VarId(2)], &[]).expect("ac");
        let ca = run(&network, &evidence, &[VarId(2), VarId(0)], &[]).expect("ca");
        assert!((ac[1] - ca[2]).abs() < 1e-12);
        assert!((ac[2] - ca[1]).abs() < 1e-12);
    }

    #[test]
    fn impossible_condition_is_an_error() {
        let network = NetworkBuilder::new()
            .node("A", root([1.0, 0.0]))
            .node("B", child("A", [0.5, 0.5, 0.5, 0.5]))
            .build()
            .expect("network");
        let evidence = EvidenceState::new(network.len());
        let err = run(&network, &evidence, &[VarId(1)], &[VarId(0)]).unwrap_err();
        assert_eq!(err, InferenceError::ZeroProbabilityCondition("A=f".into()));
    }

    #[test]
    fn contradictory_evidence_yields_zeros_without_parents() {
        let network = NetworkBuilder::new()
            .node("A", root([1.0, 0.0]))
            .build()
            .expect("network");
        let mut evidence = EvidenceState::new(network.len());
        evidence.apply(
            EvidenceState::resolve(&network, &Evidence::new().hard("A", "f")).expect("resolve"),
        );
        let values = run(&network, &evidence, &[VarId(0)], &[]).expect("join");
        assert_eq!(values, vec![0.0, 0.0]);
    }

    #[test]
    fn rejects_malformed_requests() {
        let network = chain();
        let evidence = EvidenceState::new(network.len());
        assert!(matches!(
            run(&network, &evidence, &[], &[VarId(0)]),
            Err(InferenceError::Query(_))
        ));
        assert!(matches!(
            run(&network, &evidence, &[VarId(0)], &[VarId(0)]),
            Err(InferenceError::Query(_))
        ));
    }

    #[test]
    fn pruning_keeps_only_the_covering_path() {
        let network = chain();
        let forest = compile(&network).expect("forest");
        let component = &forest.components()[0];
        assert_eq!(component.len(), 3);

        let only_b = network.domain_of([VarId(1)]);
        assert_eq!(steiner_subtree(&forest, component, &only_b).len(), 1);

        let a_and_d = network.domain_of([VarId(0), VarId(3)]);
        assert_eq!(steiner_subtree(&forest, component, &a_and_d).len(), 3);
    }
}

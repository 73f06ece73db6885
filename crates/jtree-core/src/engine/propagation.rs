//! Hugin two-pass propagation over the junction forest.
//!
//! Propagation is planned symbolically: every prior, message and posterior is
//! a formula in the shared [`FormulaStore`], so the plan is built once per
//! compiled network and evidence changes only invalidate cached values.
//!
//! Each connected component is rooted at its first clique. The collect pass
//! sends messages leaves-to-root in post-order; the distribute pass sends them
//! root-to-leaves in pre-order. A message from `a` to `b` is the product of
//! `a`'s prior and every message `a` received from a neighbor other than `b`,
//! marginalized onto the separator. Components never exchange messages.

use rustc_hash::FxHashMap;

use crate::engine::errors::InferenceError;
use crate::model::network::{Network, VarId};
use crate::potential::formula::{FormulaId, FormulaStore};
use crate::structure::junction::{CliqueId, JunctionForest};

/// Formula ids produced by planning propagation over a forest.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationPlan {
    /// Clique each variable's CPT and evidence function are assigned to.
    pub assignments: Vec<CliqueId>,
    /// Prior of each clique, indexed by clique id.
    pub priors: Vec<FormulaId>,
    /// Posterior of each clique, indexed by clique id.
    pub posteriors: Vec<FormulaId>,
    /// Posterior of each separator, indexed by separator id.
    pub separator_posteriors: Vec<FormulaId>,
    /// Single-variable posterior, indexed by variable id.
    pub variable_posteriors: Vec<FormulaId>,
    messages: FxHashMap<(CliqueId, CliqueId), FormulaId>,
}

impl PropagationPlan {
    /// The message sent from `from` to its neighbor `to`.
    pub fn message(&self, from: CliqueId, to: CliqueId) -> Option<FormulaId> {
        self.messages.get(&(from, to)).copied()
    }

    /// Number of directed messages (two per forest edge).
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Builds the propagation formulas for `forest` into `store`.
pub fn plan(
    network: &Network,
    forest: &JunctionForest,
    store: &mut FormulaStore,
) -> Result<PropagationPlan, InferenceError> {
    let clique_count = forest.cliques().len();
    let mut assigned: Vec<Vec<FormulaId>> = vec![Vec::new(); clique_count];
    let mut assignments = Vec::with_capacity(network.len());

    for variable in network.variables() {
        let family = network.family_domain(variable.id);
        let home = forest.smallest_clique_covering(&family).ok_or_else(|| {
            InferenceError::Internal(format!(
                "no clique covers the family of '{}'",
                variable.name
            ))
        })?;
        let node = store.node_potential(variable.id, family);
        let evidence = store.evidence_function(variable.id, variable.cardinality());
        assigned[home.index()].extend([node, evidence]);
        assignments.push(home);
    }

    let priors: Vec<FormulaId> = assigned
        .into_iter()
        .map(|factors| store.mult(factors))
        .collect();

    let mut messages = FxHashMap::default();
    for component in forest.components() {
        let Some(root) = component.first().copied() else {
            continue;
        };
        let order = traversal(forest, root);

        // Collect: children before parents.
        for (clique, parent) in order.iter().rev() {
            if let Some(parent) = parent {
                send(forest, store, &priors, &mut messages, *clique, *parent)?;
            }
        }
        // Distribute: parents before children.
        for (clique, parent) in &order {
            for neighbor in &forest.clique(*clique).neighbors {
                if Some(*neighbor) != *parent {
                    send(forest, store, &priors, &mut messages, *clique, *neighbor)?;
                }
            }
        }
    }

    let mut posteriors = Vec::with_capacity(clique_count);
    for clique in forest.cliques() {
        let mut factors = vec![priors[clique.id.index()]];
        for neighbor in &clique.neighbors {
            factors.push(incoming(&messages, *neighbor, clique.id)?);
        }
        let posterior = store.mult(factors);
        if store.get(posterior).domain != clique.domain {
            return Err(InferenceError::Internal(format!(
                "posterior of clique {} spans {:?}, expected {:?}",
                clique.id.0,
                store.get(posterior).domain.vars(),
                clique.domain.vars()
            )));
        }
        posteriors.push(posterior);
    }

    let separator_posteriors: Vec<FormulaId> = forest
        .separators()
        .iter()
        .map(|separator| {
            let cheaper = separator
                .links
                .iter()
                .flat_map(|(a, b)| [*a, *b])
                .min_by_key(|c| (forest.clique(*c).domain.size(), *c))
                .ok_or_else(|| {
                    InferenceError::Internal(format!(
                        "separator {} links no cliques",
                        separator.id.0
                    ))
                })?;
            Ok(store.marginal(posteriors[cheaper.index()], &separator.domain))
        })
        .collect::<Result<_, InferenceError>>()?;

    let mut variable_posteriors = Vec::with_capacity(network.len());
    for variable in network.variables() {
        let source = smallest_holder(forest, &posteriors, &separator_posteriors, store, variable.id)
            .ok_or_else(|| {
                InferenceError::Internal(format!("no clique contains '{}'", variable.name))
            })?;
        let single = network.domain_of([variable.id]);
        let posterior = if store.get(source).domain == single {
            store.reference(source)
        } else {
            store.marginal(source, &single)
        };
        variable_posteriors.push(posterior);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        messages = messages.len(),
        formulas = store.len(),
        "propagation planned"
    );

    Ok(PropagationPlan {
        assignments,
        priors,
        posteriors,
        separator_posteriors,
        variable_posteriors,
        messages,
    })
}

/// Pre-order walk of the tree containing `root`, each clique paired with the
/// neighbor it was reached from.
fn traversal(forest: &JunctionForest, root: CliqueId) -> Vec<(CliqueId, Option<CliqueId>)> {
    let mut order = Vec::new();
    let mut stack = vec![(root, None)];
    while let Some((clique, parent)) = stack.pop() {
        order.push((clique, parent));
        for neighbor in forest.clique(clique).neighbors.iter().rev() {
            if Some(*neighbor) != parent {
                stack.push((*neighbor, Some(clique)));
            }
        }
    }
    order
}

fn send(
    forest: &JunctionForest,
    store: &mut FormulaStore,
    priors: &[FormulaId],
    messages: &mut FxHashMap<(CliqueId, CliqueId), FormulaId>,
    from: CliqueId,
    to: CliqueId,
) -> Result<(), InferenceError> {
    let clique = forest.clique(from);
    let separator = clique.separator_to(to).ok_or_else(|| {
        InferenceError::Internal(format!("cliques {} and {} are not adjacent", from.0, to.0))
    })?;
    let mut factors = vec![priors[from.index()]];
    for neighbor in &clique.neighbors {
        if *neighbor != to {
            factors.push(incoming(messages, *neighbor, from)?);
        }
    }
    let product = store.mult(factors);
    let message = store.marginal(product, &forest.separator(separator).domain);
    messages.insert((from, to), message);
    Ok(())
}

fn incoming(
    messages: &FxHashMap<(CliqueId, CliqueId), FormulaId>,
    from: CliqueId,
    to: CliqueId,
) -> Result<FormulaId, InferenceError> {
    messages.get(&(from, to)).copied().ok_or_else(|| {
        InferenceError::Internal(format!(
            "message {} -> {} requested before it was sent",
            from.0, to.0
        ))
    })
}

/// Posterior of the smallest clique or separator containing `var`.
fn smallest_holder(
    forest: &JunctionForest,
    posteriors: &[FormulaId],
    separator_posteriors: &[FormulaId],
    store: &FormulaStore,
    var: VarId,
) -> Option<FormulaId> {
    let cliques = forest
        .cliques_containing(var)
        .map(|c| (c.domain.size(), posteriors[c.id.index()]));
    let separators = forest
        .separators()
        .iter()
        .filter(|s| s.domain.contains(var))
        .map(|s| (s.domain.size(), separator_posteriors[s.id.index()]));
    cliques
        .chain(separators)
        .filter(|(_, formula)| store.get(*formula).domain.contains(var))
        .min_by_key(|(size, _)| *size)
        .map(|(_, formula)| formula)
}

//! Shared fixtures and oracles for the integration tests.
//!
//! The brute-force enumerator multiplies every CPT over the full joint state
//! space. It is exponential in the number of variables and exists only to
//! cross-check the junction-tree engine on small networks.

use jtree_core::{CptRow, Evidence, Network, NetworkBuilder, NodeDefinition, Observation, VarId};

/// Asserts `|actual - expected| <= tol` with a labelled message.
pub fn assert_close(actual: f64, expected: f64, tol: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{} mismatch: expected {:.15}, got {:.15}, diff={:.3e}",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

/// Element-wise [`assert_close`].
pub fn assert_all_close(actual: &[f64], expected: &[f64], tol: f64, label: &str) {
    assert_eq!(actual.len(), expected.len(), "{} length mismatch", label);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_close(*a, *e, tol, &format!("{}[{}]", label, i));
    }
}

fn boolean_marginal(p_true: f64) -> NodeDefinition {
    NodeDefinition::marginal(["T", "F"], [("T", p_true), ("F", 1.0 - p_true)])
}

fn boolean_row<'a>(when: &[(&'a str, &'a str)], p_true: f64) -> CptRow {
    CptRow::new(when.iter().copied(), [("T", p_true), ("F", 1.0 - p_true)])
}

/// RAIN -> SPRINKLER, {SPRINKLER, RAIN} -> GRASS_WET.
pub fn sprinkler() -> Network {
    NetworkBuilder::new()
        .node("RAIN", boolean_marginal(0.2))
        .node(
            "SPRINKLER",
            NodeDefinition::conditional(
                ["T", "F"],
                ["RAIN"],
                vec![
                    boolean_row(&[("RAIN", "T")], 0.01),
                    boolean_row(&[("RAIN", "F")], 0.4),
                ],
            ),
        )
        .node(
            "GRASS_WET",
            NodeDefinition::conditional(
                ["T", "F"],
                ["SPRINKLER", "RAIN"],
                vec![
                    boolean_row(&[("SPRINKLER", "F"), ("RAIN", "F")], 0.0),
                    boolean_row(&[("SPRINKLER", "F"), ("RAIN", "T")], 0.8),
                    boolean_row(&[("SPRINKLER", "T"), ("RAIN", "F")], 0.9),
                    boolean_row(&[("SPRINKLER", "T"), ("RAIN", "T")], 0.99),
                ],
            ),
        )
        .build()
        .expect("sprinkler network")
}

/// The five-variable burglary alarm network.
pub fn alarm() -> Network {
    NetworkBuilder::new()
        .node("BURGLARY", boolean_marginal(0.001))
        .node("EARTHQUAKE", boolean_marginal(0.002))
        .node(
            "ALARM",
            NodeDefinition::conditional(
                ["T", "F"],
                ["BURGLARY", "EARTHQUAKE"],
                vec![
                    boolean_row(&[("BURGLARY", "T"), ("EARTHQUAKE", "T")], 0.95),
                    boolean_row(&[("BURGLARY", "T"), ("EARTHQUAKE", "F")], 0.94),
                    boolean_row(&[("BURGLARY", "F"), ("EARTHQUAKE", "T")], 0.29),
                    boolean_row(&[("BURGLARY", "F"), ("EARTHQUAKE", "F")], 0.001),
                ],
            ),
        )
        .node(
            "JOHN_CALLS",
            NodeDefinition::conditional(
                ["T", "F"],
                ["ALARM"],
                vec![
                    boolean_row(&[("ALARM", "T")], 0.90),
                    boolean_row(&[("ALARM", "F")], 0.05),
                ],
            ),
        )
        .node(
            "MARY_CALLS",
            NodeDefinition::conditional(
                ["T", "F"],
                ["ALARM"],
                vec![
                    boolean_row(&[("ALARM", "T")], 0.70),
                    boolean_row(&[("ALARM", "F")], 0.01),
                ],
            ),
        )
        .build()
        .expect("alarm network")
}

/// Three independent chains `A -> B`, `C -> D`, `E -> F`.
pub fn forest() -> Network {
    let root = |values: [f64; 2]| {
        NodeDefinition::potential(["T", "F"], Vec::<String>::new(), values.to_vec())
    };
    let child = |parent: &str, values: [f64; 4]| {
        NodeDefinition::potential(["T", "F"], [parent], values.to_vec())
    };
    NetworkBuilder::new()
        .node("A", root([0.1, 0.9]))
        .node("B", child("A", [0.6, 0.4, 0.25, 0.75]))
        .node("C", root([0.2, 0.8]))
        .node("D", child("C", [0.7, 0.3, 0.3, 0.7]))
        .node("E", root([0.5, 0.5]))
        .node("F", child("E", [0.35, 0.65, 0.85, 0.15]))
        .build()
        .expect("forest network")
}

/// Builds a network `X0..Xn` from per-variable cardinalities and parent
/// indices (each parent index must be smaller than its child's). CPT entries
/// cycle through `weights`, which must be positive.
pub fn network_from_parts(cards: &[usize], parents: &[Vec<usize>], weights: &[f64]) -> Network {
    let mut builder = NetworkBuilder::new();
    let mut cursor = 0;
    for (i, card) in cards.iter().enumerate() {
        let family_size: usize = card * parents[i].iter().map(|p| cards[*p]).product::<usize>();
        let values: Vec<f64> = (0..family_size)
            .map(|_| {
                let w = weights[cursor % weights.len()];
                cursor += 1;
                w
            })
            .collect();
        builder.add_node(
            format!("X{}", i),
            NodeDefinition::potential(
                (0..*card).map(|s| format!("s{}", s)),
                parents[i].iter().map(|p| format!("X{}", p)),
                values,
            ),
        );
    }
    builder.build().expect("generated network")
}

fn evidence_weight(network: &Network, evidence: &Evidence, var: VarId, state: usize) -> f64 {
    let variable = network.variable(var);
    let Some(observation) = evidence.get(&variable.name) else {
        return 1.0;
    };
    let level = &variable.levels[state];
    match observation {
        Observation::State(s) => f64::from(u8::from(s == level)),
        Observation::States(states) => f64::from(u8::from(states.contains(level))),
        Observation::Weighted(pairs) => pairs
            .iter()
            .filter(|(s, _)| s == level)
            .map(|(_, w)| *w)
            .sum(),
    }
}

/// Unnormalized weight of every full assignment, indexed mixed-radix with
/// variable 0 least significant.
pub fn full_joint(network: &Network, evidence: &Evidence) -> Vec<f64> {
    let cards: Vec<usize> = network.variables().iter().map(|v| v.levels.len()).collect();
    let size: usize = cards.iter().product();
    let mut states = vec![0usize; cards.len()];
    let mut joint = Vec::with_capacity(size);
    for index in 0..size {
        let mut rest = index;
        for (slot, card) in states.iter_mut().zip(&cards) {
            *slot = rest % card;
            rest /= card;
        }
        let mut weight = 1.0;
        for variable in network.variables() {
            let mut cpt_index = 0;
            let mut stride = 1;
            for member in variable.family() {
                cpt_index += states[member.index()] * stride;
                stride *= cards[member.index()];
            }
            weight *= variable.cpt[cpt_index];
            weight *= evidence_weight(network, evidence, variable.id, states[variable.id.index()]);
        }
        joint.push(weight);
    }
    joint
}

/// `P(head | parents)` by enumeration, laid out over `head ++ parents` with
/// the first head variable least significant. Zero blocks stay zero.
pub fn brute_force(network: &Network, evidence: &Evidence, head: &[&str], parents: &[&str]) -> Vec<f64> {
    let cards: Vec<usize> = network.variables().iter().map(|v| v.levels.len()).collect();
    let order: Vec<VarId> = head
        .iter()
        .chain(parents)
        .map(|n| network.lookup(n).expect("known variable"))
        .collect();
    let out_size: usize = order.iter().map(|v| cards[v.index()]).product();
    let mut out = vec![0.0; out_size];

    for (index, weight) in full_joint(network, evidence).into_iter().enumerate() {
        let mut target = 0;
        let mut stride = 1;
        for var in &order {
            let mut rest = index;
            for card in &cards[..var.index()] {
                rest /= card;
            }
            target += (rest % cards[var.index()]) * stride;
            stride *= cards[var.index()];
        }
        out[target] += weight;
    }

    let block: usize = head
        .iter()
        .map(|n| cards[network.lookup(n).expect("known variable").index()])
        .product();
    for row in out.chunks_mut(block) {
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            row.iter_mut().for_each(|v| *v /= total);
        }
    }
    out
}

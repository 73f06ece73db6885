//! # Discrete Bayesian network model
//!
//! This module holds the validated shape the inference engine consumes.
//!
//! ## Key Components
//!
//! - **NodeDefinition**: one variable's ordered levels, parent names and
//!   probability table, as supplied by the caller
//! - **NetworkBuilder**: collects definitions and validates them into a
//!   [`Network`] (duplicate names, unknown parents, empty level sets, malformed
//!   tables and parent cycles are rejected)
//! - **Network / Variable**: the compiled, structurally immutable model
//!
//! ## CPT encoding
//!
//! Every variable stores its conditional probability table as a flat array over
//! its *family* `[self, parents...]` (parents in declared order). The index is
//! mixed-radix with `self` as the least-significant digit, so each contiguous
//! block of `levels.len()` entries is one row `P(self | parent combination)`.
//! A `ProbabilityTable::Potential` is expected in exactly this encoding.
//!
//! ## Example
//!
//! ```rust
//! use jtree_core::model::network::{NetworkBuilder, NodeDefinition};
//!
//! let network = NetworkBuilder::new()
//!     .node("RAIN", NodeDefinition::marginal(["T", "F"], [("T", 0.2), ("F", 0.8)]))
//!     .build()
//!     .expect("valid network");
//! assert_eq!(network.len(), 1);
//! ```

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::engine::config::DEFAULT_CPT_TOLERANCE;
use crate::engine::errors::InferenceError;
use crate::model::distribution::Distribution;
use crate::potential::domain::Domain;

/// A unique identifier for a variable in a compiled network.
///
/// Ids are dense indices in definition order, so ordering by id is the same as
/// ordering by input order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub u32);

impl VarId {
    /// Position of the variable in the network's variable list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One row of a conditional probability table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CptRow {
    /// Parent-state assignment this row applies to.
    pub when: BTreeMap<String, String>,
    /// Probability of each of the variable's own states. Missing states are 0.
    pub then: BTreeMap<String, f64>,
}

impl CptRow {
    /// Builds a row from `(parent, state)` and `(state, probability)` pairs.
    pub fn new<'a>(
        when: impl IntoIterator<Item = (&'a str, &'a str)>,
        then: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        Self {
            when: when
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            then: then.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

/// The probability table of a node definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbabilityTable {
    /// Flat state -> probability map. Only valid for variables without parents.
    Marginal(BTreeMap<String, f64>),
    /// One row per parent combination, each combination exactly once.
    Conditional(Vec<CptRow>),
    /// Pre-encoded flat array in family order (see module docs).
    Potential(Vec<f64>),
    /// A distribution whose head is exactly this variable.
    Distribution(Distribution),
}

/// Caller-supplied definition of one variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDefinition {
    /// Ordered state labels. Order fixes the index encoding.
    pub levels: Vec<String>,
    /// Parent variable names. Order fixes the CPT encoding.
    pub parents: Vec<String>,
    /// The (conditional) probability table.
    pub table: ProbabilityTable,
}

impl NodeDefinition {
    /// Builds a definition from its parts.
    pub fn new<L, P>(
        levels: impl IntoIterator<Item = L>,
        parents: impl IntoIterator<Item = P>,
        table: ProbabilityTable,
    ) -> Self
    where
        L: Into<String>,
        P: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
            parents: parents.into_iter().map(Into::into).collect(),
            table,
        }
    }

    /// Root variable with a flat state -> probability table.
    pub fn marginal<'a, L>(
        levels: impl IntoIterator<Item = L>,
        probabilities: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self
    where
        L: Into<String>,
    {
        let table = probabilities
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self::new(
            levels,
            std::iter::empty::<String>(),
            ProbabilityTable::Marginal(table),
        )
    }

    /// Variable with explicit `when / then` CPT rows.
    pub fn conditional<L, P>(
        levels: impl IntoIterator<Item = L>,
        parents: impl IntoIterator<Item = P>,
        rows: Vec<CptRow>,
    ) -> Self
    where
        L: Into<String>,
        P: Into<String>,
    {
        Self::new(levels, parents, ProbabilityTable::Conditional(rows))
    }

    /// Variable with a pre-encoded potential array in family order.
    pub fn potential<L, P>(
        levels: impl IntoIterator<Item = L>,
        parents: impl IntoIterator<Item = P>,
        values: Vec<f64>,
    ) -> Self
    where
        L: Into<String>,
        P: Into<String>,
    {
        Self::new(levels, parents, ProbabilityTable::Potential(values))
    }
}

/// A compiled variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Dense id (definition order).
    pub id: VarId,
    /// Variable name.
    pub name: String,
    /// Ordered state labels.
    pub levels: Vec<String>,
    /// Parents in declared order.
    pub parents: Vec<VarId>,
    /// Children, derived from every other variable's parent list.
    pub children: Vec<VarId>,
    /// CPT in family order, every row normalized.
    pub cpt: Vec<f64>,
}

impl Variable {
    /// Number of states.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.levels.len()
    }

    /// Index of `level` in this variable's state list.
    pub fn level_index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }

    /// The family `[self, parents...]` in CPT encoding order.
    pub fn family(&self) -> SmallVec<[VarId; 8]> {
        let mut family = SmallVec::with_capacity(self.parents.len() + 1);
        family.push(self.id);
        family.extend(self.parents.iter().copied());
        family
    }
}

/// Collects node definitions and validates them into a [`Network`].
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    nodes: Vec<(String, NodeDefinition)>,
    cpt_tolerance: Option<f64>,
}

impl NetworkBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, builder-style.
    pub fn node(mut self, name: impl Into<String>, definition: NodeDefinition) -> Self {
        self.add_node(name, definition);
        self
    }

    /// Adds a definition. Duplicates are reported by [`build`](Self::build).
    pub fn add_node(&mut self, name: impl Into<String>, definition: NodeDefinition) -> &mut Self {
        self.nodes.push((name.into(), definition));
        self
    }

    /// Overrides the tolerance before a CPT row is renormalized. Defaults to
    /// [`DEFAULT_CPT_TOLERANCE`], the same value `EngineConfig` applies to
    /// replaced tables.
    pub fn cpt_tolerance(mut self, tolerance: f64) -> Self {
        self.cpt_tolerance = Some(tolerance);
        self
    }

    /// Validates every definition and compiles the network.
    pub fn build(self) -> Result<Network, InferenceError> {
        let tolerance = self.cpt_tolerance.unwrap_or(DEFAULT_CPT_TOLERANCE);
        let mut index: FxHashMap<String, VarId> = FxHashMap::default();
        for (position, (name, definition)) in self.nodes.iter().enumerate() {
            if index.insert(name.clone(), VarId(position as u32)).is_some() {
                return Err(InferenceError::Construction(format!(
                    "duplicate variable '{}'",
                    name
                )));
            }
            validate_levels(name, &definition.levels)?;
        }

        let mut variables = Vec::with_capacity(self.nodes.len());
        for (position, (name, definition)) in self.nodes.iter().enumerate() {
            let mut parents = Vec::with_capacity(definition.parents.len());
            let mut seen = FxHashSet::default();
            for parent in &definition.parents {
                let parent_id = *index.get(parent).ok_or_else(|| {
                    InferenceError::Construction(format!(
                        "variable '{}' references unknown parent '{}'",
                        name, parent
                    ))
                })?;
                if parent_id.index() == position {
                    return Err(InferenceError::Construction(format!(
                        "variable '{}' lists itself as a parent",
                        name
                    )));
                }
                if !seen.insert(parent_id) {
                    return Err(InferenceError::Construction(format!(
                        "variable '{}' lists parent '{}' twice",
                        name, parent
                    )));
                }
                parents.push(parent_id);
            }
            variables.push(Variable {
                id: VarId(position as u32),
                name: name.clone(),
                levels: definition.levels.clone(),
                parents,
                children: Vec::new(),
                cpt: Vec::new(),
            });
        }

        for position in 0..variables.len() {
            let parents = variables[position].parents.clone();
            for parent in parents {
                variables[parent.index()]
                    .children
                    .push(VarId(position as u32));
            }
        }
        reject_cycles(&variables)?;

        for (position, (_, definition)) in self.nodes.iter().enumerate() {
            let cpt = encode_table(&variables, &variables[position], &definition.table)?;
            variables[position].cpt = normalize_rows(&variables[position], cpt, tolerance)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(variables = variables.len(), "network validated");

        Ok(Network { variables, index })
    }
}

/// A validated, compiled Bayesian network.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    variables: Vec<Variable>,
    index: FxHashMap<String, VarId>,
}

impl Network {
    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the network has no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// All variables in definition order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The variable with the given id.
    #[inline]
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Number of states of the given variable.
    #[inline]
    pub fn cardinality(&self, id: VarId) -> usize {
        self.variables[id.index()].levels.len()
    }

    /// Looks up a variable by name.
    pub fn lookup(&self, name: &str) -> Result<VarId, InferenceError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| InferenceError::UnknownVariable(name.to_string()))
    }

    /// Looks up a level index by variable id and label.
    pub fn level_index(&self, id: VarId, level: &str) -> Result<usize, InferenceError> {
        let variable = self.variable(id);
        variable
            .level_index(level)
            .ok_or_else(|| InferenceError::UnknownLevel {
                variable: variable.name.clone(),
                level: level.to_string(),
            })
    }

    /// Sorted domain over the given variables.
    pub fn domain_of(&self, vars: impl IntoIterator<Item = VarId>) -> Domain {
        Domain::new(vars.into_iter().map(|v| (v, self.cardinality(v))))
    }

    /// Sorted domain over a variable's family.
    pub fn family_domain(&self, id: VarId) -> Domain {
        self.domain_of(self.variable(id).family())
    }

    /// Replaces a variable's CPT. The array must already be in family order
    /// with normalized rows.
    pub(crate) fn replace_cpt(&mut self, id: VarId, cpt: Vec<f64>) {
        self.variables[id.index()].cpt = cpt;
    }

    /// Renormalizes a family-ordered CPT for the given variable.
    pub(crate) fn normalized_cpt(
        &self,
        id: VarId,
        cpt: Vec<f64>,
        tolerance: f64,
    ) -> Result<Vec<f64>, InferenceError> {
        normalize_rows(self.variable(id), cpt, tolerance)
    }

    /// Reconstructs the definition of a variable, table as a pre-encoded potential.
    pub fn definition(&self, id: VarId) -> NodeDefinition {
        let variable = self.variable(id);
        NodeDefinition {
            levels: variable.levels.clone(),
            parents: variable
                .parents
                .iter()
                .map(|p| self.variable(*p).name.clone())
                .collect(),
            table: ProbabilityTable::Potential(variable.cpt.clone()),
        }
    }
}

fn validate_levels(name: &str, levels: &[String]) -> Result<(), InferenceError> {
    if levels.is_empty() {
        return Err(InferenceError::Construction(format!(
            "variable '{}' has no levels",
            name
        )));
    }
    let mut seen = FxHashSet::default();
    for level in levels {
        if !seen.insert(level.as_str()) {
            return Err(InferenceError::Construction(format!(
                "variable '{}' lists level '{}' twice",
                name, level
            )));
        }
    }
    Ok(())
}

fn reject_cycles(variables: &[Variable]) -> Result<(), InferenceError> {
    let mut in_degree: Vec<usize> = variables.iter().map(|v| v.parents.len()).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut visited = 0;
    while let Some(next) = queue.pop_front() {
        visited += 1;
        for child in &variables[next].children {
            in_degree[child.index()] -= 1;
            if in_degree[child.index()] == 0 {
                queue.push_back(child.index());
            }
        }
    }
    if visited != variables.len() {
        let stuck: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(i, _)| variables[i].name.as_str())
            .collect();
        return Err(InferenceError::Construction(format!(
            "parent graph contains a cycle through {:?}",
            stuck
        )));
    }
    Ok(())
}

fn family_size(variables: &[Variable], variable: &Variable) -> usize {
    variable
        .parents
        .iter()
        .map(|p| variables[p.index()].levels.len())
        .product::<usize>()
        * variable.levels.len()
}

fn encode_table(
    variables: &[Variable],
    variable: &Variable,
    table: &ProbabilityTable,
) -> Result<Vec<f64>, InferenceError> {
    let size = family_size(variables, variable);
    match table {
        ProbabilityTable::Marginal(map) => {
            if !variable.parents.is_empty() {
                return Err(InferenceError::Construction(format!(
                    "variable '{}' has parents but a flat marginal table",
                    variable.name
                )));
            }
            encode_row(variable, map)
        }
        ProbabilityTable::Conditional(rows) => encode_rows(variables, variable, rows, size),
        ProbabilityTable::Potential(values) => {
            if values.len() != size {
                return Err(InferenceError::Construction(format!(
                    "variable '{}' potential has {} entries, expected {}",
                    variable.name,
                    values.len(),
                    size
                )));
            }
            Ok(values.clone())
        }
        ProbabilityTable::Distribution(distribution) => {
            let parent_names: Vec<&str> = variable
                .parents
                .iter()
                .map(|p| variables[p.index()].name.as_str())
                .collect();
            let parent_levels: Vec<&[String]> = variable
                .parents
                .iter()
                .map(|p| variables[p.index()].levels.as_slice())
                .collect();
            distribution
                .family_potential(&variable.name, &variable.levels, &parent_names, &parent_levels)
                .map_err(|err| {
                    InferenceError::Construction(format!(
                        "variable '{}' distribution does not match its definition: {}",
                        variable.name, err
                    ))
                })
        }
    }
}

fn encode_row(variable: &Variable, map: &BTreeMap<String, f64>) -> Result<Vec<f64>, InferenceError> {
    let mut row = vec![0.0; variable.levels.len()];
    for (state, probability) in map {
        let slot = variable.level_index(state).ok_or_else(|| {
            InferenceError::Construction(format!(
                "variable '{}' table names unknown state '{}'",
                variable.name, state
            ))
        })?;
        row[slot] = *probability;
    }
    Ok(row)
}

fn encode_rows(
    variables: &[Variable],
    variable: &Variable,
    rows: &[CptRow],
    size: usize,
) -> Result<Vec<f64>, InferenceError> {
    let cardinality = variable.levels.len();
    let mut cpt = vec![0.0; size];
    let mut covered = vec![false; size / cardinality];

    for row in rows {
        if row.when.len() != variable.parents.len() {
            return Err(InferenceError::Construction(format!(
                "variable '{}' row {:?} must assign exactly its {} parents",
                variable.name,
                row.when,
                variable.parents.len()
            )));
        }
        let mut block = 0;
        let mut stride = 1;
        for parent in &variable.parents {
            let parent_var = &variables[parent.index()];
            let state = row.when.get(&parent_var.name).ok_or_else(|| {
                InferenceError::Construction(format!(
                    "variable '{}' row {:?} does not assign parent '{}'",
                    variable.name, row.when, parent_var.name
                ))
            })?;
            let level = parent_var.level_index(state).ok_or_else(|| {
                InferenceError::Construction(format!(
                    "variable '{}' row assigns unknown state '{}' to parent '{}'",
                    variable.name, state, parent_var.name
                ))
            })?;
            block += level * stride;
            stride *= parent_var.levels.len();
        }
        if std::mem::replace(&mut covered[block], true) {
            return Err(InferenceError::Construction(format!(
                "variable '{}' has two rows for parent assignment {:?}",
                variable.name, row.when
            )));
        }
        let encoded = encode_row(variable, &row.then)?;
        cpt[block * cardinality..(block + 1) * cardinality].copy_from_slice(&encoded);
    }

    if let Some(missing) = covered.iter().position(|c| !c) {
        return Err(InferenceError::Construction(format!(
            "variable '{}' is missing the CPT row for parent combination #{}",
            variable.name, missing
        )));
    }
    Ok(cpt)
}

fn normalize_rows(
    variable: &Variable,
    mut cpt: Vec<f64>,
    tolerance: f64,
) -> Result<Vec<f64>, InferenceError> {
    if let Some(bad) = cpt.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(InferenceError::Construction(format!(
            "variable '{}' table contains invalid probability {}",
            variable.name, bad
        )));
    }
    for row in cpt.chunks_mut(variable.levels.len()) {
        let total: f64 = row.iter().sum();
        if total <= 0.0 {
            return Err(InferenceError::Construction(format!(
                "variable '{}' has a CPT row summing to 0",
                variable.name
            )));
        }
        if (total - 1.0).abs() > tolerance {
            row.iter_mut().for_each(|p| *p /= total);
        }
    }
    Ok(cpt)
}

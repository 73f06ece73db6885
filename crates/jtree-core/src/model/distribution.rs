//! # Distributions
//!
//! A [`Distribution`] is a (conditional) probability table `P(head | parents)`
//! over named, finite variables. It is what the engine returns for joint and
//! per-variable queries, and what callers hand back to replace a CPT.
//!
//! ## Layout
//!
//! The potential is one flat array over `head ++ parents`, mixed-radix with
//! the first head variable as the least-significant digit. Each contiguous
//! block of `head_size()` entries is the head distribution for one parent
//! combination and sums to 1 (or is entirely 0 when that combination is
//! impossible).
//!
//! ## Structural edits
//!
//! Adding or removing variables and levels never patches entries in place: the
//! new array is derived from the old one (embedding, summing or dropping
//! entries) and then renormalized block by block. Adding a variable or level
//! and removing it again restores the original potential.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::engine::errors::InferenceError;
use crate::model::network::VarId;
use crate::potential::kernels;

/// A partial assignment of states to variables, keyed by variable name.
pub type Event = BTreeMap<String, String>;

/// Builds an [`Event`] from `(variable, state)` pairs.
pub fn event<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Event {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A named variable and its ordered levels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributionVariable {
    /// Variable name.
    pub name: String,
    /// Ordered state labels.
    pub levels: Vec<String>,
}

impl DistributionVariable {
    /// Builds a variable from a name and its levels.
    pub fn new<L: Into<String>>(name: impl Into<String>, levels: impl IntoIterator<Item = L>) -> Self {
        Self {
            name: name.into(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    fn level_index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }
}

/// Lossless structural dump of a [`Distribution`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributionDump {
    /// Head variables.
    pub head: Vec<DistributionVariable>,
    /// Parent variables.
    pub parents: Vec<DistributionVariable>,
    /// Flat potential (see module docs for the layout).
    pub potential: Vec<f64>,
}

/// `P(head | parents)` as a flat table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distribution {
    head: Vec<DistributionVariable>,
    parents: Vec<DistributionVariable>,
    potential: Vec<f64>,
}

impl Distribution {
    /// Validates the parts and normalizes every head block.
    pub fn new(
        head: Vec<DistributionVariable>,
        parents: Vec<DistributionVariable>,
        potential: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        if head.is_empty() {
            return Err(InferenceError::Query(
                "a distribution needs at least one head variable".into(),
            ));
        }
        let mut names: Vec<&str> = Vec::with_capacity(head.len() + parents.len());
        for variable in head.iter().chain(&parents) {
            if names.contains(&variable.name.as_str()) {
                return Err(InferenceError::Query(format!(
                    "variable '{}' appears twice in distribution",
                    variable.name
                )));
            }
            names.push(&variable.name);
            validate_levels(variable)?;
        }
        let mut distribution = Self {
            head,
            parents,
            potential,
        };
        let expected = distribution.head_size() * distribution.parent_size();
        if distribution.potential.len() != expected {
            return Err(InferenceError::Query(format!(
                "distribution potential has {} entries, expected {}",
                distribution.potential.len(),
                expected
            )));
        }
        if let Some(bad) = distribution
            .potential
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0)
        {
            return Err(InferenceError::Numerical(format!(
                "distribution contains invalid probability {}",
                bad
            )));
        }
        distribution.normalize_blocks(false);
        Ok(distribution)
    }

    /// Rebuilds a distribution from its dump.
    pub fn from_dump(dump: &DistributionDump) -> Result<Self, InferenceError> {
        Self::new(dump.head.clone(), dump.parents.clone(), dump.potential.clone())
    }

    /// Lossless structural dump.
    pub fn dump(&self) -> DistributionDump {
        DistributionDump {
            head: self.head.clone(),
            parents: self.parents.clone(),
            potential: self.potential.clone(),
        }
    }

    /// Head variables.
    pub fn head(&self) -> &[DistributionVariable] {
        &self.head
    }

    /// Parent (conditioning) variables.
    pub fn parents(&self) -> &[DistributionVariable] {
        &self.parents
    }

    /// Flat potential.
    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    /// Number of head combinations (length of one block).
    pub fn head_size(&self) -> usize {
        self.head.iter().map(|v| v.levels.len()).product()
    }

    /// Number of parent combinations (number of blocks).
    pub fn parent_size(&self) -> usize {
        self.parents.iter().map(|v| v.levels.len()).product()
    }

    /// Whether `name` is a head variable.
    pub fn is_head(&self, name: &str) -> bool {
        self.head.iter().any(|v| v.name == name)
    }

    /// Whether `name` is a parent variable.
    pub fn is_parent(&self, name: &str) -> bool {
        self.parents.iter().any(|v| v.name == name)
    }

    /// Levels of a head or parent variable.
    pub fn levels(&self, name: &str) -> Result<&[String], InferenceError> {
        self.variables()
            .find(|v| v.name == name)
            .map(|v| v.levels.as_slice())
            .ok_or_else(|| InferenceError::UnknownVariable(name.to_string()))
    }

    /// Head then parent variables, in layout order.
    pub fn variables(&self) -> impl Iterator<Item = &DistributionVariable> {
        self.head.iter().chain(&self.parents)
    }

    /// `P(event | evidence)`.
    ///
    /// `event` assigns a subset of the head variables (unassigned ones are
    /// summed out); `evidence` must assign every parent. A state outside a
    /// variable's levels yields 0. Unknown variables are errors.
    pub fn infer(&self, event: &Event, evidence: &Event) -> Result<f64, InferenceError> {
        let mut fixed: Vec<Option<usize>> = vec![None; self.head.len() + self.parents.len()];

        for (name, state) in event {
            let Some(slot) = self.head.iter().position(|v| v.name == *name) else {
                return Err(if self.is_parent(name) {
                    InferenceError::Query(format!(
                        "'{}' is a parent of this distribution, not a head variable",
                        name
                    ))
                } else {
                    InferenceError::UnknownVariable(name.clone())
                });
            };
            match self.head[slot].level_index(state) {
                Some(level) => fixed[slot] = Some(level),
                None => return Ok(0.0),
            }
        }

        for (name, state) in evidence {
            let Some(slot) = self.parents.iter().position(|v| v.name == *name) else {
                return Err(if self.is_head(name) {
                    InferenceError::Query(format!(
                        "'{}' is a head variable of this distribution, not a parent",
                        name
                    ))
                } else {
                    InferenceError::UnknownVariable(name.clone())
                });
            };
            match self.parents[slot].level_index(state) {
                Some(level) => fixed[self.head.len() + slot] = Some(level),
                None => return Ok(0.0),
            }
        }
        if let Some(missing) = self
            .parents
            .iter()
            .enumerate()
            .find(|(slot, _)| fixed[self.head.len() + slot].is_none())
        {
            return Err(InferenceError::Query(format!(
                "evidence does not assign parent '{}'",
                missing.1.name
            )));
        }

        let cards = self.cards();
        let mut combination = vec![0; cards.len()];
        let mut total = 0.0;
        for (index, value) in self.potential.iter().enumerate() {
            decode(index, &cards, &mut combination);
            if fixed
                .iter()
                .zip(&combination)
                .all(|(want, have)| want.map_or(true, |w| w == *have))
            {
                total += value;
            }
        }
        Ok(total)
    }

    /// Adds a head variable, spreading each entry uniformly over its levels.
    pub fn add_head_variable(&mut self, variable: DistributionVariable) -> Result<(), InferenceError> {
        self.check_new_name(&variable.name)?;
        validate_levels(&variable)?;
        let k = variable.levels.len() as f64;
        let position = self.head.len();
        let old = self.clone();
        self.head.push(variable);
        self.rebuild(|combination| {
            let mut source = combination.to_vec();
            source.remove(position);
            old.value(&source) / k
        });
        Ok(())
    }

    /// Adds a parent variable; every row is the same for each of its levels.
    pub fn add_parent_variable(&mut self, variable: DistributionVariable) -> Result<(), InferenceError> {
        self.check_new_name(&variable.name)?;
        validate_levels(&variable)?;
        let position = self.head.len() + self.parents.len();
        let old = self.clone();
        self.parents.push(variable);
        self.rebuild(|combination| {
            let mut source = combination.to_vec();
            source.remove(position);
            old.value(&source)
        });
        Ok(())
    }

    /// Removes a head variable (summing it out) or a parent variable
    /// (averaging over its levels).
    pub fn remove_variable(&mut self, name: &str) -> Result<(), InferenceError> {
        let position = self.position(name)?;
        if position < self.head.len() && self.head.len() == 1 {
            return Err(InferenceError::Query(format!(
                "cannot remove '{}', the only head variable",
                name
            )));
        }
        let old = self.clone();
        let card = old.cards()[position];
        if position < self.head.len() {
            self.head.remove(position);
        } else {
            self.parents.remove(position - old.head.len());
        }
        self.rebuild(|combination| {
            let mut source = combination.to_vec();
            source.insert(position, 0);
            (0..card)
                .map(|state| {
                    source[position] = state;
                    old.value(&source)
                })
                .sum()
        });
        Ok(())
    }

    /// Appends a level. A new head level gets probability 0; a new parent
    /// level gets a uniform head distribution.
    pub fn add_level(&mut self, name: &str, level: impl Into<String>) -> Result<(), InferenceError> {
        let level = level.into();
        let position = self.position(name)?;
        if self.variable_at(position).level_index(&level).is_some() {
            return Err(InferenceError::Query(format!(
                "variable '{}' already has level '{}'",
                name, level
            )));
        }
        let old = self.clone();
        let new_state = old.cards()[position];
        let is_head = position < self.head.len();
        let uniform = 1.0 / self.head_size() as f64;
        self.variable_at_mut(position).levels.push(level);
        self.rebuild(|combination| {
            if combination[position] == new_state {
                if is_head {
                    0.0
                } else {
                    uniform
                }
            } else {
                old.value(combination)
            }
        });
        Ok(())
    }

    /// Removes a level, dropping its entries. Head blocks are renormalized; a
    /// block whose whole mass sat on the removed level becomes uniform.
    pub fn remove_level(&mut self, name: &str, level: &str) -> Result<(), InferenceError> {
        let position = self.position(name)?;
        let removed = self
            .variable_at(position)
            .level_index(level)
            .ok_or_else(|| InferenceError::UnknownLevel {
                variable: name.to_string(),
                level: level.to_string(),
            })?;
        if self.variable_at(position).levels.len() == 1 {
            return Err(InferenceError::Query(format!(
                "cannot remove '{}', the only level of '{}'",
                level, name
            )));
        }
        let old = self.clone();
        self.variable_at_mut(position).levels.remove(removed);
        self.rebuild_with(true, |combination| {
            let mut source = combination.to_vec();
            if source[position] >= removed {
                source[position] += 1;
            }
            old.value(&source)
        });
        Ok(())
    }

    /// Renames a variable.
    pub fn rename_variable(&mut self, old: &str, new: impl Into<String>) -> Result<(), InferenceError> {
        let new = new.into();
        let position = self.position(old)?;
        if old != new {
            self.check_new_name(&new)?;
        }
        self.variable_at_mut(position).name = new;
        Ok(())
    }

    /// Renames a level of a variable.
    pub fn rename_level(
        &mut self,
        name: &str,
        old: &str,
        new: impl Into<String>,
    ) -> Result<(), InferenceError> {
        let new = new.into();
        let position = self.position(name)?;
        let variable = self.variable_at_mut(position);
        let slot = variable
            .level_index(old)
            .ok_or_else(|| InferenceError::UnknownLevel {
                variable: name.to_string(),
                level: old.to_string(),
            })?;
        if old != new && variable.level_index(&new).is_some() {
            return Err(InferenceError::Query(format!(
                "variable '{}' already has level '{}'",
                name, new
            )));
        }
        variable.levels[slot] = new;
        Ok(())
    }

    /// Stable human-readable description: the signature, then one line per
    /// parent combination.
    pub fn describe(&self) -> String {
        let mut out = String::from("P(");
        out.push_str(
            &self
                .head
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        if !self.parents.is_empty() {
            out.push_str(" | ");
            out.push_str(
                &self
                    .parents
                    .iter()
                    .map(|v| v.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        out.push_str(")\n");

        let cards = self.cards();
        let mut combination = vec![0; cards.len()];
        for (index, value) in self.potential.iter().enumerate() {
            decode(index, &cards, &mut combination);
            let labels: Vec<String> = self
                .variables()
                .zip(&combination)
                .map(|(v, state)| format!("{}={}", v.name, v.levels[*state]))
                .collect();
            let _ = writeln!(out, "  {}: {:.6}", labels.join(" "), value);
        }
        out
    }

    /// The CPT of a single-variable family in `[head, parents...]` order, for
    /// the given parent order. Fails unless the head is exactly `name` with
    /// `levels` and the parents are exactly `parent_names` with matching levels.
    pub fn family_potential(
        &self,
        name: &str,
        levels: &[String],
        parent_names: &[&str],
        parent_levels: &[&[String]],
    ) -> Result<Vec<f64>, InferenceError> {
        if self.head.len() != 1 || self.head[0].name != name || self.head[0].levels != levels {
            return Err(InferenceError::Query(format!(
                "distribution head must be exactly '{}' with levels {:?}",
                name, levels
            )));
        }
        if self.parents.len() != parent_names.len() {
            return Err(InferenceError::Query(format!(
                "distribution parents must be exactly {:?}",
                parent_names
            )));
        }
        // Layout positions double as local variable ids for the permutation.
        let mut from: Vec<(VarId, usize)> = vec![(VarId(0), levels.len())];
        let mut to: Vec<(VarId, usize)> = vec![(VarId(0), levels.len())];
        for (position, parent) in self.parents.iter().enumerate() {
            from.push((VarId(position as u32 + 1), parent.levels.len()));
        }
        for (wanted, wanted_levels) in parent_names.iter().zip(parent_levels) {
            let position = self
                .parents
                .iter()
                .position(|p| p.name == *wanted)
                .ok_or_else(|| {
                    InferenceError::Query(format!(
                        "distribution does not condition on parent '{}'",
                        wanted
                    ))
                })?;
            if self.parents[position].levels.as_slice() != *wanted_levels {
                return Err(InferenceError::Query(format!(
                    "parent '{}' levels {:?} do not match {:?}",
                    wanted, self.parents[position].levels, wanted_levels
                )));
            }
            to.push((VarId(position as u32 + 1), wanted_levels.len()));
        }
        Ok(kernels::permute(&from, &self.potential, &to))
    }

    fn cards(&self) -> Vec<usize> {
        self.variables().map(|v| v.levels.len()).collect()
    }

    fn value(&self, combination: &[usize]) -> f64 {
        let mut index = 0;
        let mut stride = 1;
        for (state, variable) in combination.iter().zip(self.variables()) {
            index += state * stride;
            stride *= variable.levels.len();
        }
        self.potential[index]
    }

    fn position(&self, name: &str) -> Result<usize, InferenceError> {
        self.variables()
            .position(|v| v.name == name)
            .ok_or_else(|| InferenceError::UnknownVariable(name.to_string()))
    }

    fn variable_at(&self, position: usize) -> &DistributionVariable {
        if position < self.head.len() {
            &self.head[position]
        } else {
            &self.parents[position - self.head.len()]
        }
    }

    fn variable_at_mut(&mut self, position: usize) -> &mut DistributionVariable {
        if position < self.head.len() {
            &mut self.head[position]
        } else {
            let offset = position - self.head.len();
            &mut self.parents[offset]
        }
    }

    fn check_new_name(&self, name: &str) -> Result<(), InferenceError> {
        if self.variables().any(|v| v.name == name) {
            return Err(InferenceError::Query(format!(
                "distribution already has a variable '{}'",
                name
            )));
        }
        Ok(())
    }

    fn rebuild(&mut self, value_of: impl FnMut(&[usize]) -> f64) {
        self.rebuild_with(false, value_of);
    }

    /// Recomputes the potential from the current variable layout, then
    /// renormalizes each head block.
    fn rebuild_with(&mut self, uniform_if_empty: bool, mut value_of: impl FnMut(&[usize]) -> f64) {
        let cards = self.cards();
        let size: usize = cards.iter().product();
        let mut combination = vec![0; cards.len()];
        self.potential = (0..size)
            .map(|index| {
                decode(index, &cards, &mut combination);
                value_of(&combination)
            })
            .collect();
        self.normalize_blocks(uniform_if_empty);
    }

    fn normalize_blocks(&mut self, uniform_if_empty: bool) {
        let block = self.head_size();
        for row in self.potential.chunks_mut(block) {
            if kernels::normalize(row) <= 0.0 && uniform_if_empty {
                row.iter_mut().for_each(|p| *p = 1.0 / block as f64);
            }
        }
    }
}

fn validate_levels(variable: &DistributionVariable) -> Result<(), InferenceError> {
    if variable.levels.is_empty() {
        return Err(InferenceError::Query(format!(
            "variable '{}' has no levels",
            variable.name
        )));
    }
    for (i, level) in variable.levels.iter().enumerate() {
        if variable.levels[..i].contains(level) {
            return Err(InferenceError::Query(format!(
                "variable '{}' lists level '{}' twice",
                variable.name, level
            )));
        }
    }
    Ok(())
}

fn decode(mut index: usize, cards: &[usize], combination: &mut [usize]) {
    for (slot, card) in combination.iter_mut().zip(cards) {
        *slot = index % card;
        index /= card;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass() -> Distribution {
        Distribution::new(
            vec![DistributionVariable::new("GRASS_WET", ["T", "F"])],
            vec![
                DistributionVariable::new("SPRINKLER", ["T", "F"]),
                DistributionVariable::new("RAIN", ["T", "F"]),
            ],
            vec![0.99, 0.01, 0.8, 0.2, 0.9, 0.1, 0.0, 1.0],
        )
        .expect("distribution")
    }

    fn assert_potential_close(a: &Distribution, b: &Distribution) {
        assert_eq!(a.head(), b.head());
        assert_eq!(a.parents(), b.parents());
        for (x, y) in a.potential().iter().zip(b.potential()) {
            assert!((x - y).abs() < 1e-12, "{} != {}", x, y);
        }
    }

    #[test]
    fn new_normalizes_blocks() {
        let d = Distribution::new(
            vec![DistributionVariable::new("X", ["a", "b"])],
            vec![],
            vec![1.0, 3.0],
        )
        .expect("distribution");
        assert_eq!(d.potential(), &[0.25, 0.75]);
    }

    #[test]
    fn new_rejects_bad_shapes() {
        assert!(Distribution::new(vec![], vec![], vec![1.0]).is_err());
        assert!(Distribution::new(
            vec![DistributionVariable::new("X", ["a", "b"])],
            vec![],
            vec![1.0],
        )
        .is_err());
        assert!(Distribution::new(
            vec![DistributionVariable::new("X", ["a"])],
            vec![DistributionVariable::new("X", ["a"])],
            vec![1.0],
        )
        .is_err());
    }

    #[test]
    fn infer_conditions_on_parents() {
        let d = grass();
        let p = d
            .infer(
                &event([("GRASS_WET", "T")]),
                &event([("SPRINKLER", "F"), ("RAIN", "T")]),
            )
            .expect("infer");
        assert!((p - 0.8).abs() < 1e-12);
    }

    #[test]
    fn infer_requires_every_parent() {
        let d = grass();
        let err = d
            .infer(&event([("GRASS_WET", "T")]), &event([("RAIN", "T")]))
            .unwrap_err();
        assert!(matches!(err, InferenceError::Query(_)));
    }

    #[test]
    fn infer_out_of_domain_state_is_zero() {
        let d = grass();
        let p = d
            .infer(
                &event([("GRASS_WET", "MAYBE")]),
                &event([("SPRINKLER", "F"), ("RAIN", "T")]),
            )
            .expect("infer");
        assert_eq!(p, 0.0);
        assert!(matches!(
            d.infer(&event([("SNOW", "T")]), &Event::new()),
            Err(InferenceError::UnknownVariable(_))
        ));
    }

    #[test]
    fn add_then_remove_head_variable_recovers_potential() {
        let original = grass();
        let mut edited = original.clone();
        edited
            .add_head_variable(DistributionVariable::new("MUD", ["yes", "no", "maybe"]))
            .expect("add");
        assert_eq!(edited.head_size(), 6);
        edited.remove_variable("MUD").expect("remove");
        assert_potential_close(&edited, &original);
    }

    #[test]
    fn add_then_remove_parent_variable_recovers_potential() {
        let original = grass();
        let mut edited = original.clone();
        edited
            .add_parent_variable(DistributionVariable::new("SEASON", ["wet", "dry"]))
            .expect("add");
        assert_eq!(edited.parent_size(), 8);
        edited.remove_variable("SEASON").expect("remove");
        assert_potential_close(&edited, &original);
    }

    #[test]
    fn add_then_remove_level_recovers_potential() {
        let original = grass();
        for name in ["GRASS_WET", "RAIN"] {
            let mut edited = original.clone();
            edited.add_level(name, "UNKNOWN").expect("add");
            edited.remove_level(name, "UNKNOWN").expect("remove");
            assert_potential_close(&edited, &original);
        }
    }

    #[test]
    fn added_parent_level_is_uniform() {
        let mut d = grass();
        d.add_level("RAIN", "DRIZZLE").expect("add");
        let p = d
            .infer(
                &event([("GRASS_WET", "T")]),
                &event([("SPRINKLER", "T"), ("RAIN", "DRIZZLE")]),
            )
            .expect("infer");
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn removing_a_head_level_renormalizes() {
        let mut d = grass();
        d.add_level("GRASS_WET", "DAMP").expect("add");
        d.remove_level("GRASS_WET", "F").expect("remove");
        // The (SPRINKLER=F, RAIN=F) row had all its mass on F.
        let p = d
            .infer(
                &event([("GRASS_WET", "T")]),
                &event([("SPRINKLER", "F"), ("RAIN", "F")]),
            )
            .expect("infer");
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn removing_a_parent_averages_rows() {
        let mut d = grass();
        d.remove_variable("SPRINKLER").expect("remove");
        let p = d
            .infer(&event([("GRASS_WET", "T")]), &event([("RAIN", "T")]))
            .expect("infer");
        assert!((p - (0.99 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn renames_are_checked() {
        let mut d = grass();
        d.rename_variable("RAIN", "PRECIPITATION").expect("rename");
        assert!(d.is_parent("PRECIPITATION"));
        assert!(d.rename_variable("SPRINKLER", "PRECIPITATION").is_err());
        d.rename_level("GRASS_WET", "T", "wet").expect("rename level");
        assert_eq!(d.levels("GRASS_WET").expect("levels"), &["wet", "F"]);
        assert!(d.rename_level("GRASS_WET", "F", "wet").is_err());
    }

    #[test]
    fn dump_round_trip_preserves_description() {
        let d = grass();
        let restored = Distribution::from_dump(&d.dump()).expect("restore");
        assert_eq!(restored, d);
        assert_eq!(restored.describe(), d.describe());
        assert!(d.describe().starts_with("P(GRASS_WET | SPRINKLER, RAIN)\n"));
    }

    #[test]
    fn family_potential_reorders_parents() {
        let d = grass();
        let levels = vec!["T".to_string(), "F".to_string()];
        let cpt = d
            .family_potential("GRASS_WET", &levels, &["RAIN", "SPRINKLER"], &[&levels, &levels])
            .expect("family");
        // Layout [GRASS_WET, RAIN, SPRINKLER]: (RAIN=F, SPRINKLER=T) sits at block 1.
        assert_eq!(&cpt[2..4], &[0.9, 0.1]);
        assert_eq!(&cpt[4..6], &[0.8, 0.2]);
    }
}

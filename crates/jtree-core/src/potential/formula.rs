//! # Formula DAG
//!
//! Every potential the engine manipulates (node CPTs, evidence placeholders,
//! clique priors, messages, posteriors) is a node in one shared, append-only
//! expression graph.
//!
//! ## Design
//!
//! - Formulas live in an arena and are addressed by [`FormulaId`]. A formula's
//!   children always have smaller ids, so the graph is acyclic by construction.
//! - Every formula has a canonical name derived from its kind and its children.
//!   [`FormulaStore`] de-duplicates on that name, so structurally identical
//!   terms share one id (and one cached value).
//! - Smart constructors ([`mult`](FormulaStore::mult),
//!   [`marginal`](FormulaStore::marginal), [`reference`](FormulaStore::reference))
//!   elide units, collapse reference chains and skip no-op marginals.
//! - Reverse edges are recorded for diagnostics only; nothing is ever removed.
//! - Evaluated values are memoized per id (see `evaluate`).

use std::fmt::Write as _;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::model::network::VarId;
use crate::potential::domain::Domain;

/// Identifier of a formula in a [`FormulaStore`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaId(pub u32);

impl FormulaId {
    /// Position of the formula in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a formula, carrying only the fields that kind needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaKind {
    /// One variable's CPT over its family.
    NodePotential {
        /// Owning variable.
        variable: VarId,
    },
    /// Per-state evidence weight of one variable (uniform when unset).
    EvidenceFunction {
        /// Observed variable.
        variable: VarId,
    },
    /// Normalized pointwise product of its factors.
    Product {
        /// Factor ids in ascending order.
        factors: SmallVec<[FormulaId; 4]>,
    },
    /// Normalized sum of `source` down to `retained ∩ source.domain`.
    Marginal {
        /// Summed formula.
        source: FormulaId,
        /// Separator set the marginal keeps.
        retained: Domain,
    },
    /// Neutral singleton; evaluates to an empty array.
    Unit,
    /// Transparent alias of `target`.
    Reference {
        /// Aliased formula (never a `Unit` or another `Reference`).
        target: FormulaId,
    },
}

/// A node of the formula DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Arena id.
    pub id: FormulaId,
    /// Canonical name used for de-duplication.
    pub name: String,
    /// Sorted dependent variables.
    pub domain: Domain,
    /// Kind and children.
    pub kind: FormulaKind,
}

impl Formula {
    /// Number of entries in the evaluated array.
    pub fn size(&self) -> usize {
        match self.kind {
            FormulaKind::Unit => 0,
            _ => self.domain.size(),
        }
    }

    /// Direct children.
    pub fn children(&self) -> SmallVec<[FormulaId; 4]> {
        match &self.kind {
            FormulaKind::Product { factors } => factors.clone(),
            FormulaKind::Marginal { source, .. } => SmallVec::from_slice(&[*source]),
            FormulaKind::Reference { target } => SmallVec::from_slice(&[*target]),
            FormulaKind::NodePotential { .. }
            | FormulaKind::EvidenceFunction { .. }
            | FormulaKind::Unit => SmallVec::new(),
        }
    }
}

/// Append-only, name-de-duplicated arena of formulas with a value cache.
#[derive(Debug, Clone)]
pub struct FormulaStore {
    formulas: Vec<Formula>,
    by_name: FxHashMap<String, FormulaId>,
    dependents: Vec<SmallVec<[FormulaId; 4]>>,
    pub(crate) cache: Vec<Option<Arc<[f64]>>>,
    unit: FormulaId,
}

impl Default for FormulaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaStore {
    /// Creates a store holding only the unit formula.
    pub fn new() -> Self {
        let mut store = Self {
            formulas: Vec::new(),
            by_name: FxHashMap::default(),
            dependents: Vec::new(),
            cache: Vec::new(),
            unit: FormulaId(0),
        };
        store.unit = store.upsert(FormulaKind::Unit, Domain::empty());
        store
    }

    /// Number of formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// Whether the store is empty. Never true: the unit formula always exists.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// The formula with the given id.
    #[inline]
    pub fn get(&self, id: FormulaId) -> &Formula {
        &self.formulas[id.index()]
    }

    /// All formulas in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.formulas.iter()
    }

    /// Looks up a formula by canonical name.
    pub fn find(&self, name: &str) -> Option<FormulaId> {
        self.by_name.get(name).copied()
    }

    /// Formulas that list `id` as a direct child.
    pub fn dependents(&self, id: FormulaId) -> &[FormulaId] {
        &self.dependents[id.index()]
    }

    /// The unit formula.
    #[inline]
    pub fn unit(&self) -> FormulaId {
        self.unit
    }

    /// Inserts a formula unless one with the same canonical name exists.
    pub fn upsert(&mut self, kind: FormulaKind, domain: Domain) -> FormulaId {
        let name = canonical_name(&kind);
        if let Some(existing) = self.by_name.get(&name) {
            return *existing;
        }
        let id = FormulaId(self.formulas.len() as u32);
        let formula = Formula {
            id,
            name: name.clone(),
            domain,
            kind,
        };
        for child in formula.children() {
            debug_assert!(child < id, "formula children must precede their parents");
            self.dependents[child.index()].push(id);
        }
        self.formulas.push(formula);
        self.dependents.push(SmallVec::new());
        self.cache.push(None);
        self.by_name.insert(name, id);
        id
    }

    /// CPT placeholder for `variable` over its family domain.
    pub fn node_potential(&mut self, variable: VarId, family: Domain) -> FormulaId {
        self.upsert(FormulaKind::NodePotential { variable }, family)
    }

    /// Evidence placeholder for `variable`.
    pub fn evidence_function(&mut self, variable: VarId, cardinality: usize) -> FormulaId {
        self.upsert(
            FormulaKind::EvidenceFunction { variable },
            Domain::new([(variable, cardinality)]),
        )
    }

    /// Product of `factors`. Units are dropped, references resolved, an empty
    /// product is the unit and a single factor is returned unchanged.
    pub fn mult(&mut self, factors: impl IntoIterator<Item = FormulaId>) -> FormulaId {
        let mut resolved: SmallVec<[FormulaId; 4]> = factors
            .into_iter()
            .map(|f| self.resolve(f))
            .filter(|f| *f != self.unit)
            .collect();
        match resolved.len() {
            0 => return self.unit,
            1 => return resolved[0],
            _ => {}
        }
        resolved.sort_unstable();
        let domain = resolved
            .iter()
            .fold(Domain::empty(), |acc, f| acc.union(&self.get(*f).domain));
        self.upsert(FormulaKind::Product { factors: resolved }, domain)
    }

    /// Marginal of `source` onto `retained`. Returns `source` itself when its
    /// domain is already contained in `retained`.
    pub fn marginal(&mut self, source: FormulaId, retained: &Domain) -> FormulaId {
        let source = self.resolve(source);
        let source_domain = &self.get(source).domain;
        if source == self.unit || source_domain.is_subset_of(retained) {
            return source;
        }
        let keep = source_domain.intersection(retained);
        self.upsert(
            FormulaKind::Marginal {
                source,
                retained: keep.clone(),
            },
            keep,
        )
    }

    /// Alias of `target`, collapsed when `target` is the unit or a reference.
    pub fn reference(&mut self, target: FormulaId) -> FormulaId {
        let target = self.resolve(target);
        if target == self.unit {
            return target;
        }
        let domain = self.get(target).domain.clone();
        self.upsert(FormulaKind::Reference { target }, domain)
    }

    /// Follows reference chains to the aliased formula.
    pub fn resolve(&self, mut id: FormulaId) -> FormulaId {
        while let FormulaKind::Reference { target } = self.get(id).kind {
            id = target;
        }
        id
    }

    /// Drops every cached value.
    pub fn invalidate_all(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(formulas = self.formulas.len(), "invalidating formula cache");
        self.cache.iter_mut().for_each(|slot| *slot = None);
    }

    /// Number of formulas with a cached value.
    pub fn cached_count(&self) -> usize {
        self.cache.iter().filter(|slot| slot.is_some()).count()
    }
}

fn canonical_name(kind: &FormulaKind) -> String {
    match kind {
        FormulaKind::NodePotential { variable } => format!("node({})", variable.0),
        FormulaKind::EvidenceFunction { variable } => format!("evidence({})", variable.0),
        FormulaKind::Product { factors } => {
            let mut name = String::from("mult(");
            for (i, f) in factors.iter().enumerate() {
                if i > 0 {
                    name.push(',');
                }
                let _ = write!(name, "#{}", f.0);
            }
            name.push(')');
            name
        }
        FormulaKind::Marginal { source, retained } => {
            let mut name = format!("marg(#{}|", source.0);
            for (i, v) in retained.vars().iter().enumerate() {
                if i > 0 {
                    name.push(',');
                }
                let _ = write!(name, "{}", v.0);
            }
            name.push(')');
            name
        }
        FormulaKind::Unit => "unit".to_string(),
        FormulaKind::Reference { target } => format!("ref(#{})", target.0),
    }
}

//! Junction-forest construction.
//!
//! Candidate edges join every pair of cliques that share at least one
//! variable, weighted by the size of the shared set. Edges are accepted
//! greedily by descending weight unless they would close a cycle, which yields
//! a maximum-weight spanning forest: one tree per connected component of the
//! moral graph, each satisfying the running-intersection property.

use smallvec::SmallVec;

use crate::engine::errors::InferenceError;
use crate::model::network::{Network, VarId};
use crate::potential::domain::Domain;
use crate::structure::cliques::maximal_cliques;
use crate::structure::moral::moralize;
use crate::structure::triangulate::triangulate;

/// Identifier of a clique in a [`JunctionForest`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CliqueId(pub u32);

impl CliqueId {
    /// Position of the clique in the forest.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a separator in a [`JunctionForest`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeparatorId(pub u32);

impl SeparatorId {
    /// Position of the separator in the forest.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of the junction forest.
#[derive(Debug, Clone, PartialEq)]
pub struct Clique {
    /// Dense id.
    pub id: CliqueId,
    /// Sorted member variables.
    pub domain: Domain,
    /// Adjacent cliques.
    pub neighbors: SmallVec<[CliqueId; 4]>,
    /// Separator shared with each neighbor, co-indexed with `neighbors`.
    pub separators: SmallVec<[SeparatorId; 4]>,
    /// Connected component (tree) of the forest this clique belongs to.
    pub component: usize,
}

impl Clique {
    /// Separator shared with `neighbor`, if adjacent.
    pub fn separator_to(&self, neighbor: CliqueId) -> Option<SeparatorId> {
        self.neighbors
            .iter()
            .position(|n| *n == neighbor)
            .map(|slot| self.separators[slot])
    }
}

/// A de-duplicated variable set shared by adjacent cliques.
#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    /// Dense id.
    pub id: SeparatorId,
    /// Shared variables.
    pub domain: Domain,
    /// Every forest edge carrying this variable set.
    pub links: Vec<(CliqueId, CliqueId)>,
}

/// The compiled clique forest of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionForest {
    cliques: Vec<Clique>,
    separators: Vec<Separator>,
    components: Vec<Vec<CliqueId>>,
    fill_edges: usize,
}

impl JunctionForest {
    /// All cliques.
    pub fn cliques(&self) -> &[Clique] {
        &self.cliques
    }

    /// The clique with the given id.
    #[inline]
    pub fn clique(&self, id: CliqueId) -> &Clique {
        &self.cliques[id.index()]
    }

    /// All separators.
    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    /// The separator with the given id.
    #[inline]
    pub fn separator(&self, id: SeparatorId) -> &Separator {
        &self.separators[id.index()]
    }

    /// Cliques grouped by connected component; the first clique of each group
    /// is the component's propagation root.
    pub fn components(&self) -> &[Vec<CliqueId>] {
        &self.components
    }

    /// Number of fill edges the triangulation added.
    pub fn fill_edge_count(&self) -> usize {
        self.fill_edges
    }

    /// Forest edges as `(low, high, separator)` triples.
    pub fn edges(&self) -> Vec<(CliqueId, CliqueId, SeparatorId)> {
        let mut edges = Vec::new();
        for clique in &self.cliques {
            for (neighbor, separator) in clique.neighbors.iter().zip(&clique.separators) {
                if clique.id < *neighbor {
                    edges.push((clique.id, *neighbor, *separator));
                }
            }
        }
        edges
    }

    /// Cliques whose domain contains `var`.
    pub fn cliques_containing(&self, var: VarId) -> impl Iterator<Item = &Clique> + '_ {
        self.cliques.iter().filter(move |c| c.domain.contains(var))
    }

    /// Smallest clique (by potential size) containing every variable of `vars`.
    pub fn smallest_clique_covering(&self, vars: &Domain) -> Option<CliqueId> {
        self.cliques
            .iter()
            .filter(|c| vars.is_subset_of(&c.domain))
            .min_by_key(|c| (c.domain.size(), c.id))
            .map(|c| c.id)
    }

    /// Checks the running-intersection property: each separator equals the
    /// intersection of the cliques it links, and every variable's cliques form
    /// a connected subtree.
    pub fn has_running_intersection(&self) -> bool {
        for separator in &self.separators {
            for (a, b) in &separator.links {
                if self.clique(*a).domain.intersection(&self.clique(*b).domain) != separator.domain
                {
                    return false;
                }
            }
        }

        let mut vars: Vec<VarId> = self
            .cliques
            .iter()
            .flat_map(|c| c.domain.vars().iter().copied())
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars.into_iter().all(|var| {
            let holders: Vec<CliqueId> = self.cliques_containing(var).map(|c| c.id).collect();
            let mut reached = vec![holders[0]];
            let mut frontier = vec![holders[0]];
            while let Some(next) = frontier.pop() {
                for neighbor in &self.clique(next).neighbors {
                    if self.clique(*neighbor).domain.contains(var) && !reached.contains(neighbor) {
                        reached.push(*neighbor);
                        frontier.push(*neighbor);
                    }
                }
            }
            reached.len() == holders.len()
        })
    }
}

/// Runs the full pipeline: moralize, triangulate, enumerate cliques, and build
/// the maximum-weight spanning forest.
pub fn compile(network: &Network) -> Result<JunctionForest, InferenceError> {
    let moral = moralize(network);
    let triangulation = triangulate(&moral);
    let members = maximal_cliques(&triangulation.graph);
    if members.is_empty() && !network.is_empty() {
        return Err(InferenceError::Internal(
            "clique enumeration produced no cliques for a non-empty network".into(),
        ));
    }

    let mut cliques: Vec<Clique> = members
        .iter()
        .enumerate()
        .map(|(position, vars)| Clique {
            id: CliqueId(position as u32),
            domain: network.domain_of(vars.iter().map(|v| VarId(*v as u32))),
            neighbors: SmallVec::new(),
            separators: SmallVec::new(),
            component: 0,
        })
        .collect();

    let mut candidates = Vec::new();
    for a in 0..cliques.len() {
        for b in a + 1..cliques.len() {
            let shared = cliques[a].domain.intersection(&cliques[b].domain);
            if !shared.is_empty() {
                candidates.push((shared.len(), a, b, shared));
            }
        }
    }
    candidates.sort_by(|x, y| y.0.cmp(&x.0).then((x.1, x.2).cmp(&(y.1, y.2))));

    let mut sets = DisjointSets::new(cliques.len());
    let mut separators: Vec<Separator> = Vec::new();
    for (_, a, b, shared) in candidates {
        if !sets.union(a, b) {
            continue;
        }
        let separator = match separators.iter().position(|s| s.domain == shared) {
            Some(existing) => existing,
            None => {
                separators.push(Separator {
                    id: SeparatorId(separators.len() as u32),
                    domain: shared,
                    links: Vec::new(),
                });
                separators.len() - 1
            }
        };
        let (ca, cb) = (CliqueId(a as u32), CliqueId(b as u32));
        separators[separator].links.push((ca, cb));
        let separator = SeparatorId(separator as u32);
        cliques[a].neighbors.push(cb);
        cliques[a].separators.push(separator);
        cliques[b].neighbors.push(ca);
        cliques[b].separators.push(separator);
    }

    let components = label_components(&mut cliques);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        cliques = cliques.len(),
        separators = separators.len(),
        components = components.len(),
        fill_edges = triangulation.fill_edges.len(),
        "junction forest compiled"
    );

    Ok(JunctionForest {
        cliques,
        separators,
        components,
        fill_edges: triangulation.fill_edges.len(),
    })
}

fn label_components(cliques: &mut [Clique]) -> Vec<Vec<CliqueId>> {
    let mut assigned = vec![false; cliques.len()];
    let mut components = Vec::new();
    for root in 0..cliques.len() {
        if assigned[root] {
            continue;
        }
        let component = components.len();
        let mut members = Vec::new();
        let mut stack = vec![root];
        assigned[root] = true;
        while let Some(next) = stack.pop() {
            cliques[next].component = component;
            members.push(CliqueId(next as u32));
            for neighbor in cliques[next].neighbors.clone() {
                if !assigned[neighbor.index()] {
                    assigned[neighbor.index()] = true;
                    stack.push(neighbor.index());
                }
            }
        }
        components.push(members);
    }
    components
}

/// Union-find over clique indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b`; false if already merged.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[rb.max(ra)] = ra.min(rb);
        true
    }
}

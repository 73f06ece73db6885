//! Mixed-radix variable domains.
//!
//! A [`Domain`] is a sorted, de-duplicated set of variables together with their
//! level counts. Potentials over a domain are flat arrays indexed by the
//! mixed-radix encoding of a state combination, with the *first* (smallest id)
//! variable as the least-significant digit. Index <-> combination is an exact
//! bijection over `[0, size)`.

use smallvec::SmallVec;

use crate::model::network::VarId;

/// Inline capacity for per-domain vectors. Cliques wider than this spill to the heap.
pub(crate) const INLINE_DOMAIN: usize = 8;

/// Sorted set of variables with their cardinalities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Domain {
    vars: SmallVec<[VarId; INLINE_DOMAIN]>,
    cards: SmallVec<[usize; INLINE_DOMAIN]>,
}

impl Domain {
    /// Builds a domain from `(variable, cardinality)` pairs in any order.
    /// Duplicates are collapsed.
    pub fn new(entries: impl IntoIterator<Item = (VarId, usize)>) -> Self {
        let mut entries: SmallVec<[(VarId, usize); INLINE_DOMAIN]> = entries.into_iter().collect();
        entries.sort_unstable_by_key(|(var, _)| *var);
        entries.dedup_by_key(|(var, _)| *var);
        Self {
            vars: entries.iter().map(|(v, _)| *v).collect(),
            cards: entries.iter().map(|(_, c)| *c).collect(),
        }
    }

    /// The empty domain (a single, empty combination).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Variables in ascending id order.
    #[inline]
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    /// Cardinalities, co-indexed with [`vars`](Self::vars).
    #[inline]
    pub fn cards(&self) -> &[usize] {
        &self.cards
    }

    /// Number of variables.
    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the domain has no variables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Number of state combinations (1 for the empty domain).
    #[inline]
    pub fn size(&self) -> usize {
        self.cards.iter().product()
    }

    /// Position of `var` in the domain.
    #[inline]
    pub fn position(&self, var: VarId) -> Option<usize> {
        self.vars.binary_search(&var).ok()
    }

    /// Whether `var` belongs to the domain.
    #[inline]
    pub fn contains(&self, var: VarId) -> bool {
        self.position(var).is_some()
    }

    /// Cardinality of `var`, if present.
    pub fn cardinality(&self, var: VarId) -> Option<usize> {
        self.position(var).map(|p| self.cards[p])
    }

    /// Whether every variable of `self` is in `other`.
    pub fn is_subset_of(&self, other: &Domain) -> bool {
        self.vars.iter().all(|v| other.contains(*v))
    }

    /// Union of two domains.
    pub fn union(&self, other: &Domain) -> Domain {
        Domain::new(self.entries().chain(other.entries()))
    }

    /// Intersection of two domains.
    pub fn intersection(&self, other: &Domain) -> Domain {
        Domain::new(self.entries().filter(|(v, _)| other.contains(*v)))
    }

    /// Keeps only the variables accepted by `keep`.
    pub fn restrict(&self, mut keep: impl FnMut(VarId) -> bool) -> Domain {
        Domain::new(self.entries().filter(|(v, _)| keep(*v)))
    }

    /// `(variable, cardinality)` pairs in domain order.
    pub fn entries(&self) -> impl Iterator<Item = (VarId, usize)> + '_ {
        self.vars.iter().copied().zip(self.cards.iter().copied())
    }

    /// Mixed-radix strides (first variable has stride 1).
    pub fn strides(&self) -> SmallVec<[usize; INLINE_DOMAIN]> {
        let mut strides = SmallVec::with_capacity(self.cards.len());
        let mut stride = 1;
        for card in &self.cards {
            strides.push(stride);
            stride *= card;
        }
        strides
    }

    /// Encodes a per-variable combination (domain order) into a flat index.
    pub fn encode(&self, combination: &[usize]) -> usize {
        debug_assert_eq!(combination.len(), self.cards.len());
        let mut index = 0;
        let mut stride = 1;
        for (state, card) in combination.iter().zip(&self.cards) {
            index += state * stride;
            stride *= card;
        }
        index
    }

    /// Decodes a flat index into a per-variable combination (domain order).
    pub fn decode(&self, mut index: usize, combination: &mut [usize]) {
        debug_assert_eq!(combination.len(), self.cards.len());
        for (slot, card) in combination.iter_mut().zip(&self.cards) {
            *slot = index % card;
            index /= card;
        }
    }

    /// For every variable of `self`, its stride inside `target`, or 0 when
    /// `target` lacks it. Walking `self` with these strides yields the index of
    /// the matching sub-combination in `target`.
    pub fn projection_strides(&self, target: &Domain) -> SmallVec<[usize; INLINE_DOMAIN]> {
        let target_strides = target.strides();
        self.vars
            .iter()
            .map(|v| target.position(*v).map_or(0, |p| target_strides[p]))
            .collect()
    }
}

/// Walks every combination of a domain in index order and yields the index of
/// the corresponding combination under an alternative stride vector.
///
/// Used to project, embed or permute flat potentials without decoding every
/// index from scratch.
pub(crate) struct StrideWalk<'a> {
    cards: &'a [usize],
    strides: SmallVec<[usize; INLINE_DOMAIN]>,
    digits: SmallVec<[usize; INLINE_DOMAIN]>,
    current: usize,
    remaining: usize,
}

impl<'a> StrideWalk<'a> {
    /// Walks the whole domain.
    pub(crate) fn new(cards: &'a [usize], strides: SmallVec<[usize; INLINE_DOMAIN]>) -> Self {
        let total = cards.iter().product();
        Self::starting_at(cards, strides, 0, total)
    }

    /// Walks `len` combinations starting at flat index `start`.
    pub(crate) fn starting_at(
        cards: &'a [usize],
        strides: SmallVec<[usize; INLINE_DOMAIN]>,
        start: usize,
        len: usize,
    ) -> Self {
        let mut digits: SmallVec<[usize; INLINE_DOMAIN]> = SmallVec::with_capacity(cards.len());
        let mut rest = start;
        let mut current = 0;
        for (card, stride) in cards.iter().zip(&strides) {
            let digit = rest % card;
            rest /= card;
            current += digit * stride;
            digits.push(digit);
        }
        Self {
            cards,
            strides,
            digits,
            current,
            remaining: len,
        }
    }
}

impl Iterator for StrideWalk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current;
        self.remaining -= 1;
        if self.remaining > 0 {
            for k in 0..self.digits.len() {
                self.digits[k] += 1;
                self.current += self.strides[k];
                if self.digits[k] < self.cards[k] {
                    break;
                }
                self.current -= self.strides[k] * self.cards[k];
                self.digits[k] = 0;
            }
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

use alloc::collections::BTreeSet;

use crate::calculus::predicate::Proposition;

/// Set of ground propositions that hold.
///
/// Equality is set equality, so two states built in a
/// different order compare equal.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Default)]
pub struct State {
    propositions: BTreeSet<Proposition>,
}

impl State {
    pub fn with_propositions(mut self, propositions: &[Proposition]) -> Self {
        self.propositions.extend(propositions.iter().cloned());
        self
    }

    pub fn contains(&self, proposition: &Proposition) -> bool {
        self.propositions.contains(proposition)
    }

    /// Returns `true` if the proposition was not in the state yet.
    pub fn insert(&mut self, proposition: Proposition) -> bool {
        self.propositions.insert(proposition)
    }

    /// Returns `true` if the proposition was in the state.
    pub fn remove(&mut self, proposition: &Proposition) -> bool {
        self.propositions.remove(proposition)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposition> {
        self.propositions.iter()
    }

    pub fn len(&self) -> usize {
        self.propositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.propositions.is_empty()
    }

    pub fn propositions(&self) -> &BTreeSet<Proposition> {
        &self.propositions
    }
}

impl FromIterator<Proposition> for State {
    fn from_iter<T: IntoIterator<Item = Proposition>>(iter: T) -> Self {
        Self {
            propositions: iter.into_iter().collect(),
        }
    }
}

impl Extend<Proposition> for State {
    fn extend<T: IntoIterator<Item = Proposition>>(&mut self, iter: T) {
        self.propositions.extend(iter)
    }
}

impl IntoIterator for State {
    type Item = Proposition;
    type IntoIter = alloc::collections::btree_set::IntoIter<Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.propositions.into_iter()
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = &'a Proposition;
    type IntoIter = alloc::collections::btree_set::Iter<'a, Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.propositions.iter()
    }
}

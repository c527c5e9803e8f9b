use alloc::{collections::BTreeMap, vec::Vec};

use crate::{lookup_symbol, InternerSymbol};

pub trait Named {
    fn symbol(&self) -> InternerSymbol;
}

/// Items addressable by name that keep their declaration order.
///
/// Inserting a name twice replaces the stored item in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedStorage<T: Named> {
    items: Vec<T>,
    index: BTreeMap<InternerSymbol, usize>,
}

impl<T: Named> NamedStorage<T> {
    /// Returns the replaced item, if any.
    pub fn insert(&mut self, item: T) -> Option<T> {
        match self.index.get(&item.symbol()) {
            Some(&i) => Some(core::mem::replace(&mut self.items[i], item)),
            None => {
                self.index.insert(item.symbol(), self.items.len());
                self.items.push(item);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        lookup_symbol(name).and_then(|s| self.get_by_symbol(&s))
    }

    pub fn get_by_symbol(&self, symbol: &InternerSymbol) -> Option<&T> {
        self.index.get(symbol).map(|&i| &self.items[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Named> Default for NamedStorage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<T: Named> FromIterator<T> for NamedStorage<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut storage = Self::default();
        for item in iter {
            storage.insert(item);
        }
        storage
    }
}

use core::borrow::Borrow;
use core::fmt;

use crate::{Keys, Redbark};

/// Ordered set of unique keys.
#[derive(Clone)]
pub struct RedbarkSet<K> {
    tree: Redbark<K, ()>,
}

impl<K> RedbarkSet<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Redbark::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Redbark::with_capacity(capacity),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.tree.reserve(additional);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.tree.first_key_value().map(|(key, _)| key)
    }

    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.tree.last_key_value().map(|(key, _)| key)
    }

    /// Iterates over the keys in ascending order.
    pub fn iter(&self) -> Keys<'_, K, ()> {
        self.tree.keys()
    }
}

impl<K: Ord> RedbarkSet<K> {
    /// Adds `key`, returning `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.tree.contains_key(&key) {
            return false;
        }

        self.tree.insert(key, ());
        true
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove_key(key).is_some()
    }
}

impl<K> Default for RedbarkSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for RedbarkSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> Extend<K> for RedbarkSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for RedbarkSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);

        set
    }
}

impl<'a, K> IntoIterator for &'a RedbarkSet<K> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

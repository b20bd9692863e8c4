use core::iter::FusedIterator;
use core::marker::PhantomData;

use alloc::vec::Vec;

use crate::Redbark;
use crate::node::{BLACK_NIL, Links, next_index, prev_index, subtree_max, subtree_min};

/// In-order iterator over the entries of a [`Redbark`].
///
/// Walks successor links lazily, so creating one is `O(log n)` and a full pass is `O(n)`.
/// Cloning restarts nothing; it forks the walk from the current position.
pub struct Iter<'a, K, V> {
    tree: &'a Redbark<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.front;
        self.front = next_index(&self.tree.links, node);
        self.remaining -= 1;

        let (key, value) = self.tree.entry_at(node);
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.back;
        self.back = prev_index(&self.tree.links, node);
        self.remaining -= 1;

        let (key, value) = self.tree.entry_at(node);
        Some((key, value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// In-order iterator handing out mutable values. Keys stay shared so the ordering cannot break.
pub struct IterMut<'a, K, V> {
    links: &'a [Links],
    entries: *mut Option<(K, V)>,
    front: usize,
    back: usize,
    remaining: usize,
    phantom: PhantomData<&'a mut (K, V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    fn entry_mut(&mut self, node: usize) -> (&'a K, &'a mut V) {
        // SAFETY: `entries` comes from a vector mutably borrowed for 'a, and the front and back
        // cursors only ever visit each occupied slot once before `remaining` hits zero, so no two
        // returned references alias.
        let entry = unsafe { &mut *self.entries.add(node) };

        match entry {
            Some((key, value)) => (key, value),
            None => unreachable!("vacant slot {node} is linked into the tree"),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.front;
        self.front = next_index(self.links, node);
        self.remaining -= 1;

        Some(self.entry_mut(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.back;
        self.back = prev_index(self.links, node);
        self.remaining -= 1;

        Some(self.entry_mut(node))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

// SAFETY: an `IterMut` behaves like a `&mut` borrow of the entries. Sending it hands out `&K` and
// `&mut V` on the other thread, and sharing it only exposes `&K` and `&V`.
unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}

// SAFETY: see above.
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Consuming in-order iterator.
pub struct IntoIter<K, V> {
    tree: Redbark<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    fn take(&mut self, node: usize) -> (K, V) {
        match self.tree.entries[node].take() {
            Some(entry) => entry,
            None => unreachable!("slot {node} yielded twice"),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.front;
        self.front = next_index(&self.tree.links, node);
        self.remaining -= 1;

        Some(self.take(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.back;
        self.back = prev_index(&self.tree.links, node);
        self.remaining -= 1;

        Some(self.take(node))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Visits each node before its subtrees.
pub struct Preorder<'a, K, V> {
    tree: &'a Redbark<K, V>,
    stack: Vec<usize>,
}

impl<'a, K, V> Iterator for Preorder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let links = &self.tree.links[node];

        if links.right != BLACK_NIL {
            self.stack.push(links.right);
        }
        if links.left != BLACK_NIL {
            self.stack.push(links.left);
        }

        let (key, value) = self.tree.entry_at(node);
        Some((key, value))
    }
}

impl<K, V> FusedIterator for Preorder<'_, K, V> {}

/// Visits each node after both of its subtrees.
pub struct Postorder<'a, K, V> {
    tree: &'a Redbark<K, V>,
    curr: usize,
    last: usize,
    stack: Vec<usize>,
}

impl<'a, K, V> Iterator for Postorder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while self.curr != BLACK_NIL {
                self.stack.push(self.curr);
                self.curr = self.tree.links[self.curr].left;
            }

            let top = *self.stack.last()?;
            let right = self.tree.links[top].right;

            if right != BLACK_NIL && right != self.last {
                self.curr = right;
                continue;
            }

            self.stack.pop();
            self.last = top;

            let (key, value) = self.tree.entry_at(top);
            return Some((key, value));
        }
    }
}

impl<K, V> FusedIterator for Postorder<'_, K, V> {}

impl<K, V> Redbark<K, V> {
    fn bounds(&self) -> (usize, usize) {
        if self.root == BLACK_NIL {
            return (BLACK_NIL, BLACK_NIL);
        }

        (
            subtree_min(&self.links, self.root),
            subtree_max(&self.links, self.root),
        )
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let (front, back) = self.bounds();

        Iter {
            tree: self,
            front,
            back,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let (front, back) = self.bounds();

        IterMut {
            links: &self.links,
            entries: self.entries.as_mut_ptr(),
            front,
            back,
            remaining: self.len,
            phantom: PhantomData,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    pub fn preorder(&self) -> Preorder<'_, K, V> {
        let mut stack = Vec::new();
        if self.root != BLACK_NIL {
            stack.push(self.root);
        }

        Preorder { tree: self, stack }
    }

    pub fn postorder(&self) -> Postorder<'_, K, V> {
        Postorder {
            tree: self,
            curr: self.root,
            last: BLACK_NIL,
            stack: Vec::new(),
        }
    }
}

impl<K, V> IntoIterator for Redbark<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let (front, back) = self.bounds();
        let remaining = self.len;

        IntoIter {
            tree: self,
            front,
            back,
            remaining,
        }
    }
}

impl<'a, K, V> IntoIterator for &'a Redbark<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut Redbark<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use crate::Redbark;

    fn sample() -> Redbark<i32, i32> {
        [4, 2, 6, 1, 3, 5, 7].into_iter().map(|k| (k, k * 10)).collect()
    }

    #[test]
    pub fn inorder_iteration() {
        let tree = sample();
        let items: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();

        assert_eq!(
            items,
            vec![(1, 10), (2, 20), (3, 30), (4, 40), (5, 50), (6, 60), (7, 70)]
        );
        assert!(Redbark::<i32, i32>::new().iter().next().is_none());
    }

    #[test]
    pub fn iteration_is_restartable() {
        let tree = sample();
        let mut iter = tree.keys();
        iter.next();
        iter.next();

        let fork = iter.clone();
        assert!(iter.eq(fork));
        assert!(tree.keys().eq(tree.keys()));
    }

    #[test]
    pub fn double_ended_meet() {
        let tree = sample();
        let mut iter = tree.keys();

        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&7));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.len(), 4);

        let middle: Vec<i32> = iter.copied().collect();
        assert_eq!(middle, vec![2, 3, 4, 5]);
    }

    #[test]
    pub fn mutate_values_in_place() {
        let mut tree = sample();
        for (key, value) in tree.iter_mut() {
            *value += key;
        }
        for value in tree.values_mut().rev().take(2) {
            *value = 0;
        }
        for (_, value) in &mut tree {
            *value += 1;
        }

        let values: Vec<i32> = tree.values().copied().collect();
        assert_eq!(values, vec![12, 23, 34, 45, 56, 1, 1]);
    }

    #[test]
    pub fn consume_in_order() {
        let mut tree = sample();
        tree.remove_key(&4);

        let mut iter = tree.into_iter();
        assert_eq!(iter.next_back(), Some((7, 70)));
        let rest: Vec<(i32, i32)> = iter.collect();
        assert_eq!(rest, vec![(1, 10), (2, 20), (3, 30), (5, 50), (6, 60)]);
    }

    #[test]
    pub fn partially_consumed_drop() {
        let tree: Redbark<String, Vec<u8>> = (0..20)
            .map(|k| (format!("{k:02}"), vec![k; 4]))
            .collect();

        let mut iter = tree.into_iter();
        assert_eq!(iter.next().map(|(k, _)| k), Some("00".to_owned()));
        drop(iter);
    }

    #[test]
    pub fn tree_walks() {
        let tree = sample();

        let pre: Vec<i32> = tree.preorder().map(|(k, _)| *k).collect();
        assert_eq!(pre, vec![4, 2, 1, 3, 6, 5, 7]);

        let post: Vec<i32> = tree.postorder().map(|(k, _)| *k).collect();
        assert_eq!(post, vec![1, 3, 2, 5, 7, 6, 4]);

        let empty = Redbark::<i32, ()>::new();
        assert_eq!(empty.preorder().count(), 0);
        assert_eq!(empty.postorder().count(), 0);
    }

    #[test]
    pub fn mutable_iterators_cross_threads() {
        fn assert_send<T: Send>(_: &T) {}
        fn assert_sync<T: Sync>(_: &T) {}

        let mut tree = sample();
        assert_send(&tree.iter_mut());
        assert_sync(&tree.iter_mut());
        assert_send(&tree.values_mut());
        assert_sync(&tree.values_mut());

        std::thread::scope(|scope| {
            let values = tree.values_mut();
            scope.spawn(move || values.for_each(|value| *value += 1));
        });

        assert!(tree.values().copied().eq([11, 21, 31, 41, 51, 61, 71]));
    }
}

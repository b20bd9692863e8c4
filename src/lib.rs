//! Red-black tree based ordered containers.
//!
//! [`Redbark`] is the core engine: an ordered multimap whose nodes live in an index arena, with
//! slot 0 reserved for the shared black sentinel. Every operation is `O(log n)` in the worst
//! case. Nodes are addressed through copyable [`NodeHandle`]s which are checked against a per-slot
//! generation, so a handle to a removed node is rejected instead of silently aliasing a newer one.
//!
//! [`RedbarkMap`] and [`RedbarkSet`] are unique-key facades over the same engine.
//!
//! ```
//! use redbark::Redbark;
//!
//! let mut tree = Redbark::new();
//! for key in [10, 20, 30, 15, 25, 5] {
//!     tree.insert(key, key * 2);
//! }
//!
//! let min = tree.minimum().unwrap();
//! assert_eq!(tree.key(min), Ok(&5));
//! assert_eq!(tree.get(&15), Some(&30));
//! assert!(tree.iter().map(|(k, _)| *k).eq([5, 10, 15, 20, 25, 30]));
//! ```

extern crate alloc;

mod error;
mod iter;
mod map;
mod node;
mod remove;
mod set;
mod validate;

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use alloc::vec::Vec;
use log::{debug, trace};

pub use error::{InvariantViolation, RedbarkError};
pub use iter::{IntoIter, Iter, IterMut, Keys, Postorder, Preorder, Values, ValuesMut};
pub use map::RedbarkMap;
pub use node::NodeHandle;
pub use set::RedbarkSet;

use node::{BLACK_NIL, Links, NodeColor, Side, next_index, prev_index, subtree_max, subtree_min};

/*
free slots are chained through their parent link, head stored in `free_head`:
- allocating pops the head, new head is links[head].parent
- releasing pushes: links[cell].parent = head, then head = cell
the generation of a slot is bumped on release, so handles to the old occupant stop resolving.
*/

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Ordered multimap backed by a red-black tree.
///
/// Equal keys are allowed; a key equal to an existing one is inserted to its right, so iteration
/// visits equal keys in insertion order unless rebalancing reorders them.
pub struct Redbark<K, V> {
    id: u64,
    links: Vec<Links>,
    entries: Vec<Option<(K, V)>>,
    root: usize,
    free_head: usize,
    len: usize,
}

impl<K, V> Redbark<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree able to hold `capacity` nodes without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut links = Vec::with_capacity(capacity + 1);
        let mut entries = Vec::with_capacity(capacity + 1);
        links.push(Links::sentinel());
        entries.push(None);

        Self {
            id: next_tree_id(),
            links,
            entries,
            root: BLACK_NIL,
            free_head: BLACK_NIL,
            len: 0,
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.links.reserve(additional);
        self.entries.reserve(additional);
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.links.capacity().min(self.entries.capacity()) - 1
    }

    /// Releases unused storage. Occupied slots never move, so live handles stay valid.
    pub fn shrink_to_fit(&mut self) {
        self.links.shrink_to_fit();
        self.entries.shrink_to_fit();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every entry. Handles issued before the call are all stale afterwards.
    pub fn clear(&mut self) {
        for slot in 1..self.links.len() {
            if self.entries[slot].is_some() {
                self.release(slot);
            }
        }

        self.root = BLACK_NIL;
        self.links[BLACK_NIL] = Links::sentinel();
        self.len = 0;
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeHandle> {
        self.handle_at(self.root)
    }

    /// Node holding the smallest key.
    #[must_use]
    pub fn minimum(&self) -> Option<NodeHandle> {
        if self.root == BLACK_NIL {
            return None;
        }

        self.handle_at(subtree_min(&self.links, self.root))
    }

    /// Node holding the largest key.
    #[must_use]
    pub fn maximum(&self) -> Option<NodeHandle> {
        if self.root == BLACK_NIL {
            return None;
        }

        self.handle_at(subtree_max(&self.links, self.root))
    }

    /// Node that follows `node` in key order, `None` if `node` is the maximum.
    pub fn successor(&self, node: NodeHandle) -> Result<Option<NodeHandle>, RedbarkError> {
        let node = self.resolve(node)?;

        Ok(self.handle_at(next_index(&self.links, node)))
    }

    /// Node that precedes `node` in key order, `None` if `node` is the minimum.
    pub fn predecessor(&self, node: NodeHandle) -> Result<Option<NodeHandle>, RedbarkError> {
        let node = self.resolve(node)?;

        Ok(self.handle_at(prev_index(&self.links, node)))
    }

    pub fn key(&self, node: NodeHandle) -> Result<&K, RedbarkError> {
        let node = self.resolve(node)?;

        Ok(self.key_at(node))
    }

    pub fn value(&self, node: NodeHandle) -> Result<&V, RedbarkError> {
        let node = self.resolve(node)?;

        Ok(&self.entry_at(node).1)
    }

    pub fn value_mut(&mut self, node: NodeHandle) -> Result<&mut V, RedbarkError> {
        let node = self.resolve(node)?;

        Ok(&mut self.entry_at_mut(node).1)
    }

    pub fn entry(&self, node: NodeHandle) -> Result<(&K, &V), RedbarkError> {
        let node = self.resolve(node)?;
        let (key, value) = self.entry_at(node);

        Ok((key, value))
    }

    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.minimum()?;
        let (key, value) = self.entry_at(node.index);

        Some((key, value))
    }

    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.maximum()?;
        let (key, value) = self.entry_at(node.index);

        Some((key, value))
    }

    fn handle_at(&self, node: usize) -> Option<NodeHandle> {
        if node == BLACK_NIL {
            return None;
        }

        Some(NodeHandle {
            tree: self.id,
            index: node,
            generation: self.links[node].generation,
        })
    }

    fn resolve(&self, handle: NodeHandle) -> Result<usize, RedbarkError> {
        let live = handle.tree == self.id
            && handle.index != BLACK_NIL
            && self
                .links
                .get(handle.index)
                .is_some_and(|links| links.generation == handle.generation)
            && self.entries.get(handle.index).is_some_and(Option::is_some);

        if live {
            Ok(handle.index)
        } else {
            debug!("rejecting stale handle {handle:?}");
            Err(RedbarkError::StaleHandle {
                index: handle.index,
            })
        }
    }

    fn entry_at(&self, node: usize) -> &(K, V) {
        match &self.entries[node] {
            Some(entry) => entry,
            None => unreachable!("vacant slot {node} is linked into the tree"),
        }
    }

    fn entry_at_mut(&mut self, node: usize) -> &mut (K, V) {
        match &mut self.entries[node] {
            Some(entry) => entry,
            None => unreachable!("vacant slot {node} is linked into the tree"),
        }
    }

    #[inline]
    fn key_at(&self, node: usize) -> &K {
        &self.entry_at(node).0
    }

    #[inline]
    fn color_of(&self, node: usize) -> NodeColor {
        self.links[node].color
    }

    #[inline]
    fn set_color(&mut self, node: usize, color: NodeColor) {
        self.links[node].color = color;
    }

    /// Stores a new red node below `parent` and returns its slot.
    fn allocate(&mut self, key: K, value: V, parent: usize) -> usize {
        if self.free_head != BLACK_NIL {
            let slot = self.free_head;
            self.free_head = self.links[slot].parent;

            let generation = self.links[slot].generation;
            self.links[slot] = Links::new_isolated(parent, generation);
            self.entries[slot] = Some((key, value));
            debug!("reusing slot {slot} at generation {generation}");

            return slot;
        }

        let slot = self.links.len();
        self.links.push(Links::new_isolated(parent, 0));
        self.entries.push(Some((key, value)));

        slot
    }

    fn rotate(&mut self, center: usize, towards: Side) {
        match towards {
            Side::Left => self.rotate_left(center),
            Side::Right => self.rotate_right(center),
        }
    }

    /// Promotes the right child of `center` into its position.
    fn rotate_left(&mut self, center: usize) {
        let grandparent = self.links[center].parent;
        let pivot = self.links[center].right;
        debug_assert_ne!(pivot, BLACK_NIL, "rotate_left needs a right child");
        trace!("rotate left at {center}");

        let inner = self.links[pivot].left;

        self.links[center].right = inner;
        if inner != BLACK_NIL {
            self.links[inner].parent = center;
        }

        self.links[pivot].left = center;
        self.links[center].parent = pivot;
        self.links[pivot].parent = grandparent;

        if grandparent != BLACK_NIL {
            if self.links[grandparent].right == center {
                self.links[grandparent].right = pivot;
            } else {
                self.links[grandparent].left = pivot;
            }
        } else {
            self.root = pivot;
        }
    }

    /// Promotes the left child of `center` into its position.
    fn rotate_right(&mut self, center: usize) {
        let grandparent = self.links[center].parent;
        let pivot = self.links[center].left;
        debug_assert_ne!(pivot, BLACK_NIL, "rotate_right needs a left child");
        trace!("rotate right at {center}");

        let inner = self.links[pivot].right;

        self.links[center].left = inner;
        if inner != BLACK_NIL {
            self.links[inner].parent = center;
        }

        self.links[pivot].right = center;
        self.links[center].parent = pivot;
        self.links[pivot].parent = grandparent;

        if grandparent != BLACK_NIL {
            if self.links[grandparent].right == center {
                self.links[grandparent].right = pivot;
            } else {
                self.links[grandparent].left = pivot;
            }
        } else {
            self.root = pivot;
        }
    }
}

impl<K: Ord, V> Redbark<K, V> {
    /// Inserts `key` with `value`, keeping any existing equal keys.
    pub fn insert(&mut self, key: K, value: V) -> NodeHandle {
        let mut current_node = self.root;
        let mut parent_node = BLACK_NIL;
        let mut goes_left = false;

        while current_node != BLACK_NIL {
            parent_node = current_node;
            goes_left = key < *self.key_at(current_node);

            current_node = if goes_left {
                self.links[current_node].left
            } else {
                self.links[current_node].right
            };
        }

        let new_node = self.allocate(key, value, parent_node);

        if parent_node == BLACK_NIL {
            self.root = new_node;
        } else if goes_left {
            self.links[parent_node].left = new_node;
        } else {
            self.links[parent_node].right = new_node;
        }

        self.len += 1;
        self.fix_red_violation(new_node);
        self.check_invariants();

        NodeHandle {
            tree: self.id,
            index: new_node,
            generation: self.links[new_node].generation,
        }
    }

    fn fix_red_violation(&mut self, start_node: usize) {
        let mut curr_node = start_node;

        while self.color_of(self.links[curr_node].parent).is_red() {
            let parent = self.links[curr_node].parent;
            // a red parent is never the root, so the grandparent is a real node
            let grandparent = self.links[parent].parent;

            let parent_side = if self.links[grandparent].left == parent {
                Side::Left
            } else {
                Side::Right
            };
            let uncle = self.links[grandparent].child(parent_side.opposite());

            if self.color_of(uncle).is_red() {
                trace!("insert fixup at {curr_node}: red uncle {uncle}");
                self.set_color(parent, NodeColor::Black);
                self.set_color(uncle, NodeColor::Black);
                self.set_color(grandparent, NodeColor::Red);

                curr_node = grandparent;
                continue;
            }

            if self.links[parent].child(parent_side.opposite()) == curr_node {
                trace!("insert fixup at {curr_node}: inner grandchild of {grandparent}");
                self.rotate(parent, parent_side);

                curr_node = parent;
                continue;
            }

            trace!("insert fixup at {curr_node}: outer grandchild of {grandparent}");
            self.set_color(parent, NodeColor::Black);
            self.set_color(grandparent, NodeColor::Red);
            self.rotate(grandparent, parent_side.opposite());
        }

        let root = self.root;
        self.set_color(root, NodeColor::Black);
    }

    /// Finds a node whose key equals `key`.
    pub fn search<Q>(&self, key: &Q) -> Option<NodeHandle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.handle_at(self.find_index(key))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_index(key) != BLACK_NIL
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_index(key);
        if node == BLACK_NIL {
            return None;
        }

        let (key, value) = self.entry_at(node);
        Some((key, value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_index(key);
        if node == BLACK_NIL {
            return None;
        }

        Some(&mut self.entry_at_mut(node).1)
    }

    /// First node whose key is greater than or equal to `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Option<NodeHandle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.handle_at(self.find_bound(key, |ordering| ordering != Ordering::Less))
    }

    /// First node whose key is strictly greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Option<NodeHandle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.handle_at(self.find_bound(key, |ordering| ordering == Ordering::Greater))
    }

    fn find_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current_node = self.root;

        while current_node != BLACK_NIL {
            match key.cmp(self.key_at(current_node).borrow()) {
                Ordering::Less => {
                    current_node = self.links[current_node].left;
                }
                Ordering::Equal => {
                    return current_node;
                }
                Ordering::Greater => {
                    current_node = self.links[current_node].right;
                }
            }
        }

        BLACK_NIL
    }

    /// Leftmost node whose key, compared against `key`, satisfies `accept`.
    fn find_bound<Q>(&self, key: &Q, accept: impl Fn(Ordering) -> bool) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current_node = self.root;
        let mut candidate = BLACK_NIL;

        while current_node != BLACK_NIL {
            if accept(self.key_at(current_node).borrow().cmp(key)) {
                candidate = current_node;
                current_node = self.links[current_node].left;
            } else {
                current_node = self.links[current_node].right;
            }
        }

        candidate
    }

    #[inline]
    fn check_invariants(&self) {
        #[cfg(feature = "check-invariants")]
        if let Err(violation) = self.validate() {
            panic!("red-black invariant broken: {violation}");
        }
    }
}

/// The clone gets its own identity, so handles issued by `self` do not resolve in it.
impl<K: Clone, V: Clone> Clone for Redbark<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: next_tree_id(),
            links: self.links.clone(),
            entries: self.entries.clone(),
            root: self.root,
            free_head: self.free_head,
            len: self.len,
        }
    }
}

impl<K, V> Default for Redbark<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Redbark<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Redbark<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);

        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for Redbark<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);

        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{BLACK_NIL, NodeColor};
    use crate::{Redbark, RedbarkError};

    fn assert_valid<K: Ord, V>(tree: &Redbark<K, V>) {
        assert_eq!(tree.validate(), Ok(()));
    }

    fn keys<K: Copy + Ord, V>(tree: &Redbark<K, V>) -> Vec<K> {
        tree.keys().copied().collect()
    }

    #[test]
    pub fn create_tree() {
        let tree = Redbark::<usize, ()>::new();

        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.minimum(), None);
        assert_eq!(tree.maximum(), None);
        assert_valid(&tree);
    }

    #[test]
    pub fn empty_tree_insertion() {
        let mut tree = Redbark::new();
        let first = tree.insert(5, ());
        tree.insert(7, ());
        tree.insert(9, ());
        tree.insert(3, ());

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.key(first), Ok(&5));
        assert_eq!(keys(&tree), vec![3, 5, 7, 9]);
        assert_valid(&tree);
    }

    #[test]
    pub fn insert_sequence_keeps_invariants() {
        let mut tree = Redbark::new();

        for key in [10, 20, 30, 15, 25, 5] {
            tree.insert(key, key);
            assert_valid(&tree);
        }

        assert_eq!(tree.key(tree.minimum().unwrap()), Ok(&5));
        assert_eq!(tree.key(tree.maximum().unwrap()), Ok(&30));
        assert_eq!(keys(&tree), vec![5, 10, 15, 20, 25, 30]);
    }

    #[test]
    pub fn ascending_insertions_stay_shallow() {
        let tree: Redbark<u32, ()> = (1..=15).map(|k| (k, ())).collect();

        assert_valid(&tree);
        assert_eq!(tree.len(), 15);
        // 2 * log2(n + 1) bound for n = 15
        assert!(tree.height() <= 8, "height {}", tree.height());
        assert!(tree.height() >= 4);
    }

    #[test]
    pub fn uncle_recoloring_reaches_root() {
        let mut tree = Redbark::new();
        let root = tree.insert(4, ());
        tree.insert(2, ());
        tree.insert(6, ());
        tree.insert(1, ());

        // red uncle 6: parent and uncle turn black, the root goes red and is forced back to black
        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.links[root.index].color, NodeColor::Black);
        let two = tree.search(&2).unwrap();
        let six = tree.search(&6).unwrap();
        assert_eq!(tree.links[two.index].color, NodeColor::Black);
        assert_eq!(tree.links[six.index].color, NodeColor::Black);
        assert_valid(&tree);
    }

    #[test]
    pub fn bent_path_is_straightened() {
        let mut tree = Redbark::new();
        tree.insert(10, ());
        tree.insert(5, ());
        tree.insert(7, ());

        assert_eq!(tree.key(tree.root().unwrap()), Ok(&7));
        assert_eq!(keys(&tree), vec![5, 7, 10]);
        assert_valid(&tree);
    }

    #[test]
    pub fn rotations_preserve_order() {
        let mut tree = Redbark::new();
        for key in [12, 9, 15, 14, 16] {
            tree.insert(key, ());
        }
        let before = keys(&tree);
        let root = tree.root;
        let right = tree.links[root].right;

        tree.rotate_left(root);
        assert_eq!(tree.root, right);
        assert_eq!(tree.links[right].left, root);
        assert_eq!(tree.links[root].parent, right);
        assert_eq!(tree.links[right].parent, BLACK_NIL);
        assert_eq!(keys(&tree), before);

        tree.rotate_right(right);
        assert_eq!(tree.root, root);
        assert_eq!(tree.links[root].right, right);
        assert_eq!(tree.links[right].parent, root);
        assert_eq!(keys(&tree), before);
        assert_eq!(tree.links[BLACK_NIL].parent, BLACK_NIL);
    }

    #[test]
    pub fn search_and_navigation() {
        let tree: Redbark<i32, i32> = [12, 5, 9, 2, 18, 15, 13, 17, 19]
            .into_iter()
            .map(|k| (k, k * 10))
            .collect();

        for key in [2, 5, 9, 12, 13, 15, 17, 18, 19] {
            let node = tree.search(&key).unwrap();
            assert_eq!(tree.entry(node), Ok((&key, &(key * 10))));
        }
        assert_eq!(tree.search(&4), None);
        assert!(!tree.contains_key(&20));

        for pair in [2, 5, 9, 12, 13, 15, 17, 18, 19].windows(2) {
            let node = tree.search(&pair[0]).unwrap();
            let next = tree.successor(node).unwrap().unwrap();
            assert_eq!(tree.key(next), Ok(&pair[1]));
            assert_eq!(tree.predecessor(next), Ok(Some(node)));
        }

        assert_eq!(tree.successor(tree.maximum().unwrap()), Ok(None));
        assert_eq!(tree.predecessor(tree.minimum().unwrap()), Ok(None));
    }

    #[test]
    pub fn search_does_not_mutate() {
        let tree: Redbark<i32, ()> = (0..32).map(|k| (k * 3, ())).collect();
        let links_before: Vec<_> = tree
            .links
            .iter()
            .map(|l| (l.color, l.parent, l.left, l.right))
            .collect();

        for key in -5..100 {
            let _ = tree.search(&key);
            let _ = tree.lower_bound(&key);
        }

        let links_after: Vec<_> = tree
            .links
            .iter()
            .map(|l| (l.color, l.parent, l.left, l.right))
            .collect();
        assert_eq!(links_before, links_after);
    }

    #[test]
    pub fn bounds() {
        let tree: Redbark<i32, ()> = [10, 20, 20, 30].into_iter().map(|k| (k, ())).collect();

        let key_of = |node| tree.key(node).copied();
        assert_eq!(tree.lower_bound(&5).map(key_of), Some(Ok(10)));
        assert_eq!(tree.lower_bound(&20).map(key_of), Some(Ok(20)));
        assert_eq!(tree.upper_bound(&20).map(key_of), Some(Ok(30)));
        assert_eq!(tree.lower_bound(&31), None);
        assert_eq!(tree.upper_bound(&30), None);

        // the lower bound of a duplicated key is the first of the run
        let first_twenty = tree.lower_bound(&20).unwrap();
        let prev = tree.predecessor(first_twenty).unwrap().unwrap();
        assert_eq!(tree.key(prev), Ok(&10));
    }

    #[test]
    pub fn duplicates_are_kept() {
        let mut tree = Redbark::new();
        for (i, key) in [5, 5, 5, 3, 5, 7].into_iter().enumerate() {
            tree.insert(key, i);
            assert_valid(&tree);
        }

        assert_eq!(tree.len(), 6);
        assert_eq!(keys(&tree), vec![3, 5, 5, 5, 5, 7]);
        assert!(tree.search(&5).is_some());
    }

    #[test]
    pub fn handle_accessors() {
        let mut tree = Redbark::new();
        let node = tree.insert("alpha", 1);

        *tree.value_mut(node).unwrap() += 41;
        assert_eq!(tree.value(node), Ok(&42));
        assert_eq!(tree.get("alpha"), Some(&42));

        *tree.get_mut("alpha").unwrap() = 7;
        assert_eq!(tree.get_key_value("alpha"), Some((&"alpha", &7)));
        assert_eq!(tree.first_key_value(), Some((&"alpha", &7)));
        assert_eq!(tree.last_key_value(), Some((&"alpha", &7)));
    }

    #[test]
    pub fn sentinel_handle_is_rejected() {
        let mut tree = Redbark::new();
        let node = tree.insert(1, ());
        let forged = crate::NodeHandle {
            tree: node.tree,
            index: BLACK_NIL,
            generation: node.generation,
        };
        let out_of_range = crate::NodeHandle {
            tree: node.tree,
            index: 99,
            generation: 0,
        };

        assert_eq!(
            tree.key(forged),
            Err(RedbarkError::StaleHandle { index: BLACK_NIL })
        );
        assert_eq!(
            tree.successor(out_of_range),
            Err(RedbarkError::StaleHandle { index: 99 })
        );
    }

    #[test]
    pub fn capacity_hints() {
        let mut tree = Redbark::<u8, u8>::with_capacity(16);
        assert!(tree.capacity() >= 16);

        tree.reserve(64);
        assert!(tree.capacity() >= 64);

        tree.insert(1, 1);
        tree.shrink_to_fit();
        assert!(tree.capacity() >= 1);
        assert_eq!(tree.get(&1), Some(&1));
    }

    #[test]
    pub fn debug_renders_as_map() {
        let tree: Redbark<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();

        assert_eq!(format!("{tree:?}"), r#"{1: "a", 2: "b"}"#);
    }

    mod proptests {
        use std::collections::BTreeMap;

        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        use crate::Redbark;

        #[cfg(not(miri))]
        const MAP_SIZE: usize = 500;
        #[cfg(miri)]
        const MAP_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 200;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            fn insert_get(
                mut inserts in proptest::collection::vec(0..10000i32, 0..MAP_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let mut tree = Redbark::new();
                for v in &inserts {
                    tree.insert(*v, *v);
                }
                prop_assert_eq!(tree.validate(), Ok(()));
                prop_assert_eq!(tree.len(), inserts.len());

                inserts.shuffle(&mut thread_rng());
                for key in inserts.iter().chain(access.iter()) {
                    let expected = inserts.contains(key).then_some(key);
                    prop_assert_eq!(tree.get(key), expected);
                }
            }

            #[test]
            fn order(
                inserts in proptest::collection::vec(0..1000i32, 0..MAP_SIZE),
            ) {
                let tree: Redbark<i32, ()> = inserts.iter().map(|k| (*k, ())).collect();

                let mut sorted = inserts.clone();
                sorted.sort();

                let items: Vec<i32> = tree.keys().copied().collect();
                prop_assert_eq!(&items, &sorted);

                let mut reversed: Vec<i32> = tree.keys().rev().copied().collect();
                reversed.reverse();
                prop_assert_eq!(&reversed, &sorted);
            }

            #[test]
            fn insert_delete(
                inserts in proptest::collection::hash_set(0..10000i32, 0..MAP_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let mut reference: BTreeMap<i32, i32> = inserts.iter().map(|v| (*v, *v)).collect();
                let mut tree = Redbark::new();
                for v in &inserts {
                    tree.insert(*v, *v);
                }

                let mut inserts: Vec<_> = inserts.into_iter().collect();
                inserts.shuffle(&mut thread_rng());
                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(reference.remove_entry(key), tree.remove_key(key));
                    prop_assert_eq!(tree.validate(), Ok(()));
                }

                prop_assert!(tree.is_empty());
                prop_assert_eq!(tree.root(), None);
            }

            #[test]
            fn interleaved_mutations(
                ops in proptest::collection::vec((any::<bool>(), 0..64u8), 0..MAP_SIZE),
            ) {
                let mut reference: BTreeMap<u8, usize> = BTreeMap::new();
                let mut tree = Redbark::new();

                for (step, (insert, key)) in ops.into_iter().enumerate() {
                    if insert {
                        // keep keys unique so the reference map stays comparable
                        if tree.remove_key(&key).is_some() {
                            prop_assert!(reference.remove(&key).is_some());
                        }
                        tree.insert(key, step);
                        reference.insert(key, step);
                    } else {
                        prop_assert_eq!(tree.remove_key(&key), reference.remove_entry(&key));
                    }

                    prop_assert_eq!(tree.validate(), Ok(()));
                    prop_assert_eq!(tree.len(), reference.len());
                }

                let items: Vec<(u8, usize)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
                let expected: Vec<(u8, usize)> = reference.into_iter().collect();
                prop_assert_eq!(items, expected);
            }
        );
    }
}

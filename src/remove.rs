use core::borrow::Borrow;

use log::trace;

use crate::node::{BLACK_NIL, Links, NodeColor, Side, subtree_max, subtree_min};
use crate::{NodeHandle, Redbark, RedbarkError};

impl<K, V> Redbark<K, V> {
    /// Replaces the subtree rooted at `old` with the one rooted at `new`.
    ///
    /// `new` may be the sentinel; its parent link is still written so that the delete fixup can
    /// climb from it.
    fn transplant(&mut self, old: usize, new: usize) {
        let parent = self.links[old].parent;

        if parent == BLACK_NIL {
            self.root = new;
        } else if self.links[parent].left == old {
            self.links[parent].left = new;
        } else {
            self.links[parent].right = new;
        }

        self.links[new].parent = parent;
    }

    /// Unlinks `node` from the tree, rebalances, and frees its slot.
    fn remove_index(&mut self, node: usize) -> (K, V) {
        let mut spliced_color = self.color_of(node);
        let replacement;

        if self.links[node].left == BLACK_NIL {
            replacement = self.links[node].right;
            self.transplant(node, replacement);
        } else if self.links[node].right == BLACK_NIL {
            replacement = self.links[node].left;
            self.transplant(node, replacement);
        } else {
            let successor = subtree_min(&self.links, self.links[node].right);
            spliced_color = self.color_of(successor);
            replacement = self.links[successor].right;

            if self.links[successor].parent == node {
                self.links[replacement].parent = successor;
            } else {
                self.transplant(successor, replacement);

                let right = self.links[node].right;
                self.links[successor].right = right;
                self.links[right].parent = successor;
            }

            self.transplant(node, successor);

            let left = self.links[node].left;
            self.links[successor].left = left;
            self.links[left].parent = successor;
            self.set_color(successor, self.color_of(node));
        }

        if spliced_color.is_black() {
            self.fix_black_deficit(replacement);
        }

        self.links[BLACK_NIL].parent = BLACK_NIL;
        self.len -= 1;

        self.release(node)
    }

    /// Restores equal black heights after a black node was spliced out above `start_node`.
    fn fix_black_deficit(&mut self, start_node: usize) {
        let mut curr_node = start_node;

        while curr_node != self.root && self.color_of(curr_node).is_black() {
            let parent = self.links[curr_node].parent;
            let side = if self.links[parent].left == curr_node {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.opposite();
            let mut sibling = self.links[parent].child(far);

            if self.color_of(sibling).is_red() {
                trace!("delete fixup at {curr_node}: red sibling {sibling}");
                self.set_color(sibling, NodeColor::Black);
                self.set_color(parent, NodeColor::Red);
                self.rotate(parent, side);
                sibling = self.links[parent].child(far);
            }

            let near_nephew = self.links[sibling].child(side);
            let far_nephew = self.links[sibling].child(far);

            if self.color_of(near_nephew).is_black() && self.color_of(far_nephew).is_black() {
                trace!("delete fixup at {curr_node}: black sibling {sibling} with black children");
                self.set_color(sibling, NodeColor::Red);
                curr_node = parent;
                continue;
            }

            if self.color_of(far_nephew).is_black() {
                trace!("delete fixup at {curr_node}: red near nephew {near_nephew}");
                self.set_color(near_nephew, NodeColor::Black);
                self.set_color(sibling, NodeColor::Red);
                self.rotate(sibling, far);
                sibling = self.links[parent].child(far);
            }

            trace!("delete fixup at {curr_node}: red far nephew under {sibling}");
            self.set_color(sibling, self.color_of(parent));
            self.set_color(parent, NodeColor::Black);
            let far_nephew = self.links[sibling].child(far);
            self.set_color(far_nephew, NodeColor::Black);
            self.rotate(parent, side);

            curr_node = self.root;
        }

        self.set_color(curr_node, NodeColor::Black);
    }

    /// Pushes `slot` onto the free list and hands back its entry.
    pub(crate) fn release(&mut self, slot: usize) -> (K, V) {
        let generation = self.links[slot].generation.wrapping_add(1);
        self.links[slot] = Links {
            parent: self.free_head,
            ..Links::new_isolated(BLACK_NIL, generation)
        };
        self.free_head = slot;

        match self.entries[slot].take() {
            Some(entry) => entry,
            None => unreachable!("slot {slot} released twice"),
        }
    }

    pub fn pop_first(&mut self) -> Option<(K, V)>
    where
        K: Ord,
    {
        if self.root == BLACK_NIL {
            return None;
        }

        let node = subtree_min(&self.links, self.root);
        let entry = self.remove_index(node);
        self.check_invariants();

        Some(entry)
    }

    pub fn pop_last(&mut self) -> Option<(K, V)>
    where
        K: Ord,
    {
        if self.root == BLACK_NIL {
            return None;
        }

        let node = subtree_max(&self.links, self.root);
        let entry = self.remove_index(node);
        self.check_invariants();

        Some(entry)
    }
}

impl<K: Ord, V> Redbark<K, V> {
    /// Removes the node named by `node` and returns its entry.
    ///
    /// Fails with [`RedbarkError::StaleHandle`] if the node was already removed.
    pub fn remove(&mut self, node: NodeHandle) -> Result<(K, V), RedbarkError> {
        let node = self.resolve(node)?;
        let entry = self.remove_index(node);
        self.check_invariants();

        Ok(entry)
    }

    /// Removes one entry whose key equals `key`, if any.
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_index(key);
        if node == BLACK_NIL {
            return None;
        }

        let entry = self.remove_index(node);
        self.check_invariants();

        Some(entry)
    }
}

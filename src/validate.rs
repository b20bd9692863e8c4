use crate::node::{BLACK_NIL, next_index, subtree_min};
use crate::{InvariantViolation, Redbark};

impl<K, V> Redbark<K, V> {
    /// Number of nodes on the longest path from the root to a leaf.
    #[must_use]
    pub fn height(&self) -> usize {
        self.subtree_height(self.root)
    }

    /// Black nodes met on a path from the root down to the sentinel, sentinel included and root
    /// excluded. Zero for an empty tree.
    #[must_use]
    pub fn black_height(&self) -> usize {
        if self.root == BLACK_NIL {
            return 0;
        }

        let mut count = 0;
        let mut node = self.links[self.root].left;
        loop {
            if self.color_of(node).is_black() {
                count += 1;
            }
            if node == BLACK_NIL {
                return count;
            }
            node = self.links[node].left;
        }
    }

    fn subtree_height(&self, node: usize) -> usize {
        if node == BLACK_NIL {
            return 0;
        }

        let links = &self.links[node];
        1 + self
            .subtree_height(links.left)
            .max(self.subtree_height(links.right))
    }

    /// Checks coloring and link consistency below `node`, returning its black height counted
    /// with the sentinel as one.
    fn check_subtree(&self, node: usize, reachable: &mut usize) -> Result<usize, InvariantViolation> {
        if node == BLACK_NIL {
            return Ok(1);
        }
        *reachable += 1;

        let links = &self.links[node];
        let mut heights = [0; 2];

        for (height, child) in heights.iter_mut().zip([links.left, links.right]) {
            if child == BLACK_NIL {
                *height = 1;
                continue;
            }

            if self.links[child].parent != node {
                return Err(InvariantViolation::BrokenParentLink {
                    parent: node,
                    child,
                });
            }
            if links.color.is_red() && self.color_of(child).is_red() {
                return Err(InvariantViolation::RedRedEdge { node, child });
            }

            *height = self.check_subtree(child, reachable)?;
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch { node, left, right });
        }

        Ok(left + usize::from(links.color.is_black()))
    }
}

impl<K: Ord, V> Redbark<K, V> {
    /// Verifies every red-black and search-tree invariant.
    ///
    /// Runs in `O(n)`; meant for tests and for the `check-invariants` feature.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let sentinel = &self.links[BLACK_NIL];
        if !sentinel.color.is_black() {
            return Err(InvariantViolation::SentinelNotBlack);
        }
        if sentinel.parent != BLACK_NIL || sentinel.left != BLACK_NIL || sentinel.right != BLACK_NIL
        {
            return Err(InvariantViolation::SentinelLinked);
        }

        if self.root != BLACK_NIL {
            let root = &self.links[self.root];
            if root.color.is_red() {
                return Err(InvariantViolation::RedRoot { node: self.root });
            }
            if root.parent != BLACK_NIL {
                return Err(InvariantViolation::RootHasParent {
                    node: self.root,
                    parent: root.parent,
                });
            }
        }

        let mut reachable = 0;
        self.check_subtree(self.root, &mut reachable)?;
        if reachable != self.len {
            return Err(InvariantViolation::LengthMismatch {
                reachable,
                len: self.len,
            });
        }

        if self.root == BLACK_NIL {
            return Ok(());
        }

        let mut prev = subtree_min(&self.links, self.root);
        let mut node = next_index(&self.links, prev);
        while node != BLACK_NIL {
            if self.key_at(prev) > self.key_at(node) {
                return Err(InvariantViolation::OrderViolation { node });
            }

            prev = node;
            node = next_index(&self.links, node);
        }

        Ok(())
    }
}

/// Index of the shared sentinel. Every leaf link and the parent link of the root point here.
pub(crate) const BLACK_NIL: usize = 0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum NodeColor {
    #[default]
    Red,
    Black,
}

impl NodeColor {
    #[inline]
    pub(crate) fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }

    #[inline]
    pub(crate) fn is_black(self) -> bool {
        matches!(self, Self::Black)
    }
}

/// Which child link of a node we are talking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Structural part of a slot.
///
/// Vacant slots reuse `parent` as the next link of the free list.
#[derive(Debug, Clone)]
pub(crate) struct Links {
    pub(crate) color: NodeColor,
    pub(crate) parent: usize,
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) generation: u64,
}

impl Links {
    pub(crate) fn sentinel() -> Self {
        Self {
            color: NodeColor::Black,
            parent: BLACK_NIL,
            left: BLACK_NIL,
            right: BLACK_NIL,
            generation: 0,
        }
    }

    /// Fresh red leaf hanging below `parent`.
    pub(crate) fn new_isolated(parent: usize, generation: u64) -> Self {
        Self {
            color: NodeColor::default(),
            parent,
            left: BLACK_NIL,
            right: BLACK_NIL,
            generation,
        }
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> usize {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Handle to a node living inside a [`Redbark`](crate::Redbark) tree.
///
/// Handles are plain copyable tokens. They stay valid until the node they name is removed;
/// afterwards every method taking the handle reports
/// [`RedbarkError::StaleHandle`](crate::RedbarkError::StaleHandle), even if the slot has been
/// reused by a later insertion. Handles are bound to the tree that issued them, clones included:
/// passing one to any other tree is reported the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) tree: u64,
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl NodeHandle {
    /// Position of the node in the tree storage.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

pub(crate) fn subtree_min(links: &[Links], mut node: usize) -> usize {
    while links[node].left != BLACK_NIL {
        node = links[node].left;
    }

    node
}

pub(crate) fn subtree_max(links: &[Links], mut node: usize) -> usize {
    while links[node].right != BLACK_NIL {
        node = links[node].right;
    }

    node
}

/// In-order successor of `node`, or [`BLACK_NIL`] if `node` holds the largest key.
pub(crate) fn next_index(links: &[Links], mut node: usize) -> usize {
    if links[node].right != BLACK_NIL {
        return subtree_min(links, links[node].right);
    }

    let mut parent = links[node].parent;
    while parent != BLACK_NIL && node == links[parent].right {
        node = parent;
        parent = links[parent].parent;
    }

    parent
}

/// In-order predecessor of `node`, or [`BLACK_NIL`] if `node` holds the smallest key.
pub(crate) fn prev_index(links: &[Links], mut node: usize) -> usize {
    if links[node].left != BLACK_NIL {
        return subtree_max(links, links[node].left);
    }

    let mut parent = links[node].parent;
    while parent != BLACK_NIL && node == links[parent].left {
        node = parent;
        parent = links[parent].parent;
    }

    parent
}

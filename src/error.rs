use thiserror::Error;

/// Errors returned by handle-based tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedbarkError {
    /// The handle does not name a live node, usually because it was removed.
    #[error("node handle {index} is stale or was never issued by this tree")]
    StaleHandle { index: usize },
}

/// Structural defect found by [`Redbark::validate`](crate::Redbark::validate).
///
/// None of these can be caused by calling the public API; seeing one means the balancing code is
/// broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root node {node} is red")]
    RedRoot { node: usize },
    #[error("sentinel is not black")]
    SentinelNotBlack,
    #[error("sentinel has child links")]
    SentinelLinked,
    #[error("root node {node} has parent {parent}")]
    RootHasParent { node: usize, parent: usize },
    #[error("red node {node} has red child {child}")]
    RedRedEdge { node: usize, child: usize },
    #[error("black height below node {node} differs: {left} on the left, {right} on the right")]
    BlackHeightMismatch {
        node: usize,
        left: usize,
        right: usize,
    },
    #[error("node {node} is ordered before a smaller key")]
    OrderViolation { node: usize },
    #[error("node {child} does not link back to parent {parent}")]
    BrokenParentLink { parent: usize, child: usize },
    #[error("{reachable} nodes reachable from the root, but {len} tracked")]
    LengthMismatch { reachable: usize, len: usize },
}

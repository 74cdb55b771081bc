use thiserror::Error;

/// User-facing failure modes.
///
/// Structural defects (duplicate keys inside a node, inserting into a full
/// node) are unreachable in a correct engine and assert instead of surfacing
/// here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum TreeError {
    /// A first/last-entry query was made against an empty tree or view.
    #[error("the tree contains no entries")]
    EmptyTree,
    /// A range was requested with its lower bound above its upper bound, or
    /// outside the bounds of the view it was carved from.
    #[error("invalid range bounds")]
    InvalidRange,
    /// A range-view mutation targeted a key outside the view's bounds.
    #[error("key is outside the view's bounds")]
    OutOfBounds,
}

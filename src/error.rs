/// A broken structural invariant found by `AvlSet::validate`.
///
/// Slots are internal node indices, useful only for telling reports apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("root node has a parent link")]
    RootHasParent,

    #[error("node in slot {slot} does not link back to its parent")]
    BrokenParentLink { slot: usize },

    #[error("children of node in slot {slot} are out of order")]
    OrderViolation { slot: usize },

    #[error("node in slot {slot} has height {stored}, expected {expected}")]
    WrongHeight {
        slot: usize,
        stored: usize,
        expected: usize,
    },

    #[error("node in slot {slot} is unbalanced (left height {left_height}, right height {right_height})")]
    Unbalanced {
        slot: usize,
        left_height: usize,
        right_height: usize,
    },

    #[error("tree holds {counted} reachable nodes but records {recorded}")]
    LengthMismatch { counted: usize, recorded: usize },
}

use core::fmt::Debug;

/// Stable identifier for an entity (agents are entities too).
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding and trace events
pub trait EntityId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl EntityId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl EntityId for u32 {
    fn stable_id(self) -> u64 {
        u64::from(self)
    }
}

impl EntityId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

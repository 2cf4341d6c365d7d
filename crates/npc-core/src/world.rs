use crate::EntityId;

/// Read-only access to the game world.
///
/// The kernel does not prescribe which queries a world exposes. Entity liveness, component
/// and spatial queries belong to extension traits defined next to the facts and operators
/// that need them (see `npc-nav` for positions).
pub trait WorldView {
    type Entity: EntityId;
}

/// Write access used by operators. Facts only ever see `&W`.
pub trait WorldMut: WorldView {}

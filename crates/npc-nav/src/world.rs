use npc_core::{WorldMut, WorldView};

use crate::{Pathfinder, Vec2};

pub trait NavWorldView: WorldView {
    /// `None` once the entity no longer exists.
    fn position(&self, entity: Self::Entity) -> Option<Vec2>;

    fn pathfinder(&self) -> &dyn Pathfinder;
}

pub trait NavWorldMut: WorldMut + NavWorldView {
    fn set_position(&mut self, entity: Self::Entity, position: Vec2);
}

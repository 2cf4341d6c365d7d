use npc_core::{TickContext, WorldMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorStatus {
    Continuing,
    Success,
    Failed,
}

/// Run-time behavior bound to a planned primitive task.
///
/// Only the operator at the head of the plan is ticked. `startup` runs once before its first
/// `execute`; `cancel` runs if the plan is dropped while this operator is at the head and has
/// started, and must release anything still in flight (path requests, reservations).
pub trait Operator<W>: 'static
where
    W: WorldMut + 'static,
{
    fn startup(&mut self, _ctx: &TickContext, _entity: W::Entity, _world: &mut W) {}

    fn execute(&mut self, ctx: &TickContext, entity: W::Entity, world: &mut W) -> OperatorStatus;

    fn cancel(&mut self, _ctx: &TickContext, _entity: W::Entity, _world: &mut W) {}

    /// Throttled operators (interactions) run at most once per
    /// [`crate::AgentConfig::operator_interval_seconds`].
    fn is_throttled(&self) -> bool {
        false
    }
}

/// Operator backed by a closure.
pub struct FnOperator<W>
where
    W: WorldMut + 'static,
{
    execute: Box<dyn FnMut(&TickContext, W::Entity, &mut W) -> OperatorStatus>,
    throttled: bool,
}

impl<W> FnOperator<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        execute: impl FnMut(&TickContext, W::Entity, &mut W) -> OperatorStatus + 'static,
    ) -> Self {
        Self {
            execute: Box::new(execute),
            throttled: false,
        }
    }

    pub fn throttled(mut self) -> Self {
        self.throttled = true;
        self
    }
}

impl<W> Operator<W> for FnOperator<W>
where
    W: WorldMut + 'static,
{
    fn execute(&mut self, ctx: &TickContext, entity: W::Entity, world: &mut W) -> OperatorStatus {
        (self.execute)(ctx, entity, world)
    }

    fn is_throttled(&self) -> bool {
        self.throttled
    }
}

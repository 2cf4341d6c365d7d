use npc_core::{EntityId, TickContext};
use npc_htn::{Operator, OperatorStatus};
use tracing::trace;

use crate::{NavPath, NavWorldMut, PathPoll, PathRequest, PathTicket, TraversalMask, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveTarget<E> {
    Entity(E),
    Position(Vec2),
}

/// Walks the agent to within `proximity` of a target, following paths from the world's
/// [`crate::Pathfinder`].
///
/// While the path request is in flight the operator reports `Continuing`. A moving entity
/// target is re-routed once it leaves the proximity of the goal the current path was planned
/// for. Fails when the agent or the target entity disappears, or when no route exists.
#[derive(Debug)]
pub struct MoveToOperator<E> {
    target: MoveTarget<E>,
    speed: f32,
    proximity: f32,
    mask: TraversalMask,
    ticket: Option<PathTicket>,
    path: Option<NavPath>,
    routed_goal: Option<Vec2>,
    next_index: usize,
}

impl<E: EntityId> MoveToOperator<E> {
    pub fn new(target: MoveTarget<E>, speed: f32, proximity: f32) -> Self {
        Self {
            target,
            speed,
            proximity: proximity.max(0.0),
            mask: TraversalMask::default(),
            ticket: None,
            path: None,
            routed_goal: None,
            next_index: 1,
        }
    }

    pub fn with_mask(mut self, mask: TraversalMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn target(&self) -> MoveTarget<E> {
        self.target
    }

    /// Whether a path request is still outstanding.
    pub fn is_waiting(&self) -> bool {
        self.ticket.is_some()
    }

    fn goal<W>(&self, world: &W) -> Option<Vec2>
    where
        W: NavWorldMut<Entity = E>,
    {
        match self.target {
            MoveTarget::Entity(entity) => world.position(entity),
            MoveTarget::Position(goal) => Some(goal),
        }
    }

    fn request<W>(&mut self, start: Vec2, goal: Vec2, world: &W)
    where
        W: NavWorldMut<Entity = E>,
    {
        let request = PathRequest::new(start, goal)
            .with_mask(self.mask)
            .with_proximity(self.proximity);
        self.ticket = Some(world.pathfinder().request(request));
        self.path = None;
        self.routed_goal = Some(goal);
    }

    fn reset(&mut self) {
        self.ticket = None;
        self.path = None;
        self.routed_goal = None;
    }
}

impl<W> Operator<W> for MoveToOperator<W::Entity>
where
    W: NavWorldMut + 'static,
{
    fn startup(&mut self, _ctx: &TickContext, entity: W::Entity, world: &mut W) {
        if let (Some(start), Some(goal)) = (world.position(entity), self.goal(world)) {
            self.request(start, goal, world);
        }
    }

    fn execute(&mut self, ctx: &TickContext, entity: W::Entity, world: &mut W) -> OperatorStatus {
        let Some(pos) = world.position(entity) else {
            return OperatorStatus::Failed;
        };
        let Some(goal) = self.goal(world) else {
            trace!(?entity, "move target gone");
            return OperatorStatus::Failed;
        };

        if pos.distance(goal) <= self.proximity {
            self.reset();
            return OperatorStatus::Success;
        }

        let drifted = self
            .routed_goal
            .is_some_and(|routed| routed.distance(goal) > self.proximity);
        if drifted || (self.ticket.is_none() && self.path.is_none()) {
            self.request(pos, goal, world);
        }

        if let Some(ticket) = self.ticket.as_mut() {
            match ticket.poll() {
                PathPoll::Pending => return OperatorStatus::Continuing,
                PathPoll::NotFound => {
                    trace!(?entity, ?goal, "no route");
                    self.reset();
                    return OperatorStatus::Failed;
                }
                PathPoll::Found(path) => {
                    self.ticket = None;
                    self.path = Some(path);
                    self.next_index = 1;
                }
            }
        }

        let Some(path) = &self.path else {
            return OperatorStatus::Continuing;
        };

        let dt = ctx.dt_seconds.max(0.0);
        let mut remaining = self.speed.max(0.0) * dt;

        let mut current = pos;
        while self.next_index < path.points.len() && remaining > 0.0 {
            let target = path.points[self.next_index];
            let to_target = target - current;
            let dist = to_target.length();

            if dist <= f32::EPSILON {
                self.next_index += 1;
                continue;
            }

            if remaining >= dist {
                current = target;
                self.next_index += 1;
                remaining -= dist;
                continue;
            }

            current = current + to_target * (remaining / dist);
            break;
        }

        let exhausted = self.next_index >= path.points.len();
        world.set_position(entity, current);

        if current.distance(goal) <= self.proximity {
            self.reset();
            return OperatorStatus::Success;
        }
        if exhausted {
            // Path ran out short of the goal: route again next tick.
            self.path = None;
            self.routed_goal = None;
        }
        OperatorStatus::Continuing
    }

    fn cancel(&mut self, _ctx: &TickContext, entity: W::Entity, _world: &mut W) {
        if self.ticket.is_some() {
            trace!(?entity, "path request cancelled");
        }
        self.reset();
    }
}

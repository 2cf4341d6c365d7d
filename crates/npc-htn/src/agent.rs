//! Plan executor: one agent's root-task queue, live facts, planning cooldown and the
//! tick-by-tick state machine that drives the head operator of its plan.

use std::fmt;

use npc_core::{EntityId, FactContext, FactSet, TickContext, WorldMut, WorldState};
use npc_tools::{TraceEvent, TraceLog, Tracer};
use tracing::debug;

use crate::{
    AgentConfig, OperatorStatus, Plan, PlanAttempt, PlanError, Planner, PlannerConfig, Task,
};

/// Identifies a kind of root task ("eat_food", "equip_uniform").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootTaskId(pub &'static str);

impl fmt::Display for RootTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A root task kind plus the factory that builds a fresh task graph for every planning pass.
pub struct RootTask<W>
where
    W: WorldMut + 'static,
{
    id: RootTaskId,
    make: Box<dyn Fn() -> Task<W>>,
}

impl<W> RootTask<W>
where
    W: WorldMut + 'static,
{
    pub fn new(id: RootTaskId, make: impl Fn() -> Task<W> + 'static) -> Self {
        Self {
            id,
            make: Box::new(make),
        }
    }

    pub fn id(&self) -> RootTaskId {
        self.id
    }

    pub fn instantiate(&self) -> Task<W> {
        (self.make)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No plan.
    Idle,
    /// A planning pass is running.
    Planning,
    /// A plan is active and its head operator is ticking.
    Executing,
    /// The last plan completed this tick. Becomes `Idle` on the next update.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// No feasible decomposition for the root task.
    PlanningFailed,
    /// An operator failed; the rest of the plan was dropped.
    PlanAborted,
    /// A new plan started executing.
    Continuing,
    /// Every step of the plan succeeded.
    Success,
}

/// Message from an agent to its coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanStatus<E> {
    pub entity: E,
    pub root: RootTaskId,
    pub outcome: PlanOutcome,
}

struct RootEntry<W>
where
    W: WorldMut + 'static,
{
    priority: i32,
    seq: u64,
    task: RootTask<W>,
}

struct ActivePlan<W>
where
    W: WorldMut + 'static,
{
    root: RootTaskId,
    plan: Plan<W>,
    head_started: bool,
}

pub struct Agent<W>
where
    W: WorldMut + 'static,
{
    entity: W::Entity,
    config: AgentConfig,
    planner: Planner,
    facts: FactSet<W>,
    live: WorldState,
    roots: Vec<RootEntry<W>>,
    next_seq: u64,
    roots_dirty: bool,
    active: Option<ActivePlan<W>>,
    state: AgentState,
    plan_timer: f32,
    operator_timer: f32,
    tracer: Tracer,
}

impl<W> Agent<W>
where
    W: WorldMut + 'static,
{
    pub fn new(entity: W::Entity, facts: FactSet<W>) -> Self {
        let config = AgentConfig::default();
        Self {
            entity,
            planner: Planner::default(),
            facts,
            live: WorldState::new(),
            roots: Vec::new(),
            next_seq: 0,
            roots_dirty: false,
            active: None,
            state: AgentState::Idle,
            // The first update plans immediately.
            plan_timer: config.planning_cooldown_seconds,
            operator_timer: config.operator_interval_seconds,
            tracer: Tracer::default(),
            config,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.plan_timer = config.planning_cooldown_seconds;
        self.operator_timer = config.operator_interval_seconds;
        self.config = config;
        self
    }

    pub fn with_planner_config(mut self, config: PlannerConfig) -> Self {
        self.planner = Planner::new().with_config(config);
        self
    }

    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn entity(&self) -> W::Entity {
        self.entity
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Facts as polled on the last update.
    pub fn live_state(&self) -> &WorldState {
        &self.live
    }

    pub fn plan(&self) -> Option<&Plan<W>> {
        self.active.as_ref().map(|active| &active.plan)
    }

    pub fn current_root(&self) -> Option<RootTaskId> {
        self.active.as_ref().map(|active| active.root)
    }

    pub fn trace_log(&self) -> Option<&TraceLog> {
        self.tracer.log()
    }

    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Queue a root task. An entry with the same id is replaced and keeps its queue position.
    pub fn add_root_task(&mut self, priority: i32, task: RootTask<W>) {
        self.roots_dirty = true;
        if let Some(entry) = self.roots.iter_mut().find(|e| e.task.id() == task.id()) {
            entry.priority = priority;
            entry.task = task;
            return;
        }
        self.roots.push(RootEntry {
            priority,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Dequeue a root task. A running plan for it is abandoned on the next update.
    pub fn remove_root_task(&mut self, id: RootTaskId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|e| e.task.id() != id);
        let removed = self.roots.len() != before;
        self.roots_dirty |= removed;
        removed
    }

    pub fn root_priority(&self, id: RootTaskId) -> Option<i32> {
        self.roots
            .iter()
            .find(|e| e.task.id() == id)
            .map(|e| e.priority)
    }

    pub fn set_root_priority(&mut self, id: RootTaskId, priority: i32) -> bool {
        let Some(entry) = self.roots.iter_mut().find(|e| e.task.id() == id) else {
            return false;
        };
        entry.priority = priority;
        self.roots_dirty = true;
        true
    }

    pub fn root_tasks(&self) -> impl Iterator<Item = (RootTaskId, i32)> + '_ {
        self.roots.iter().map(|e| (e.task.id(), e.priority))
    }

    /// Highest priority queued root; ties go to the earliest queued.
    pub fn selected_root(&self) -> Option<RootTaskId> {
        self.selected_entry().map(|e| e.task.id())
    }

    fn selected_entry(&self) -> Option<&RootEntry<W>> {
        self.roots
            .iter()
            .max_by(|a, b| a.priority.cmp(&b.priority).then(b.seq.cmp(&a.seq)))
    }

    /// Drop the running plan, cancelling its head operator. Returns the `PlanAborted` status
    /// for the dropped plan's root, if there was one.
    pub fn clear_plan(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
    ) -> Option<PlanStatus<W::Entity>> {
        let status = self
            .active
            .take()
            .map(|active| self.abandon(active, ctx, world));
        self.state = AgentState::Idle;
        status
    }

    /// Advance one simulation tick: poll facts, plan if due, tick the head operator.
    ///
    /// Soft planning failures and operator failures are reported in the returned statuses;
    /// only a malformed task graph is an error.
    pub fn update(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
    ) -> Result<Vec<PlanStatus<W::Entity>>, PlanError> {
        let mut statuses = Vec::new();

        let facts_changed = self.refresh_facts(ctx, world);
        if self.state == AgentState::Exhausted {
            self.state = AgentState::Idle;
        }
        self.drop_orphaned_plan(ctx, world, &mut statuses);

        let dt = ctx.dt_seconds.max(0.0);
        self.plan_timer += dt;
        self.operator_timer += dt;

        let cooldown_elapsed = self.plan_timer >= self.config.planning_cooldown_seconds;
        let eager = self.roots_dirty
            || (facts_changed && self.config.plan_on_fact_change && self.active.is_none());
        if cooldown_elapsed || eager {
            self.plan_timer = 0.0;
            self.roots_dirty = false;
            self.think(ctx, world, &mut statuses)?;
        }

        self.execute_head(ctx, world, &mut statuses);
        Ok(statuses)
    }

    fn refresh_facts(&mut self, ctx: &TickContext, world: &W) -> bool {
        let fact_ctx = FactContext {
            tick: ctx.tick,
            entity: self.entity,
            vision_radius: self.config.vision_radius,
        };
        self.facts.poll(&fact_ctx, world, &mut self.live);
        !self.live.drain_changes().is_empty()
    }

    fn drop_orphaned_plan(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        statuses: &mut Vec<PlanStatus<W::Entity>>,
    ) {
        let orphaned = match &self.active {
            Some(active) => !self.roots.iter().any(|e| e.task.id() == active.root),
            None => false,
        };
        if orphaned {
            statuses.extend(self.clear_plan(ctx, world));
        }
    }

    fn think(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        statuses: &mut Vec<PlanStatus<W::Entity>>,
    ) -> Result<(), PlanError> {
        let Some((root, task)) = self
            .selected_entry()
            .map(|e| (e.task.id(), e.task.instantiate()))
        else {
            return Ok(());
        };

        self.tracer.emit(
            TraceEvent::new(ctx.tick, "htn.plan.call")
                .with_a(self.entity.stable_id())
                .with_b(u64::from(self.active.is_some())),
        );

        let replanning_same_root = self.current_root() == Some(root);
        if !replanning_same_root {
            self.state = AgentState::Planning;
        }
        let attempt = self.planner.plan(task, &self.live);

        let attempt = match attempt {
            Ok(attempt) => attempt,
            Err(err) => {
                self.state = self.resting_state();
                return Err(err);
            }
        };

        match attempt {
            PlanAttempt::Found(plan) => {
                let better = match &self.active {
                    Some(active) if replanning_same_root => plan.is_better_than(&active.plan),
                    _ => true,
                };
                if !better {
                    self.tracer.emit(
                        TraceEvent::new(ctx.tick, "htn.plan.kept")
                            .with_a(self.entity.stable_id())
                            .with_b(plan.len() as u64),
                    );
                    statuses.push(self.status(root, PlanOutcome::Continuing));
                    return Ok(());
                }

                let tag = if self.active.is_some() {
                    "htn.plan.replace"
                } else {
                    "htn.plan.start"
                };
                if let Some(previous) = self.active.take() {
                    let aborted = self.abandon(previous, ctx, world);
                    // A better route for the same root continues it rather than ending it.
                    if aborted.root != root {
                        statuses.push(aborted);
                    }
                }
                debug!(
                    entity = ?self.entity,
                    root = %root,
                    steps = ?plan.step_names(),
                    route = ?plan.route(),
                    "plan started"
                );
                self.tracer.emit(
                    TraceEvent::new(ctx.tick, tag)
                        .with_a(self.entity.stable_id())
                        .with_b(plan.len() as u64),
                );
                self.active = Some(ActivePlan {
                    root,
                    plan,
                    head_started: false,
                });
                self.state = AgentState::Executing;
                statuses.push(self.status(root, PlanOutcome::Continuing));
            }
            PlanAttempt::Failed(failure) => {
                self.tracer.emit(
                    TraceEvent::new(ctx.tick, "htn.plan.none")
                        .with_a(self.entity.stable_id())
                        .with_b(failure.stats.expansions as u64),
                );
                if replanning_same_root {
                    // The running plan is still valid as far as anyone knows.
                    statuses.push(self.status(root, PlanOutcome::Continuing));
                    return Ok(());
                }
                debug!(
                    entity = ?self.entity,
                    root = %root,
                    reason = ?failure.reason,
                    "planning failed"
                );
                self.state = self.resting_state();
                statuses.push(self.status(root, PlanOutcome::PlanningFailed));
            }
        }
        Ok(())
    }

    fn execute_head(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        statuses: &mut Vec<PlanStatus<W::Entity>>,
    ) {
        let entity = self.entity;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let root = active.root;
        let Some(step) = active.plan.head_mut() else {
            return;
        };

        if step.operator.is_throttled() {
            if self.operator_timer < self.config.operator_interval_seconds {
                return;
            }
            self.operator_timer = 0.0;
        }

        if !active.head_started {
            step.operator.startup(ctx, entity, world);
            active.head_started = true;
        }

        match step.operator.execute(ctx, entity, world) {
            OperatorStatus::Continuing => {}
            OperatorStatus::Success => {
                active.plan.pop_head();
                active.head_started = false;
                let remaining = active.plan.len();
                self.tracer.emit(
                    TraceEvent::new(ctx.tick, "htn.step.success")
                        .with_a(entity.stable_id())
                        .with_b(remaining as u64),
                );
                if remaining == 0 {
                    self.active = None;
                    self.state = AgentState::Exhausted;
                    debug!(entity = ?entity, root = %root, "plan succeeded");
                    self.tracer.emit(
                        TraceEvent::new(ctx.tick, "htn.plan.outcome.success")
                            .with_a(entity.stable_id()),
                    );
                    statuses.push(self.status(root, PlanOutcome::Success));
                }
            }
            OperatorStatus::Failed => {
                let failed = step.name().to_owned();
                self.active = None;
                self.state = AgentState::Idle;
                debug!(entity = ?entity, root = %root, step = %failed, "plan aborted");
                self.tracer.emit(
                    TraceEvent::new(ctx.tick, "htn.plan.outcome.aborted")
                        .with_a(entity.stable_id()),
                );
                statuses.push(self.status(root, PlanOutcome::PlanAborted));
            }
        }
    }

    fn abandon(
        &mut self,
        mut active: ActivePlan<W>,
        ctx: &TickContext,
        world: &mut W,
    ) -> PlanStatus<W::Entity> {
        if active.head_started {
            if let Some(step) = active.plan.head_mut() {
                step.operator.cancel(ctx, self.entity, world);
            }
        }
        debug!(entity = ?self.entity, root = %active.root, "plan abandoned");
        self.tracer.emit(
            TraceEvent::new(ctx.tick, "htn.plan.abandoned")
                .with_a(self.entity.stable_id())
                .with_b(active.plan.len() as u64),
        );
        self.status(active.root, PlanOutcome::PlanAborted)
    }

    fn resting_state(&self) -> AgentState {
        if self.active.is_some() {
            AgentState::Executing
        } else {
            AgentState::Idle
        }
    }

    fn status(&self, root: RootTaskId, outcome: PlanOutcome) -> PlanStatus<W::Entity> {
        PlanStatus {
            entity: self.entity,
            root,
            outcome,
        }
    }
}

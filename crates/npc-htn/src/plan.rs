use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use npc_core::{WorldMut, WorldState};

use crate::{Operator, SearchStats};

/// A primitive task that made it into a plan, with its live operator.
pub struct PlannedStep<W>
where
    W: WorldMut + 'static,
{
    name: String,
    pub(crate) operator: Box<dyn Operator<W>>,
}

impl<W> PlannedStep<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(name: String, operator: Box<dyn Operator<W>>) -> Self {
        Self { name, operator }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<W> fmt::Debug for PlannedStep<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlannedStep").field(&self.name).finish()
    }
}

/// Output of one successful planning pass.
pub struct Plan<W>
where
    W: WorldMut + 'static,
{
    pub(crate) root: String,
    pub(crate) steps: VecDeque<PlannedStep<W>>,
    pub(crate) route: Vec<usize>,
    pub(crate) predicted: WorldState,
    pub(crate) stats: SearchStats,
    pub(crate) elapsed: Duration,
}

impl<W> Plan<W>
where
    W: WorldMut + 'static,
{
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &PlannedStep<W>> + '_ {
        self.steps.iter()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(PlannedStep::name).collect()
    }

    pub fn head(&self) -> Option<&PlannedStep<W>> {
        self.steps.front()
    }

    /// Method traversal record: the method index chosen at each compound expansion, in
    /// expansion order.
    pub fn route(&self) -> &[usize] {
        &self.route
    }

    /// Planning state after every accepted task's effects.
    pub fn predicted_state(&self) -> &WorldState {
        &self.predicted
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether this plan took an earlier method than `other` at the first point their routes
    /// diverge.
    pub fn is_better_than(&self, other: &Plan<W>) -> bool {
        route_is_better(&self.route, &other.route)
    }

    pub(crate) fn head_mut(&mut self) -> Option<&mut PlannedStep<W>> {
        self.steps.front_mut()
    }

    pub(crate) fn pop_head(&mut self) -> Option<PlannedStep<W>> {
        self.steps.pop_front()
    }
}

impl<W> fmt::Debug for Plan<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("root", &self.root)
            .field("steps", &self.steps)
            .field("route", &self.route)
            .field("stats", &self.stats)
            .finish()
    }
}

/// `candidate` beats `current` if, at the first index where they differ, it chose the lower
/// method index. Identical routes and shared prefixes are not improvements.
pub fn route_is_better(candidate: &[usize], current: &[usize]) -> bool {
    for (new, old) in candidate.iter().zip(current.iter()) {
        if new != old {
            return new < old;
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The root compound task's own preconditions failed.
    RootRejected,
    /// Every method of every open compound expansion was tried.
    Exhausted,
    /// The search finished without accepting any primitive task.
    EmptyPlan,
    /// `PlannerConfig::max_expansions` was reached.
    BudgetExhausted,
}

/// Diagnostics for a planning pass that produced no plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFailure {
    pub root: String,
    pub reason: FailureReason,
    /// Traversal record of the most recently abandoned branch.
    pub route: Vec<usize>,
    pub stats: SearchStats,
    pub elapsed: Duration,
}

pub enum PlanAttempt<W>
where
    W: WorldMut + 'static,
{
    Found(Plan<W>),
    Failed(PlanFailure),
}

impl<W> PlanAttempt<W>
where
    W: WorldMut + 'static,
{
    pub fn is_found(&self) -> bool {
        matches!(self, PlanAttempt::Found(_))
    }

    pub fn plan(self) -> Option<Plan<W>> {
        match self {
            PlanAttempt::Found(plan) => Some(plan),
            PlanAttempt::Failed(_) => None,
        }
    }

    pub fn failure(self) -> Option<PlanFailure> {
        match self {
            PlanAttempt::Found(_) => None,
            PlanAttempt::Failed(failure) => Some(failure),
        }
    }
}

impl<W> fmt::Debug for PlanAttempt<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAttempt::Found(plan) => f.debug_tuple("Found").field(plan).finish(),
            PlanAttempt::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
        }
    }
}

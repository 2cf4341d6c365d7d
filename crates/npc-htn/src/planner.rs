use std::time::Instant;

use npc_core::{WorldMut, WorldState};
use tracing::{debug, warn};

use crate::blackboard::{Blackboard, SearchEnd};
use crate::{FailureReason, Plan, PlanAttempt, PlanError, PlanFailure, PlannerConfig, Task};

/// Turns a root task and a world state into a plan.
///
/// Methods are tried strictly in declaration order and the first satisfiable decomposition
/// wins; there is no cost comparison between complete plans. The search is deterministic for
/// a fixed state and task graph.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run one planning pass against a private fork of `state`.
    ///
    /// Operators are built only once the search has succeeded. `Ok(PlanAttempt::Failed)` means
    /// no feasible decomposition exists; `Err` means the task graph itself is malformed.
    pub fn plan<W>(&self, root: Task<W>, state: &WorldState) -> Result<PlanAttempt<W>, PlanError>
    where
        W: WorldMut + 'static,
    {
        let started = Instant::now();
        let root_name = root.name().to_owned();

        let mut blackboard = Blackboard::new(root, state);
        let end = blackboard
            .run(self.config.max_expansions)
            .inspect_err(|err| warn!(root = %root_name, error = %err, "malformed task graph"))?;

        let reason = match end {
            SearchEnd::Complete if blackboard.accepted() > 0 => None,
            SearchEnd::Complete => Some(FailureReason::EmptyPlan),
            SearchEnd::RootRejected => Some(FailureReason::RootRejected),
            SearchEnd::Exhausted => Some(FailureReason::Exhausted),
            SearchEnd::BudgetExhausted => Some(FailureReason::BudgetExhausted),
        };

        let stats = blackboard.stats();
        if let Some(reason) = reason {
            let failure = PlanFailure {
                root: root_name,
                reason,
                route: blackboard.abandoned_route().to_vec(),
                stats,
                elapsed: started.elapsed(),
            };
            debug!(
                root = %failure.root,
                reason = ?failure.reason,
                route = ?failure.route,
                expansions = stats.expansions,
                backtracks = stats.backtracks,
                "no plan"
            );
            return Ok(PlanAttempt::Failed(failure));
        }

        let (steps, route, predicted) = blackboard.finish()?;
        let plan = Plan {
            root: root_name,
            steps: steps.into(),
            route,
            predicted,
            stats,
            elapsed: started.elapsed(),
        };
        debug!(
            root = %plan.root,
            steps = plan.len(),
            route = ?plan.route,
            expansions = stats.expansions,
            backtracks = stats.backtracks,
            elapsed_us = plan.elapsed.as_micros() as u64,
            "plan found"
        );
        Ok(PlanAttempt::Found(plan))
    }
}

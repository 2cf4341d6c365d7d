//! Group manager: reacts to agents' plan status messages by adjusting their root-task queues.

use std::collections::BTreeMap;

use npc_core::{EntityId, WorldMut};
use tracing::debug;

use crate::{Agent, CoordinatorConfig, PlanOutcome, PlanStatus, RootTaskId};

/// Change the coordinator made to an agent's root-task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Deprioritized { root: RootTaskId, priority: i32 },
    Retired { root: RootTaskId },
}

/// Counts consecutive failures per (agent, root task) and deprioritizes roots that keep
/// failing.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    config: CoordinatorConfig,
    strikes: BTreeMap<(u64, RootTaskId), u32>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            strikes: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn strikes<E: EntityId>(&self, entity: E, root: RootTaskId) -> u32 {
        self.strikes
            .get(&(entity.stable_id(), root))
            .copied()
            .unwrap_or(0)
    }

    /// Apply one status message to the agent that sent it.
    pub fn observe<W>(
        &mut self,
        agent: &mut Agent<W>,
        status: &PlanStatus<W::Entity>,
    ) -> Option<Directive>
    where
        W: WorldMut + 'static,
    {
        let key = (status.entity.stable_id(), status.root);
        match status.outcome {
            PlanOutcome::Continuing => None,
            PlanOutcome::Success => {
                self.strikes.remove(&key);
                if self.config.retire_on_success && agent.remove_root_task(status.root) {
                    debug!(entity = ?status.entity, root = %status.root, "root task retired");
                    return Some(Directive::Retired { root: status.root });
                }
                None
            }
            PlanOutcome::PlanningFailed | PlanOutcome::PlanAborted => {
                let strikes = self.strikes.entry(key).or_insert(0);
                *strikes += 1;
                if *strikes < self.config.strike_limit {
                    return None;
                }
                *strikes = 0;

                let priority = agent
                    .root_priority(status.root)?
                    .saturating_sub(self.config.priority_penalty);
                agent.set_root_priority(status.root, priority);
                debug!(
                    entity = ?status.entity,
                    root = %status.root,
                    priority,
                    "root task deprioritized"
                );
                Some(Directive::Deprioritized {
                    root: status.root,
                    priority,
                })
            }
        }
    }

    pub fn observe_all<W>(
        &mut self,
        agent: &mut Agent<W>,
        statuses: &[PlanStatus<W::Entity>],
    ) -> Vec<Directive>
    where
        W: WorldMut + 'static,
    {
        statuses
            .iter()
            .filter_map(|status| self.observe(agent, status))
            .collect()
    }

    /// Forget every strike recorded for `entity`.
    pub fn forget<E: EntityId>(&mut self, entity: E) {
        let id = entity.stable_id();
        self.strikes.retain(|(owner, _), _| *owner != id);
    }
}

//! Per-agent and per-planner tunables. Plain values fixed at construction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AgentConfig {
    /// Seconds between planning attempts.
    pub planning_cooldown_seconds: f32,

    /// Minimum seconds between two executions of a throttled operator
    /// (see [`crate::Operator::is_throttled`]).
    pub operator_interval_seconds: f32,

    /// Search radius handed to state facts.
    pub vision_radius: f32,

    /// Plan immediately, ignoring the cooldown, when an idle agent's facts change.
    pub plan_on_fact_change: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            planning_cooldown_seconds: 0.45,
            operator_interval_seconds: 0.5,
            vision_radius: 10.0,
            plan_on_fact_change: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PlannerConfig {
    /// Max compound expansions before giving up (loop protection for recursive domains).
    /// Primitive tasks are not counted.
    pub max_expansions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CoordinatorConfig {
    /// Consecutive failures of one root task before it is deprioritized.
    pub strike_limit: u32,

    /// Amount subtracted from the root task's priority on deprioritization.
    pub priority_penalty: i32,

    /// Remove a root task from the agent once a plan for it succeeds.
    pub retire_on_success: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            strike_limit: 3,
            priority_penalty: 10,
            retire_on_success: false,
        }
    }
}

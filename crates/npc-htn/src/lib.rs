//! Hierarchical task network planning for NPC agents.
//!
//! The [`Planner`] decomposes a root [`Task`] into an ordered queue of primitive tasks by
//! depth-first search with backtracking over compound-task methods. An [`Agent`] owns the
//! live world state, runs the planner on a cooldown and ticks the resulting operators.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod blackboard;

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod operator;
pub mod plan;
pub mod planner;
pub mod task;

pub use agent::{Agent, AgentState, PlanOutcome, PlanStatus, RootTask, RootTaskId};
pub use blackboard::SearchStats;
pub use config::{AgentConfig, CoordinatorConfig, PlannerConfig};
pub use coordinator::{Coordinator, Directive};
pub use error::PlanError;
pub use operator::{FnOperator, Operator, OperatorStatus};
pub use plan::{route_is_better, FailureReason, Plan, PlanAttempt, PlanFailure, PlannedStep};
pub use planner::Planner;
pub use task::{CompoundTask, FnCompound, FnPrimitive, Method, PrimitiveTask, Task};

//! Decomposition search state for one planning pass.
//!
//! Tasks live in an arena owned by the blackboard; the work list, the accepted plan and every
//! decomposition snapshot refer to them by index, so a snapshot copies indices rather than
//! tasks. World-state snapshots are journal checkpoints on the private planning fork.

use npc_core::{Checkpoint, WorldMut, WorldState};
use tracing::trace;

use crate::error::Result;
use crate::{CompoundTask, Method, PlanError, PlannedStep, PrimitiveTask, Task};

type NodeId = usize;

const ROOT: NodeId = 0;

enum Node<W>
where
    W: WorldMut + 'static,
{
    Primitive(Box<dyn PrimitiveTask<W>>),
    Compound {
        task: Box<dyn CompoundTask<W>>,
        methods: Option<Vec<Method<W>>>,
    },
    /// Primitive moved into the finished plan.
    Taken,
}

enum Visit {
    Fresh(NodeId),
    Resume { node: NodeId, from: usize },
}

/// Search state captured when a compound task commits to a method.
struct DecompositionSnapshot {
    /// Work list as it was when the owner was popped, before its subtasks were pushed.
    pending: Vec<NodeId>,
    plan_len: usize,
    route_len: usize,
    chosen: usize,
    owner: NodeId,
    checkpoint: Checkpoint,
}

/// Counters for one planning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Compound task expansions, including resumes after a backtrack.
    pub expansions: usize,
    pub backtracks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchEnd {
    Complete,
    RootRejected,
    Exhausted,
    BudgetExhausted,
}

pub(crate) struct Blackboard<W>
where
    W: WorldMut + 'static,
{
    nodes: Vec<Node<W>>,
    pending: Vec<NodeId>,
    plan: Vec<NodeId>,
    snapshots: Vec<DecompositionSnapshot>,
    state: WorldState,
    route: Vec<usize>,
    abandoned_route: Vec<usize>,
    advanced: bool,
    root_rejected: bool,
    stats: SearchStats,
}

impl<W> Blackboard<W>
where
    W: WorldMut + 'static,
{
    /// Seed the search with `root` and a fork of the agent's live facts.
    pub(crate) fn new(root: Task<W>, live: &WorldState) -> Self {
        let mut blackboard = Self {
            nodes: Vec::new(),
            pending: Vec::new(),
            plan: Vec::new(),
            snapshots: Vec::new(),
            state: live.fork(),
            route: Vec::new(),
            abandoned_route: Vec::new(),
            advanced: false,
            root_rejected: false,
            stats: SearchStats::default(),
        };
        let root = blackboard.insert(root);
        blackboard.pending.push(root);
        blackboard
    }

    pub(crate) fn stats(&self) -> SearchStats {
        self.stats
    }

    pub(crate) fn abandoned_route(&self) -> &[usize] {
        &self.abandoned_route
    }

    pub(crate) fn accepted(&self) -> usize {
        self.plan.len()
    }

    fn insert(&mut self, task: Task<W>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(match task {
            Task::Primitive(task) => Node::Primitive(task),
            Task::Compound(task) => Node::Compound {
                task,
                methods: None,
            },
        });
        id
    }

    /// Depth-first decomposition with chronological backtracking.
    pub(crate) fn run(&mut self, max_expansions: usize) -> Result<SearchEnd> {
        let mut reset = false;
        loop {
            let visit = if reset {
                reset = false;
                match self.restore() {
                    Some(visit) => visit,
                    None => return Ok(SearchEnd::Exhausted),
                }
            } else {
                match self.pending.pop() {
                    Some(node) => Visit::Fresh(node),
                    None if self.root_rejected => return Ok(SearchEnd::RootRejected),
                    None => return Ok(SearchEnd::Complete),
                }
            };

            // Only compounds grow the work list.
            let expands = match visit {
                Visit::Fresh(node) => matches!(self.nodes[node], Node::Compound { .. }),
                Visit::Resume { .. } => true,
            };
            if expands {
                self.stats.expansions += 1;
                if self.stats.expansions > max_expansions {
                    return Ok(SearchEnd::BudgetExhausted);
                }
            }

            let satisfied = match visit {
                Visit::Fresh(node) => self.visit(node)?,
                Visit::Resume { node, from } => self.choose_method(node, from)?,
            };

            if !satisfied {
                if self.advanced {
                    self.abandoned_route.clone_from(&self.route);
                    self.advanced = false;
                }
                reset = true;
            }
        }
    }

    /// Returns `false` when the search must backtrack.
    fn visit(&mut self, node: NodeId) -> Result<bool> {
        match &mut self.nodes[node] {
            Node::Primitive(task) => {
                if !task.preconditions_met(&self.state) {
                    trace!(task = task.name(), "primitive preconditions failed");
                    return Ok(false);
                }
                task.apply_effects(&mut self.state);
                self.plan.push(node);
                Ok(true)
            }
            Node::Compound { task, methods } => {
                if !task.preconditions_met(&self.state) {
                    // Popped straight off the work list: skip it, no backtrack.
                    trace!(task = task.name(), "compound preconditions failed, discarded");
                    if node == ROOT {
                        self.root_rejected = true;
                    }
                    return Ok(true);
                }
                // A node popped fresh a second time was put back by a restore that rewound an
                // earlier sibling; its old method list no longer owns its subtasks.
                let list = task.setup_methods(&self.state);
                if list.is_empty() {
                    return Err(PlanError::NoMethods {
                        task: task.name().to_owned(),
                    });
                }
                *methods = Some(list);
                self.choose_method(node, 0)
            }
            Node::Taken => Err(PlanError::Finalized { node }),
        }
    }

    /// Commit `node` to its first satisfied method at or after `from`.
    fn choose_method(&mut self, node: NodeId, from: usize) -> Result<bool> {
        let Node::Compound {
            task,
            methods: Some(methods),
        } = &mut self.nodes[node]
        else {
            return Err(PlanError::NotCompound { node });
        };

        let state = &self.state;
        let Some(chosen) = methods
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, method)| method.preconditions_met(state))
            .map(|(index, _)| index)
        else {
            trace!(task = task.name(), from, "no remaining method applies");
            return Ok(false);
        };

        trace!(
            task = task.name(),
            method = methods[chosen].name(),
            index = chosen,
            "method chosen"
        );
        let subtasks = std::mem::take(&mut methods[chosen].subtasks);

        self.snapshots.push(DecompositionSnapshot {
            pending: self.pending.clone(),
            plan_len: self.plan.len(),
            route_len: self.route.len(),
            chosen,
            owner: node,
            checkpoint: self.state.checkpoint(),
        });
        self.route.push(chosen);
        self.advanced = true;

        for subtask in subtasks.into_iter().rev() {
            let id = self.insert(subtask);
            self.pending.push(id);
        }
        Ok(true)
    }

    /// Pop the latest snapshot and resume its owner at the next method.
    fn restore(&mut self) -> Option<Visit> {
        let snapshot = self.snapshots.pop()?;
        self.stats.backtracks += 1;

        self.pending = snapshot.pending;
        self.plan.truncate(snapshot.plan_len);
        self.route.truncate(snapshot.route_len);
        self.state.rollback(snapshot.checkpoint);

        Some(Visit::Resume {
            node: snapshot.owner,
            from: snapshot.chosen + 1,
        })
    }

    /// Build operators for the accepted primitives, in plan order.
    pub(crate) fn finish(mut self) -> Result<(Vec<PlannedStep<W>>, Vec<usize>, WorldState)> {
        let mut steps = Vec::with_capacity(self.plan.len());
        for node in std::mem::take(&mut self.plan) {
            match std::mem::replace(&mut self.nodes[node], Node::Taken) {
                Node::Primitive(mut task) => {
                    let operator = task.setup_operator();
                    steps.push(PlannedStep::new(task.name().to_owned(), operator));
                }
                _ => return Err(PlanError::NotPrimitive { node }),
            }
        }
        Ok((steps, self.route, self.state))
    }
}

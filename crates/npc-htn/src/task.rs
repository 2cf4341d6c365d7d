//! Task contracts.
//!
//! A [`Task`] is either primitive (wraps an operator) or compound (offers ordered methods).
//! Task instances are created fresh for every planning pass and may keep state captured
//! while their preconditions are checked (a chosen target, say) for use when the operator is
//! built.

use std::borrow::Cow;
use std::fmt;

use npc_core::{WorldMut, WorldState};

use crate::Operator;

pub trait PrimitiveTask<W>: 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str;

    /// Checked against the planning state each time the task is visited. Anything captured
    /// here must be overwritten on every call.
    fn preconditions_met(&mut self, _state: &WorldState) -> bool {
        true
    }

    /// Predicted consequence of the task, applied to the planning state once the task is
    /// accepted into the plan.
    fn apply_effects(&self, _state: &mut WorldState) {}

    /// Builds the live operator. Called exactly once, and only for tasks in the final plan.
    fn setup_operator(&mut self) -> Box<dyn Operator<W>>;
}

pub trait CompoundTask<W>: 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str;

    fn preconditions_met(&mut self, _state: &WorldState) -> bool {
        true
    }

    /// Candidate decompositions in preference order. Called once per expansion, after the
    /// preconditions passed; backtracking past an earlier sibling expands the task again.
    /// Returning no methods is a malformed task graph.
    fn setup_methods(&mut self, state: &WorldState) -> Vec<Method<W>>;
}

pub enum Task<W>
where
    W: WorldMut + 'static,
{
    Primitive(Box<dyn PrimitiveTask<W>>),
    Compound(Box<dyn CompoundTask<W>>),
}

impl<W> Task<W>
where
    W: WorldMut + 'static,
{
    pub fn primitive(task: impl PrimitiveTask<W>) -> Self {
        Task::Primitive(Box::new(task))
    }

    pub fn compound(task: impl CompoundTask<W>) -> Self {
        Task::Compound(Box::new(task))
    }

    pub fn name(&self) -> &str {
        match self {
            Task::Primitive(task) => task.name(),
            Task::Compound(task) => task.name(),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Task::Compound(_))
    }
}

impl<W> fmt::Debug for Task<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_compound() {
            "Compound"
        } else {
            "Primitive"
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

type Condition = Box<dyn Fn(&WorldState) -> bool>;

/// One way to decompose a compound task: its own preconditions plus an ordered list of
/// subtasks.
pub struct Method<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    conditions: Vec<Condition>,
    pub(crate) subtasks: Vec<Task<W>>,
}

impl<W> Method<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    /// Add a precondition. All must hold for the method to be chosen.
    pub fn when(mut self, condition: impl Fn(&WorldState) -> bool + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn then(mut self, task: Task<W>) -> Self {
        self.subtasks.push(task);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtasks(&self) -> &[Task<W>] {
        &self.subtasks
    }

    pub fn preconditions_met(&self, state: &WorldState) -> bool {
        self.conditions.iter().all(|condition| condition(state))
    }
}

impl<W> fmt::Debug for Method<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("subtasks", &self.subtasks)
            .finish()
    }
}

/// Primitive task assembled from closures, for tasks that capture nothing at planning time.
pub struct FnPrimitive<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    conditions: Vec<Condition>,
    effects: Vec<Box<dyn Fn(&mut WorldState)>>,
    make_operator: Box<dyn FnMut() -> Box<dyn Operator<W>>>,
}

impl<W> FnPrimitive<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        make_operator: impl FnMut() -> Box<dyn Operator<W>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            effects: Vec::new(),
            make_operator: Box::new(make_operator),
        }
    }

    pub fn when(mut self, condition: impl Fn(&WorldState) -> bool + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn effect(mut self, effect: impl Fn(&mut WorldState) + 'static) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    pub fn into_task(self) -> Task<W> {
        Task::primitive(self)
    }
}

impl<W> PrimitiveTask<W> for FnPrimitive<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn preconditions_met(&mut self, state: &WorldState) -> bool {
        self.conditions.iter().all(|condition| condition(state))
    }

    fn apply_effects(&self, state: &mut WorldState) {
        for effect in &self.effects {
            effect(state);
        }
    }

    fn setup_operator(&mut self) -> Box<dyn Operator<W>> {
        (self.make_operator)()
    }
}

/// Compound task assembled from closures.
pub struct FnCompound<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    conditions: Vec<Condition>,
    methods: Box<dyn FnMut(&WorldState) -> Vec<Method<W>>>,
}

impl<W> FnCompound<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        methods: impl FnMut(&WorldState) -> Vec<Method<W>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            methods: Box::new(methods),
        }
    }

    pub fn when(mut self, condition: impl Fn(&WorldState) -> bool + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn into_task(self) -> Task<W> {
        Task::compound(self)
    }
}

impl<W> CompoundTask<W> for FnCompound<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn preconditions_met(&mut self, state: &WorldState) -> bool {
        self.conditions.iter().all(|condition| condition(state))
    }

    fn setup_methods(&mut self, state: &WorldState) -> Vec<Method<W>> {
        (self.methods)(state)
    }
}

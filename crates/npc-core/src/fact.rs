//! State facts: named values an agent computes from the game world.

use crate::{FactData, FactKey, FactValue, WorldState, WorldView};

/// Inputs available to a fact while it computes its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactContext<E> {
    pub tick: u64,
    pub entity: E,
    pub vision_radius: f32,
}

/// One polled fact about an agent. Reads of the world must not mutate it.
pub trait StateFact<W>: 'static
where
    W: WorldView + 'static,
{
    fn name(&self) -> &'static str;

    fn compute(&self, ctx: &FactContext<W::Entity>, world: &W) -> FactValue;
}

/// A fact backed by a closure.
pub struct FnFact<W, T>
where
    W: WorldView + 'static,
    T: FactData,
{
    key: FactKey<T>,
    compute: Box<dyn Fn(&FactContext<W::Entity>, &W) -> T>,
}

impl<W, T> FnFact<W, T>
where
    W: WorldView + 'static,
    T: FactData,
{
    pub fn new(
        key: FactKey<T>,
        compute: impl Fn(&FactContext<W::Entity>, &W) -> T + 'static,
    ) -> Self {
        Self {
            key,
            compute: Box::new(compute),
        }
    }

    pub fn key(&self) -> FactKey<T> {
        self.key
    }
}

impl<W, T> StateFact<W> for FnFact<W, T>
where
    W: WorldView + 'static,
    T: FactData,
{
    fn name(&self) -> &'static str {
        self.key.name()
    }

    fn compute(&self, ctx: &FactContext<W::Entity>, world: &W) -> FactValue {
        FactValue::new((self.compute)(ctx, world))
    }
}

/// The ordered set of facts one agent polls. At most one fact per name.
pub struct FactSet<W>
where
    W: WorldView + 'static,
{
    facts: Vec<Box<dyn StateFact<W>>>,
}

impl<W> Default for FactSet<W>
where
    W: WorldView + 'static,
{
    fn default() -> Self {
        Self { facts: Vec::new() }
    }
}

impl<W> FactSet<W>
where
    W: WorldView + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fact: impl StateFact<W>) -> Self {
        self.register(fact);
        self
    }

    /// Register `fact`, replacing any fact with the same name in place.
    pub fn register(&mut self, fact: impl StateFact<W>) {
        let fact: Box<dyn StateFact<W>> = Box::new(fact);
        match self.facts.iter().position(|f| f.name() == fact.name()) {
            Some(index) => self.facts[index] = fact,
            None => self.facts.push(fact),
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.facts.iter().map(|f| f.name())
    }

    /// Recompute every fact into `state`. Returns how many values changed.
    pub fn poll(&self, ctx: &FactContext<W::Entity>, world: &W, state: &mut WorldState) -> usize {
        self.facts
            .iter()
            .filter(|fact| state.update_value(fact.name(), fact.compute(ctx, world)))
            .count()
    }

    /// Fresh store holding the current value of every fact.
    pub fn snapshot(&self, ctx: &FactContext<W::Entity>, world: &W) -> WorldState {
        let mut state = WorldState::new();
        self.poll(ctx, world, &mut state);
        state.drain_changes();
        state
    }
}

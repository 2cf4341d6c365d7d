//! Per-agent world state store.
//!
//! A `WorldState` maps fact names to shared, immutable fact values. The live store is refreshed
//! by polling state facts every tick; a planning pass works on a journaling fork whose
//! checkpoints can be rolled back in O(changed facts).

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Value type storable as a fact.
///
/// Implemented for every `Debug + PartialEq` type that is `Send + Sync + 'static`.
pub trait FactData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_fact(&self, other: &dyn FactData) -> bool;
}

impl<T> FactData for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_fact(&self, other: &dyn FactData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

/// Shared fact value. Cloning copies a pointer.
#[derive(Clone)]
pub struct FactValue(Arc<dyn FactData>);

impl FactValue {
    pub fn new<T: FactData>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Reference-equal or value-equal.
    pub fn same(&self, other: &FactValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_fact(&*other.0)
    }
}

impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Typed, named key for one fact.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for FactKey<T> {}

impl<T: 'static> Clone for FactKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for FactKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FactKey").field(&self.name).finish()
    }
}

impl<T: 'static> FactKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

/// Position in a fork's journal. Only meaningful for the state that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

#[derive(Clone)]
struct JournalEntry {
    name: &'static str,
    previous: Option<FactValue>,
}

#[derive(Clone, Default)]
pub struct WorldState {
    facts: BTreeMap<&'static str, FactValue>,
    journal: Option<Vec<JournalEntry>>,
    dirty: BTreeSet<&'static str>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn contains<T: 'static>(&self, key: FactKey<T>) -> bool {
        self.facts.contains_key(key.name)
    }

    pub fn get<T: 'static>(&self, key: FactKey<T>) -> Option<&T> {
        let value = self.facts.get(key.name)?;
        value.downcast_ref::<T>().or_else(|| {
            panic!(
                "world state type mismatch for fact `{}` (stored {:?})",
                key.name, value
            )
        })
    }

    /// Boolean fact, `false` when absent.
    pub fn flag(&self, key: FactKey<bool>) -> bool {
        self.get(key).copied().unwrap_or(false)
    }

    pub fn value(&self, name: &str) -> Option<&FactValue> {
        self.facts.get(name)
    }

    /// Insert or replace the fact stored under `key`.
    ///
    /// Returns `true` and marks the fact dirty when the stored value changed. Writing a value
    /// equal to the current one is a no-op.
    pub fn update<T: FactData>(&mut self, key: FactKey<T>, value: T) -> bool {
        self.update_value(key.name, FactValue::new(value))
    }

    pub fn update_value(&mut self, name: &'static str, value: FactValue) -> bool {
        if let Some(current) = self.facts.get(name) {
            if current.same(&value) {
                return false;
            }
        }

        let previous = self.facts.insert(name, value);
        if let Some(journal) = self.journal.as_mut() {
            journal.push(JournalEntry { name, previous });
        }
        self.dirty.insert(name);
        true
    }

    /// Facts in stable (name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FactValue)> + '_ {
        self.facts.iter().map(|(name, value)| (*name, value))
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Names of facts changed since the last drain, in stable order.
    pub fn drain_changes(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Journaling copy for one planning pass. Shares every value with `self`.
    pub fn fork(&self) -> WorldState {
        WorldState {
            facts: self.facts.clone(),
            journal: Some(Vec::new()),
            dirty: BTreeSet::new(),
        }
    }

    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.as_ref().map_or(0, Vec::len))
    }

    /// Undo every update made after `checkpoint`. No-op on a non-journaling state.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let Some(journal) = self.journal.as_mut() else {
            return;
        };

        while journal.len() > checkpoint.0 {
            let Some(entry) = journal.pop() else {
                break;
            };
            match entry.previous {
                Some(value) => {
                    self.facts.insert(entry.name, value);
                }
                None => {
                    self.facts.remove(entry.name);
                }
            }
        }
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.facts == other.facts
    }
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.facts.iter()).finish()
    }
}

//! Deterministic, engine-agnostic NPC kernel primitives.
//!
//! This crate holds the pieces every planner-driven agent needs regardless of game: stable
//! entity ids, read/write world traits, the tick context, and the per-agent world state store
//! with its state facts.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod entity;
pub mod fact;
pub mod rng;
pub mod tick;
pub mod world;
pub mod world_state;

pub use entity::EntityId;
pub use fact::{FactContext, FactSet, FnFact, StateFact};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
pub use world::{WorldMut, WorldView};
pub use world_state::{Checkpoint, FactData, FactKey, FactValue, WorldState};

use crate::{rng, EntityId, SplitMix64};

/// Per-tick simulation input shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32, seed: u64) -> Self {
        Self {
            tick,
            dt_seconds,
            seed,
        }
    }

    /// Context for the tick after this one, keeping `dt` and seed.
    pub fn next(self) -> Self {
        Self {
            tick: self.tick + 1,
            ..self
        }
    }

    /// RNG stream private to `entity` for this tick.
    pub fn rng_for<E: EntityId>(&self, entity: E, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed ^ self.tick, entity.stable_id(), stream);
        SplitMix64::new(seed)
    }
}

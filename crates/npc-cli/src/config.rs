//! Scenario configuration, loaded from a YAML file.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use npc_htn::{AgentConfig, CoordinatorConfig, PlannerConfig};
use npc_nav::Vec2;
use serde::{Deserialize, Serialize};

/// One simulated village: map, food, NPCs and the tunables handed to every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Ticks simulated by `npc-sim run`
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    #[serde(default = "default_dt")]
    pub dt_seconds: f32,

    pub seed: u64,

    /// Path requests resolved per tick
    #[serde(default = "default_path_budget")]
    pub path_budget: usize,

    /// Hunger at which the eat root task is queued
    #[serde(default = "default_hungry_at")]
    pub hungry_at: f32,

    #[serde(default = "default_eat_priority")]
    pub eat_priority: i32,

    #[serde(default = "default_wander_priority")]
    pub wander_priority: i32,

    /// Walking speed in world units per second
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// Distance at which an NPC can pick up food
    #[serde(default = "default_reach")]
    pub reach: f32,

    pub grid: GridConfig,

    /// Food lying on the ground at startup
    pub food: Vec<Vec2>,

    pub npcs: Vec<NpcConfig>,

    pub agent: AgentConfig,

    pub planner: PlannerConfig,

    pub coordinator: CoordinatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
    /// Blocked cells as `[x, y]`
    pub walls: Vec<[i32; 2]>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 12,
            cell_size: 1.0,
            walls: (2..10).map(|y| [7, y]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    pub name: String,
    pub position: Vec2,
    #[serde(default)]
    pub hunger: f32,
    /// Hunger gained per second
    #[serde(default = "default_hunger_rate")]
    pub hunger_rate: f32,
}

fn default_ticks() -> u64 {
    200
}
fn default_dt() -> f32 {
    0.1
}
fn default_path_budget() -> usize {
    4
}
fn default_hungry_at() -> f32 {
    1.0
}
fn default_eat_priority() -> i32 {
    10
}
fn default_wander_priority() -> i32 {
    1
}
fn default_move_speed() -> f32 {
    3.0
}
fn default_reach() -> f32 {
    0.75
}
fn default_hunger_rate() -> f32 {
    0.1
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            dt_seconds: default_dt(),
            seed: 0,
            path_budget: default_path_budget(),
            hungry_at: default_hungry_at(),
            eat_priority: default_eat_priority(),
            wander_priority: default_wander_priority(),
            move_speed: default_move_speed(),
            reach: default_reach(),
            grid: GridConfig::default(),
            food: vec![
                Vec2::new(3.5, 3.5),
                Vec2::new(12.5, 2.5),
                Vec2::new(11.5, 9.5),
            ],
            npcs: vec![
                NpcConfig {
                    name: "ada".to_string(),
                    position: Vec2::new(1.5, 1.5),
                    hunger: 0.9,
                    hunger_rate: 0.2,
                },
                NpcConfig {
                    name: "bo".to_string(),
                    position: Vec2::new(14.5, 10.5),
                    hunger: 0.0,
                    hunger_rate: 0.1,
                },
                NpcConfig {
                    name: "cy".to_string(),
                    position: Vec2::new(5.5, 10.5),
                    hunger: 0.5,
                    hunger_rate: 0.15,
                },
            ],
            agent: AgentConfig::default(),
            planner: PlannerConfig::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid scenario in {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, the built-in scenario otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid.width > 0 && self.grid.height > 0,
            "grid must be at least 1x1"
        );
        ensure!(self.grid.cell_size > 0.0, "grid.cell_size must be > 0");
        ensure!(self.dt_seconds > 0.0, "dt_seconds must be > 0");
        ensure!(self.move_speed >= 0.0, "move_speed must be >= 0");

        let mut names: Vec<&str> = self.npcs.iter().map(|npc| npc.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        ensure!(names.len() == before, "npc names must be unique");
        Ok(())
    }
}

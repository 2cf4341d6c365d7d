//! npc-sim - HTN-driven village simulation.
//!
//! - `npc-sim run` - tick the village and print plan status events
//! - `npc-sim plan` - one planning pass per NPC, nothing executed

mod config;
mod scenario;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use npc_htn::RootTaskId;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ScenarioConfig;
use crate::scenario::{plan_once, Simulation, EAT, WANDER};

#[derive(Parser)]
#[command(name = "npc-sim")]
#[command(about = "Hungry NPCs planning with a hierarchical task network", version)]
struct Cli {
    /// Scenario file (YAML). The built-in village is used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run {
        /// Ticks to simulate (overrides the scenario)
        #[arg(long)]
        ticks: Option<u64>,

        /// Global seed (overrides the scenario)
        #[arg(long)]
        seed: Option<u64>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Plan a root task once for every NPC
    Plan {
        #[arg(long, value_enum, default_value_t = Root::Eat)]
        root: Root,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective scenario as YAML
    Scenario,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Root {
    Eat,
    Wander,
}

impl From<Root> for RootTaskId {
    fn from(root: Root) -> Self {
        match root {
            Root::Eat => EAT,
            Root::Wander => WANDER,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so stdout stays machine readable.
    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let scenario = ScenarioConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { ticks, seed, json } => run(scenario, ticks, seed, json),
        Commands::Plan { root, json } => plan(&scenario, root.into(), json),
        Commands::Scenario => {
            print!("{}", serde_yaml::to_string(&scenario)?);
            Ok(())
        }
    }
}

fn run(
    mut scenario: ScenarioConfig,
    ticks: Option<u64>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    if let Some(ticks) = ticks {
        scenario.ticks = ticks;
    }
    if let Some(seed) = seed {
        scenario.seed = seed;
    }

    let mut sim = Simulation::new(&scenario)?;
    let mut emitted = 0usize;
    for _ in 0..scenario.ticks {
        for event in sim.step()? {
            if json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                println!("{event}");
            }
            emitted += 1;
        }
    }

    for (id, npc) in sim.world().npcs() {
        if let Some(log) = sim.trace_log(id) {
            debug!(
                npc = %npc.name,
                events = log.events.len(),
                plans = log.count("htn.plan.start"),
                aborts = log.count("htn.plan.outcome.aborted"),
                "trace summary"
            );
        }
    }

    let meals: u32 = sim.world().npcs().map(|(_, npc)| npc.meals).sum();
    info!(
        ticks = sim.tick(),
        events = emitted,
        meals,
        food_left = sim.world().food().count(),
        "simulation finished"
    );
    Ok(())
}

fn plan(scenario: &ScenarioConfig, root: RootTaskId, json: bool) -> Result<()> {
    let reports = plan_once(scenario, root)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
    }
    Ok(())
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line harness that runs a gridswarm scenario to completion.
//!
//! Builds a bounded grid with a wall across the middle, places a tower and
//! a small swarm along the west edge, lets the first soldier announce an
//! objective on the far side of the wall, and then runs the global tick
//! loop: decide, execute, deliver. Everything is replayable from the seed.

use anyhow::Context;
use clap::Parser;
use gridswarm_agent::Agent;
use gridswarm_core::{AgentId, GridPoint, MoveIntent, Role};
use gridswarm_world::{GridWorld, MessageBus};
use tracing::{debug, info};

/// Scenario parameters for one deterministic run.
#[derive(Debug, Parser)]
#[command(name = "gridswarm", about = "Runs a deterministic gridswarm scenario")]
struct Args {
    /// Grid width in cells.
    #[arg(long, default_value_t = 16)]
    width: i32,

    /// Grid height in cells.
    #[arg(long, default_value_t = 9)]
    height: i32,

    /// Number of global ticks to simulate.
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Base seed for every agent's random walk.
    #[arg(long, default_value_t = 6147)]
    seed: u64,

    /// Number of soldiers in the swarm.
    #[arg(long, default_value_t = 2)]
    soldiers: u32,

    /// Number of moppers in the swarm.
    #[arg(long, default_value_t = 2)]
    moppers: u32,

    /// Per-tick message channel capacity.
    #[arg(long, default_value_t = 16)]
    capacity: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut scenario = Scenario::build(&args).context("building scenario")?;

    for tick in 1..=args.ticks {
        scenario.run_tick(tick);
    }

    scenario.report();
    Ok(())
}

struct Scenario {
    world: GridWorld,
    bus: MessageBus,
    agents: Vec<Agent>,
    objective: GridPoint,
}

impl Scenario {
    /// Places the wall, the tower, and the swarm, and announces the
    /// objective from the first soldier.
    fn build(args: &Args) -> anyhow::Result<Self> {
        anyhow::ensure!(
            args.width >= 6 && args.height >= 3,
            "grid must be at least 6x3, got {}x{}",
            args.width,
            args.height
        );

        let mut world = GridWorld::new(args.width, args.height);
        let mut bus = MessageBus::new(args.capacity);
        let mut agents = Vec::new();

        // Wall across the middle column with a single gap in the top row.
        let wall_x = args.width / 2;
        for y in 0..(args.height - 1) {
            world.block(GridPoint::new(wall_x, y));
        }

        let mut next_id = 1;
        let mut spawn = |world: &mut GridWorld,
                         bus: &mut MessageBus,
                         agents: &mut Vec<Agent>,
                         role: Role,
                         position: GridPoint|
         -> anyhow::Result<AgentId> {
            let id = AgentId::new(next_id);
            next_id += 1;
            world
                .place_agent(id, position)
                .with_context(|| format!("placing {role:?} at ({}, {})", position.x(), position.y()))?;
            bus.register(id);
            agents.push(Agent::new(id, role, args.seed.wrapping_add(u64::from(id.get()))));
            Ok(id)
        };

        let _ = spawn(
            &mut world,
            &mut bus,
            &mut agents,
            Role::Tower,
            GridPoint::new(0, args.height - 1),
        )?;

        let mut first_soldier = None;
        for index in 0..args.soldiers {
            let id = spawn(
                &mut world,
                &mut bus,
                &mut agents,
                Role::Soldier,
                GridPoint::new(1, index as i32 % args.height),
            )?;
            if first_soldier.is_none() {
                first_soldier = Some(id);
            }
        }
        for index in 0..args.moppers {
            let _ = spawn(
                &mut world,
                &mut bus,
                &mut agents,
                Role::Mopper,
                GridPoint::new(2, index as i32 % args.height),
            )?;
        }

        let objective = GridPoint::new(args.width - 2, 0);
        if let Some(id) = first_soldier {
            let mut outbox = bus.outbox(id);
            let scout = agents
                .iter_mut()
                .find(|agent| agent.id() == id)
                .context("scout soldier missing")?;
            scout.adopt_objective(objective, &mut outbox);
            info!(
                scout = id.get(),
                x = objective.x(),
                y = objective.y(),
                "objective announced"
            );
        }

        Ok(Self {
            world,
            bus,
            agents,
            objective,
        })
    }

    /// One global tick: decide against start-of-tick state, execute in
    /// identifier order, cross the message boundary.
    fn run_tick(&mut self, tick: u32) {
        let mut intents = Vec::new();
        for agent in &mut self.agents {
            let id = agent.id();
            let inbox = self.bus.inbox(id).to_vec();
            let Ok(view) = self.world.view(id) else {
                continue;
            };
            let mut outbox = self.bus.outbox(id);
            let outcome = agent.run_tick(&view, &inbox, &mut outbox, |_| true);
            if let Some(kind) = outcome.build {
                debug!(tick, tower = id.get(), ?kind, "build proposed");
            }
            intents.push((id, outcome.movement));
        }

        for (id, movement) in intents {
            if movement == MoveIntent::Hold {
                continue;
            }
            // Two agents may race for one cell within a tick; the loser
            // simply holds.
            if let Err(error) = self.world.execute(id, movement) {
                debug!(tick, agent = id.get(), %error, "move rejected");
            }
        }

        self.bus.deliver();
    }

    /// Prints the end-of-run summary.
    fn report(&self) {
        for agent in &self.agents {
            let position = self.world.position_of(agent.id());
            let resolved = agent.coordinator().is_resolved(self.objective);
            info!(
                agent = agent.id().get(),
                role = ?agent.role(),
                position = ?position,
                objective_resolved = resolved,
                produced = agent.production().total(),
                "final state"
            );
        }
    }
}

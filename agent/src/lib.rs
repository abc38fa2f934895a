#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent composition root for the gridswarm decision core.
//!
//! An [`Agent`] owns one navigator, one coordination replica, and a seeded
//! RNG, and dispatches each tick to the handler for its [`Role`]. The
//! single entry point, [`Agent::run_tick`], applies the fixed per-tick
//! order (advance saving timers, process the inbox, then decide) and
//! never propagates an error: a collaborator contract violation is logged
//! and the tick yields no intents, so one bad tick can never end an
//! agent's life.

use gridswarm_core::{
    AgentId, Direction, GeometryError, GridPoint, Message, Messaging, MoveIntent, Recipient, Role,
    UnitKind, WorldQuery,
};
use gridswarm_system_coordination::Coordinator;
use gridswarm_system_navigation::Navigator;
use gridswarm_system_production::ProductionLedger;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Everything an agent decided during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Movement to execute this tick.
    pub movement: MoveIntent,
    /// Unit the agent wants built this tick, towers only.
    pub build: Option<UnitKind>,
}

impl TickOutcome {
    const fn hold() -> Self {
        Self {
            movement: MoveIntent::Hold,
            build: None,
        }
    }

    const fn moving(movement: MoveIntent) -> Self {
        Self {
            movement,
            build: None,
        }
    }
}

/// One autonomous agent: identity, role, and decision state.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    role: Role,
    navigator: Navigator,
    coordinator: Coordinator,
    production: ProductionLedger,
    rng: ChaCha8Rng,
}

impl Agent {
    /// Creates an agent with the provided identity, role, and RNG seed.
    ///
    /// The seed fixes the agent's entire random-walk sequence, so a
    /// scenario replays identically from the same seeds.
    #[must_use]
    pub fn new(id: AgentId, role: Role, rng_seed: u64) -> Self {
        Self {
            id,
            role,
            navigator: Navigator::new(),
            coordinator: Coordinator::new(),
            production: ProductionLedger::default(),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    /// Identifier assigned to the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Role the agent runs its tick loop as.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Read access to the agent's coordination replica.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Read access to the agent's navigator.
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Units this agent has produced so far, towers only.
    #[must_use]
    pub const fn production(&self) -> &ProductionLedger {
        &self.production
    }

    /// Locally adopts a freshly discovered objective and announces it.
    ///
    /// This is the local-trigger path for objective assignment: the agent
    /// that senses the objective applies it to its own replica and
    /// broadcasts `SetTarget` so the rest of the swarm converges. Already
    /// resolved objectives are ignored.
    pub fn adopt_objective<M: Messaging>(&mut self, point: GridPoint, messaging: &mut M) {
        if self.coordinator.is_resolved(point) {
            return;
        }
        self.coordinator.observe(Message::SetTarget { point });
        if !messaging.send(Recipient::Broadcast, Message::SetTarget { point }) {
            debug!(agent = self.id.get(), "objective announcement dropped");
        }
    }

    /// Runs one complete tick and never fails.
    ///
    /// Order is fixed: saving timers advance, the inbox is applied in
    /// arrival order, then the role handler decides, so navigation always
    /// sees the freshest locally known objective. Internal errors are
    /// logged and absorbed; the tick then yields no intents.
    pub fn run_tick<W, M, F>(
        &mut self,
        world: &W,
        inbox: &[Message],
        messaging: &mut M,
        can_build: F,
    ) -> TickOutcome
    where
        W: WorldQuery,
        M: Messaging,
        F: Fn(UnitKind) -> bool,
    {
        match self.tick_inner(world, inbox, messaging, can_build) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(agent = self.id.get(), %error, "tick aborted");
                TickOutcome::hold()
            }
        }
    }

    fn tick_inner<W, M, F>(
        &mut self,
        world: &W,
        inbox: &[Message],
        messaging: &mut M,
        can_build: F,
    ) -> Result<TickOutcome, GeometryError>
    where
        W: WorldQuery,
        M: Messaging,
        F: Fn(UnitKind) -> bool,
    {
        self.coordinator.begin_tick();
        self.coordinator.observe_all(inbox);

        match self.role {
            Role::Soldier => soldier_tick(self, world, messaging),
            Role::Mopper => Ok(TickOutcome::moving(random_walk(self, world))),
            Role::Splasher => splasher_tick(self, world),
            Role::Tower => Ok(tower_tick(self, &can_build)),
        }
    }
}

/// Pursues the shared objective and completes it on arrival.
fn soldier_tick<W: WorldQuery, M: Messaging>(
    agent: &mut Agent,
    world: &W,
    messaging: &mut M,
) -> Result<TickOutcome, GeometryError> {
    let objective = agent.coordinator.shared_objective();
    agent.navigator.set_destination(objective);

    if let Some(point) = objective {
        if world.position() == point {
            let announcement = agent.coordinator.complete_objective(point);
            if !messaging.send(Recipient::Broadcast, announcement) {
                debug!(agent = agent.id.get(), "completion announcement dropped");
            }
            // Completing an objective precedes a build, so ask the towers
            // to start saving toward it.
            let _ = messaging.send(Recipient::Broadcast, Message::SaveChips);
            agent.navigator.set_destination(None);
            return Ok(TickOutcome::hold());
        }
    }

    let movement = agent.navigator.step(world)?;
    Ok(TickOutcome::moving(movement))
}

/// Pursues the shared objective by direct heading, wandering otherwise.
fn splasher_tick<W: WorldQuery>(
    agent: &mut Agent,
    world: &W,
) -> Result<TickOutcome, GeometryError> {
    let Some(point) = agent.coordinator.shared_objective() else {
        return Ok(TickOutcome::moving(random_walk(agent, world)));
    };

    let position = world.position();
    if position == point {
        return Ok(TickOutcome::hold());
    }

    let heading = position.direction_to(point)?;
    if world.can_move(heading) {
        Ok(TickOutcome::moving(MoveIntent::Move(heading)))
    } else {
        Ok(TickOutcome::hold())
    }
}

/// Proposes the next unit to build, honoring the saving window.
fn tower_tick<F: Fn(UnitKind) -> bool>(agent: &mut Agent, can_build: &F) -> TickOutcome {
    if !agent.coordinator.spending_permitted() {
        return TickOutcome::hold();
    }

    let Some(kind) = agent.production.next_unit() else {
        return TickOutcome::hold();
    };
    if !can_build(kind) {
        return TickOutcome::hold();
    }

    agent.production.record(kind);
    debug!(agent = agent.id.get(), ?kind, "production proposed");
    TickOutcome {
        movement: MoveIntent::Hold,
        build: Some(kind),
    }
}

/// Uniformly random heading, taken only when the world permits it.
fn random_walk<W: WorldQuery>(agent: &mut Agent, world: &W) -> MoveIntent {
    let heading = Direction::ALL[agent.rng.gen_range(0..Direction::ALL.len())];
    if world.can_move(heading) {
        MoveIntent::Move(heading)
    } else {
        MoveIntent::Hold
    }
}

use gridswarm_agent::{Agent, TickOutcome};
use gridswarm_core::{AgentId, GridPoint, Message, MoveIntent, Role, UnitKind};
use gridswarm_world::{GridWorld, MessageBus};

const TOWER: AgentId = AgentId::new(1);
const SCOUT: AgentId = AgentId::new(2);
const FOLLOWER: AgentId = AgentId::new(3);

struct Swarm {
    world: GridWorld,
    bus: MessageBus,
    agents: Vec<Agent>,
}

impl Swarm {
    fn new() -> Self {
        let mut world = GridWorld::new(10, 5);
        let mut bus = MessageBus::new(16);
        let mut agents = Vec::new();

        for (id, role, position) in [
            (TOWER, Role::Tower, GridPoint::new(0, 4)),
            (SCOUT, Role::Soldier, GridPoint::new(1, 0)),
            (FOLLOWER, Role::Soldier, GridPoint::new(1, 2)),
        ] {
            world.place_agent(id, position).expect("place");
            bus.register(id);
            agents.push(Agent::new(id, role, u64::from(id.get())));
        }

        Self { world, bus, agents }
    }

    fn agent(&self, id: AgentId) -> &Agent {
        self.agents
            .iter()
            .find(|agent| agent.id() == id)
            .expect("known agent")
    }

    /// Runs one global tick: every agent decides against start-of-tick
    /// state, intents execute in identifier order, then the bus crosses
    /// the tick boundary.
    fn tick(&mut self) -> Vec<(AgentId, TickOutcome)> {
        let mut outcomes = Vec::new();
        for agent in &mut self.agents {
            let id = agent.id();
            let inbox = self.bus.inbox(id).to_vec();
            let view = self.world.view(id).expect("agent placed");
            let mut outbox = self.bus.outbox(id);
            let outcome = agent.run_tick(&view, &inbox, &mut outbox, |_| true);
            outcomes.push((id, outcome));
        }

        for (id, outcome) in &outcomes {
            let _ = self
                .world
                .execute(*id, outcome.movement)
                .expect("emitted move permitted");
        }

        self.bus.deliver();
        outcomes
    }
}

#[test]
fn swarm_converges_on_one_objective_and_resolves_it() {
    let mut swarm = Swarm::new();
    let objective = GridPoint::new(4, 0);

    // The scout discovers the objective locally and announces it; its own
    // replica is assigned immediately, everyone else hears it next tick.
    {
        let mut outbox = swarm.bus.outbox(SCOUT);
        let scout = swarm
            .agents
            .iter_mut()
            .find(|agent| agent.id() == SCOUT)
            .expect("scout");
        scout.adopt_objective(objective, &mut outbox);
    }
    assert_eq!(
        swarm.agent(SCOUT).coordinator().shared_objective(),
        Some(objective)
    );
    assert_eq!(swarm.agent(FOLLOWER).coordinator().shared_objective(), None);

    // Tick one: the broadcast crosses the tick boundary but has not been
    // applied by the follower yet.
    let _ = swarm.tick();
    assert_eq!(swarm.agent(FOLLOWER).coordinator().shared_objective(), None);

    // Tick two: the follower processes its inbox and converges.
    let _ = swarm.tick();
    assert_eq!(
        swarm.agent(FOLLOWER).coordinator().shared_objective(),
        Some(objective)
    );

    let mut completion_tick = None;
    for tick in 3..=10 {
        let _ = swarm.tick();
        if swarm.agent(SCOUT).coordinator().is_resolved(objective) {
            completion_tick = Some(tick);
            break;
        }
    }
    let completion_tick = completion_tick.expect("scout completed the objective");
    assert_eq!(swarm.world.position_of(SCOUT), Some(objective));

    // One more tick carries the completion announcement to the rest of
    // the swarm; every replica converges to resolved.
    let _ = swarm.tick();
    for id in [SCOUT, FOLLOWER, TOWER] {
        assert!(
            swarm.agent(id).coordinator().is_resolved(objective),
            "agent {} never saw the completion",
            id.get()
        );
        assert_eq!(swarm.agent(id).coordinator().shared_objective(), None);
    }

    // The SaveChips sent alongside the completion opened a saving window
    // on the tower, so production is now suppressed.
    assert!(swarm.agent(TOWER).coordinator().saving_active());
    let produced_before = swarm.agent(TOWER).production().total();
    let _ = swarm.tick();
    assert_eq!(swarm.agent(TOWER).production().total(), produced_before);

    assert!(completion_tick <= 6, "convergence took {completion_tick} ticks");
}

#[test]
fn tower_production_follows_target_ratios() {
    let mut swarm = Swarm::new();
    let mut built = Vec::new();
    for _ in 0..6 {
        let outcomes = swarm.tick();
        for (id, outcome) in outcomes {
            if id == TOWER {
                if let Some(kind) = outcome.build {
                    built.push(kind);
                }
            }
        }
    }

    assert_eq!(
        built,
        vec![
            UnitKind::Soldier,
            UnitKind::Mopper,
            UnitKind::Splasher,
            UnitKind::Soldier,
            UnitKind::Mopper,
            UnitKind::Soldier,
        ]
    );
}

#[test]
fn idle_soldiers_hold_without_an_objective() {
    let mut swarm = Swarm::new();
    for _ in 0..3 {
        for (id, outcome) in swarm.tick() {
            if id != TOWER {
                assert_eq!(outcome.movement, MoveIntent::Hold);
            }
        }
    }
}

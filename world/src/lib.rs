#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic harness world for the gridswarm decision core.
//!
//! Realizes the two external collaborators the core is specified against:
//! a bounded grid answering per-agent [`WorldQuery`] calls, and a
//! [`MessageBus`] with one-tick delivery latency and a per-tick send
//! capacity beyond which messages are silently dropped. Everything here is
//! synchronous and replayable; the same command sequence always produces
//! the same world.

use std::collections::{BTreeMap, HashSet, VecDeque};

use gridswarm_core::{AgentId, Direction, GridPoint, Message, Messaging, MoveIntent, Recipient, WorldQuery};
use thiserror::Error;

/// Reasons a world mutation request is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The requested cell lies outside the grid bounds.
    #[error("cell ({}, {}) is outside the grid", point.x(), point.y())]
    OutOfBounds {
        /// The offending cell.
        point: GridPoint,
    },
    /// The requested cell is impassable.
    #[error("cell ({}, {}) is blocked", point.x(), point.y())]
    CellBlocked {
        /// The offending cell.
        point: GridPoint,
    },
    /// The requested cell already holds another agent.
    #[error("cell ({}, {}) is occupied", point.x(), point.y())]
    CellOccupied {
        /// The offending cell.
        point: GridPoint,
    },
    /// No agent with the provided identifier exists in the world.
    #[error("agent {} is not placed in the world", id.get())]
    UnknownAgent {
        /// The unrecognized identifier.
        id: AgentId,
    },
    /// An agent with the provided identifier is already placed.
    #[error("agent {} is already placed in the world", id.get())]
    AgentExists {
        /// The duplicated identifier.
        id: AgentId,
    },
}

/// Bounded grid holding impassable cells and at most one agent per cell.
#[derive(Clone, Debug)]
pub struct GridWorld {
    width: i32,
    height: i32,
    blocked: HashSet<GridPoint>,
    positions: BTreeMap<AgentId, GridPoint>,
}

impl GridWorld {
    /// Creates an empty grid spanning `(0, 0)` to `(width - 1, height - 1)`.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
            blocked: HashSet::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Width of the grid in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the grid in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, point: GridPoint) -> bool {
        point.x() >= 0 && point.x() < self.width && point.y() >= 0 && point.y() < self.height
    }

    /// Marks a cell impassable. Out-of-bounds cells are ignored; they are
    /// impassable already.
    pub fn block(&mut self, point: GridPoint) {
        if self.in_bounds(point) {
            let _ = self.blocked.insert(point);
        }
    }

    /// Reports whether the cell is marked impassable.
    #[must_use]
    pub fn is_blocked(&self, point: GridPoint) -> bool {
        self.blocked.contains(&point)
    }

    /// Agent occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, point: GridPoint) -> Option<AgentId> {
        self.positions
            .iter()
            .find(|(_, position)| **position == point)
            .map(|(id, _)| *id)
    }

    /// Reports whether an agent may stand on the provided cell.
    #[must_use]
    pub fn can_enter(&self, point: GridPoint) -> bool {
        self.in_bounds(point) && !self.is_blocked(point) && self.occupant(point).is_none()
    }

    /// Places a new agent on the grid.
    ///
    /// # Errors
    ///
    /// Rejects duplicate identifiers and cells that are out of bounds,
    /// blocked, or occupied.
    pub fn place_agent(&mut self, id: AgentId, point: GridPoint) -> Result<(), WorldError> {
        if self.positions.contains_key(&id) {
            return Err(WorldError::AgentExists { id });
        }
        if !self.in_bounds(point) {
            return Err(WorldError::OutOfBounds { point });
        }
        if self.is_blocked(point) {
            return Err(WorldError::CellBlocked { point });
        }
        if self.occupant(point).is_some() {
            return Err(WorldError::CellOccupied { point });
        }
        let _ = self.positions.insert(id, point);
        Ok(())
    }

    /// Current position of the provided agent.
    #[must_use]
    pub fn position_of(&self, id: AgentId) -> Option<GridPoint> {
        self.positions.get(&id).copied()
    }

    /// Identifiers of all placed agents in deterministic order.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.positions.keys().copied()
    }

    /// Executes a movement intent for the provided agent.
    ///
    /// A `Hold` intent always succeeds and leaves the agent in place. A
    /// blocked `Move` is rejected rather than absorbed so the harness can
    /// assert that the decision core only emits permitted moves.
    ///
    /// # Errors
    ///
    /// Rejects unknown agents and destination cells that are out of
    /// bounds, blocked, or occupied.
    pub fn execute(&mut self, id: AgentId, intent: MoveIntent) -> Result<GridPoint, WorldError> {
        let position = self
            .position_of(id)
            .ok_or(WorldError::UnknownAgent { id })?;

        let MoveIntent::Move(heading) = intent else {
            return Ok(position);
        };

        let destination = position.step(heading);
        if !self.in_bounds(destination) {
            return Err(WorldError::OutOfBounds { point: destination });
        }
        if self.is_blocked(destination) {
            return Err(WorldError::CellBlocked { point: destination });
        }
        if self.occupant(destination).is_some() {
            return Err(WorldError::CellOccupied { point: destination });
        }

        let _ = self.positions.insert(id, destination);
        Ok(destination)
    }

    /// Captures a single-tick query view for the provided agent.
    ///
    /// # Errors
    ///
    /// Rejects identifiers that were never placed.
    pub fn view(&self, id: AgentId) -> Result<AgentView<'_>, WorldError> {
        let position = self
            .position_of(id)
            .ok_or(WorldError::UnknownAgent { id })?;
        Ok(AgentView {
            world: self,
            position,
        })
    }
}

/// One agent's world-query window for a single tick.
#[derive(Clone, Copy, Debug)]
pub struct AgentView<'a> {
    world: &'a GridWorld,
    position: GridPoint,
}

impl WorldQuery for AgentView<'_> {
    fn position(&self) -> GridPoint {
        self.position
    }

    fn can_move(&self, heading: Direction) -> bool {
        self.world.can_enter(self.position.step(heading))
    }
}

#[derive(Clone, Copy, Debug)]
struct Envelope {
    sender: AgentId,
    recipient: Recipient,
    message: Message,
}

/// Best-effort inter-agent channel with one-tick delivery latency.
///
/// Messages sent during tick `T` become visible no earlier than tick
/// `T + 1`, once [`MessageBus::deliver`] runs at the tick boundary. Sends
/// beyond the per-tick capacity are dropped and reported to the sender via
/// the `false` return of [`Messaging::send`].
#[derive(Clone, Debug)]
pub struct MessageBus {
    capacity_per_tick: usize,
    sent_this_tick: usize,
    pending: VecDeque<Envelope>,
    inboxes: BTreeMap<AgentId, Vec<Message>>,
}

impl MessageBus {
    /// Creates a bus that accepts at most `capacity_per_tick` sends per
    /// tick across all agents.
    #[must_use]
    pub fn new(capacity_per_tick: usize) -> Self {
        Self {
            capacity_per_tick,
            sent_this_tick: 0,
            pending: VecDeque::new(),
            inboxes: BTreeMap::new(),
        }
    }

    /// Registers an agent so broadcasts reach it.
    pub fn register(&mut self, id: AgentId) {
        let _ = self.inboxes.entry(id).or_default();
    }

    /// Queues a message from `sender`, returning whether it was accepted.
    pub fn send_from(&mut self, sender: AgentId, recipient: Recipient, message: Message) -> bool {
        if self.sent_this_tick >= self.capacity_per_tick {
            return false;
        }
        self.sent_this_tick += 1;
        self.pending.push_back(Envelope {
            sender,
            recipient,
            message,
        });
        true
    }

    /// Borrows a sending handle bound to one agent.
    #[must_use]
    pub fn outbox(&mut self, sender: AgentId) -> Outbox<'_> {
        Outbox { bus: self, sender }
    }

    /// Messages delivered to the provided agent for the current tick.
    #[must_use]
    pub fn inbox(&self, id: AgentId) -> &[Message] {
        self.inboxes.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Advances the bus across a tick boundary.
    ///
    /// Clears every inbox, then moves all pending messages into their
    /// recipients' inboxes and resets the per-tick capacity counter.
    /// Broadcasts reach every registered agent except the sender.
    pub fn deliver(&mut self) {
        for inbox in self.inboxes.values_mut() {
            inbox.clear();
        }

        while let Some(envelope) = self.pending.pop_front() {
            match envelope.recipient {
                Recipient::Agent(id) => {
                    if let Some(inbox) = self.inboxes.get_mut(&id) {
                        inbox.push(envelope.message);
                    }
                }
                Recipient::Broadcast => {
                    for (id, inbox) in &mut self.inboxes {
                        if *id != envelope.sender {
                            inbox.push(envelope.message);
                        }
                    }
                }
            }
        }

        self.sent_this_tick = 0;
    }
}

/// Sending handle that stamps one agent as the sender.
#[derive(Debug)]
pub struct Outbox<'a> {
    bus: &'a mut MessageBus,
    sender: AgentId,
}

impl Messaging for Outbox<'_> {
    fn send(&mut self, recipient: Recipient, message: Message) -> bool {
        self.bus.send_from(self.sender, recipient, message)
    }
}

#[cfg(test)]
mod tests {
    use super::{GridWorld, MessageBus, WorldError};
    use gridswarm_core::{
        AgentId, Direction, GridPoint, Message, MoveIntent, Recipient, WorldQuery,
    };

    #[test]
    fn placement_rejects_blocked_and_occupied_cells() {
        let mut world = GridWorld::new(4, 4);
        let wall = GridPoint::new(1, 1);
        world.block(wall);

        assert_eq!(
            world.place_agent(AgentId::new(1), wall),
            Err(WorldError::CellBlocked { point: wall })
        );

        let cell = GridPoint::new(2, 2);
        world.place_agent(AgentId::new(1), cell).expect("place");
        assert_eq!(
            world.place_agent(AgentId::new(2), cell),
            Err(WorldError::CellOccupied { point: cell })
        );
    }

    #[test]
    fn view_answers_movement_permissions() {
        let mut world = GridWorld::new(3, 3);
        world.block(GridPoint::new(1, 1));
        world
            .place_agent(AgentId::new(1), GridPoint::new(0, 0))
            .expect("place");

        let view = world.view(AgentId::new(1)).expect("view");
        assert_eq!(view.position(), GridPoint::new(0, 0));
        assert!(view.can_move(Direction::East));
        assert!(!view.can_move(Direction::Northeast));
        assert!(!view.can_move(Direction::South));
    }

    #[test]
    fn execute_moves_agent_one_step() {
        let mut world = GridWorld::new(3, 3);
        let id = AgentId::new(7);
        world.place_agent(id, GridPoint::new(0, 0)).expect("place");

        let landed = world
            .execute(id, MoveIntent::Move(Direction::Northeast))
            .expect("move");
        assert_eq!(landed, GridPoint::new(1, 1));
        assert_eq!(world.position_of(id), Some(landed));

        let held = world.execute(id, MoveIntent::Hold).expect("hold");
        assert_eq!(held, landed);
    }

    #[test]
    fn messages_arrive_one_tick_later() {
        let mut bus = MessageBus::new(16);
        let sender = AgentId::new(1);
        let receiver = AgentId::new(2);
        bus.register(sender);
        bus.register(receiver);

        assert!(bus.send_from(sender, Recipient::Agent(receiver), Message::SaveChips));
        assert!(bus.inbox(receiver).is_empty());

        bus.deliver();
        assert_eq!(bus.inbox(receiver), &[Message::SaveChips]);

        bus.deliver();
        assert!(bus.inbox(receiver).is_empty());
    }

    #[test]
    fn broadcast_skips_the_sender() {
        let mut bus = MessageBus::new(16);
        let ids = [AgentId::new(1), AgentId::new(2), AgentId::new(3)];
        for id in ids {
            bus.register(id);
        }

        let announcement = Message::TargetCompleted {
            point: GridPoint::new(3, 3),
        };
        assert!(bus.send_from(ids[0], Recipient::Broadcast, announcement));
        bus.deliver();

        assert!(bus.inbox(ids[0]).is_empty());
        assert_eq!(bus.inbox(ids[1]), &[announcement]);
        assert_eq!(bus.inbox(ids[2]), &[announcement]);
    }

    #[test]
    fn sends_beyond_capacity_are_dropped() {
        let mut bus = MessageBus::new(2);
        let sender = AgentId::new(1);
        let receiver = AgentId::new(2);
        bus.register(sender);
        bus.register(receiver);

        assert!(bus.send_from(sender, Recipient::Agent(receiver), Message::SaveChips));
        assert!(bus.send_from(sender, Recipient::Agent(receiver), Message::SaveChips));
        assert!(!bus.send_from(sender, Recipient::Agent(receiver), Message::SaveChips));

        bus.deliver();
        assert_eq!(bus.inbox(receiver).len(), 2);

        // Capacity resets at the tick boundary.
        assert!(bus.send_from(sender, Recipient::Agent(receiver), Message::UpgradeTower));
    }
}

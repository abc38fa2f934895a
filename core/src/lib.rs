#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gridswarm decision stack.
//!
//! This crate defines the value types, message surface, and collaborator
//! traits that connect the pure decision systems to the world they act in.
//! Systems consume [`WorldQuery`] answers and per-tick inboxes of
//! [`Message`] values, and respond with at most one [`MoveIntent`] per
//! tick; the external control loop executes intents and carries outbound
//! messages through a [`Messaging`] channel whose delivery is best effort.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of ticks a saving window lasts after a `SaveChips` trigger.
pub const SAVE_CHIPS_TURNS: u32 = 20;

/// Number of cooldown ticks that follow a `SaveChips` saving window.
pub const SAVE_CHIPS_COOLDOWN: u32 = 20;

/// Number of ticks a saving window lasts after an `UpgradeTower` trigger.
pub const UPGRADE_TOWER_TURNS: u32 = 30;

/// Number of cooldown ticks that follow an `UpgradeTower` saving window.
pub const UPGRADE_TOWER_COOLDOWN: u32 = 30;

/// Integer grid coordinate with value semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    x: i32,
    y: i32,
}

impl GridPoint {
    /// Creates a new grid point at the provided coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Squared Euclidean distance between two points.
    ///
    /// Widened to `i64` so the result is exact for the full `i32`
    /// coordinate range.
    #[must_use]
    pub const fn distance_squared(&self, other: GridPoint) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Compass heading from `self` toward `other`, by per-axis signum.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::CoincidentPoints`] when both points are
    /// equal; there is no meaningful heading between a point and itself,
    /// and inventing one would corrupt any caller that caches headings.
    pub fn direction_to(&self, other: GridPoint) -> Result<Direction, GeometryError> {
        if *self == other {
            return Err(GeometryError::CoincidentPoints { point: *self });
        }

        let heading = match ((other.x - self.x).signum(), (other.y - self.y).signum()) {
            (0, 1) => Direction::North,
            (1, 1) => Direction::Northeast,
            (1, 0) => Direction::East,
            (1, -1) => Direction::Southeast,
            (0, -1) => Direction::South,
            (-1, -1) => Direction::Southwest,
            (-1, 0) => Direction::West,
            _ => Direction::Northwest,
        };
        Ok(heading)
    }

    /// Point reached by taking one step along the provided heading.
    #[must_use]
    pub const fn step(&self, heading: Direction) -> GridPoint {
        let (dx, dy) = heading.delta();
        GridPoint::new(self.x + dx, self.y + dy)
    }
}

/// Contract violations surfaced by geometric queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A heading was requested between a point and itself.
    #[error("no heading exists between coincident points at ({}, {})", point.x(), point.y())]
    CoincidentPoints {
        /// The point supplied as both endpoints.
        point: GridPoint,
    },
}

/// Eight compass headings available to an agent, ordered clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `y`.
    North,
    /// Movement toward increasing `x` and `y`.
    Northeast,
    /// Movement toward increasing `x`.
    East,
    /// Movement toward increasing `x`, decreasing `y`.
    Southeast,
    /// Movement toward decreasing `y`.
    South,
    /// Movement toward decreasing `x` and `y`.
    Southwest,
    /// Movement toward decreasing `x`.
    West,
    /// Movement toward decreasing `x`, increasing `y`.
    Northwest,
}

impl Direction {
    /// All headings in clockwise order starting from north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
    ];

    const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::Northeast => 1,
            Direction::East => 2,
            Direction::Southeast => 3,
            Direction::South => 4,
            Direction::Southwest => 5,
            Direction::West => 6,
            Direction::Northwest => 7,
        }
    }

    /// Heading rotated 45° counter-clockwise (East becomes Northeast).
    #[must_use]
    pub const fn rotate_left(self) -> Direction {
        Direction::ALL[(self.index() + 7) % 8]
    }

    /// Heading rotated 45° clockwise (East becomes Southeast).
    #[must_use]
    pub const fn rotate_right(self) -> Direction {
        Direction::ALL[(self.index() + 1) % 8]
    }

    /// Heading rotated a half turn.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }

    /// Unit coordinate delta for one step along the heading.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::Northeast => (1, 1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, -1),
            Direction::South => (0, -1),
            Direction::Southwest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, 1),
        }
    }
}

/// Single movement decision emitted by the navigator each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MoveIntent {
    /// Stay in place this tick.
    #[default]
    Hold,
    /// Take one step along the provided heading.
    Move(Direction),
}

/// Unique identifier assigned to an agent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavioral role an agent runs its tick loop as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Pursues the shared objective and completes it on arrival.
    Soldier,
    /// Wanders the map clearing work; moves randomly each tick.
    Mopper,
    /// Pursues the shared objective by direct heading, wandering otherwise.
    Splasher,
    /// Stationary producer that builds units and honors saving windows.
    Tower,
}

/// Kinds of mobile units a tower can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Objective-completing unit.
    Soldier,
    /// Clearing unit.
    Mopper,
    /// Area-effect unit.
    Splasher,
}

/// Typed records exchanged between agents once per tick.
///
/// Delivery is best effort: the channel may drop a message, and a dropped
/// message is a normal outcome every consumer must tolerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Assigns the swarm-wide objective.
    SetTarget {
        /// Objective location being assigned.
        point: GridPoint,
    },
    /// Announces that the objective at `point` has been completed.
    TargetCompleted {
        /// Objective location that was completed.
        point: GridPoint,
    },
    /// Requests a resource-saving window ahead of a large spend.
    SaveChips,
    /// Requests a longer saving window ahead of a tower upgrade.
    UpgradeTower,
}

/// Addressing for an outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Deliver to every agent except the sender.
    Broadcast,
    /// Deliver to a single agent.
    Agent(AgentId),
}

/// Per-tick world answers the decision core consumes.
///
/// Implementations answer for exactly one agent on exactly one tick; a
/// `false` permission is a normal branch, never a failure.
pub trait WorldQuery {
    /// Current position of the querying agent.
    fn position(&self) -> GridPoint;

    /// Reports whether a single step along `heading` is permitted.
    fn can_move(&self, heading: Direction) -> bool;
}

/// Best-effort outbound message channel.
pub trait Messaging {
    /// Attempts to send a message, returning whether it was accepted.
    ///
    /// A `false` return means the channel dropped the message (for example
    /// a per-tick capacity was exceeded); senders must not treat this as an
    /// error.
    fn send(&mut self, recipient: Recipient, message: Message) -> bool;
}

#[cfg(test)]
mod tests {
    use super::{AgentId, Direction, GeometryError, GridPoint, Message, Recipient};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn distance_squared_matches_expectation() {
        let origin = GridPoint::new(0, 0);
        let other = GridPoint::new(3, 4);
        assert_eq!(origin.distance_squared(other), 25);
        assert_eq!(other.distance_squared(origin), 25);
        assert_eq!(origin.distance_squared(origin), 0);
    }

    #[test]
    fn direction_to_uses_per_axis_signum() {
        let origin = GridPoint::new(2, 2);
        assert_eq!(
            origin.direction_to(GridPoint::new(2, 9)),
            Ok(Direction::North)
        );
        assert_eq!(
            origin.direction_to(GridPoint::new(7, 5)),
            Ok(Direction::Northeast)
        );
        assert_eq!(
            origin.direction_to(GridPoint::new(0, 0)),
            Ok(Direction::Southwest)
        );
        assert_eq!(
            origin.direction_to(GridPoint::new(1, 2)),
            Ok(Direction::West)
        );
    }

    #[test]
    fn direction_to_rejects_coincident_points() {
        let point = GridPoint::new(4, -1);
        assert_eq!(
            point.direction_to(point),
            Err(GeometryError::CoincidentPoints { point })
        );
    }

    #[test]
    fn rotations_cycle_through_all_headings() {
        let mut heading = Direction::East;
        for _ in 0..8 {
            heading = heading.rotate_left();
        }
        assert_eq!(heading, Direction::East);

        assert_eq!(Direction::East.rotate_left(), Direction::Northeast);
        assert_eq!(Direction::East.rotate_right(), Direction::Southeast);
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::Southwest.opposite(), Direction::Northeast);
    }

    #[test]
    fn step_applies_heading_delta() {
        let origin = GridPoint::new(0, 0);
        assert_eq!(origin.step(Direction::North), GridPoint::new(0, 1));
        assert_eq!(origin.step(Direction::Southwest), GridPoint::new(-1, -1));
        let round_trip = origin
            .step(Direction::Northeast)
            .step(Direction::Northeast.opposite());
        assert_eq!(round_trip, origin);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn messages_round_trip_through_bincode() {
        assert_round_trip(&Message::SetTarget {
            point: GridPoint::new(3, 3),
        });
        assert_round_trip(&Message::SaveChips);
    }

    #[test]
    fn recipient_round_trips_through_bincode() {
        assert_round_trip(&Recipient::Agent(AgentId::new(7)));
        assert_round_trip(&Recipient::Broadcast);
    }
}

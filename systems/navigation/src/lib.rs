#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bug2 obstacle-avoidance navigation over a discrete grid.
//!
//! The navigator owns the per-agent pathing state and emits at most one
//! [`MoveIntent`] per tick. Direct pursuit follows the compass heading to
//! the destination; when that heading is blocked the navigator switches to
//! wall-following and keeps tracing the obstacle until it re-crosses the
//! cached straight-line path strictly closer to the destination than where
//! tracing began.

use std::collections::HashSet;

use gridswarm_core::{Direction, GeometryError, GridPoint, MoveIntent, WorldQuery};

/// Computes the ordered 8-connected trace of the segment from `a` to `b`.
///
/// Integer Bresenham stepper: both endpoints are always included, every
/// consecutive pair of cells is 8-adjacent, and the same inputs always
/// yield the same trace. `a == b` produces a single-cell trace.
#[must_use]
pub fn trace_line(a: GridPoint, b: GridPoint) -> Vec<GridPoint> {
    let mut cells = Vec::new();

    let mut x = a.x();
    let mut y = a.y();
    let sx = (b.x() - a.x()).signum();
    let sy = (b.y() - a.y()).signum();
    let dx = (b.x() - a.x()).abs();
    let dy = (b.y() - a.y()).abs();

    let mut err = dx - dy;
    loop {
        cells.push(GridPoint::new(x, y));

        if x == b.x() && y == b.y() {
            break;
        }

        let doubled = 2 * err;
        if doubled > -dy {
            err -= dy;
            x += sx;
        }
        if doubled < dx {
            err += dx;
            y += sy;
        }
    }

    cells
}

/// Wall-following bookkeeping held only while the navigator traces an
/// obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Trace {
    heading: Direction,
    entry_distance: i64,
}

/// Per-agent Bug2 state machine deciding one step of travel per tick.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    destination: Option<GridPoint>,
    previous_destination: Option<GridPoint>,
    path_line: HashSet<GridPoint>,
    trace: Option<Trace>,
}

impl Navigator {
    /// Creates an idle navigator with no destination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the travel destination; `None` makes the navigator idle.
    ///
    /// The cached path line is invalidated lazily: the next [`step`] call
    /// observes the change, retraces the line from the position it holds
    /// then, and restarts in direct pursuit even if an obstacle trace was
    /// in progress. That unconditional restart is a known liveness
    /// weakness when destinations churn next to an obstacle; it is kept
    /// because every downstream replay depends on it.
    ///
    /// [`step`]: Navigator::step
    pub fn set_destination(&mut self, destination: Option<GridPoint>) {
        self.destination = destination;
    }

    /// Currently assigned destination, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<GridPoint> {
        self.destination
    }

    /// Reports whether the navigator is wall-following this tick.
    #[must_use]
    pub const fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Heading the navigator will try first while wall-following.
    #[must_use]
    pub fn tracing_heading(&self) -> Option<Direction> {
        self.trace.map(|trace| trace.heading)
    }

    /// Decides this tick's movement toward the current destination.
    ///
    /// Emits at most one movement. Ticks that change mode (entering
    /// tracing, or exiting it via the re-entry test) emit no movement;
    /// travel resumes on the following tick. Blocked headings are normal
    /// branches supplied by the world, never errors.
    ///
    /// # Errors
    ///
    /// Propagates [`GeometryError`] only for collaborator contract
    /// violations; a destination equal to the current position is handled
    /// as "already arrived" before any heading is computed.
    pub fn step<W: WorldQuery>(&mut self, world: &W) -> Result<MoveIntent, GeometryError> {
        let Some(destination) = self.destination else {
            return Ok(MoveIntent::Hold);
        };

        let position = world.position();
        if position == destination {
            return Ok(MoveIntent::Hold);
        }

        if self.previous_destination != Some(destination) {
            self.previous_destination = Some(destination);
            self.path_line = trace_line(position, destination).into_iter().collect();
            self.trace = None;
        }

        match self.trace.as_mut() {
            None => {
                let heading = position.direction_to(destination)?;
                if world.can_move(heading) {
                    Ok(MoveIntent::Move(heading))
                } else {
                    // The mode switch consumes the tick; movement resumes
                    // next tick in tracing mode.
                    self.trace = Some(Trace {
                        heading,
                        entry_distance: position.distance_squared(destination),
                    });
                    Ok(MoveIntent::Hold)
                }
            }
            Some(trace) => {
                let back_on_line = self.path_line.contains(&position)
                    && position.distance_squared(destination) < trace.entry_distance;
                if back_on_line {
                    self.trace = None;
                    return Ok(MoveIntent::Hold);
                }

                for _ in 0..8 {
                    if world.can_move(trace.heading) {
                        return Ok(MoveIntent::Move(trace.heading));
                    }
                    trace.heading = trace.heading.rotate_left();
                }
                Ok(MoveIntent::Hold)
            }
        }
    }
}

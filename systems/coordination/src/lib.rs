#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replicated swarm-objective state machine.
//!
//! Every agent of a role group holds its own [`Coordinator`], updated only
//! by the messages that agent personally receives. The replicas converge
//! toward agreement on the current shared objective and the set of resolved
//! objectives, tolerating dropped messages: a missed assignment leaves a
//! replica idle for longer, a missed completion leaves it pursuing a
//! resolved objective. An orthogonal saving/cooldown sub-machine gates
//! resource spending.

use std::collections::HashSet;

use gridswarm_core::{
    GridPoint, Message, SAVE_CHIPS_COOLDOWN, SAVE_CHIPS_TURNS, UPGRADE_TOWER_COOLDOWN,
    UPGRADE_TOWER_TURNS,
};

/// The trigger that started the most recent saving window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SavingTrigger {
    /// No saving window has started, or the last one already paid out its
    /// cooldown.
    #[default]
    None,
    /// Saving toward a large resource spend.
    ResourceSave,
    /// Saving toward a tower upgrade.
    UpgradeSave,
}

impl SavingTrigger {
    const fn cooldown(self) -> u32 {
        match self {
            SavingTrigger::None => 0,
            SavingTrigger::ResourceSave => SAVE_CHIPS_COOLDOWN,
            SavingTrigger::UpgradeSave => UPGRADE_TOWER_COOLDOWN,
        }
    }
}

/// One agent's replica of the role group's coordination state.
#[derive(Clone, Debug, Default)]
pub struct Coordinator {
    shared_objective: Option<GridPoint>,
    resolved_objectives: HashSet<GridPoint>,
    saving_turns_remaining: u32,
    saving_cooldown_remaining: u32,
    last_saving_trigger: SavingTrigger,
}

impl Coordinator {
    /// Creates an idle replica with no objective and no saving window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Objective currently assigned to the swarm, as seen by this replica.
    #[must_use]
    pub const fn shared_objective(&self) -> Option<GridPoint> {
        self.shared_objective
    }

    /// Reports whether the provided objective has already been completed.
    #[must_use]
    pub fn is_resolved(&self, point: GridPoint) -> bool {
        self.resolved_objectives.contains(&point)
    }

    /// Reports whether a saving window is active this tick.
    #[must_use]
    pub const fn saving_active(&self) -> bool {
        self.saving_turns_remaining > 0
    }

    /// Ticks left in the active saving window.
    #[must_use]
    pub const fn saving_turns_remaining(&self) -> u32 {
        self.saving_turns_remaining
    }

    /// Ticks left in the post-saving cooldown.
    #[must_use]
    pub const fn saving_cooldown_remaining(&self) -> u32 {
        self.saving_cooldown_remaining
    }

    /// Reports whether resource-consuming actions are permitted this tick.
    ///
    /// Spending is suppressed only while a saving window is active; the
    /// cooldown merely blocks new windows from starting.
    #[must_use]
    pub const fn spending_permitted(&self) -> bool {
        !self.saving_active()
    }

    /// Advances the saving timers by one tick.
    ///
    /// Must run before this tick's inbox is processed, so a trigger that
    /// arrives the same tick a window expires observes the cooldown. When
    /// the saving window reaches zero the cooldown starts, sized by the
    /// trigger that opened the window.
    pub fn begin_tick(&mut self) {
        if self.saving_turns_remaining > 0 {
            self.saving_turns_remaining -= 1;
            if self.saving_turns_remaining == 0 {
                self.saving_cooldown_remaining = self.last_saving_trigger.cooldown();
                self.last_saving_trigger = SavingTrigger::None;
            }
        } else if self.saving_cooldown_remaining > 0 {
            self.saving_cooldown_remaining -= 1;
        }
    }

    /// Applies one inbound message to this replica.
    ///
    /// Messages are applied in inbox arrival order; for `SetTarget` that
    /// order makes the last writer win, including overwriting an existing
    /// assignment, unless the point was already resolved. Saving triggers
    /// that arrive while a window or cooldown runs are dropped, never
    /// queued.
    pub fn observe(&mut self, message: Message) {
        match message {
            Message::SetTarget { point } => {
                if !self.is_resolved(point) {
                    self.shared_objective = Some(point);
                }
            }
            Message::TargetCompleted { point } => self.resolve(point),
            Message::SaveChips => {
                self.try_start_saving(SavingTrigger::ResourceSave, SAVE_CHIPS_TURNS);
            }
            Message::UpgradeTower => {
                self.try_start_saving(SavingTrigger::UpgradeSave, UPGRADE_TOWER_TURNS);
            }
        }
    }

    /// Applies a whole inbox in arrival order.
    pub fn observe_all(&mut self, inbox: &[Message]) {
        for message in inbox {
            self.observe(*message);
        }
    }

    /// Records a locally determined completion of `point`.
    ///
    /// Returns the `TargetCompleted` announcement the caller should send to
    /// the rest of the swarm so every other replica performs the same
    /// transition when (and if) the message arrives.
    #[must_use]
    pub fn complete_objective(&mut self, point: GridPoint) -> Message {
        self.resolve(point);
        Message::TargetCompleted { point }
    }

    fn resolve(&mut self, point: GridPoint) {
        let _ = self.resolved_objectives.insert(point);
        if self.shared_objective == Some(point) {
            self.shared_objective = None;
        }
    }

    fn try_start_saving(&mut self, trigger: SavingTrigger, turns: u32) {
        if self.saving_turns_remaining > 0 || self.saving_cooldown_remaining > 0 {
            return;
        }
        self.saving_turns_remaining = turns;
        self.last_saving_trigger = trigger;
    }
}

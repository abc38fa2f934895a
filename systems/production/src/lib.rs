#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ratio-driven unit production planning for tower agents.
//!
//! Keeps the produced mix near a fixed target composition by always
//! proposing the first unit kind whose realized fraction sits below its
//! target share. Soldiers are checked first, so an empty ledger always
//! proposes a soldier.

use gridswarm_core::UnitKind;

/// Target fraction of soldiers in the produced mix.
pub const SOLDIER_RATIO: f64 = 0.5;

/// Target fraction of moppers in the produced mix.
pub const MOPPER_RATIO: f64 = 0.3;

/// Target fraction of splashers in the produced mix.
pub const SPLASHER_RATIO: f64 = 0.2;

/// Ledger of units produced so far by one tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductionLedger {
    soldiers: u32,
    moppers: u32,
    splashers: u32,
}

impl ProductionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            soldiers: 0,
            moppers: 0,
            splashers: 0,
        }
    }

    /// Total units recorded in the ledger.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.soldiers + self.moppers + self.splashers
    }

    /// Units of the provided kind recorded in the ledger.
    #[must_use]
    pub const fn count(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Soldier => self.soldiers,
            UnitKind::Mopper => self.moppers,
            UnitKind::Splasher => self.splashers,
        }
    }

    /// Records one produced unit of the provided kind.
    pub fn record(&mut self, kind: UnitKind) {
        match kind {
            UnitKind::Soldier => self.soldiers += 1,
            UnitKind::Mopper => self.moppers += 1,
            UnitKind::Splasher => self.splashers += 1,
        }
    }

    /// Realized fraction of the provided kind, zero for an empty ledger.
    #[must_use]
    pub fn fraction(&self, kind: UnitKind) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.count(kind)) / f64::from(total)
    }

    /// Next unit kind to build, or `None` when every target share is met.
    #[must_use]
    pub fn next_unit(&self) -> Option<UnitKind> {
        if self.fraction(UnitKind::Soldier) < SOLDIER_RATIO {
            Some(UnitKind::Soldier)
        } else if self.fraction(UnitKind::Mopper) < MOPPER_RATIO {
            Some(UnitKind::Mopper)
        } else if self.fraction(UnitKind::Splasher) < SPLASHER_RATIO {
            Some(UnitKind::Splasher)
        } else {
            None
        }
    }
}

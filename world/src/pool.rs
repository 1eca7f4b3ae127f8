//! Fixed-capacity unit storage with in-place slot reuse.

use castle_defence_core::{CellCoord, UnitId};
use glam::Vec2;

/// Initial state written into a pool slot when a unit spawns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSeed {
    /// Spawn position in world units.
    pub position: Vec2,
    /// First waypoint of the unit.
    pub target: CellCoord,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Starting health.
    pub health: u32,
    /// Score granted on elimination.
    pub worth: u32,
}

/// Enemy unit hosted by a pool slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    position: Vec2,
    target: CellCoord,
    speed: f32,
    health: u32,
    worth: u32,
    active: bool,
}

impl Unit {
    const VACANT: Self = Self {
        position: Vec2::ZERO,
        target: CellCoord::new(0, 0),
        speed: 0.0,
        health: 0,
        worth: 0,
        active: false,
    };

    /// Continuous world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Waypoint the unit walks toward.
    #[must_use]
    pub const fn target(&self) -> CellCoord {
        self.target
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Score granted on elimination.
    #[must_use]
    pub const fn worth(&self) -> u32 {
        self.worth
    }

    /// Whether the slot currently hosts a live unit.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn retarget(&mut self, target: CellCoord) {
        self.target = target;
    }

    pub(crate) fn relocate(&mut self, position: Vec2) {
        self.position = position;
    }
}

/// Fixed set of unit slots; inactive slots are free for reuse.
#[derive(Clone, Debug)]
pub struct UnitPool {
    slots: Vec<Unit>,
}

impl UnitPool {
    /// Creates a pool with `capacity` vacant slots.
    #[must_use]
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            slots: vec![Unit::VACANT; capacity as usize],
        }
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots hosting live units.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|unit| unit.active).count()
    }

    /// Writes the seed into the first inactive slot.
    ///
    /// Returns `None` when every slot is taken; the caller decides what a
    /// dropped spawn means.
    pub fn spawn(&mut self, seed: UnitSeed) -> Option<UnitId> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, unit)| !unit.active)?;

        *slot = Unit {
            position: seed.position,
            target: seed.target,
            speed: seed.speed,
            health: seed.health,
            worth: seed.worth,
            active: true,
        };
        Some(UnitId::new(index as u32))
    }

    /// Frees the slot hosting `id`, returning the unit it held.
    ///
    /// Returns `None` when the slot is unknown or already free.
    pub fn eliminate(&mut self, id: UnitId) -> Option<Unit> {
        let slot = self.slots.get_mut(id.get() as usize)?;
        if !slot.active {
            return None;
        }
        slot.active = false;
        Some(*slot)
    }

    /// Live unit in the provided slot.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.slots
            .get(id.get() as usize)
            .filter(|unit| unit.active)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.slots
            .get_mut(id.get() as usize)
            .filter(|unit| unit.active)
    }

    /// Iterator over live units in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.active)
            .map(|(index, unit)| (UnitId::new(index as u32), unit))
    }

    pub(crate) fn iter_active_mut(&mut self) -> impl Iterator<Item = (UnitId, &mut Unit)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, unit)| unit.active)
            .map(|(index, unit)| (UnitId::new(index as u32), unit))
    }
}

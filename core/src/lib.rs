#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Castle Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The simulation submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as [`GridView`] and [`UnitView`], and respond exclusively with new
//! command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Castle Defence.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Resolves a primary pointer click against the active units.
    Click {
        /// Pointer location expressed in world units.
        position: Vec2,
    },
    /// Opens a new wave and records how many units it will release.
    BeginWave {
        /// Number of the wave being opened.
        wave: WaveNumber,
        /// Total number of units the wave releases.
        units: u32,
    },
    /// Releases a single unit of the current wave on the spawn column.
    SpawnUnit {
        /// Wave the unit belongs to; drives its speed.
        wave: WaveNumber,
        /// Grid row the unit enters on.
        row: u32,
    },
    /// Closes the wave once every released unit has been resolved.
    EndWave {
        /// Number of the wave being closed.
        wave: WaveNumber,
    },
    /// Points a unit at a new waypoint cell.
    RetargetUnit {
        /// Unit receiving the new waypoint.
        unit: UnitId,
        /// Cell whose centre the unit walks toward next.
        target: CellCoord,
    },
    /// Moves every active unit toward its waypoint and resolves breaches.
    AdvanceUnits {
        /// Duration of simulated movement.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new wave opened.
    WaveStarted {
        /// Number of the wave that opened.
        wave: WaveNumber,
        /// Units the wave will release.
        units: u32,
    },
    /// Confirms that a unit entered the grid.
    UnitSpawned {
        /// Pool slot that now hosts the unit.
        unit: UnitId,
        /// Cell the unit entered on.
        cell: CellCoord,
    },
    /// Reports that a release was dropped because every pool slot was taken.
    SpawnDropped {
        /// Wave whose release was dropped.
        wave: WaveNumber,
    },
    /// Confirms that a unit chose a new waypoint.
    UnitRetargeted {
        /// Unit that was retargeted.
        unit: UnitId,
        /// Waypoint the unit walked toward before.
        from: CellCoord,
        /// Waypoint the unit walks toward now.
        to: CellCoord,
    },
    /// Confirms that a click eliminated a unit.
    UnitEliminated {
        /// Slot of the eliminated unit.
        unit: UnitId,
        /// Score awarded for the elimination.
        worth: u32,
    },
    /// Reports that a unit reached the goal column and damaged the structure.
    UnitBreached {
        /// Slot of the unit that breached.
        unit: UnitId,
        /// Structure health remaining after the breach.
        structure_health: i32,
    },
    /// Announces that every unit of a wave was resolved.
    WaveCleared {
        /// Number of the wave that closed.
        wave: WaveNumber,
    },
    /// Announces that the session reached a terminal state.
    SessionEnded {
        /// How the session ended.
        outcome: Outcome,
    },
}

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Open ground that units may walk across.
    #[default]
    Empty,
    /// Part of the defended structure; reaching it is a breach.
    Goal,
    /// Impassable terrain.
    Obstacle,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the cell displaced by the provided offsets, if it stays non-negative.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellCoord::new(column, row))
    }
}

/// Unique identifier of a unit, equal to the pool slot it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
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

/// One-based wave counter; zero means no wave has started yet.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a new wave number wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Structure health dropped to zero.
    Defeat,
    /// The final wave was cleared with the structure standing.
    Victory {
        /// Score at the moment of victory.
        score: u32,
    },
}

/// Tuning constants that define a session.
///
/// [`Rules::default`] reproduces the reference game: a 7 × 5 grid of 100-unit
/// cells, five obstacles, a castle with ten health and five waves of `3n` units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    /// Number of grid columns, including the goal column.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a square cell in world units.
    pub cell_length: f32,
    /// Obstacles scattered during grid generation.
    pub obstacle_count: u32,
    /// Columns nearest the goal that never receive obstacles, goal included.
    pub goal_clearance: u32,
    /// Upper bound on rejection-sampling draws during obstacle placement.
    pub max_placement_attempts: u32,
    /// Fixed number of unit slots.
    pub pool_capacity: u32,
    /// Structure health at session start.
    pub structure_health: i32,
    /// Last wave of the session.
    pub final_wave: WaveNumber,
    /// Units released per wave number.
    pub units_per_wave: u32,
    /// Unit speed before the per-wave increment, in world units per second.
    pub base_speed: f32,
    /// Speed added for every wave number.
    pub speed_per_wave: f32,
    /// Score granted for each elimination.
    pub unit_worth: u32,
    /// Health assigned to spawned units.
    pub unit_health: u32,
    /// Interval between unit releases within a wave.
    pub spawn_interval: Duration,
    /// Countdown before the first wave and between waves.
    pub intermission: Duration,
    /// Radius around a unit that registers a click.
    pub hit_radius: f32,
    /// Distance to a waypoint centre under which a unit picks its next waypoint.
    pub retarget_threshold: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            columns: 7,
            rows: 5,
            cell_length: 100.0,
            obstacle_count: 5,
            goal_clearance: 2,
            max_placement_attempts: 10_000,
            pool_capacity: 35,
            structure_health: 10,
            final_wave: WaveNumber::new(5),
            units_per_wave: 3,
            base_speed: 50.0,
            speed_per_wave: 10.0,
            unit_worth: 10,
            unit_health: 1,
            spawn_interval: Duration::from_millis(500),
            intermission: Duration::from_secs(3),
            hit_radius: 20.0,
            retarget_threshold: 5.0,
        }
    }
}

impl Rules {
    /// Number of units released by the provided wave.
    #[must_use]
    pub const fn units_in_wave(&self, wave: WaveNumber) -> u32 {
        wave.get().saturating_mul(self.units_per_wave)
    }

    /// Speed assigned to units released by the provided wave.
    #[must_use]
    pub fn unit_speed(&self, wave: WaveNumber) -> f32 {
        self.base_speed + wave.get() as f32 * self.speed_per_wave
    }
}

/// Read-only view over the grid's cell classifications.
///
/// Cells are stored in row-major order. Every query treats coordinates outside
/// the grid as non-walkable rather than failing.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [CellKind],
    columns: u32,
    rows: u32,
    cell_length: f32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [CellKind], columns: u32, rows: u32, cell_length: f32) -> Self {
        Self {
            cells,
            columns,
            rows,
            cell_length,
        }
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_length(&self) -> f32 {
        self.cell_length
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }

    /// Classification of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether a unit may walk onto the signed coordinate.
    ///
    /// Only empty cells are walkable; goal and obstacle cells, as well as
    /// coordinates outside the grid, are not.
    #[must_use]
    pub fn walkable(&self, column: i64, row: i64) -> bool {
        match (u32::try_from(column), u32::try_from(row)) {
            (Ok(column), Ok(row)) => self.is_walkable(CellCoord::new(column, row)),
            _ => false,
        }
    }

    /// Reports whether a unit may walk onto the provided cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.kind(cell) == Some(CellKind::Empty)
    }

    /// Reports whether the provided cell is part of the goal region.
    #[must_use]
    pub fn is_goal(&self, cell: CellCoord) -> bool {
        self.kind(cell) == Some(CellKind::Goal)
    }

    /// Iterator over every cell and its classification in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellKind)> + 'a {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *kind)
        })
    }

    /// Cell containing the provided world position, if any.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if !self.contains(position) {
            return None;
        }

        let column = (position.x / self.cell_length) as u32;
        let row = (position.y / self.cell_length) as u32;
        Some(CellCoord::new(
            column.min(self.columns.saturating_sub(1)),
            row.min(self.rows.saturating_sub(1)),
        ))
    }

    /// World position of the provided cell's centre.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_length,
            (cell.row() as f32 + 0.5) * self.cell_length,
        )
    }

    /// Reports whether the world position lies within the grid's bounds.
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        self.cell_length > 0.0
            && position.x >= 0.0
            && position.y >= 0.0
            && position.x < self.width()
            && position.y < self.height()
    }

    /// Horizontal world coordinate of the goal region's leading edge.
    #[must_use]
    pub fn goal_edge(&self) -> Option<f32> {
        self.iter()
            .filter(|(_, kind)| *kind == CellKind::Goal)
            .map(|(cell, _)| cell.column())
            .min()
            .map(|column| column as f32 * self.cell_length)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Pool slot hosting the unit.
    pub id: UnitId,
    /// Continuous world position of the unit.
    pub position: Vec2,
    /// Waypoint cell the unit is walking toward.
    pub target: CellCoord,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Remaining health.
    pub health: u32,
    /// Score granted when the unit is eliminated.
    pub worth: u32,
    /// Radius used for click hit-testing.
    pub radius: f32,
}

/// Read-only snapshot describing all active units.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no unit is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Wave bookkeeping the world exposes to the wave scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveStatus {
    /// Most recently opened wave.
    pub wave: WaveNumber,
    /// Units of the current wave that have not been resolved yet.
    pub alive: u32,
    /// Whether a wave is open.
    pub in_progress: bool,
}

/// Aggregate session state exposed to presentation layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Remaining structure health.
    pub structure_health: i32,
    /// Structure health at session start.
    pub max_structure_health: i32,
    /// Most recently opened wave.
    pub wave: WaveNumber,
    /// Last wave of the session.
    pub final_wave: WaveNumber,
    /// Accumulated score.
    pub score: u32,
    /// Units of the current wave that have not been resolved yet.
    pub alive: u32,
    /// Time until the next wave opens, present only while waiting for one.
    pub next_wave_in: Option<Duration>,
    /// Terminal result, once reached.
    pub outcome: Option<Outcome>,
}

impl SessionSnapshot {
    /// Reports whether the session reached a terminal state.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

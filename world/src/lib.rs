#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Castle Defence.

mod grid;
mod pool;

use std::time::Duration;

use castle_defence_core::{
    CellCoord, Command, Event, Outcome, Rules, UnitId, WaveNumber, WELCOME_BANNER,
};
use glam::Vec2;
use rand::Rng;
use tracing::{debug, info, warn};

pub use grid::{Grid, SetupError};
pub use pool::{Unit, UnitPool, UnitSeed};

/// Represents the authoritative Castle Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    rules: Rules,
    grid: Grid,
    pool: UnitPool,
    structure_health: i32,
    score: u32,
    wave: WaveNumber,
    alive: u32,
    wave_in_progress: bool,
    outcome: Option<Outcome>,
    tick_index: u64,
}

impl World {
    /// Creates a new world, generating its grid from the provided random source.
    pub fn new<R>(rules: Rules, rng: &mut R) -> Result<Self, SetupError>
    where
        R: Rng + ?Sized,
    {
        let grid = Grid::generate(&rules, rng)?;
        Ok(Self::with_grid(rules, grid))
    }

    /// Creates a new world around an existing grid.
    #[must_use]
    pub fn with_grid(rules: Rules, grid: Grid) -> Self {
        Self {
            banner: WELCOME_BANNER,
            pool: UnitPool::with_capacity(rules.pool_capacity),
            structure_health: rules.structure_health,
            score: 0,
            wave: WaveNumber::default(),
            alive: 0,
            wave_in_progress: false,
            outcome: None,
            tick_index: 0,
            grid,
            rules,
        }
    }

    fn resolve_click(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        if !self.grid.view().contains(position) {
            return;
        }

        let radius = self.rules.hit_radius;
        let Some(unit) = self
            .pool
            .iter_active()
            .find(|(_, unit)| unit.position().distance(position) <= radius)
            .map(|(id, _)| id)
        else {
            return;
        };

        if let Some(eliminated) = self.pool.eliminate(unit) {
            self.alive = self.alive.saturating_sub(1);
            self.score = self.score.saturating_add(eliminated.worth());
            out_events.push(Event::UnitEliminated {
                unit,
                worth: eliminated.worth(),
            });
        }
    }

    fn begin_wave(&mut self, wave: WaveNumber, units: u32, out_events: &mut Vec<Event>) {
        if self.wave_in_progress || wave <= self.wave || wave > self.rules.final_wave {
            return;
        }

        self.wave = wave;
        self.alive = units;
        self.wave_in_progress = true;
        debug!(wave = wave.get(), units, "wave started");
        out_events.push(Event::WaveStarted { wave, units });
    }

    fn spawn_unit(&mut self, wave: WaveNumber, row: u32, out_events: &mut Vec<Event>) {
        if !self.wave_in_progress {
            return;
        }

        let view = self.grid.view();
        let cell = CellCoord::new(0, row);
        let position = view.cell_center(cell);
        let spawned = view.cell_at(position).and_then(|target| {
            self.pool.spawn(UnitSeed {
                position,
                target,
                speed: self.rules.unit_speed(wave),
                health: self.rules.unit_health,
                worth: self.rules.unit_worth,
            })
        });

        match spawned {
            Some(unit) => out_events.push(Event::UnitSpawned { unit, cell }),
            None => {
                self.alive = self.alive.saturating_sub(1);
                warn!(
                    wave = wave.get(),
                    row,
                    capacity = self.pool.capacity(),
                    "spawn dropped"
                );
                out_events.push(Event::SpawnDropped { wave });
            }
        }
    }

    fn end_wave(&mut self, wave: WaveNumber, out_events: &mut Vec<Event>) {
        if !self.wave_in_progress || self.alive != 0 || wave != self.wave {
            return;
        }

        self.wave_in_progress = false;
        debug!(wave = wave.get(), score = self.score, "wave cleared");
        out_events.push(Event::WaveCleared { wave });
    }

    fn retarget_unit(&mut self, unit: UnitId, target: CellCoord, out_events: &mut Vec<Event>) {
        let view = self.grid.view();
        let Some(slot) = self.pool.get_mut(unit) else {
            return;
        };

        let current = view.cell_at(slot.position());
        let legal = view.is_walkable(target) || view.is_goal(target) || current == Some(target);
        if !legal {
            return;
        }

        let from = slot.target();
        slot.retarget(target);
        if from != target {
            out_events.push(Event::UnitRetargeted {
                unit,
                from,
                to: target,
            });
        }
    }

    fn advance_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let view = self.grid.view();
        let elapsed = dt.as_secs_f32();

        for (_, unit) in self.pool.iter_active_mut() {
            let center = view.cell_center(unit.target());
            let offset = center - unit.position();
            let Some(direction) = offset.try_normalize() else {
                continue;
            };

            let travel = unit.speed() * elapsed;
            if travel >= offset.length() {
                unit.relocate(center);
            } else {
                unit.relocate(unit.position() + direction * travel);
            }
        }

        let Some(goal_edge) = view.goal_edge() else {
            return;
        };

        let breached: Vec<UnitId> = self
            .pool
            .iter_active()
            .filter(|(_, unit)| unit.position().x >= goal_edge)
            .map(|(id, _)| id)
            .collect();

        for unit in breached {
            if self.pool.eliminate(unit).is_none() {
                continue;
            }
            self.structure_health -= 1;
            self.alive = self.alive.saturating_sub(1);
            debug!(
                unit = unit.get(),
                structure_health = self.structure_health,
                "unit breached"
            );
            out_events.push(Event::UnitBreached {
                unit,
                structure_health: self.structure_health,
            });
        }
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        let outcome = if self.structure_health <= 0 {
            Outcome::Defeat
        } else if self.wave >= self.rules.final_wave && self.alive == 0 && !self.wave_in_progress
        {
            Outcome::Victory { score: self.score }
        } else {
            return;
        };

        self.outcome = Some(outcome);
        info!(?outcome, score = self.score, "session ended");
        out_events.push(Event::SessionEnded { outcome });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session reached a terminal outcome every command is ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.outcome.is_some() {
        return;
    }

    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::Click { position } => world.resolve_click(position, out_events),
        Command::BeginWave { wave, units } => world.begin_wave(wave, units, out_events),
        Command::SpawnUnit { wave, row } => world.spawn_unit(wave, row, out_events),
        Command::EndWave { wave } => world.end_wave(wave, out_events),
        Command::RetargetUnit { unit, target } => world.retarget_unit(unit, target, out_events),
        Command::AdvanceUnits { dt } => world.advance_units(dt, out_events),
    }

    world.evaluate_outcome(out_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Unit, World};
    use castle_defence_core::{
        GridView, Outcome, Rules, SessionSnapshot, UnitId, UnitSnapshot, UnitView, WaveStatus,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Rules the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Provides a read-only view of the grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Live unit hosted by the provided slot.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.pool.get(id)
    }

    /// Captures a read-only view of the active units.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let radius = world.rules.hit_radius;
        UnitView::from_snapshots(
            world
                .pool
                .iter_active()
                .map(|(id, unit)| UnitSnapshot {
                    id,
                    position: unit.position(),
                    target: unit.target(),
                    speed: unit.speed(),
                    health: unit.health(),
                    worth: unit.worth(),
                    radius,
                })
                .collect(),
        )
    }

    /// Wave bookkeeping consumed by the wave scheduler.
    #[must_use]
    pub fn wave_status(world: &World) -> WaveStatus {
        WaveStatus {
            wave: world.wave,
            alive: world.alive,
            in_progress: world.wave_in_progress,
        }
    }

    /// Terminal result, once reached.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Number of simulation ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Aggregate session state without the scheduler-owned countdown.
    #[must_use]
    pub fn session_snapshot(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            structure_health: world.structure_health,
            max_structure_health: world.rules.structure_health,
            wave: world.wave,
            final_wave: world.rules.final_wave,
            score: world.score,
            alive: world.alive,
            next_wave_in: None,
            outcome: world.outcome,
        }
    }
}

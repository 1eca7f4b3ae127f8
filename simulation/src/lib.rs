#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame update loop that sequences the world and its systems.
//!
//! A [`Session`] owns the authoritative world, the wave scheduler, the
//! movement system and the random source they share. Every call to
//! [`Session::tick`] runs the same fixed pipeline: resolve the click, advance
//! the clock and the wave scheduler, re-plan waypoints, move units and resolve
//! breaches, then give the scheduler a chance to close the wave. Once the world
//! reports a terminal outcome, ticks become no-ops until [`Session::restart`].

use std::time::Duration;

use castle_defence_core::{
    Command, Event, GridView, Outcome, Rules, SessionSnapshot, UnitView,
};
use castle_defence_system_movement::Movement;
use castle_defence_system_spawning::{Config, Spawning};
use castle_defence_world::{self as world, query, Grid, SetupError, World};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// A single game session: world, systems and random source.
#[derive(Debug)]
pub struct Session<R = ChaCha8Rng> {
    rules: Rules,
    layout: Option<Grid>,
    world: World,
    spawning: Spawning,
    movement: Movement,
    rng: R,
}

impl Session<ChaCha8Rng> {
    /// Creates a session whose grid and decisions derive from `seed`.
    pub fn seeded(rules: Rules, seed: u64) -> Result<Self, SetupError> {
        debug!(seed, "seeding session");
        Self::with_rng(rules, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R> Session<R>
where
    R: Rng,
{
    /// Creates a session that draws its grid and decisions from `rng`.
    pub fn with_rng(rules: Rules, mut rng: R) -> Result<Self, SetupError> {
        let world = World::new(rules.clone(), &mut rng)?;
        Ok(Self::assemble(rules, None, world, rng))
    }

    /// Creates a session on a fixed grid; restarts reuse the same grid.
    #[must_use]
    pub fn with_grid(rules: Rules, grid: Grid, rng: R) -> Self {
        let world = World::with_grid(rules.clone(), grid.clone());
        Self::assemble(rules, Some(grid), world, rng)
    }

    fn assemble(rules: Rules, layout: Option<Grid>, world: World, rng: R) -> Self {
        Self {
            spawning: Spawning::new(Config::from_rules(&rules)),
            movement: Movement::new(rules.retarget_threshold),
            rules,
            layout,
            world,
            rng,
        }
    }

    /// Advances the session by `dt`, resolving an optional click first.
    ///
    /// Returns every event the world emitted during the tick, in order. A
    /// session that already reached a terminal outcome returns no events and
    /// changes nothing.
    pub fn tick(&mut self, dt: Duration, click: Option<Vec2>) -> Vec<Event> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }

        if let Some(position) = click {
            self.execute(Command::Click { position }, &mut events);
        }

        let mut clock = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut clock);
        let mut commands = Vec::new();
        self.spawning.handle(
            &clock,
            query::wave_status(&self.world),
            &mut self.rng,
            &mut commands,
        );
        events.append(&mut clock);
        self.execute_all(&mut commands, &mut events);

        self.movement.handle(
            &query::unit_view(&self.world),
            query::grid_view(&self.world),
            &mut self.rng,
            &mut commands,
        );
        self.execute_all(&mut commands, &mut events);
        self.execute(Command::AdvanceUnits { dt }, &mut events);

        if !self.is_over() {
            self.spawning
                .settle(query::wave_status(&self.world), &mut commands);
            self.execute_all(&mut commands, &mut events);
        }

        events
    }

    /// Discards all progress and starts over with a fresh world.
    ///
    /// Sessions created with [`Session::with_grid`] keep their grid; all others
    /// generate a new one from the session's random source.
    pub fn restart(&mut self) -> Result<(), SetupError> {
        self.world = match &self.layout {
            Some(grid) => World::with_grid(self.rules.clone(), grid.clone()),
            None => World::new(self.rules.clone(), &mut self.rng)?,
        };
        self.spawning = Spawning::new(Config::from_rules(&self.rules));
        info!("session restarted");
        Ok(())
    }

    /// Aggregate state for presentation, including the wave countdown.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = query::session_snapshot(&self.world);
        snapshot.next_wave_in = self
            .spawning
            .next_wave_in(query::wave_status(&self.world));
        snapshot
    }

    /// Read-only view of the grid.
    #[must_use]
    pub fn grid(&self) -> GridView<'_> {
        query::grid_view(&self.world)
    }

    /// Read-only view of the active units.
    #[must_use]
    pub fn units(&self) -> UnitView {
        query::unit_view(&self.world)
    }

    /// Terminal result, once reached.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        query::outcome(&self.world)
    }

    /// Reports whether the session reached a terminal state.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Rules the session runs with.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Authoritative world backing the session.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn execute(&mut self, command: Command, events: &mut Vec<Event>) {
        world::apply(&mut self.world, command, events);
    }

    fn execute_all(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }
}

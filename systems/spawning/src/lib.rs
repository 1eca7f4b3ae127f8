#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler responsible for opening waves and releasing their units.

use std::time::Duration;

use castle_defence_core::{Command, Event, Rules, WaveNumber, WaveStatus};
use rand::Rng;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    intermission: Duration,
    units_per_wave: u32,
    final_wave: WaveNumber,
    rows: u32,
}

impl Config {
    /// Creates a new configuration from explicit cadence and wave parameters.
    #[must_use]
    pub const fn new(
        spawn_interval: Duration,
        intermission: Duration,
        units_per_wave: u32,
        final_wave: WaveNumber,
        rows: u32,
    ) -> Self {
        Self {
            spawn_interval,
            intermission,
            units_per_wave,
            final_wave,
            rows,
        }
    }

    /// Derives the scheduler configuration from session rules.
    #[must_use]
    pub fn from_rules(rules: &Rules) -> Self {
        Self::new(
            rules.spawn_interval,
            rules.intermission,
            rules.units_per_wave,
            rules.final_wave,
            rules.rows,
        )
    }
}

/// Scheduler state between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the next wave.
    Idle {
        /// Time left before the next wave opens.
        countdown: Duration,
    },
    /// Releasing units for the current wave.
    Spawning {
        /// Time accrued toward the next release.
        accumulator: Duration,
    },
}

/// Pure system that paces waves and emits spawn commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    phase: Phase,
    pending: u32,
}

impl Spawning {
    /// Creates a new scheduler waiting out the first intermission.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            phase: Phase::Idle {
                countdown: config.intermission,
            },
            pending: 0,
            config,
        }
    }

    /// Current scheduler phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Units of the current wave that have not been released yet.
    #[must_use]
    pub const fn pending(&self) -> u32 {
        self.pending
    }

    /// Countdown to the next wave, present only while one is still to come.
    #[must_use]
    pub fn next_wave_in(&self, status: WaveStatus) -> Option<Duration> {
        match self.phase {
            Phase::Idle { countdown } if status.wave < self.config.final_wave => Some(countdown),
            _ => None,
        }
    }

    /// Consumes events and the world's wave status to emit wave commands.
    ///
    /// Elapsed time is gathered from `Event::TimeAdvanced`. While idle the
    /// countdown runs and, once it expires below the final wave, a
    /// `Command::BeginWave` opens the next wave. While spawning one
    /// `Command::SpawnUnit` is emitted per full cadence interval until the
    /// wave's units are exhausted. The wave closes once nothing is pending and
    /// the world reports no live units.
    pub fn handle<R>(
        &mut self,
        events: &[Event],
        status: WaveStatus,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        match self.phase {
            Phase::Idle { countdown } => {
                if status.wave >= self.config.final_wave {
                    return;
                }

                let countdown = countdown.saturating_sub(elapsed);
                if !countdown.is_zero() {
                    self.phase = Phase::Idle { countdown };
                    return;
                }

                let wave = status.wave.next();
                let units = wave.get().saturating_mul(self.config.units_per_wave);
                out.push(Command::BeginWave { wave, units });
                self.pending = units;
                self.phase = Phase::Spawning {
                    accumulator: Duration::ZERO,
                };

                if units == 0 {
                    self.close(wave, out);
                }
            }
            Phase::Spawning { accumulator } => {
                let mut accumulator = accumulator.saturating_add(elapsed);
                let attempts = self.resolve_spawn_attempts(&mut accumulator);
                self.phase = Phase::Spawning { accumulator };

                for _ in 0..attempts {
                    let row = rng.gen_range(0..self.config.rows.max(1));
                    out.push(Command::SpawnUnit {
                        wave: status.wave,
                        row,
                    });
                }

                self.settle(status, out);
            }
        }
    }

    /// Closes the current wave if every unit was released and resolved.
    pub fn settle(&mut self, status: WaveStatus, out: &mut Vec<Command>) {
        if matches!(self.phase, Phase::Spawning { .. }) && self.pending == 0 && status.alive == 0
        {
            self.close(status.wave, out);
        }
    }

    fn close(&mut self, wave: WaveNumber, out: &mut Vec<Command>) {
        out.push(Command::EndWave { wave });
        self.phase = Phase::Idle {
            countdown: self.config.intermission,
        };
    }

    fn resolve_spawn_attempts(&mut self, accumulator: &mut Duration) -> u32 {
        if self.config.spawn_interval.is_zero() {
            let attempts = self.pending;
            self.pending = 0;
            return attempts;
        }

        let mut attempts = 0;
        while self.pending > 0 && *accumulator >= self.config.spawn_interval {
            *accumulator -= self.config.spawn_interval;
            self.pending -= 1;
            attempts += 1;
        }
        attempts
    }
}

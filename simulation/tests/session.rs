use std::time::Duration;

use castle_defence_core::{CellKind, Event, Outcome, Rules, UnitId, WaveNumber};
use castle_defence_simulation::Session;
use castle_defence_world::Grid;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_millis(16);

fn open_grid(rules: &Rules) -> Grid {
    let columns = rules.columns as usize;
    let mut cells = vec![CellKind::Empty; columns * rules.rows as usize];
    for row in 0..rules.rows as usize {
        cells[row * columns + columns - 1] = CellKind::Goal;
    }
    Grid::from_cells(rules.columns, rules.rows, rules.cell_length, cells).expect("valid layout")
}

fn open_session(rules: Rules, seed: u64) -> Session {
    let grid = open_grid(&rules);
    Session::with_grid(rules, grid, ChaCha8Rng::seed_from_u64(seed))
}

/// Ticks the session, clicking the lowest-slot unit whenever one is active.
fn tick_clicking(session: &mut Session) -> Vec<Event> {
    let click = session.units().iter().next().map(|unit| unit.position);
    session.tick(FRAME, click)
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn clicking_out_first_wave_scores_thirty_and_rearms_countdown() {
    let mut session = Session::seeded(Rules::default(), 11).expect("reference rules");
    let mut log = Vec::new();

    while session.snapshot().wave != WaveNumber::new(1) {
        log.extend(session.tick(FRAME, None));
    }

    loop {
        for unit in session.units().iter() {
            assert!((unit.speed - 60.0).abs() < f32::EPSILON);
        }
        let events = tick_clicking(&mut session);
        let cleared = events.contains(&Event::WaveCleared {
            wave: WaveNumber::new(1),
        });
        log.extend(events);
        if cleared {
            break;
        }
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.score, 30);
    assert_eq!(snapshot.structure_health, 10);
    assert_eq!(snapshot.alive, 0);
    assert_eq!(snapshot.next_wave_in, Some(Duration::from_secs(3)));
    assert_eq!(
        count(&log, |event| matches!(event, Event::UnitSpawned { .. })),
        3
    );
    assert_eq!(
        count(&log, |event| matches!(event, Event::UnitEliminated { worth: 10, .. })),
        3
    );
    assert_eq!(
        count(&log, |event| matches!(event, Event::UnitBreached { .. })),
        0
    );
}

#[test]
fn unclicked_units_breach_one_health_each() {
    let mut session = open_session(Rules::default(), 5);
    let mut health = session.snapshot().structure_health;

    loop {
        let events = session.tick(FRAME, None);
        for event in &events {
            if let Event::UnitBreached {
                structure_health, ..
            } = event
            {
                assert_eq!(*structure_health, health - 1);
                health = *structure_health;
            }
        }
        if events.contains(&Event::WaveCleared {
            wave: WaveNumber::new(1),
        }) {
            break;
        }
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.structure_health, 7);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.alive, 0);
    assert!(session.units().is_empty());
}

#[test]
fn ticks_after_defeat_change_nothing() {
    let rules = Rules {
        structure_health: 1,
        ..Rules::default()
    };
    let mut session = open_session(rules, 8);

    let mut ended = None;
    for _ in 0..100_000 {
        for event in session.tick(FRAME, None) {
            if let Event::SessionEnded { outcome } = event {
                ended = Some(outcome);
            }
        }
        if session.is_over() {
            break;
        }
    }
    assert_eq!(ended, Some(Outcome::Defeat));

    let snapshot = session.snapshot();
    let units = session.units().into_vec();
    for _ in 0..10 {
        let center = Vec2::new(50.0, 50.0);
        assert!(session.tick(Duration::from_secs(1), Some(center)).is_empty());
    }
    assert_eq!(session.snapshot(), snapshot);
    assert_eq!(session.units().into_vec(), units);
}

#[test]
fn clearing_every_wave_wins_with_full_score() {
    let mut session = Session::seeded(Rules::default(), 21).expect("reference rules");
    let mut log = Vec::new();

    for _ in 0..200_000 {
        log.extend(tick_clicking(&mut session));
        if session.is_over() {
            break;
        }
    }

    assert_eq!(session.outcome(), Some(Outcome::Victory { score: 450 }));
    assert_eq!(
        count(&log, |event| matches!(event, Event::WaveStarted { .. })),
        5
    );
    assert_eq!(
        count(&log, |event| matches!(event, Event::SessionEnded { .. })),
        1
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.wave, WaveNumber::new(5));
    assert_eq!(snapshot.next_wave_in, None);
    assert!(session.tick(FRAME, None).is_empty());
    assert_eq!(session.snapshot(), snapshot);
}

#[test]
fn exhausted_pool_drops_spawns_without_stalling_the_wave() {
    let rules = Rules {
        pool_capacity: 1,
        ..Rules::default()
    };
    let mut session = open_session(rules, 13);
    let mut log = Vec::new();

    loop {
        let events = session.tick(FRAME, None);
        let cleared = events.contains(&Event::WaveCleared {
            wave: WaveNumber::new(1),
        });
        log.extend(events);
        if cleared {
            break;
        }
    }

    assert_eq!(
        count(&log, |event| matches!(event, Event::SpawnDropped { .. })),
        2
    );
    assert_eq!(
        log.iter()
            .filter_map(|event| match event {
                Event::UnitSpawned { unit, .. } => Some(*unit),
                _ => None,
            })
            .collect::<Vec<_>>(),
        vec![UnitId::new(0)]
    );
    assert_eq!(session.snapshot().structure_health, 9);
}

#[test]
fn large_frame_deltas_still_reach_the_goal() {
    let mut session = open_session(Rules::default(), 17);

    for _ in 0..200 {
        let _ = session.tick(Duration::from_secs(1), None);
        for unit in session.units().iter() {
            assert!(unit.position.is_finite());
            assert!(unit.position.x < 650.0 + f32::EPSILON);
        }
        if session.snapshot().wave > WaveNumber::new(1) {
            break;
        }
    }

    let snapshot = session.snapshot();
    assert!(snapshot.wave > WaveNumber::new(1));
    assert!(snapshot.structure_health <= 7);
}

#[test]
fn restart_resets_progress() {
    let rules = Rules {
        structure_health: 1,
        ..Rules::default()
    };
    let mut session = open_session(rules, 2);
    while !session.is_over() {
        let _ = session.tick(Duration::from_millis(100), None);
    }

    session.restart().expect("fixed grid restarts");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.structure_health, 1);
    assert_eq!(snapshot.wave, WaveNumber::default());
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.next_wave_in, Some(Duration::from_secs(3)));
    assert!(snapshot.outcome.is_none());
    assert!(!session.tick(FRAME, None).is_empty());
}

#[test]
fn same_seed_replays_identically() {
    let first = replay(0x5eed);
    let second = replay(0x5eed);

    assert_eq!(first, second, "replay diverged between runs");
}

fn replay(seed: u64) -> Vec<Event> {
    let mut session = Session::seeded(Rules::default(), seed).expect("reference rules");
    let mut log = Vec::new();
    for frame in 0..3_000 {
        let click = if frame % 45 == 0 {
            session.units().iter().last().map(|unit| unit.position)
        } else {
            None
        };
        log.extend(session.tick(FRAME, click));
    }
    log
}

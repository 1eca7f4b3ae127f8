#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy movement system that picks the next waypoint for each unit.
//!
//! Units advance east toward the goal column. The policy is a fixed local
//! priority rather than a search: straight ahead, then sideways, then
//! diagonally ahead, otherwise stay put. Waypoints are only re-planned when a
//! unit arrives near its current waypoint or the waypoint stopped being a
//! legal destination, so motion between waypoints stays a straight line.

use castle_defence_core::{CellCoord, Command, GridView, UnitSnapshot, UnitView};
use rand::Rng;

/// Pure system that emits retarget commands for units that reached their waypoint.
#[derive(Debug)]
pub struct Movement {
    retarget_threshold: f32,
}

impl Movement {
    /// Creates a movement system that re-plans within `retarget_threshold`
    /// world units of a waypoint's centre.
    #[must_use]
    pub const fn new(retarget_threshold: f32) -> Self {
        Self { retarget_threshold }
    }

    /// Consumes the unit view and grid to emit `Command::RetargetUnit` entries.
    ///
    /// Units are visited in slot order so the random source is consumed
    /// deterministically.
    pub fn handle<R>(
        &self,
        unit_view: &UnitView,
        grid: GridView<'_>,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        for unit in unit_view.iter() {
            if !self.needs_retarget(unit, &grid) {
                continue;
            }

            let Some(current) = grid.cell_at(unit.position) else {
                continue;
            };

            let target = next_cell(&grid, current, rng);
            if target != unit.target {
                out.push(Command::RetargetUnit {
                    unit: unit.id,
                    target,
                });
            }
        }
    }

    fn needs_retarget(&self, unit: &UnitSnapshot, grid: &GridView<'_>) -> bool {
        let center = grid.cell_center(unit.target);
        if unit.position.distance(center) < self.retarget_threshold {
            return true;
        }

        !(grid.is_walkable(unit.target) || grid.is_goal(unit.target))
    }
}

/// Chooses the waypoint that follows `current`.
///
/// 1. The cell ahead, when it is walkable or belongs to the goal.
/// 2. The cells above and below; a coin flip decides when both are open.
/// 3. The diagonal ahead-above, then ahead-below.
/// 4. `current` itself when everything is blocked.
pub fn next_cell<R>(grid: &GridView<'_>, current: CellCoord, rng: &mut R) -> CellCoord
where
    R: Rng + ?Sized,
{
    if let Some(ahead) = current.offset(1, 0) {
        if grid.is_walkable(ahead) || grid.is_goal(ahead) {
            return ahead;
        }
    }

    let open = |cell: &CellCoord| grid.is_walkable(*cell);
    let above = current.offset(0, -1).filter(open);
    let below = current.offset(0, 1).filter(open);

    match (above, below) {
        (Some(above), Some(below)) => {
            return if rng.gen_bool(0.5) { above } else { below };
        }
        (Some(cell), None) | (None, Some(cell)) => return cell,
        (None, None) => {}
    }

    [current.offset(1, -1), current.offset(1, 1)]
        .into_iter()
        .flatten()
        .find(open)
        .unwrap_or(current)
}

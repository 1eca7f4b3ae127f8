//! Static grid model owned by the world.

use castle_defence_core::{CellCoord, CellKind, GridView, Rules};
use rand::Rng;
use thiserror::Error;

/// Reasons a grid cannot be constructed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// The grid needs at least one column and one row.
    #[error("grid must have at least one column and one row (received {columns}x{rows})")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Cells must have a positive, finite side length.
    #[error("cell length must be positive and finite")]
    InvalidCellLength,
    /// More obstacles were requested than the placement region can hold.
    #[error("{requested} obstacles do not fit into {available} placeable cells")]
    InsufficientObstacleSpace {
        /// Obstacles requested by the rules.
        requested: u32,
        /// Cells available outside the goal clearance.
        available: u32,
    },
    /// Rejection sampling hit its attempt cap before placing every obstacle.
    #[error("obstacle placement gave up after {attempts} attempts ({placed} of {requested} placed)")]
    ObstaclePlacementExhausted {
        /// Draws performed before giving up.
        attempts: u32,
        /// Obstacles placed before giving up.
        placed: u32,
        /// Obstacles requested by the rules.
        requested: u32,
    },
    /// An explicit layout did not match the declared dimensions.
    #[error("layout holds {actual} cells but {expected} were declared")]
    LayoutSizeMismatch {
        /// Cells implied by the dimensions.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },
    /// An explicit layout's last column is not entirely goal.
    #[error("column {column} must consist of goal cells only")]
    MissingGoalColumn {
        /// Column expected to hold the goal.
        column: u32,
    },
}

/// Immutable cell map: one goal column on the right, obstacles elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cell_length: f32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Generates a grid for the provided rules.
    ///
    /// The last column becomes the goal. Obstacles are scattered by rejection
    /// sampling over the columns left of the goal clearance; the draw count is
    /// capped by [`Rules::max_placement_attempts`] so an unlucky or
    /// unsatisfiable configuration reports an error instead of spinning.
    pub fn generate<R>(rules: &Rules, rng: &mut R) -> Result<Self, SetupError>
    where
        R: Rng + ?Sized,
    {
        let mut grid = Self::empty(rules.columns, rules.rows, rules.cell_length)?;

        let requested = rules.obstacle_count;
        if requested == 0 {
            return Ok(grid);
        }

        let placeable_columns = rules.columns.saturating_sub(rules.goal_clearance.max(1));
        let available = placeable_columns.saturating_mul(rules.rows);
        if requested > available {
            return Err(SetupError::InsufficientObstacleSpace {
                requested,
                available,
            });
        }

        let mut placed = 0;
        let mut attempts = 0;
        while placed < requested {
            if attempts >= rules.max_placement_attempts {
                return Err(SetupError::ObstaclePlacementExhausted {
                    attempts,
                    placed,
                    requested,
                });
            }
            attempts += 1;

            let column = rng.gen_range(0..placeable_columns);
            let row = rng.gen_range(0..rules.rows);
            let Some(index) = grid.index(CellCoord::new(column, row)) else {
                continue;
            };
            if grid.cells[index] == CellKind::Empty {
                grid.cells[index] = CellKind::Obstacle;
                placed += 1;
            }
        }

        Ok(grid)
    }

    /// Builds a grid from an explicit row-major layout.
    ///
    /// The layout must cover `columns * rows` cells and its last column must be
    /// entirely goal.
    pub fn from_cells(
        columns: u32,
        rows: u32,
        cell_length: f32,
        cells: Vec<CellKind>,
    ) -> Result<Self, SetupError> {
        let mut grid = Self::empty(columns, rows, cell_length)?;
        if cells.len() != grid.cells.len() {
            return Err(SetupError::LayoutSizeMismatch {
                expected: grid.cells.len(),
                actual: cells.len(),
            });
        }
        grid.cells = cells;

        let goal_column = columns - 1;
        let complete = (0..rows).all(|row| {
            grid.view().kind(CellCoord::new(goal_column, row)) == Some(CellKind::Goal)
        });
        if !complete {
            return Err(SetupError::MissingGoalColumn {
                column: goal_column,
            });
        }

        Ok(grid)
    }

    fn empty(columns: u32, rows: u32, cell_length: f32) -> Result<Self, SetupError> {
        if columns == 0 || rows == 0 {
            return Err(SetupError::InvalidDimensions { columns, rows });
        }
        if !(cell_length.is_finite() && cell_length > 0.0) {
            return Err(SetupError::InvalidCellLength);
        }

        let count = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| SetupError::InvalidDimensions { columns, rows })?;
        let mut grid = Self {
            columns,
            rows,
            cell_length,
            cells: vec![CellKind::Empty; count],
        };

        for row in 0..rows {
            if let Some(index) = grid.index(CellCoord::new(columns - 1, row)) {
                grid.cells[index] = CellKind::Goal;
            }
        }

        Ok(grid)
    }

    /// Borrows a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows, self.cell_length)
    }

    /// Number of obstacle cells on the grid.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|kind| **kind == CellKind::Obstacle)
            .count()
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generate_marks_last_column_as_goal() {
        let rules = Rules::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let grid = Grid::generate(&rules, &mut rng).expect("reference rules generate");
        let view = grid.view();

        for (cell, kind) in view.iter() {
            let in_goal_column = cell.column() == rules.columns - 1;
            assert_eq!(kind == CellKind::Goal, in_goal_column, "cell {cell:?}");
        }
    }

    #[test]
    fn generate_places_requested_obstacles_outside_clearance() {
        let rules = Rules::default();
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let grid = Grid::generate(&rules, &mut rng).expect("reference rules generate");

            assert_eq!(grid.obstacle_count(), rules.obstacle_count as usize);
            for (cell, kind) in grid.view().iter() {
                if kind == CellKind::Obstacle {
                    assert!(cell.column() < rules.columns - rules.goal_clearance);
                }
            }
        }
    }

    #[test]
    fn generate_rejects_unsatisfiable_obstacle_count() {
        let rules = Rules {
            obstacle_count: 26,
            ..Rules::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(
            Grid::generate(&rules, &mut rng),
            Err(SetupError::InsufficientObstacleSpace {
                requested: 26,
                available: 25,
            })
        );
    }

    #[test]
    fn generate_stops_after_attempt_cap() {
        let rules = Rules {
            obstacle_count: 25,
            max_placement_attempts: 3,
            ..Rules::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let error = Grid::generate(&rules, &mut rng).expect_err("cap must trip");
        assert!(matches!(
            error,
            SetupError::ObstaclePlacementExhausted {
                attempts: 3,
                requested: 25,
                ..
            }
        ));
    }

    #[test]
    fn generate_fills_region_exactly_when_it_fits() {
        let rules = Rules {
            obstacle_count: 25,
            ..Rules::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let grid = Grid::generate(&rules, &mut rng).expect("region fits exactly");

        assert_eq!(grid.obstacle_count(), 25);
    }

    #[test]
    fn from_cells_requires_goal_column() {
        let cells = vec![CellKind::Empty; 6];
        assert_eq!(
            Grid::from_cells(3, 2, 10.0, cells),
            Err(SetupError::MissingGoalColumn { column: 2 })
        );
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        assert_eq!(
            Grid::from_cells(3, 2, 10.0, vec![CellKind::Goal; 5]),
            Err(SetupError::LayoutSizeMismatch {
                expected: 6,
                actual: 5,
            })
        );
    }

    #[test]
    fn empty_dimensions_are_rejected() {
        let rules = Rules {
            columns: 0,
            ..Rules::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            Grid::generate(&rules, &mut rng),
            Err(SetupError::InvalidDimensions {
                columns: 0,
                rows: 5,
            })
        );
    }
}

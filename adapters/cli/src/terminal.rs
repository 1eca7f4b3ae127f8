//! Headless rendering backend that drives frames at a fixed delta and reports
//! the final scene as text.

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use castle_defence_core::CellKind;
use castle_defence_rendering::{FrameInput, Presentation, RenderingBackend, Scene};
use glam::Vec2;
use tracing::debug;

/// Backend that simulates frames without a window.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TerminalBackend {
    frame: Duration,
    frame_budget: u64,
    click_every: Option<u32>,
    print_grid: bool,
}

impl TerminalBackend {
    pub(crate) const fn new(
        frame: Duration,
        frame_budget: u64,
        click_every: Option<u32>,
        print_grid: bool,
    ) -> Self {
        Self {
            frame,
            frame_budget,
            click_every,
            print_grid,
        }
    }

    /// Clicks the lowest-slot unit on every `click_every`-th frame.
    fn input_for(&self, frame: u64, scene: &Scene) -> FrameInput {
        let click = match self.click_every {
            Some(every) if every > 0 && frame % u64::from(every) == 0 => {
                scene.units.first().map(|unit| unit.position)
            }
            _ => None,
        };
        FrameInput { click }
    }
}

impl RenderingBackend for TerminalBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;
        let mut scene = scene;
        debug!(
            title = %window_title,
            ?clear_color,
            width = scene.total_width(),
            height = scene.grid.height(),
            "terminal backend started"
        );

        let mut frame = 0;
        while frame < self.frame_budget && scene.hud.outcome.is_none() {
            let input = self.input_for(frame, &scene);
            update_scene(self.frame, input, &mut scene);
            frame += 1;
        }
        debug!(frames = frame, "terminal backend stopped");

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{window_title}").context("failed to write report")?;
        for line in report(&scene, self.print_grid) {
            writeln!(stdout, "{line}").context("failed to write report")?;
        }
        Ok(())
    }
}

fn report(scene: &Scene, print_grid: bool) -> Vec<String> {
    let mut lines = scene.hud.lines();
    if let Some(banner) = scene.hud.banner() {
        lines.push(banner);
    }
    if print_grid {
        lines.extend(ascii_grid(scene));
    }
    lines
}

/// Renders the grid one text row per cell row.
///
/// `G` marks goal cells, `#` obstacles, `o` cells holding at least one unit.
fn ascii_grid(scene: &Scene) -> Vec<String> {
    let grid = &scene.grid;
    let columns = grid.columns as usize;
    let mut rows = vec![vec!['.'; columns]; grid.rows as usize];

    for cell in &grid.cells {
        let glyph = match cell.kind {
            CellKind::Goal => 'G',
            CellKind::Obstacle => '#',
            CellKind::Empty => '.',
        };
        rows[cell.row as usize][cell.column as usize] = glyph;
    }

    for unit in &scene.units {
        if let Some((column, row)) = cell_of(unit.position, scene) {
            rows[row][column] = 'o';
        }
    }

    rows.into_iter().map(String::from_iter).collect()
}

fn cell_of(position: Vec2, scene: &Scene) -> Option<(usize, usize)> {
    let grid = &scene.grid;
    if grid.cell_length <= 0.0 || position.x < 0.0 || position.y < 0.0 {
        return None;
    }
    let column = (position.x / grid.cell_length).floor() as usize;
    let row = (position.y / grid.cell_length).floor() as usize;
    (column < grid.columns as usize && row < grid.rows as usize).then_some((column, row))
}

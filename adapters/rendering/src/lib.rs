#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Castle Defence adapters.

use anyhow::Result as AnyResult;
use castle_defence_core::{
    CellKind, GridView, Outcome, SessionSnapshot, UnitId, UnitView, WaveNumber,
};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Colors and proportions used to turn snapshots into a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Fill of goal cells.
    pub goal: Color,
    /// Fill of obstacle blocks.
    pub obstacle: Color,
    /// Fill of unit discs.
    pub unit: Color,
    /// Outline drawn around every cell.
    pub grid_line: Color,
    /// Background of the status panel.
    pub panel: Color,
    obstacle_scale: f32,
}

impl Palette {
    /// Obstacle blocks cover this share of a cell edge unless overridden.
    pub const DEFAULT_OBSTACLE_SCALE: f32 = 0.8;

    /// Returns a palette whose obstacle blocks cover `scale` of a cell edge.
    ///
    /// Returns an error unless `scale` lies in `(0.0, 1.0]`.
    pub fn with_obstacle_scale(mut self, scale: f32) -> Result<Self, RenderingError> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(RenderingError::InvalidObstacleScale { scale });
        }
        self.obstacle_scale = scale;
        Ok(self)
    }

    /// Share of a cell edge covered by an obstacle block.
    #[must_use]
    pub const fn obstacle_scale(&self) -> f32 {
        self.obstacle_scale
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            goal: Color::from_rgb_u8(230, 41, 55),
            obstacle: Color::from_rgb_u8(127, 106, 79),
            unit: Color::from_rgb_u8(0, 121, 241),
            grid_line: Color::from_rgb_u8(0, 0, 0),
            panel: Color::from_rgb_u8(200, 200, 200),
            obstacle_scale: Self::DEFAULT_OBSTACLE_SCALE,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer position in world units when the primary button fired this frame.
    pub click: Option<Vec2>,
}

/// Filled block drawn inside a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPresentation {
    /// Zero-based column of the cell.
    pub column: u32,
    /// Zero-based row of the cell.
    pub row: u32,
    /// Terrain kind the block represents.
    pub kind: CellKind,
    /// Top-left corner of the block in world units.
    pub origin: Vec2,
    /// Edge length of the block in world units.
    pub size: f32,
    /// Fill color of the block.
    pub color: Color,
}

/// Describes the playfield grid and the blocks drawn on it.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single cell expressed in world units.
    pub cell_length: f32,
    /// Color used when outlining cells.
    pub line_color: Color,
    /// Goal and obstacle blocks; empty cells are omitted.
    pub cells: Vec<CellPresentation>,
}

impl GridPresentation {
    /// Builds the grid description from a read-only grid view.
    #[must_use]
    pub fn from_view(view: GridView<'_>, palette: &Palette) -> Self {
        let (columns, rows) = view.dimensions();
        let cell_length = view.cell_length();
        let cells = view
            .iter()
            .filter_map(|(cell, kind)| {
                let corner = Vec2::new(
                    cell.column() as f32 * cell_length,
                    cell.row() as f32 * cell_length,
                );
                let (size, color) = match kind {
                    CellKind::Empty => return None,
                    CellKind::Goal => (cell_length, palette.goal),
                    CellKind::Obstacle => {
                        (cell_length * palette.obstacle_scale(), palette.obstacle)
                    }
                };
                let inset = (cell_length - size) * 0.5;
                Some(CellPresentation {
                    column: cell.column(),
                    row: cell.row(),
                    kind,
                    origin: corner + Vec2::splat(inset),
                    size,
                    color,
                })
            })
            .collect();

        Self {
            columns,
            rows,
            cell_length,
            line_color: palette.grid_line,
            cells,
        }
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }
}

/// Unit rendered as a filled disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitPresentation {
    /// Identifier of the pool slot backing the unit.
    pub id: UnitId,
    /// Disc center in world units.
    pub position: Vec2,
    /// Disc radius in world units.
    pub radius: f32,
    /// Fill color of the disc.
    pub color: Color,
}

/// Status panel contents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudPresentation {
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
    /// Countdown to the next wave while one is still to come.
    pub next_wave_in: Option<Duration>,
    /// Terminal result, once reached.
    pub outcome: Option<Outcome>,
    /// Background of the panel.
    pub background: Color,
}

impl HudPresentation {
    /// Width of the panel drawn beside the grid, in world units.
    pub const PANEL_WIDTH: f32 = 250.0;

    /// Builds the panel contents from a session snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionSnapshot, palette: &Palette) -> Self {
        Self {
            structure_health: snapshot.structure_health,
            max_structure_health: snapshot.max_structure_health,
            wave: snapshot.wave,
            final_wave: snapshot.final_wave,
            score: snapshot.score,
            next_wave_in: snapshot.next_wave_in,
            outcome: snapshot.outcome,
            background: palette.panel,
        }
    }

    /// Text lines shown in the panel, top to bottom.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            "CASTLE DEFENCE".to_owned(),
            format!("Wave: {}/{}", self.wave.get(), self.final_wave.get()),
            format!(
                "Castle Health: {}/{}",
                self.structure_health, self.max_structure_health
            ),
            format!("Score: {}", self.score),
        ];
        if let Some(countdown) = self.next_wave_in {
            lines.push(format!("Next wave in: {:.1}", countdown.as_secs_f32()));
        }
        lines
    }

    /// Banner announcing the terminal result, if any.
    #[must_use]
    pub fn banner(&self) -> Option<String> {
        self.outcome.map(|outcome| match outcome {
            Outcome::Defeat => "GAME OVER".to_owned(),
            Outcome::Victory { score } => format!("YOU WIN! Final Score: {score}"),
        })
    }
}

/// Scene description combining the grid, units and status panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Playfield grid with its goal and obstacle blocks.
    pub grid: GridPresentation,
    /// Units currently visible on the grid.
    pub units: Vec<UnitPresentation>,
    /// Status panel drawn beside the grid.
    pub hud: HudPresentation,
    palette: Palette,
}

impl Scene {
    /// Builds a scene from the session's read-only views.
    #[must_use]
    pub fn from_snapshots(
        grid: GridView<'_>,
        units: &UnitView,
        snapshot: &SessionSnapshot,
        palette: Palette,
    ) -> Self {
        Self {
            grid: GridPresentation::from_view(grid, &palette),
            units: unit_presentations(units, &palette),
            hud: HudPresentation::from_snapshot(snapshot, &palette),
            palette,
        }
    }

    /// Replaces the dynamic parts of the scene with fresh snapshots.
    ///
    /// The grid is left untouched; call [`Scene::rebuild_grid`] after a restart.
    pub fn refresh(&mut self, units: &UnitView, snapshot: &SessionSnapshot) {
        self.units = unit_presentations(units, &self.palette);
        self.hud = HudPresentation::from_snapshot(snapshot, &self.palette);
    }

    /// Rebuilds the grid blocks from a new grid view.
    pub fn rebuild_grid(&mut self, grid: GridView<'_>) {
        self.grid = GridPresentation::from_view(grid, &self.palette);
    }

    /// Width of the entire scene including the status panel.
    #[must_use]
    pub fn total_width(&self) -> f32 {
        self.grid.width() + HudPresentation::PANEL_WIDTH
    }
}

fn unit_presentations(units: &UnitView, palette: &Palette) -> Vec<UnitPresentation> {
    units
        .iter()
        .map(|unit| UnitPresentation {
            id: unit.id,
            position: unit.position,
            radius: unit.radius,
            color: palette.unit,
        })
        .collect()
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Castle Defence scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered, allowing adapters to animate world snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Obstacle blocks must cover a positive share of at most one cell.
    InvalidObstacleScale {
        /// Provided scale that failed validation.
        scale: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidObstacleScale { scale } => {
                write!(
                    f,
                    "obstacle scale must lie in (0, 1] (received {scale})"
                )
            }
        }
    }
}

impl Error for RenderingError {}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Pattern Loom adapters.
//!
//! Backends implement [`DisplaySurface`] for primitive drawing and
//! [`RenderingBackend`] for the window loop. [`render_scene`] turns a
//! [`Scene`] snapshot into draw calls against any surface, which keeps the
//! screen layout testable without a window.

use anyhow::Result as AnyResult;
use glam::Vec2;
use pattern_loom_core::{
    AnomalyState, CellColor, CellCoord, DisruptionLevel, KeyPress, SessionState, TargetPattern,
    GRID_SIDE,
};
use std::{error::Error, fmt, ops::ControlFlow, time::Duration};

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
    /// Opaque black.
    pub const BLACK: Color = Color::from_rgb_u8(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Color = Color::from_rgb_u8(255, 255, 255);
    /// Opaque red.
    pub const RED: Color = Color::from_rgb_u8(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Color = Color::from_rgb_u8(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Color = Color::from_rgb_u8(0, 0, 255);
    /// Opaque yellow.
    pub const YELLOW: Color = Color::from_rgb_u8(255, 255, 0);
    /// Opaque magenta.
    pub const MAGENTA: Color = Color::from_rgb_u8(255, 0, 255);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

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

    /// Display color for a grid cell, or `None` for an empty cell.
    #[must_use]
    pub const fn for_cell(color: CellColor) -> Option<Self> {
        match color {
            CellColor::Empty => None,
            CellColor::Red => Some(Self::RED),
            CellColor::Green => Some(Self::GREEN),
            CellColor::Blue => Some(Self::BLUE),
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Key presses observed this frame, in the order the adapter polled them.
    ///
    /// Adapters that cannot observe press order within a frame report
    /// simultaneous presses in a fixed key order instead.
    pub key_presses: Vec<KeyPress>,
}

/// Outline stroke applied to a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    /// Stroke color.
    pub color: Color,
    /// Stroke thickness in world units.
    pub thickness: f32,
}

/// Axis-aligned rectangle with an optional fill and an optional outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    /// Top-left corner in world units.
    pub origin: Vec2,
    /// Width and height in world units.
    pub size: Vec2,
    /// Fill color, if the interior should be painted.
    pub fill: Option<Color>,
    /// Outline stroke, if the border should be drawn.
    pub outline: Option<Outline>,
}

impl Rectangle {
    /// Creates a filled rectangle without an outline.
    #[must_use]
    pub const fn filled(origin: Vec2, size: Vec2, color: Color) -> Self {
        Self {
            origin,
            size,
            fill: Some(color),
            outline: None,
        }
    }

    /// Creates an unfilled rectangle outline.
    #[must_use]
    pub const fn outlined(origin: Vec2, size: Vec2, color: Color, thickness: f32) -> Self {
        Self {
            origin,
            size,
            fill: None,
            outline: Some(Outline { color, thickness }),
        }
    }
}

/// Drawing target that accepts primitive shapes and text.
///
/// Every call is fire-and-forget; implementations report nothing back.
pub trait DisplaySurface {
    /// Draws an axis-aligned rectangle.
    fn draw_rectangle(&mut self, rectangle: Rectangle);

    /// Draws a filled circle.
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color);

    /// Draws a straight line segment.
    fn draw_line(&mut self, start: Vec2, end: Vec2, thickness: f32, color: Color);

    /// Draws text whose baseline starts at `position`.
    fn draw_text(&mut self, text: &str, position: Vec2, size: f32, color: Color);
}

/// Screen placement of every element drawn by [`render_scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardLayout {
    /// Top-left corner of the play grid.
    pub grid_origin: Vec2,
    /// Side length of a grid cell.
    pub cell_length: f32,
    /// Side length of the colored square drawn for a painted cell.
    pub thread_length: f32,
    /// Top-left corner of the target preview.
    pub preview_origin: Vec2,
    /// Distance between neighbouring preview squares.
    pub preview_spacing: f32,
    /// Side length of a preview square.
    pub preview_length: f32,
    /// Radius of the circle drawn for an active anomaly.
    pub anomaly_radius: f32,
    /// Top-left corner of the disruption meter.
    pub meter_origin: Vec2,
    /// Size of the meter when disruption is at its maximum.
    pub meter_size: Vec2,
    /// Baseline origin of the outcome banner.
    pub outcome_origin: Vec2,
    /// Font size of the outcome banner.
    pub outcome_font_size: f32,
}

impl BoardLayout {
    /// Thickness of the grid lines.
    pub const GRID_LINE_THICKNESS: f32 = 1.0;

    /// Thickness of the cursor outline.
    pub const CURSOR_THICKNESS: f32 = 2.0;

    /// Grid origin of the standard screen.
    pub const STANDARD_GRID_ORIGIN: Vec2 = Vec2::new(250.0, 150.0);

    /// Cell length of the standard screen.
    pub const STANDARD_CELL_LENGTH: f32 = 50.0;

    /// Target preview origin of the standard screen.
    pub const STANDARD_PREVIEW_ORIGIN: Vec2 = Vec2::new(500.0, 150.0);

    /// Target preview spacing of the standard screen.
    pub const STANDARD_PREVIEW_SPACING: f32 = 30.0;

    /// Creates a layout with the standard element placement around the
    /// provided grid and preview geometry.
    ///
    /// Painted cells keep a margin of a tenth of the cell on every side and
    /// preview squares keep a small gap so neighbours never overlap.
    pub fn new(
        grid_origin: Vec2,
        cell_length: f32,
        preview_origin: Vec2,
        preview_spacing: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if !(cell_length > 0.0) {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }
        if !(preview_spacing > 0.0) {
            return Err(RenderingError::InvalidPreviewSpacing { preview_spacing });
        }

        Ok(Self {
            grid_origin,
            cell_length,
            thread_length: cell_length * 0.8,
            preview_origin,
            preview_spacing,
            preview_length: preview_spacing - 4.0_f32.min(preview_spacing * 0.25),
            anomaly_radius: cell_length * 0.2,
            meter_origin: Vec2::new(300.0, 50.0),
            meter_size: Vec2::new(200.0, 20.0),
            outcome_origin: Vec2::new(300.0, 400.0),
            outcome_font_size: 24.0,
        })
    }

    /// Top-left corner of a grid cell.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        self.grid_origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_length
    }

    /// Center point of a grid cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.cell_length / 2.0)
    }

    /// Side length of the whole grid.
    #[must_use]
    pub fn grid_length(&self) -> f32 {
        self.cell_length * GRID_SIDE as f32
    }

    /// Width of the meter bar for a disruption level.
    #[must_use]
    pub fn meter_width(&self, level: DisruptionLevel) -> f32 {
        self.meter_size.x * level.fraction()
    }
}

/// Drawable occupant of the play grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Colored thread filling a grid cell.
    Thread {
        /// Cell holding the thread.
        cell: CellCoord,
        /// Thread color; empty cells draw nothing.
        color: CellColor,
    },
    /// Anomaly lurking on a grid cell.
    Anomaly {
        /// Cell occupied by the anomaly.
        cell: CellCoord,
        /// Lifecycle state; neutralized anomalies draw nothing.
        state: AnomalyState,
    },
}

impl Entity {
    /// Draws the entity onto the surface using the provided layout.
    pub fn draw<S>(&self, layout: &BoardLayout, surface: &mut S)
    where
        S: DisplaySurface + ?Sized,
    {
        match *self {
            Self::Thread { cell, color } => {
                let Some(fill) = Color::for_cell(color) else {
                    return;
                };
                let margin = (layout.cell_length - layout.thread_length) / 2.0;
                surface.draw_rectangle(Rectangle::filled(
                    layout.cell_origin(cell) + Vec2::splat(margin),
                    Vec2::splat(layout.thread_length),
                    fill,
                ));
            }
            Self::Anomaly { cell, state } => {
                if state.is_active() {
                    surface.draw_circle(
                        layout.cell_center(cell),
                        layout.anomaly_radius,
                        Color::MAGENTA,
                    );
                }
            }
        }
    }
}

/// Snapshot of everything shown on screen for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Threads and anomalies in draw order.
    pub entities: Vec<Entity>,
    /// Pattern shown in the preview area.
    pub target: TargetPattern,
    /// Cell highlighted by the cursor.
    pub cursor: CellCoord,
    /// Level displayed by the meter.
    pub disruption: DisruptionLevel,
    /// Outcome that selects the banner.
    pub state: SessionState,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        entities: Vec<Entity>,
        target: TargetPattern,
        cursor: CellCoord,
        disruption: DisruptionLevel,
        state: SessionState,
    ) -> Self {
        Self {
            entities,
            target,
            cursor,
            disruption,
            state,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Placement of the board elements.
    pub layout: BoardLayout,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, layout: BoardLayout, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            layout,
            scene,
        }
    }
}

/// Text shown when the last evaluation matched.
pub const MATCHED_BANNER: &str = "Pattern Matched!";

/// Text shown when disruption is at its maximum.
pub const DISRUPTED_BANNER: &str = "Grid Disrupted!";

/// Draws a full frame of the scene onto the surface.
pub fn render_scene<S>(scene: &Scene, layout: &BoardLayout, surface: &mut S)
where
    S: DisplaySurface + ?Sized,
{
    draw_grid_lines(layout, surface);

    for entity in &scene.entities {
        entity.draw(layout, surface);
    }

    for (row, colors) in scene.target.rows().iter().enumerate() {
        for (column, color) in colors.iter().enumerate() {
            let Some(fill) = Color::for_cell(*color) else {
                continue;
            };
            let offset = Vec2::new(column as f32, row as f32) * layout.preview_spacing;
            surface.draw_rectangle(Rectangle::filled(
                layout.preview_origin + offset,
                Vec2::splat(layout.preview_length),
                fill,
            ));
        }
    }

    surface.draw_rectangle(Rectangle::outlined(
        layout.cell_origin(scene.cursor),
        Vec2::splat(layout.cell_length),
        Color::YELLOW,
        BoardLayout::CURSOR_THICKNESS,
    ));

    let meter_color = if scene.disruption.is_critical() {
        Color::RED
    } else {
        Color::GREEN
    };
    surface.draw_rectangle(Rectangle::filled(
        layout.meter_origin,
        Vec2::new(layout.meter_width(scene.disruption), layout.meter_size.y),
        meter_color,
    ));

    let banner = match scene.state {
        SessionState::Matched => Some((MATCHED_BANNER, Color::GREEN)),
        SessionState::Disrupted => Some((DISRUPTED_BANNER, Color::RED)),
        SessionState::Playing => None,
    };
    if let Some((text, color)) = banner {
        surface.draw_text(
            text,
            layout.outcome_origin,
            layout.outcome_font_size,
            color,
        );
    }
}

fn draw_grid_lines<S>(layout: &BoardLayout, surface: &mut S)
where
    S: DisplaySurface + ?Sized,
{
    let length = layout.grid_length();
    for index in 0..=GRID_SIDE {
        let offset = index as f32 * layout.cell_length;
        surface.draw_line(
            layout.grid_origin + Vec2::new(offset, 0.0),
            layout.grid_origin + Vec2::new(offset, length),
            BoardLayout::GRID_LINE_THICKNESS,
            Color::WHITE,
        );
        surface.draw_line(
            layout.grid_origin + Vec2::new(0.0, offset),
            layout.grid_origin + Vec2::new(length, offset),
            BoardLayout::GRID_LINE_THICKNESS,
            Color::WHITE,
        );
    }
}

/// Rendering backend capable of presenting Pattern Loom scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// key presses captured by the adapter, and refreshes the scene before it
    /// is rendered. Returning [`ControlFlow::Break`] closes the window.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> ControlFlow<()> + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive side length.
    InvalidCellLength {
        /// Provided length that failed validation.
        cell_length: f32,
    },
    /// Preview squares must be spaced by a positive distance.
    InvalidPreviewSpacing {
        /// Provided spacing that failed validation.
        preview_spacing: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellLength { cell_length } => {
                write!(f, "cell_length must be positive (received {cell_length})")
            }
            Self::InvalidPreviewSpacing { preview_spacing } => {
                write!(
                    f,
                    "preview_spacing must be positive (received {preview_spacing})"
                )
            }
        }
    }
}

impl Error for RenderingError {}

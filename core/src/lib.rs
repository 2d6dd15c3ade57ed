#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pattern Loom engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Pattern Loom.";

/// Number of cells along each edge of the square play grid.
pub const GRID_SIDE: u32 = 5;

/// Number of cells along each edge of the square target pattern.
pub const TARGET_SIDE: u32 = 3;

/// Grid cell that aligns with the upper-left cell of the target pattern.
pub const TARGET_OFFSET: CellCoord = CellCoord::new(1, 1);

/// Number of anomalies spawned on construction and on every reset.
pub const DEFAULT_ANOMALY_COUNT: usize = 2;

/// Probability that an active anomaly corrupts its cell during a single tick.
pub const DEFAULT_CORRUPTION_CHANCE: f64 = 1.0 / 20.0;

/// Disruption added by every successful corruption.
pub const DISRUPTION_INCREMENT: u32 = 5;

/// Color stored in a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellColor {
    /// Unpainted cell.
    #[default]
    Empty,
    /// Red thread.
    Red,
    /// Green thread.
    Green,
    /// Blue thread.
    Blue,
}

impl CellColor {
    /// Colors the player can paint with and anomalies can corrupt into.
    pub const PALETTE: [CellColor; 3] = [CellColor::Red, CellColor::Green, CellColor::Blue];

    /// Reports whether the cell carries a thread.
    #[must_use]
    pub const fn is_painted(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Cardinal directions available to the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Upper-left cell of the grid, where the cursor starts.
    pub const ORIGIN: CellCoord = CellCoord::new(0, 0);

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

    /// Reports whether the coordinate lies on the play grid.
    #[must_use]
    pub const fn is_on_grid(&self) -> bool {
        self.column < GRID_SIDE && self.row < GRID_SIDE
    }

    /// Returns the neighbouring cell in `direction`, or `None` when the step
    /// would leave the play grid.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (Some(self.column), self.row.checked_sub(1)),
            Direction::South => (Some(self.column), self.row.checked_add(1)),
            Direction::West => (self.column.checked_sub(1), Some(self.row)),
            Direction::East => (self.column.checked_add(1), Some(self.row)),
        };

        let next = CellCoord::new(column?, row?);
        next.is_on_grid().then_some(next)
    }
}

/// Unique identifier assigned to an anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnomalyId(u32);

impl AnomalyId {
    /// Creates a new anomaly identifier with the provided numeric value.
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

/// Lifecycle of an anomaly between resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyState {
    /// The anomaly may corrupt its cell on any tick.
    #[default]
    Active,
    /// The player countered the anomaly; it never acts again.
    Neutralized,
}

impl AnomalyState {
    /// Reports whether the anomaly can still corrupt the grid.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Immutable representation of a single anomaly's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnomalySnapshot {
    /// Unique identifier assigned to the anomaly.
    pub id: AnomalyId,
    /// Grid cell the anomaly is snapped to.
    pub cell: CellCoord,
    /// Current lifecycle state.
    pub state: AnomalyState,
}

/// Read-only snapshot describing all anomalies on the grid.
#[derive(Clone, Debug, Default)]
pub struct AnomalyView {
    snapshots: Vec<AnomalySnapshot>,
}

impl AnomalyView {
    /// Creates a new anomaly view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AnomalySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured anomaly snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AnomalySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the anomalies that may still corrupt the grid.
    pub fn active(&self) -> impl Iterator<Item = &AnomalySnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.state.is_active())
    }

    /// Number of anomalies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no anomalies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AnomalySnapshot> {
        self.snapshots
    }
}

/// Cumulative corruption pressure, saturating at [`DisruptionLevel::MAX`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DisruptionLevel(u32);

impl DisruptionLevel {
    /// Level of a freshly reset session.
    pub const ZERO: DisruptionLevel = DisruptionLevel(0);

    /// Failure threshold; the level never exceeds it.
    pub const MAX: DisruptionLevel = DisruptionLevel(100);

    /// Levels strictly above this value are shown as critical.
    pub const CRITICAL_THRESHOLD: u32 = 80;

    /// Creates a level, clamping the value to [`DisruptionLevel::MAX`].
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// Numeric value in the range `0..=100`.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the level raised by `increment`, clamped at the maximum.
    #[must_use]
    pub const fn raised(self, increment: u32) -> Self {
        Self::new(self.0.saturating_add(increment))
    }

    /// Reports whether the failure threshold has been reached.
    #[must_use]
    pub const fn is_maxed(&self) -> bool {
        self.0 >= Self::MAX.0
    }

    /// Reports whether the level sits above the critical threshold.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.0 > Self::CRITICAL_THRESHOLD
    }

    /// Level expressed as a fraction of the maximum in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.0 as f32 / Self::MAX.0 as f32
    }
}

/// Rows of a target pattern in row-major order.
pub type PatternRows = [[CellColor; TARGET_SIDE as usize]; TARGET_SIDE as usize];

/// Fixed 3×3 template the player must reproduce inside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PatternRows", into = "PatternRows")]
pub struct TargetPattern {
    rows: PatternRows,
}

impl TargetPattern {
    /// Pattern used by every session.
    pub const STANDARD: TargetPattern = TargetPattern {
        rows: [
            [CellColor::Red, CellColor::Green, CellColor::Blue],
            [CellColor::Green, CellColor::Blue, CellColor::Red],
            [CellColor::Blue, CellColor::Red, CellColor::Green],
        ],
    };

    /// Creates a pattern from explicit rows.
    ///
    /// Every cell must carry a thread; an empty cell could never be matched
    /// against a painted grid and is rejected.
    pub fn new(rows: PatternRows) -> Result<Self, PatternError> {
        for (row, colors) in rows.iter().enumerate() {
            for (column, color) in colors.iter().enumerate() {
                if !color.is_painted() {
                    return Err(PatternError::EmptyCell {
                        column: column as u32,
                        row: row as u32,
                    });
                }
            }
        }

        Ok(Self { rows })
    }

    /// Pattern rows in row-major order.
    #[must_use]
    pub const fn rows(&self) -> &PatternRows {
        &self.rows
    }

    /// Iterator pairing each grid cell of the evaluation window with the
    /// color the pattern expects there.
    pub fn window(&self) -> impl Iterator<Item = (CellCoord, CellColor)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, colors)| {
            colors.iter().enumerate().map(move |(column, color)| {
                let cell = CellCoord::new(
                    TARGET_OFFSET.column() + column as u32,
                    TARGET_OFFSET.row() + row as u32,
                );
                (cell, *color)
            })
        })
    }
}

impl Default for TargetPattern {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TryFrom<PatternRows> for TargetPattern {
    type Error = PatternError;

    fn try_from(rows: PatternRows) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<TargetPattern> for PatternRows {
    fn from(pattern: TargetPattern) -> Self {
        pattern.rows
    }
}

/// Reasons a target pattern may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    /// A pattern cell was left unpainted.
    #[error("target pattern cell ({column}, {row}) is empty")]
    EmptyCell {
        /// Column of the offending pattern cell.
        column: u32,
        /// Row of the offending pattern cell.
        row: u32,
    },
}

/// Gameplay outcome derived from the match flag and the disruption level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Neither win nor loss has been reached.
    #[default]
    Playing,
    /// The last evaluation matched the target pattern.
    Matched,
    /// Disruption reached its maximum.
    Disrupted,
}

impl SessionState {
    /// Resolves the displayed state; a match takes priority over disruption.
    #[must_use]
    pub const fn resolve(matched: bool, disruption: DisruptionLevel) -> Self {
        if matched {
            Self::Matched
        } else if disruption.is_maxed() {
            Self::Disrupted
        } else {
            Self::Playing
        }
    }
}

/// Keys the input source reports to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Letter `R`.
    R,
    /// Letter `G`.
    G,
    /// Letter `B`.
    B,
    /// Space bar.
    Space,
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
}

/// Discrete key-down event captured by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyPress {
    /// Key that went down.
    pub key: Key,
    /// Whether a control modifier was held at the time.
    pub control: bool,
}

impl KeyPress {
    /// Creates a key press without modifiers.
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            control: false,
        }
    }

    /// Creates a key press with the control modifier held.
    #[must_use]
    pub const fn with_control(key: Key) -> Self {
        Self { key, control: true }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves the cursor a single cell; blocked moves are ignored.
    MoveCursor {
        /// Direction of travel.
        direction: Direction,
    },
    /// Paints the cell under the cursor.
    Paint {
        /// Color written into the cell.
        color: CellColor,
    },
    /// Neutralizes every active anomaly under the cursor.
    Neutralize,
    /// Compares the evaluation window with the target pattern.
    Evaluate,
    /// Clears the session and respawns anomalies at the provided cells.
    Reset {
        /// Cells for the new anomalies, in identifier order.
        anomalies: Vec<CellCoord>,
    },
    /// Advances the simulation clock by a single tick.
    Tick {
        /// Duration of simulated time covered by the tick.
        dt: Duration,
    },
    /// Requests that an anomaly recolor its cell.
    CorruptCell {
        /// Anomaly performing the corruption.
        anomaly: AnomalyId,
        /// Color written into the anomaly's cell.
        color: CellColor,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the cursor moved between two cells.
    CursorMoved {
        /// Cell the cursor occupied before moving.
        from: CellCoord,
        /// Cell the cursor occupies after moving.
        to: CellCoord,
    },
    /// Confirms that a cell was painted by the player.
    CellPainted {
        /// Painted cell.
        cell: CellCoord,
        /// Color written into the cell.
        color: CellColor,
    },
    /// Confirms that an anomaly was countered.
    AnomalyNeutralized {
        /// Identifier of the neutralized anomaly.
        anomaly: AnomalyId,
        /// Cell the anomaly is snapped to.
        cell: CellCoord,
    },
    /// Reports the outcome of an explicit evaluation.
    PatternEvaluated {
        /// Whether the window matched the target pattern.
        matched: bool,
    },
    /// Announces that the session was cleared.
    SessionReset {
        /// Anomalies spawned by the reset.
        anomalies: Vec<CellCoord>,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an anomaly recolored its cell.
    CellCorrupted {
        /// Anomaly responsible for the corruption.
        anomaly: AnomalyId,
        /// Corrupted cell.
        cell: CellCoord,
        /// Color written into the cell.
        color: CellColor,
    },
    /// Reports the disruption level after a corruption.
    DisruptionRaised {
        /// Level after the increment was applied.
        level: DisruptionLevel,
    },
    /// Announces that the derived session state changed.
    SessionStateChanged {
        /// State that became current.
        state: SessionState,
    },
}

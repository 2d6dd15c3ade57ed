#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative puzzle state management for Pattern Loom.

use pattern_loom_core::{
    AnomalyId, AnomalyState, CellColor, CellCoord, Command, DisruptionLevel, Event, SessionState,
    TargetPattern, DISRUPTION_INCREMENT, GRID_SIDE, WELCOME_BANNER,
};

const CELL_COUNT: usize = (GRID_SIDE * GRID_SIDE) as usize;

/// Fixed 5×5 row-major grid of cell colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: [CellColor; CELL_COUNT],
}

impl Grid {
    fn new() -> Self {
        Self {
            cells: [CellColor::Empty; CELL_COUNT],
        }
    }

    /// Color stored at the provided cell. Cells off the grid read as empty.
    #[must_use]
    pub fn color_at(&self, cell: CellCoord) -> CellColor {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Iterator over every cell and its color in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellColor)> + '_ {
        self.cells.iter().enumerate().map(|(index, color)| {
            let index = index as u32;
            (
                CellCoord::new(index % GRID_SIDE, index / GRID_SIDE),
                *color,
            )
        })
    }

    /// Reports whether no cell carries a thread.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|color| !color.is_painted())
    }

    fn set(&mut self, cell: CellCoord, color: CellColor) {
        if let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            *slot = color;
        }
    }

    fn clear(&mut self) {
        self.cells.fill(CellColor::Empty);
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !cell.is_on_grid() {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(row * GRID_SIDE as usize + column)
    }
}

#[derive(Clone, Copy, Debug)]
struct Anomaly {
    id: AnomalyId,
    cell: CellCoord,
    state: AnomalyState,
}

/// Represents the authoritative Pattern Loom puzzle state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    target: TargetPattern,
    cursor: CellCoord,
    anomalies: Vec<Anomaly>,
    disruption: DisruptionLevel,
    matched: bool,
    tick_index: u64,
}

impl World {
    /// Creates a blank world using the standard target pattern.
    ///
    /// The world starts without anomalies; callers spawn them through
    /// [`Command::Reset`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(TargetPattern::STANDARD)
    }

    /// Creates a blank world that evaluates against the provided pattern.
    #[must_use]
    pub fn with_target(target: TargetPattern) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(),
            target,
            cursor: CellCoord::ORIGIN,
            anomalies: Vec::new(),
            disruption: DisruptionLevel::ZERO,
            matched: false,
            tick_index: 0,
        }
    }

    fn session_state(&self) -> SessionState {
        SessionState::resolve(self.matched, self.disruption)
    }

    fn pattern_matches(&self) -> bool {
        self.target
            .window()
            .all(|(cell, expected)| self.grid.color_at(cell) == expected)
    }

    fn reset(&mut self, spawns: Vec<CellCoord>, out_events: &mut Vec<Event>) {
        self.grid.clear();
        self.cursor = CellCoord::ORIGIN;
        self.disruption = DisruptionLevel::ZERO;
        self.matched = false;
        self.tick_index = 0;

        let spawns: Vec<CellCoord> = spawns.into_iter().filter(CellCoord::is_on_grid).collect();
        self.anomalies = spawns
            .iter()
            .zip(0..)
            .map(|(cell, id)| Anomaly {
                id: AnomalyId::new(id),
                cell: *cell,
                state: AnomalyState::Active,
            })
            .collect();

        out_events.push(Event::SessionReset { anomalies: spawns });
    }

    fn neutralize_at_cursor(&mut self, out_events: &mut Vec<Event>) {
        let cursor = self.cursor;
        for anomaly in self
            .anomalies
            .iter_mut()
            .filter(|anomaly| anomaly.cell == cursor && anomaly.state.is_active())
        {
            anomaly.state = AnomalyState::Neutralized;
            out_events.push(Event::AnomalyNeutralized {
                anomaly: anomaly.id,
                cell: anomaly.cell,
            });
        }
    }

    fn corrupt(&mut self, anomaly_id: AnomalyId, color: CellColor, out_events: &mut Vec<Event>) {
        if !color.is_painted() {
            return;
        }

        let Some(anomaly) = self
            .anomalies
            .iter()
            .find(|anomaly| anomaly.id == anomaly_id)
            .copied()
        else {
            return;
        };

        if !anomaly.state.is_active() {
            return;
        }

        self.grid.set(anomaly.cell, color);
        self.disruption = self.disruption.raised(DISRUPTION_INCREMENT);
        out_events.push(Event::CellCorrupted {
            anomaly: anomaly.id,
            cell: anomaly.cell,
            color,
        });
        out_events.push(Event::DisruptionRaised {
            level: self.disruption,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let state_before = world.session_state();

    match command {
        Command::MoveCursor { direction } => {
            let from = world.cursor;
            if let Some(to) = from.step(direction) {
                world.cursor = to;
                out_events.push(Event::CursorMoved { from, to });
            }
        }
        Command::Paint { color } => {
            let cell = world.cursor;
            world.grid.set(cell, color);
            out_events.push(Event::CellPainted { cell, color });
        }
        Command::Neutralize => world.neutralize_at_cursor(out_events),
        Command::Evaluate => {
            world.matched = world.pattern_matches();
            out_events.push(Event::PatternEvaluated {
                matched: world.matched,
            });
        }
        Command::Reset { anomalies } => world.reset(anomalies, out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::CorruptCell { anomaly, color } => world.corrupt(anomaly, color, out_events),
    }

    let state_after = world.session_state();
    if state_after != state_before {
        out_events.push(Event::SessionStateChanged { state: state_after });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Grid, World};
    use pattern_loom_core::{
        AnomalySnapshot, AnomalyView, CellColor, CellCoord, DisruptionLevel, SessionState,
        TargetPattern,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the play grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Color stored at the provided cell.
    #[must_use]
    pub fn cell_color(world: &World, cell: CellCoord) -> CellColor {
        world.grid.color_at(cell)
    }

    /// Pattern the evaluation window is compared against.
    #[must_use]
    pub fn target_pattern(world: &World) -> &TargetPattern {
        &world.target
    }

    /// Cell currently selected by the cursor.
    #[must_use]
    pub fn cursor(world: &World) -> CellCoord {
        world.cursor
    }

    /// Captures a read-only view of the anomalies on the grid.
    #[must_use]
    pub fn anomaly_view(world: &World) -> AnomalyView {
        AnomalyView::from_snapshots(
            world
                .anomalies
                .iter()
                .map(|anomaly| AnomalySnapshot {
                    id: anomaly.id,
                    cell: anomaly.cell,
                    state: anomaly.state,
                })
                .collect(),
        )
    }

    /// Current disruption level.
    #[must_use]
    pub fn disruption(world: &World) -> DisruptionLevel {
        world.disruption
    }

    /// Result of the most recent evaluation since the last reset.
    #[must_use]
    pub fn is_matched(world: &World) -> bool {
        world.matched
    }

    /// Derived gameplay state.
    #[must_use]
    pub fn session_state(world: &World) -> SessionState {
        world.session_state()
    }

    /// Number of ticks applied since the last reset.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_iterates_in_row_major_order() {
        let mut grid = Grid::new();
        grid.set(CellCoord::new(3, 1), CellColor::Green);

        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(cells.len(), CELL_COUNT);
        assert_eq!(cells[1], (CellCoord::new(1, 0), CellColor::Empty));
        assert_eq!(cells[8], (CellCoord::new(3, 1), CellColor::Green));
    }

    #[test]
    fn grid_ignores_writes_outside_bounds() {
        let mut grid = Grid::new();
        grid.set(CellCoord::new(GRID_SIDE, 0), CellColor::Red);

        assert!(grid.is_blank());
        assert_eq!(grid.color_at(CellCoord::new(GRID_SIDE, 0)), CellColor::Empty);
    }
}

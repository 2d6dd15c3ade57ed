#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Puzzle session that couples the authoritative world with the anomaly system.
//!
//! [`PuzzleSession`] is the single owner of gameplay state. Every operation
//! becomes a [`Command`] applied to the world; resulting events are offered
//! to the anomaly system until it stops responding, so a tick and the
//! corruption it causes settle within the same call.

pub mod input;

use std::{ops::ControlFlow, time::Duration};

use pattern_loom_core::{
    AnomalyView, CellColor, CellCoord, Command, Direction, DisruptionLevel, Event, KeyPress,
    SessionState, TargetPattern,
};
use pattern_loom_system_anomalies::{Anomalies, AnomalyTuning};
use pattern_loom_world::{self as world, query, Grid, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use self::input::{binding_for, Action, Binding};

/// Interactive puzzle session: grid, target, cursor, anomalies and disruption.
#[derive(Debug)]
pub struct PuzzleSession<R = ChaCha8Rng> {
    world: World,
    anomalies: Anomalies<R>,
}

impl PuzzleSession<ChaCha8Rng> {
    /// Starts a session whose randomness derives entirely from `seed`.
    #[must_use]
    pub fn seeded(seed: u64, tuning: AnomalyTuning) -> Self {
        Self::from_parts(World::new(), Anomalies::seeded(seed, tuning))
    }
}

impl<R: Rng> PuzzleSession<R> {
    /// Starts a session driven by the provided random source.
    #[must_use]
    pub fn with_rng(rng: R, tuning: AnomalyTuning) -> Self {
        Self::from_parts(World::new(), Anomalies::with_rng(rng, tuning))
    }

    /// Starts a session from an existing world and anomaly system.
    ///
    /// The world is reset immediately so the session begins with a blank
    /// grid and a freshly placed anomaly set.
    #[must_use]
    pub fn from_parts(world: World, anomalies: Anomalies<R>) -> Self {
        let mut session = Self { world, anomalies };
        session.reset();
        session
    }

    /// Applies a player action and returns every event it produced.
    pub fn perform(&mut self, action: Action) -> Vec<Event> {
        let command = match action {
            Action::MoveCursor(direction) => Command::MoveCursor { direction },
            Action::Paint(color) => Command::Paint { color },
            Action::Neutralize => Command::Neutralize,
            Action::Evaluate => Command::Evaluate,
            Action::Reset => Command::Reset {
                anomalies: self.anomalies.placements(),
            },
        };
        self.execute(command)
    }

    /// Routes a key press through the input bindings.
    ///
    /// Returns [`ControlFlow::Break`] when the press asks to end the session.
    pub fn handle_key(&mut self, press: KeyPress) -> ControlFlow<()> {
        match binding_for(press) {
            Binding::Quit => ControlFlow::Break(()),
            Binding::Play(action) => {
                let _ = self.perform(action);
                ControlFlow::Continue(())
            }
        }
    }

    /// Moves the cursor one cell, reporting whether it actually moved.
    pub fn move_cursor(&mut self, direction: Direction) -> bool {
        !self.perform(Action::MoveCursor(direction)).is_empty()
    }

    /// Paints the cell under the cursor.
    pub fn paint(&mut self, color: CellColor) {
        let _ = self.perform(Action::Paint(color));
    }

    /// Neutralizes every active anomaly under the cursor, returning how many
    /// were countered.
    pub fn neutralize(&mut self) -> usize {
        self.perform(Action::Neutralize)
            .iter()
            .filter(|event| matches!(event, Event::AnomalyNeutralized { .. }))
            .count()
    }

    /// Submits the grid for evaluation and returns whether it matched.
    pub fn evaluate(&mut self) -> bool {
        let _ = self.perform(Action::Evaluate);
        query::is_matched(&self.world)
    }

    /// Clears the grid and respawns anomalies.
    pub fn reset(&mut self) {
        let _ = self.perform(Action::Reset);
    }

    /// Advances the anomaly simulation by one tick covering `dt`.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        self.execute(Command::Tick { dt })
    }

    /// Tuning used by the anomaly system.
    #[must_use]
    pub fn tuning(&self) -> &AnomalyTuning {
        self.anomalies.tuning()
    }

    fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        let mut pending = events.clone();
        while !pending.is_empty() {
            let mut commands = Vec::new();
            self.anomalies
                .handle(&pending, &query::anomaly_view(&self.world), &mut commands);

            pending.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut pending);
            }
            events.extend(pending.iter().cloned());
        }

        trace_events(&events);
        events
    }
}

impl<R> PuzzleSession<R> {
    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current play grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        query::grid(&self.world)
    }

    /// Color stored at the provided cell.
    #[must_use]
    pub fn cell_color(&self, cell: CellCoord) -> CellColor {
        query::cell_color(&self.world, cell)
    }

    /// Pattern the player must reproduce.
    #[must_use]
    pub fn target_pattern(&self) -> &TargetPattern {
        query::target_pattern(&self.world)
    }

    /// Cell currently selected by the cursor.
    #[must_use]
    pub fn cursor(&self) -> CellCoord {
        query::cursor(&self.world)
    }

    /// Snapshot of the anomaly collection.
    #[must_use]
    pub fn anomaly_view(&self) -> AnomalyView {
        query::anomaly_view(&self.world)
    }

    /// Current disruption level.
    #[must_use]
    pub fn disruption(&self) -> DisruptionLevel {
        query::disruption(&self.world)
    }

    /// Derived gameplay state; a match outranks disruption.
    #[must_use]
    pub fn state(&self) -> SessionState {
        query::session_state(&self.world)
    }

    /// Reports whether the last evaluation matched the target.
    #[must_use]
    pub fn is_won(&self) -> bool {
        query::is_matched(&self.world)
    }

    /// Reports whether disruption reached its maximum.
    #[must_use]
    pub fn is_lost(&self) -> bool {
        query::disruption(&self.world).is_maxed()
    }

    /// Ticks simulated since the last reset.
    #[must_use]
    pub fn tick_index(&self) -> u64 {
        query::tick_index(&self.world)
    }
}

fn trace_events(events: &[Event]) {
    for event in events {
        match event {
            Event::SessionReset { anomalies } => {
                info!(?anomalies, "session reset");
            }
            Event::SessionStateChanged { state } => {
                info!(?state, "session state changed");
            }
            Event::PatternEvaluated { matched: true } => {
                info!("pattern matched");
            }
            Event::PatternEvaluated { matched: false } => {
                debug!("pattern evaluated without a match");
            }
            Event::CellCorrupted {
                anomaly,
                cell,
                color,
            } => {
                debug!(
                    anomaly = anomaly.get(),
                    column = cell.column(),
                    row = cell.row(),
                    ?color,
                    "anomaly corrupted cell"
                );
            }
            Event::DisruptionRaised { level } => {
                debug!(level = level.get(), "disruption raised");
            }
            Event::AnomalyNeutralized { anomaly, cell } => {
                debug!(
                    anomaly = anomaly.get(),
                    column = cell.column(),
                    row = cell.row(),
                    "anomaly neutralized"
                );
            }
            Event::CursorMoved { .. } | Event::CellPainted { .. } | Event::TimeAdvanced { .. } => {}
        }
    }
}

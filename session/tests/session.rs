use std::{ops::ControlFlow, time::Duration};

use pattern_loom_core::{
    AnomalyState, CellColor, CellCoord, Direction, Event, Key, KeyPress, SessionState,
};
use pattern_loom_session::{input::Action, PuzzleSession};
use pattern_loom_system_anomalies::AnomalyTuning;
use proptest::prelude::*;
use rand::rngs::mock::StepRng;

const FRAME: Duration = Duration::from_millis(16);

fn certain() -> AnomalyTuning {
    AnomalyTuning::new(2, 1.0).expect("valid tuning")
}

fn dormant() -> AnomalyTuning {
    AnomalyTuning::new(2, 0.0).expect("valid tuning")
}

fn move_to(session: &mut PuzzleSession, target: CellCoord) {
    while session.cursor().column() < target.column() {
        assert!(session.move_cursor(Direction::East));
    }
    while session.cursor().column() > target.column() {
        assert!(session.move_cursor(Direction::West));
    }
    while session.cursor().row() < target.row() {
        assert!(session.move_cursor(Direction::South));
    }
    while session.cursor().row() > target.row() {
        assert!(session.move_cursor(Direction::North));
    }
    assert_eq!(session.cursor(), target);
}

fn paint_target(session: &mut PuzzleSession) {
    let window: Vec<_> = session.target_pattern().window().collect();
    for (cell, color) in window {
        move_to(session, cell);
        session.paint(color);
    }
}

#[test]
fn new_session_starts_blank_with_active_anomalies() {
    let session = PuzzleSession::seeded(11, AnomalyTuning::default());

    assert!(session.grid().is_blank());
    assert_eq!(session.cursor(), CellCoord::ORIGIN);
    assert_eq!(session.disruption().get(), 0);
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.tick_index(), 0);

    let view = session.anomaly_view();
    assert_eq!(view.len(), 2);
    assert!(view
        .iter()
        .all(|anomaly| anomaly.state == AnomalyState::Active && anomaly.cell.is_on_grid()));
}

#[test]
fn injected_generator_drives_placement_and_corruption() {
    // A constant zero stream lands every anomaly on the origin, passes every
    // corruption trial and always picks the first palette color.
    let tuning = AnomalyTuning::new(2, 0.05).expect("valid tuning");
    let mut session = PuzzleSession::with_rng(StepRng::new(0, 0), tuning);

    let cells: Vec<_> = session
        .anomaly_view()
        .iter()
        .map(|anomaly| anomaly.cell)
        .collect();
    assert_eq!(cells, vec![CellCoord::ORIGIN, CellCoord::ORIGIN]);

    let events = session.advance(FRAME);
    let corrupted = events
        .iter()
        .filter(|event| matches!(event, Event::CellCorrupted { .. }))
        .count();
    assert_eq!(corrupted, 2);
    assert_eq!(session.cell_color(CellCoord::ORIGIN), CellColor::Red);
    assert_eq!(session.disruption().get(), 10);

    assert_eq!(session.neutralize(), 2);
    let _ = session.advance(FRAME);
    assert_eq!(session.disruption().get(), 10);
}

#[test]
fn zero_anomaly_tuning_leaves_the_grid_untouched() {
    let tuning = AnomalyTuning::new(0, 1.0).expect("valid tuning");
    let mut session = PuzzleSession::seeded(6, tuning);

    assert!(session.anomaly_view().is_empty());
    for _ in 0..50 {
        let _ = session.advance(FRAME);
    }

    assert!(session.grid().is_blank());
    assert_eq!(session.disruption().get(), 0);
}

#[test]
fn painting_the_target_and_evaluating_wins() {
    let mut session = PuzzleSession::seeded(3, dormant());

    paint_target(&mut session);

    assert!(session.evaluate());
    assert!(session.is_won());
    assert_eq!(session.state(), SessionState::Matched);
}

#[test]
fn evaluating_an_incomplete_grid_keeps_playing() {
    let mut session = PuzzleSession::seeded(3, dormant());
    session.paint(CellColor::Red);

    assert!(!session.evaluate());
    assert_eq!(session.state(), SessionState::Playing);
}

#[test]
fn unchecked_anomalies_fully_disrupt_the_grid() {
    let mut session = PuzzleSession::seeded(5, certain());

    for _ in 0..20 {
        let _ = session.advance(FRAME);
    }

    assert_eq!(session.disruption().get(), 100);
    assert!(session.is_lost());
    assert_eq!(session.state(), SessionState::Disrupted);
    assert_eq!(session.tick_index(), 20);
}

#[test]
fn corruption_paints_the_anomaly_cell() {
    let mut session = PuzzleSession::seeded(8, certain());

    let events = session.advance(FRAME);

    let corrupted: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::CellCorrupted { cell, color, .. } => Some((*cell, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(corrupted.len(), 2);
    for anomaly in session.anomaly_view().iter() {
        assert!(session.cell_color(anomaly.cell).is_painted());
    }
    assert_eq!(session.disruption().get(), 10);
}

#[test]
fn neutralized_anomalies_stop_disrupting() {
    let mut session = PuzzleSession::seeded(21, certain());

    let cells: Vec<_> = session
        .anomaly_view()
        .iter()
        .map(|anomaly| anomaly.cell)
        .collect();
    let mut countered = 0;
    for cell in cells {
        move_to(&mut session, cell);
        countered += session.neutralize();
    }

    assert_eq!(countered, 2);
    assert!(session.anomaly_view().active().next().is_none());

    for _ in 0..20 {
        let _ = session.advance(FRAME);
    }

    assert_eq!(session.disruption().get(), 0);
    assert_eq!(session.state(), SessionState::Playing);
}

#[test]
fn a_match_outranks_full_disruption() {
    let mut session = PuzzleSession::seeded(13, certain());

    for _ in 0..10 {
        let _ = session.advance(FRAME);
    }
    assert_eq!(session.state(), SessionState::Disrupted);

    paint_target(&mut session);
    assert!(session.evaluate());

    assert_eq!(session.state(), SessionState::Matched);
    assert!(session.is_lost());
}

#[test]
fn reset_restores_a_fresh_session() {
    let mut session = PuzzleSession::seeded(17, certain());
    session.paint(CellColor::Blue);
    let _ = session.move_cursor(Direction::East);
    let _ = session.neutralize();
    for _ in 0..4 {
        let _ = session.advance(FRAME);
    }

    session.reset();

    assert!(session.grid().is_blank());
    assert_eq!(session.cursor(), CellCoord::ORIGIN);
    assert_eq!(session.disruption().get(), 0);
    assert!(!session.is_won());
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.tick_index(), 0);
    let view = session.anomaly_view();
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|anomaly| anomaly.state.is_active()));
}

#[test]
fn key_presses_drive_the_session() {
    let mut session = PuzzleSession::seeded(2, dormant());

    assert_eq!(
        session.handle_key(KeyPress::plain(Key::Right)),
        ControlFlow::Continue(())
    );
    assert_eq!(
        session.handle_key(KeyPress::plain(Key::G)),
        ControlFlow::Continue(())
    );
    assert_eq!(session.cell_color(CellCoord::new(1, 0)), CellColor::Green);

    assert_eq!(
        session.handle_key(KeyPress::with_control(Key::R)),
        ControlFlow::Continue(())
    );
    assert!(session.grid().is_blank());

    assert_eq!(
        session.handle_key(KeyPress::plain(Key::Escape)),
        ControlFlow::Break(())
    );
}

#[test]
fn seeded_sessions_replay_identically() {
    let first = replay(0xfeed);
    let second = replay(0xfeed);

    assert_eq!(first, second, "replay diverged between runs");
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    cells: Vec<(CellCoord, CellColor)>,
    anomalies: Vec<(CellCoord, AnomalyState)>,
    disruption: u32,
    state: SessionState,
    events: Vec<Event>,
}

fn replay(seed: u64) -> ReplayOutcome {
    let tuning = AnomalyTuning::new(3, 0.25).expect("valid tuning");
    let mut session = PuzzleSession::seeded(seed, tuning);
    let script = [
        Action::Paint(CellColor::Red),
        Action::MoveCursor(Direction::East),
        Action::Paint(CellColor::Green),
        Action::Neutralize,
        Action::MoveCursor(Direction::South),
        Action::Evaluate,
        Action::Reset,
        Action::MoveCursor(Direction::South),
        Action::Paint(CellColor::Blue),
    ];

    let mut events = Vec::new();
    for action in script {
        events.extend(session.perform(action));
        for _ in 0..6 {
            events.extend(session.advance(FRAME));
        }
    }

    ReplayOutcome {
        cells: session.grid().iter().collect(),
        anomalies: session
            .anomaly_view()
            .into_vec()
            .into_iter()
            .map(|anomaly| (anomaly.cell, anomaly.state))
            .collect(),
        disruption: session.disruption().get(),
        state: session.state(),
        events,
    }
}

fn step() -> impl Strategy<Value = Option<Action>> {
    let direction = prop_oneof![
        Just(Direction::North),
        Just(Direction::East),
        Just(Direction::South),
        Just(Direction::West),
    ];
    let color = prop_oneof![
        Just(CellColor::Red),
        Just(CellColor::Green),
        Just(CellColor::Blue),
    ];
    prop_oneof![
        Just(None),
        direction.prop_map(|direction| Some(Action::MoveCursor(direction))),
        color.prop_map(|color| Some(Action::Paint(color))),
        Just(Some(Action::Neutralize)),
        Just(Some(Action::Evaluate)),
    ]
}

proptest! {
    #[test]
    fn cursor_stays_on_grid_and_disruption_never_falls(
        seed in any::<u64>(),
        steps in prop::collection::vec(step(), 0..80),
    ) {
        let tuning = AnomalyTuning::new(2, 0.3).expect("valid tuning");
        let mut session = PuzzleSession::seeded(seed, tuning);
        let mut previous = session.disruption();

        for step in steps {
            match step {
                Some(action) => {
                    let _ = session.perform(action);
                }
                None => {
                    let _ = session.advance(FRAME);
                }
            }

            prop_assert!(session.cursor().is_on_grid());
            let current = session.disruption();
            prop_assert!(current >= previous);
            prop_assert!(current.get() <= 100);
            previous = current;
        }
    }
}

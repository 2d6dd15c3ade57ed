use pattern_loom_rendering::{Entity, Scene};
use pattern_loom_session::PuzzleSession;

/// Captures the session as a scene: threads first so anomalies draw above them.
pub(crate) fn snapshot<R>(session: &PuzzleSession<R>) -> Scene {
    let threads = session
        .grid()
        .iter()
        .map(|(cell, color)| Entity::Thread { cell, color });
    let anomalies = session
        .anomaly_view()
        .into_vec()
        .into_iter()
        .map(|anomaly| Entity::Anomaly {
            cell: anomaly.cell,
            state: anomaly.state,
        });

    Scene::new(
        threads.chain(anomalies).collect(),
        *session.target_pattern(),
        session.cursor(),
        session.disruption(),
        session.state(),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pattern_loom_core::{CellColor, CellCoord, Direction, SessionState};
    use pattern_loom_system_anomalies::AnomalyTuning;

    use super::*;

    #[test]
    fn snapshot_lists_every_cell_then_every_anomaly() {
        let session = PuzzleSession::seeded(4, AnomalyTuning::default());

        let scene = snapshot(&session);

        assert_eq!(scene.entities.len(), 27);
        assert!(scene.entities[..25]
            .iter()
            .all(|entity| matches!(entity, Entity::Thread { .. })));
        assert!(scene.entities[25..]
            .iter()
            .all(|entity| matches!(entity, Entity::Anomaly { .. })));
        assert_eq!(scene.state, SessionState::Playing);
    }

    #[test]
    fn snapshot_reflects_cursor_paint_and_disruption() {
        let tuning = AnomalyTuning::new(2, 1.0).expect("valid tuning");
        let mut session = PuzzleSession::seeded(4, tuning);
        assert!(session.move_cursor(Direction::South));
        session.paint(CellColor::Green);
        let _ = session.advance(Duration::from_millis(16));

        let scene = snapshot(&session);

        assert_eq!(scene.cursor, CellCoord::new(0, 1));
        assert_eq!(scene.disruption.get(), 10);
        assert!(scene.entities.iter().any(|entity| matches!(
            entity,
            Entity::Thread { cell, color } if cell.row() == 1 && color.is_painted()
        )));
    }
}

//! Translation of raw key presses into puzzle actions.

use pattern_loom_core::{CellColor, Direction, Key, KeyPress};

/// Player intent that mutates the puzzle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the cursor one cell.
    MoveCursor(Direction),
    /// Paint the cell under the cursor.
    Paint(CellColor),
    /// Counter every anomaly under the cursor.
    Neutralize,
    /// Submit the grid for evaluation.
    Evaluate,
    /// Start over with a fresh grid and anomaly set.
    Reset,
}

/// Meaning assigned to a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    /// The press drives the puzzle.
    Play(Action),
    /// The press ends the session.
    Quit,
}

/// Resolves the binding for a key press.
///
/// `Ctrl+R` resets; a plain `R` paints red. Control is ignored for every
/// other key.
#[must_use]
pub fn binding_for(press: KeyPress) -> Binding {
    let action = match press.key {
        Key::Escape => return Binding::Quit,
        Key::R if press.control => Action::Reset,
        Key::Up => Action::MoveCursor(Direction::North),
        Key::Down => Action::MoveCursor(Direction::South),
        Key::Left => Action::MoveCursor(Direction::West),
        Key::Right => Action::MoveCursor(Direction::East),
        Key::R => Action::Paint(CellColor::Red),
        Key::G => Action::Paint(CellColor::Green),
        Key::B => Action::Paint(CellColor::Blue),
        Key::Space => Action::Neutralize,
        Key::Enter => Action::Evaluate,
    };
    Binding::Play(action)
}

/// Host seams: what the game needs from the editor it runs in.
///
/// The terminal front end implements these (`ui::editor::BufferView`,
/// `ui::workbench::Workbench`); tests use the same types headless.

use crate::domain::decorator::DecorationSurface;
use crate::domain::geometry::{Direction, Position};

/// An open text buffer with a caret that can carry overlays.
pub trait TextEditor: DecorationSurface {
    fn caret(&self) -> Position;
    /// Character under `at`; a space past the end of a line or the buffer.
    fn glyph_at(&self, at: Position) -> char;
    /// The host's native "move caret one cell" command.
    fn move_caret(&mut self, d: Direction);
}

/// Window-level services: messages and context flags for keybindings.
pub trait Window {
    fn show_information_message(&mut self, text: &str);
    fn set_context(&mut self, key: &'static str, value: bool);
}

/// Events emitted by the game and its command glue.
/// The presentation layer consumes these for sound and logging.

use crate::domain::geometry::{Direction, Position};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Activated,
    Deactivated,
    RoundBuilt { steps: usize },
    /// A step's entry animation finished; it can now be consumed.
    StepReady { position: Position },
    StepConsumed { position: Position, direction: Direction, remaining: usize },
    RoundComplete,
    RoundCleared { discarded: usize },
}

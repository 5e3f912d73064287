/// Command glue: the command manifest and the session that runs commands.
///
/// Every command id lives under the `beat-code` prefix. The manifest is a
/// static table; nothing registers commands at runtime.

use std::time::Duration;

use crate::domain::geometry::Direction;
use crate::domain::walk::DirectionSource;
use crate::sim::event::GameEvent;
use crate::sim::game::Game;
use crate::sim::host::{TextEditor, Window};

pub const IDENTIFIER: &str = "beat-code";
/// Context flag published to the window while a session is activated.
pub const CONTEXT_ACTIVATED: &str = "beat-code.activated";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Command {
    Activate,
    Deactivate,
    Step(Direction),
}

pub struct CommandInfo {
    pub command: Command,
    pub id: &'static str,
    pub title: &'static str,
}

pub const MANIFEST: &[CommandInfo] = &[
    CommandInfo { command: Command::Activate, id: "beat-code.activate", title: "Beat Code: Start" },
    CommandInfo { command: Command::Deactivate, id: "beat-code.deactivate", title: "Beat Code: Stop" },
    CommandInfo { command: Command::Step(Direction::Up), id: "beat-code.up", title: "Beat Code: Up" },
    CommandInfo { command: Command::Step(Direction::Down), id: "beat-code.down", title: "Beat Code: Down" },
    CommandInfo { command: Command::Step(Direction::Left), id: "beat-code.left", title: "Beat Code: Left" },
    CommandInfo { command: Command::Step(Direction::Right), id: "beat-code.right", title: "Beat Code: Right" },
];

impl Command {
    /// Row of this command in `MANIFEST`.
    fn row(self) -> usize {
        match self {
            Command::Activate => 0,
            Command::Deactivate => 1,
            Command::Step(Direction::Up) => 2,
            Command::Step(Direction::Down) => 3,
            Command::Step(Direction::Left) => 4,
            Command::Step(Direction::Right) => 5,
        }
    }

    pub fn info(self) -> &'static CommandInfo {
        &MANIFEST[self.row()]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    #[cfg(test)]
    pub fn from_id(id: &str) -> Option<Command> {
        MANIFEST.iter().find(|c| c.id == id).map(|c| c.command)
    }
}

pub const MSG_ACTIVATED: &str = "Let's BEAT!";
pub const MSG_DEACTIVATED: &str = "Beat stopped.";
pub const MSG_ROUND_COMPLETE: &str = "Round complete! Start again for a new beat.";

pub struct Session {
    game: Game,
    activated: bool,
}

impl Session {
    pub fn new(game: Game) -> Self {
        Session { game, activated: false }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Run one command against the host.
    pub fn execute<E: TextEditor>(
        &mut self,
        command: Command,
        window: &mut impl Window,
        editor: Option<&mut E>,
        source: &mut impl DirectionSource,
    ) -> Vec<GameEvent> {
        tracing::trace!(command = command.id(), "execute");
        match command {
            Command::Activate => {
                window.show_information_message(MSG_ACTIVATED);
                window.set_context(CONTEXT_ACTIVATED, true);
                self.activated = true;
                let mut events = vec![GameEvent::Activated];
                events.extend(self.game.build(editor, source));
                tracing::info!(steps = self.game.remaining(), "activated");
                events
            }
            Command::Deactivate => {
                let discarded = match editor {
                    Some(editor) => self.game.clear(editor),
                    None => self.game.abandon(),
                };
                let mut events = vec![GameEvent::RoundCleared { discarded }];
                window.set_context(CONTEXT_ACTIVATED, false);
                self.activated = false;
                window.show_information_message(MSG_DEACTIVATED);
                tracing::info!("deactivated");
                events.push(GameEvent::Deactivated);
                events
            }
            Command::Step(direction) => {
                let Some(editor) = editor else {
                    return Vec::new();
                };
                if !self.game.is_active() {
                    tracing::trace!(%direction, "no round to step through");
                    return Vec::new();
                }
                let Some(position) = self.game.head().map(|s| s.position) else {
                    return Vec::new();
                };
                if self.game.consume(direction, &mut *editor).is_none() {
                    tracing::trace!(%direction, "step rejected");
                    return Vec::new();
                }
                editor.move_caret(direction);

                let remaining = self.game.remaining();
                let mut events = vec![GameEvent::StepConsumed { position, direction, remaining }];
                if remaining == 0 {
                    window.show_information_message(MSG_ROUND_COMPLETE);
                    tracing::info!("round complete");
                    events.push(GameEvent::RoundComplete);
                }
                events
            }
        }
    }

    /// Advance animations. Without an editor there is nothing to draw on,
    /// so time does not move either.
    pub fn tick<E: TextEditor>(&mut self, dt: Duration, editor: Option<&mut E>) -> Vec<GameEvent> {
        match editor {
            Some(editor) => self.game.tick(dt, editor),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ease::Ease;
    use crate::domain::geometry::Position;
    use crate::domain::walk::Scripted;
    use crate::sim::game::{DEFAULT_READY_EPSILON, STEP_COUNT};
    use crate::ui::editor::BufferView;
    use crate::ui::workbench::Workbench;
    use Direction::*;

    fn setup() -> (Session, Workbench, BufferView) {
        let session = Session::new(Game::new(DEFAULT_READY_EPSILON, Ease::Linear));
        let mut editor = BufferView::from_text("t", &"abcdefghij\n".repeat(30));
        editor.set_caret(Position::new(4, 4));
        (session, Workbench::new(), editor)
    }

    #[test]
    fn manifest_ids_are_prefixed_and_unique() {
        for info in MANIFEST {
            assert!(info.id.starts_with(&format!("{IDENTIFIER}.")));
            assert_eq!(info.command.info().id, info.id);
            assert_eq!(Command::from_id(info.id), Some(info.command));
            assert_eq!(info.command.id(), info.id);
        }
        assert_eq!(MANIFEST.len(), 6);
        assert_eq!(Command::Step(Left).id(), "beat-code.left");
        assert_eq!(Command::from_id("beat-code.jump"), None);
    }

    #[test]
    fn activate_announces_flags_and_builds() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Right]);
        let events = s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);

        assert!(s.is_activated());
        assert!(wb.context(CONTEXT_ACTIVATED));
        assert_eq!(wb.message(), Some(MSG_ACTIVATED));
        assert_eq!(events[0], GameEvent::Activated);
        assert!(events.contains(&GameEvent::RoundBuilt { steps: STEP_COUNT }));
        assert_eq!(s.game().remaining(), STEP_COUNT);
    }

    #[test]
    fn activate_without_editor_still_flags_but_builds_nothing() {
        let (mut s, mut wb, _) = setup();
        let mut src = Scripted::new(&[Right]);
        let events = s.execute(Command::Activate, &mut wb, None::<&mut BufferView>, &mut src);
        assert_eq!(events, vec![GameEvent::Activated]);
        assert!(wb.context(CONTEXT_ACTIVATED));
        assert!(!s.game().is_active());
    }

    #[test]
    fn matching_step_moves_the_caret() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Right]);
        s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);
        s.tick(Duration::from_secs(1), Some(&mut ed));

        let events = s.execute(Command::Step(Right), &mut wb, Some(&mut ed), &mut src);
        assert_eq!(ed.caret(), Position::new(4, 5));
        assert_eq!(
            events,
            vec![GameEvent::StepConsumed {
                position: Position::new(4, 5),
                direction: Right,
                remaining: STEP_COUNT - 1,
            }]
        );
    }

    #[test]
    fn rejected_step_leaves_the_caret_alone() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Right]);
        s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);

        // Not ready yet.
        assert!(s.execute(Command::Step(Right), &mut wb, Some(&mut ed), &mut src).is_empty());
        s.tick(Duration::from_secs(1), Some(&mut ed));
        // Wrong direction.
        assert!(s.execute(Command::Step(Up), &mut wb, Some(&mut ed), &mut src).is_empty());
        assert_eq!(ed.caret(), Position::new(4, 4));
        assert_eq!(s.game().remaining(), STEP_COUNT);
    }

    #[test]
    fn caret_tracks_a_whole_round() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Down, Right, Down, Left]);
        s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);
        let path: Vec<_> = s.game().steps().map(|st| (st.position, st.direction)).collect();
        s.tick(Duration::from_secs(10), Some(&mut ed));

        let mut last = Vec::new();
        for (position, direction) in path {
            last = s.execute(Command::Step(direction), &mut wb, Some(&mut ed), &mut src);
            assert_eq!(ed.caret(), position);
        }
        assert_eq!(last.last(), Some(&GameEvent::RoundComplete));
        assert_eq!(wb.message(), Some(MSG_ROUND_COMPLETE));
        assert!(s.is_activated());
    }

    #[test]
    fn deactivate_without_editor_still_drops_the_round() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Right]);
        s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);
        let events = s.execute(Command::Deactivate, &mut wb, None::<&mut BufferView>, &mut src);

        assert_eq!(events, vec![GameEvent::RoundCleared { discarded: STEP_COUNT }, GameEvent::Deactivated]);
        assert!(!s.is_activated());
        assert!(!s.game().is_active());
        assert!(s.game().occupied().is_empty());
    }

        #[test]
    fn deactivate_clears_and_unflags() {
        let (mut s, mut wb, mut ed) = setup();
        let mut src = Scripted::new(&[Right]);
        s.execute(Command::Activate, &mut wb, Some(&mut ed), &mut src);
        let events = s.execute(Command::Deactivate, &mut wb, Some(&mut ed), &mut src);

        assert!(!s.is_activated());
        assert!(!wb.context(CONTEXT_ACTIVATED));
        assert_eq!(wb.message(), Some(MSG_DEACTIVATED));
        assert_eq!(events, vec![GameEvent::RoundCleared { discarded: STEP_COUNT }, GameEvent::Deactivated]);
        assert!(!s.game().is_active());
        assert_eq!(ed.overlay_count(), 0);
    }
}

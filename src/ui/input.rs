/// Keyboard input: event draining and the keymap.
///
/// Every Press or Repeat is one command invocation, the way an editor
/// treats keys (holding an arrow repeats the move). Release events are
/// ignored.
///
/// The keymap is built once from `[keys]` in config.toml. Direction keys
/// carry a `when` clause: while `beat-code.activated` is set they run the
/// game's direction commands, otherwise the native caret move.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::KeysConfig;
use crate::domain::geometry::Direction;
use crate::sim::commands::{Command, CONTEXT_ACTIVATED};
use crate::ui::workbench::Workbench;

pub struct InputState {
    /// Key presses (including repeats) read during the last drain.
    pub presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Release {
                    self.presses.push(key);
                }
            }
        }
    }
}

/// What a resolved key does.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Run(Command),
    /// The host's own caret move, used while the game is not activated.
    NativeMove(Direction),
    Quit,
}

/// Context a binding requires.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum When {
    Always,
    Activated,
    NotActivated,
}

impl When {
    fn holds(self, wb: &Workbench) -> bool {
        match self {
            When::Always => true,
            When::Activated => wb.context(CONTEXT_ACTIVATED),
            When::NotActivated => !wb.context(CONTEXT_ACTIVATED),
        }
    }
}

/// A key plus whether Ctrl must be held.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeySpec {
    pub code: KeyCode,
    pub ctrl: bool,
}

impl KeySpec {
    /// Parse names like `"Up"`, `"Esc"`, `"F5"`, `"k"`, `"Ctrl+B"`.
    pub fn from_name(s: &str) -> Option<KeySpec> {
        let s = s.trim();
        let (ctrl, key) = match s.split_once('+') {
            Some((m, k)) if m.eq_ignore_ascii_case("ctrl") && !k.is_empty() => (true, k),
            _ => (false, s),
        };
        let code = match key.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "esc" | "escape" => KeyCode::Esc,
            "enter" | "return" => KeyCode::Enter,
            "space" => KeyCode::Char(' '),
            "tab" => KeyCode::Tab,
            lower => {
                if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    KeyCode::F(n)
                } else {
                    let mut chars = key.chars();
                    match (chars.next(), chars.next()) {
                        // Ctrl chords are matched case-insensitively.
                        (Some(c), None) if ctrl => KeyCode::Char(c.to_ascii_lowercase()),
                        (Some(c), None) => KeyCode::Char(c),
                        _ => return None,
                    }
                }
            }
        };
        Some(KeySpec { code, ctrl })
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl != self.ctrl {
            return false;
        }
        match (self.code, key.code) {
            (KeyCode::Char(a), KeyCode::Char(b)) if self.ctrl => a == b.to_ascii_lowercase(),
            (a, b) => a == b,
        }
    }
}

struct Binding {
    key: KeySpec,
    action: Action,
    when: When,
}

pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    pub fn from_config(cfg: &KeysConfig) -> Self {
        fn bind(bindings: &mut Vec<Binding>, names: &[String], action: Action, when: When) {
            for name in names {
                match KeySpec::from_name(name) {
                    Some(key) => bindings.push(Binding { key, action, when }),
                    None => tracing::warn!(key = name.as_str(), "unknown key name in config"),
                }
            }
        }

        let mut bindings = Vec::new();
        bind(&mut bindings, &cfg.quit, Action::Quit, When::Always);
        bind(&mut bindings, &cfg.activate, Action::Run(Command::Activate), When::Always);
        bind(&mut bindings, &cfg.deactivate, Action::Run(Command::Deactivate), When::Activated);
        for (names, d) in [
            (&cfg.up, Direction::Up),
            (&cfg.down, Direction::Down),
            (&cfg.left, Direction::Left),
            (&cfg.right, Direction::Right),
        ] {
            bind(&mut bindings, names, Action::Run(Command::Step(d)), When::Activated);
            bind(&mut bindings, names, Action::NativeMove(d), When::NotActivated);
        }

        Keymap { bindings }
    }

    /// First binding whose key and `when` clause both match.
    pub fn resolve(&self, key: &KeyEvent, wb: &Workbench) -> Option<Action> {
        self.bindings
            .iter()
            .find(|b| b.key.matches(key) && b.when.holds(wb))
            .map(|b| b.action)
    }

    /// Route a direction that did not come from a key (gamepad).
    pub fn direction(&self, d: Direction, wb: &Workbench) -> Action {
        if wb.context(CONTEXT_ACTIVATED) {
            Action::Run(Command::Step(d))
        } else {
            Action::NativeMove(d)
        }
    }
}

/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::rngs::ThreadRng;

use config::GameConfig;
use domain::walk::RandomDirections;
use error::Result;
use sim::commands::{Command, Session, MANIFEST};
use sim::event::GameEvent;
use sim::game::{Game, STEP_COUNT};
use sim::host::TextEditor;
use ui::editor::BufferView;
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState, Keymap};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::workbench::Workbench;

/// Follow a randomly generated path through a text buffer, one arrow at a time.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to open; a built-in sample buffer is used if omitted
    file: Option<PathBuf>,

    /// Read this config file instead of searching for config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file, or a directory to put it in
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_guard = match logging::init(cli.log_file.clone()) {
        Ok(guard) => {
            tracing::info!(log_file = %guard.log_file.display(), "beat-code starting");
            Some(guard)
        }
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };

    let config = GameConfig::load(cli.config.as_deref());

    let mut editor = match &cli.file {
        Some(path) => match BufferView::open(path) {
            Ok(editor) => editor,
            Err(e) => {
                tracing::error!(error = %e, "open failed");
                eprintln!("{e}");
                drop(log_guard);
                std::process::exit(1);
            }
        },
        None => BufferView::sample(),
    };

    for info in MANIFEST {
        tracing::debug!(id = info.id, title = info.title, command = ?info.command, "command registered");
    }

    let mut renderer = Renderer::new(help_line(&config));

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = if config.sound.enabled { SoundEngine::new() } else { None };

    let result = game_loop(&mut editor, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "frame loop failed");
        eprintln!("Error: {e}");
        drop(log_guard);
        std::process::exit(1);
    }

    tracing::info!("beat-code exiting");
}

fn game_loop(
    editor: &mut BufferView,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let keymap = Keymap::from_config(&config.keys);

    let mut wb = Workbench::new();
    let mut session = Session::new(Game::new(config.timing.ready_epsilon, config.timing.ease));
    let mut directions = RandomDirections::new(rand::thread_rng());

    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        // Keys resolve one at a time so a `when` clause sees the context
        // left by the previous key.
        let mut events = Vec::new();
        for key in &kb.presses {
            if let Some(action) = keymap.resolve(key, &wb) {
                if !apply(action, &mut session, &mut wb, editor, &mut directions, &mut events) {
                    return Ok(());
                }
            }
        }

        let mut pad_actions = Vec::new();
        if gp.activate_pressed() {
            pad_actions.push(Action::Run(Command::Activate));
        }
        if gp.deactivate_pressed() && session.is_activated() {
            pad_actions.push(Action::Run(Command::Deactivate));
        }
        pad_actions.extend(gp.directions().iter().map(|&d| keymap.direction(d, &wb)));
        for action in pad_actions {
            apply(action, &mut session, &mut wb, editor, &mut directions, &mut events);
        }

        let now = Instant::now();
        events.extend(session.tick(now - last_frame, Some(&mut *editor)));
        last_frame = now;
        wb.expire_message(now);

        log_events(&events);
        ui::sound::play_events(sound, &events, STEP_COUNT);

        renderer.render(editor, &wb, &session, gp.connected)?;
        std::thread::sleep(frame);
    }
}

/// Run one resolved action. Returns false on quit.
fn apply(
    action: Action,
    session: &mut Session,
    wb: &mut Workbench,
    editor: &mut BufferView,
    directions: &mut RandomDirections<ThreadRng>,
    events: &mut Vec<GameEvent>,
) -> bool {
    match action {
        Action::Quit => return false,
        Action::NativeMove(d) => editor.move_caret(d),
        Action::Run(command) => events.extend(session.execute(command, wb, Some(editor), directions)),
    }
    true
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::StepConsumed { position, direction, remaining } => {
                tracing::debug!(%position, %direction, remaining, "step consumed");
            }
            other => tracing::trace!(event = ?other, "game event"),
        }
    }
}

fn help_line(config: &GameConfig) -> String {
    let keys = &config.keys;
    format!(
        " {}:Start  {}:Stop  {}/{}/{}/{}:Step  {}:Quit  │  Pad: Start/Select + D-pad",
        keys.activate.join("/"),
        keys.deactivate.join("/"),
        keys.up.join("/"),
        keys.down.join("/"),
        keys.left.join("/"),
        keys.right.join("/"),
        keys.quit.join("/"),
    )
}

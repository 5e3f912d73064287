/// External configuration loader.
///
/// Reads `config.toml` from `--config PATH`, or else from the executable's
/// directory, the CWD, or `~/.local/share/beat-code`.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::ease::Ease;
use crate::sim::game::DEFAULT_READY_EPSILON;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub keys: KeysConfig,
    pub gamepad: GamepadConfig,
    pub sound: SoundConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    /// How close to 1.0 a step's progress must be to count as ready.
    pub ready_epsilon: f64,
    pub ease: Ease,
}

/// Key names per action, e.g. `"Up"`, `"k"`, `"F5"`, `"Ctrl+B"`.
#[derive(Clone, Debug)]
pub struct KeysConfig {
    pub activate: Vec<String>,
    pub deactivate: Vec<String>,
    pub quit: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub activate: Vec<String>,
    pub deactivate: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SoundConfig {
    pub enabled: bool,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sound: TomlSound,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_ready_epsilon")]
    ready_epsilon: f64,
    #[serde(default = "default_ease")]
    ease: String,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_key_activate")]
    activate: Vec<String>,
    #[serde(default = "default_key_deactivate")]
    deactivate: Vec<String>,
    #[serde(default = "default_key_quit")]
    quit: Vec<String>,
    #[serde(default = "default_key_up")]
    up: Vec<String>,
    #[serde(default = "default_key_down")]
    down: Vec<String>,
    #[serde(default = "default_key_left")]
    left: Vec<String>,
    #[serde(default = "default_key_right")]
    right: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_activate")]
    activate: Vec<String>,
    #[serde(default = "default_pad_deactivate")]
    deactivate: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }
fn default_ready_epsilon() -> f64 { DEFAULT_READY_EPSILON }
fn default_ease() -> String { "power1.out".into() }

fn default_key_activate() -> Vec<String> { vec!["F5".into(), "Ctrl+B".into()] }
fn default_key_deactivate() -> Vec<String> { vec!["Esc".into()] }
fn default_key_quit() -> Vec<String> { vec!["q".into(), "Ctrl+C".into()] }
fn default_key_up() -> Vec<String> { vec!["Up".into(), "k".into()] }
fn default_key_down() -> Vec<String> { vec!["Down".into(), "j".into()] }
fn default_key_left() -> Vec<String> { vec!["Left".into(), "h".into()] }
fn default_key_right() -> Vec<String> { vec!["Right".into(), "l".into()] }

fn default_pad_activate() -> Vec<String> { vec!["Start".into()] }
fn default_pad_deactivate() -> Vec<String> { vec!["Select".into()] }
fn default_sound_enabled() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            ready_epsilon: default_ready_epsilon(),
            ease: default_ease(),
        }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys {
            activate: default_key_activate(),
            deactivate: default_key_deactivate(),
            quit: default_key_quit(),
            up: default_key_up(),
            down: default_key_down(),
            left: default_key_left(),
            right: default_key_right(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            activate: default_pad_activate(),
            deactivate: default_pad_deactivate(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_sound_enabled() }
    }
}

fn parse_ease(name: &str) -> Ease {
    match name.to_lowercase().as_str() {
        "linear" | "none" => Ease::Linear,
        "power1.out" | "power1" | "quad.out" => Ease::Power1Out,
        other => {
            tracing::warn!(ease = other, "unknown ease, using power1.out");
            Ease::Power1Out
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `explicit` if given, else search for `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => load_toml(&candidate_dirs()),
        };
        Self::from_toml(toml_cfg)
    }

    /// Parse a config document. Keys left out take their defaults.
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let mut ready_epsilon = toml_cfg.timing.ready_epsilon;
        if !(0.0..1.0).contains(&ready_epsilon) {
            tracing::warn!(ready_epsilon, "ready_epsilon must be in [0, 1), using default");
            ready_epsilon = DEFAULT_READY_EPSILON;
        }

        GameConfig {
            timing: TimingConfig {
                frame_ms: toml_cfg.timing.frame_ms.max(1),
                ready_epsilon,
                ease: parse_ease(&toml_cfg.timing.ease),
            },
            keys: KeysConfig {
                activate: toml_cfg.keys.activate,
                deactivate: toml_cfg.keys.deactivate,
                quit: toml_cfg.keys.quit,
                up: toml_cfg.keys.up,
                down: toml_cfg.keys.down,
                left: toml_cfg.keys.left,
                right: toml_cfg.keys.right,
            },
            gamepad: GamepadConfig {
                activate: toml_cfg.gamepad.activate,
                deactivate: toml_cfg.gamepad.deactivate,
            },
            sound: SoundConfig {
                enabled: toml_cfg.sound.enabled,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut found = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            found.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !found.iter().any(|d| d == &cwd) {
            found.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/beat-code)
    if let Some(data) = dirs::data_local_dir() {
        let own = data.join("beat-code");
        if own.is_dir() && !found.iter().any(|d| d == &own) {
            found.push(own);
        }
    }

    if found.is_empty() {
        found.push(PathBuf::from("."));
    }

    found
}

/// Read one config file. `None` (with a warning) if it is unreadable or
/// does not parse.
fn read_toml(path: &Path) -> Option<TomlConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read config");
            return None;
        }
    };
    match toml::from_str::<TomlConfig>(&text) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "loaded config");
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config parse error, using default settings");
            None
        }
    }
}

/// Search for config.toml in candidate directories. The first file found
/// wins, even if it turns out to be broken.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path).unwrap_or_default();
        }
    }
    TomlConfig::default()
}

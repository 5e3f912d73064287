/// Logging setup: tracing to a file.
///
/// The terminal belongs to the renderer, so logs never go to stdout.
///
/// ## Filter
///
/// 1. **`BEAT_CODE_LOG`** (highest priority): a bare level such as `debug`
///    applies to this crate only; anything with `=` or `,` is used verbatim.
/// 2. **`RUST_LOG`**: standard tracing filter.
/// 3. **Default**: `warn,beat_code=info`.
///
/// ## Log file
///
/// Default: `<data_local_dir>/beat-code/logs/beat-code-<pid>.log`.
/// Override with `--log-file <path>` or `BEAT_CODE_LOG_FILE`. A path with
/// an extension names the file; one without names the directory.

use std::env;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::error::{Error, Result};

const DEFAULT_FILTER: &str = "warn,beat_code=info";

/// Must be held for the lifetime of the program; dropping it flushes the
/// background writer.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

pub fn init(override_path: Option<PathBuf>) -> Result<LogGuard> {
    let override_path = override_path.or_else(|| env::var_os("BEAT_CODE_LOG_FILE").map(PathBuf::from));
    let (dir, filename) = resolve_log_path(override_path);

    std::fs::create_dir_all(&dir).map_err(|e| Error::Logging(format!("{}: {e}", dir.display())))?;

    let appender = tracing_appender::rolling::never(&dir, &filename);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(create_filter(env::var("BEAT_CODE_LOG").ok(), env::var("RUST_LOG").ok()));

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: dir.join(filename),
    })
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("beat-code-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir, name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beat-code")
        .join("logs");
    (dir, filename)
}

fn create_filter(crate_level: Option<String>, rust_log: Option<String>) -> EnvFilter {
    if let Some(level) = crate_level {
        if level.contains('=') || level.contains(',') {
            return EnvFilter::new(level);
        }
        return EnvFilter::new(format!("warn,beat_code={level}"));
    }
    if let Some(rust_log) = rust_log {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(DEFAULT_FILTER)
}

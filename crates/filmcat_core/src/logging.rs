//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start `flexi_logger` exactly once per process, to rotating files or stderr.
//! - Capture panics as sanitized log events.
//!
//! # Invariants
//! - Initialization never panics.
//! - Repeating initialization with an equal config is a no-op.
//! - Re-initialization with a different level or target is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "filmcat";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 8 * 1024 * 1024;
const MAX_LOG_FILES: usize = 4;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rotating files under an absolute directory.
    Directory(PathBuf),
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub target: LogTarget,
}

impl LoggingConfig {
    pub fn stderr(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            target: LogTarget::Stderr,
        }
    }

    pub fn directory(level: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            target: LogTarget::Directory(dir.into()),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Starts the process logger described by `config`.
///
/// # Errors
/// - Unsupported level names.
/// - Empty or relative log directories, or directories that cannot be created.
/// - A logger already running with a different level or target.
/// - Backend startup failures.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let level = normalize_level(&config.level)?;
    let target = normalize_target(&config.target)?;

    let state = match LOGGING_STATE.get() {
        Some(state) => state,
        None => LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?,
    };

    if state.target != target {
        return Err(format!(
            "logging already initialized to `{}`; refusing to switch to `{}`",
            state.target, target
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

/// Active `(level, target)`, or `None` before `init_logging` succeeded.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(level: &'static str, target: LogTarget) -> Result<LoggingState, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match &target {
        LogTarget::Stderr => logger.log_to_stderr().format(flexi_logger::default_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    let handle = logger
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();
    info!(
        "event=logging_init module=core status=ok level={level} target={target} version={}",
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        target,
        _logger: handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

fn normalize_target(target: &LogTarget) -> Result<LogTarget, String> {
    let LogTarget::Directory(dir) = target else {
        return Ok(LogTarget::Stderr);
    };
    if dir.as_os_str().is_empty() {
        return Err("log directory cannot be empty".to_string());
    }
    if !dir.is_absolute() {
        return Err(format!(
            "log directory must be an absolute path, got `{}`",
            dir.display()
        ));
    }
    Ok(LogTarget::Directory(Path::new(dir).to_path_buf()))
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens line breaks and caps the message at `max_chars` characters.
fn sanitize_message(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let mut truncated: String = flattened.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

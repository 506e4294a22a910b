//! Structured logging for scenekeeper
//!
//! Logging goes through `tracing`. One formatter writes to stderr and an
//! optional second one appends to a file; both use the same format.
//!
//! # Correlation Fields
//!
//! Spans and events use these field names:
//! - `persistent_id`: session identifier
//! - `display_id`: display the session lives on
//! - `window_type`, `state`: session classification and lifecycle state
//! - `opcode`: boundary transaction code
//! - `action`: property change action bits
//!
//! Operation results go through [`log_outcome`]: benign codes ("nothing to
//! do") land at `debug`, rejections at `warn` with their wire code.

use serde::{Deserialize, Serialize};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::types::PersistentId;

/// Configuration of the installed subscriber, set once.
static ACTIVE: OnceLock<LogConfig> = OnceLock::new();

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, ANSI colored on stderr.
    #[default]
    Pretty,
    /// One JSON object per event, span fields flattened in.
    Json,
}

impl LogFormat {
    const fn name(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Pretty, Self::Json]
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log format '{s}' (expected pretty or json)"))
    }
}

/// Severity threshold accepted in `[logging] level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [Self; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    const fn name(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("warning") {
            return Ok(Self::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}' (expected trace, debug, info, warn or error)"))
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
    /// Append-only log file, created owner-only.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("failed to create log file: {0}")]
    FileCreate(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

// =============================================================================
// Subscriber
// =============================================================================

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(writer)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .boxed(),
    }
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let fresh = !path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    #[cfg(unix)]
    if fresh {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = fresh;
    Ok(file)
}

/// Install the global subscriber. A second call fails with
/// [`LogError::AlreadyInitialized`].
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if ACTIVE.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let level: LogLevel = config
        .level
        .parse()
        .map_err(|_| LogError::InvalidLevel(config.level.clone()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.name()));

    let mut layers = vec![format_layer(config.format, io::stderr, true)];
    if let Some(path) = &config.file {
        let file = open_log_file(path)?;
        layers.push(format_layer(config.format, file, false));
    }
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers).with(filter))?;
    let _ = ACTIVE.set(config.clone());

    tracing::info!(
        log_level = %level,
        log_format = %config.format,
        log_file = ?config.file,
        "logging initialized"
    );
    Ok(())
}

/// Info span carrying session correlation fields.
///
/// ```ignore
/// let _span = scenekeeper_core::sk_span!("request_focus", persistent_id = 7, display_id = 0).entered();
/// ```
#[macro_export]
macro_rules! sk_span {
    ($name:expr $(, $field:ident = $value:expr)* $(,)?) => {
        tracing::info_span!($name $(, $field = $value)*)
    };
}

// =============================================================================
// Outcomes
// =============================================================================

/// An error code that crosses the boundary.
pub trait OutcomeCode: Copy + std::fmt::Display {
    fn wire_code(self) -> i32;
    fn is_benign(self) -> bool;
    fn needs_report(self) -> bool;
}

/// Log the result of `operation` on `persistent_id` at the level its code
/// deserves.
pub fn log_outcome<T, E: OutcomeCode>(
    operation: &'static str,
    persistent_id: PersistentId,
    result: &Result<T, E>,
) {
    match result {
        Ok(_) => tracing::trace!(operation, persistent_id, "ok"),
        Err(err) if err.is_benign() => {
            tracing::debug!(operation, persistent_id, code = err.wire_code(), "changed nothing");
        }
        Err(err) => tracing::warn!(
            operation,
            persistent_id,
            code = err.wire_code(),
            report = err.needs_report(),
            error = %err,
            "rejected"
        ),
    }
}

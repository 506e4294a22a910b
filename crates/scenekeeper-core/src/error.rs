//! Error types for scenekeeper-core
//!
//! Two layers live here:
//!
//! - The boundary taxonomies ([`WsError`], [`WmError`], [`TransactionError`]).
//!   These cross process boundaries as `i32` codes and their numeric values
//!   are stable. Success is `Ok(..)` on the Rust side and code `0` on the wire.
//! - The crate's infrastructure [`Error`] (configuration, transport, queue
//!   shutdown) with remediation hints for the CLI.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use thiserror::Error;

use crate::parcel::ParcelError;
use crate::wire::FrameError;

/// Codes in `[NEED_REPORT_BASE, NEED_REPORT_END)` are diagnostically
/// significant and may be reported by a telemetry layer.
pub const NEED_REPORT_BASE: i32 = 1000;
/// Upper (exclusive) bound of the needs-report band.
pub const NEED_REPORT_END: i32 = 1006;

/// Whether a raw wire code falls in the needs-report band.
#[must_use]
pub const fn in_need_report_band(code: i32) -> bool {
    code >= NEED_REPORT_BASE && code < NEED_REPORT_END
}

/// Wire code for success in both taxonomies.
pub const CODE_OK: i32 = 0;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a window-scene operation.
pub type WsResult<T = ()> = std::result::Result<T, WsError>;

/// Result of a legacy window-manager operation.
pub type WmResult<T = ()> = std::result::Result<T, WmError>;

/// Generates a code enum with stable numeric values, `code`/`from_code`
/// and a table of all variants.
macro_rules! wire_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[doc = $doc:literal])* $variant:ident = $code:literal => $msg:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[doc = $doc])* #[error($msg)] $variant, )*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Stable wire code.
            #[must_use]
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Inverse of [`Self::code`]. `0` (success) and unknown codes map to `None`.
            #[must_use]
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// True for codes in the needs-report band.
            #[must_use]
            pub const fn needs_report(self) -> bool {
                in_need_report_band(self.code())
            }

            /// Benign outcomes are legitimate "nothing to do" answers, not failures.
            #[must_use]
            pub const fn is_benign(self) -> bool {
                matches!(self, Self::DoNothing)
            }
        }

        impl $crate::logging::OutcomeCode for $name {
            fn wire_code(self) -> i32 {
                Self::code(self)
            }

            fn is_benign(self) -> bool {
                Self::is_benign(self)
            }

            fn needs_report(self) -> bool {
                Self::needs_report(self)
            }
        }
    };
}

wire_codes! {
    /// Window-scene error codes returned by session operations.
    pub enum WsError {
        /// The request was legal but changed nothing.
        DoNothing = 1 => "nothing to do",
        NoMem = 2 => "out of memory",
        DestroyedObject = 3 => "object already destroyed",
        InvalidWindow = 4 => "invalid window",
        InvalidWindowModeOrSize = 5 => "invalid window mode or size",
        InvalidOperation = 6 => "invalid operation",
        InvalidPermission = 7 => "caller lacks the required permission",
        NotSystemApp = 8 => "caller is not a system application",
        NoUiContent = 9 => "window has no ui content",
        InvalidSessionListener = 10 => "invalid session listener",
        /// Target session is unknown or in the wrong state.
        InvalidSession = 11 => "invalid session",
        UnclearableSession = 12 => "session cannot be cleared",
        InvalidDisplay = 13 => "invalid display",
        InvalidParent = 14 => "invalid parent session",
        InvalidOpInCurStatus = 15 => "operation invalid in current status",
        RepeatOperation = 16 => "operation repeated",
        /// A required object was absent.
        Nullptr = 1001 => "required object is null",
        InvalidType = 1002 => "invalid window type",
        InvalidParam = 1003 => "invalid parameter",
        Samgr = 1004 => "system ability manager failure",
        IpcFailed = 1005 => "ipc failed",
        StartAbilityFailed = 1007 => "start ability failed",
    }
}

wire_codes! {
    /// Legacy window-manager error codes.
    pub enum WmError {
        DoNothing = 1 => "nothing to do",
        NoMem = 2 => "out of memory",
        DestroyedObject = 3 => "object already destroyed",
        InvalidWindow = 4 => "invalid window",
        InvalidWindowModeOrSize = 5 => "invalid window mode or size",
        InvalidOperation = 6 => "invalid operation",
        InvalidPermission = 7 => "caller lacks the required permission",
        NotSystemApp = 8 => "caller is not a system application",
        NoRemoteAnimation = 9 => "no remote animation",
        InvalidDisplay = 10 => "invalid display",
        InvalidParent = 11 => "invalid parent window",
        InvalidOpInCurStatus = 12 => "operation invalid in current status",
        RepeatOperation = 13 => "operation repeated",
        InvalidSession = 14 => "invalid session",
        InvalidCalling = 15 => "invalid calling",
        SystemAbnormally = 16 => "system abnormally",
        DeviceNotSupport = 801 => "device not supported",
        Nullptr = 1001 => "required object is null",
        InvalidType = 1002 => "invalid window type",
        InvalidParam = 1003 => "invalid parameter",
        Samgr = 1004 => "system ability manager failure",
        IpcFailed = 1005 => "ipc failed",
        StartAbilityFailed = 1007 => "start ability failed",
        PipDestroyFailed = 1008 => "pip destroy failed",
        PipStateAbnormally = 1009 => "pip state abnormally",
        PipCreateFailed = 1010 => "pip create failed",
        PipInternalError = 1011 => "pip internal error",
        PipRepeatOperation = 1012 => "pip operation repeated",
    }
}

impl From<WsError> for WmError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::DoNothing => Self::DoNothing,
            WsError::NoMem => Self::NoMem,
            WsError::DestroyedObject => Self::DestroyedObject,
            WsError::InvalidWindow | WsError::NoUiContent => Self::InvalidWindow,
            WsError::InvalidWindowModeOrSize => Self::InvalidWindowModeOrSize,
            WsError::InvalidOperation | WsError::UnclearableSession => Self::InvalidOperation,
            WsError::InvalidPermission => Self::InvalidPermission,
            WsError::NotSystemApp => Self::NotSystemApp,
            WsError::InvalidSessionListener | WsError::InvalidSession => Self::InvalidSession,
            WsError::InvalidDisplay => Self::InvalidDisplay,
            WsError::InvalidParent => Self::InvalidParent,
            WsError::InvalidOpInCurStatus => Self::InvalidOpInCurStatus,
            WsError::RepeatOperation => Self::RepeatOperation,
            WsError::Nullptr => Self::Nullptr,
            WsError::InvalidType => Self::InvalidType,
            WsError::InvalidParam => Self::InvalidParam,
            WsError::Samgr => Self::Samgr,
            WsError::IpcFailed => Self::IpcFailed,
            WsError::StartAbilityFailed => Self::StartAbilityFailed,
        }
    }
}

/// Wire code of a window-scene result.
#[must_use]
pub fn ws_code<T>(result: &WsResult<T>) -> i32 {
    result.as_ref().map_or_else(|err| err.code(), |_| CODE_OK)
}

/// Wire code of a window-manager result.
#[must_use]
pub fn wm_code<T>(result: &WmResult<T>) -> i32 {
    result.as_ref().map_or_else(|err| err.code(), |_| CODE_OK)
}

/// Turn a wire code back into a window-scene result.
///
/// Unknown non-zero codes are reported as [`WsError::IpcFailed`].
#[must_use]
pub fn ws_result_from_code(code: i32) -> WsResult {
    if code == CODE_OK {
        return Ok(());
    }
    Err(WsError::from_code(code).unwrap_or(WsError::IpcFailed))
}

/// Turn a wire code back into a window-manager result.
#[must_use]
pub fn wm_result_from_code(code: i32) -> WmResult {
    if code == CODE_OK {
        return Ok(());
    }
    Err(WmError::from_code(code).unwrap_or(WmError::IpcFailed))
}

/// Transaction-level failures produced before any operation runs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionError {
    /// The interface descriptor token did not match.
    #[error("transaction failed: interface descriptor mismatch")]
    TransactionFailed,

    /// The request buffer could not be decoded.
    #[error("invalid data in request buffer")]
    InvalidData,

    /// The opcode is not in the dispatch table.
    #[error("unknown transaction code")]
    UnknownTransaction,
}

impl TransactionError {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::TransactionFailed => 1,
            Self::InvalidData => 2,
            Self::UnknownTransaction => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::TransactionFailed),
            2 => Some(Self::InvalidData),
            3 => Some(Self::UnknownTransaction),
            _ => None,
        }
    }
}

impl From<ParcelError> for TransactionError {
    fn from(_: ParcelError) -> Self {
        Self::InvalidData
    }
}

/// Remediation command for resolving an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Main error type for scenekeeper-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Primitive transport errors
    #[error("Parcel error: {0}")]
    Parcel(#[from] ParcelError),

    /// Frame codec errors
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Boundary decode failures
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Session operation failures surfaced through infrastructure paths
    #[error("Session error: {0}")]
    Session(#[from] WsError),

    /// The serial task queue is no longer accepting work
    #[error("Task queue is closed")]
    QueueClosed,

    /// A queued job was dropped before it produced a result
    #[error("Task '{0}' was dropped before completion")]
    TaskDropped(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Config(err) => Some(err.remediation()),
            Self::QueueClosed | Self::TaskDropped(_) => Some(
                Remediation::new("The session manager is shutting down. Restart it and retry.")
                    .alternative("Check the logs for a panic in a queued job."),
            ),
            Self::Frame(_) | Self::Transaction(_) => Some(
                Remediation::new("The peer sent a malformed request. Check client and server versions.")
                    .command("List opcodes", "sk opcodes"),
            ),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => {
                Remediation::new(format!("Config file not found: {path}. Verify the path and retry."))
                    .command("Check the default config", "sk check-config")
            }
            Self::ReadFailed(path, _) => {
                Remediation::new(format!("Config file {path} could not be read. Check permissions."))
            }
            Self::ParseFailed(_) | Self::SerializeFailed(_) => {
                Remediation::new("Fix the TOML syntax in the config file.")
                    .command("Validate", "sk check-config <path>")
            }
            Self::ValidationError(_) => {
                Remediation::new("A config value is out of range. Adjust it and retry.")
                    .command("Validate", "sk check-config <path>")
                    .alternative("Remove the offending key to fall back to its default.")
            }
        }
    }
}

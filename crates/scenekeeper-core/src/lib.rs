//! scenekeeper-core: session lifecycle and state core of a window scene manager
//!
//! Every window on a device is a scene session. This crate owns the table of
//! sessions, arbitrates which one holds focus on each display, drives the
//! lifecycle state machine and serves the request boundary that clients and
//! the scene board call into.
//!
//! # Architecture
//!
//! ```text
//! client proxy → Frame (leb128) → RemoteRequestDispatcher
//!                                         ↓
//!                                 SerialTaskQueue (one worker)
//!                                         ↓
//!                               SceneSessionManager
//!                 ┌───────────────┬───────┴───────┬──────────────┐
//!          SessionLifecycle   FocusArbiter   SceneSession     AgentRegistry
//!             Controller                       Registry       (listeners)
//! ```
//!
//! # Modules
//!
//! - `error`: `WSError`/`WMError` wire taxonomies and the crate error type
//! - `parcel`: typed, bounded marshalling buffer
//! - `types`: window types, modes, states and other wire enums
//! - `geometry`: rectangles and display bands
//! - `property`: `WindowSessionProperty` and the property-change action bitmask
//! - `session`: `SessionEntity` and its shared handle
//! - `registry`: the session table and id allocation
//! - `agent`: listener agents and the notifications they receive
//! - `focus`: per-display focus arbitration
//! - `lifecycle`: the lifecycle state machine
//! - `task_queue`: serial execution of mutating operations
//! - `manager`: the operation surface, with permission checks
//! - `opcode`: transaction codes
//! - `wire`: frame codec
//! - `dispatch`: server side of the boundary
//! - `proxy`: client side of the boundary
//! - `config`: configuration management
//! - `logging`: tracing setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod lifecycle;
pub mod logging;
pub mod manager;
pub mod opcode;
pub mod parcel;
pub mod property;
pub mod proxy;
pub mod registry;
pub mod session;
pub mod task_queue;
pub mod types;
pub mod wire;

pub use config::Config;
pub use error::{Error, Result, WmError, WmResult, WsError, WsResult};
pub use manager::{Caller, SceneSessionManager};
pub use property::{WindowSessionProperty, WsPropertyChangeAction};
pub use types::{PersistentId, SessionState, WindowType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

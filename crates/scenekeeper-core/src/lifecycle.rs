//! Session lifecycle: the transition table and the controller that applies
//! it together with its side effects (focus hand-off, dialog following,
//! teardown ordering, listener notification).
//!
//! ```text
//! DISCONNECT -> CONNECT -> FOREGROUND <-> ACTIVE <-> INACTIVE -> BACKGROUND -> END
//!      ^                       ^                                    |
//!      |                       +------------------------------------+
//!      +---- disconnect from any state except END
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agent::{AgentRegistry, WindowInfo, WindowUpdateType, WindowVisibilityInfo};
use crate::error::{WsError, WsResult};
use crate::focus::FocusArbiter;
use crate::property::WindowSessionProperty;
use crate::registry::SceneSessionRegistry;
use crate::session::{ConnectHandles, OnceDetach, SceneSession, SessionView};
use crate::types::{FocusChangeReason, PersistentId, SessionState, VisibilityState};

// =============================================================================
// Transition table
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOp {
    Connect,
    Reconnect,
    Foreground,
    Background,
    Activate,
    Deactivate,
    Disconnect,
    Destroy,
}

impl LifecycleOp {
    pub const ALL: [Self; 8] = [
        Self::Connect,
        Self::Reconnect,
        Self::Foreground,
        Self::Background,
        Self::Activate,
        Self::Deactivate,
        Self::Disconnect,
        Self::Destroy,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Reconnect => "reconnect",
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Disconnect => "disconnect",
            Self::Destroy => "destroy",
        }
    }
}

impl std::fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// State reached by applying `op` in `state`.
///
/// Pairs outside the table fail without a state change: operations on a
/// `DISCONNECT` or `END` session with `InvalidSession`, everything else with
/// `InvalidOperation`. Re-activating an active session, or deactivating one
/// that is not active, is `DoNothing`.
pub fn next_state(state: SessionState, op: LifecycleOp) -> WsResult<SessionState> {
    use SessionState as S;

    match (op, state) {
        (LifecycleOp::Connect | LifecycleOp::Reconnect, S::Disconnect) => Ok(S::Connect),
        (LifecycleOp::Connect | LifecycleOp::Reconnect, S::End) => Err(WsError::InvalidSession),
        (LifecycleOp::Connect | LifecycleOp::Reconnect, _) => Err(WsError::InvalidOperation),

        (LifecycleOp::Disconnect, S::End) => Err(WsError::InvalidSession),
        (LifecycleOp::Disconnect, _) => Ok(S::Disconnect),

        (LifecycleOp::Destroy, S::End) => Err(WsError::InvalidSession),
        (LifecycleOp::Destroy, _) => Ok(S::End),

        (_, S::Disconnect | S::End) => Err(WsError::InvalidSession),

        (LifecycleOp::Foreground, S::Connect | S::Background | S::Inactive) => Ok(S::Foreground),
        (LifecycleOp::Background, S::Foreground | S::Active | S::Inactive) => Ok(S::Background),
        (LifecycleOp::Activate, S::Foreground | S::Inactive) => Ok(S::Active),
        (LifecycleOp::Activate, S::Active) => Err(WsError::DoNothing),
        (LifecycleOp::Deactivate, S::Active) => Ok(S::Inactive),
        (LifecycleOp::Deactivate, S::Foreground | S::Inactive) => Err(WsError::DoNothing),

        _ => Err(WsError::InvalidOperation),
    }
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Debug)]
pub struct SessionLifecycleController {
    registry: Arc<SceneSessionRegistry>,
    focus: Arc<FocusArbiter>,
    agents: Arc<AgentRegistry>,
    auto_focus_on_foreground: bool,
}

impl SessionLifecycleController {
    #[must_use]
    pub fn new(
        registry: Arc<SceneSessionRegistry>,
        focus: Arc<FocusArbiter>,
        agents: Arc<AgentRegistry>,
        auto_focus_on_foreground: bool,
    ) -> Self {
        Self {
            registry,
            focus,
            agents,
            auto_focus_on_foreground,
        }
    }

    fn session(&self, id: PersistentId) -> WsResult<SceneSession> {
        self.registry.get(id).ok_or(WsError::Nullptr)
    }

    pub fn connect(
        &self,
        id: PersistentId,
        handles: ConnectHandles,
        caller_pid: u32,
    ) -> WsResult<SessionState> {
        let session = self.session(id)?;
        let (state, view) = {
            let mut entity = session.lock();
            let state = entity.connect(handles, caller_pid)?;
            (state, entity.view())
        };
        tracing::debug!(persistent_id = id, pid = caller_pid, "session connected");
        self.agents
            .notify_window_update(&[WindowInfo::from(&view)], WindowUpdateType::Added);
        Ok(state)
    }

    /// Recovery path: reconnect a `DISCONNECT` session with its persisted
    /// property.
    pub fn reconnect(
        &self,
        id: PersistentId,
        persisted: &WindowSessionProperty,
        handles: ConnectHandles,
        caller_pid: u32,
    ) -> WsResult<SessionState> {
        let session = self.session(id)?;
        let (state, view) = {
            let mut entity = session.lock();
            let state = entity.reconnect(persisted, handles, caller_pid)?;
            (state, entity.view())
        };
        tracing::info!(persistent_id = id, pid = caller_pid, "session reconnected");
        self.agents
            .notify_window_update(&[WindowInfo::from(&view)], WindowUpdateType::Added);
        Ok(state)
    }

    /// Bring `id` to the foreground. Its dialogs follow; focus is requested
    /// when auto-focus is enabled.
    pub fn foreground(&self, id: PersistentId) -> WsResult<SessionState> {
        let session = self.session(id)?;
        let (state, dialogs) = {
            let mut entity = session.lock();
            let state = entity.apply(LifecycleOp::Foreground)?;
            entity.set_visibility(VisibilityState::NoOcclusion);
            (state, entity.dialogs().to_vec())
        };
        tracing::debug!(persistent_id = id, state = %state, "session foreground");

        let mut changed = vec![session.view()];
        for dialog in dialogs {
            if let Some(view) = self.follow(dialog, LifecycleOp::Foreground) {
                changed.push(view);
            }
        }
        self.notify_visibility(&changed);

        if self.auto_focus_on_foreground {
            match self
                .focus
                .request_session_focus(id, true, FocusChangeReason::Foreground)
            {
                Ok(()) | Err(WsError::DoNothing) => {}
                Err(err) => {
                    tracing::debug!(persistent_id = id, code = err.code(), "auto focus skipped");
                }
            }
        }
        Ok(state)
    }

    /// Send `id` to the background, handing its focus off first.
    pub fn background(&self, id: PersistentId) -> WsResult<SessionState> {
        let session = self.session(id)?;
        next_state(session.state(), LifecycleOp::Background)?;
        self.focus.release_focus(id, FocusChangeReason::Background);

        let (state, dialogs) = {
            let mut entity = session.lock();
            let state = entity.apply(LifecycleOp::Background)?;
            entity.set_visibility(VisibilityState::TotalOcclusion);
            (state, entity.dialogs().to_vec())
        };
        tracing::debug!(persistent_id = id, state = %state, "session background");

        let mut changed = vec![session.view()];
        for dialog in dialogs {
            self.focus.release_focus(dialog, FocusChangeReason::Background);
            if let Some(view) = self.follow(dialog, LifecycleOp::Background) {
                changed.push(view);
            }
        }
        self.notify_visibility(&changed);
        Ok(state)
    }

    /// Apply `op` to a dependent session, ignoring children that cannot make
    /// the move.
    fn follow(&self, id: PersistentId, op: LifecycleOp) -> Option<SessionView> {
        let session = self.registry.get(id)?;
        let mut entity = session.lock();
        match entity.apply(op) {
            Ok(_) => {
                entity.set_visibility(if op == LifecycleOp::Foreground {
                    VisibilityState::NoOcclusion
                } else {
                    VisibilityState::TotalOcclusion
                });
                Some(entity.view())
            }
            Err(err) => {
                tracing::debug!(persistent_id = id, op = %op, code = err.code(), "dependent session did not follow");
                None
            }
        }
    }

    pub fn set_active(&self, id: PersistentId, active: bool) -> WsResult<SessionState> {
        let session = self.session(id)?;
        let op = if active {
            LifecycleOp::Activate
        } else {
            LifecycleOp::Deactivate
        };
        let state = session.lock().apply(op)?;
        tracing::debug!(persistent_id = id, state = %state, "session activity changed");
        Ok(state)
    }

    /// Drop the client connection. Idempotent on an already disconnected
    /// session.
    pub fn disconnect(&self, id: PersistentId) -> WsResult<SessionState> {
        let session = self.session(id)?;
        next_state(session.state(), LifecycleOp::Disconnect)?;
        self.focus
            .release_focus(id, FocusChangeReason::SessionDestroyed);
        let mut entity = session.lock();
        let state = entity.apply(LifecycleOp::Disconnect)?;
        entity.set_visibility(VisibilityState::TotalOcclusion);
        drop(entity);
        tracing::debug!(persistent_id = id, "session disconnected");
        Ok(state)
    }

    /// Tear `id` down: children first, then focus, back-references, state,
    /// property, detach callback, listeners, and finally the registry entry.
    pub fn destroy(&self, id: PersistentId) -> WsResult {
        let session = self.session(id)?;
        {
            let mut entity = session.lock();
            if entity.state() == SessionState::End {
                return Err(WsError::InvalidSession);
            }
            entity.begin_transition()?;
        }

        let children = session.lock().children();
        for child in children {
            match self.destroy(child) {
                Ok(()) | Err(WsError::Nullptr) => {}
                Err(err) => {
                    tracing::warn!(persistent_id = id, child, code = err.code(), "child teardown failed");
                }
            }
        }

        self.focus
            .release_focus(id, FocusChangeReason::SessionDestroyed);
        let cleared = self.registry.clear_references_to(id);

        let (view, detach) = {
            let mut entity = session.lock();
            let view = entity.view();
            if let Err(err) = entity.apply(LifecycleOp::Destroy) {
                entity.end_transition();
                return Err(err);
            }
            entity.release_property();
            entity.end_transition();
            (view, entity.take_detach_callback())
        };

        if let Some(detach) = detach {
            detach.fire(id);
        }
        self.agents
            .notify_window_update(&[WindowInfo::from(&view)], WindowUpdateType::Removed);
        self.registry.remove(id);
        tracing::info!(persistent_id = id, cleared, "session destroyed");
        Ok(())
    }

    /// Destroy with a one-shot completion callback.
    pub fn destroy_with_detach(&self, id: PersistentId, detach: OnceDetach) -> WsResult {
        self.session(id)?.lock().set_detach_callback(detach);
        self.destroy(id)
    }

    fn notify_visibility(&self, views: &[SessionView]) {
        let infos: Vec<WindowVisibilityInfo> = views.iter().map(WindowVisibilityInfo::from).collect();
        self.agents.notify_visibility_changed(&infos);
    }
}

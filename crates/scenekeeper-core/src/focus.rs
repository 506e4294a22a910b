//! Focus arbitration.
//!
//! The arbiter keeps one focus holder per display and decides whether a
//! request may move it. Rules, in the order they are applied to a request:
//!
//! 1. the target must exist and not already hold focus;
//! 2. the target must be focusable, of a focus-eligible type, visible in the
//!    foreground and not force-hidden;
//! 3. a foreground-visible session flagged `blocking_focus` above the target
//!    on the same display denies the request;
//! 4. a topmost main window holding focus is only displaced by another
//!    topmost window or by one of its own children;
//! 5. a main or sub window with a live dialog defers to the dialog.
//!
//! Focus state is only mutated from the serial task queue, so two requests
//! never interleave: whichever was submitted last wins.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agent::{AgentRegistry, FocusChangeInfo};
use crate::error::{WsError, WsResult};
use crate::registry::SceneSessionRegistry;
use crate::session::{SceneSession, SessionView};
use crate::types::{DisplayId, FocusChangeReason, INVALID_SESSION_ID, PersistentId};

/// Outcome of looking for the session that inherits focus from a holder.
#[derive(Debug, Clone, PartialEq)]
enum Succession {
    Next(SessionView),
    Nobody,
    /// An ineligible blocker sits between the holder and every candidate.
    Blocked(PersistentId),
}

#[derive(Debug)]
pub struct FocusArbiter {
    registry: Arc<SceneSessionRegistry>,
    agents: Arc<AgentRegistry>,
    focused: Mutex<BTreeMap<DisplayId, PersistentId>>,
}

impl FocusArbiter {
    #[must_use]
    pub fn new(registry: Arc<SceneSessionRegistry>, agents: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            agents,
            focused: Mutex::new(BTreeMap::new()),
        }
    }

    /// Focus holder of the default display, `0` when nothing is focused.
    #[must_use]
    pub fn focused_session_id(&self) -> PersistentId {
        self.focused_on(crate::types::DEFAULT_DISPLAY_ID)
    }

    #[must_use]
    pub fn focused_on(&self, display_id: DisplayId) -> PersistentId {
        self.focused
            .lock()
            .get(&display_id)
            .copied()
            .unwrap_or(INVALID_SESSION_ID)
    }

    /// Every display's current holder.
    #[must_use]
    pub fn focused_sessions(&self) -> BTreeMap<DisplayId, PersistentId> {
        self.focused.lock().clone()
    }

    fn holder_view(&self, display_id: DisplayId) -> Option<SessionView> {
        self.registry
            .get(self.focused_on(display_id))
            .map(|session| session.view())
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Resolve `id` and reject no-op requests.
    pub fn request_focus_basic_check(&self, id: PersistentId) -> WsResult<SceneSession> {
        let session = self.registry.get(id).ok_or(WsError::InvalidSession)?;
        let display_id = session.lock().display_id();
        if self.focused_on(display_id) == id {
            return Err(WsError::DoNothing);
        }
        Ok(session)
    }

    /// Whether `focused` keeps `requesting` from taking focus: it is an active
    /// blocker stacked above the requester. Main windows only count when
    /// `including_app` is set.
    #[must_use]
    pub fn check_focus_is_down_through_blocking_type(
        requesting: &SessionView,
        focused: &SessionView,
        including_app: bool,
    ) -> bool {
        if !including_app && focused.window_type.is_main_window() {
            return false;
        }
        focused.is_active_blocker() && focused.z_order > requesting.z_order
    }

    /// Whether a topmost main window holding focus refuses to yield to
    /// `candidate`. Its own children and other topmost windows may still take
    /// focus.
    #[must_use]
    pub fn check_topmost_window_focus(focused: &SessionView, candidate: &SessionView) -> bool {
        focused.window_type.is_main_window()
            && focused.topmost
            && !candidate.topmost
            && candidate.parent_id != focused.persistent_id
    }

    /// Whether one of `view`'s dialogs already holds focus, in which case a
    /// request for `view` itself is satisfied by the dialog.
    #[must_use]
    pub fn check_request_focus_immediately(&self, view: &SessionView) -> bool {
        if !view.window_type.is_main_window() && !view.window_type.is_sub_window() {
            return false;
        }
        let holder = self.focused_on(view.display_id);
        holder != INVALID_SESSION_ID && view.dialogs.contains(&holder)
    }

    /// Nearest active blocker strictly above `z_order` on `display_id`.
    #[must_use]
    pub fn get_top_nearest_blocking_focus_session(
        &self,
        display_id: DisplayId,
        z_order: u32,
        including_app: bool,
    ) -> Option<SessionView> {
        self.registry
            .views_where(|view| {
                view.display_id == display_id
                    && view.z_order > z_order
                    && view.is_active_blocker()
                    && (including_app || !view.window_type.is_main_window())
            })
            .into_iter()
            .min_by(|a, b| {
                a.z_order
                    .cmp(&b.z_order)
                    .then(b.persistent_id.cmp(&a.persistent_id))
            })
    }

    /// First focus-eligible session stacked below `persistent_id` on the same
    /// display.
    #[must_use]
    pub fn get_next_focusable_session(&self, persistent_id: PersistentId) -> Option<SessionView> {
        let anchor = self.registry.get(persistent_id)?.view();
        self.stacked_below(&anchor, INVALID_SESSION_ID)
            .into_iter()
            .find(|view| view.focus_eligible)
    }

    /// Sessions on `anchor`'s display below it, highest first. Equal z-orders
    /// stack the later-created session on top.
    fn stacked_below(&self, anchor: &SessionView, exclude: PersistentId) -> Vec<SessionView> {
        let mut views = self.registry.views_where(|view| {
            view.display_id == anchor.display_id
                && view.persistent_id != anchor.persistent_id
                && view.persistent_id != exclude
                && (view.z_order, view.persistent_id) < (anchor.z_order, anchor.persistent_id)
        });
        views.sort_by(|a, b| {
            b.z_order
                .cmp(&a.z_order)
                .then(b.persistent_id.cmp(&a.persistent_id))
        });
        views
    }

    fn succession(&self, holder: &SessionView, exclude: PersistentId) -> Succession {
        let owned = holder.window_type.is_dialog() || holder.window_type.is_sub_window();
        if owned && holder.parent_id != exclude {
            if let Some(parent) = self.registry.get(holder.parent_id).map(|s| s.view()) {
                if parent.focus_eligible {
                    return Succession::Next(parent);
                }
            }
        }
        for view in self.stacked_below(holder, exclude) {
            if view.focus_eligible {
                return Succession::Next(view);
            }
            if view.is_active_blocker() {
                return Succession::Blocked(view.persistent_id);
            }
        }
        Succession::Nobody
    }

    fn dialog_target(&self, view: &SessionView) -> Option<SessionView> {
        view.dialogs
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .map(|session| session.view())
            .filter(|dialog| dialog.focus_eligible)
            .max_by(|a, b| {
                a.z_order
                    .cmp(&b.z_order)
                    .then(a.persistent_id.cmp(&b.persistent_id))
            })
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Try to move focus to `id`. `by_foreground` marks requests raised by a
    /// foreground transition, which honor the session's focusable-on-show
    /// flag.
    pub fn request_session_focus(
        &self,
        id: PersistentId,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> WsResult {
        let session = self.request_focus_basic_check(id)?;
        let view = session.view();
        if !view.focus_eligible {
            tracing::debug!(persistent_id = id, "focus request for ineligible session");
            return Err(WsError::DoNothing);
        }
        if by_foreground && !view.focusable_on_show {
            tracing::debug!(persistent_id = id, "session is not focusable on show");
            return Err(WsError::DoNothing);
        }
        if let Some(blocker) =
            self.get_top_nearest_blocking_focus_session(view.display_id, view.z_order, true)
        {
            tracing::debug!(
                persistent_id = id,
                blocker = blocker.persistent_id,
                "focus request is below a blocking session"
            );
            return Err(WsError::DoNothing);
        }
        if let Some(holder) = self.holder_view(view.display_id) {
            if Self::check_topmost_window_focus(&holder, &view) {
                tracing::debug!(
                    persistent_id = id,
                    holder = holder.persistent_id,
                    "topmost window keeps focus"
                );
                return Err(WsError::DoNothing);
            }
        }
        if self.check_request_focus_immediately(&view) {
            tracing::debug!(persistent_id = id, "dialog of the session already holds focus");
            return Err(WsError::DoNothing);
        }
        let target = self.dialog_target(&view).unwrap_or(view);
        self.shift_focus(target.display_id, Some(&target), reason);
        Ok(())
    }

    /// Give up focus held by `id` (or by a dialog or sub window of `id`),
    /// handing it to the next eligible session.
    pub fn request_session_unfocus(&self, id: PersistentId, reason: FocusChangeReason) -> WsResult {
        let session = self.registry.get(id).ok_or(WsError::InvalidSession)?;
        let display_id = session.lock().display_id();
        let holder = self.holder_view(display_id).ok_or(WsError::InvalidSession)?;
        if holder.persistent_id != id && holder.parent_id != id {
            tracing::debug!(
                persistent_id = id,
                holder = holder.persistent_id,
                "unfocus request from a session that does not hold focus"
            );
            return Err(WsError::InvalidSession);
        }
        match self.succession(&holder, id) {
            Succession::Next(next) => {
                self.shift_focus(display_id, Some(&next), reason);
                Ok(())
            }
            Succession::Nobody => {
                self.shift_focus(display_id, None, reason);
                Ok(())
            }
            Succession::Blocked(blocker) => {
                tracing::debug!(persistent_id = id, blocker, "focus cannot pass a blocking session");
                Err(WsError::DoNothing)
            }
        }
    }

    /// Unconditional release used when `id` leaves the foreground or goes
    /// away. A no-op when `id` holds no focus.
    pub fn release_focus(&self, id: PersistentId, reason: FocusChangeReason) {
        let Some(display_id) = self.display_held_by(id) else {
            return;
        };
        let next = self
            .registry
            .get(id)
            .map(|session| session.view())
            .map(|holder| self.succession(&holder, id));
        match next {
            Some(Succession::Next(next)) => self.shift_focus(display_id, Some(&next), reason),
            _ => self.shift_focus(display_id, None, reason),
        }
    }

    fn display_held_by(&self, id: PersistentId) -> Option<DisplayId> {
        self.focused
            .lock()
            .iter()
            .find(|(_, holder)| **holder == id)
            .map(|(display_id, _)| *display_id)
    }

    /// Swap the holder of `display_id`. Entity flags and the holder map are
    /// updated before listeners hear about it.
    fn shift_focus(
        &self,
        display_id: DisplayId,
        next: Option<&SessionView>,
        reason: FocusChangeReason,
    ) {
        let next_id = next.map_or(INVALID_SESSION_ID, |view| view.persistent_id);
        let previous = {
            let mut focused = self.focused.lock();
            if next_id == INVALID_SESSION_ID {
                focused.remove(&display_id)
            } else {
                focused.insert(display_id, next_id)
            }
        };
        let previous = previous
            .filter(|id| *id != next_id)
            .and_then(|id| self.registry.get(id));
        if let Some(old) = previous.as_ref() {
            old.lock().set_focused(false);
        }
        if let Some(new) = next.and_then(|view| self.registry.get(view.persistent_id)) {
            new.lock().set_focused(true);
        }

        tracing::info!(
            display_id,
            from = previous.as_ref().map_or(INVALID_SESSION_ID, SceneSession::persistent_id),
            to = next_id,
            reason = %reason,
            "focus changed"
        );
        if let Some(old) = previous {
            let view = old.view();
            self.agents
                .notify_focus_changed(&focus_change_info(&view, reason), false);
        }
        if let Some(view) = next {
            self.agents
                .notify_focus_changed(&focus_change_info(view, reason), true);
        }
    }
}

fn focus_change_info(view: &SessionView, reason: FocusChangeReason) -> FocusChangeInfo {
    FocusChangeInfo {
        persistent_id: view.persistent_id,
        display_id: view.display_id,
        window_type: view.window_type,
        pid: view.caller_pid,
        reason,
    }
}

//! Scene session manager: the owned context behind every boundary operation.
//!
//! Holds the registry, focus arbiter, listener registry, lifecycle
//! controller, configuration and the recovery alive-list. Mutating methods
//! are synchronous and expected to run on the serial task queue; queries
//! may run anywhere.
//!
//! Permission gates run before any session state is read.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::agent::{
    AgentId, AgentRegistry, FocusChangeInfo, WindowInfo, WindowManagerAgent,
    WindowManagerAgentType, WindowUpdateType, WindowVisibilityInfo,
};
use crate::config::Config;
use crate::error::{WmError, WmResult, WsError, WsResult};
use crate::focus::FocusArbiter;
use crate::lifecycle::SessionLifecycleController;
use crate::logging::log_outcome;
use crate::property::{
    SessionInfo, SessionPropertyChangeCallback, WindowSessionProperty, WsPropertyChangeAction,
    handler_for,
};
use crate::registry::SceneSessionRegistry;
use crate::session::{ConnectHandles, DetachCallback, OnceDetach, SceneSession, SessionView};
use crate::types::{
    DisplayId, FocusChangeReason, ForceHideState, INVALID_SESSION_ID, PersistentId, SessionState,
    VisibilityState, WindowAnimation, WindowType, window_flag,
};

/// Permission for floating system windows.
pub const PERMISSION_SYSTEM_FLOAT_WINDOW: &str = "system_float_window";
/// Permission for privacy-mode windows.
pub const PERMISSION_PRIVACY_WINDOW: &str = "privacy_window";

/// Identity of the process behind a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub pid: u32,
    pub is_system: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Caller {
    #[must_use]
    pub fn app(pid: u32) -> Self {
        Self {
            pid,
            is_system: false,
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn system(pid: u32) -> Self {
        Self {
            pid,
            is_system: true,
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Actions only system callers may change.
const SYSTEM_ONLY_ACTIONS: WsPropertyChangeAction = WsPropertyChangeAction::from_bits_truncate(
    WsPropertyChangeAction::TURN_SCREEN_ON.bits()
        | WsPropertyChangeAction::SNAPSHOT_SKIP.bits()
        | WsPropertyChangeAction::HIDE_NON_SYSTEM_FLOATING_WINDOWS.bits()
        | WsPropertyChangeAction::TOPMOST.bits()
        | WsPropertyChangeAction::MAIN_WINDOW_TOPMOST.bits()
        | WsPropertyChangeAction::DECOR_ENABLE.bits()
        | WsPropertyChangeAction::DRAGENABLED.bits()
        | WsPropertyChangeAction::RAISEENABLED.bits()
        | WsPropertyChangeAction::MODE_SUPPORT_INFO.bits(),
);

const SYSTEM_BAR_ACTIONS: WsPropertyChangeAction = WsPropertyChangeAction::from_bits_truncate(
    WsPropertyChangeAction::OTHER_PROPS.bits()
        | WsPropertyChangeAction::STATUS_PROPS.bits()
        | WsPropertyChangeAction::NAVIGATION_PROPS.bits()
        | WsPropertyChangeAction::NAVIGATION_INDICATOR_PROPS.bits(),
);

#[derive(Debug)]
pub struct SceneSessionManager {
    config: Config,
    registry: Arc<SceneSessionRegistry>,
    agents: Arc<AgentRegistry>,
    focus: Arc<FocusArbiter>,
    lifecycle: SessionLifecycleController,
    alive_ids: Mutex<BTreeSet<PersistentId>>,
}

impl SceneSessionManager {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(SceneSessionRegistry::new(config.registry.policy()));
        let agents = Arc::new(AgentRegistry::new());
        let focus = Arc::new(FocusArbiter::new(registry.clone(), agents.clone()));
        let lifecycle = SessionLifecycleController::new(
            registry.clone(),
            focus.clone(),
            agents.clone(),
            config.focus.auto_focus_on_foreground,
        );
        Self {
            config,
            registry,
            agents,
            focus,
            lifecycle,
            alive_ids: Mutex::new(BTreeSet::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SceneSessionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn focus(&self) -> &Arc<FocusArbiter> {
        &self.focus
    }

    #[must_use]
    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    #[must_use]
    pub fn lifecycle(&self) -> &SessionLifecycleController {
        &self.lifecycle
    }

    /// Focus holder of the configured default display.
    #[must_use]
    pub fn focused_session_id(&self) -> PersistentId {
        self.focus.focused_on(self.config.focus.default_display_id)
    }

    fn session(&self, id: PersistentId) -> WsResult<SceneSession> {
        self.registry.get(id).ok_or(WsError::InvalidSession)
    }

    // =========================================================================
    // Creation and teardown
    // =========================================================================

    fn check_create_permission(caller: &Caller, window_type: WindowType) -> WsResult {
        if window_type.requires_system_caller() && !caller.is_system {
            return Err(WsError::NotSystemApp);
        }
        if window_type.requires_float_permission()
            && !caller.is_system
            && !caller.has_permission(PERMISSION_SYSTEM_FLOAT_WINDOW)
        {
            return Err(WsError::InvalidPermission);
        }
        Ok(())
    }

    /// Parent a new child must attach to, if any.
    fn resolve_parent(&self, property: &WindowSessionProperty) -> WsResult<Option<SceneSession>> {
        let window_type = property.window_type();
        let parent_id = property.parent_persistent_id();
        if parent_id == INVALID_SESSION_ID {
            if window_type.is_sub_window() {
                return Err(WsError::InvalidParent);
            }
            return Ok(None);
        }
        self.registry.get(parent_id).map(Some).ok_or(WsError::InvalidParent)
    }

    /// Create, register and connect a sub-window, dialog or system window.
    pub fn create_and_connect_specific_session(
        &self,
        caller: &Caller,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> WsResult<(PersistentId, SceneSession)> {
        let window_type = property.window_type();
        if let Err(err) = Self::check_create_permission(caller, window_type) {
            tracing::warn!(pid = caller.pid, window_type = %window_type, code = err.code(), "create rejected");
            return Err(err);
        }
        let parent = self.resolve_parent(property)?;

        let mut info = property.session_info().clone();
        info.caller_token = token;
        info.is_system = caller.is_system;
        let session = self.registry.create_scene_session(info, Some(property));
        self.attach(&session, caller, handles, parent.as_ref())?;
        Ok((session.persistent_id(), session))
    }

    /// Connect a freshly registered session and link it into its parent.
    /// On connect failure the registry entry is dropped again.
    fn attach(
        &self,
        session: &SceneSession,
        caller: &Caller,
        handles: ConnectHandles,
        parent: Option<&SceneSession>,
    ) -> WsResult {
        let id = session.persistent_id();
        if let Err(err) = self.lifecycle.connect(id, handles, caller.pid) {
            self.registry.remove(id);
            return Err(err);
        }

        let (window_type, display_id) = {
            let entity = session.lock();
            (entity.window_type(), entity.display_id())
        };
        if matches!(window_type, WindowType::KeyboardPanel | WindowType::InputMethodFloat) {
            let calling = self.focus.focused_on(display_id);
            if let Some(property) = session.lock().property_mut() {
                if property.calling_session_id() == INVALID_SESSION_ID {
                    property.set_calling_session_id(calling);
                }
            }
        }

        let Some(parent) = parent else {
            tracing::info!(persistent_id = id, window_type = %window_type, "specific session created");
            return Ok(());
        };
        {
            let mut parent_entity = parent.lock();
            if window_type.is_dialog() {
                parent_entity.add_dialog(id);
            } else if window_type.is_toast() {
                parent_entity.add_toast(id);
            } else {
                parent_entity.add_sub_window(id);
            }
        }
        session.lock().set_parent_id(parent.persistent_id());
        tracing::info!(
            persistent_id = id,
            parent = parent.persistent_id(),
            window_type = %window_type,
            "specific session created"
        );

        if parent.state().is_foreground() {
            self.lifecycle.foreground(id)?;
        }
        Ok(())
    }

    fn check_owner(&self, caller: &Caller, session: &SceneSession) -> WsResult {
        if caller.is_system || session.lock().caller_pid() == caller.pid {
            return Ok(());
        }
        tracing::warn!(
            pid = caller.pid,
            persistent_id = session.persistent_id(),
            "caller does not own the session"
        );
        Err(WsError::InvalidPermission)
    }

    pub fn destroy_and_disconnect_specific_session(
        &self,
        caller: &Caller,
        id: PersistentId,
    ) -> WsResult {
        let session = self.registry.get(id).ok_or(WsError::Nullptr)?;
        self.check_owner(caller, &session)?;
        self.lifecycle.destroy(id)
    }

    /// Destroy with a completion callback invoked exactly once. The returned
    /// [`OnceDetach`] lets the transport disarm it when the callback's owner
    /// dies first.
    pub fn destroy_and_disconnect_specific_session_with_detach_callback(
        &self,
        caller: &Caller,
        id: PersistentId,
        callback: Arc<dyn DetachCallback>,
    ) -> WsResult<OnceDetach> {
        let session = self.registry.get(id).ok_or(WsError::Nullptr)?;
        self.check_owner(caller, &session)?;
        let detach = OnceDetach::new(callback);
        self.lifecycle.destroy_with_detach(id, detach.clone())?;
        Ok(detach)
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn request_focus_status(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> WsResult {
        let _span = crate::sk_span!(
            "request_focus_status",
            persistent_id = id,
            is_focused = is_focused
        )
        .entered();
        let result = if is_focused {
            self.focus.request_session_focus(id, by_foreground, reason)
        } else {
            self.focus.request_session_unfocus(id, reason)
        };
        log_outcome("request_focus_status", id, &result);
        result
    }

    /// Trusted variant for system abilities.
    pub fn request_focus_status_by_sa(
        &self,
        caller: &Caller,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> WmResult {
        if !caller.is_system {
            tracing::warn!(pid = caller.pid, persistent_id = id, "focus by sa from non-system caller");
            return Err(WmError::NotSystemApp);
        }
        self.request_focus_status(id, is_focused, by_foreground, reason)
            .map_err(WmError::from)
    }

    /// Variant raised by the scene board. The boundary posts it without
    /// waiting for the outcome.
    pub fn request_focus_status_by_scb(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> WsResult {
        self.request_focus_status(id, is_focused, by_foreground, reason)
    }

    /// Client form: a window asks for (or gives up) its own focus.
    pub fn request_focus(&self, caller: &Caller, id: PersistentId, is_focused: bool) -> WmResult {
        let session = self.session(id).map_err(WmError::from)?;
        self.check_owner(caller, &session).map_err(WmError::from)?;
        self.request_focus_status(id, is_focused, false, FocusChangeReason::ClientRequest)
            .map_err(WmError::from)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn check_action_permission(
        caller: &Caller,
        property: &WindowSessionProperty,
        action: WsPropertyChangeAction,
    ) -> WmResult {
        let privacy = WsPropertyChangeAction::PRIVACY_MODE | WsPropertyChangeAction::SYSTEM_PRIVACY_MODE;
        if privacy.contains(action)
            && !caller.is_system
            && !caller.has_permission(PERMISSION_PRIVACY_WINDOW)
        {
            return Err(WmError::InvalidPermission);
        }
        if caller.is_system {
            return Ok(());
        }
        if SYSTEM_ONLY_ACTIONS.contains(action) {
            return Err(WmError::NotSystemApp);
        }
        if action == WsPropertyChangeAction::ANIMATION_FLAG
            && property.animation_flag() == WindowAnimation::Custom
        {
            return Err(WmError::NotSystemApp);
        }
        Ok(())
    }

    /// Apply one action bit's fields from `property` to session `id`.
    pub fn update_session_property_by_action(
        &self,
        caller: &Caller,
        id: PersistentId,
        property: &WindowSessionProperty,
        action: WsPropertyChangeAction,
    ) -> WmResult {
        if handler_for(action).is_none() {
            return Err(WmError::InvalidParam);
        }
        if let Err(err) = Self::check_action_permission(caller, property, action) {
            tracing::warn!(pid = caller.pid, persistent_id = id, action = %action, code = err.code(), "property update rejected");
            return Err(err);
        }
        let session = self.registry.get(id).ok_or(WmError::Nullptr)?;

        let (water_mark_changed, focusable_lost, view) = {
            let mut entity = session.lock();
            let was_focused = entity.is_focused();
            let Some(current) = entity.property_mut() else {
                return Err(WmError::Nullptr);
            };
            let had_water_mark = current.has_window_flag(window_flag::WATER_MARK);
            let wants_water_mark = property.has_window_flag(window_flag::WATER_MARK);
            let water_mark_changed =
                action == WsPropertyChangeAction::FLAGS && had_water_mark != wants_water_mark;
            if water_mark_changed && !caller.is_system {
                return Err(WmError::NotSystemApp);
            }
            current.copy_action(property, action);
            let focusable_lost =
                action == WsPropertyChangeAction::FOCUSABLE && !current.focusable() && was_focused;
            (water_mark_changed, focusable_lost, entity.view())
        };
        tracing::debug!(persistent_id = id, action = %action, "property updated");

        if focusable_lost {
            self.focus.release_focus(id, FocusChangeReason::Default);
        }
        if water_mark_changed {
            self.agents
                .notify_water_mark_flag_changed(self.any_water_mark());
        }
        if SYSTEM_BAR_ACTIONS.contains(action) {
            if let Some(bars) = session.lock().property().map(|p| p.system_bar_properties().clone()) {
                self.agents.notify_system_bar_changed(view.display_id, &bars);
            }
        }
        self.agents.notify_property_changed(id, action);
        self.agents
            .notify_window_update(&[WindowInfo::from(&view)], WindowUpdateType::Property);
        Ok(())
    }

    /// Install the hot-area listener of session `id`. The input forwarding
    /// collaborator uses it to learn about touch and keyboard hot-area
    /// changes. The callback runs synchronously while the session is locked,
    /// so it must not call back into the manager.
    pub fn set_session_property_change_callback(
        &self,
        id: PersistentId,
        callback: SessionPropertyChangeCallback,
    ) -> WsResult {
        let session = self.session(id)?;
        let mut entity = session.lock();
        let property = entity.property_mut().ok_or(WsError::Nullptr)?;
        property.set_property_change_callback(callback);
        Ok(())
    }

    /// Apply every bit of `actions` in ascending order, stopping at the first
    /// failure.
    pub fn update_property(
        &self,
        caller: &Caller,
        id: PersistentId,
        property: &WindowSessionProperty,
        actions: WsPropertyChangeAction,
    ) -> WmResult {
        for bit in 0..u64::BITS {
            let Some(action) = WsPropertyChangeAction::from_bits(1 << bit) else {
                continue;
            };
            if actions.contains(action) {
                self.update_session_property_by_action(caller, id, property, action)?;
            }
        }
        Ok(())
    }

    fn any_water_mark(&self) -> bool {
        self.registry.handles().iter().any(|session| {
            let entity = session.lock();
            entity.state().is_valid()
                && entity
                    .property()
                    .is_some_and(|p| p.has_window_flag(window_flag::WATER_MARK))
        })
    }

    // =========================================================================
    // Listeners and dialogs
    // =========================================================================

    pub fn register_window_manager_agent(
        &self,
        agent_type: WindowManagerAgentType,
        agent: Arc<dyn WindowManagerAgent>,
    ) -> WmResult<AgentId> {
        Ok(self.agents.register(agent_type, agent))
    }

    pub fn unregister_window_manager_agent(
        &self,
        agent_type: WindowManagerAgentType,
        agent_id: AgentId,
    ) -> WmResult {
        self.agents.unregister(agent_type, agent_id)
    }

    /// Attach dialog `id` to the session created with `target_token`.
    pub fn bind_dialog_target(&self, id: PersistentId, target_token: u64) -> WsResult {
        let dialog = self.session(id)?;
        let owner = self
            .registry
            .find_by_token(target_token)
            .filter(|owner| !owner.ptr_eq(&dialog))
            .ok_or(WsError::InvalidParam)?;
        let previous = dialog.lock().parent_id();
        if previous != INVALID_SESSION_ID && previous != owner.persistent_id() {
            if let Some(old_owner) = self.registry.get(previous) {
                old_owner.lock().forget(id);
            }
        }
        dialog.lock().set_parent_id(owner.persistent_id());
        owner.lock().add_dialog(id);
        tracing::debug!(persistent_id = id, parent = owner.persistent_id(), "dialog bound");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn get_focus_session_info(&self, display_id: DisplayId) -> Option<FocusChangeInfo> {
        let view = self.registry.get(self.focus.focused_on(display_id))?.view();
        Some(FocusChangeInfo {
            persistent_id: view.persistent_id,
            display_id: view.display_id,
            window_type: view.window_type,
            pid: view.caller_pid,
            reason: FocusChangeReason::Default,
        })
    }

    #[must_use]
    pub fn get_visibility_window_info(&self) -> Vec<WindowVisibilityInfo> {
        self.registry
            .visible_sessions()
            .iter()
            .map(WindowVisibilityInfo::from)
            .collect()
    }

    /// Visible foreground windows on every display, highest z first.
    pub fn get_accessibility_window_info(&self, caller: &Caller) -> WmResult<Vec<WindowInfo>> {
        if !caller.is_system {
            return Err(WmError::NotSystemApp);
        }
        let mut views = self.registry.views_where(SessionView::is_visible_foreground);
        views.sort_by(|a, b| b.z_order.cmp(&a.z_order));
        Ok(views.iter().map(WindowInfo::from).collect())
    }

    #[must_use]
    pub fn get_all_window_layout_info(&self, display_id: DisplayId) -> Vec<WindowInfo> {
        self.registry
            .filter_for_all_window_layout_info(display_id)
            .iter()
            .map(WindowInfo::from)
            .collect()
    }

    pub fn get_session_info(&self, id: PersistentId) -> WsResult<SessionInfo> {
        Ok(self.session(id)?.lock().session_info().clone())
    }

    pub fn get_session_view(&self, id: PersistentId) -> WsResult<SessionView> {
        Ok(self.session(id)?.view())
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Persistent ids that survived a restart of the service and may be
    /// recovered. Fresh allocations skip past all of them.
    pub fn set_alive_persistent_ids(&self, ids: impl IntoIterator<Item = PersistentId>) {
        let mut alive = self.alive_ids.lock();
        alive.clear();
        alive.extend(ids.into_iter().filter(|id| *id > INVALID_SESSION_ID));
        if let Some(&max) = alive.last() {
            self.registry.reserve_id(max);
        }
        tracing::info!(count = alive.len(), "alive persistent ids set");
    }

    #[must_use]
    pub fn alive_persistent_ids(&self) -> Vec<PersistentId> {
        self.alive_ids.lock().iter().copied().collect()
    }

    fn check_alive(&self, id: PersistentId) -> WsResult {
        if self.alive_ids.lock().contains(&id) {
            Ok(())
        } else {
            tracing::warn!(persistent_id = id, "recovery for an id not on the alive list");
            Err(WsError::InvalidParam)
        }
    }

    /// Rebuild a sub-window or system session under its old persistent id.
    pub fn recover_and_connect_specific_session(
        &self,
        caller: &Caller,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> WsResult<(PersistentId, SceneSession)> {
        let window_type = property.window_type();
        if window_type.is_main_window() {
            return Err(WsError::InvalidType);
        }
        Self::check_create_permission(caller, window_type)?;
        let id = property.persistent_id();
        self.check_alive(id)?;
        let parent = self.resolve_parent(property)?;

        let mut info = property.session_info().clone();
        info.caller_token = token;
        info.is_system = caller.is_system;
        let session = self.registry.create_with_id(id, info, Some(property))?;
        self.attach(&session, caller, handles, parent.as_ref())?;
        self.alive_ids.lock().remove(&id);
        tracing::info!(persistent_id = id, "specific session recovered");
        Ok((id, session))
    }

    /// Reconnect a main window under its old persistent id, restoring the
    /// persisted property.
    pub fn recover_and_reconnect_scene_session(
        &self,
        caller: &Caller,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> WsResult<(PersistentId, SceneSession)> {
        if !property.window_type().is_main_window() {
            return Err(WsError::InvalidType);
        }
        let id = property.persistent_id();
        self.check_alive(id)?;

        let session = match self.registry.get(id) {
            Some(session) => session,
            None => {
                let mut info = property.session_info().clone();
                info.caller_token = token;
                info.is_system = caller.is_system;
                self.registry.create_with_id(id, info, Some(property))?
            }
        };
        self.lifecycle.reconnect(id, property, handles, caller.pid)?;
        self.alive_ids.lock().remove(&id);
        Ok((id, session))
    }

    // =========================================================================
    // Scene board entry points
    // =========================================================================

    pub fn foreground_session(&self, id: PersistentId) -> WsResult<SessionState> {
        let result = self.lifecycle.foreground(id);
        log_outcome("foreground_session", id, &result);
        result
    }

    pub fn background_session(&self, id: PersistentId) -> WsResult<SessionState> {
        let result = self.lifecycle.background(id);
        log_outcome("background_session", id, &result);
        result
    }

    pub fn set_session_active(&self, id: PersistentId, active: bool) -> WsResult<SessionState> {
        self.lifecycle.set_active(id, active)
    }

    pub fn disconnect_session(&self, id: PersistentId) -> WsResult<SessionState> {
        self.lifecycle.disconnect(id)
    }

    /// Teardown requested by the scene board itself; no ownership check.
    pub fn destroy_session(&self, id: PersistentId) -> WsResult {
        self.lifecycle.destroy(id)
    }

    pub fn update_z_order(&self, id: PersistentId, z_order: u32) -> WsResult {
        self.session(id)?.lock().set_z_order(z_order);
        Ok(())
    }

    /// Record the occlusion state computed by the compositor. A session that
    /// becomes fully occluded hands its focus off.
    pub fn update_visibility(&self, id: PersistentId, visibility: VisibilityState) -> WsResult {
        let session = self.session(id)?;
        let (changed, view) = {
            let mut entity = session.lock();
            let changed = entity.visibility() != visibility;
            entity.set_visibility(visibility);
            (changed, entity.view())
        };
        if !changed {
            return Ok(());
        }
        if !visibility.is_visible() {
            self.focus.release_focus(id, FocusChangeReason::Default);
        }
        self.agents
            .notify_visibility_changed(&[WindowVisibilityInfo::from(&view)]);
        Ok(())
    }

    pub fn set_force_hide_state(&self, id: PersistentId, state: ForceHideState) -> WsResult {
        let session = self.session(id)?;
        session.lock().set_force_hide(state);
        if state != ForceHideState::NotHidden {
            self.focus.release_focus(id, FocusChangeReason::Default);
        }
        Ok(())
    }

    pub fn set_blocking_focus(&self, id: PersistentId, blocking: bool) -> WsResult {
        self.session(id)?.lock().set_blocking_focus(blocking);
        tracing::debug!(persistent_id = id, blocking, "blocking focus updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentEvent, RecordingAgent};
    use crate::types::WindowMode;

    fn manager() -> SceneSessionManager {
        SceneSessionManager::new(Config::default())
    }

    fn property(ty: WindowType) -> WindowSessionProperty {
        let mut prop = WindowSessionProperty::default();
        prop.set_window_type(ty);
        prop
    }

    fn main_window(ssm: &SceneSessionManager, pid: u32, z: u32, token: u64) -> PersistentId {
        let session = ssm.registry().create_scene_session(
            SessionInfo {
                caller_token: Some(token),
                ..SessionInfo::default()
            },
            Some(&property(WindowType::AppMainWindow)),
        );
        let id = session.persistent_id();
        session.lock().set_z_order(z);
        ssm.lifecycle()
            .connect(id, ConnectHandles::default(), pid)
            .unwrap();
        ssm.foreground_session(id).unwrap();
        id
    }

    #[test]
    fn system_types_need_a_system_caller() {
        let ssm = manager();
        let err = ssm
            .create_and_connect_specific_session(
                &Caller::app(10),
                ConnectHandles::default(),
                &property(WindowType::StatusBar),
                None,
            )
            .unwrap_err();
        assert_eq!(err, WsError::NotSystemApp);
        assert!(ssm.registry().is_empty());

        let err = ssm
            .create_and_connect_specific_session(
                &Caller::app(10),
                ConnectHandles::default(),
                &property(WindowType::Float),
                None,
            )
            .unwrap_err();
        assert_eq!(err, WsError::InvalidPermission);

        let (id, _) = ssm
            .create_and_connect_specific_session(
                &Caller::app(10).with_permission(PERMISSION_SYSTEM_FLOAT_WINDOW),
                ConnectHandles::default(),
                &property(WindowType::Float),
                None,
            )
            .unwrap();
        assert_eq!(ssm.registry().get(id).unwrap().state(), SessionState::Connect);
    }

    #[test]
    fn sub_window_links_to_a_foreground_parent() {
        let ssm = manager();
        let parent = main_window(&ssm, 10, 1, 500);
        let mut prop = property(WindowType::AppSubWindow);
        prop.set_parent_persistent_id(parent);
        let (id, session) = ssm
            .create_and_connect_specific_session(&Caller::app(10), ConnectHandles::default(), &prop, None)
            .unwrap();
        assert_eq!(session.state(), SessionState::Foreground);
        assert_eq!(session.lock().parent_id(), parent);
        assert_eq!(ssm.registry().get(parent).unwrap().lock().sub_windows(), &[id]);

        let mut orphan = property(WindowType::AppSubWindow);
        orphan.set_parent_persistent_id(999);
        assert_eq!(
            ssm.create_and_connect_specific_session(&Caller::app(10), ConnectHandles::default(), &orphan, None)
                .unwrap_err(),
            WsError::InvalidParent
        );
    }

    #[test]
    fn keyboard_panel_records_the_calling_session() {
        let ssm = manager();
        let app = main_window(&ssm, 10, 1, 500);
        assert_eq!(ssm.focused_session_id(), app);
        let (_, panel) = ssm
            .create_and_connect_specific_session(
                &Caller::system(1),
                ConnectHandles::default(),
                &property(WindowType::KeyboardPanel),
                None,
            )
            .unwrap();
        assert_eq!(panel.view().calling_session_id, app);
    }

    #[test]
    fn destroy_requires_ownership() {
        let ssm = manager();
        let parent = main_window(&ssm, 10, 1, 500);
        let mut prop = property(WindowType::AppSubWindow);
        prop.set_parent_persistent_id(parent);
        let (id, _) = ssm
            .create_and_connect_specific_session(&Caller::app(10), ConnectHandles::default(), &prop, None)
            .unwrap();

        assert_eq!(
            ssm.destroy_and_disconnect_specific_session(&Caller::app(11), id),
            Err(WsError::InvalidPermission)
        );
        ssm.destroy_and_disconnect_specific_session(&Caller::app(10), id)
            .unwrap();
        assert!(!ssm.registry().contains(id));
        assert!(ssm.registry().get(parent).unwrap().lock().sub_windows().is_empty());
        assert_eq!(
            ssm.destroy_and_disconnect_specific_session(&Caller::app(10), id),
            Err(WsError::Nullptr)
        );
    }

    #[test]
    fn focus_by_sa_needs_system_caller() {
        let ssm = manager();
        let a = main_window(&ssm, 10, 1, 500);
        let b = main_window(&ssm, 11, 2, 501);
        assert_eq!(
            ssm.request_focus_status_by_sa(&Caller::app(10), a, true, false, FocusChangeReason::SaRequest),
            Err(WmError::NotSystemApp)
        );
        assert_eq!(ssm.focused_session_id(), b);
        ssm.request_focus_status_by_sa(&Caller::system(1), a, true, false, FocusChangeReason::SaRequest)
            .unwrap();
        assert_eq!(ssm.focused_session_id(), a);
    }

    #[test]
    fn client_focus_is_limited_to_own_windows() {
        let ssm = manager();
        let a = main_window(&ssm, 10, 1, 500);
        let _b = main_window(&ssm, 11, 2, 501);
        assert_eq!(ssm.request_focus(&Caller::app(11), a, true), Err(WmError::InvalidPermission));
        ssm.request_focus(&Caller::app(10), a, true).unwrap();
        assert_eq!(ssm.focused_session_id(), a);
    }

    #[test]
    fn property_update_copies_only_the_action_fields() {
        let ssm = manager();
        let id = main_window(&ssm, 10, 1, 500);
        let mut update = property(WindowType::AppMainWindow);
        update.set_window_mode(WindowMode::Floating);
        update.set_brightness(0.5);

        ssm.update_session_property_by_action(&Caller::app(10), id, &update, WsPropertyChangeAction::MODE)
            .unwrap();
        let session = ssm.registry().get(id).unwrap();
        let entity = session.lock();
        let prop = entity.property().unwrap();
        assert_eq!(prop.window_mode(), WindowMode::Floating);
        assert!((prop.brightness() - crate::property::UNDEFINED_BRIGHTNESS).abs() < f32::EPSILON);
    }

    #[test]
    fn property_gates_run_before_lookup() {
        let ssm = manager();
        let update = property(WindowType::AppMainWindow);
        assert_eq!(
            ssm.update_session_property_by_action(&Caller::app(1), 404, &update, WsPropertyChangeAction::TOPMOST),
            Err(WmError::NotSystemApp)
        );
        assert_eq!(
            ssm.update_session_property_by_action(&Caller::app(1), 404, &update, WsPropertyChangeAction::PRIVACY_MODE),
            Err(WmError::InvalidPermission)
        );
        assert_eq!(
            ssm.update_session_property_by_action(&Caller::app(1), 404, &update, WsPropertyChangeAction::MODE),
            Err(WmError::Nullptr)
        );
        assert_eq!(
            ssm.update_session_property_by_action(
                &Caller::app(1),
                404,
                &update,
                WsPropertyChangeAction::MODE | WsPropertyChangeAction::FLAGS
            ),
            Err(WmError::InvalidParam)
        );
    }

    #[test]
    fn water_mark_toggle_is_system_only_and_broadcast() {
        let ssm = manager();
        let recorder = Arc::new(RecordingAgent::new());
        ssm.register_window_manager_agent(WindowManagerAgentType::WaterMarkFlag, recorder.clone())
            .unwrap();
        let id = main_window(&ssm, 10, 1, 500);
        let mut update = property(WindowType::AppMainWindow);
        update.add_window_flag(window_flag::WATER_MARK);

        assert_eq!(
            ssm.update_session_property_by_action(&Caller::app(10), id, &update, WsPropertyChangeAction::FLAGS),
            Err(WmError::NotSystemApp)
        );
        ssm.update_session_property_by_action(&Caller::system(1), id, &update, WsPropertyChangeAction::FLAGS)
            .unwrap();
        assert_eq!(recorder.events(), vec![AgentEvent::WaterMark { show: true }]);
    }

    #[test]
    fn losing_focusable_hands_focus_off() {
        let ssm = manager();
        let low = main_window(&ssm, 10, 1, 500);
        let high = main_window(&ssm, 10, 2, 501);
        assert_eq!(ssm.focused_session_id(), high);
        let mut update = property(WindowType::AppMainWindow);
        update.set_focusable(false);
        ssm.update_session_property_by_action(&Caller::app(10), high, &update, WsPropertyChangeAction::FOCUSABLE)
            .unwrap();
        assert_eq!(ssm.focused_session_id(), low);
    }

    #[test]
    fn multi_bit_update_stops_at_first_failure() {
        let ssm = manager();
        let id = main_window(&ssm, 10, 1, 500);
        let mut update = property(WindowType::AppMainWindow);
        update.set_window_mode(WindowMode::Floating);
        update.set_turn_screen_on(true);
        update.set_keep_screen_on(true);
        let mask = WsPropertyChangeAction::MODE
            | WsPropertyChangeAction::TURN_SCREEN_ON
            | WsPropertyChangeAction::KEEP_SCREEN_ON;
        assert_eq!(
            ssm.update_property(&Caller::app(10), id, &update, mask),
            Err(WmError::NotSystemApp)
        );
        let view = ssm.get_session_view(id).unwrap();
        assert_eq!(view.window_mode, WindowMode::Floating);
        let session = ssm.registry().get(id).unwrap();
        assert!(!session.lock().property().unwrap().keep_screen_on());
    }

    #[test]
    fn dialog_binds_by_token() {
        let ssm = manager();
        let owner = main_window(&ssm, 10, 1, 777);
        let (dialog, _) = ssm
            .create_and_connect_specific_session(
                &Caller::app(10),
                ConnectHandles::default(),
                &property(WindowType::Dialog),
                None,
            )
            .unwrap();
        assert_eq!(ssm.bind_dialog_target(dialog, 1), Err(WsError::InvalidParam));
        assert_eq!(ssm.bind_dialog_target(404, 777), Err(WsError::InvalidSession));
        ssm.bind_dialog_target(dialog, 777).unwrap();
        assert_eq!(ssm.get_session_view(dialog).unwrap().parent_id, owner);
        assert_eq!(ssm.get_session_view(owner).unwrap().dialogs, vec![dialog]);
    }

    #[test]
    fn rebinding_a_dialog_moves_it_to_the_new_owner() {
        let ssm = manager();
        let first = main_window(&ssm, 10, 1, 777);
        let second = main_window(&ssm, 10, 2, 888);
        let (dialog, _) = ssm
            .create_and_connect_specific_session(
                &Caller::app(10),
                ConnectHandles::default(),
                &property(WindowType::Dialog),
                None,
            )
            .unwrap();

        ssm.bind_dialog_target(dialog, 777).unwrap();
        ssm.bind_dialog_target(dialog, 888).unwrap();

        assert!(ssm.get_session_view(first).unwrap().dialogs.is_empty());
        assert_eq!(ssm.get_session_view(second).unwrap().dialogs, vec![dialog]);
        assert_eq!(ssm.get_session_view(dialog).unwrap().parent_id, second);
        assert_eq!(ssm.registry().referrers_of(dialog), vec![second]);

        // Binding to the same owner again keeps a single entry.
        ssm.bind_dialog_target(dialog, 888).unwrap();
        assert_eq!(ssm.get_session_view(second).unwrap().dialogs, vec![dialog]);
    }

    #[test]
    fn hot_area_updates_notify_the_session_listener() {
        use crate::geometry::Rect;
        use crate::property::KeyboardTouchHotAreas;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ssm = manager();
        let id = main_window(&ssm, 10, 1, 500);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        ssm.set_session_property_change_callback(
            id,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let mut update = property(WindowType::AppMainWindow);
        update.set_touch_hot_areas(vec![Rect::new(0, 0, 10, 10)]);
        ssm.update_session_property_by_action(&Caller::system(1), id, &update, WsPropertyChangeAction::TOUCH_HOT_AREA)
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Same areas again: nothing changed, nothing fired.
        ssm.update_session_property_by_action(&Caller::system(1), id, &update, WsPropertyChangeAction::TOUCH_HOT_AREA)
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        update.set_keyboard_touch_hot_areas(KeyboardTouchHotAreas {
            portrait_keyboard: vec![Rect::new(0, 0, 5, 5)],
            ..KeyboardTouchHotAreas::default()
        });
        ssm.update_session_property_by_action(
            &Caller::system(1),
            id,
            &update,
            WsPropertyChangeAction::KEYBOARD_TOUCH_HOT_AREA,
        )
        .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let session = ssm.registry().get(id).unwrap();
        assert_eq!(
            session.lock().property().unwrap().touch_hot_areas(),
            vec![Rect::new(0, 0, 10, 10)]
        );
        assert_eq!(
            ssm.set_session_property_change_callback(404, Arc::new(|| {})),
            Err(WsError::InvalidSession)
        );
    }

    #[test]
    fn recovery_requires_alive_ids() {
        let ssm = manager();
        let mut prop = property(WindowType::AppMainWindow);
        prop.set_persistent_id(40);
        assert_eq!(
            ssm.recover_and_reconnect_scene_session(&Caller::app(10), ConnectHandles::default(), &prop, None)
                .unwrap_err(),
            WsError::InvalidParam
        );

        ssm.set_alive_persistent_ids([40, 41]);
        let (id, session) = ssm
            .recover_and_reconnect_scene_session(&Caller::app(10), ConnectHandles::default(), &prop, None)
            .unwrap();
        assert_eq!(id, 40);
        assert_eq!(session.state(), SessionState::Connect);
        assert_eq!(ssm.alive_persistent_ids(), vec![41]);

        let fresh = ssm.registry().create_scene_session(SessionInfo::default(), None);
        assert!(fresh.persistent_id() > 41);

        let mut sub = property(WindowType::SystemFloat);
        sub.set_persistent_id(41);
        assert_eq!(
            ssm.recover_and_reconnect_scene_session(&Caller::system(1), ConnectHandles::default(), &sub, None)
                .unwrap_err(),
            WsError::InvalidType
        );
        let (recovered, _) = ssm
            .recover_and_connect_specific_session(&Caller::system(1), ConnectHandles::default(), &sub, None)
            .unwrap();
        assert_eq!(recovered, 41);
        assert!(ssm.alive_persistent_ids().is_empty());
    }

    #[test]
    fn occlusion_releases_focus_and_notifies() {
        let ssm = manager();
        let recorder = Arc::new(RecordingAgent::new());
        ssm.register_window_manager_agent(WindowManagerAgentType::WindowVisibility, recorder.clone())
            .unwrap();
        let low = main_window(&ssm, 10, 1, 500);
        let high = main_window(&ssm, 10, 2, 501);
        recorder.clear();

        ssm.update_visibility(high, VisibilityState::TotalOcclusion).unwrap();
        assert_eq!(ssm.focused_session_id(), low);
        assert_eq!(recorder.events(), vec![AgentEvent::Visibility { ids: vec![high] }]);

        ssm.update_visibility(high, VisibilityState::TotalOcclusion).unwrap();
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn queries_report_visible_windows() {
        let ssm = manager();
        let a = main_window(&ssm, 10, 1, 500);
        let b = main_window(&ssm, 11, 2, 501);
        let info = ssm.get_focus_session_info(0).unwrap();
        assert_eq!(info.persistent_id, b);
        assert_eq!(info.pid, 11);

        let layout: Vec<_> = ssm
            .get_all_window_layout_info(0)
            .into_iter()
            .map(|w| w.persistent_id)
            .collect();
        assert_eq!(layout, vec![b, a]);
        assert_eq!(ssm.get_visibility_window_info().len(), 2);
        assert_eq!(ssm.get_accessibility_window_info(&Caller::app(1)), Err(WmError::NotSystemApp));
        assert_eq!(ssm.get_accessibility_window_info(&Caller::system(1)).unwrap().len(), 2);
        assert_eq!(ssm.get_session_info(a).unwrap().caller_token, Some(500));
    }
}

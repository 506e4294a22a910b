//! Per-window runtime record (the session entity).
//!
//! A [`SessionEntity`] owns its [`WindowSessionProperty`] exclusively.
//! Relationships to other sessions (parent, dialogs, sub-windows, toasts,
//! calling session) are persistent ids resolved through the registry, never
//! owning pointers. Shared access goes through [`SceneSession`], a cheap
//! cloneable handle around one entity lock.
//!
//! Lock discipline: at most one entity lock is held at a time, and never
//! while holding the registry map lock.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{WsError, WsResult};
use crate::geometry::Rect;
use crate::lifecycle::{LifecycleOp, next_state};
use crate::property::{SessionInfo, WindowSessionProperty};
use crate::types::{
    DisplayId, ForceHideState, INVALID_SESSION_ID, PersistentId, SessionState, VisibilityState,
    WindowMode, WindowType,
};

// =============================================================================
// Remote collaborators
// =============================================================================

/// Opaque references a client hands over on connect. Handles are resolved by
/// the transport layer; this crate only stores and compares them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectHandles {
    pub stage: Option<u64>,
    pub event_channel: Option<u64>,
    pub surface: Option<u64>,
}

/// Fired exactly once when a session is torn down.
pub trait DetachCallback: Send + Sync {
    fn on_session_detached(&self, persistent_id: PersistentId);
}

/// Guarantees a single invocation across teardown and the callback's own
/// death notification.
#[derive(Clone)]
pub struct OnceDetach {
    fired: Arc<AtomicBool>,
    callback: Arc<dyn DetachCallback>,
}

impl OnceDetach {
    #[must_use]
    pub fn new(callback: Arc<dyn DetachCallback>) -> Self {
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            callback,
        }
    }

    /// Invoke the callback unless some path already did. Returns whether
    /// this call fired it.
    pub fn fire(&self, persistent_id: PersistentId) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.callback.on_session_detached(persistent_id);
        true
    }

    /// Death-notification path: consume the one shot without invoking.
    pub fn disarm(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for OnceDetach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceDetach")
            .field("fired", &self.has_fired())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Entity
// =============================================================================

#[derive(Debug)]
pub struct SessionEntity {
    persistent_id: PersistentId,
    info: SessionInfo,
    state: SessionState,
    property: Option<WindowSessionProperty>,
    parent_id: PersistentId,
    z_order: u32,
    visibility: VisibilityState,
    force_hide: ForceHideState,
    blocking_focus: bool,
    focused: bool,
    dialogs: Vec<PersistentId>,
    sub_windows: Vec<PersistentId>,
    toasts: Vec<PersistentId>,
    caller_pid: u32,
    handles: ConnectHandles,
    token: Option<u64>,
    transitioning: bool,
    detach: Option<OnceDetach>,
}

impl SessionEntity {
    /// New entity in `DISCONNECT`. The property is a copy of `property` with
    /// its identity fields pinned to this session.
    #[must_use]
    pub fn new(
        persistent_id: PersistentId,
        info: SessionInfo,
        property: Option<&WindowSessionProperty>,
    ) -> Self {
        let mut own = WindowSessionProperty::default();
        if let Some(source) = property {
            own.copy_from(source);
        }
        own.set_persistent_id(persistent_id);
        let parent_id = own.parent_persistent_id();
        let mut info = info;
        info.persistent_id = persistent_id;
        own.set_session_info(info.clone());
        Self {
            persistent_id,
            token: info.caller_token,
            info,
            state: SessionState::Disconnect,
            property: Some(own),
            parent_id,
            z_order: 0,
            visibility: VisibilityState::TotalOcclusion,
            force_hide: ForceHideState::NotHidden,
            blocking_focus: false,
            focused: false,
            dialogs: Vec::new(),
            sub_windows: Vec::new(),
            toasts: Vec::new(),
            caller_pid: 0,
            handles: ConnectHandles::default(),
            transitioning: false,
            detach: None,
        }
    }

    #[must_use]
    pub const fn persistent_id(&self) -> PersistentId {
        self.persistent_id
    }

    #[must_use]
    pub fn session_info(&self) -> &SessionInfo {
        &self.info
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn property(&self) -> Option<&WindowSessionProperty> {
        self.property.as_ref()
    }

    #[must_use]
    pub fn property_mut(&mut self) -> Option<&mut WindowSessionProperty> {
        self.property.as_mut()
    }

    /// Drop the property; the session can no longer connect.
    pub fn release_property(&mut self) -> Option<WindowSessionProperty> {
        self.property.take()
    }

    #[must_use]
    pub fn window_type(&self) -> WindowType {
        self.property
            .as_ref()
            .map_or(WindowType::AppMainWindow, WindowSessionProperty::window_type)
    }

    #[must_use]
    pub fn display_id(&self) -> DisplayId {
        self.property
            .as_ref()
            .map_or(0, WindowSessionProperty::display_id)
    }

    #[must_use]
    pub const fn parent_id(&self) -> PersistentId {
        self.parent_id
    }

    pub fn set_parent_id(&mut self, parent_id: PersistentId) {
        self.parent_id = parent_id;
        if let Some(property) = self.property.as_mut() {
            property.set_parent_persistent_id(parent_id);
        }
    }

    #[must_use]
    pub const fn z_order(&self) -> u32 {
        self.z_order
    }

    pub fn set_z_order(&mut self, z_order: u32) {
        self.z_order = z_order;
    }

    #[must_use]
    pub const fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: VisibilityState) {
        self.visibility = visibility;
    }

    #[must_use]
    pub const fn force_hide(&self) -> ForceHideState {
        self.force_hide
    }

    pub fn set_force_hide(&mut self, state: ForceHideState) {
        self.force_hide = state;
    }

    #[must_use]
    pub const fn blocking_focus(&self) -> bool {
        self.blocking_focus
    }

    pub fn set_blocking_focus(&mut self, blocking: bool) {
        self.blocking_focus = blocking;
    }

    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    #[must_use]
    pub const fn caller_pid(&self) -> u32 {
        self.caller_pid
    }

    pub fn set_caller_pid(&mut self, pid: u32) {
        self.caller_pid = pid;
    }

    #[must_use]
    pub const fn handles(&self) -> ConnectHandles {
        self.handles
    }

    /// Caller token this session was created with; dialogs bind against it.
    #[must_use]
    pub const fn token(&self) -> Option<u64> {
        self.token
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Enter a guarded teardown. Fails if one is already running.
    pub fn begin_transition(&mut self) -> WsResult {
        if self.transitioning {
            return Err(WsError::InvalidOperation);
        }
        self.transitioning = true;
        Ok(())
    }

    pub fn end_transition(&mut self) {
        self.transitioning = false;
    }

    pub fn set_detach_callback(&mut self, detach: OnceDetach) {
        self.detach = Some(detach);
    }

    #[must_use]
    pub fn take_detach_callback(&mut self) -> Option<OnceDetach> {
        self.detach.take()
    }

    // -------------------------------------------------------------------------
    // Relationships
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn dialogs(&self) -> &[PersistentId] {
        &self.dialogs
    }

    pub fn add_dialog(&mut self, id: PersistentId) {
        if !self.dialogs.contains(&id) {
            self.dialogs.push(id);
        }
    }

    #[must_use]
    pub fn sub_windows(&self) -> &[PersistentId] {
        &self.sub_windows
    }

    pub fn add_sub_window(&mut self, id: PersistentId) {
        if !self.sub_windows.contains(&id) {
            self.sub_windows.push(id);
        }
    }

    #[must_use]
    pub fn toasts(&self) -> &[PersistentId] {
        &self.toasts
    }

    pub fn add_toast(&mut self, id: PersistentId) {
        if !self.toasts.contains(&id) {
            self.toasts.push(id);
        }
    }

    /// Every child id (dialogs, then sub-windows, then toasts).
    #[must_use]
    pub fn children(&self) -> Vec<PersistentId> {
        self.dialogs
            .iter()
            .chain(&self.sub_windows)
            .chain(&self.toasts)
            .copied()
            .collect()
    }

    /// Remove every reference to `id`. Returns whether anything changed.
    pub fn forget(&mut self, id: PersistentId) -> bool {
        let before = self.dialogs.len() + self.sub_windows.len() + self.toasts.len();
        self.dialogs.retain(|child| *child != id);
        self.sub_windows.retain(|child| *child != id);
        self.toasts.retain(|child| *child != id);
        let mut changed = before != self.dialogs.len() + self.sub_windows.len() + self.toasts.len();
        if self.parent_id == id {
            self.set_parent_id(INVALID_SESSION_ID);
            changed = true;
        }
        if let Some(property) = self.property.as_mut() {
            if property.calling_session_id() == id {
                property.set_calling_session_id(INVALID_SESSION_ID);
                changed = true;
            }
        }
        changed
    }

    #[must_use]
    pub fn references(&self, id: PersistentId) -> bool {
        self.parent_id == id
            || self.dialogs.contains(&id)
            || self.sub_windows.contains(&id)
            || self.toasts.contains(&id)
            || self
                .property
                .as_ref()
                .is_some_and(|property| property.calling_session_id() == id)
    }

    // -------------------------------------------------------------------------
    // State machine
    // -------------------------------------------------------------------------

    /// Apply one lifecycle operation. All-or-nothing: on error the state is
    /// unchanged.
    pub fn apply(&mut self, op: LifecycleOp) -> WsResult<SessionState> {
        let next = next_state(self.state, op)?;
        self.state = next;
        Ok(next)
    }

    /// `DISCONNECT -> CONNECT`, storing the client's handles.
    pub fn connect(&mut self, handles: ConnectHandles, caller_pid: u32) -> WsResult<SessionState> {
        if self.property.is_none() {
            return Err(WsError::Nullptr);
        }
        let next = next_state(self.state, LifecycleOp::Connect)?;
        self.handles = handles;
        self.caller_pid = caller_pid;
        self.state = next;
        Ok(next)
    }

    /// Recovery: `DISCONNECT -> CONNECT` with the persisted property restored.
    pub fn reconnect(
        &mut self,
        persisted: &WindowSessionProperty,
        handles: ConnectHandles,
        caller_pid: u32,
    ) -> WsResult<SessionState> {
        let next = next_state(self.state, LifecycleOp::Reconnect)?;
        let property = self.property.get_or_insert_with(WindowSessionProperty::default);
        property.copy_from(persisted);
        property.set_persistent_id(self.persistent_id);
        self.parent_id = property.parent_persistent_id();
        self.handles = handles;
        self.caller_pid = caller_pid;
        self.state = next;
        Ok(next)
    }

    // -------------------------------------------------------------------------
    // Derived predicates
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn is_visible_foreground(&self) -> bool {
        self.state.is_foreground() && self.visibility.is_visible()
    }

    /// Whether the session may receive focus at all.
    #[must_use]
    pub fn is_focus_eligible(&self) -> bool {
        let Some(property) = self.property.as_ref() else {
            return false;
        };
        self.is_visible_foreground()
            && property.focusable()
            && self.force_hide == ForceHideState::NotHidden
            && property.window_type().is_focus_eligible()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        let property = self.property.as_ref();
        SessionView {
            persistent_id: self.persistent_id,
            parent_id: self.parent_id,
            window_type: self.window_type(),
            window_mode: property.map_or(WindowMode::Undefined, WindowSessionProperty::window_mode),
            display_id: self.display_id(),
            state: self.state,
            z_order: self.z_order,
            visibility: self.visibility,
            force_hide: self.force_hide,
            blocking_focus: self.blocking_focus,
            focusable: property.is_some_and(WindowSessionProperty::focusable),
            focusable_on_show: property.is_some_and(WindowSessionProperty::focusable_on_show),
            topmost: property.is_some_and(WindowSessionProperty::is_topmost_for_focus),
            focused: self.focused,
            focus_eligible: self.is_focus_eligible(),
            rect: property.map_or_else(Rect::default, WindowSessionProperty::window_rect),
            window_name: property
                .map(|p| p.window_name().to_owned())
                .unwrap_or_default(),
            bundle_name: self.info.bundle_name.clone(),
            ability_name: self.info.ability_name.clone(),
            is_system: self.info.is_system,
            caller_pid: self.caller_pid,
            calling_session_id: property.map_or(INVALID_SESSION_ID, |p| p.calling_session_id()),
            dialogs: self.dialogs.clone(),
            sub_windows: self.sub_windows.clone(),
            toasts: self.toasts.clone(),
        }
    }
}

// =============================================================================
// Shared handle
// =============================================================================

/// Cloneable handle to one live entity. The persistent id is cached so
/// lookups and logging never take the lock.
#[derive(Clone)]
pub struct SceneSession {
    id: PersistentId,
    inner: Arc<Mutex<SessionEntity>>,
}

impl SceneSession {
    #[must_use]
    pub fn new(entity: SessionEntity) -> Self {
        Self {
            id: entity.persistent_id(),
            inner: Arc::new(Mutex::new(entity)),
        }
    }

    #[must_use]
    pub const fn persistent_id(&self) -> PersistentId {
        self.id
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionEntity> {
        self.inner.lock()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.inner.lock().view()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for SceneSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSession")
            .field("persistent_id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Point-in-time copy of the fields focus arbitration and queries consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub persistent_id: PersistentId,
    pub parent_id: PersistentId,
    pub window_type: WindowType,
    pub window_mode: WindowMode,
    pub display_id: DisplayId,
    pub state: SessionState,
    pub z_order: u32,
    pub visibility: VisibilityState,
    pub force_hide: ForceHideState,
    pub blocking_focus: bool,
    pub focusable: bool,
    pub focusable_on_show: bool,
    pub topmost: bool,
    pub focused: bool,
    pub focus_eligible: bool,
    pub rect: Rect,
    pub window_name: String,
    pub bundle_name: String,
    pub ability_name: String,
    pub is_system: bool,
    pub caller_pid: u32,
    pub calling_session_id: PersistentId,
    pub dialogs: Vec<PersistentId>,
    pub sub_windows: Vec<PersistentId>,
    pub toasts: Vec<PersistentId>,
}

impl SessionView {
    #[must_use]
    pub const fn is_visible_foreground(&self) -> bool {
        self.state.is_foreground() && self.visibility.is_visible()
    }

    /// Foreground, visible and flagged as focus-blocking.
    #[must_use]
    pub const fn is_active_blocker(&self) -> bool {
        self.blocking_focus && self.is_visible_foreground()
    }
}

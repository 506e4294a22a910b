//! Listener agents subscribed per category.
//!
//! Subscribers are kept per [`WindowManagerAgentType`]. Notification copies
//! the subscriber list before invoking anything, so a callback may register
//! or unregister agents (itself included) without deadlocking.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{WmError, WmResult};
use crate::geometry::Rect;
use crate::parcel::{Marshal, Parcel, ParcelError};
use crate::property::{SystemBarMap, WsPropertyChangeAction};
use crate::session::SessionView;
use crate::types::{
    DisplayId, FocusChangeReason, PersistentId, VisibilityState, WindowMode, WindowType,
    wire_enum,
};

wire_enum! {
    /// Listener category.
    pub enum WindowManagerAgentType {
        Focus = 0 => "focus",
        SystemBar = 1 => "system_bar",
        WindowUpdate = 2 => "window_update",
        WindowVisibility = 3 => "window_visibility",
        WindowDrawingState = 4 => "window_drawing_state",
        CameraFloat = 5 => "camera_float",
        WaterMarkFlag = 6 => "water_mark_flag",
        VisibleWindowNum = 7 => "visible_window_num",
        GestureNavigationEnabled = 8 => "gesture_navigation_enabled",
        CameraWindow = 9 => "camera_window",
        WindowMode = 10 => "window_mode",
        WindowStyle = 11 => "window_style",
        WindowPidVisibility = 12 => "window_pid_visibility",
        Pip = 13 => "pip",
        CallingDisplay = 14 => "calling_display",
        Property = 15 => "property",
    }
}

wire_enum! {
    /// Kind of window-list change.
    pub enum WindowUpdateType {
        Added = 1 => "added",
        Removed = 2 => "removed",
        Property = 3 => "property",
    }
}

pub type AgentId = u64;

/// Who gained or lost focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChangeInfo {
    pub persistent_id: PersistentId,
    pub display_id: DisplayId,
    pub window_type: WindowType,
    pub pid: u32,
    pub reason: FocusChangeReason,
}

/// Summary of one window for listeners and queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub persistent_id: PersistentId,
    pub window_type: WindowType,
    pub window_mode: WindowMode,
    pub display_id: DisplayId,
    pub rect: Rect,
    pub z_order: u32,
    pub focused: bool,
    pub bundle_name: String,
}

impl From<&SessionView> for WindowInfo {
    fn from(view: &SessionView) -> Self {
        Self {
            persistent_id: view.persistent_id,
            window_type: view.window_type,
            window_mode: view.window_mode,
            display_id: view.display_id,
            rect: view.rect,
            z_order: view.z_order,
            focused: view.focused,
            bundle_name: view.bundle_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowVisibilityInfo {
    pub persistent_id: PersistentId,
    pub pid: u32,
    pub window_type: WindowType,
    pub visibility: VisibilityState,
}

impl From<&SessionView> for WindowVisibilityInfo {
    fn from(view: &SessionView) -> Self {
        Self {
            persistent_id: view.persistent_id,
            pid: view.caller_pid,
            window_type: view.window_type,
            visibility: view.visibility,
        }
    }
}

impl Marshal for FocusChangeInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.persistent_id)?;
        parcel.write_u64(self.display_id)?;
        parcel.write_u32(self.window_type.as_u32())?;
        parcel.write_u32(self.pid)?;
        parcel.write_u32(self.reason.as_u32())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            persistent_id: parcel.read_i32()?,
            display_id: parcel.read_u64()?,
            window_type: WindowType::decode(parcel.read_u32()?)?,
            pid: parcel.read_u32()?,
            reason: FocusChangeReason::decode(parcel.read_u32()?)?,
        })
    }
}

impl Marshal for WindowInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.persistent_id)?;
        parcel.write_u32(self.window_type.as_u32())?;
        parcel.write_u32(self.window_mode.as_u32())?;
        parcel.write_u64(self.display_id)?;
        parcel.write_value(&self.rect)?;
        parcel.write_u32(self.z_order)?;
        parcel.write_bool(self.focused)?;
        parcel.write_string(&self.bundle_name)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            persistent_id: parcel.read_i32()?,
            window_type: WindowType::decode(parcel.read_u32()?)?,
            window_mode: WindowMode::decode(parcel.read_u32()?)?,
            display_id: parcel.read_u64()?,
            rect: parcel.read_value()?,
            z_order: parcel.read_u32()?,
            focused: parcel.read_bool()?,
            bundle_name: parcel.read_string()?,
        })
    }
}

impl Marshal for WindowVisibilityInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.persistent_id)?;
        parcel.write_u32(self.pid)?;
        parcel.write_u32(self.window_type.as_u32())?;
        parcel.write_u32(self.visibility.as_u32())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            persistent_id: parcel.read_i32()?,
            pid: parcel.read_u32()?,
            window_type: WindowType::decode(parcel.read_u32()?)?,
            visibility: VisibilityState::decode(parcel.read_u32()?)?,
        })
    }
}

/// Remote listener. Every method has an empty default so an agent only
/// implements the categories it subscribes to.
pub trait WindowManagerAgent: Send + Sync {
    fn update_focus_change_info(&self, _info: &FocusChangeInfo, _focused: bool) {}

    fn update_window_info(&self, _infos: &[WindowInfo], _update: WindowUpdateType) {}

    fn update_visibility_info(&self, _infos: &[WindowVisibilityInfo]) {}

    fn update_system_bar_props(&self, _display_id: DisplayId, _props: &SystemBarMap) {}

    fn notify_water_mark_flag_changed(&self, _show_water_mark: bool) {}

    fn notify_property_changed(&self, _persistent_id: PersistentId, _action: WsPropertyChangeAction) {
    }
}

type Subscribers = Vec<(AgentId, Arc<dyn WindowManagerAgent>)>;

#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<WindowManagerAgentType, Subscribers>>,
    next_id: AtomicU64,
}

impl AgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        agent_type: WindowManagerAgentType,
        agent: Arc<dyn WindowManagerAgent>,
    ) -> AgentId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.agents
            .write()
            .entry(agent_type)
            .or_default()
            .push((id, agent));
        tracing::debug!(agent_type = %agent_type, agent_id = id, "window manager agent registered");
        id
    }

    pub fn unregister(&self, agent_type: WindowManagerAgentType, agent_id: AgentId) -> WmResult {
        let mut agents = self.agents.write();
        let Some(list) = agents.get_mut(&agent_type) else {
            return Err(WmError::Nullptr);
        };
        let before = list.len();
        list.retain(|(id, _)| *id != agent_id);
        if list.len() == before {
            return Err(WmError::Nullptr);
        }
        if list.is_empty() {
            agents.remove(&agent_type);
        }
        tracing::debug!(agent_type = %agent_type, agent_id, "window manager agent unregistered");
        Ok(())
    }

    #[must_use]
    pub fn count(&self, agent_type: WindowManagerAgentType) -> usize {
        self.agents.read().get(&agent_type).map_or(0, Vec::len)
    }

    fn subscribers(&self, agent_type: WindowManagerAgentType) -> Subscribers {
        self.agents
            .read()
            .get(&agent_type)
            .cloned()
            .unwrap_or_default()
    }

    fn each<F>(&self, agent_type: WindowManagerAgentType, f: F)
    where
        F: Fn(&dyn WindowManagerAgent),
    {
        for (_, agent) in self.subscribers(agent_type) {
            f(agent.as_ref());
        }
    }

    pub fn notify_focus_changed(&self, info: &FocusChangeInfo, focused: bool) {
        self.each(WindowManagerAgentType::Focus, |agent| {
            agent.update_focus_change_info(info, focused);
        });
    }

    pub fn notify_window_update(&self, infos: &[WindowInfo], update: WindowUpdateType) {
        self.each(WindowManagerAgentType::WindowUpdate, |agent| {
            agent.update_window_info(infos, update);
        });
    }

    pub fn notify_visibility_changed(&self, infos: &[WindowVisibilityInfo]) {
        self.each(WindowManagerAgentType::WindowVisibility, |agent| {
            agent.update_visibility_info(infos);
        });
    }

    pub fn notify_system_bar_changed(&self, display_id: DisplayId, props: &SystemBarMap) {
        self.each(WindowManagerAgentType::SystemBar, |agent| {
            agent.update_system_bar_props(display_id, props);
        });
    }

    pub fn notify_water_mark_flag_changed(&self, show_water_mark: bool) {
        self.each(WindowManagerAgentType::WaterMarkFlag, |agent| {
            agent.notify_water_mark_flag_changed(show_water_mark);
        });
    }

    pub fn notify_property_changed(&self, persistent_id: PersistentId, action: WsPropertyChangeAction) {
        self.each(WindowManagerAgentType::Property, |agent| {
            agent.notify_property_changed(persistent_id, action);
        });
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let agents = self.agents.read();
        let counts: BTreeMap<_, _> = agents.iter().map(|(ty, list)| (*ty, list.len())).collect();
        f.debug_struct("AgentRegistry").field("agents", &counts).finish()
    }
}

/// Agent that records what it receives. Used by tests and the CLI replay.
#[derive(Debug, Default)]
pub struct RecordingAgent {
    events: parking_lot::Mutex<Vec<AgentEvent>>,
}

/// One notification seen by a [`RecordingAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    Focus { info: FocusChangeInfo, focused: bool },
    WindowUpdate { ids: Vec<PersistentId>, update: WindowUpdateType },
    Visibility { ids: Vec<PersistentId> },
    SystemBar { display_id: DisplayId },
    WaterMark { show: bool },
    Property { persistent_id: PersistentId, action: u64 },
}

impl RecordingAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: AgentEvent) {
        self.events.lock().push(event);
    }
}

impl WindowManagerAgent for RecordingAgent {
    fn update_focus_change_info(&self, info: &FocusChangeInfo, focused: bool) {
        self.push(AgentEvent::Focus {
            info: info.clone(),
            focused,
        });
    }

    fn update_window_info(&self, infos: &[WindowInfo], update: WindowUpdateType) {
        self.push(AgentEvent::WindowUpdate {
            ids: infos.iter().map(|info| info.persistent_id).collect(),
            update,
        });
    }

    fn update_visibility_info(&self, infos: &[WindowVisibilityInfo]) {
        self.push(AgentEvent::Visibility {
            ids: infos.iter().map(|info| info.persistent_id).collect(),
        });
    }

    fn update_system_bar_props(&self, display_id: DisplayId, _props: &SystemBarMap) {
        self.push(AgentEvent::SystemBar { display_id });
    }

    fn notify_water_mark_flag_changed(&self, show_water_mark: bool) {
        self.push(AgentEvent::WaterMark {
            show: show_water_mark,
        });
    }

    fn notify_property_changed(&self, persistent_id: PersistentId, action: WsPropertyChangeAction) {
        self.push(AgentEvent::Property {
            persistent_id,
            action: action.bits(),
        });
    }
}

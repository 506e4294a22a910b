//! Declarative window configuration (the property store).
//!
//! A [`WindowSessionProperty`] holds everything a client declares about its
//! window. Subsets of it travel across the boundary keyed by
//! [`WsPropertyChangeAction`] bits:
//!
//! ```text
//!   client                               manager
//!   ------                               -------
//!   prop.write(parcel, RECT | FOCUSABLE)
//!                          ── parcel ──►  scratch.read(parcel, RECT | FOCUSABLE)
//!                                         session_prop.copy_action(&scratch, RECT)
//!                                         session_prop.copy_action(&scratch, FOCUSABLE)
//! ```
//!
//! Sub-fields that may be touched from a callback thread (hot areas, window
//! mask, corner radius, shadows, compatible mode, atomic-service flag) sit
//! behind their own `parking_lot::Mutex` and are readable through `&self`.

mod action;
mod compound;

pub use action::{ACTION_HANDLERS, ActionHandler, WsPropertyChangeAction, handler_for};
pub use compound::*;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::geometry::Rect;
use crate::parcel::{Marshal, Parcel, ParcelError};
use crate::types::{
    DisplayId, INVALID_SESSION_ID, MaximizeMode, Orientation, PersistentId, WindowAnimation,
    WindowMode, WindowModeSupport, WindowType,
};

/// Brightness value meaning "follow the system".
pub const UNDEFINED_BRIGHTNESS: f32 = -1.0;

/// Listener fired synchronously after a hot-area mutation is committed.
pub type SessionPropertyChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Hot areas share one lock so a reader never sees touch and keyboard
/// areas from different updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct HotAreas {
    touch: Vec<Rect>,
    keyboard: KeyboardTouchHotAreas,
}

/// The full declarative configuration of one window.
pub struct WindowSessionProperty {
    // Identity; travels only with full marshalling.
    persistent_id: PersistentId,
    parent_persistent_id: PersistentId,
    window_type: WindowType,
    display_id: DisplayId,
    window_name: String,
    session_info: SessionInfo,
    focusable_on_show: bool,
    is_system_calling: bool,
    is_atomic_service: Mutex<bool>,

    // Action-addressable fields.
    window_rect: Rect,
    request_rect: Rect,
    window_mode: WindowMode,
    window_flags: u32,
    system_bar: SystemBarMap,
    focusable: bool,
    touchable: bool,
    calling_session_id: PersistentId,
    requested_orientation: Orientation,
    default_requested_orientation: Orientation,
    turn_screen_on: bool,
    keep_screen_on: bool,
    brightness: f32,
    window_mode_support: WindowModeSupport,
    hot_areas: Mutex<HotAreas>,
    transform: Transform,
    animation_flag: WindowAnimation,
    privacy_mode: bool,
    system_privacy_mode: bool,
    aspect_ratio: f32,
    maximize_mode: MaximizeMode,
    decor_enable: bool,
    limits: WindowLimits,
    user_limits: WindowLimits,
    config_limits_vp: WindowLimits,
    last_limits_vpr: f32,
    drag_enabled: bool,
    raise_enabled: bool,
    hide_non_system_floating_windows: bool,
    force_hide: bool,
    textfield_avoid_info: TextFieldAvoidInfo,
    window_mask: Mutex<Option<WindowMask>>,
    topmost: bool,
    snapshot_skip: bool,
    main_window_topmost: bool,
    exclusively_highlighted: bool,
    sub_window_level: u32,
    sub_window_z_level: i32,
    avoid_area_option: u32,
    background_alpha: u8,
    follow_screen_change: bool,
    view_keep_screen_on: bool,
    window_shadow_enabled: bool,
    keyboard_layout_params: KeyboardLayoutParams,
    pip_template_info: PiPTemplateInfo,
    corner_radius: Mutex<f32>,
    shadows: Mutex<ShadowsInfo>,
    compatible_mode: Mutex<Option<CompatibleModeProperty>>,
    transition_animations: TransitionAnimationMap,

    change_callback: Option<SessionPropertyChangeCallback>,
}

impl Default for WindowSessionProperty {
    fn default() -> Self {
        Self {
            persistent_id: INVALID_SESSION_ID,
            parent_persistent_id: INVALID_SESSION_ID,
            window_type: WindowType::AppMainWindow,
            display_id: 0,
            window_name: String::new(),
            session_info: SessionInfo::default(),
            focusable_on_show: true,
            is_system_calling: false,
            is_atomic_service: Mutex::new(false),
            window_rect: Rect::default(),
            request_rect: Rect::default(),
            window_mode: WindowMode::Fullscreen,
            window_flags: 0,
            system_bar: default_system_bar_map(),
            focusable: true,
            touchable: true,
            calling_session_id: INVALID_SESSION_ID,
            requested_orientation: Orientation::Unspecified,
            default_requested_orientation: Orientation::Unspecified,
            turn_screen_on: false,
            keep_screen_on: false,
            brightness: UNDEFINED_BRIGHTNESS,
            window_mode_support: WindowModeSupport::All,
            hot_areas: Mutex::new(HotAreas::default()),
            transform: Transform::default(),
            animation_flag: WindowAnimation::Default,
            privacy_mode: false,
            system_privacy_mode: false,
            aspect_ratio: 0.0,
            maximize_mode: MaximizeMode::Recover,
            decor_enable: false,
            limits: WindowLimits::default(),
            user_limits: WindowLimits::default(),
            config_limits_vp: WindowLimits::default(),
            last_limits_vpr: 0.0,
            drag_enabled: true,
            raise_enabled: true,
            hide_non_system_floating_windows: false,
            force_hide: false,
            textfield_avoid_info: TextFieldAvoidInfo::default(),
            window_mask: Mutex::new(None),
            topmost: false,
            snapshot_skip: false,
            main_window_topmost: false,
            exclusively_highlighted: true,
            sub_window_level: 0,
            sub_window_z_level: 0,
            avoid_area_option: 0,
            background_alpha: 0xff,
            follow_screen_change: false,
            view_keep_screen_on: false,
            window_shadow_enabled: true,
            keyboard_layout_params: KeyboardLayoutParams::default(),
            pip_template_info: PiPTemplateInfo::default(),
            corner_radius: Mutex::new(0.0),
            shadows: Mutex::new(ShadowsInfo::default()),
            compatible_mode: Mutex::new(None),
            transition_animations: TransitionAnimationMap::new(),
            change_callback: None,
        }
    }
}

/// Plain getter and setter pairs for `Copy` fields.
macro_rules! copy_accessors {
    ($( $field:ident, $setter:ident: $ty:ty; )*) => {
        $(
            #[must_use]
            pub fn $field(&self) -> $ty {
                self.$field
            }

            pub fn $setter(&mut self, value: $ty) {
                self.$field = value;
            }
        )*
    };
}

impl WindowSessionProperty {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    copy_accessors! {
        persistent_id, set_persistent_id: PersistentId;
        parent_persistent_id, set_parent_persistent_id: PersistentId;
        window_type, set_window_type: WindowType;
        display_id, set_display_id: DisplayId;
        focusable_on_show, set_focusable_on_show: bool;
        is_system_calling, set_system_calling: bool;
        window_rect, set_window_rect: Rect;
        request_rect, set_request_rect: Rect;
        window_mode, set_window_mode: WindowMode;
        window_flags, set_window_flags: u32;
        focusable, set_focusable: bool;
        touchable, set_touchable: bool;
        calling_session_id, set_calling_session_id: PersistentId;
        requested_orientation, set_requested_orientation: Orientation;
        default_requested_orientation, set_default_requested_orientation: Orientation;
        turn_screen_on, set_turn_screen_on: bool;
        keep_screen_on, set_keep_screen_on: bool;
        brightness, set_brightness: f32;
        window_mode_support, set_window_mode_support: WindowModeSupport;
        transform, set_transform: Transform;
        animation_flag, set_animation_flag: WindowAnimation;
        privacy_mode, set_privacy_mode: bool;
        system_privacy_mode, set_system_privacy_mode: bool;
        aspect_ratio, set_aspect_ratio: f32;
        maximize_mode, set_maximize_mode: MaximizeMode;
        decor_enable, set_decor_enable: bool;
        drag_enabled, set_drag_enabled: bool;
        raise_enabled, set_raise_enabled: bool;
        hide_non_system_floating_windows, set_hide_non_system_floating_windows: bool;
        force_hide, set_force_hide: bool;
        textfield_avoid_info, set_textfield_avoid_info: TextFieldAvoidInfo;
        topmost, set_topmost: bool;
        snapshot_skip, set_snapshot_skip: bool;
        main_window_topmost, set_main_window_topmost: bool;
        exclusively_highlighted, set_exclusively_highlighted: bool;
        sub_window_level, set_sub_window_level: u32;
        sub_window_z_level, set_sub_window_z_level: i32;
        avoid_area_option, set_avoid_area_option: u32;
        background_alpha, set_background_alpha: u8;
        follow_screen_change, set_follow_screen_change: bool;
        view_keep_screen_on, set_view_keep_screen_on: bool;
        window_shadow_enabled, set_window_shadow_enabled: bool;
        keyboard_layout_params, set_keyboard_layout_params: KeyboardLayoutParams;
        last_limits_vpr, set_last_limits_vpr: f32;
    }

    #[must_use]
    pub fn window_name(&self) -> &str {
        &self.window_name
    }

    pub fn set_window_name(&mut self, name: impl Into<String>) {
        self.window_name = name.into();
    }

    #[must_use]
    pub fn session_info(&self) -> &SessionInfo {
        &self.session_info
    }

    pub fn set_session_info(&mut self, info: SessionInfo) {
        self.session_info = info;
    }

    pub fn add_window_flag(&mut self, flag: u32) {
        self.window_flags |= flag;
    }

    pub fn remove_window_flag(&mut self, flag: u32) {
        self.window_flags &= !flag;
    }

    #[must_use]
    pub const fn has_window_flag(&self, flag: u32) -> bool {
        self.window_flags & flag == flag
    }

    #[must_use]
    pub fn window_limits(&self) -> WindowLimits {
        self.limits
    }

    pub fn set_window_limits(&mut self, limits: WindowLimits) {
        self.limits = limits;
    }

    #[must_use]
    pub fn user_window_limits(&self) -> WindowLimits {
        self.user_limits
    }

    pub fn set_user_window_limits(&mut self, limits: WindowLimits) {
        self.user_limits = limits;
    }

    #[must_use]
    pub fn config_window_limits_vp(&self) -> WindowLimits {
        self.config_limits_vp
    }

    pub fn set_config_window_limits_vp(&mut self, limits: WindowLimits) {
        self.config_limits_vp = limits;
    }

    #[must_use]
    pub fn system_bar_properties(&self) -> &SystemBarMap {
        &self.system_bar
    }

    #[must_use]
    pub fn system_bar_property(&self, bar: WindowType) -> Option<SystemBarProperty> {
        self.system_bar.get(&bar).copied()
    }

    pub fn set_system_bar_property(&mut self, bar: WindowType, prop: SystemBarProperty) {
        self.system_bar.insert(bar, prop);
    }

    #[must_use]
    pub fn pip_template_info(&self) -> &PiPTemplateInfo {
        &self.pip_template_info
    }

    pub fn set_pip_template_info(&mut self, info: PiPTemplateInfo) {
        self.pip_template_info = info;
    }

    #[must_use]
    pub fn transition_animations(&self) -> &TransitionAnimationMap {
        &self.transition_animations
    }

    pub fn set_transition_animation(
        &mut self,
        transition: WindowTransitionType,
        animation: TransitionAnimation,
    ) {
        self.transition_animations.insert(transition, animation);
    }

    /// Main windows report `main_window_topmost`; everything else `topmost`.
    #[must_use]
    pub fn is_topmost_for_focus(&self) -> bool {
        if self.window_type.is_main_window() {
            self.main_window_topmost || self.topmost
        } else {
            self.topmost
        }
    }

    // -------------------------------------------------------------------------
    // Mutex-guarded fields
    // -------------------------------------------------------------------------

    /// Register the hot-area listener. Replaces any previous one.
    pub fn set_property_change_callback(&mut self, callback: SessionPropertyChangeCallback) {
        self.change_callback = Some(callback);
    }

    pub fn clear_property_change_callback(&mut self) {
        self.change_callback = None;
    }

    #[must_use]
    pub fn has_property_change_callback(&self) -> bool {
        self.change_callback.is_some()
    }

    fn notify_property_changed(&self) {
        if let Some(callback) = &self.change_callback {
            callback();
        }
    }

    #[must_use]
    pub fn touch_hot_areas(&self) -> Vec<Rect> {
        self.hot_areas.lock().touch.clone()
    }

    pub fn set_touch_hot_areas(&self, areas: Vec<Rect>) {
        {
            let mut guard = self.hot_areas.lock();
            if guard.touch == areas {
                return;
            }
            guard.touch = areas;
        }
        self.notify_property_changed();
    }

    #[must_use]
    pub fn keyboard_touch_hot_areas(&self) -> KeyboardTouchHotAreas {
        self.hot_areas.lock().keyboard.clone()
    }

    pub fn set_keyboard_touch_hot_areas(&self, areas: KeyboardTouchHotAreas) {
        {
            let mut guard = self.hot_areas.lock();
            if guard.keyboard == areas {
                return;
            }
            guard.keyboard = areas;
        }
        self.notify_property_changed();
    }

    #[must_use]
    pub fn window_mask(&self) -> Option<WindowMask> {
        self.window_mask.lock().clone()
    }

    #[must_use]
    pub fn is_shaped(&self) -> bool {
        self.window_mask.lock().is_some()
    }

    pub fn set_window_mask(&self, mask: Option<WindowMask>) {
        *self.window_mask.lock() = mask;
    }

    #[must_use]
    pub fn window_corner_radius(&self) -> f32 {
        *self.corner_radius.lock()
    }

    pub fn set_window_corner_radius(&self, radius: f32) {
        *self.corner_radius.lock() = radius;
    }

    #[must_use]
    pub fn window_shadows(&self) -> ShadowsInfo {
        self.shadows.lock().clone()
    }

    pub fn set_window_shadows(&self, shadows: ShadowsInfo) {
        *self.shadows.lock() = shadows;
    }

    #[must_use]
    pub fn compatible_mode_property(&self) -> Option<CompatibleModeProperty> {
        *self.compatible_mode.lock()
    }

    pub fn set_compatible_mode_property(&self, prop: Option<CompatibleModeProperty>) {
        *self.compatible_mode.lock() = prop;
    }

    #[must_use]
    pub fn is_atomic_service(&self) -> bool {
        *self.is_atomic_service.lock()
    }

    pub fn set_is_atomic_service(&self, value: bool) {
        *self.is_atomic_service.lock() = value;
    }

    // -------------------------------------------------------------------------
    // Partial read/write protocol
    // -------------------------------------------------------------------------

    /// Serialize the fields owned by each bit of `actions`, in ascending bit
    /// order. On failure the parcel is truncated back to where it started.
    /// Bits without a handler are skipped.
    pub fn write(
        &self,
        parcel: &mut Parcel,
        actions: WsPropertyChangeAction,
    ) -> Result<(), ParcelError> {
        action::write_actions(self, parcel, actions)
    }

    /// Inverse of [`Self::write`]. Each bit commits only after all of its
    /// values decoded; a failing bit leaves its fields and the read cursor
    /// untouched. Unknown bits are ignored.
    pub fn read(
        &mut self,
        parcel: &mut Parcel,
        actions: WsPropertyChangeAction,
    ) -> Result<(), ParcelError> {
        action::read_actions(self, parcel, actions)
    }

    /// [`Self::read`] for a raw wire value, dropping bits this build does not know.
    pub fn read_raw(&mut self, parcel: &mut Parcel, raw_actions: u64) -> Result<(), ParcelError> {
        self.read(parcel, WsPropertyChangeAction::from_bits_truncate(raw_actions))
    }

    /// Copy the fields owned by `actions` from `other`.
    pub fn copy_action(&mut self, other: &Self, actions: WsPropertyChangeAction) {
        for handler in ACTION_HANDLERS
            .iter()
            .filter(|handler| actions.contains(handler.action))
        {
            handler.copy(self, other);
        }
    }

    /// Value-identical copy of every field. The change callback stays as is.
    pub fn copy_from(&mut self, other: &Self) {
        self.copy_identity_from(other);
        self.copy_action(other, WsPropertyChangeAction::all());
    }

    fn copy_identity_from(&mut self, other: &Self) {
        self.persistent_id = other.persistent_id;
        self.parent_persistent_id = other.parent_persistent_id;
        self.window_type = other.window_type;
        self.display_id = other.display_id;
        self.window_name.clone_from(&other.window_name);
        self.session_info.clone_from(&other.session_info);
        self.focusable_on_show = other.focusable_on_show;
        self.is_system_calling = other.is_system_calling;
        self.set_is_atomic_service(other.is_atomic_service());
    }

    fn marshal_identity(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_i32(self.persistent_id)?;
        parcel.write_i32(self.parent_persistent_id)?;
        parcel.write_u32(self.window_type.as_u32())?;
        parcel.write_u64(self.display_id)?;
        parcel.write_string(&self.window_name)?;
        self.session_info.marshal(parcel)?;
        parcel.write_bool(self.focusable_on_show)?;
        parcel.write_bool(self.is_system_calling)?;
        parcel.write_bool(self.is_atomic_service())
    }

    fn unmarshal_identity(&mut self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        let persistent_id = parcel.read_i32()?;
        let parent_persistent_id = parcel.read_i32()?;
        let window_type = WindowType::decode(parcel.read_u32()?)?;
        let display_id = parcel.read_u64()?;
        let window_name = parcel.read_string()?;
        let session_info = SessionInfo::unmarshal(parcel)?;
        let focusable_on_show = parcel.read_bool()?;
        let is_system_calling = parcel.read_bool()?;
        let is_atomic_service = parcel.read_bool()?;

        self.persistent_id = persistent_id;
        self.parent_persistent_id = parent_persistent_id;
        self.window_type = window_type;
        self.display_id = display_id;
        self.window_name = window_name;
        self.session_info = session_info;
        self.focusable_on_show = focusable_on_show;
        self.is_system_calling = is_system_calling;
        self.set_is_atomic_service(is_atomic_service);
        Ok(())
    }

    /// Plain copy of every field for comparison and dumps.
    #[must_use]
    pub fn snapshot(&self) -> PropertySnapshot {
        let hot_areas = self.hot_areas.lock().clone();
        PropertySnapshot {
            persistent_id: self.persistent_id,
            parent_persistent_id: self.parent_persistent_id,
            window_type: self.window_type,
            display_id: self.display_id,
            window_name: self.window_name.clone(),
            session_info: self.session_info.clone(),
            focusable_on_show: self.focusable_on_show,
            is_system_calling: self.is_system_calling,
            is_atomic_service: self.is_atomic_service(),
            window_rect: self.window_rect,
            request_rect: self.request_rect,
            window_mode: self.window_mode,
            window_flags: self.window_flags,
            system_bar: self.system_bar.clone(),
            focusable: self.focusable,
            touchable: self.touchable,
            calling_session_id: self.calling_session_id,
            requested_orientation: self.requested_orientation,
            default_requested_orientation: self.default_requested_orientation,
            turn_screen_on: self.turn_screen_on,
            keep_screen_on: self.keep_screen_on,
            brightness: self.brightness,
            window_mode_support: self.window_mode_support,
            touch_hot_areas: hot_areas.touch,
            keyboard_touch_hot_areas: hot_areas.keyboard,
            transform: self.transform,
            animation_flag: self.animation_flag,
            privacy_mode: self.privacy_mode,
            system_privacy_mode: self.system_privacy_mode,
            aspect_ratio: self.aspect_ratio,
            maximize_mode: self.maximize_mode,
            decor_enable: self.decor_enable,
            limits: self.limits,
            user_limits: self.user_limits,
            config_limits_vp: self.config_limits_vp,
            last_limits_vpr: self.last_limits_vpr,
            drag_enabled: self.drag_enabled,
            raise_enabled: self.raise_enabled,
            hide_non_system_floating_windows: self.hide_non_system_floating_windows,
            force_hide: self.force_hide,
            textfield_avoid_info: self.textfield_avoid_info,
            window_mask: self.window_mask(),
            topmost: self.topmost,
            snapshot_skip: self.snapshot_skip,
            main_window_topmost: self.main_window_topmost,
            exclusively_highlighted: self.exclusively_highlighted,
            sub_window_level: self.sub_window_level,
            sub_window_z_level: self.sub_window_z_level,
            avoid_area_option: self.avoid_area_option,
            background_alpha: self.background_alpha,
            follow_screen_change: self.follow_screen_change,
            view_keep_screen_on: self.view_keep_screen_on,
            window_shadow_enabled: self.window_shadow_enabled,
            keyboard_layout_params: self.keyboard_layout_params,
            pip_template_info: self.pip_template_info.clone(),
            corner_radius: self.window_corner_radius(),
            shadows: self.window_shadows(),
            compatible_mode: self.compatible_mode_property(),
            transition_animations: self.transition_animations.clone(),
        }
    }
}

impl Marshal for WindowSessionProperty {
    /// Identity fields followed by every action group in bit order.
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_group(|p| {
            self.marshal_identity(p)?;
            self.write(p, WsPropertyChangeAction::all())
        })
    }

    /// Builds a fresh property; on failure nothing escapes.
    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        parcel.read_group(|p| {
            let mut property = Self::default();
            property.unmarshal_identity(p)?;
            for handler in ACTION_HANDLERS {
                handler.read(&mut property, p)?;
            }
            Ok(property)
        })
    }
}

impl Clone for WindowSessionProperty {
    /// Same as [`WindowSessionProperty::copy_from`] into a fresh value; the
    /// change callback is not carried over.
    fn clone(&self) -> Self {
        let mut copy = Self::default();
        copy.copy_from(self);
        copy
    }
}

impl PartialEq for WindowSessionProperty {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl std::fmt::Debug for WindowSessionProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSessionProperty")
            .field("persistent_id", &self.persistent_id)
            .field("parent_persistent_id", &self.parent_persistent_id)
            .field("window_type", &self.window_type)
            .field("window_name", &self.window_name)
            .field("window_rect", &self.window_rect)
            .field("window_mode", &self.window_mode)
            .field("focusable", &self.focusable)
            .field("topmost", &self.topmost)
            .field("has_callback", &self.change_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Plain, comparable copy of a [`WindowSessionProperty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub persistent_id: PersistentId,
    pub parent_persistent_id: PersistentId,
    pub window_type: WindowType,
    pub display_id: DisplayId,
    pub window_name: String,
    pub session_info: SessionInfo,
    pub focusable_on_show: bool,
    pub is_system_calling: bool,
    pub is_atomic_service: bool,
    pub window_rect: Rect,
    pub request_rect: Rect,
    pub window_mode: WindowMode,
    pub window_flags: u32,
    pub system_bar: SystemBarMap,
    pub focusable: bool,
    pub touchable: bool,
    pub calling_session_id: PersistentId,
    pub requested_orientation: Orientation,
    pub default_requested_orientation: Orientation,
    pub turn_screen_on: bool,
    pub keep_screen_on: bool,
    pub brightness: f32,
    pub window_mode_support: WindowModeSupport,
    pub touch_hot_areas: Vec<Rect>,
    pub keyboard_touch_hot_areas: KeyboardTouchHotAreas,
    pub transform: Transform,
    pub animation_flag: WindowAnimation,
    pub privacy_mode: bool,
    pub system_privacy_mode: bool,
    pub aspect_ratio: f32,
    pub maximize_mode: MaximizeMode,
    pub decor_enable: bool,
    pub limits: WindowLimits,
    pub user_limits: WindowLimits,
    pub config_limits_vp: WindowLimits,
    pub last_limits_vpr: f32,
    pub drag_enabled: bool,
    pub raise_enabled: bool,
    pub hide_non_system_floating_windows: bool,
    pub force_hide: bool,
    pub textfield_avoid_info: TextFieldAvoidInfo,
    pub window_mask: Option<WindowMask>,
    pub topmost: bool,
    pub snapshot_skip: bool,
    pub main_window_topmost: bool,
    pub exclusively_highlighted: bool,
    pub sub_window_level: u32,
    pub sub_window_z_level: i32,
    pub avoid_area_option: u32,
    pub background_alpha: u8,
    pub follow_screen_change: bool,
    pub view_keep_screen_on: bool,
    pub window_shadow_enabled: bool,
    pub keyboard_layout_params: KeyboardLayoutParams,
    pub pip_template_info: PiPTemplateInfo,
    pub corner_radius: f32,
    pub shadows: ShadowsInfo,
    pub compatible_mode: Option<CompatibleModeProperty>,
    pub transition_animations: TransitionAnimationMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults_match_window_manager_conventions() {
        let prop = WindowSessionProperty::default();
        assert!(prop.focusable());
        assert!(prop.touchable());
        assert!(prop.drag_enabled());
        assert!(prop.raise_enabled());
        assert!(prop.window_shadow_enabled());
        assert!(prop.focusable_on_show());
        assert!(prop.exclusively_highlighted());
        assert_eq!(prop.window_mode(), WindowMode::Fullscreen);
        assert_eq!(prop.maximize_mode(), MaximizeMode::Recover);
        assert_eq!(prop.window_type(), WindowType::AppMainWindow);
        assert_eq!(prop.background_alpha(), 0xff);
        assert!((prop.brightness() - UNDEFINED_BRIGHTNESS).abs() < f32::EPSILON);
        assert_eq!(prop.system_bar_properties().len(), 3);
    }

    #[test]
    fn rect_action_round_trip() {
        let mut src = WindowSessionProperty::default();
        assert_eq!(src.window_rect(), Rect::new(0, 0, 0, 0));
        src.set_window_rect(Rect::new(1, 2, 3, 4));

        let mut parcel = Parcel::new();
        src.write(&mut parcel, WsPropertyChangeAction::RECT).unwrap();

        let mut dst = WindowSessionProperty::default();
        dst.read(&mut parcel, WsPropertyChangeAction::RECT).unwrap();
        assert_eq!(dst.window_rect(), Rect::new(1, 2, 3, 4));
    }

    #[test]
    fn hot_area_setter_fires_callback_once_per_change() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut prop = WindowSessionProperty::default();
        prop.set_property_change_callback(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        prop.set_touch_hot_areas(vec![Rect::new(0, 0, 10, 10)]);
        prop.set_touch_hot_areas(vec![Rect::new(0, 0, 10, 10)]);
        prop.set_keyboard_touch_hot_areas(KeyboardTouchHotAreas {
            portrait_keyboard: vec![Rect::new(0, 0, 5, 5)],
            ..KeyboardTouchHotAreas::default()
        });
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // Plain setters never notify.
        prop.set_window_corner_radius(8.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn copy_from_skips_callback() {
        let mut src = WindowSessionProperty::default();
        src.set_property_change_callback(Arc::new(|| {}));
        src.set_window_name("main");
        src.set_touch_hot_areas(vec![Rect::new(1, 1, 1, 1)]);
        src.set_is_atomic_service(true);

        let mut dst = WindowSessionProperty::default();
        dst.copy_from(&src);
        assert!(!dst.has_property_change_callback());
        assert_eq!(dst.snapshot(), src.snapshot());

        let cloned = src.clone();
        assert!(!cloned.has_property_change_callback());
        assert_eq!(cloned, src);
    }

    #[test]
    fn full_marshal_round_trip() {
        let mut src = WindowSessionProperty::default();
        src.set_persistent_id(7);
        src.set_window_type(WindowType::Dialog);
        src.set_window_name("dialog");
        src.set_topmost(true);
        src.set_window_mask(Some(WindowMask {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        }));
        src.set_transition_animation(
            WindowTransitionType::Destroy,
            TransitionAnimation {
                duration_ms: 250,
                opacity: 0.5,
                ..TransitionAnimation::default()
            },
        );

        let mut parcel = Parcel::new();
        src.marshal(&mut parcel).unwrap();
        let decoded = WindowSessionProperty::unmarshal(&mut parcel).unwrap();
        assert_eq!(decoded, src);
        assert_eq!(parcel.remaining(), 0);
    }

    #[test]
    fn unmarshal_fails_closed() {
        let src = WindowSessionProperty::default();
        let mut parcel = Parcel::new();
        src.marshal(&mut parcel).unwrap();
        let bytes = parcel.into_bytes();
        let mut truncated = Parcel::from_bytes(bytes[..bytes.len() - 1].to_vec());
        assert!(WindowSessionProperty::unmarshal(&mut truncated).is_err());
        assert_eq!(truncated.read_position(), 0);
    }

    #[test]
    fn write_failure_leaves_parcel_unchanged() {
        let mut src = WindowSessionProperty::default();
        src.set_window_name("x");
        let mut parcel = Parcel::with_capacity(20);
        parcel.write_u32(99).unwrap();
        let err = src
            .write(
                &mut parcel,
                WsPropertyChangeAction::RECT | WsPropertyChangeAction::WINDOW_LIMITS,
            )
            .unwrap_err();
        assert!(matches!(err, ParcelError::CapacityExceeded { .. }));
        assert_eq!(parcel.len(), 4);
    }

    #[test]
    fn topmost_for_focus_by_type() {
        let mut prop = WindowSessionProperty::default();
        prop.set_main_window_topmost(true);
        assert!(prop.is_topmost_for_focus());
        prop.set_window_type(WindowType::Float);
        assert!(!prop.is_topmost_for_focus());
        prop.set_topmost(true);
        assert!(prop.is_topmost_for_focus());
    }
}

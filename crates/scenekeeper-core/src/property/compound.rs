//! Compound property values and their wire forms.
//!
//! Each type implements [`Marshal`]. Unmarshalling builds the value from
//! locals and only returns it once every sub-field decoded, so a failure
//! never yields a partially populated object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::Rect;
use crate::parcel::{Marshal, Parcel, ParcelError};
use crate::types::{WindowType, wire_enum};

/// Upper bound for PiP control lists.
pub const MAX_PIP_CONTROLS: u32 = 100;
/// Upper bound for hot-area lists.
pub const MAX_HOT_AREAS: u32 = 256;
/// Upper bound for transition-animation map entries.
pub const MAX_TRANSITIONS: u32 = 32;
/// Upper bound for a window mask in bytes (RGBA).
pub const MAX_MASK_BYTES: u64 = 16 * 1024 * 1024;

// =============================================================================
// Session info
// =============================================================================

/// Identity and metadata of a logical window instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub bundle_name: String,
    pub module_name: String,
    pub ability_name: String,
    /// Opaque handle of the caller's token object, if any.
    pub caller_token: Option<u64>,
    pub is_system: bool,
    pub persistent_id: i32,
    pub caller_persistent_id: i32,
    pub screen_id: u64,
    pub app_index: i32,
}

impl Marshal for SessionInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_string(&self.bundle_name)?;
        parcel.write_string(&self.module_name)?;
        parcel.write_string(&self.ability_name)?;
        parcel.write_bool(self.caller_token.is_some())?;
        if let Some(token) = self.caller_token {
            parcel.write_u64(token)?;
        }
        parcel.write_bool(self.is_system)?;
        parcel.write_i32(self.persistent_id)?;
        parcel.write_i32(self.caller_persistent_id)?;
        parcel.write_u64(self.screen_id)?;
        parcel.write_i32(self.app_index)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let bundle_name = parcel.read_string()?;
        let module_name = parcel.read_string()?;
        let ability_name = parcel.read_string()?;
        let caller_token = if parcel.read_bool()? {
            Some(parcel.read_u64()?)
        } else {
            None
        };
        Ok(Self {
            bundle_name,
            module_name,
            ability_name,
            caller_token,
            is_system: parcel.read_bool()?,
            persistent_id: parcel.read_i32()?,
            caller_persistent_id: parcel.read_i32()?,
            screen_id: parcel.read_u64()?,
            app_index: parcel.read_i32()?,
        })
    }
}

// =============================================================================
// Window limits
// =============================================================================

/// Size and aspect-ratio limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_ratio: f32,
    pub min_ratio: f32,
    pub vp_ratio: f32,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            max_width: u32::MAX,
            max_height: u32::MAX,
            min_width: 0,
            min_height: 0,
            max_ratio: f32::MAX,
            min_ratio: 0.0,
            vp_ratio: 1.0,
        }
    }
}

impl WindowLimits {
    /// Clamp a rect's size into the limits, keeping its origin.
    #[must_use]
    pub fn clamp(&self, rect: Rect) -> Rect {
        Rect {
            width: rect.width.clamp(self.min_width, self.max_width.max(self.min_width)),
            height: rect
                .height
                .clamp(self.min_height, self.max_height.max(self.min_height)),
            ..rect
        }
    }
}

impl Marshal for WindowLimits {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_u32(self.max_width)?;
        parcel.write_u32(self.max_height)?;
        parcel.write_u32(self.min_width)?;
        parcel.write_u32(self.min_height)?;
        parcel.write_f32(self.max_ratio)?;
        parcel.write_f32(self.min_ratio)?;
        parcel.write_f32(self.vp_ratio)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            max_width: parcel.read_u32()?,
            max_height: parcel.read_u32()?,
            min_width: parcel.read_u32()?,
            min_height: parcel.read_u32()?,
            max_ratio: parcel.read_f32()?,
            min_ratio: parcel.read_f32()?,
            vp_ratio: parcel.read_f32()?,
        })
    }
}

// =============================================================================
// System bars
// =============================================================================

/// Appearance of one system bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemBarProperty {
    pub enable: bool,
    pub background_color: u32,
    pub content_color: u32,
    pub enable_animation: bool,
    pub setting_flag: u32,
}

impl Default for SystemBarProperty {
    fn default() -> Self {
        Self {
            enable: true,
            background_color: 0x00FF_FFFF,
            content_color: 0xFF00_0000,
            enable_animation: false,
            setting_flag: 0,
        }
    }
}

impl Marshal for SystemBarProperty {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_bool(self.enable)?;
        parcel.write_u32(self.background_color)?;
        parcel.write_u32(self.content_color)?;
        parcel.write_bool(self.enable_animation)?;
        parcel.write_u32(self.setting_flag)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            enable: parcel.read_bool()?,
            background_color: parcel.read_u32()?,
            content_color: parcel.read_u32()?,
            enable_animation: parcel.read_bool()?,
            setting_flag: parcel.read_u32()?,
        })
    }
}

/// Per-bar-type appearance.
pub type SystemBarMap = BTreeMap<WindowType, SystemBarProperty>;

/// Status bar, navigation bar and navigation indicator with default appearance.
#[must_use]
pub fn default_system_bar_map() -> SystemBarMap {
    [
        WindowType::StatusBar,
        WindowType::NavigationBar,
        WindowType::NavigationIndicator,
    ]
    .into_iter()
    .map(|ty| (ty, SystemBarProperty::default()))
    .collect()
}

pub fn write_system_bar_map(parcel: &mut Parcel, map: &SystemBarMap) -> Result<(), ParcelError> {
    parcel.write_len(map.len())?;
    for (ty, prop) in map {
        parcel.write_u32(ty.as_u32())?;
        prop.marshal(parcel)?;
    }
    Ok(())
}

pub fn read_system_bar_map(parcel: &mut Parcel) -> Result<SystemBarMap, ParcelError> {
    let len = parcel.read_len(16)?;
    let mut map = SystemBarMap::new();
    for _ in 0..len {
        let ty = WindowType::decode(parcel.read_u32()?)?;
        map.insert(ty, SystemBarProperty::unmarshal(parcel)?);
    }
    Ok(map)
}

// =============================================================================
// Picture-in-picture
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiPControlStatusInfo {
    pub control_type: u32,
    pub status: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiPControlEnableInfo {
    pub control_type: u32,
    pub enabled: i32,
}

/// PiP template parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiPTemplateInfo {
    pub pip_template_type: u32,
    pub priority: u32,
    pub control_group: Vec<u32>,
    pub control_status_info_list: Vec<PiPControlStatusInfo>,
    pub control_enable_info_list: Vec<PiPControlEnableInfo>,
}

impl Marshal for PiPTemplateInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_u32(self.pip_template_type)?;
        parcel.write_u32(self.priority)?;
        parcel.write_u32_vec(&self.control_group)?;
        parcel.write_len(self.control_status_info_list.len())?;
        for info in &self.control_status_info_list {
            parcel.write_u32(info.control_type)?;
            parcel.write_i32(info.status)?;
        }
        parcel.write_len(self.control_enable_info_list.len())?;
        for info in &self.control_enable_info_list {
            parcel.write_u32(info.control_type)?;
            parcel.write_i32(info.enabled)?;
        }
        Ok(())
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let pip_template_type = parcel.read_u32()?;
        let priority = parcel.read_u32()?;
        let group_len = parcel.read_len(MAX_PIP_CONTROLS)?;
        let control_group = (0..group_len)
            .map(|_| parcel.read_u32())
            .collect::<Result<Vec<_>, _>>()?;
        let status_len = parcel.read_len(MAX_PIP_CONTROLS)?;
        let mut control_status_info_list = Vec::with_capacity(status_len);
        for _ in 0..status_len {
            control_status_info_list.push(PiPControlStatusInfo {
                control_type: parcel.read_u32()?,
                status: parcel.read_i32()?,
            });
        }
        let enable_len = parcel.read_len(MAX_PIP_CONTROLS)?;
        let mut control_enable_info_list = Vec::with_capacity(enable_len);
        for _ in 0..enable_len {
            control_enable_info_list.push(PiPControlEnableInfo {
                control_type: parcel.read_u32()?,
                enabled: parcel.read_i32()?,
            });
        }
        Ok(Self {
            pip_template_type,
            priority,
            control_group,
            control_status_info_list,
            control_enable_info_list,
        })
    }
}

// =============================================================================
// Window mask
// =============================================================================

/// RGBA mask image shaping a window. Pixels are opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMask {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl WindowMask {
    fn expected_len(width: u32, height: u32) -> u64 {
        u64::from(width) * u64::from(height) * 4
    }
}

impl Marshal for WindowMask {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_u32(self.width)?;
        parcel.write_u32(self.height)?;
        parcel.write_bytes(&self.pixels)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let width = parcel.read_u32()?;
        let height = parcel.read_u32()?;
        let expected = Self::expected_len(width, height);
        if expected > MAX_MASK_BYTES {
            return Err(ParcelError::LengthOverflow {
                len: expected,
                limit: MAX_MASK_BYTES,
            });
        }
        let pixels = parcel.read_bytes()?;
        if pixels.len() as u64 != expected {
            return Err(ParcelError::LengthOverflow {
                len: pixels.len() as u64,
                limit: expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

// =============================================================================
// Transition animations
// =============================================================================

wire_enum! {
    #[derive(Default)]
    pub enum WindowTransitionType {
        #[default]
        Destroy = 0 => "destroy",
        Startup = 1 => "startup",
    }
}

/// Animation applied on a window transition. Curves are not evaluated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionAnimation {
    pub animation_type: u32,
    pub duration_ms: u32,
    pub curve_type: u32,
    pub curve_params: Vec<f32>,
    pub opacity: f32,
}

impl Marshal for TransitionAnimation {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_u32(self.animation_type)?;
        parcel.write_u32(self.duration_ms)?;
        parcel.write_u32(self.curve_type)?;
        parcel.write_f32_vec(&self.curve_params)?;
        parcel.write_f32(self.opacity)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let animation_type = parcel.read_u32()?;
        let duration_ms = parcel.read_u32()?;
        let curve_type = parcel.read_u32()?;
        let curve_len = parcel.read_len(8)?;
        let curve_params = (0..curve_len)
            .map(|_| parcel.read_f32())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            animation_type,
            duration_ms,
            curve_type,
            curve_params,
            opacity: parcel.read_f32()?,
        })
    }
}

pub type TransitionAnimationMap = BTreeMap<WindowTransitionType, TransitionAnimation>;

pub fn write_transition_map(
    parcel: &mut Parcel,
    map: &TransitionAnimationMap,
) -> Result<(), ParcelError> {
    parcel.write_len(map.len())?;
    for (ty, animation) in map {
        parcel.write_u32(ty.as_u32())?;
        animation.marshal(parcel)?;
    }
    Ok(())
}

pub fn read_transition_map(parcel: &mut Parcel) -> Result<TransitionAnimationMap, ParcelError> {
    let len = parcel.read_len(MAX_TRANSITIONS)?;
    let mut map = TransitionAnimationMap::new();
    for _ in 0..len {
        let ty = WindowTransitionType::decode(parcel.read_u32()?)?;
        map.insert(ty, TransitionAnimation::unmarshal(parcel)?);
    }
    Ok(map)
}

// =============================================================================
// Shadows
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowsInfo {
    pub radius: f32,
    pub color: String,
    pub offset_x: f32,
    pub offset_y: f32,
    pub has_radius: bool,
    pub has_color: bool,
    pub has_offset_x: bool,
    pub has_offset_y: bool,
}

impl Marshal for ShadowsInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_bool(self.has_radius)?;
        parcel.write_bool(self.has_color)?;
        parcel.write_bool(self.has_offset_x)?;
        parcel.write_bool(self.has_offset_y)?;
        parcel.write_f32(self.radius)?;
        parcel.write_string(&self.color)?;
        parcel.write_f32(self.offset_x)?;
        parcel.write_f32(self.offset_y)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let has_radius = parcel.read_bool()?;
        let has_color = parcel.read_bool()?;
        let has_offset_x = parcel.read_bool()?;
        let has_offset_y = parcel.read_bool()?;
        Ok(Self {
            radius: parcel.read_f32()?,
            color: parcel.read_string()?,
            offset_x: parcel.read_f32()?,
            offset_y: parcel.read_f32()?,
            has_radius,
            has_color,
            has_offset_x,
            has_offset_y,
        })
    }
}

// =============================================================================
// Keyboard
// =============================================================================

/// Soft keyboard placement for both orientations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardLayoutParams {
    pub gravity: u32,
    pub landscape_avoid_height: i32,
    pub portrait_avoid_height: i32,
    pub landscape_keyboard_rect: Rect,
    pub portrait_keyboard_rect: Rect,
    pub landscape_panel_rect: Rect,
    pub portrait_panel_rect: Rect,
    pub display_id: u64,
}

impl Marshal for KeyboardLayoutParams {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_u32(self.gravity)?;
        parcel.write_i32(self.landscape_avoid_height)?;
        parcel.write_i32(self.portrait_avoid_height)?;
        self.landscape_keyboard_rect.marshal(parcel)?;
        self.portrait_keyboard_rect.marshal(parcel)?;
        self.landscape_panel_rect.marshal(parcel)?;
        self.portrait_panel_rect.marshal(parcel)?;
        parcel.write_u64(self.display_id)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            gravity: parcel.read_u32()?,
            landscape_avoid_height: parcel.read_i32()?,
            portrait_avoid_height: parcel.read_i32()?,
            landscape_keyboard_rect: Rect::unmarshal(parcel)?,
            portrait_keyboard_rect: Rect::unmarshal(parcel)?,
            landscape_panel_rect: Rect::unmarshal(parcel)?,
            portrait_panel_rect: Rect::unmarshal(parcel)?,
            display_id: parcel.read_u64()?,
        })
    }
}

/// Touch hot areas of the keyboard and its panel, per orientation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardTouchHotAreas {
    pub landscape_keyboard: Vec<Rect>,
    pub portrait_keyboard: Vec<Rect>,
    pub landscape_panel: Vec<Rect>,
    pub portrait_panel: Vec<Rect>,
}

impl KeyboardTouchHotAreas {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landscape_keyboard.is_empty()
            && self.portrait_keyboard.is_empty()
            && self.landscape_panel.is_empty()
            && self.portrait_panel.is_empty()
    }
}

impl Marshal for KeyboardTouchHotAreas {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_values(&self.landscape_keyboard)?;
        parcel.write_values(&self.portrait_keyboard)?;
        parcel.write_values(&self.landscape_panel)?;
        parcel.write_values(&self.portrait_panel)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            landscape_keyboard: parcel.read_values(MAX_HOT_AREAS)?,
            portrait_keyboard: parcel.read_values(MAX_HOT_AREAS)?,
            landscape_panel: parcel.read_values(MAX_HOT_AREAS)?,
            portrait_panel: parcel.read_values(MAX_HOT_AREAS)?,
        })
    }
}

// =============================================================================
// Compatible mode
// =============================================================================

/// Adaptation switches for applications running in compatible mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibleModeProperty {
    pub is_adapt_to_immersive: bool,
    pub is_adapt_to_eventmap_immersive: bool,
    pub is_adapt_to_proportional_scale: bool,
    pub is_adapt_to_back_button: bool,
    pub disable_drag_resize: bool,
    pub disable_resize_with_dpi: bool,
    pub disable_fullscreen: bool,
    pub disable_split: bool,
    pub disable_window_limit: bool,
    pub is_full_screen_start: bool,
    pub is_support_rotate_full_screen: bool,
}

impl CompatibleModeProperty {
    fn flags(&self) -> [bool; 11] {
        [
            self.is_adapt_to_immersive,
            self.is_adapt_to_eventmap_immersive,
            self.is_adapt_to_proportional_scale,
            self.is_adapt_to_back_button,
            self.disable_drag_resize,
            self.disable_resize_with_dpi,
            self.disable_fullscreen,
            self.disable_split,
            self.disable_window_limit,
            self.is_full_screen_start,
            self.is_support_rotate_full_screen,
        ]
    }
}

impl Marshal for CompatibleModeProperty {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        self.flags().into_iter().try_for_each(|flag| parcel.write_bool(flag))
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let mut flags = [false; 11];
        for flag in &mut flags {
            *flag = parcel.read_bool()?;
        }
        let [
            is_adapt_to_immersive,
            is_adapt_to_eventmap_immersive,
            is_adapt_to_proportional_scale,
            is_adapt_to_back_button,
            disable_drag_resize,
            disable_resize_with_dpi,
            disable_fullscreen,
            disable_split,
            disable_window_limit,
            is_full_screen_start,
            is_support_rotate_full_screen,
        ] = flags;
        Ok(Self {
            is_adapt_to_immersive,
            is_adapt_to_eventmap_immersive,
            is_adapt_to_proportional_scale,
            is_adapt_to_back_button,
            disable_drag_resize,
            disable_resize_with_dpi,
            disable_fullscreen,
            disable_split,
            disable_window_limit,
            is_full_screen_start,
            is_support_rotate_full_screen,
        })
    }
}

// =============================================================================
// Small value groups
// =============================================================================

/// 3D transform applied by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub pivot_x: f32,
    pub pivot_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub scale_z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub translate_z: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pivot_x: 0.5,
            pivot_y: 0.5,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            translate_x: 0.0,
            translate_y: 0.0,
            translate_z: 0.0,
        }
    }
}

impl Transform {
    fn values(&self) -> [f32; 11] {
        [
            self.pivot_x,
            self.pivot_y,
            self.scale_x,
            self.scale_y,
            self.scale_z,
            self.rotation_x,
            self.rotation_y,
            self.rotation_z,
            self.translate_x,
            self.translate_y,
            self.translate_z,
        ]
    }
}

impl Marshal for Transform {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        self.values().into_iter().try_for_each(|v| parcel.write_f32(v))
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        let mut v = [0.0f32; 11];
        for slot in &mut v {
            *slot = parcel.read_f32()?;
        }
        Ok(Self {
            pivot_x: v[0],
            pivot_y: v[1],
            scale_x: v[2],
            scale_y: v[3],
            scale_z: v[4],
            rotation_x: v[5],
            rotation_y: v[6],
            rotation_z: v[7],
            translate_x: v[8],
            translate_y: v[9],
            translate_z: v[10],
        })
    }
}

/// Caret position used to lift a window above the keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFieldAvoidInfo {
    pub position_y: f64,
    pub height: f64,
}

impl Marshal for TextFieldAvoidInfo {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        parcel.write_f64(self.position_y)?;
        parcel.write_f64(self.height)
    }

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            position_y: parcel.read_f64()?,
            height: parcel.read_f64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_is_unbounded() {
        let limits = WindowLimits::default();
        assert_eq!(limits.max_width, u32::MAX);
        assert_eq!(limits.min_height, 0);
        assert!((limits.vp_ratio - 1.0).abs() < f32::EPSILON);
        let clamped = WindowLimits {
            max_width: 100,
            min_height: 50,
            ..WindowLimits::default()
        }
        .clamp(Rect::new(5, 5, 300, 10));
        assert_eq!(clamped, Rect::new(5, 5, 100, 50));
    }

    #[test]
    fn default_system_bars() {
        let map = default_system_bar_map();
        assert_eq!(map.len(), 3);
        let status = map[&WindowType::StatusBar];
        assert!(status.enable);
        assert_eq!(status.background_color, 0x00FF_FFFF);
        assert_eq!(status.content_color, 0xFF00_0000);
    }

    #[test]
    fn system_bar_map_rejects_unknown_type() {
        let mut parcel = Parcel::new();
        parcel.write_u32(1).unwrap();
        parcel.write_u32(9999).unwrap();
        SystemBarProperty::default().marshal(&mut parcel).unwrap();
        assert!(matches!(
            read_system_bar_map(&mut parcel),
            Err(ParcelError::InvalidEnum { kind: "WindowType", .. })
        ));
    }

    #[test]
    fn pip_template_fails_closed_on_truncation() {
        let info = PiPTemplateInfo {
            pip_template_type: 1,
            priority: 2,
            control_group: vec![101, 102],
            control_status_info_list: vec![PiPControlStatusInfo {
                control_type: 3,
                status: 1,
            }],
            control_enable_info_list: vec![],
        };
        let mut parcel = Parcel::new();
        info.marshal(&mut parcel).unwrap();
        let bytes = parcel.as_bytes();
        let mut truncated = Parcel::from_bytes(bytes[..bytes.len() - 2].to_vec());
        assert!(truncated.read_value::<PiPTemplateInfo>().is_err());
        assert_eq!(truncated.read_position(), 0);

        let mut full = Parcel::from_bytes(bytes.to_vec());
        assert_eq!(full.read_value::<PiPTemplateInfo>().unwrap(), info);
    }

    #[test]
    fn window_mask_length_must_match_dimensions() {
        let mut parcel = Parcel::new();
        parcel.write_u32(2).unwrap();
        parcel.write_u32(2).unwrap();
        parcel.write_bytes(&[0u8; 15]).unwrap();
        assert!(parcel.read_value::<WindowMask>().is_err());

        let mask = WindowMask {
            width: 2,
            height: 1,
            pixels: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let mut parcel = Parcel::new();
        mask.marshal(&mut parcel).unwrap();
        assert_eq!(parcel.read_value::<WindowMask>().unwrap(), mask);
    }

    #[test]
    fn shadows_keep_presence_flags() {
        let shadows = ShadowsInfo {
            radius: 4.0,
            color: "#FF000000".into(),
            has_radius: true,
            has_color: true,
            ..ShadowsInfo::default()
        };
        let mut parcel = Parcel::new();
        shadows.marshal(&mut parcel).unwrap();
        assert_eq!(parcel.read_value::<ShadowsInfo>().unwrap(), shadows);
    }

    #[test]
    fn compatible_mode_bit_order() {
        let prop = CompatibleModeProperty {
            disable_split: true,
            ..CompatibleModeProperty::default()
        };
        let mut parcel = Parcel::new();
        prop.marshal(&mut parcel).unwrap();
        assert_eq!(parcel.as_bytes()[7], 1);
        assert_eq!(parcel.as_bytes().iter().filter(|b| **b == 1).count(), 1);
    }
}

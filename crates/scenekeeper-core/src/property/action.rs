//! Property change actions and the per-action handler table.
//!
//! Every action bit owns a fixed group of fields. [`ACTION_HANDLERS`] maps
//! each bit to a serializer, a deserializer and a field-copy routine. The
//! table is indexed by bit position, and a compile-time check keeps it in
//! lock-step with the flag set.

use bitflags::bitflags;

use super::WindowSessionProperty;
use super::compound::{
    CompatibleModeProperty, KeyboardLayoutParams, KeyboardTouchHotAreas, MAX_HOT_AREAS,
    PiPTemplateInfo, ShadowsInfo, SystemBarProperty, TextFieldAvoidInfo, Transform,
    WindowLimits, WindowMask, read_system_bar_map, read_transition_map, write_system_bar_map,
    write_transition_map,
};
use crate::geometry::Rect;
use crate::parcel::{Marshal, Parcel, ParcelError};
use crate::types::{
    MaximizeMode, Orientation, WindowAnimation, WindowMode, WindowModeSupport, WindowType,
};

bitflags! {
    /// Which field groups of a [`WindowSessionProperty`] a transfer carries.
    #[derive(Default)]
    pub struct WsPropertyChangeAction: u64 {
        const RECT = 1 << 0;
        const MODE = 1 << 1;
        const FLAGS = 1 << 2;
        const OTHER_PROPS = 1 << 3;
        const FOCUSABLE = 1 << 4;
        const TOUCHABLE = 1 << 5;
        const CALLING_WINDOW = 1 << 6;
        const ORIENTATION = 1 << 7;
        const TURN_SCREEN_ON = 1 << 8;
        const KEEP_SCREEN_ON = 1 << 9;
        const SET_BRIGHTNESS = 1 << 10;
        const MODE_SUPPORT_INFO = 1 << 11;
        const TOUCH_HOT_AREA = 1 << 12;
        const TRANSFORM_PROPERTY = 1 << 13;
        const ANIMATION_FLAG = 1 << 14;
        const PRIVACY_MODE = 1 << 15;
        const ASPECT_RATIO = 1 << 16;
        const MAXIMIZE_STATE = 1 << 17;
        const DECOR_ENABLE = 1 << 18;
        const WINDOW_LIMITS = 1 << 19;
        const DRAGENABLED = 1 << 20;
        const RAISEENABLED = 1 << 21;
        const HIDE_NON_SYSTEM_FLOATING_WINDOWS = 1 << 22;
        const SYSTEM_PRIVACY_MODE = 1 << 23;
        const STATUS_PROPS = 1 << 24;
        const NAVIGATION_PROPS = 1 << 25;
        const NAVIGATION_INDICATOR_PROPS = 1 << 26;
        const TEXTFIELD_AVOID_INFO = 1 << 27;
        const WINDOW_MASK = 1 << 28;
        const TOPMOST = 1 << 29;
        const SNAPSHOT_SKIP = 1 << 30;
        const MAIN_WINDOW_TOPMOST = 1 << 31;
        const EXCLUSIVE_HIGHLIGHTED = 1 << 32;
        const KEYBOARD_TOUCH_HOT_AREA = 1 << 33;
        const SUB_WINDOW_Z_LEVEL = 1 << 34;
        const AVOID_AREA_OPTION = 1 << 35;
        const BACKGROUND_ALPHA = 1 << 36;
        const FOLLOW_SCREEN_CHANGE = 1 << 37;
        const VIEW_KEEP_SCREEN_ON = 1 << 38;
        const WINDOW_SHADOW_ENABLED = 1 << 39;
        const KEYBOARD_LAYOUT = 1 << 40;
        const PIP_TEMPLATE_INFO = 1 << 41;
        const WINDOW_CORNER_RADIUS = 1 << 42;
        const WINDOW_SHADOWS = 1 << 43;
        const COMPATIBLE_MODE = 1 << 44;
        const TRANSITION_ANIMATION = 1 << 45;
    }
}

impl WsPropertyChangeAction {
    /// Accept a raw wire value only if it names exactly one known action.
    #[must_use]
    pub fn single_from_wire(raw: u64) -> Option<Self> {
        if raw.is_power_of_two() {
            Self::from_bits(raw)
        } else {
            None
        }
    }

    /// Handler names of every set bit, in ascending bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        handlers_in(self).map(|handler| handler.name).collect()
    }
}

impl std::fmt::Display for WsPropertyChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        f.write_str(&self.names().join("|"))
    }
}

type WriteFn = fn(&WindowSessionProperty, &mut Parcel) -> Result<(), ParcelError>;
type ReadFn = fn(&mut WindowSessionProperty, &mut Parcel) -> Result<(), ParcelError>;
type CopyFn = fn(&mut WindowSessionProperty, &WindowSessionProperty);

/// Serializer, deserializer and copier for one action bit.
pub struct ActionHandler {
    pub action: WsPropertyChangeAction,
    pub name: &'static str,
    write_fn: WriteFn,
    read_fn: ReadFn,
    copy_fn: CopyFn,
}

impl ActionHandler {
    /// Write this action's fields; the parcel is rolled back on failure.
    pub fn write(
        &self,
        prop: &WindowSessionProperty,
        parcel: &mut Parcel,
    ) -> Result<(), ParcelError> {
        parcel.write_group(|p| (self.write_fn)(prop, p))
    }

    /// Read this action's fields; the read cursor is restored on failure and
    /// `prop` keeps its previous values.
    pub fn read(
        &self,
        prop: &mut WindowSessionProperty,
        parcel: &mut Parcel,
    ) -> Result<(), ParcelError> {
        parcel.read_group(|p| (self.read_fn)(prop, p))
    }

    pub fn copy(&self, dst: &mut WindowSessionProperty, src: &WindowSessionProperty) {
        (self.copy_fn)(dst, src);
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("action", &self.action.bits())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Handler for a single-bit action.
#[must_use]
pub fn handler_for(action: WsPropertyChangeAction) -> Option<&'static ActionHandler> {
    let bits = action.bits();
    if !bits.is_power_of_two() {
        return None;
    }
    ACTION_HANDLERS.get(bits.trailing_zeros() as usize)
}

fn handlers_in(actions: WsPropertyChangeAction) -> impl Iterator<Item = &'static ActionHandler> {
    ACTION_HANDLERS
        .iter()
        .filter(move |handler| actions.contains(handler.action))
}

pub(super) fn write_actions(
    prop: &WindowSessionProperty,
    parcel: &mut Parcel,
    actions: WsPropertyChangeAction,
) -> Result<(), ParcelError> {
    parcel.write_group(|p| {
        for handler in handlers_in(actions) {
            (handler.write_fn)(prop, p)?;
        }
        Ok(())
    })
}

pub(super) fn read_actions(
    prop: &mut WindowSessionProperty,
    parcel: &mut Parcel,
    actions: WsPropertyChangeAction,
) -> Result<(), ParcelError> {
    for handler in handlers_in(actions) {
        if let Err(err) = handler.read(prop, parcel) {
            tracing::debug!(action = handler.name, error = %err, "property action decode failed");
            return Err(err);
        }
    }
    Ok(())
}

// =============================================================================
// Handler construction
// =============================================================================

macro_rules! flag {
    ($action:ident, $field:ident) => {
        ActionHandler {
            action: WsPropertyChangeAction::$action,
            name: stringify!($action),
            write_fn: |prop, parcel| parcel.write_bool(prop.$field),
            read_fn: |prop, parcel| {
                prop.$field = parcel.read_bool()?;
                Ok(())
            },
            copy_fn: |dst, src| dst.$field = src.$field,
        }
    };
}

macro_rules! scalar {
    ($action:ident, $field:ident, $write:ident, $read:ident) => {
        ActionHandler {
            action: WsPropertyChangeAction::$action,
            name: stringify!($action),
            write_fn: |prop, parcel| parcel.$write(prop.$field),
            read_fn: |prop, parcel| {
                prop.$field = parcel.$read()?;
                Ok(())
            },
            copy_fn: |dst, src| dst.$field = src.$field,
        }
    };
}

macro_rules! enumerated {
    ($action:ident, $field:ident, $ty:ident) => {
        ActionHandler {
            action: WsPropertyChangeAction::$action,
            name: stringify!($action),
            write_fn: |prop, parcel| parcel.write_u32(prop.$field.as_u32()),
            read_fn: |prop, parcel| {
                prop.$field = $ty::decode(parcel.read_u32()?)?;
                Ok(())
            },
            copy_fn: |dst, src| dst.$field = src.$field,
        }
    };
}

macro_rules! value {
    ($action:ident, $field:ident, $ty:ty) => {
        ActionHandler {
            action: WsPropertyChangeAction::$action,
            name: stringify!($action),
            write_fn: |prop, parcel| prop.$field.marshal(parcel),
            read_fn: |prop, parcel| {
                prop.$field = <$ty>::unmarshal(parcel)?;
                Ok(())
            },
            copy_fn: |dst, src| dst.$field.clone_from(&src.$field),
        }
    };
}

macro_rules! system_bar {
    ($action:ident, $bar:ident) => {
        ActionHandler {
            action: WsPropertyChangeAction::$action,
            name: stringify!($action),
            write_fn: |prop, parcel| {
                prop.system_bar_property(WindowType::$bar)
                    .unwrap_or_default()
                    .marshal(parcel)
            },
            read_fn: |prop, parcel| {
                let bar = SystemBarProperty::unmarshal(parcel)?;
                prop.system_bar.insert(WindowType::$bar, bar);
                Ok(())
            },
            copy_fn: |dst, src| {
                if let Some(bar) = src.system_bar_property(WindowType::$bar) {
                    dst.system_bar.insert(WindowType::$bar, bar);
                }
            },
        }
    };
}

/// One entry per action bit, ordered by bit position.
pub const ACTION_HANDLERS: &[ActionHandler] = &[
    ActionHandler {
        action: WsPropertyChangeAction::RECT,
        name: "RECT",
        write_fn: |prop, parcel| {
            prop.window_rect.marshal(parcel)?;
            prop.request_rect.marshal(parcel)
        },
        read_fn: |prop, parcel| {
            let window_rect = Rect::unmarshal(parcel)?;
            let request_rect = Rect::unmarshal(parcel)?;
            prop.window_rect = window_rect;
            prop.request_rect = request_rect;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.window_rect = src.window_rect;
            dst.request_rect = src.request_rect;
        },
    },
    enumerated!(MODE, window_mode, WindowMode),
    scalar!(FLAGS, window_flags, write_u32, read_u32),
    ActionHandler {
        action: WsPropertyChangeAction::OTHER_PROPS,
        name: "OTHER_PROPS",
        write_fn: |prop, parcel| write_system_bar_map(parcel, &prop.system_bar),
        read_fn: |prop, parcel| {
            prop.system_bar = read_system_bar_map(parcel)?;
            Ok(())
        },
        copy_fn: |dst, src| dst.system_bar.clone_from(&src.system_bar),
    },
    flag!(FOCUSABLE, focusable),
    flag!(TOUCHABLE, touchable),
    scalar!(CALLING_WINDOW, calling_session_id, write_i32, read_i32),
    ActionHandler {
        action: WsPropertyChangeAction::ORIENTATION,
        name: "ORIENTATION",
        write_fn: |prop, parcel| {
            parcel.write_u32(prop.requested_orientation.as_u32())?;
            parcel.write_u32(prop.default_requested_orientation.as_u32())
        },
        read_fn: |prop, parcel| {
            let requested = Orientation::decode(parcel.read_u32()?)?;
            let default_requested = Orientation::decode(parcel.read_u32()?)?;
            prop.requested_orientation = requested;
            prop.default_requested_orientation = default_requested;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.requested_orientation = src.requested_orientation;
            dst.default_requested_orientation = src.default_requested_orientation;
        },
    },
    flag!(TURN_SCREEN_ON, turn_screen_on),
    flag!(KEEP_SCREEN_ON, keep_screen_on),
    scalar!(SET_BRIGHTNESS, brightness, write_f32, read_f32),
    enumerated!(MODE_SUPPORT_INFO, window_mode_support, WindowModeSupport),
    ActionHandler {
        action: WsPropertyChangeAction::TOUCH_HOT_AREA,
        name: "TOUCH_HOT_AREA",
        write_fn: |prop, parcel| parcel.write_values(&prop.touch_hot_areas()),
        read_fn: |prop, parcel| {
            let areas = parcel.read_values::<Rect>(MAX_HOT_AREAS)?;
            prop.set_touch_hot_areas(areas);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_touch_hot_areas(src.touch_hot_areas()),
    },
    value!(TRANSFORM_PROPERTY, transform, Transform),
    enumerated!(ANIMATION_FLAG, animation_flag, WindowAnimation),
    ActionHandler {
        action: WsPropertyChangeAction::PRIVACY_MODE,
        name: "PRIVACY_MODE",
        write_fn: |prop, parcel| {
            parcel.write_bool(prop.privacy_mode)?;
            parcel.write_bool(prop.system_privacy_mode)
        },
        read_fn: |prop, parcel| {
            let privacy = parcel.read_bool()?;
            let system_privacy = parcel.read_bool()?;
            prop.privacy_mode = privacy;
            prop.system_privacy_mode = system_privacy;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.privacy_mode = src.privacy_mode;
            dst.system_privacy_mode = src.system_privacy_mode;
        },
    },
    scalar!(ASPECT_RATIO, aspect_ratio, write_f32, read_f32),
    enumerated!(MAXIMIZE_STATE, maximize_mode, MaximizeMode),
    flag!(DECOR_ENABLE, decor_enable),
    ActionHandler {
        action: WsPropertyChangeAction::WINDOW_LIMITS,
        name: "WINDOW_LIMITS",
        write_fn: |prop, parcel| {
            prop.limits.marshal(parcel)?;
            prop.user_limits.marshal(parcel)?;
            prop.config_limits_vp.marshal(parcel)?;
            parcel.write_f32(prop.last_limits_vpr)
        },
        read_fn: |prop, parcel| {
            let limits = WindowLimits::unmarshal(parcel)?;
            let user_limits = WindowLimits::unmarshal(parcel)?;
            let config_limits_vp = WindowLimits::unmarshal(parcel)?;
            let last_limits_vpr = parcel.read_f32()?;
            prop.limits = limits;
            prop.user_limits = user_limits;
            prop.config_limits_vp = config_limits_vp;
            prop.last_limits_vpr = last_limits_vpr;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.limits = src.limits;
            dst.user_limits = src.user_limits;
            dst.config_limits_vp = src.config_limits_vp;
            dst.last_limits_vpr = src.last_limits_vpr;
        },
    },
    flag!(DRAGENABLED, drag_enabled),
    flag!(RAISEENABLED, raise_enabled),
    ActionHandler {
        action: WsPropertyChangeAction::HIDE_NON_SYSTEM_FLOATING_WINDOWS,
        name: "HIDE_NON_SYSTEM_FLOATING_WINDOWS",
        write_fn: |prop, parcel| {
            parcel.write_bool(prop.hide_non_system_floating_windows)?;
            parcel.write_bool(prop.force_hide)
        },
        read_fn: |prop, parcel| {
            let hide = parcel.read_bool()?;
            let force_hide = parcel.read_bool()?;
            prop.hide_non_system_floating_windows = hide;
            prop.force_hide = force_hide;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.hide_non_system_floating_windows = src.hide_non_system_floating_windows;
            dst.force_hide = src.force_hide;
        },
    },
    flag!(SYSTEM_PRIVACY_MODE, system_privacy_mode),
    system_bar!(STATUS_PROPS, StatusBar),
    system_bar!(NAVIGATION_PROPS, NavigationBar),
    system_bar!(NAVIGATION_INDICATOR_PROPS, NavigationIndicator),
    value!(TEXTFIELD_AVOID_INFO, textfield_avoid_info, TextFieldAvoidInfo),
    ActionHandler {
        action: WsPropertyChangeAction::WINDOW_MASK,
        name: "WINDOW_MASK",
        write_fn: |prop, parcel| {
            let mask = prop.window_mask();
            parcel.write_bool(mask.is_some())?;
            match mask {
                Some(mask) => mask.marshal(parcel),
                None => Ok(()),
            }
        },
        read_fn: |prop, parcel| {
            let mask = if parcel.read_bool()? {
                Some(WindowMask::unmarshal(parcel)?)
            } else {
                None
            };
            prop.set_window_mask(mask);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_window_mask(src.window_mask()),
    },
    flag!(TOPMOST, topmost),
    flag!(SNAPSHOT_SKIP, snapshot_skip),
    flag!(MAIN_WINDOW_TOPMOST, main_window_topmost),
    flag!(EXCLUSIVE_HIGHLIGHTED, exclusively_highlighted),
    ActionHandler {
        action: WsPropertyChangeAction::KEYBOARD_TOUCH_HOT_AREA,
        name: "KEYBOARD_TOUCH_HOT_AREA",
        write_fn: |prop, parcel| prop.keyboard_touch_hot_areas().marshal(parcel),
        read_fn: |prop, parcel| {
            let areas = KeyboardTouchHotAreas::unmarshal(parcel)?;
            prop.set_keyboard_touch_hot_areas(areas);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_keyboard_touch_hot_areas(src.keyboard_touch_hot_areas()),
    },
    ActionHandler {
        action: WsPropertyChangeAction::SUB_WINDOW_Z_LEVEL,
        name: "SUB_WINDOW_Z_LEVEL",
        write_fn: |prop, parcel| {
            parcel.write_u32(prop.sub_window_level)?;
            parcel.write_i32(prop.sub_window_z_level)
        },
        read_fn: |prop, parcel| {
            let level = parcel.read_u32()?;
            let z_level = parcel.read_i32()?;
            prop.sub_window_level = level;
            prop.sub_window_z_level = z_level;
            Ok(())
        },
        copy_fn: |dst, src| {
            dst.sub_window_level = src.sub_window_level;
            dst.sub_window_z_level = src.sub_window_z_level;
        },
    },
    scalar!(AVOID_AREA_OPTION, avoid_area_option, write_u32, read_u32),
    scalar!(BACKGROUND_ALPHA, background_alpha, write_u8, read_u8),
    flag!(FOLLOW_SCREEN_CHANGE, follow_screen_change),
    flag!(VIEW_KEEP_SCREEN_ON, view_keep_screen_on),
    flag!(WINDOW_SHADOW_ENABLED, window_shadow_enabled),
    value!(KEYBOARD_LAYOUT, keyboard_layout_params, KeyboardLayoutParams),
    value!(PIP_TEMPLATE_INFO, pip_template_info, PiPTemplateInfo),
    ActionHandler {
        action: WsPropertyChangeAction::WINDOW_CORNER_RADIUS,
        name: "WINDOW_CORNER_RADIUS",
        write_fn: |prop, parcel| parcel.write_f32(prop.window_corner_radius()),
        read_fn: |prop, parcel| {
            prop.set_window_corner_radius(parcel.read_f32()?);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_window_corner_radius(src.window_corner_radius()),
    },
    ActionHandler {
        action: WsPropertyChangeAction::WINDOW_SHADOWS,
        name: "WINDOW_SHADOWS",
        write_fn: |prop, parcel| prop.window_shadows().marshal(parcel),
        read_fn: |prop, parcel| {
            prop.set_window_shadows(ShadowsInfo::unmarshal(parcel)?);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_window_shadows(src.window_shadows()),
    },
    ActionHandler {
        action: WsPropertyChangeAction::COMPATIBLE_MODE,
        name: "COMPATIBLE_MODE",
        write_fn: |prop, parcel| {
            let mode = prop.compatible_mode_property();
            parcel.write_bool(mode.is_some())?;
            match mode {
                Some(mode) => mode.marshal(parcel),
                None => Ok(()),
            }
        },
        read_fn: |prop, parcel| {
            let mode = if parcel.read_bool()? {
                Some(CompatibleModeProperty::unmarshal(parcel)?)
            } else {
                None
            };
            prop.set_compatible_mode_property(mode);
            Ok(())
        },
        copy_fn: |dst, src| dst.set_compatible_mode_property(src.compatible_mode_property()),
    },
    ActionHandler {
        action: WsPropertyChangeAction::TRANSITION_ANIMATION,
        name: "TRANSITION_ANIMATION",
        write_fn: |prop, parcel| write_transition_map(parcel, &prop.transition_animations),
        read_fn: |prop, parcel| {
            prop.transition_animations = read_transition_map(parcel)?;
            Ok(())
        },
        copy_fn: |dst, src| dst.transition_animations.clone_from(&src.transition_animations),
    },
];

const fn table_matches_flags(table: &[ActionHandler]) -> bool {
    if table.len() != WsPropertyChangeAction::all().bits().count_ones() as usize {
        return false;
    }
    let mut i = 0;
    while i < table.len() {
        if table[i].action.bits() != 1u64 << i {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    table_matches_flags(ACTION_HANDLERS),
    "ACTION_HANDLERS must hold exactly one entry per action bit, in bit order"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bit_has_a_named_handler() {
        for (index, handler) in ACTION_HANDLERS.iter().enumerate() {
            assert_eq!(handler.action.bits(), 1u64 << index);
            assert!(!handler.name.is_empty());
            assert!(std::ptr::eq(handler_for(handler.action).unwrap(), handler));
        }
        assert!(handler_for(WsPropertyChangeAction::empty()).is_none());
        assert!(
            handler_for(WsPropertyChangeAction::RECT | WsPropertyChangeAction::MODE).is_none()
        );
    }

    #[test]
    fn single_from_wire_rejects_composites_and_unknown_bits() {
        assert_eq!(
            WsPropertyChangeAction::single_from_wire(1 << 29),
            Some(WsPropertyChangeAction::TOPMOST)
        );
        assert_eq!(WsPropertyChangeAction::single_from_wire(0), None);
        assert_eq!(WsPropertyChangeAction::single_from_wire(0b11), None);
        assert_eq!(WsPropertyChangeAction::single_from_wire(1 << 60), None);
    }

    #[test]
    fn display_lists_names_in_bit_order() {
        let actions = WsPropertyChangeAction::TOPMOST | WsPropertyChangeAction::RECT;
        assert_eq!(actions.to_string(), "RECT|TOPMOST");
        assert_eq!(WsPropertyChangeAction::empty().to_string(), "NONE");
    }

    #[test]
    fn unknown_bits_are_ignored_on_read() {
        let mut prop = WindowSessionProperty::default();
        let mut parcel = Parcel::new();
        prop.read_raw(&mut parcel, 1 << 62).unwrap();
        assert_eq!(parcel.read_position(), 0);
    }

    #[test]
    fn writes_follow_ascending_bit_order() {
        let mut prop = WindowSessionProperty::default();
        prop.set_topmost(true);
        prop.set_focusable(false);
        let mut parcel = Parcel::new();
        prop.write(
            &mut parcel,
            WsPropertyChangeAction::TOPMOST | WsPropertyChangeAction::FOCUSABLE,
        )
        .unwrap();
        // FOCUSABLE (bit 4) precedes TOPMOST (bit 29).
        assert!(!parcel.read_bool().unwrap());
        assert!(parcel.read_bool().unwrap());
    }

    #[test]
    fn failed_bit_keeps_previous_values() {
        let mut prop = WindowSessionProperty::default();
        prop.set_requested_orientation(Orientation::Vertical);
        let mut parcel = Parcel::new();
        parcel.write_u32(Orientation::Horizontal.as_u32()).unwrap();
        parcel.write_u32(999).unwrap();

        let err = prop
            .read(&mut parcel, WsPropertyChangeAction::ORIENTATION)
            .unwrap_err();
        assert!(matches!(err, ParcelError::InvalidEnum { .. }));
        assert_eq!(prop.requested_orientation(), Orientation::Vertical);
        assert_eq!(parcel.read_position(), 0);
    }

    #[test]
    fn earlier_bits_commit_when_a_later_bit_fails() {
        let mut prop = WindowSessionProperty::default();
        let mut parcel = Parcel::new();
        parcel.write_bool(false).unwrap();
        // TOUCHABLE payload missing.
        let result = prop.read(
            &mut parcel,
            WsPropertyChangeAction::FOCUSABLE | WsPropertyChangeAction::TOUCHABLE,
        );
        assert!(result.is_err());
        assert!(!prop.focusable());
        assert!(prop.touchable());
    }

    #[test]
    fn status_props_touch_only_their_bar() {
        let mut src = WindowSessionProperty::default();
        let custom = SystemBarProperty {
            enable: false,
            background_color: 0x1234_5678,
            ..SystemBarProperty::default()
        };
        src.set_system_bar_property(WindowType::StatusBar, custom);
        src.set_system_bar_property(
            WindowType::NavigationBar,
            SystemBarProperty {
                enable: false,
                ..SystemBarProperty::default()
            },
        );

        let mut dst = WindowSessionProperty::default();
        dst.copy_action(&src, WsPropertyChangeAction::STATUS_PROPS);
        assert_eq!(dst.system_bar_property(WindowType::StatusBar), Some(custom));
        assert!(
            dst.system_bar_property(WindowType::NavigationBar)
                .unwrap()
                .enable
        );
    }

    #[test]
    fn copy_action_moves_only_named_group() {
        let mut src = WindowSessionProperty::default();
        src.set_window_rect(Rect::new(1, 1, 100, 100));
        src.set_topmost(true);
        let mut dst = WindowSessionProperty::default();
        dst.copy_action(&src, WsPropertyChangeAction::RECT);
        assert_eq!(dst.window_rect(), Rect::new(1, 1, 100, 100));
        assert!(!dst.topmost());
    }
}

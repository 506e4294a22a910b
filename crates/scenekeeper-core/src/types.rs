//! Enumerations shared by sessions, properties and the boundary protocol.
//!
//! Every enum here crosses the wire as a `u32` with a stable value.

/// Stable, process-spanning session key. `0` means "no session".
pub type PersistentId = i32;

/// The id that never names a session.
pub const INVALID_SESSION_ID: PersistentId = 0;

/// Display identifier.
pub type DisplayId = u64;

/// The default (primary) display.
pub const DEFAULT_DISPLAY_ID: DisplayId = 0;

/// Generates a `u32`-valued enum with `as_u32`, `from_u32`, `decode` and a
/// snake_case `Display`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            #[must_use]
            pub const fn as_u32(self) -> u32 {
                match self {
                    $(Self::$variant => $value,)*
                }
            }

            #[must_use]
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Like [`Self::from_u32`] but as a parcel decode error.
            pub fn decode(value: u32) -> Result<Self, $crate::parcel::ParcelError> {
                Self::from_u32(value).ok_or($crate::parcel::ParcelError::InvalidEnum {
                    kind: stringify!($name),
                    value: u64::from(value),
                })
            }

            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Lifecycle state of a session.
    #[derive(Default)]
    pub enum SessionState {
        #[default]
        Disconnect = 0 => "disconnect",
        Connect = 1 => "connect",
        Foreground = 2 => "foreground",
        Active = 3 => "active",
        Inactive = 4 => "inactive",
        Background = 5 => "background",
        End = 6 => "end",
    }
}

impl SessionState {
    /// Foreground for focus purposes.
    #[must_use]
    pub const fn is_foreground(self) -> bool {
        matches!(self, Self::Foreground | Self::Active)
    }

    /// Connected and not yet torn down.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Disconnect | Self::End)
    }
}

wire_enum! {
    /// Window type. Numbering groups main, sub and system windows in bands.
    #[derive(Default)]
    pub enum WindowType {
        #[default]
        AppMainWindow = 1 => "app_main_window",
        Media = 1000 => "media",
        AppSubWindow = 1001 => "app_sub_window",
        AppComponent = 1002 => "app_component",
        Wallpaper = 2000 => "wallpaper",
        Desktop = 2001 => "desktop",
        AppLaunching = 2100 => "app_launching",
        DockSlice = 2101 => "dock_slice",
        IncomingCall = 2102 => "incoming_call",
        SearchingBar = 2103 => "searching_bar",
        SystemAlarmWindow = 2104 => "system_alarm_window",
        InputMethodFloat = 2105 => "input_method_float",
        Float = 2106 => "float",
        Toast = 2107 => "toast",
        StatusBar = 2108 => "status_bar",
        Panel = 2109 => "panel",
        Keyguard = 2110 => "keyguard",
        VolumeOverlay = 2111 => "volume_overlay",
        NavigationBar = 2112 => "navigation_bar",
        DraggingEffect = 2113 => "dragging_effect",
        Pointer = 2114 => "pointer",
        LauncherRecent = 2115 => "launcher_recent",
        LauncherDock = 2116 => "launcher_dock",
        BootAnimation = 2117 => "boot_animation",
        FreezeDisplay = 2118 => "freeze_display",
        VoiceInteraction = 2119 => "voice_interaction",
        FloatCamera = 2120 => "float_camera",
        Placeholder = 2121 => "placeholder",
        Dialog = 2122 => "dialog",
        Screenshot = 2123 => "screenshot",
        InputMethodStatusBar = 2124 => "input_method_status_bar",
        GlobalSearch = 2125 => "global_search",
        NegativeScreen = 2126 => "negative_screen",
        SystemToast = 2127 => "system_toast",
        SystemFloat = 2128 => "system_float",
        Pip = 2129 => "pip",
        ThemeEditor = 2130 => "theme_editor",
        NavigationIndicator = 2131 => "navigation_indicator",
        Handwrite = 2132 => "handwrite",
        SceneBoard = 2133 => "scene_board",
        KeyboardPanel = 2134 => "keyboard_panel",
        ScbDefault = 2135 => "scb_default",
        TransparentView = 2136 => "transparent_view",
        SystemSubWindow = 2500 => "system_sub_window",
        UiExtension = 3000 => "ui_extension",
    }
}

impl WindowType {
    #[must_use]
    pub const fn is_main_window(self) -> bool {
        matches!(self, Self::AppMainWindow)
    }

    #[must_use]
    pub const fn is_sub_window(self) -> bool {
        matches!(self.as_u32(), 1000..=1999)
    }

    #[must_use]
    pub const fn is_system_window(self) -> bool {
        matches!(self.as_u32(), 2000..=2999)
    }

    #[must_use]
    pub const fn is_system_sub_window(self) -> bool {
        matches!(self, Self::SystemSubWindow)
    }

    #[must_use]
    pub const fn is_dialog(self) -> bool {
        matches!(self, Self::Dialog)
    }

    #[must_use]
    pub const fn is_toast(self) -> bool {
        matches!(self, Self::Toast)
    }

    /// Types that take part in focus succession at all.
    #[must_use]
    pub const fn is_focus_eligible(self) -> bool {
        !matches!(
            self,
            Self::Wallpaper
                | Self::StatusBar
                | Self::NavigationBar
                | Self::NavigationIndicator
                | Self::Pointer
                | Self::DraggingEffect
                | Self::BootAnimation
                | Self::FreezeDisplay
                | Self::Placeholder
                | Self::SystemToast
        )
    }

    /// Types a non-system caller may never create.
    #[must_use]
    pub const fn requires_system_caller(self) -> bool {
        self.is_system_window()
            && !matches!(
                self,
                Self::Dialog | Self::Toast | Self::Float | Self::Pip | Self::FloatCamera
            )
    }

    /// Types that need the floating-window permission.
    #[must_use]
    pub const fn requires_float_permission(self) -> bool {
        matches!(self, Self::Float | Self::SystemFloat | Self::FloatCamera)
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum WindowMode {
        Undefined = 0 => "undefined",
        #[default]
        Fullscreen = 1 => "fullscreen",
        SplitPrimary = 100 => "split_primary",
        SplitSecondary = 101 => "split_secondary",
        Floating = 102 => "floating",
        Pip = 103 => "pip",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum MaximizeMode {
        AvoidSystemBar = 0 => "avoid_system_bar",
        FullFill = 1 => "full_fill",
        #[default]
        Recover = 2 => "recover",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum Orientation {
        #[default]
        Unspecified = 0 => "unspecified",
        Vertical = 1 => "vertical",
        Horizontal = 2 => "horizontal",
        ReverseVertical = 3 => "reverse_vertical",
        ReverseHorizontal = 4 => "reverse_horizontal",
        Sensor = 5 => "sensor",
        SensorVertical = 6 => "sensor_vertical",
        SensorHorizontal = 7 => "sensor_horizontal",
        AutoRotationRestricted = 8 => "auto_rotation_restricted",
        AutoRotationPortraitRestricted = 9 => "auto_rotation_portrait_restricted",
        AutoRotationLandscapeRestricted = 10 => "auto_rotation_landscape_restricted",
        Locked = 11 => "locked",
        FollowRecent = 12 => "follow_recent",
    }
}

wire_enum! {
    /// Occlusion-derived visibility.
    #[derive(Default)]
    pub enum VisibilityState {
        NoOcclusion = 0 => "no_occlusion",
        PartialOcclusion = 1 => "partial_occlusion",
        #[default]
        TotalOcclusion = 2 => "total_occlusion",
    }
}

impl VisibilityState {
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::TotalOcclusion)
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum ForceHideState {
        #[default]
        NotHidden = 0 => "not_hidden",
        HiddenWhenFocused = 1 => "hidden_when_focused",
        HiddenWhenUnfocused = 2 => "hidden_when_unfocused",
    }
}

wire_enum! {
    /// Why focus moved.
    #[derive(Default)]
    pub enum FocusChangeReason {
        #[default]
        Default = 0 => "default",
        ClientRequest = 1 => "client_request",
        ScbSessionRequest = 2 => "scb_session_request",
        SaRequest = 3 => "sa_request",
        Foreground = 4 => "foreground",
        Background = 5 => "background",
        SplitScreen = 6 => "split_screen",
        FloatingScene = 7 => "floating_scene",
        MoveUp = 8 => "move_up",
        Click = 9 => "click",
        Wind = 10 => "wind",
        Recover = 11 => "recover",
        AbilityDestroyed = 12 => "ability_destroyed",
        SessionDestroyed = 13 => "session_destroyed",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum WindowModeSupport {
        #[default]
        All = 0 => "all",
        FullscreenOnly = 1 => "fullscreen_only",
        FloatingOnly = 2 => "floating_only",
        FullscreenAndFloating = 3 => "fullscreen_and_floating",
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum WindowAnimation {
        #[default]
        None = 0 => "none",
        Default = 1 => "default",
        Input = 2 => "input",
        Custom = 3 => "custom",
    }
}

/// Window flag bits.
pub mod window_flag {
    pub const NEED_AVOID: u32 = 1;
    pub const PARENT_LIMIT: u32 = 1 << 1;
    pub const SHOW_WHEN_LOCKED: u32 = 1 << 2;
    pub const FORBID_SPLIT_MOVE: u32 = 1 << 3;
    pub const WATER_MARK: u32 = 1 << 4;
    pub const IS_MODAL: u32 = 1 << 5;
    pub const IS_APPLICATION_MODAL: u32 = 1 << 6;
    pub const HANDWRITING: u32 = 1 << 7;
    pub const IS_TOAST: u32 = 1 << 8;
    pub const END: u32 = 1 << 9;
}

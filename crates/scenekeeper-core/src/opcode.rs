//! Transaction codes of the scene session manager interface.
//!
//! Values are stable across process versions: the client-facing block keeps
//! the historical numbering (gaps belong to transactions this service does
//! not handle), later additions are appended after it, and scene-board
//! entry points live in their own block starting at 100.

use serde::{Deserialize, Serialize};

/// Interface descriptor every request parcel starts with.
pub const INTERFACE_DESCRIPTOR: &str = "OHOS.ISceneSessionManager";

macro_rules! messages {
    ($( $name:ident = $code:literal => $label:literal ),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum SceneSessionManagerMessage {
            $( $name, )*
        }

        impl SceneSessionManagerMessage {
            pub const ALL: &'static [Self] = &[$(Self::$name),*];

            #[must_use]
            pub const fn code(self) -> u32 {
                match self {
                    $(Self::$name => $code,)*
                }
            }

            #[must_use]
            pub const fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Transaction name as it appears in logs and dumps.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$name => $label,)*
                }
            }
        }
    };
}

messages! {
    CreateAndConnectSpecificSession = 0 => "TRANS_ID_CREATE_AND_CONNECT_SPECIFIC_SESSION",
    DestroyAndDisconnectSpecificSession = 1 => "TRANS_ID_DESTROY_AND_DISCONNECT_SPECIFIC_SESSION",
    UpdateProperty = 2 => "TRANS_ID_UPDATE_PROPERTY",
    RequestFocus = 3 => "TRANS_ID_REQUEST_FOCUS",
    RegisterWindowManagerAgent = 4 => "TRANS_ID_REGISTER_WINDOW_MANAGER_AGENT",
    UnregisterWindowManagerAgent = 5 => "TRANS_ID_UNREGISTER_WINDOW_MANAGER_AGENT",
    BindDialogTarget = 6 => "TRANS_ID_BIND_DIALOG_TARGET",
    GetFocusSessionInfo = 7 => "TRANS_ID_GET_FOCUS_SESSION_INFO",
    RecoverAndReconnectSceneSession = 43 => "TRANS_ID_RECOVER_AND_RECONNECT_SCENE_SESSION",
    RecoverAndConnectSpecificSession = 44 => "TRANS_ID_RECOVER_AND_CONNECT_SPECIFIC_SESSION",
    GetVisibilityWindowInfo = 50 => "TRANS_ID_GET_VISIBILITY_WINDOW_INFO_ID",
    DestroyAndDisconnectSpecificSessionWithDetachCallback =
        58 => "TRANS_ID_DESTROY_AND_DISCONNECT_SPECIFIC_SESSION_WITH_DETACH_CALLBACK",
    RequestFocusStatus = 69 => "TRANS_ID_REQUEST_FOCUS_STATUS",
    RequestFocusStatusBySa = 70 => "TRANS_ID_REQUEST_FOCUS_STATUS_BY_SA",
    RequestFocusStatusByScb = 71 => "TRANS_ID_REQUEST_FOCUS_STATUS_BY_SCB",
    UpdateSessionPropertyByAction = 72 => "TRANS_ID_UPDATE_SESSION_PROPERTY_BY_ACTION",
    GetAccessibilityWindowInfo = 73 => "TRANS_ID_GET_ACCESSIBILITY_WINDOW_INFO",
    GetAllWindowLayoutInfo = 74 => "TRANS_ID_GET_ALL_WINDOW_LAYOUT_INFO",
    GetSessionInfo = 75 => "TRANS_ID_GET_SESSION_INFO",
    SetAlivePersistentIds = 76 => "TRANS_ID_SET_ALIVE_PERSISTENT_IDS",
    ForegroundSession = 100 => "TRANS_ID_SCB_FOREGROUND_SESSION",
    BackgroundSession = 101 => "TRANS_ID_SCB_BACKGROUND_SESSION",
    SetSessionActive = 102 => "TRANS_ID_SCB_SET_SESSION_ACTIVE",
    DisconnectSession = 103 => "TRANS_ID_SCB_DISCONNECT_SESSION",
    DestroySession = 104 => "TRANS_ID_SCB_DESTROY_SESSION",
    UpdateZOrder = 105 => "TRANS_ID_SCB_UPDATE_Z_ORDER",
    UpdateVisibility = 106 => "TRANS_ID_SCB_UPDATE_VISIBILITY",
    SetForceHideState = 107 => "TRANS_ID_SCB_SET_FORCE_HIDE_STATE",
    SetBlockingFocus = 108 => "TRANS_ID_SCB_SET_BLOCKING_FOCUS",
}

impl SceneSessionManagerMessage {
    /// Posted to the serial queue without waiting; the reply carries only
    /// `WS_OK`.
    #[must_use]
    pub const fn is_fire_and_forget(self) -> bool {
        matches!(self, Self::RequestFocusStatusByScb)
    }

    /// Replies carry a `WMError` code rather than a `WSError` code.
    #[must_use]
    pub const fn replies_wm_error(self) -> bool {
        matches!(
            self,
            Self::UpdateProperty
                | Self::UpdateSessionPropertyByAction
                | Self::RequestFocus
                | Self::RequestFocusStatusBySa
                | Self::RegisterWindowManagerAgent
                | Self::UnregisterWindowManagerAgent
                | Self::GetAccessibilityWindowInfo
                | Self::GetAllWindowLayoutInfo
                | Self::GetVisibilityWindowInfo
        )
    }

    /// Entry points reserved for the scene board.
    #[must_use]
    pub const fn is_scene_board(self) -> bool {
        self.code() >= 100
    }

    /// Reads that never mutate state.
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(
            self,
            Self::GetFocusSessionInfo
                | Self::GetVisibilityWindowInfo
                | Self::GetAccessibilityWindowInfo
                | Self::GetAllWindowLayoutInfo
                | Self::GetSessionInfo
        )
    }
}

impl std::fmt::Display for SceneSessionManagerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u32> for SceneSessionManagerMessage {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_invertible() {
        let mut seen = HashSet::new();
        for message in SceneSessionManagerMessage::ALL {
            assert!(seen.insert(message.code()), "duplicate code {}", message.code());
            assert_eq!(SceneSessionManagerMessage::from_code(message.code()), Some(*message));
        }
        assert_eq!(SceneSessionManagerMessage::from_code(9999), None);
        assert_eq!(SceneSessionManagerMessage::try_from(8), Err(8));
    }

    #[test]
    fn historical_codes_are_pinned() {
        use SceneSessionManagerMessage as M;
        assert_eq!(M::CreateAndConnectSpecificSession.code(), 0);
        assert_eq!(M::RequestFocus.code(), 3);
        assert_eq!(M::BindDialogTarget.code(), 6);
        assert_eq!(M::RecoverAndReconnectSceneSession.code(), 43);
        assert_eq!(M::DestroyAndDisconnectSpecificSessionWithDetachCallback.code(), 58);
    }

    #[test]
    fn labels_render_and_serialize() {
        let message = SceneSessionManagerMessage::RequestFocusStatusByScb;
        assert_eq!(message.to_string(), "TRANS_ID_REQUEST_FOCUS_STATUS_BY_SCB");
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            "\"REQUEST_FOCUS_STATUS_BY_SCB\""
        );
        assert!(message.is_fire_and_forget());
        assert!(SceneSessionManagerMessage::SetBlockingFocus.is_scene_board());
        assert!(!message.is_scene_board());
        assert!(!SceneSessionManagerMessage::RequestFocusStatus.is_fire_and_forget());
    }
}

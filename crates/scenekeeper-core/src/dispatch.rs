//! Server side of the boundary: decode a transaction, run it on the serial
//! queue, encode the reply.
//!
//! Every request parcel starts with [`INTERFACE_DESCRIPTOR`]. Arguments are
//! fully decoded before anything is submitted, so a malformed buffer never
//! reaches the manager. Replies carry the operation's result fields (default
//! values when the operation failed) followed by the `WSError`/`WMError`
//! code as an `i32`.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::{
    AgentId, FocusChangeInfo, WindowInfo, WindowManagerAgent, WindowManagerAgentType,
    WindowVisibilityInfo,
};
use crate::error::{
    CODE_OK, TransactionError, WmError, WmResult, WsError, WsResult, wm_code, ws_code,
};
use crate::manager::{Caller, SceneSessionManager};
use crate::opcode::{INTERFACE_DESCRIPTOR, SceneSessionManagerMessage};
use crate::parcel::{MAX_VEC_LEN, Parcel, ParcelError};
use crate::property::{SessionInfo, WindowSessionProperty, WsPropertyChangeAction};
use crate::session::{ConnectHandles, DetachCallback};
use crate::task_queue::SerialTaskQueue;
use crate::types::{
    DisplayId, FocusChangeReason, ForceHideState, INVALID_SESSION_ID, PersistentId,
    VisibilityState,
};

// =============================================================================
// Remote objects
// =============================================================================

/// Per-connection table resolving remote-object handles found in request
/// parcels. Stage, event channel and surface handles pass through opaque;
/// listener agents and detach callbacks must have been registered by the
/// transport before a request refers to them.
#[derive(Default)]
pub struct RemoteObjects {
    agents: Mutex<BTreeMap<u64, Arc<dyn WindowManagerAgent>>>,
    detach_callbacks: Mutex<BTreeMap<u64, Arc<dyn DetachCallback>>>,
    registrations: Mutex<BTreeMap<(WindowManagerAgentType, u64), AgentId>>,
}

impl RemoteObjects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_agent(&self, handle: u64, agent: Arc<dyn WindowManagerAgent>) {
        self.agents.lock().insert(handle, agent);
    }

    pub fn insert_detach_callback(&self, handle: u64, callback: Arc<dyn DetachCallback>) {
        self.detach_callbacks.lock().insert(handle, callback);
    }

    #[must_use]
    pub fn agent(&self, handle: u64) -> Option<Arc<dyn WindowManagerAgent>> {
        self.agents.lock().get(&handle).cloned()
    }

    #[must_use]
    pub fn detach_callback(&self, handle: u64) -> Option<Arc<dyn DetachCallback>> {
        self.detach_callbacks.lock().get(&handle).cloned()
    }

    fn remember_registration(&self, agent_type: WindowManagerAgentType, handle: u64, id: AgentId) {
        self.registrations.lock().insert((agent_type, handle), id);
    }

    fn take_registration(&self, agent_type: WindowManagerAgentType, handle: u64) -> Option<AgentId> {
        self.registrations.lock().remove(&(agent_type, handle))
    }
}

impl std::fmt::Debug for RemoteObjects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObjects")
            .field("agents", &self.agents.lock().len())
            .field("detach_callbacks", &self.detach_callbacks.lock().len())
            .field("registrations", &self.registrations.lock().len())
            .finish()
    }
}

// =============================================================================
// Decoded requests
// =============================================================================

/// Arguments shared by create and both recovery transactions.
struct CreateArgs {
    handles: ConnectHandles,
    property: Box<WindowSessionProperty>,
    token: Option<u64>,
}

struct FocusArgs {
    id: PersistentId,
    is_focused: bool,
    by_foreground: bool,
    reason: FocusChangeReason,
}

enum Request {
    Create(CreateArgs),
    RecoverSpecific(CreateArgs),
    RecoverScene(CreateArgs),
    Destroy(PersistentId),
    DestroyWithDetach(PersistentId, Arc<dyn DetachCallback>),
    UpdateProperty {
        id: PersistentId,
        actions: WsPropertyChangeAction,
        property: Box<WindowSessionProperty>,
    },
    UpdatePropertyByAction {
        id: PersistentId,
        action: WsPropertyChangeAction,
        property: Box<WindowSessionProperty>,
    },
    RequestFocus(PersistentId, bool),
    FocusStatus(FocusArgs),
    FocusStatusBySa(FocusArgs),
    FocusStatusByScb(FocusArgs),
    RegisterAgent(WindowManagerAgentType, u64, Arc<dyn WindowManagerAgent>),
    UnregisterAgent(WindowManagerAgentType, u64),
    BindDialogTarget(PersistentId, u64),
    GetFocusSessionInfo(DisplayId),
    GetVisibilityWindowInfo,
    GetAccessibilityWindowInfo,
    GetAllWindowLayoutInfo(DisplayId),
    GetSessionInfo(PersistentId),
    SetAlivePersistentIds(Vec<PersistentId>),
    Foreground(PersistentId),
    Background(PersistentId),
    SetActive(PersistentId, bool),
    Disconnect(PersistentId),
    DestroySession(PersistentId),
    UpdateZOrder(PersistentId, u32),
    UpdateVisibility(PersistentId, VisibilityState),
    SetForceHide(PersistentId, ForceHideState),
    SetBlockingFocus(PersistentId, bool),
}

fn read_handle(parcel: &mut Parcel) -> Result<Option<u64>, ParcelError> {
    let handle = parcel.read_remote_object()?;
    Ok((handle != 0).then_some(handle))
}

fn read_create_args(parcel: &mut Parcel) -> Result<CreateArgs, ParcelError> {
    let handles = ConnectHandles {
        stage: read_handle(parcel)?,
        event_channel: read_handle(parcel)?,
        surface: read_handle(parcel)?,
    };
    let property = Box::new(parcel.read_value::<WindowSessionProperty>()?);
    let token = if parcel.read_bool()? {
        Some(parcel.read_u64()?)
    } else {
        None
    };
    Ok(CreateArgs {
        handles,
        property,
        token,
    })
}

fn read_focus_args(parcel: &mut Parcel) -> Result<FocusArgs, ParcelError> {
    Ok(FocusArgs {
        id: parcel.read_i32()?,
        is_focused: parcel.read_bool()?,
        by_foreground: parcel.read_bool()?,
        reason: FocusChangeReason::decode(parcel.read_u32()?)?,
    })
}

fn read_partial_property(
    parcel: &mut Parcel,
) -> Result<(PersistentId, WsPropertyChangeAction, Box<WindowSessionProperty>), ParcelError> {
    let id = parcel.read_i32()?;
    let raw = parcel.read_u64()?;
    let actions = WsPropertyChangeAction::from_bits_truncate(raw);
    let mut property = Box::<WindowSessionProperty>::default();
    property.read(parcel, actions)?;
    Ok((id, actions, property))
}

fn read_ids(parcel: &mut Parcel) -> Result<Vec<PersistentId>, ParcelError> {
    let len = parcel.read_len(MAX_VEC_LEN)?;
    (0..len).map(|_| parcel.read_i32()).collect()
}

fn decode(
    message: SceneSessionManagerMessage,
    parcel: &mut Parcel,
    objects: &RemoteObjects,
) -> Result<Request, TransactionError> {
    use SceneSessionManagerMessage as M;
    let request = match message {
        M::CreateAndConnectSpecificSession => Request::Create(read_create_args(parcel)?),
        M::RecoverAndConnectSpecificSession => Request::RecoverSpecific(read_create_args(parcel)?),
        M::RecoverAndReconnectSceneSession => Request::RecoverScene(read_create_args(parcel)?),
        M::DestroyAndDisconnectSpecificSession => Request::Destroy(parcel.read_i32()?),
        M::DestroyAndDisconnectSpecificSessionWithDetachCallback => {
            let id = parcel.read_i32()?;
            let handle = parcel.read_remote_object()?;
            let callback = objects
                .detach_callback(handle)
                .ok_or(TransactionError::InvalidData)?;
            Request::DestroyWithDetach(id, callback)
        }
        M::UpdateProperty => {
            let (id, actions, property) = read_partial_property(parcel)?;
            Request::UpdateProperty {
                id,
                actions,
                property,
            }
        }
        M::UpdateSessionPropertyByAction => {
            let (id, action, property) = read_partial_property(parcel)?;
            Request::UpdatePropertyByAction {
                id,
                action,
                property,
            }
        }
        M::RequestFocus => Request::RequestFocus(parcel.read_i32()?, parcel.read_bool()?),
        M::RequestFocusStatus => Request::FocusStatus(read_focus_args(parcel)?),
        M::RequestFocusStatusBySa => Request::FocusStatusBySa(read_focus_args(parcel)?),
        M::RequestFocusStatusByScb => Request::FocusStatusByScb(read_focus_args(parcel)?),
        M::RegisterWindowManagerAgent => {
            let agent_type = WindowManagerAgentType::decode(parcel.read_u32()?)?;
            let handle = parcel.read_remote_object()?;
            let agent = objects.agent(handle).ok_or(TransactionError::InvalidData)?;
            Request::RegisterAgent(agent_type, handle, agent)
        }
        M::UnregisterWindowManagerAgent => {
            let agent_type = WindowManagerAgentType::decode(parcel.read_u32()?)?;
            Request::UnregisterAgent(agent_type, parcel.read_remote_object()?)
        }
        M::BindDialogTarget => Request::BindDialogTarget(parcel.read_i32()?, parcel.read_u64()?),
        M::GetFocusSessionInfo => Request::GetFocusSessionInfo(parcel.read_u64()?),
        M::GetVisibilityWindowInfo => Request::GetVisibilityWindowInfo,
        M::GetAccessibilityWindowInfo => Request::GetAccessibilityWindowInfo,
        M::GetAllWindowLayoutInfo => Request::GetAllWindowLayoutInfo(parcel.read_u64()?),
        M::GetSessionInfo => Request::GetSessionInfo(parcel.read_i32()?),
        M::SetAlivePersistentIds => Request::SetAlivePersistentIds(read_ids(parcel)?),
        M::ForegroundSession => Request::Foreground(parcel.read_i32()?),
        M::BackgroundSession => Request::Background(parcel.read_i32()?),
        M::SetSessionActive => Request::SetActive(parcel.read_i32()?, parcel.read_bool()?),
        M::DisconnectSession => Request::Disconnect(parcel.read_i32()?),
        M::DestroySession => Request::DestroySession(parcel.read_i32()?),
        M::UpdateZOrder => Request::UpdateZOrder(parcel.read_i32()?, parcel.read_u32()?),
        M::UpdateVisibility => Request::UpdateVisibility(
            parcel.read_i32()?,
            VisibilityState::decode(parcel.read_u32()?)?,
        ),
        M::SetForceHideState => Request::SetForceHide(
            parcel.read_i32()?,
            ForceHideState::decode(parcel.read_u32()?)?,
        ),
        M::SetBlockingFocus => Request::SetBlockingFocus(parcel.read_i32()?, parcel.read_bool()?),
    };
    Ok(request)
}

// =============================================================================
// Replies
// =============================================================================

enum Reply {
    Ws(WsResult),
    Wm(WmResult),
    Created(WsResult<PersistentId>),
    FocusInfo(Option<FocusChangeInfo>),
    Visibility(Vec<WindowVisibilityInfo>),
    Windows(WmResult<Vec<WindowInfo>>),
    SessionInfo(WsResult<SessionInfo>),
}

impl Reply {
    fn encode(self, parcel: &mut Parcel) -> Result<(), ParcelError> {
        match self {
            Self::Ws(result) => parcel.write_i32(ws_code(&result)),
            Self::Wm(result) => parcel.write_i32(wm_code(&result)),
            Self::Created(result) => {
                parcel.write_i32(*result.as_ref().unwrap_or(&INVALID_SESSION_ID))?;
                parcel.write_i32(ws_code(&result))
            }
            Self::FocusInfo(info) => {
                parcel.write_bool(info.is_some())?;
                if let Some(info) = info {
                    parcel.write_value(&info)?;
                }
                parcel.write_i32(CODE_OK)
            }
            Self::Visibility(infos) => {
                parcel.write_values(&infos)?;
                parcel.write_i32(CODE_OK)
            }
            Self::Windows(result) => {
                let empty = Vec::new();
                parcel.write_values(result.as_ref().unwrap_or(&empty))?;
                parcel.write_i32(wm_code(&result))
            }
            Self::SessionInfo(result) => {
                match &result {
                    Ok(info) => parcel.write_value(info)?,
                    Err(_) => parcel.write_value(&SessionInfo::default())?,
                }
                parcel.write_i32(ws_code(&result))
            }
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

pub struct RemoteRequestDispatcher {
    queue: Arc<SerialTaskQueue>,
    parcel_capacity: usize,
}

impl RemoteRequestDispatcher {
    #[must_use]
    pub fn new(queue: Arc<SerialTaskQueue>) -> Self {
        let parcel_capacity = queue.manager().config().transport.parcel_capacity;
        Self {
            queue,
            parcel_capacity,
        }
    }

    #[must_use]
    pub fn queue(&self) -> &Arc<SerialTaskQueue> {
        &self.queue
    }

    /// Handle one transaction. `Err` means the request never ran; `Ok`
    /// carries the reply parcel even when the operation itself failed.
    pub async fn on_remote_request(
        &self,
        opcode: u32,
        data: &mut Parcel,
        caller: &Caller,
        objects: &RemoteObjects,
    ) -> Result<Parcel, TransactionError> {
        let descriptor = data
            .read_string()
            .map_err(|_| TransactionError::TransactionFailed)?;
        if descriptor != INTERFACE_DESCRIPTOR {
            warn!(opcode, %descriptor, "interface descriptor mismatch");
            return Err(TransactionError::TransactionFailed);
        }
        let Some(message) = SceneSessionManagerMessage::from_code(opcode) else {
            warn!(opcode, "unknown transaction code");
            return Err(TransactionError::UnknownTransaction);
        };
        let request = decode(message, data, objects).inspect_err(|err| {
            warn!(message = %message, error = %err, "request decode failed");
        })?;
        debug!(message = %message, pid = caller.pid, "dispatching");

        let reply = if message.is_scene_board() && !caller.is_system {
            warn!(message = %message, pid = caller.pid, "scene board call from non-system caller");
            Reply::Ws(Err(WsError::NotSystemApp))
        } else {
            self.execute(message, request, caller, objects).await?
        };

        let mut parcel = Parcel::with_capacity(self.parcel_capacity);
        reply.encode(&mut parcel)?;
        metrics::counter!("ssm.dispatch.requests", "message" => message.label()).increment(1);
        Ok(parcel)
    }

    async fn run<F, R>(&self, message: SceneSessionManagerMessage, job: F) -> Result<R, TransactionError>
    where
        F: FnOnce(&SceneSessionManager) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.queue
            .post_sync(message.label(), job)
            .await
            .map_err(|err| {
                warn!(message = %message, error = %err, "serial queue unavailable");
                TransactionError::TransactionFailed
            })
    }

    async fn execute(
        &self,
        message: SceneSessionManagerMessage,
        request: Request,
        caller: &Caller,
        objects: &RemoteObjects,
    ) -> Result<Reply, TransactionError> {
        let caller = caller.clone();
        let manager = self.queue.manager();
        let reply = match request {
            Request::Create(args) => Reply::Created(
                self.run(message, move |ssm| {
                    ssm.create_and_connect_specific_session(&caller, args.handles, &args.property, args.token)
                        .map(|(id, _)| id)
                })
                .await?,
            ),
            Request::RecoverSpecific(args) => Reply::Created(
                self.run(message, move |ssm| {
                    ssm.recover_and_connect_specific_session(&caller, args.handles, &args.property, args.token)
                        .map(|(id, _)| id)
                })
                .await?,
            ),
            Request::RecoverScene(args) => Reply::Created(
                self.run(message, move |ssm| {
                    ssm.recover_and_reconnect_scene_session(&caller, args.handles, &args.property, args.token)
                        .map(|(id, _)| id)
                })
                .await?,
            ),
            Request::Destroy(id) => Reply::Ws(
                self.run(message, move |ssm| {
                    ssm.destroy_and_disconnect_specific_session(&caller, id)
                })
                .await?,
            ),
            Request::DestroyWithDetach(id, callback) => Reply::Ws(
                self.run(message, move |ssm| {
                    // Teardown has already fired the callback when this
                    // returns. The remote peer holds no disarm channel, so the
                    // one-shot handle ends here and only the code is replied.
                    ssm.destroy_and_disconnect_specific_session_with_detach_callback(&caller, id, callback)
                        .map(|_| ())
                })
                .await?,
            ),
            Request::UpdateProperty {
                id,
                actions,
                property,
            } => Reply::Wm(
                self.run(message, move |ssm| ssm.update_property(&caller, id, &property, actions))
                    .await?,
            ),
            Request::UpdatePropertyByAction {
                id,
                action,
                property,
            } => Reply::Wm(
                self.run(message, move |ssm| {
                    ssm.update_session_property_by_action(&caller, id, &property, action)
                })
                .await?,
            ),
            Request::RequestFocus(id, is_focused) => Reply::Wm(
                self.run(message, move |ssm| ssm.request_focus(&caller, id, is_focused))
                    .await?,
            ),
            Request::FocusStatus(args) => Reply::Ws(
                self.run(message, move |ssm| {
                    ssm.request_focus_status(args.id, args.is_focused, args.by_foreground, args.reason)
                })
                .await?,
            ),
            Request::FocusStatusBySa(args) => Reply::Wm(
                self.run(message, move |ssm| {
                    ssm.request_focus_status_by_sa(
                        &caller,
                        args.id,
                        args.is_focused,
                        args.by_foreground,
                        args.reason,
                    )
                })
                .await?,
            ),
            Request::FocusStatusByScb(args) => {
                self.queue
                    .post(message.label(), move |ssm| {
                        // Nobody waits for this outcome; the manager logs it.
                        let _ = ssm.request_focus_status_by_scb(
                            args.id,
                            args.is_focused,
                            args.by_foreground,
                            args.reason,
                        );
                    })
                    .await
                    .map_err(|_| TransactionError::TransactionFailed)?;
                Reply::Ws(Ok(()))
            }
            Request::RegisterAgent(agent_type, handle, agent) => {
                let registered = self
                    .run(message, move |ssm| ssm.register_window_manager_agent(agent_type, agent))
                    .await?;
                if let Ok(agent_id) = registered {
                    objects.remember_registration(agent_type, handle, agent_id);
                }
                Reply::Wm(registered.map(|_| ()))
            }
            Request::UnregisterAgent(agent_type, handle) => {
                match objects.take_registration(agent_type, handle) {
                    Some(agent_id) => Reply::Wm(
                        self.run(message, move |ssm| {
                            ssm.unregister_window_manager_agent(agent_type, agent_id)
                        })
                        .await?,
                    ),
                    None => Reply::Wm(Err(WmError::InvalidParam)),
                }
            }
            Request::BindDialogTarget(id, token) => Reply::Ws(
                self.run(message, move |ssm| ssm.bind_dialog_target(id, token))
                    .await?,
            ),
            Request::GetFocusSessionInfo(display_id) => {
                Reply::FocusInfo(manager.get_focus_session_info(display_id))
            }
            Request::GetVisibilityWindowInfo => Reply::Visibility(manager.get_visibility_window_info()),
            Request::GetAccessibilityWindowInfo => {
                Reply::Windows(manager.get_accessibility_window_info(&caller))
            }
            Request::GetAllWindowLayoutInfo(display_id) => {
                Reply::Windows(Ok(manager.get_all_window_layout_info(display_id)))
            }
            Request::GetSessionInfo(id) => Reply::SessionInfo(manager.get_session_info(id)),
            Request::SetAlivePersistentIds(ids) => {
                if caller.is_system {
                    self.run(message, move |ssm| ssm.set_alive_persistent_ids(ids))
                        .await?;
                    Reply::Ws(Ok(()))
                } else {
                    Reply::Ws(Err(WsError::NotSystemApp))
                }
            }
            Request::Foreground(id) => Reply::Ws(
                self.run(message, move |ssm| ssm.foreground_session(id).map(|_| ()))
                    .await?,
            ),
            Request::Background(id) => Reply::Ws(
                self.run(message, move |ssm| ssm.background_session(id).map(|_| ()))
                    .await?,
            ),
            Request::SetActive(id, active) => Reply::Ws(
                self.run(message, move |ssm| ssm.set_session_active(id, active).map(|_| ()))
                    .await?,
            ),
            Request::Disconnect(id) => Reply::Ws(
                self.run(message, move |ssm| ssm.disconnect_session(id).map(|_| ()))
                    .await?,
            ),
            Request::DestroySession(id) => Reply::Ws(
                self.run(message, move |ssm| ssm.destroy_session(id)).await?,
            ),
            Request::UpdateZOrder(id, z_order) => Reply::Ws(
                self.run(message, move |ssm| ssm.update_z_order(id, z_order))
                    .await?,
            ),
            Request::UpdateVisibility(id, visibility) => Reply::Ws(
                self.run(message, move |ssm| ssm.update_visibility(id, visibility))
                    .await?,
            ),
            Request::SetForceHide(id, state) => Reply::Ws(
                self.run(message, move |ssm| ssm.set_force_hide_state(id, state))
                    .await?,
            ),
            Request::SetBlockingFocus(id, blocking) => Reply::Ws(
                self.run(message, move |ssm| ssm.set_blocking_focus(id, blocking))
                    .await?,
            ),
        };
        Ok(reply)
    }
}

impl std::fmt::Debug for RemoteRequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRequestDispatcher")
            .field("queue", &self.queue)
            .field("parcel_capacity", &self.parcel_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ws_result_from_code;
    use crate::types::WindowType;

    fn dispatcher() -> RemoteRequestDispatcher {
        let ssm = Arc::new(SceneSessionManager::new(Config::default()));
        RemoteRequestDispatcher::new(Arc::new(SerialTaskQueue::start(ssm, 16)))
    }

    fn request() -> Parcel {
        let mut parcel = Parcel::new();
        parcel.write_string(INTERFACE_DESCRIPTOR).unwrap();
        parcel
    }

    fn create_request(window_type: WindowType) -> Parcel {
        let mut parcel = request();
        for handle in [11, 12, 0] {
            parcel.write_remote_object(handle).unwrap();
        }
        let mut property = WindowSessionProperty::default();
        property.set_window_type(window_type);
        parcel.write_value(&property).unwrap();
        parcel.write_bool(false).unwrap();
        parcel
    }

    #[tokio::test]
    async fn descriptor_mismatch_fails_before_decoding() {
        let dispatcher = dispatcher();
        let mut parcel = Parcel::new();
        parcel.write_string("OHOS.ISomethingElse").unwrap();
        parcel.write_i32(1).unwrap();
        let err = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::DestroySession.code(),
                &mut parcel,
                &Caller::system(1),
                &RemoteObjects::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TransactionError::TransactionFailed);
    }

    #[tokio::test]
    async fn unknown_opcode_and_short_buffer_are_rejected() {
        let dispatcher = dispatcher();
        let objects = RemoteObjects::new();
        let err = dispatcher
            .on_remote_request(9999, &mut request(), &Caller::system(1), &objects)
            .await
            .unwrap_err();
        assert_eq!(err, TransactionError::UnknownTransaction);

        let err = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::RequestFocusStatus.code(),
                &mut request(),
                &Caller::system(1),
                &objects,
            )
            .await
            .unwrap_err();
        assert_eq!(err, TransactionError::InvalidData);
        assert!(dispatcher.queue().manager().registry().is_empty());
    }

    #[tokio::test]
    async fn create_replies_id_then_code() {
        let dispatcher = dispatcher();
        let mut reply = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::CreateAndConnectSpecificSession.code(),
                &mut create_request(WindowType::SystemFloat),
                &Caller::system(1),
                &RemoteObjects::new(),
            )
            .await
            .unwrap();
        let id = reply.read_i32().unwrap();
        assert_eq!(ws_result_from_code(reply.read_i32().unwrap()), Ok(()));
        let view = dispatcher.queue().manager().get_session_view(id).unwrap();
        assert_eq!(view.window_type, WindowType::SystemFloat);

        let mut reply = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::CreateAndConnectSpecificSession.code(),
                &mut create_request(WindowType::StatusBar),
                &Caller::app(5),
                &RemoteObjects::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.read_i32().unwrap(), INVALID_SESSION_ID);
        assert_eq!(reply.read_i32().unwrap(), WsError::NotSystemApp.code());
    }

    #[tokio::test]
    async fn scene_board_calls_need_a_system_caller() {
        let dispatcher = dispatcher();
        let mut parcel = request();
        parcel.write_i32(1).unwrap();
        let mut reply = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::ForegroundSession.code(),
                &mut parcel,
                &Caller::app(5),
                &RemoteObjects::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.read_i32().unwrap(), WsError::NotSystemApp.code());
    }

    #[tokio::test]
    async fn detach_callback_handle_must_be_known() {
        let dispatcher = dispatcher();
        let mut parcel = request();
        parcel.write_i32(1).unwrap();
        parcel.write_remote_object(77).unwrap();
        let err = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::DestroyAndDisconnectSpecificSessionWithDetachCallback
                    .code(),
                &mut parcel,
                &Caller::system(1),
                &RemoteObjects::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TransactionError::InvalidData);
    }

    struct RecordingDetach(Mutex<Vec<PersistentId>>);

    impl DetachCallback for RecordingDetach {
        fn on_session_detached(&self, persistent_id: PersistentId) {
            self.0.lock().push(persistent_id);
        }
    }

    #[tokio::test]
    async fn detach_callback_has_fired_when_the_reply_arrives() {
        let dispatcher = dispatcher();
        let mut reply = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::CreateAndConnectSpecificSession.code(),
                &mut create_request(WindowType::SystemFloat),
                &Caller::system(1),
                &RemoteObjects::new(),
            )
            .await
            .unwrap();
        let id = reply.read_i32().unwrap();

        let objects = RemoteObjects::new();
        let detach = Arc::new(RecordingDetach(Mutex::new(Vec::new())));
        objects.insert_detach_callback(5, detach.clone());
        let mut parcel = request();
        parcel.write_i32(id).unwrap();
        parcel.write_remote_object(5).unwrap();
        let mut reply = dispatcher
            .on_remote_request(
                SceneSessionManagerMessage::DestroyAndDisconnectSpecificSessionWithDetachCallback
                    .code(),
                &mut parcel,
                &Caller::system(1),
                &objects,
            )
            .await
            .unwrap();
        assert_eq!(reply.read_i32().unwrap(), CODE_OK);
        assert_eq!(*detach.0.lock(), vec![id]);
        assert!(!dispatcher.queue().manager().registry().contains(id));
    }
}

//! Client side of the boundary.
//!
//! [`SceneSessionManagerProxy`] writes request parcels for the opcode table,
//! frames them, hands them to a [`Transport`] and decodes the reply. Each
//! method returns `crate::Result` for transport-level failures wrapping the
//! operation's own `WsResult`/`WmResult`.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::agent::{FocusChangeInfo, WindowInfo, WindowManagerAgentType, WindowVisibilityInfo};
use crate::dispatch::{RemoteObjects, RemoteRequestDispatcher};
use crate::error::{
    Error, Result, TransactionError, WmResult, WsResult, wm_result_from_code, ws_result_from_code,
};
use crate::manager::Caller;
use crate::opcode::{INTERFACE_DESCRIPTOR, SceneSessionManagerMessage as M};
use crate::parcel::{DEFAULT_CAPACITY, MAX_VEC_LEN, Parcel};
use crate::property::{SessionInfo, WindowSessionProperty, WsPropertyChangeAction};
use crate::session::ConnectHandles;
use crate::types::{FocusChangeReason, ForceHideState, PersistentId, VisibilityState};
use crate::wire::{Frame, FrameError};

/// Reply status carried in a reply frame's opcode field.
pub const REPLY_OK: u32 = 0;

/// Carries one request frame to the service and returns its reply frame.
pub trait Transport: Send + Sync {
    fn transact(&self, request: Frame) -> impl Future<Output = Result<Frame>> + Send;
}

/// In-process transport: every frame is encoded to bytes and decoded again on
/// both legs, then handed straight to a dispatcher.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    dispatcher: Arc<RemoteRequestDispatcher>,
    caller: Caller,
    objects: Arc<RemoteObjects>,
    max_frame_len: usize,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new(dispatcher: Arc<RemoteRequestDispatcher>, caller: Caller) -> Self {
        let max_frame_len = dispatcher.queue().manager().config().transport.max_frame_len;
        Self {
            dispatcher,
            caller,
            objects: Arc::new(RemoteObjects::new()),
            max_frame_len,
        }
    }

    /// Remote objects of this connection, for registering agents and detach
    /// callbacks before referring to them.
    #[must_use]
    pub fn objects(&self) -> &Arc<RemoteObjects> {
        &self.objects
    }

    #[must_use]
    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

impl Transport for LoopbackTransport {
    async fn transact(&self, request: Frame) -> Result<Frame> {
        let bytes = request.encode()?;
        let request = Frame::decode(bytes.as_slice(), self.max_frame_len)?;
        let mut data = Parcel::from_bytes(request.payload);
        let reply = match self
            .dispatcher
            .on_remote_request(request.opcode, &mut data, &self.caller, &self.objects)
            .await
        {
            Ok(parcel) => Frame::new(request.serial, REPLY_OK, parcel.into_bytes()),
            Err(err) => Frame::new(request.serial, err.code().unsigned_abs(), Vec::new()),
        };
        let bytes = reply.encode()?;
        Ok(Frame::decode(bytes.as_slice(), self.max_frame_len)?)
    }
}

#[derive(Debug)]
pub struct SceneSessionManagerProxy<T> {
    transport: T,
    next_serial: AtomicU64,
    parcel_capacity: usize,
}

impl<T: Transport> SceneSessionManagerProxy<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_serial: AtomicU64::new(1),
            parcel_capacity: DEFAULT_CAPACITY,
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn begin(&self) -> Result<Parcel> {
        let mut parcel = Parcel::with_capacity(self.parcel_capacity);
        parcel.write_string(INTERFACE_DESCRIPTOR)?;
        Ok(parcel)
    }

    async fn call(&self, message: M, parcel: Parcel) -> Result<Parcel> {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let reply = self
            .transport
            .transact(Frame::new(serial, message.code(), parcel.into_bytes()))
            .await?;
        if reply.serial != serial {
            return Err(FrameError::Corrupt(format!(
                "reply serial {} does not match request serial {serial}",
                reply.serial
            ))
            .into());
        }
        if reply.opcode != REPLY_OK {
            let status = i32::try_from(reply.opcode).unwrap_or(i32::MAX);
            return Err(Error::Transaction(
                TransactionError::from_code(status).unwrap_or(TransactionError::TransactionFailed),
            ));
        }
        Ok(Parcel::from_bytes(reply.payload))
    }

    async fn call_ws(&self, message: M, parcel: Parcel) -> Result<WsResult> {
        let mut reply = self.call(message, parcel).await?;
        Ok(ws_result_from_code(reply.read_i32()?))
    }

    async fn call_wm(&self, message: M, parcel: Parcel) -> Result<WmResult> {
        let mut reply = self.call(message, parcel).await?;
        Ok(wm_result_from_code(reply.read_i32()?))
    }

    fn create_request(
        &self,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> Result<Parcel> {
        let mut parcel = self.begin()?;
        for handle in [handles.stage, handles.event_channel, handles.surface] {
            parcel.write_remote_object(handle.unwrap_or(0))?;
        }
        parcel.write_value(property)?;
        parcel.write_bool(token.is_some())?;
        if let Some(token) = token {
            parcel.write_u64(token)?;
        }
        Ok(parcel)
    }

    async fn call_create(&self, message: M, parcel: Parcel) -> Result<WsResult<PersistentId>> {
        let mut reply = self.call(message, parcel).await?;
        let id = reply.read_i32()?;
        Ok(ws_result_from_code(reply.read_i32()?).map(|()| id))
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub async fn create_and_connect_specific_session(
        &self,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> Result<WsResult<PersistentId>> {
        let parcel = self.create_request(handles, property, token)?;
        self.call_create(M::CreateAndConnectSpecificSession, parcel).await
    }

    pub async fn recover_and_connect_specific_session(
        &self,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> Result<WsResult<PersistentId>> {
        let parcel = self.create_request(handles, property, token)?;
        self.call_create(M::RecoverAndConnectSpecificSession, parcel).await
    }

    pub async fn recover_and_reconnect_scene_session(
        &self,
        handles: ConnectHandles,
        property: &WindowSessionProperty,
        token: Option<u64>,
    ) -> Result<WsResult<PersistentId>> {
        let parcel = self.create_request(handles, property, token)?;
        self.call_create(M::RecoverAndReconnectSceneSession, parcel).await
    }

    pub async fn destroy_and_disconnect_specific_session(&self, id: PersistentId) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        self.call_ws(M::DestroyAndDisconnectSpecificSession, parcel).await
    }

    /// `callback_handle` must already be registered in the connection's
    /// remote objects.
    pub async fn destroy_and_disconnect_specific_session_with_detach_callback(
        &self,
        id: PersistentId,
        callback_handle: u64,
    ) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_remote_object(callback_handle)?;
        self.call_ws(M::DestroyAndDisconnectSpecificSessionWithDetachCallback, parcel)
            .await
    }

    pub async fn bind_dialog_target(&self, id: PersistentId, target_token: u64) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_u64(target_token)?;
        self.call_ws(M::BindDialogTarget, parcel).await
    }

    pub async fn set_alive_persistent_ids(&self, ids: &[PersistentId]) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_len(ids.len())?;
        for id in ids {
            parcel.write_i32(*id)?;
        }
        self.call_ws(M::SetAlivePersistentIds, parcel).await
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn property_request(
        &self,
        id: PersistentId,
        property: &WindowSessionProperty,
        actions: WsPropertyChangeAction,
    ) -> Result<Parcel> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_u64(actions.bits())?;
        property.write(&mut parcel, actions)?;
        Ok(parcel)
    }

    pub async fn update_property(
        &self,
        id: PersistentId,
        property: &WindowSessionProperty,
        actions: WsPropertyChangeAction,
    ) -> Result<WmResult> {
        let parcel = self.property_request(id, property, actions)?;
        self.call_wm(M::UpdateProperty, parcel).await
    }

    pub async fn update_session_property_by_action(
        &self,
        id: PersistentId,
        property: &WindowSessionProperty,
        action: WsPropertyChangeAction,
    ) -> Result<WmResult> {
        let parcel = self.property_request(id, property, action)?;
        self.call_wm(M::UpdateSessionPropertyByAction, parcel).await
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub async fn request_focus(&self, id: PersistentId, is_focused: bool) -> Result<WmResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_bool(is_focused)?;
        self.call_wm(M::RequestFocus, parcel).await
    }

    fn focus_request(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> Result<Parcel> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_bool(is_focused)?;
        parcel.write_bool(by_foreground)?;
        parcel.write_u32(reason.as_u32())?;
        Ok(parcel)
    }

    pub async fn request_focus_status(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> Result<WsResult> {
        let parcel = self.focus_request(id, is_focused, by_foreground, reason)?;
        self.call_ws(M::RequestFocusStatus, parcel).await
    }

    pub async fn request_focus_status_by_sa(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> Result<WmResult> {
        let parcel = self.focus_request(id, is_focused, by_foreground, reason)?;
        self.call_wm(M::RequestFocusStatusBySa, parcel).await
    }

    /// Returns as soon as the request is queued.
    pub async fn request_focus_status_by_scb(
        &self,
        id: PersistentId,
        is_focused: bool,
        by_foreground: bool,
        reason: FocusChangeReason,
    ) -> Result<WsResult> {
        let parcel = self.focus_request(id, is_focused, by_foreground, reason)?;
        self.call_ws(M::RequestFocusStatusByScb, parcel).await
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub async fn register_window_manager_agent(
        &self,
        agent_type: WindowManagerAgentType,
        agent_handle: u64,
    ) -> Result<WmResult> {
        let mut parcel = self.begin()?;
        parcel.write_u32(agent_type.as_u32())?;
        parcel.write_remote_object(agent_handle)?;
        self.call_wm(M::RegisterWindowManagerAgent, parcel).await
    }

    pub async fn unregister_window_manager_agent(
        &self,
        agent_type: WindowManagerAgentType,
        agent_handle: u64,
    ) -> Result<WmResult> {
        let mut parcel = self.begin()?;
        parcel.write_u32(agent_type.as_u32())?;
        parcel.write_remote_object(agent_handle)?;
        self.call_wm(M::UnregisterWindowManagerAgent, parcel).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_focus_session_info(&self, display_id: u64) -> Result<Option<FocusChangeInfo>> {
        let mut parcel = self.begin()?;
        parcel.write_u64(display_id)?;
        let mut reply = self.call(M::GetFocusSessionInfo, parcel).await?;
        let info = if reply.read_bool()? {
            Some(reply.read_value()?)
        } else {
            None
        };
        ws_result_from_code(reply.read_i32()?)?;
        Ok(info)
    }

    pub async fn get_visibility_window_info(&self) -> Result<Vec<WindowVisibilityInfo>> {
        let mut reply = self.call(M::GetVisibilityWindowInfo, self.begin()?).await?;
        let infos = reply.read_values(MAX_VEC_LEN)?;
        ws_result_from_code(reply.read_i32()?)?;
        Ok(infos)
    }

    pub async fn get_accessibility_window_info(&self) -> Result<WmResult<Vec<WindowInfo>>> {
        let mut reply = self.call(M::GetAccessibilityWindowInfo, self.begin()?).await?;
        let infos = reply.read_values(MAX_VEC_LEN)?;
        Ok(wm_result_from_code(reply.read_i32()?).map(|()| infos))
    }

    pub async fn get_all_window_layout_info(&self, display_id: u64) -> Result<WmResult<Vec<WindowInfo>>> {
        let mut parcel = self.begin()?;
        parcel.write_u64(display_id)?;
        let mut reply = self.call(M::GetAllWindowLayoutInfo, parcel).await?;
        let infos = reply.read_values(MAX_VEC_LEN)?;
        Ok(wm_result_from_code(reply.read_i32()?).map(|()| infos))
    }

    pub async fn get_session_info(&self, id: PersistentId) -> Result<WsResult<SessionInfo>> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        let mut reply = self.call(M::GetSessionInfo, parcel).await?;
        let info: SessionInfo = reply.read_value()?;
        Ok(ws_result_from_code(reply.read_i32()?).map(|()| info))
    }

    // =========================================================================
    // Scene board
    // =========================================================================

    async fn id_call(&self, message: M, id: PersistentId) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        self.call_ws(message, parcel).await
    }

    pub async fn foreground_session(&self, id: PersistentId) -> Result<WsResult> {
        self.id_call(M::ForegroundSession, id).await
    }

    pub async fn background_session(&self, id: PersistentId) -> Result<WsResult> {
        self.id_call(M::BackgroundSession, id).await
    }

    pub async fn disconnect_session(&self, id: PersistentId) -> Result<WsResult> {
        self.id_call(M::DisconnectSession, id).await
    }

    pub async fn destroy_session(&self, id: PersistentId) -> Result<WsResult> {
        self.id_call(M::DestroySession, id).await
    }

    pub async fn set_session_active(&self, id: PersistentId, active: bool) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_bool(active)?;
        self.call_ws(M::SetSessionActive, parcel).await
    }

    pub async fn update_z_order(&self, id: PersistentId, z_order: u32) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_u32(z_order)?;
        self.call_ws(M::UpdateZOrder, parcel).await
    }

    pub async fn update_visibility(&self, id: PersistentId, visibility: VisibilityState) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_u32(visibility.as_u32())?;
        self.call_ws(M::UpdateVisibility, parcel).await
    }

    pub async fn set_force_hide_state(&self, id: PersistentId, state: ForceHideState) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_u32(state.as_u32())?;
        self.call_ws(M::SetForceHideState, parcel).await
    }

    pub async fn set_blocking_focus(&self, id: PersistentId, blocking: bool) -> Result<WsResult> {
        let mut parcel = self.begin()?;
        parcel.write_i32(id)?;
        parcel.write_bool(blocking)?;
        self.call_ws(M::SetBlockingFocus, parcel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentEvent, RecordingAgent};
    use crate::config::Config;
    use crate::error::{WmError, WsError};
    use crate::manager::SceneSessionManager;
    use crate::session::DetachCallback;
    use crate::task_queue::SerialTaskQueue;
    use crate::types::{SessionState, WindowMode, WindowType};
    use parking_lot::Mutex;

    struct Harness {
        dispatcher: Arc<RemoteRequestDispatcher>,
        scb: SceneSessionManagerProxy<LoopbackTransport>,
    }

    impl Harness {
        fn new() -> Self {
            let ssm = Arc::new(SceneSessionManager::new(Config::default()));
            let dispatcher = Arc::new(RemoteRequestDispatcher::new(Arc::new(
                SerialTaskQueue::start(ssm, 64),
            )));
            let scb = SceneSessionManagerProxy::new(LoopbackTransport::new(
                Arc::clone(&dispatcher),
                Caller::system(1),
            ));
            Self { dispatcher, scb }
        }

        fn client(&self, pid: u32) -> SceneSessionManagerProxy<LoopbackTransport> {
            SceneSessionManagerProxy::new(LoopbackTransport::new(
                Arc::clone(&self.dispatcher),
                Caller::app(pid),
            ))
        }

        fn manager(&self) -> &Arc<SceneSessionManager> {
            self.dispatcher.queue().manager()
        }

        async fn shown_main(&self, client: &SceneSessionManagerProxy<LoopbackTransport>, z: u32) -> PersistentId {
            let mut property = WindowSessionProperty::default();
            property.set_window_type(WindowType::AppMainWindow);
            let id = client
                .create_and_connect_specific_session(ConnectHandles::default(), &property, Some(u64::from(z) + 900))
                .await
                .unwrap()
                .unwrap();
            self.scb.update_z_order(id, z).await.unwrap().unwrap();
            self.scb.foreground_session(id).await.unwrap().unwrap();
            id
        }
    }

    #[tokio::test]
    async fn focus_follows_foreground_over_the_wire() {
        let h = Harness::new();
        let app = h.client(10);
        let low = h.shown_main(&app, 1).await;
        let high = h.shown_main(&app, 2).await;

        let info = h.scb.get_focus_session_info(0).await.unwrap().unwrap();
        assert_eq!(info.persistent_id, high);

        app.request_focus(low, true).await.unwrap().unwrap();
        assert_eq!(h.manager().focused_session_id(), low);

        h.scb
            .request_focus_status(high, true, false, FocusChangeReason::Click)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.manager().focused_session_id(), high);

        h.scb.background_session(high).await.unwrap().unwrap();
        assert_eq!(h.manager().focused_session_id(), low);
        assert_eq!(
            h.manager().get_session_view(high).unwrap().state,
            SessionState::Background
        );
    }

    #[tokio::test]
    async fn scb_focus_request_is_queued_in_order() {
        let h = Harness::new();
        let app = h.client(10);
        let low = h.shown_main(&app, 1).await;
        let _high = h.shown_main(&app, 2).await;

        h.scb
            .request_focus_status_by_scb(low, true, false, FocusChangeReason::ScbSessionRequest)
            .await
            .unwrap()
            .unwrap();
        // Any later synchronous call runs after the queued request.
        h.scb.update_z_order(low, 1).await.unwrap().unwrap();
        assert_eq!(h.manager().focused_session_id(), low);
    }

    #[tokio::test]
    async fn error_codes_cross_the_boundary() {
        let h = Harness::new();
        let app = h.client(10);
        let id = h.shown_main(&app, 1).await;

        assert_eq!(
            app.request_focus_status_by_sa(id, true, false, FocusChangeReason::SaRequest)
                .await
                .unwrap(),
            Err(WmError::NotSystemApp)
        );
        assert_eq!(app.foreground_session(id).await.unwrap(), Err(WsError::NotSystemApp));
        assert_eq!(
            h.scb.destroy_and_disconnect_specific_session(404).await.unwrap(),
            Err(WsError::Nullptr)
        );
        assert_eq!(
            app.get_accessibility_window_info().await.unwrap(),
            Err(WmError::NotSystemApp)
        );
        assert_eq!(
            h.scb.get_session_info(404).await.unwrap(),
            Err(WsError::InvalidSession)
        );
    }

    #[tokio::test]
    async fn partial_property_update_over_the_wire() {
        let h = Harness::new();
        let app = h.client(10);
        let id = h.shown_main(&app, 1).await;

        let mut property = WindowSessionProperty::default();
        property.set_window_mode(WindowMode::Floating);
        property.set_keep_screen_on(true);
        app.update_property(
            id,
            &property,
            WsPropertyChangeAction::MODE | WsPropertyChangeAction::KEEP_SCREEN_ON,
        )
        .await
        .unwrap()
        .unwrap();

        let layout = h.scb.get_all_window_layout_info(0).await.unwrap().unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].window_mode, WindowMode::Floating);

        assert_eq!(
            app.update_session_property_by_action(id, &property, WsPropertyChangeAction::TOPMOST)
                .await
                .unwrap(),
            Err(WmError::NotSystemApp)
        );
    }

    #[tokio::test]
    async fn agents_register_through_remote_handles() {
        let h = Harness::new();
        let recorder = Arc::new(RecordingAgent::new());
        h.scb.transport().objects().insert_agent(5, recorder.clone());
        h.scb
            .register_window_manager_agent(WindowManagerAgentType::Focus, 5)
            .await
            .unwrap()
            .unwrap();

        let app = h.client(10);
        let id = h.shown_main(&app, 1).await;
        assert!(recorder.events().iter().any(|event| matches!(
            event,
            AgentEvent::Focus { info, focused: true } if info.persistent_id == id
        )));

        h.scb
            .unregister_window_manager_agent(WindowManagerAgentType::Focus, 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            h.scb
                .unregister_window_manager_agent(WindowManagerAgentType::Focus, 5)
                .await
                .unwrap(),
            Err(WmError::InvalidParam)
        );
    }

    struct CountingDetach(Mutex<Vec<PersistentId>>);

    impl DetachCallback for CountingDetach {
        fn on_session_detached(&self, persistent_id: PersistentId) {
            self.0.lock().push(persistent_id);
        }
    }

    #[tokio::test]
    async fn destroy_with_detach_callback_fires_once() {
        let h = Harness::new();
        let app = h.client(10);
        let parent = h.shown_main(&app, 1).await;
        let mut property = WindowSessionProperty::default();
        property.set_window_type(WindowType::AppSubWindow);
        property.set_parent_persistent_id(parent);
        let sub = app
            .create_and_connect_specific_session(ConnectHandles::default(), &property, None)
            .await
            .unwrap()
            .unwrap();

        let detach = Arc::new(CountingDetach(Mutex::new(Vec::new())));
        app.transport().objects().insert_detach_callback(9, detach.clone());
        app.destroy_and_disconnect_specific_session_with_detach_callback(sub, 9)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*detach.0.lock(), vec![sub]);
        assert!(!h.manager().registry().contains(sub));
    }

    #[tokio::test]
    async fn recovery_round_trip() {
        let h = Harness::new();
        h.scb.set_alive_persistent_ids(&[7]).await.unwrap().unwrap();
        let mut property = WindowSessionProperty::default();
        property.set_window_type(WindowType::AppMainWindow);
        property.set_persistent_id(7);
        let app = h.client(10);
        assert_eq!(
            app.recover_and_reconnect_scene_session(ConnectHandles::default(), &property, None)
                .await
                .unwrap(),
            Ok(7)
        );
        assert_eq!(
            app.recover_and_reconnect_scene_session(ConnectHandles::default(), &property, None)
                .await
                .unwrap(),
            Err(WsError::InvalidParam)
        );
    }

    #[tokio::test]
    async fn transaction_errors_surface_as_infrastructure_errors() {
        let h = Harness::new();
        h.dispatcher.queue().shutdown().await;
        let err = h.scb.foreground_session(1).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionError::TransactionFailed)
        ));
    }
}

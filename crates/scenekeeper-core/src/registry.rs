//! Process-wide table of live sessions.
//!
//! Structural changes (insert, erase) take the map lock exclusively. Field
//! changes go through each session's own lock. Enumerations copy the handle
//! list under the map lock, release it, then build [`SessionView`]s, so a
//! concurrent insert or erase never invalidates an iteration.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{WsError, WsResult};
use crate::geometry::DisplayBand;
use crate::property::{SessionInfo, WindowSessionProperty};
use crate::session::{SceneSession, SessionEntity, SessionView};
use crate::types::{DisplayId, INVALID_SESSION_ID, PersistentId};

/// Display geometry and layout filtering policy.
#[derive(Debug, Clone, Default)]
pub struct RegistryPolicy {
    pub displays: Vec<DisplayBand>,
    /// Ability names of system components admitted into layout enumeration.
    pub layout_whitelist: Vec<String>,
}

#[derive(Debug)]
pub struct SceneSessionRegistry {
    sessions: RwLock<BTreeMap<PersistentId, SceneSession>>,
    next_id: AtomicI32,
    policy: RegistryPolicy,
}

impl Default for SceneSessionRegistry {
    fn default() -> Self {
        Self::new(RegistryPolicy::default())
    }
}

impl SceneSessionRegistry {
    #[must_use]
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RegistryPolicy {
        &self.policy
    }

    fn allocate_id(&self) -> PersistentId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::AcqRel);
            if id > INVALID_SESSION_ID && !self.sessions.read().contains_key(&id) {
                return id;
            }
            if id <= INVALID_SESSION_ID {
                // Wrapped: restart above the invalid id.
                self.next_id.store(1, Ordering::Release);
            }
        }
    }

    /// Make sure freshly allocated ids never collide with `id`.
    pub fn reserve_id(&self, id: PersistentId) {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::AcqRel);
    }

    /// Allocate a session with a fresh persistent id, seeded from a copy of
    /// `property`, and insert it. The returned handle is already registered.
    pub fn create_scene_session(
        &self,
        info: SessionInfo,
        property: Option<&WindowSessionProperty>,
    ) -> SceneSession {
        let id = self.allocate_id();
        let session = SceneSession::new(SessionEntity::new(id, info, property));
        self.sessions.write().insert(id, session.clone());
        tracing::debug!(persistent_id = id, "scene session created");
        session
    }

    /// Recovery form: register under a known persistent id.
    pub fn create_with_id(
        &self,
        id: PersistentId,
        info: SessionInfo,
        property: Option<&WindowSessionProperty>,
    ) -> WsResult<SceneSession> {
        if id <= INVALID_SESSION_ID {
            return Err(WsError::InvalidParam);
        }
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&id) {
            return Err(WsError::RepeatOperation);
        }
        let session = SceneSession::new(SessionEntity::new(id, info, property));
        sessions.insert(id, session.clone());
        drop(sessions);
        self.reserve_id(id);
        tracing::debug!(persistent_id = id, "scene session recovered");
        Ok(session)
    }

    #[must_use]
    pub fn get(&self, id: PersistentId) -> Option<SceneSession> {
        if id == INVALID_SESSION_ID {
            return None;
        }
        self.sessions.read().get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: PersistentId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Erase an entry. Teardown ordering is the lifecycle controller's job.
    pub fn remove(&self, id: PersistentId) -> Option<SceneSession> {
        self.sessions.write().remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<PersistentId> {
        self.sessions.read().keys().copied().collect()
    }

    /// Handle list copied under the map lock.
    #[must_use]
    pub fn handles(&self) -> Vec<SceneSession> {
        self.sessions.read().values().cloned().collect()
    }

    /// Views of every session, ordered by persistent id.
    #[must_use]
    pub fn views(&self) -> Vec<SessionView> {
        self.handles().iter().map(SceneSession::view).collect()
    }

    /// Views matching `filter`.
    pub fn views_where<F>(&self, filter: F) -> Vec<SessionView>
    where
        F: Fn(&SessionView) -> bool,
    {
        self.views().into_iter().filter(|view| filter(view)).collect()
    }

    /// Sessions in `FOREGROUND` or `ACTIVE`.
    #[must_use]
    pub fn active_session_copy(&self) -> Vec<SessionView> {
        self.views_where(|view| view.state.is_foreground())
    }

    #[must_use]
    pub fn sessions_by_bundle(&self, bundle_name: &str) -> Vec<SessionView> {
        self.views_where(|view| view.bundle_name == bundle_name)
    }

    #[must_use]
    pub fn sessions_by_display(&self, display_id: DisplayId) -> Vec<SessionView> {
        self.views_where(|view| view.display_id == display_id)
    }

    #[must_use]
    pub fn visible_sessions(&self) -> Vec<SessionView> {
        self.views_where(|view| view.visibility.is_visible() && view.state.is_valid())
    }

    /// Session created with caller token `token`.
    #[must_use]
    pub fn find_by_token(&self, token: u64) -> Option<SceneSession> {
        self.handles()
            .into_iter()
            .find(|session| session.lock().token() == Some(token))
    }

    /// Whether `view` lies on `display_id`. With configured bands, vertical
    /// overlap decides; otherwise the session's own display id does.
    #[must_use]
    pub fn on_display(&self, view: &SessionView, display_id: DisplayId) -> bool {
        match self
            .policy
            .displays
            .iter()
            .find(|band| band.display_id == display_id)
        {
            Some(band) => band.contains(&view.rect),
            None => view.display_id == display_id,
        }
    }

    /// Sessions that belong in a layout dump of `display_id`, highest z first.
    /// System windows are left out unless their ability is whitelisted.
    #[must_use]
    pub fn filter_for_all_window_layout_info(&self, display_id: DisplayId) -> Vec<SessionView> {
        let mut views = self.views_where(|view| {
            view.is_visible_foreground()
                && self.on_display(view, display_id)
                && (!view.window_type.is_system_window()
                    || self
                        .policy
                        .layout_whitelist
                        .iter()
                        .any(|name| *name == view.ability_name))
        });
        views.sort_by(|a, b| b.z_order.cmp(&a.z_order));
        views
    }

    /// Drop every back-reference to `id` held by other sessions.
    pub fn clear_references_to(&self, id: PersistentId) -> usize {
        self.handles()
            .iter()
            .filter(|session| session.persistent_id() != id)
            .filter(|session| session.lock().forget(id))
            .count()
    }

    /// Ids of sessions still referring to `id`.
    #[must_use]
    pub fn referrers_of(&self, id: PersistentId) -> Vec<PersistentId> {
        self.handles()
            .iter()
            .filter(|session| session.persistent_id() != id && session.lock().references(id))
            .map(SceneSession::persistent_id)
            .collect()
    }
}

//! Scenario replay: run a TOML script of window operations end to end
//! (proxy → frame → dispatcher → serial queue → manager) and report the
//! outcome of every step plus the final session table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use scenekeeper_core::Config;
use scenekeeper_core::dispatch::RemoteRequestDispatcher;
use scenekeeper_core::error::{WmResult, WsResult};
use scenekeeper_core::manager::{Caller, SceneSessionManager};
use scenekeeper_core::property::{WindowSessionProperty, WsPropertyChangeAction};
use scenekeeper_core::proxy::{LoopbackTransport, SceneSessionManagerProxy};
use scenekeeper_core::session::{ConnectHandles, SessionView};
use scenekeeper_core::task_queue::SerialTaskQueue;
use scenekeeper_core::types::{
    DEFAULT_DISPLAY_ID, FocusChangeReason, INVALID_SESSION_ID, PersistentId, VisibilityState,
    WindowMode, WindowType,
};

const DEFAULT_PID: u32 = 100;
const SCENE_BOARD_PID: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_window_type() -> WindowType {
    WindowType::AppMainWindow
}

fn default_pid() -> u32 {
    DEFAULT_PID
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Create {
        name: String,
        #[serde(default = "default_window_type")]
        window_type: WindowType,
        parent: Option<String>,
        #[serde(default = "default_pid")]
        pid: u32,
        #[serde(default)]
        system: bool,
        token: Option<u64>,
        z: Option<u32>,
    },
    Foreground {
        window: String,
    },
    Background {
        window: String,
    },
    Focus {
        window: String,
        #[serde(default)]
        reason: FocusChangeReason,
    },
    Unfocus {
        window: String,
    },
    UpdateProperty {
        window: String,
        mode: Option<WindowMode>,
        focusable: Option<bool>,
        touchable: Option<bool>,
        keep_screen_on: Option<bool>,
        topmost: Option<bool>,
        brightness: Option<f32>,
    },
    Destroy {
        window: String,
    },
    BindDialog {
        window: String,
        target: u64,
    },
    SetZ {
        window: String,
        z: u32,
    },
    SetVisibility {
        window: String,
        visibility: VisibilityState,
    },
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Foreground { .. } => "foreground",
            Self::Background { .. } => "background",
            Self::Focus { .. } => "focus",
            Self::Unfocus { .. } => "unfocus",
            Self::UpdateProperty { .. } => "update-property",
            Self::Destroy { .. } => "destroy",
            Self::BindDialog { .. } => "bind-dialog",
            Self::SetZ { .. } => "set-z",
            Self::SetVisibility { .. } => "set-visibility",
        }
    }

    fn window(&self) -> &str {
        match self {
            Self::Create { name, .. } => name,
            Self::Foreground { window }
            | Self::Background { window }
            | Self::Focus { window, .. }
            | Self::Unfocus { window }
            | Self::UpdateProperty { window, .. }
            | Self::Destroy { window }
            | Self::BindDialog { window, .. }
            | Self::SetZ { window, .. }
            | Self::SetVisibility { window, .. } => window,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse script {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub window: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub windows: BTreeMap<String, PersistentId>,
    pub focused: Option<String>,
    pub focused_id: PersistentId,
    pub sessions: Vec<SessionView>,
}

impl ReplayReport {
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let status = step.error.as_deref().unwrap_or("ok");
            out.push_str(&format!(
                "{:>3}  {:<16} {:<12} {}\n",
                step.index, step.action, step.window, status
            ));
        }
        out.push('\n');
        let names: BTreeMap<PersistentId, &str> = self
            .windows
            .iter()
            .map(|(name, id)| (*id, name.as_str()))
            .collect();
        out.push_str("id    name         type                  state        z   visible  focused\n");
        for view in &self.sessions {
            out.push_str(&format!(
                "{:<5} {:<12} {:<21} {:<12} {:<3} {:<8} {}\n",
                view.persistent_id,
                names.get(&view.persistent_id).copied().unwrap_or("-"),
                view.window_type.label(),
                view.state.label(),
                view.z_order,
                view.visibility.is_visible(),
                view.focused,
            ));
        }
        out.push_str(&format!(
            "\nfocused: {}\n",
            self.focused.as_deref().unwrap_or("none")
        ));
        out
    }
}

type Proxy = SceneSessionManagerProxy<LoopbackTransport>;

struct Replayer {
    dispatcher: Arc<RemoteRequestDispatcher>,
    scene_board: Proxy,
    clients: BTreeMap<(u32, bool), Proxy>,
    windows: BTreeMap<String, PersistentId>,
    owners: BTreeMap<PersistentId, (u32, bool)>,
}

fn ws_outcome(result: WsResult) -> (i32, Option<String>) {
    match result {
        Ok(()) => (0, None),
        Err(err) => (err.code(), Some(err.to_string())),
    }
}

fn wm_outcome(result: WmResult) -> (i32, Option<String>) {
    match result {
        Ok(()) => (0, None),
        Err(err) => (err.code(), Some(err.to_string())),
    }
}

impl Replayer {
    fn new(manager: Arc<SceneSessionManager>) -> Self {
        let capacity = manager.config().queue.capacity;
        let queue = Arc::new(SerialTaskQueue::start(manager, capacity));
        let dispatcher = Arc::new(RemoteRequestDispatcher::new(queue));
        let scene_board = SceneSessionManagerProxy::new(LoopbackTransport::new(
            Arc::clone(&dispatcher),
            Caller::system(SCENE_BOARD_PID),
        ));
        Self {
            dispatcher,
            scene_board,
            clients: BTreeMap::new(),
            windows: BTreeMap::new(),
            owners: BTreeMap::new(),
        }
    }

    fn client(&mut self, pid: u32, system: bool) -> &Proxy {
        let dispatcher = &self.dispatcher;
        self.clients.entry((pid, system)).or_insert_with(|| {
            let caller = if system {
                Caller::system(pid)
            } else {
                Caller::app(pid)
            };
            SceneSessionManagerProxy::new(LoopbackTransport::new(Arc::clone(dispatcher), caller))
        })
    }

    fn resolve(&self, name: &str) -> Result<PersistentId> {
        self.windows
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown window '{name}'; create it in an earlier step"))
    }

    fn owner_of(&mut self, id: PersistentId) -> &Proxy {
        let (pid, system) = self
            .owners
            .get(&id)
            .copied()
            .unwrap_or((DEFAULT_PID, false));
        self.client(pid, system)
    }

    async fn run_step(&mut self, step: &Step) -> Result<(i32, Option<String>)> {
        let outcome = match step {
            Step::Create {
                name,
                window_type,
                parent,
                pid,
                system,
                token,
                z,
            } => {
                let mut property = WindowSessionProperty::default();
                property.set_window_type(*window_type);
                property.set_window_name(name.clone());
                if let Some(parent) = parent {
                    property.set_parent_persistent_id(self.resolve(parent)?);
                }
                let created = self
                    .client(*pid, *system)
                    .create_and_connect_specific_session(ConnectHandles::default(), &property, *token)
                    .await?;
                match created {
                    Ok(id) => {
                        self.windows.insert(name.clone(), id);
                        self.owners.insert(id, (*pid, *system));
                        match z {
                            Some(z) => ws_outcome(self.scene_board.update_z_order(id, *z).await?),
                            None => (0, None),
                        }
                    }
                    Err(err) => (err.code(), Some(err.to_string())),
                }
            }
            Step::Foreground { window } => {
                let id = self.resolve(window)?;
                ws_outcome(self.scene_board.foreground_session(id).await?)
            }
            Step::Background { window } => {
                let id = self.resolve(window)?;
                ws_outcome(self.scene_board.background_session(id).await?)
            }
            Step::Focus { window, reason } => {
                let id = self.resolve(window)?;
                ws_outcome(
                    self.scene_board
                        .request_focus_status(id, true, false, *reason)
                        .await?,
                )
            }
            Step::Unfocus { window } => {
                let id = self.resolve(window)?;
                ws_outcome(
                    self.scene_board
                        .request_focus_status(id, false, false, FocusChangeReason::Default)
                        .await?,
                )
            }
            Step::UpdateProperty {
                window,
                mode,
                focusable,
                touchable,
                keep_screen_on,
                topmost,
                brightness,
            } => {
                let id = self.resolve(window)?;
                let mut property = WindowSessionProperty::default();
                let mut actions = WsPropertyChangeAction::empty();
                if let Some(mode) = mode {
                    property.set_window_mode(*mode);
                    actions |= WsPropertyChangeAction::MODE;
                }
                if let Some(focusable) = focusable {
                    property.set_focusable(*focusable);
                    actions |= WsPropertyChangeAction::FOCUSABLE;
                }
                if let Some(touchable) = touchable {
                    property.set_touchable(*touchable);
                    actions |= WsPropertyChangeAction::TOUCHABLE;
                }
                if let Some(keep_screen_on) = keep_screen_on {
                    property.set_keep_screen_on(*keep_screen_on);
                    actions |= WsPropertyChangeAction::KEEP_SCREEN_ON;
                }
                if let Some(topmost) = topmost {
                    property.set_topmost(*topmost);
                    actions |= WsPropertyChangeAction::TOPMOST;
                }
                if let Some(brightness) = brightness {
                    property.set_brightness(*brightness);
                    actions |= WsPropertyChangeAction::SET_BRIGHTNESS;
                }
                wm_outcome(
                    self.owner_of(id)
                        .update_property(id, &property, actions)
                        .await?,
                )
            }
            Step::Destroy { window } => {
                let id = self.resolve(window)?;
                let result = self
                    .owner_of(id)
                    .destroy_and_disconnect_specific_session(id)
                    .await?;
                ws_outcome(result)
            }
            Step::BindDialog { window, target } => {
                let id = self.resolve(window)?;
                ws_outcome(self.owner_of(id).bind_dialog_target(id, *target).await?)
            }
            Step::SetZ { window, z } => {
                let id = self.resolve(window)?;
                ws_outcome(self.scene_board.update_z_order(id, *z).await?)
            }
            Step::SetVisibility { window, visibility } => {
                let id = self.resolve(window)?;
                ws_outcome(self.scene_board.update_visibility(id, *visibility).await?)
            }
        };
        Ok(outcome)
    }
}

/// Run `script` against a fresh manager built from `config`.
pub async fn run(config: Config, script: &Script) -> Result<ReplayReport> {
    let manager = Arc::new(SceneSessionManager::new(config));
    let mut replayer = Replayer::new(Arc::clone(&manager));

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let (code, error) = replayer
            .run_step(step)
            .await
            .with_context(|| format!("step {index} ({}) failed", step.label()))?;
        tracing::debug!(index, action = step.label(), code, "replay step");
        steps.push(StepOutcome {
            index,
            action: step.label(),
            window: step.window().to_string(),
            code,
            error,
        });
    }

    let focus = replayer
        .scene_board
        .get_focus_session_info(DEFAULT_DISPLAY_ID)
        .await?;
    let focused_id = focus.map_or(INVALID_SESSION_ID, |info| info.persistent_id);
    let focused = replayer
        .windows
        .iter()
        .find(|(_, id)| **id == focused_id)
        .map(|(name, _)| name.clone());

    let mut sessions = manager.registry().views();
    sessions.sort_by_key(|view| view.persistent_id);
    replayer.dispatcher.queue().shutdown().await;

    Ok(ReplayReport {
        steps,
        windows: replayer.windows,
        focused,
        focused_id,
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(text: &str) -> Script {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn steps_parse_with_defaults() {
        let script = script(
            r#"
            [[step]]
            action = "create"
            name = "editor"

            [[step]]
            action = "update-property"
            window = "editor"
            mode = "floating"

            [[step]]
            action = "set-visibility"
            window = "editor"
            visibility = "total_occlusion"
            "#,
        );
        assert_eq!(script.steps.len(), 3);
        assert!(matches!(
            &script.steps[0],
            Step::Create { window_type: WindowType::AppMainWindow, pid: DEFAULT_PID, .. }
        ));
        assert_eq!(script.steps[1].label(), "update-property");
        assert_eq!(script.steps[2].window(), "editor");
    }

    #[tokio::test]
    async fn replay_tracks_focus_and_errors() {
        let script = script(
            r#"
            [[step]]
            action = "create"
            name = "mail"
            z = 1

            [[step]]
            action = "create"
            name = "editor"
            z = 2

            [[step]]
            action = "foreground"
            window = "mail"

            [[step]]
            action = "foreground"
            window = "editor"

            [[step]]
            action = "background"
            window = "editor"

            [[step]]
            action = "focus"
            window = "editor"
            "#,
        );
        let report = run(Config::default(), &script).await.unwrap();
        assert_eq!(report.focused.as_deref(), Some("mail"));
        assert_eq!(report.steps.len(), 6);
        assert!(report.steps[..5].iter().all(|step| step.code == 0));
        assert_eq!(report.steps[5].code, 1);
        assert_eq!(report.sessions.len(), 2);
    }

    #[tokio::test]
    async fn unknown_window_is_a_script_error() {
        let script = script(
            r#"
            [[step]]
            action = "foreground"
            window = "ghost"
            "#,
        );
        let err = run(Config::default(), &script).await.unwrap_err();
        assert!(format!("{err:#}").contains("unknown window 'ghost'"));
    }
}

//! Property-based tests for the session lifecycle and registry integrity.
//!
//! Verifies:
//! - every controller transition agrees with the `next_state` table: a
//!   success lands on the table's state, a failure leaves the state alone
//! - `END` is terminal and a destroyed session leaves the registry
//! - persistent ids are never reused
//! - after any teardown, no live session refers to a destroyed id and every
//!   live sub window still has its parent

use std::collections::BTreeSet;

use proptest::prelude::*;

use scenekeeper_core::config::Config;
use scenekeeper_core::lifecycle::{LifecycleOp, next_state};
use scenekeeper_core::manager::{Caller, SceneSessionManager};
use scenekeeper_core::property::{SessionInfo, WindowSessionProperty};
use scenekeeper_core::session::ConnectHandles;
use scenekeeper_core::types::{INVALID_SESSION_ID, PersistentId, SessionState, WindowType};

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

fn arb_op() -> impl Strategy<Value = LifecycleOp> {
    prop::sample::select(LifecycleOp::ALL.to_vec())
}

fn property(window_type: WindowType) -> WindowSessionProperty {
    let mut property = WindowSessionProperty::default();
    property.set_window_type(window_type);
    property
}

fn run_op(ssm: &SceneSessionManager, id: PersistentId, op: LifecycleOp) -> bool {
    let lifecycle = ssm.lifecycle();
    match op {
        LifecycleOp::Connect => lifecycle.connect(id, ConnectHandles::default(), 7).is_ok(),
        LifecycleOp::Reconnect => lifecycle
            .reconnect(
                id,
                &property(WindowType::AppMainWindow),
                ConnectHandles::default(),
                7,
            )
            .is_ok(),
        LifecycleOp::Foreground => lifecycle.foreground(id).is_ok(),
        LifecycleOp::Background => lifecycle.background(id).is_ok(),
        LifecycleOp::Activate => lifecycle.set_active(id, true).is_ok(),
        LifecycleOp::Deactivate => lifecycle.set_active(id, false).is_ok(),
        LifecycleOp::Disconnect => lifecycle.disconnect(id).is_ok(),
        LifecycleOp::Destroy => lifecycle.destroy(id).is_ok(),
    }
}

// ────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The controller follows the transition table step by step.
    #[test]
    fn prop_controller_matches_transition_table(ops in prop::collection::vec(arb_op(), 1..40)) {
        let ssm = SceneSessionManager::new(Config::default());
        let session = ssm
            .registry()
            .create_scene_session(SessionInfo::default(), Some(&property(WindowType::AppMainWindow)));
        let id = session.persistent_id();
        let mut model = Some(SessionState::Disconnect);

        for op in ops {
            let before = session.state();
            let succeeded = run_op(&ssm, id, op);
            match model {
                None => {
                    prop_assert!(!succeeded, "{:?} succeeded on a destroyed session", op);
                    prop_assert!(!ssm.registry().contains(id));
                }
                Some(state) => {
                    prop_assert_eq!(before, state);
                    let expected = next_state(state, op);
                    prop_assert_eq!(succeeded, expected.is_ok(), "op {:?} from {:?}", op, state);
                    if succeeded {
                        if op == LifecycleOp::Destroy {
                            model = None;
                            prop_assert_eq!(session.state(), SessionState::End);
                            prop_assert!(!ssm.registry().contains(id));
                        } else {
                            let next = expected.unwrap();
                            prop_assert_eq!(session.state(), next);
                            model = Some(next);
                        }
                    } else {
                        prop_assert_eq!(session.state(), state);
                    }
                }
            }
        }
    }

    /// `END` accepts nothing.
    #[test]
    fn prop_end_is_terminal(op in arb_op()) {
        prop_assert!(next_state(SessionState::End, op).is_err());
    }
}

// ────────────────────────────────────────────────────────────────────
// Registry integrity under creation and teardown
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    CreateMain,
    CreateSub(usize),
    Destroy(usize),
}

fn arb_tree_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        2 => Just(TreeOp::CreateMain),
        3 => any::<usize>().prop_map(TreeOp::CreateSub),
        2 => any::<usize>().prop_map(TreeOp::Destroy),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Ids are unique for the registry's lifetime, teardown cascades to
    /// children and leaves no dangling references.
    #[test]
    fn prop_teardown_leaves_no_dangling_references(ops in prop::collection::vec(arb_tree_op(), 1..50)) {
        let ssm = SceneSessionManager::new(Config::default());
        let caller = Caller::app(42);
        let mut issued = BTreeSet::new();
        let mut destroyed = BTreeSet::new();

        for op in ops {
            let live = ssm.registry().ids();
            match op {
                TreeOp::CreateMain => {
                    let session = ssm
                        .registry()
                        .create_scene_session(SessionInfo::default(), Some(&property(WindowType::AppMainWindow)));
                    let id = session.persistent_id();
                    ssm.lifecycle().connect(id, ConnectHandles::default(), caller.pid).unwrap();
                    prop_assert!(issued.insert(id), "id {} reused", id);
                }
                TreeOp::CreateSub(pick) if !live.is_empty() => {
                    let parent = live[pick % live.len()];
                    let mut sub = property(WindowType::AppSubWindow);
                    sub.set_parent_persistent_id(parent);
                    if let Ok((id, _)) = ssm.create_and_connect_specific_session(
                        &caller,
                        ConnectHandles::default(),
                        &sub,
                        None,
                    ) {
                        prop_assert!(issued.insert(id), "id {} reused", id);
                    }
                }
                TreeOp::Destroy(pick) if !live.is_empty() => {
                    let id = live[pick % live.len()];
                    ssm.destroy_session(id).unwrap();
                }
                _ => {}
            }

            let now_live: BTreeSet<PersistentId> = ssm.registry().ids().into_iter().collect();
            destroyed.extend(issued.difference(&now_live).copied());
            for id in &destroyed {
                prop_assert!(!ssm.registry().contains(*id));
                prop_assert!(ssm.registry().referrers_of(*id).is_empty(), "dangling reference to {}", id);
            }
            for view in ssm.registry().views() {
                if view.parent_id != INVALID_SESSION_ID {
                    prop_assert!(now_live.contains(&view.parent_id), "orphaned sub window {}", view.persistent_id);
                }
                for child in &view.sub_windows {
                    prop_assert!(now_live.contains(child));
                }
            }
        }
    }
}

//! Integration tests for the FileSift application.
//!
//! The tests drive the app through `handle_ipc_message` with the same JSON the
//! frontend sends, and observe the `UserEvent`s on a tokio MPSC channel.

use filesift::app::{self, events::UserEvent, proxy::EventProxy, state::AppState};
use filesift::app::view_model::UiState;
use filesift::config::AppConfig;
use filesift::core::ConflictPolicy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use filesift::app::file_dialog::DialogService;
    use std::fs;

    /// A test double for the `EventLoopProxy` using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            // Background tasks may still report after the test finished.
            let _ = self.sender.send(event);
        }
    }

    /// Answers every dialog with preconfigured paths.
    #[derive(Default)]
    pub struct ScriptedDialogs {
        pub folders: Vec<PathBuf>,
        pub spreadsheet: Option<PathBuf>,
        pub export_dir: Option<PathBuf>,
    }

    impl DialogService for ScriptedDialogs {
        fn pick_directories(&self) -> Vec<PathBuf> {
            self.folders.clone()
        }
        fn pick_spreadsheet(&self) -> Option<PathBuf> {
            self.spreadsheet.clone()
        }
        fn pick_export_directory(&self, _start: Option<&Path>) -> Option<PathBuf> {
            self.export_dir.clone()
        }
    }

    /// `TestHarness` sets up a complete, isolated environment for each test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub dialogs: Arc<ScriptedDialogs>,
        pub root_path: PathBuf,
        pub work_path: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new(conflict_policy: ConflictPolicy) -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().join("library");
            let work_path = temp_dir.path().join("work");
            fs::create_dir_all(&root_path).unwrap();
            fs::create_dir_all(&work_path).unwrap();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let config = AppConfig {
                search_debounce_ms: 0,
                export_directory: None,
                conflict_policy,
                ..Default::default()
            };
            let mut state = AppState::with_config(config);
            state.config_path = Some(work_path.join("config.json"));

            let dialogs = ScriptedDialogs {
                folders: vec![root_path.clone()],
                spreadsheet: Some(work_path.join("materials.csv")),
                export_dir: Some(work_path.join("out")),
            };

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                dialogs: Arc::new(dialogs),
                root_path,
                work_path,
                _temp_dir: temp_dir,
            }
        }

        /// Creates a file inside the searched library.
        pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(&file_path, content).expect("Failed to write file");
            file_path
        }

        /// Sends a raw IPC message, exactly as the WebView would.
        pub fn ipc(&self, command: &str, payload: serde_json::Value) {
            let message = serde_json::json!({ "command": command, "payload": payload }).to_string();
            app::handle_ipc_message(
                message,
                self.dialogs.clone(),
                self.proxy.clone(),
                self.state.clone(),
            );
        }

        pub fn drain(&mut self) {
            while self.event_rx.try_recv().is_ok() {}
        }

        /// Waits for a state update matching `predicate`.
        pub async fn wait_for_state<F: Fn(&UiState) -> bool>(&mut self, predicate: F) -> Box<UiState> {
            let deadline = tokio::time::sleep(Duration::from_secs(10));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    event = self.event_rx.recv() => match event {
                        Some(UserEvent::StateUpdate(ui)) if predicate(&ui) => return ui,
                        Some(_) => {}
                        None => panic!("Event channel closed"),
                    },
                    _ = &mut deadline => panic!("Timed out waiting for state update"),
                }
            }
        }

        /// Waits for the export result event.
        pub async fn wait_for_export(&mut self) -> (bool, String) {
            let deadline = tokio::time::sleep(Duration::from_secs(10));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    event = self.event_rx.recv() => match event {
                        Some(UserEvent::ExportComplete { success, message }) => return (success, message),
                        Some(_) => {}
                        None => panic!("Event channel closed"),
                    },
                    _ = &mut deadline => panic!("Timed out waiting for export"),
                }
            }
        }
    }
}

use helpers::TestHarness;

fn finished_search(ui: &UiState) -> bool {
    !ui.is_loading_tree && !ui.is_searching && ui.search_progress.total > 0
}

#[tokio::test]
async fn test_search_select_and_export_end_to_end() {
    let mut harness = TestHarness::new(ConflictPolicy::Skip);
    harness.create_file("batteries/BAT-100_spec.pdf", "%PDF-1.4 spec");
    harness.create_file("batteries/BAT-100_drawing.pdf", "%PDF-1.4 drawing");
    harness.create_file("batteries/old/BAT-090_spec.pdf", "%PDF-1.4 old");
    harness.create_file("displays/DSP-200_spec.pdf", "%PDF-1.4 display");

    harness.ipc("selectFolders", serde_json::Value::Null);
    harness
        .wait_for_state(|ui| !ui.is_loading_tree && !ui.tree.is_empty())
        .await;

    harness.drain();
    harness.ipc("updateFilters", serde_json::json!({ "keyword": "BAT" }));
    let ui = harness.wait_for_state(finished_search).await;
    assert_eq!(ui.results.len(), 3);
    assert_eq!(ui.search_progress.total, 4);

    harness.ipc("selectAllResults", serde_json::Value::Null);
    let ui = harness.wait_for_state(|ui| ui.counts.files == 3).await;
    assert!(ui.can_export);
    assert_eq!(ui.checked_result_count, 3);

    harness.ipc("exportSelected", serde_json::Value::Null);
    let (success, message) = harness.wait_for_export().await;
    assert!(success, "{message}");

    let out = harness.work_path.join("out");
    let mut exported: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    exported.sort();
    assert_eq!(
        exported,
        vec!["BAT-090_spec.pdf", "BAT-100_drawing.pdf", "BAT-100_spec.pdf"]
    );
}

#[tokio::test]
async fn test_export_conflicts_follow_configured_policy() {
    let mut harness = TestHarness::new(ConflictPolicy::KeepBoth);
    let file = harness.create_file("a/report.pdf", "%PDF-1.4 new");
    let out = harness.work_path.join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("report.pdf"), "existing").unwrap();

    harness.ipc("addRoots", serde_json::json!([harness.root_path.clone()]));
    harness
        .wait_for_state(|ui| !ui.is_loading_tree && !ui.tree.is_empty())
        .await;
    harness.ipc("setResultChecked", serde_json::json!({ "path": file, "checked": true }));
    harness.wait_for_state(|ui| ui.counts.files == 1).await;

    harness.ipc("exportSelected", serde_json::Value::Null);
    let (success, _) = harness.wait_for_export().await;

    assert!(success);
    assert_eq!(std::fs::read_to_string(out.join("report.pdf")).unwrap(), "existing");
    assert_eq!(std::fs::read_to_string(out.join("report (1).pdf")).unwrap(), "%PDF-1.4 new");
}

#[tokio::test]
async fn test_spreadsheet_driven_filters_narrow_results() {
    let mut harness = TestHarness::new(ConflictPolicy::Skip);
    harness.create_file("x/BAT_A1_630-1_spec.pdf", "%PDF-1.4");
    harness.create_file("x/BAT_A2_630-9_spec.pdf", "%PDF-1.4");
    harness.create_file("x/DSP_D1_630-2_spec.pdf", "%PDF-1.4");
    std::fs::write(
        harness.work_path.join("materials.csv"),
        "Material Category,Material Model,APN\nBAT,A1,630-1\n,A2,630-9\nDSP,D1,630-2\n",
    )
    .unwrap();

    harness.ipc("selectFolders", serde_json::Value::Null);
    harness
        .wait_for_state(|ui| !ui.is_loading_tree && !ui.tree.is_empty())
        .await;
    harness.ipc("selectSpreadsheet", serde_json::Value::Null);
    let ui = harness.wait_for_state(|ui| ui.metadata.is_some()).await;
    assert_eq!(ui.metadata.as_ref().unwrap().categories, vec!["BAT", "DSP"]);

    harness.ipc("selectCategory", serde_json::json!(0));
    harness
        .wait_for_state(|ui| ui.metadata.as_ref().is_some_and(|m| m.models == vec!["A1", "A2"]))
        .await;

    harness.drain();
    harness.ipc(
        "updateFilters",
        serde_json::json!({
            "categoryEnabled": true, "category": "BAT",
            "modelEnabled": true, "model": "A2"
        }),
    );
    let ui = harness.wait_for_state(finished_search).await;
    assert_eq!(ui.results.len(), 1);
    assert!(ui.results[0].display_path.ends_with("BAT_A2_630-9_spec.pdf"));
    assert!(ui.results[0].display_path.starts_with("library/"));
}

#[tokio::test]
async fn test_unknown_and_malformed_messages_are_ignored() {
    let mut harness = TestHarness::new(ConflictPolicy::Skip);

    app::handle_ipc_message(
        "not json".to_string(),
        harness.dialogs.clone(),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    harness.ipc("doesNotExist", serde_json::Value::Null);
    harness.ipc("toggleExpansion", serde_json::json!({ "wrong": 1 }));

    let nothing = tokio::time::timeout(Duration::from_millis(300), harness.event_rx.recv()).await;
    assert!(nothing.is_err(), "no event expected");
}

#[tokio::test]
async fn test_initialize_restores_last_session() {
    let mut harness = TestHarness::new(ConflictPolicy::Skip);
    harness.create_file("a/doc.pdf", "%PDF-1.4");
    {
        let mut state = harness.state.lock().unwrap();
        state.config.last_roots = vec![harness.root_path.clone(), PathBuf::from("/does/not/exist")];
    }

    harness.ipc("initialize", serde_json::Value::Null);

    let ui = harness
        .wait_for_state(|ui| !ui.is_loading_tree && !ui.tree.is_empty())
        .await;
    assert_eq!(ui.roots, vec![harness.root_path.clone()]);
}

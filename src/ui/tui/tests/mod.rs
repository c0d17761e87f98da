use super::keys::{edit_query, key_name};
use super::view::visible_window;
use super::{ExitAction, Msg, PaletteApp, perform_exit};
use crate::application::filesystem::{FilesystemError, WorkspaceFilesystem};
use crate::application::palette::{Mode, Model as PaletteModel, Msg as CoreMsg, Theme};
use crate::application::runtime::EffectRuntime;
use crate::application::sessions::{SessionError, SessionManager};
use crate::domain::{DirEntry, SessionInfo, SessionSpec, WorktreeListing, supported_tools};
use crate::infrastructure::event_log::{Event as LoggedEvent, EventLogger, NullEventLogger};
use ftui::core::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
use ftui::{Cmd, Frame, GraphemePool};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct IdleFilesystem;

impl WorkspaceFilesystem for IdleFilesystem {
    fn scan_dirs(
        &self,
        _roots: &[PathBuf],
        _max_depth: usize,
    ) -> Result<Vec<DirEntry>, FilesystemError> {
        Ok(Vec::new())
    }

    fn create_project(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        Ok(path.to_path_buf())
    }

    fn delete_project(&self, _path: &Path) -> Result<(), FilesystemError> {
        Ok(())
    }

    fn list_worktree_paths(&self, _project_path: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
        Ok(Vec::new())
    }

    fn list_worktrees(&self, _project_path: &Path) -> Result<WorktreeListing, FilesystemError> {
        Ok(WorktreeListing::default())
    }

    fn create_worktree(
        &self,
        project_path: &Path,
        branch: &str,
    ) -> Result<PathBuf, FilesystemError> {
        Ok(project_path.join(branch))
    }

    fn delete_worktree(
        &self,
        _project_path: &Path,
        _worktree_path: &Path,
    ) -> Result<(), FilesystemError> {
        Ok(())
    }

    fn prune_worktrees(&self, _project_path: &Path) -> Result<(), FilesystemError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSessions {
    calls: Mutex<Vec<String>>,
}

impl RecordingSessions {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl SessionManager for RecordingSessions {
    fn open_session(&self, spec: &SessionSpec) -> Result<(), SessionError> {
        self.record(format!("open {} {}", spec.dir_path.display(), spec.tool));
        Ok(())
    }

    fn prewarm_session(&self, _spec: &SessionSpec) -> Result<bool, SessionError> {
        Ok(true)
    }

    fn kill_session(&self, _spec: &SessionSpec) -> Result<(), SessionError> {
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError> {
        Ok(Vec::new())
    }

    fn attach_session(&self, name: &str) -> Result<(), SessionError> {
        self.record(format!("attach {name}"));
        Ok(())
    }

    fn switch_to_last_client(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn inside_multiplexer(&self) -> bool {
        false
    }
}

#[derive(Clone, Default)]
struct RecordingLogger {
    events: Arc<Mutex<Vec<LoggedEvent>>>,
}

impl RecordingLogger {
    fn kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|event| format!("{}/{}", event.event, event.kind))
            .collect()
    }
}

impl EventLogger for RecordingLogger {
    fn log(&self, event: LoggedEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

fn runtime() -> EffectRuntime {
    EffectRuntime::new(
        Arc::new(IdleFilesystem),
        Arc::new(RecordingSessions::default()),
    )
}

fn base_model() -> PaletteModel {
    PaletteModel::new(vec![PathBuf::from("/root")], supported_tools())
        .with_home(Some(PathBuf::from("/home/dev")))
}

fn browsing_app() -> PaletteApp {
    let mut model = base_model();
    model.mode = Mode::Browsing;
    model.dirs = vec![
        DirEntry::new(PathBuf::from("/root/alpha")),
        DirEntry::new(PathBuf::from("/root/beta")),
    ];
    model.refilter_projects();
    PaletteApp::new(model, runtime(), Box::new(NullEventLogger))
}

fn tool_app() -> PaletteApp {
    let mut model = base_model();
    model.mode = Mode::Tool;
    model.selected_project = Some(PathBuf::from("/root/demo"));
    model.selected_worktree_path = Some(PathBuf::from("/root/demo/main"));
    model.tool_warmup_total = model.warmup_tool_count();
    PaletteApp::new(model, runtime(), Box::new(NullEventLogger))
}

fn key_press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code).with_kind(KeyEventKind::Press)
}

fn ctrl(character: char) -> KeyEvent {
    key_press(KeyCode::Char(character)).with_modifiers(Modifiers::CTRL)
}

fn send_key(app: &mut PaletteApp, key_event: KeyEvent) -> Cmd<Msg> {
    ftui::Model::update(app, Msg::Key(key_event))
}

fn row_text(frame: &Frame, y: u16) -> String {
    (0..frame.width())
        .filter_map(|x| {
            frame
                .buffer
                .get(x, y)
                .and_then(|cell| cell.content.as_char())
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn screen_contains(frame: &Frame, text: &str) -> bool {
    (0..frame.height()).any(|y| row_text(frame, y).contains(text))
}

fn with_rendered_frame(app: &PaletteApp, width: u16, height: u16, assert_frame: impl FnOnce(&Frame)) {
    let mut pool = GraphemePool::new();
    let mut frame = Frame::new(width, height, &mut pool);
    ftui::Model::view(app, &mut frame);
    assert_frame(&frame);
}

#[test]
fn key_names_are_canonical() {
    assert_eq!(key_name(&key_press(KeyCode::Down)).as_deref(), Some("down"));
    assert_eq!(key_name(&key_press(KeyCode::Escape)).as_deref(), Some("esc"));
    assert_eq!(key_name(&ctrl('J')).as_deref(), Some("ctrl+j"));
    assert_eq!(key_name(&key_press(KeyCode::Char('x'))).as_deref(), Some("x"));
    assert_eq!(key_name(&key_press(KeyCode::F(5))), None);
}

#[test]
fn query_editing_handles_text_keys_only() {
    assert_eq!(
        edit_query("alp", &key_press(KeyCode::Char('h'))).as_deref(),
        Some("alph")
    );
    assert_eq!(
        edit_query("alp", &key_press(KeyCode::Backspace)).as_deref(),
        Some("al")
    );
    assert_eq!(edit_query("", &key_press(KeyCode::Backspace)), None);
    assert_eq!(edit_query("feature test", &ctrl('w')).as_deref(), Some("feature "));
    assert_eq!(edit_query("feature", &ctrl('u')).as_deref(), Some(""));
    assert_eq!(edit_query("feature", &ctrl('x')), None);
}

#[test]
fn typed_characters_filter_projects() {
    let mut app = browsing_app();
    let _ = send_key(&mut app, key_press(KeyCode::Char('b')));
    assert_eq!(app.model.query, "b");
    assert_eq!(app.model.filtered.len(), 1);
    assert_eq!(app.model.filtered[0].name, "beta");

    let _ = send_key(&mut app, key_press(KeyCode::Backspace));
    assert_eq!(app.model.query, "");
    assert_eq!(app.model.filtered.len(), 2);
}

#[test]
fn bound_keys_do_not_reach_the_query() {
    let mut app = browsing_app();
    let _ = send_key(&mut app, ctrl('j'));
    assert_eq!(app.model.selected_idx, 1);
    assert_eq!(app.model.query, "");
}

#[test]
fn key_release_is_ignored() {
    let mut app = browsing_app();
    let cmd = send_key(
        &mut app,
        KeyEvent::new(KeyCode::Char('b')).with_kind(KeyEventKind::Release),
    );
    assert!(matches!(cmd, Cmd::None));
    assert_eq!(app.model.query, "");
}

#[test]
fn escape_in_browsing_quits_with_quit_action() {
    let mut app = browsing_app();
    let cmd = send_key(&mut app, key_press(KeyCode::Escape));
    assert!(matches!(cmd, Cmd::Quit));
    assert_eq!(app.exit_action(), Some(ExitAction::Quit));
}

#[test]
fn plain_shell_tool_exits_to_open_session() {
    let mut app = tool_app();
    let _ = send_key(&mut app, key_press(KeyCode::End));
    assert_eq!(app.model.selected_tool().map(String::as_str), Some("none"));

    let cmd = send_key(&mut app, key_press(KeyCode::Enter));
    assert!(matches!(cmd, Cmd::Quit));
    assert_eq!(
        app.exit_action(),
        Some(ExitAction::Open(SessionSpec::new("/root/demo/main", "none")))
    );
}

#[test]
fn warmup_tool_waits_in_tool_starting() {
    let mut app = tool_app();
    let cmd = send_key(&mut app, key_press(KeyCode::Enter));
    assert!(!matches!(cmd, Cmd::Quit));
    assert_eq!(app.model.mode, Mode::ToolStarting);
    assert!(app.animating());

    let cmd = ftui::Model::update(
        &mut app,
        Msg::Core(CoreMsg::ToolDelayElapsed {
            tool: "opencode".to_string(),
        }),
    );
    assert!(matches!(cmd, Cmd::Quit));
    assert_eq!(
        app.exit_action(),
        Some(ExitAction::Open(SessionSpec::new("/root/demo/main", "opencode")))
    );
}

#[test]
fn core_messages_log_mode_changes_and_effects() {
    let logger = RecordingLogger::default();
    let mut app = PaletteApp::new(base_model(), runtime(), Box::new(logger.clone()));
    let _ = ftui::Model::init(&mut app);
    let _ = ftui::Model::update(
        &mut app,
        Msg::Core(CoreMsg::ScanCompleted {
            result: Ok(vec![DirEntry::new(PathBuf::from("/root/alpha"))]),
        }),
    );

    assert_eq!(app.model.mode, Mode::Browsing);
    assert_eq!(
        logger.kinds(),
        vec![
            "effect/scan_dirs".to_string(),
            "msg/scan_completed".to_string(),
            "mode_change/mode_changed".to_string(),
        ]
    );
}

#[test]
fn browsing_view_lists_projects_and_creation_slot() {
    let mut app = browsing_app();
    for character in "./newproj".chars() {
        let _ = send_key(&mut app, key_press(KeyCode::Char(character)));
    }

    with_rendered_frame(&app, 80, 12, |frame| {
        assert!(row_text(frame, 0).contains("Rivet"));
        assert!(screen_contains(frame, "> ./newproj"));
        assert!(screen_contains(frame, "+ Create project /root/newproj"));
    });
}

#[test]
fn tool_starting_view_shows_progress_and_cancel_hint() {
    let mut app = tool_app();
    let _ = send_key(&mut app, key_press(KeyCode::Enter));

    with_rendered_frame(&app, 80, 12, |frame| {
        assert!(screen_contains(frame, "esc cancel"));
        assert!(screen_contains(frame, "warmup 0/4"));
        assert!(row_text(frame, 0).contains("demo / main"));
    });
}

#[test]
fn error_view_shows_message() {
    let mut app = browsing_app();
    let _ = ftui::Model::update(
        &mut app,
        Msg::Core(CoreMsg::ProjectDeleted {
            result: Err("permission denied".to_string()),
        }),
    );

    with_rendered_frame(&app, 80, 12, |frame| {
        assert!(screen_contains(frame, "Error"));
        assert!(screen_contains(frame, "permission denied"));
    });
}

#[test]
fn ctrl_t_cycles_theme() {
    let mut app = browsing_app();
    assert_eq!(app.model.theme, Theme::Mocha);
    let _ = send_key(&mut app, ctrl('t'));
    assert_eq!(app.model.theme, Theme::Gruvbox);
}

#[test]
fn visible_window_keeps_selection_on_screen() {
    assert_eq!(visible_window(0, 10, 4), (0, 4));
    assert_eq!(visible_window(3, 10, 4), (0, 4));
    assert_eq!(visible_window(4, 10, 4), (1, 5));
    assert_eq!(visible_window(9, 10, 4), (6, 10));
    assert_eq!(visible_window(2, 3, 10), (0, 3));
    assert_eq!(visible_window(0, 0, 4), (0, 0));
}

#[test]
fn exit_actions_reach_the_session_manager() {
    let sessions = RecordingSessions::default();
    perform_exit(&ExitAction::Quit, &sessions).expect("quit is a no-op");
    perform_exit(
        &ExitAction::Open(SessionSpec::new("/root/demo/main", "amp")),
        &sessions,
    )
    .expect("open should succeed");
    perform_exit(
        &ExitAction::Attach(SessionInfo::new(
            "root-demo-main:amp",
            PathBuf::from("/root/demo/main"),
            "amp",
        )),
        &sessions,
    )
    .expect("attach should succeed");

    assert_eq!(
        sessions.calls(),
        vec![
            "open /root/demo/main amp".to_string(),
            "attach root-demo-main:amp".to_string(),
        ]
    );
}

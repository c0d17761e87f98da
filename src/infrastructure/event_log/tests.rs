use super::{
    DEBUG_RECORD_DIR, Event, EventLogger, FileEventLogger, NullEventLogger, debug_record_path,
    effect_event, mode_change_event, msg_event,
};
use crate::application::palette::{Effect, Mode, Msg};
use crate::domain::SessionSpec;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn unique_path(label: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!(
        "rivet-event-log-{label}-{}-{timestamp}",
        std::process::id()
    ))
}

#[test]
fn file_event_logger_appends_ndjson() {
    let path = unique_path("writer").with_extension("jsonl");
    let logger = FileEventLogger::open(&path).expect("event log file should open");
    logger.log(mode_change_event(Mode::Browsing, Mode::Worktree));
    logger.log(Event::new("exit", "open_session").with_data("tool", Value::from("amp")));

    let raw = fs::read_to_string(&path).expect("event log should be readable");
    let lines: Vec<Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("event line should be valid json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], Value::from("mode_change"));
    assert_eq!(lines[0]["kind"], Value::from("mode_changed"));
    assert_eq!(lines[0]["data"]["from"], Value::from("browsing"));
    assert_eq!(lines[0]["data"]["to"], Value::from("worktree"));
    assert_eq!(lines[1]["data"]["tool"], Value::from("amp"));
    assert!(lines[1]["ts"].as_u64().is_some());

    let _ = fs::remove_file(path);
}

#[test]
fn msg_events_summarize_payloads() {
    let event = msg_event(&Msg::ScanCompleted {
        result: Ok(vec![crate::domain::DirEntry::new(PathBuf::from("/root/demo"))]),
    });
    assert_eq!(event.event, "msg");
    assert_eq!(event.kind, "scan_completed");
    assert_eq!(event.data["count"], Value::from(1));

    let failed = msg_event(&Msg::ToolPrewarmFailed {
        dir_path: PathBuf::from("/root/demo/main"),
        tool: "amp".to_string(),
        error: "boom".to_string(),
    });
    assert_eq!(failed.data["dir"], Value::from("/root/demo/main"));
    assert_eq!(failed.data["tool"], Value::from("amp"));
    assert_eq!(failed.data["error"], Value::from("boom"));

    let deleted = msg_event(&Msg::WorktreeDeleted {
        result: Err("locked".to_string()),
    });
    assert_eq!(deleted.data["error"], Value::from("locked"));
}

#[test]
fn effect_events_carry_session_targets() {
    let event = effect_event(&Effect::OpenSession {
        spec: SessionSpec::new("/root/demo/main", "claude"),
    });
    assert_eq!(event.event, "effect");
    assert_eq!(event.kind, "open_session");
    assert_eq!(event.data["dir"], Value::from("/root/demo/main"));
    assert_eq!(event.data["tool"], Value::from("claude"));

    let quit = effect_event(&Effect::Quit);
    assert_eq!(quit.data, Value::Object(serde_json::Map::new()));
}

#[test]
fn debug_record_path_lives_under_dot_rivet() {
    let cwd = unique_path("debug-record");
    let path = debug_record_path(&cwd).expect("debug record dir should be created");
    assert_eq!(path.parent(), Some(cwd.join(DEBUG_RECORD_DIR).as_path()));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name");
    assert!(file_name.starts_with("debug-record-"));
    assert!(file_name.ends_with(&format!("-{}.jsonl", std::process::id())));

    let _ = fs::remove_dir_all(cwd);
}

#[test]
fn null_event_logger_is_noop() {
    let logger = NullEventLogger;
    logger.log(Event::new("test", "noop"));
}

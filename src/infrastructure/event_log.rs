use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

use crate::application::palette::{Effect, Mode, Msg};

pub const DEBUG_RECORD_DIR: &str = ".rivet";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub ts: u64,
    pub event: String,
    pub kind: String,
    pub data: Value,
}

impl Event {
    pub fn new(event: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            ts: now_millis(),
            event: event.into(),
            kind: kind.into(),
            data: Value::Object(Map::new()),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        if let Value::Object(data) = &mut self.data {
            data.insert(key.into(), value);
        }
        self
    }

    fn with_path(self, key: &str, path: &Path) -> Self {
        self.with_data(key, Value::from(path.to_string_lossy().to_string()))
    }

    pub fn to_json_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("ts".to_string(), Value::from(self.ts));
        object.insert("event".to_string(), Value::from(self.event.clone()));
        object.insert("kind".to_string(), Value::from(self.kind.clone()));
        object.insert("data".to_string(), self.data.clone());
        Value::Object(object)
    }
}

/// One record per reducer input. Completion errors and tool names are kept,
/// payload lists are reduced to their length.
pub fn msg_event(msg: &Msg) -> Event {
    let event = Event::new("msg", msg.kind());
    match msg {
        Msg::Key(name) => event.with_data("key", Value::from(name.clone())),
        Msg::ScanCompleted { result } => with_result(event, result, |dirs| {
            ("count", Value::from(dirs.len()))
        }),
        Msg::WorktreesLoaded { result } => with_result(event, result, |listing| {
            ("count", Value::from(listing.worktrees.len()))
        }),
        Msg::SessionsListed { result } => with_result(event, result, |sessions| {
            ("count", Value::from(sessions.len()))
        }),
        Msg::ProjectCreated { result } | Msg::WorktreeCreated { result } => {
            with_result(event, result, |path| {
                ("path", Value::from(path.to_string_lossy().to_string()))
            })
        }
        Msg::ProjectDeleted { result }
        | Msg::WorktreeDeleted { result }
        | Msg::SessionAttached { result } => with_result(event, result, |_| ("ok", Value::from(true))),
        Msg::QueryChanged { query }
        | Msg::WorktreeQueryChanged { query }
        | Msg::ToolQueryChanged { query }
        | Msg::SessionQueryChanged { query } => event.with_data("query", Value::from(query.clone())),
        Msg::ToolPrewarmStarted { dir_path, tool, .. }
        | Msg::ToolPrewarmExisting { dir_path, tool } => event
            .with_path("dir", dir_path)
            .with_data("tool", Value::from(tool.clone())),
        Msg::ToolDelayElapsed { tool } => event.with_data("tool", Value::from(tool.clone())),
        Msg::ToolPrewarmFailed {
            dir_path,
            tool,
            error,
        } => event
            .with_path("dir", dir_path)
            .with_data("tool", Value::from(tool.clone()))
            .with_data("error", Value::from(error.clone())),
    }
}

fn with_result<T>(
    event: Event,
    result: &Result<T, String>,
    describe: impl FnOnce(&T) -> (&'static str, Value),
) -> Event {
    match result {
        Ok(value) => {
            let (key, value) = describe(value);
            event.with_data(key, value)
        }
        Err(error) => event.with_data("error", Value::from(error.clone())),
    }
}

pub fn effect_event(effect: &Effect) -> Event {
    let event = Event::new("effect", effect.kind());
    match effect {
        Effect::ScanDirs { roots } => event.with_data("roots", Value::from(roots.len())),
        Effect::CreateProject { path }
        | Effect::DeleteProject { path }
        | Effect::LoadWorktrees { path } => event.with_path("path", path),
        Effect::CreateWorktree {
            project_path,
            branch,
        } => event
            .with_path("project", project_path)
            .with_data("branch", Value::from(branch.clone())),
        Effect::DeleteWorktree {
            project_path,
            worktree_path,
        } => event
            .with_path("project", project_path)
            .with_path("worktree", worktree_path),
        Effect::PrewarmAllTools { dir_path, tools } => event
            .with_path("dir", dir_path)
            .with_data("tools", Value::from(tools.clone())),
        Effect::CheckToolReady { spec } | Effect::OpenSession { spec } => event
            .with_path("dir", &spec.dir_path)
            .with_data("tool", Value::from(spec.tool.clone())),
        Effect::AttachSession { session } => {
            event.with_data("session", Value::from(session.name.clone()))
        }
        Effect::ListSessions | Effect::Quit => event,
    }
}

pub fn mode_change_event(from: Mode, to: Mode) -> Event {
    Event::new("mode_change", "mode_changed")
        .with_data("from", Value::from(from.name()))
        .with_data("to", Value::from(to.name()))
}

/// `<cwd>/.rivet/debug-record-<ts>-<pid>.jsonl`, creating the directory.
pub fn debug_record_path(cwd: &Path) -> std::io::Result<PathBuf> {
    let dir = cwd.join(DEBUG_RECORD_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(format!(
        "debug-record-{}-{}.jsonl",
        now_millis(),
        std::process::id()
    )))
}

fn now_millis() -> u64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub trait EventLogger: Send + Sync {
    fn log(&self, event: Event);
}

pub struct NullEventLogger;

impl EventLogger for NullEventLogger {
    fn log(&self, _event: Event) {}
}

pub struct FileEventLogger {
    writer: Mutex<BufWriter<File>>,
}

impl FileEventLogger {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl EventLogger for FileEventLogger {
    fn log(&self, event: Event) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };

        let Ok(line) = serde_json::to_string(&event.to_json_value()) else {
            return;
        };

        if writer.write_all(line.as_bytes()).is_err() {
            return;
        }
        if writer.write_all(b"\n").is_err() {
            return;
        }
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests;

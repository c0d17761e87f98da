use std::path::PathBuf;
use std::time::Instant;

use crate::domain::{DirEntry, SessionInfo, SessionSpec, WorktreeListing};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Key(String),
    ScanCompleted {
        result: Result<Vec<DirEntry>, String>,
    },
    QueryChanged {
        query: String,
    },
    ProjectCreated {
        result: Result<PathBuf, String>,
    },
    ProjectDeleted {
        result: Result<(), String>,
    },
    WorktreesLoaded {
        result: Result<WorktreeListing, String>,
    },
    WorktreeQueryChanged {
        query: String,
    },
    WorktreeCreated {
        result: Result<PathBuf, String>,
    },
    WorktreeDeleted {
        result: Result<(), String>,
    },
    ToolQueryChanged {
        query: String,
    },
    ToolPrewarmStarted {
        dir_path: PathBuf,
        tool: String,
        started_at: Instant,
    },
    ToolPrewarmExisting {
        dir_path: PathBuf,
        tool: String,
    },
    ToolPrewarmFailed {
        dir_path: PathBuf,
        tool: String,
        error: String,
    },
    ToolDelayElapsed {
        tool: String,
    },
    SessionsListed {
        result: Result<Vec<SessionInfo>, String>,
    },
    SessionQueryChanged {
        query: String,
    },
    SessionAttached {
        result: Result<(), String>,
    },
}

impl Msg {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::ScanCompleted { .. } => "scan_completed",
            Self::QueryChanged { .. } => "query_changed",
            Self::ProjectCreated { .. } => "project_created",
            Self::ProjectDeleted { .. } => "project_deleted",
            Self::WorktreesLoaded { .. } => "worktrees_loaded",
            Self::WorktreeQueryChanged { .. } => "worktree_query_changed",
            Self::WorktreeCreated { .. } => "worktree_created",
            Self::WorktreeDeleted { .. } => "worktree_deleted",
            Self::ToolQueryChanged { .. } => "tool_query_changed",
            Self::ToolPrewarmStarted { .. } => "tool_prewarm_started",
            Self::ToolPrewarmExisting { .. } => "tool_prewarm_existing",
            Self::ToolPrewarmFailed { .. } => "tool_prewarm_failed",
            Self::ToolDelayElapsed { .. } => "tool_delay_elapsed",
            Self::SessionsListed { .. } => "sessions_listed",
            Self::SessionQueryChanged { .. } => "session_query_changed",
            Self::SessionAttached { .. } => "session_attached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScanDirs {
        roots: Vec<PathBuf>,
    },
    CreateProject {
        path: PathBuf,
    },
    DeleteProject {
        path: PathBuf,
    },
    LoadWorktrees {
        path: PathBuf,
    },
    CreateWorktree {
        project_path: PathBuf,
        branch: String,
    },
    DeleteWorktree {
        project_path: PathBuf,
        worktree_path: PathBuf,
    },
    PrewarmAllTools {
        dir_path: PathBuf,
        tools: Vec<String>,
    },
    CheckToolReady {
        spec: SessionSpec,
    },
    OpenSession {
        spec: SessionSpec,
    },
    AttachSession {
        session: SessionInfo,
    },
    ListSessions,
    Quit,
}

impl Effect {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ScanDirs { .. } => "scan_dirs",
            Self::CreateProject { .. } => "create_project",
            Self::DeleteProject { .. } => "delete_project",
            Self::LoadWorktrees { .. } => "load_worktrees",
            Self::CreateWorktree { .. } => "create_worktree",
            Self::DeleteWorktree { .. } => "delete_worktree",
            Self::PrewarmAllTools { .. } => "prewarm_all_tools",
            Self::CheckToolReady { .. } => "check_tool_ready",
            Self::OpenSession { .. } => "open_session",
            Self::AttachSession { .. } => "attach_session",
            Self::ListSessions => "list_sessions",
            Self::Quit => "quit",
        }
    }
}

/// Canonical key actions. Several raw key names share one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Home,
    End,
    Enter,
    Cancel,
    Quit,
    Delete,
    Sessions,
    CycleTheme,
}

impl KeyAction {
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "up" | "ctrl+k" | "ctrl+p" => Some(Self::Up),
            "down" | "ctrl+j" | "ctrl+n" => Some(Self::Down),
            "home" => Some(Self::Home),
            "end" => Some(Self::End),
            "enter" => Some(Self::Enter),
            "esc" => Some(Self::Cancel),
            "ctrl+c" => Some(Self::Quit),
            "ctrl+d" => Some(Self::Delete),
            "ctrl+s" => Some(Self::Sessions),
            "ctrl+t" => Some(Self::CycleTheme),
            _ => None,
        }
    }
}

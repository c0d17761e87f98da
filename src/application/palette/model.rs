use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use crate::application::filter::{filter_dirs, filter_sessions, filter_tools, filter_worktrees};
use crate::domain::{
    DirEntry, SessionInfo, SessionSpec, Worktree, branch_name, sanitize_worktree_name,
    tool_needs_warmup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Loading,
    Browsing,
    Worktree,
    WorktreeDeleteConfirm,
    ProjectDeleteConfirm,
    Tool,
    ToolStarting,
    Sessions,
    Error,
}

impl Mode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Browsing => "browsing",
            Self::Worktree => "worktree",
            Self::WorktreeDeleteConfirm => "worktree_delete_confirm",
            Self::ProjectDeleteConfirm => "project_delete_confirm",
            Self::Tool => "tool",
            Self::ToolStarting => "tool_starting",
            Self::Sessions => "sessions",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Mocha,
    Gruvbox,
}

impl Theme {
    pub const ALL: [Self; 2] = [Self::Mocha, Self::Gruvbox];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Mocha => "mocha",
            Self::Gruvbox => "gruvbox",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.label().eq_ignore_ascii_case(value.trim()))
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Mocha => Self::Gruvbox,
            Self::Gruvbox => Self::Mocha,
        }
    }
}

/// When a tool's workspace window came up. `Existing` means it was already
/// running before this prewarm round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmStart {
    Existing,
    StartedAt(Instant),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub mode: Mode,
    pub roots: Vec<PathBuf>,
    pub home: Option<PathBuf>,
    pub tools: Vec<String>,
    pub error: Option<String>,
    pub theme: Theme,

    pub query: String,
    pub dirs: Vec<DirEntry>,
    pub filtered: Vec<DirEntry>,
    pub selected_idx: usize,
    pub selected_project: Option<PathBuf>,
    pub project_warning: Option<String>,
    pub delete_project_target: Option<PathBuf>,

    pub worktree_query: String,
    pub worktrees: Vec<Worktree>,
    pub filtered_worktrees: Vec<Worktree>,
    pub worktree_idx: usize,
    pub selected_worktree_path: Option<PathBuf>,
    pub delete_worktree_target: Option<PathBuf>,

    pub tool_query: String,
    pub filtered_tools: Vec<String>,
    pub tool_idx: usize,
    pub tool_error: Option<String>,
    pub pending_spec: Option<SessionSpec>,
    pub tool_warm_start: HashMap<String, WarmStart>,
    pub tool_errors: HashMap<String, String>,
    pub tool_warmup_total: usize,
    pub tool_warmup_completed: usize,
    pub tool_warmup_failed: usize,

    pub session_query: String,
    pub sessions: Vec<SessionInfo>,
    pub filtered_sessions: Vec<SessionInfo>,
    pub session_idx: usize,
    pub session_return_mode: Mode,
    pub session_error: Option<String>,
}

impl Model {
    pub fn new(roots: Vec<PathBuf>, tools: Vec<String>) -> Self {
        let filtered_tools = tools.clone();
        Self {
            roots,
            tools,
            filtered_tools,
            session_return_mode: Mode::Browsing,
            ..Self::default()
        }
    }

    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn refilter_projects(&mut self) {
        self.filtered = filter_dirs(&self.dirs, &self.query);
    }

    pub fn refilter_worktrees(&mut self) {
        self.filtered_worktrees = filter_worktrees(&self.worktrees, &self.worktree_query);
    }

    pub fn refilter_tools(&mut self) {
        self.filtered_tools = filter_tools(&self.tools, &self.tool_query);
    }

    pub fn refilter_sessions(&mut self) {
        self.filtered_sessions = filter_sessions(&self.sessions, &self.session_query);
    }

    pub fn selected_dir(&self) -> Option<&DirEntry> {
        self.filtered.get(self.selected_idx)
    }

    pub fn selected_worktree(&self) -> Option<&Worktree> {
        self.filtered_worktrees.get(self.worktree_idx)
    }

    pub fn selected_tool(&self) -> Option<&String> {
        self.filtered_tools.get(self.tool_idx)
    }

    pub fn selected_session(&self) -> Option<&SessionInfo> {
        self.filtered_sessions.get(self.session_idx)
    }

    /// The path a new project would get from the current query, if the
    /// query names a path no listed project already has.
    pub fn create_project_path(&self) -> Option<PathBuf> {
        let query = self.query.trim();
        if !looks_like_path(query) {
            return None;
        }

        let candidate = self.expand_project_path(query)?;
        if self.filtered.iter().any(|entry| entry.path == candidate) {
            return None;
        }
        Some(candidate)
    }

    fn expand_project_path(&self, query: &str) -> Option<PathBuf> {
        let expanded = if query == "~" {
            self.home.clone()?
        } else if let Some(rest) = query.strip_prefix("~/") {
            self.home.as_ref()?.join(rest)
        } else {
            let path = PathBuf::from(query);
            if path.is_absolute() {
                path
            } else {
                self.roots.first()?.join(path)
            }
        };
        Some(clean_path(&expanded))
    }

    /// The sanitized worktree query, if no worktree already uses it as a
    /// name or branch.
    pub fn create_worktree_name(&self) -> Option<String> {
        let name = sanitize_worktree_name(self.worktree_query.trim());
        if name.is_empty() {
            return None;
        }

        let taken = self.worktrees.iter().any(|worktree| {
            sanitize_worktree_name(&worktree.name) == name
                || sanitize_worktree_name(&worktree.branch) == name
        });
        (!taken).then_some(name)
    }

    /// The branch a created worktree would check out. Slashes survive; only
    /// the directory name is sanitized.
    pub fn create_worktree_branch(&self) -> Option<String> {
        self.create_worktree_name()
            .map(|_| branch_name(&self.worktree_query))
    }

    pub fn project_creation_slot(&self) -> usize {
        usize::from(self.create_project_path().is_some())
    }

    pub fn worktree_creation_slot(&self) -> usize {
        usize::from(self.create_worktree_name().is_some())
    }

    pub fn project_row_count(&self) -> usize {
        self.filtered.len() + self.project_creation_slot()
    }

    pub fn worktree_row_count(&self) -> usize {
        self.filtered_worktrees.len() + self.worktree_creation_slot()
    }

    pub fn creation_slot_focused(&self) -> bool {
        self.selected_idx == self.filtered.len() && self.project_creation_slot() == 1
    }

    pub fn worktree_creation_slot_focused(&self) -> bool {
        self.worktree_idx == self.filtered_worktrees.len() && self.worktree_creation_slot() == 1
    }

    pub fn warmup_tool_count(&self) -> usize {
        self.tools
            .iter()
            .filter(|tool| tool_needs_warmup(tool))
            .count()
    }

    pub fn tool_prewarm_reported(&self, tool: &str) -> bool {
        self.tool_warm_start.contains_key(tool) || self.tool_errors.contains_key(tool)
    }

    pub fn pending_tool_is(&self, tool: &str) -> bool {
        self.mode == Mode::ToolStarting
            && self
                .pending_spec
                .as_ref()
                .is_some_and(|spec| spec.tool == tool)
    }

    pub fn current_query(&self) -> Option<&str> {
        match self.mode {
            Mode::Browsing => Some(&self.query),
            Mode::Worktree => Some(&self.worktree_query),
            Mode::Tool => Some(&self.tool_query),
            Mode::Sessions => Some(&self.session_query),
            _ => None,
        }
    }
}

pub fn looks_like_path(value: &str) -> bool {
    value.starts_with('/')
        || value.starts_with("./")
        || value.starts_with("../")
        || value == "~"
        || value.starts_with("~/")
        || value.contains(std::path::MAIN_SEPARATOR)
}

/// Lexical cleanup: drops `.` and resolves `..` without touching the disk.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }
    if cleaned.as_os_str().is_empty() {
        return PathBuf::from(".");
    }
    cleaned
}

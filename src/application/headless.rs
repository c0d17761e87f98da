use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::application::filesystem::WorkspaceFilesystem;
use crate::application::palette::{clean_path, looks_like_path};
use crate::application::sessions::SessionManager;
use crate::domain::{SessionSpec, is_supported_tool, sanitize_worktree_name, supported_tools};
use crate::infrastructure::event_log::{Event, EventLogger};

pub const USAGE: &str =
    "usage: rv --project <name|path> --worktree <name> --tool <tool> [--create] [--detach] [--event-log <path>]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadlessRequest {
    pub project: String,
    pub worktree: String,
    pub tool: String,
    pub create: bool,
    pub detach: bool,
    pub event_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessError {
    MissingFlag(&'static str),
    MissingValue(String),
    UnknownArgument(String),
    UnsupportedTool(String),
    NoRoots,
    ProjectNotFound(String),
    WorktreeNotFound { project: PathBuf, worktree: String },
    Filesystem(String),
    Session(String),
}

impl HeadlessError {
    pub fn message(&self) -> String {
        match self {
            Self::MissingFlag(flag) => format!("missing required flag {flag}\n{USAGE}"),
            Self::MissingValue(flag) => format!("{flag} requires a value\n{USAGE}"),
            Self::UnknownArgument(argument) => format!("unknown argument: {argument}\n{USAGE}"),
            Self::UnsupportedTool(tool) => format!(
                "unsupported tool: {tool} (expected one of: {})",
                supported_tools().join(", ")
            ),
            Self::NoRoots => "no project roots configured".to_string(),
            Self::ProjectNotFound(project) => {
                format!("project not found: {project} (pass --create to create it)")
            }
            Self::WorktreeNotFound { project, worktree } => format!(
                "worktree not found: {worktree} in {} (pass --create to create it)",
                project.display()
            ),
            Self::Filesystem(error) | Self::Session(error) => error.clone(),
        }
    }
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<HeadlessRequest, HeadlessError> {
    let mut project = None;
    let mut worktree = None;
    let mut tool = None;
    let mut request = HeadlessRequest::default();
    let mut args = args.into_iter();

    while let Some(argument) = args.next() {
        match argument.as_str() {
            "--project" => project = Some(flag_value(&mut args, &argument)?),
            "--worktree" => worktree = Some(flag_value(&mut args, &argument)?),
            "--tool" => tool = Some(flag_value(&mut args, &argument)?),
            "--event-log" => {
                request.event_log_path = Some(PathBuf::from(flag_value(&mut args, &argument)?));
            }
            "--create" => request.create = true,
            "--detach" => request.detach = true,
            _ => return Err(HeadlessError::UnknownArgument(argument)),
        }
    }

    request.project = project.ok_or(HeadlessError::MissingFlag("--project"))?;
    request.worktree = worktree.ok_or(HeadlessError::MissingFlag("--worktree"))?;
    request.tool = tool.ok_or(HeadlessError::MissingFlag("--tool"))?;
    Ok(request)
}

fn flag_value(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<String, HeadlessError> {
    match args.next() {
        Some(value) if !value.trim().is_empty() && !value.starts_with("--") => Ok(value),
        _ => Err(HeadlessError::MissingValue(flag.to_string())),
    }
}

/// Where relative and `~` project arguments resolve from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessContext {
    pub roots: Vec<PathBuf>,
    pub home: Option<PathBuf>,
    pub cwd: PathBuf,
    pub max_depth: usize,
}

impl HeadlessContext {
    fn expand(&self, value: &str) -> PathBuf {
        let expanded = if value == "~" {
            self.home.clone().unwrap_or_else(|| PathBuf::from(value))
        } else if let Some(rest) = value.strip_prefix("~/") {
            match self.home.as_ref() {
                Some(home) => home.join(rest),
                None => PathBuf::from(value),
            }
        } else {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                self.cwd.join(path)
            }
        };
        clean_path(&expanded)
    }
}

pub struct Resolver<'a> {
    pub context: &'a HeadlessContext,
    pub filesystem: &'a dyn WorkspaceFilesystem,
    pub logger: &'a dyn EventLogger,
}

impl Resolver<'_> {
    pub fn resolve_session_spec(
        &self,
        request: &HeadlessRequest,
    ) -> Result<SessionSpec, HeadlessError> {
        if !is_supported_tool(&request.tool) {
            return Err(HeadlessError::UnsupportedTool(request.tool.clone()));
        }

        let project = self.resolve_project(request)?;
        let worktree = self.resolve_worktree(&project, request)?;
        Ok(SessionSpec::new(worktree, request.tool.clone()).detached(request.detach))
    }

    fn resolve_project(&self, request: &HeadlessRequest) -> Result<PathBuf, HeadlessError> {
        let argument = request.project.trim();
        let candidate = if looks_like_path(argument) {
            let path = self.context.expand(argument);
            if path.exists() {
                self.log_step("project_path", &path);
                return Ok(path);
            }
            path
        } else {
            let scanned = self
                .filesystem
                .scan_dirs(&self.context.roots, self.context.max_depth)
                .map_err(|error| HeadlessError::Filesystem(error.message()))?;
            if let Some(entry) = scanned.into_iter().find(|entry| entry.name == argument) {
                self.log_step("project_found", &entry.path);
                return Ok(entry.path);
            }
            let root = self.context.roots.first().ok_or(HeadlessError::NoRoots)?;
            root.join(argument)
        };

        if !request.create {
            return Err(HeadlessError::ProjectNotFound(argument.to_string()));
        }
        let created = self
            .filesystem
            .create_project(&candidate)
            .map_err(|error| HeadlessError::Filesystem(error.message()))?;
        self.log_step("project_created", &created);
        Ok(created)
    }

    fn resolve_worktree(
        &self,
        project: &Path,
        request: &HeadlessRequest,
    ) -> Result<PathBuf, HeadlessError> {
        let argument = request.worktree.trim();
        let listing = self
            .filesystem
            .list_worktrees(project)
            .map_err(|error| HeadlessError::Filesystem(error.message()))?;
        let sanitized = sanitize_worktree_name(argument);
        let found = listing.worktrees.into_iter().find(|worktree| {
            worktree.name == argument
                || worktree.branch == argument
                || sanitize_worktree_name(&worktree.branch) == sanitized
        });
        if let Some(worktree) = found {
            self.log_step("worktree_found", &worktree.path);
            return Ok(worktree.path);
        }

        if !request.create {
            if let Some(warning) = listing.warning {
                return Err(HeadlessError::Filesystem(warning));
            }
            return Err(HeadlessError::WorktreeNotFound {
                project: project.to_path_buf(),
                worktree: argument.to_string(),
            });
        }
        let created = self
            .filesystem
            .create_worktree(project, argument)
            .map_err(|error| HeadlessError::Filesystem(error.message()))?;
        self.log_step("worktree_created", &created);
        Ok(created)
    }

    fn log_step(&self, kind: &str, path: &Path) {
        self.logger.log(
            Event::new("rv", kind).with_data("path", Value::from(path.to_string_lossy().to_string())),
        );
    }
}

/// Resolves and opens the session. After an attached open inside tmux the
/// previous client session is restored.
pub fn run(
    request: &HeadlessRequest,
    resolver: &Resolver<'_>,
    sessions: &dyn SessionManager,
) -> Result<SessionSpec, HeadlessError> {
    let spec = resolver.resolve_session_spec(request)?;
    resolver.logger.log(
        Event::new("rv", "open_session")
            .with_data("dir", Value::from(spec.dir_path.to_string_lossy().to_string()))
            .with_data("tool", Value::from(spec.tool.clone()))
            .with_data("detach", Value::from(spec.detach)),
    );
    sessions
        .open_session(&spec)
        .map_err(|error| HeadlessError::Session(error.message()))?;

    if !spec.detach && sessions.inside_multiplexer() {
        sessions
            .switch_to_last_client()
            .map_err(|error| HeadlessError::Session(error.message()))?;
        resolver.logger.log(Event::new("rv", "switched_to_last_client"));
    }
    Ok(spec)
}

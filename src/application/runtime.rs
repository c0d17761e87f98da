use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::filesystem::WorkspaceFilesystem;
use crate::application::palette::{Effect, Model, Msg, WarmStart};
use crate::application::sessions::SessionManager;
use crate::domain::{SessionInfo, SessionSpec, tool_needs_warmup};

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_millis(750);

/// Blocking unit of work that reports back with exactly one message.
pub type Task = Box<dyn FnOnce() -> Msg + Send + 'static>;

/// What the event loop should do with one effect.
pub enum Dispatch {
    Tasks(Vec<Task>),
    Quit,
    /// Leave the palette, then open this session on the real terminal.
    Open(SessionSpec),
    /// Leave the palette, then attach to this session on the real terminal.
    Attach(SessionInfo),
}

impl Dispatch {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tasks(_) => "tasks",
            Self::Quit => "quit",
            Self::Open(_) => "open",
            Self::Attach(_) => "attach",
        }
    }
}

#[derive(Clone)]
pub struct EffectRuntime {
    filesystem: Arc<dyn WorkspaceFilesystem>,
    sessions: Arc<dyn SessionManager>,
    max_depth: usize,
    warmup_delay: Duration,
}

impl EffectRuntime {
    pub fn new(
        filesystem: Arc<dyn WorkspaceFilesystem>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            filesystem,
            sessions,
            max_depth: DEFAULT_MAX_DEPTH,
            warmup_delay: DEFAULT_WARMUP_DELAY,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_warmup_delay(mut self, warmup_delay: Duration) -> Self {
        self.warmup_delay = warmup_delay;
        self
    }

    pub fn sessions(&self) -> Arc<dyn SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn plan(&self, effect: Effect, model: &Model) -> Dispatch {
        match effect {
            Effect::ScanDirs { roots } => {
                let filesystem = Arc::clone(&self.filesystem);
                let max_depth = self.max_depth;
                single(move || Msg::ScanCompleted {
                    result: filesystem
                        .scan_dirs(&roots, max_depth)
                        .map_err(|error| error.message()),
                })
            }
            Effect::CreateProject { path } => {
                let filesystem = Arc::clone(&self.filesystem);
                single(move || Msg::ProjectCreated {
                    result: filesystem
                        .create_project(&path)
                        .map_err(|error| error.message()),
                })
            }
            Effect::DeleteProject { path } => {
                let runtime = self.clone();
                let tools = model.tools.clone();
                single(move || Msg::ProjectDeleted {
                    result: runtime.delete_project(&path, &tools),
                })
            }
            Effect::LoadWorktrees { path } => {
                let filesystem = Arc::clone(&self.filesystem);
                single(move || Msg::WorktreesLoaded {
                    result: filesystem
                        .list_worktrees(&path)
                        .map_err(|error| error.message()),
                })
            }
            Effect::CreateWorktree {
                project_path,
                branch,
            } => {
                let filesystem = Arc::clone(&self.filesystem);
                single(move || Msg::WorktreeCreated {
                    result: filesystem
                        .create_worktree(&project_path, &branch)
                        .map_err(|error| error.message()),
                })
            }
            Effect::DeleteWorktree {
                project_path,
                worktree_path,
            } => {
                let runtime = self.clone();
                let tools = model.tools.clone();
                single(move || Msg::WorktreeDeleted {
                    result: runtime.delete_worktree(&project_path, &worktree_path, &tools),
                })
            }
            Effect::PrewarmAllTools { dir_path, tools } => {
                Dispatch::Tasks(self.prewarm_tasks(&dir_path, tools))
            }
            Effect::CheckToolReady { spec } => {
                Dispatch::Tasks(vec![self.readiness_task(spec, model)])
            }
            Effect::OpenSession { spec } => Dispatch::Open(spec),
            Effect::AttachSession { session } => {
                if !self.sessions.inside_multiplexer() {
                    return Dispatch::Attach(session);
                }
                let sessions = Arc::clone(&self.sessions);
                single(move || Msg::SessionAttached {
                    result: sessions
                        .attach_session(&session.name)
                        .map_err(|error| error.message()),
                })
            }
            Effect::ListSessions => {
                let sessions = Arc::clone(&self.sessions);
                single(move || Msg::SessionsListed {
                    result: sessions.list_sessions().map_err(|error| error.message()),
                })
            }
            Effect::Quit => Dispatch::Quit,
        }
    }

    fn prewarm_tasks(&self, dir_path: &Path, tools: Vec<String>) -> Vec<Task> {
        tools
            .into_iter()
            .filter(|tool| tool_needs_warmup(tool))
            .map(|tool| {
                let sessions = Arc::clone(&self.sessions);
                let spec = SessionSpec::new(dir_path.to_path_buf(), tool.clone()).detached(true);
                Box::new(move || match sessions.prewarm_session(&spec) {
                    Ok(true) => Msg::ToolPrewarmStarted {
                        dir_path: spec.dir_path,
                        tool,
                        started_at: Instant::now(),
                    },
                    Ok(false) => Msg::ToolPrewarmExisting {
                        dir_path: spec.dir_path,
                        tool,
                    },
                    Err(error) => Msg::ToolPrewarmFailed {
                        dir_path: spec.dir_path,
                        tool,
                        error: error.message(),
                    },
                }) as Task
            })
            .collect()
    }

    fn readiness_task(&self, spec: SessionSpec, model: &Model) -> Task {
        let SessionSpec { dir_path, tool, .. } = spec;
        let cached_error = model.tool_errors.get(&tool).cloned();
        let ready_at = match model.tool_warm_start.get(&tool) {
            Some(WarmStart::Existing) => None,
            Some(WarmStart::StartedAt(started_at)) => Some(*started_at + self.warmup_delay),
            None => Some(Instant::now() + self.warmup_delay),
        };

        Box::new(move || {
            if let Some(error) = cached_error {
                return Msg::ToolPrewarmFailed {
                    dir_path,
                    tool,
                    error,
                };
            }
            if let Some(ready_at) = ready_at {
                let remaining = ready_at.saturating_duration_since(Instant::now());
                if !remaining.is_zero() {
                    std::thread::sleep(remaining);
                }
            }
            Msg::ToolDelayElapsed { tool }
        })
    }

    fn kill_tool_sessions(&self, worktree_path: &Path, tools: &[String]) -> Result<(), String> {
        for tool in tools {
            let spec = SessionSpec::new(worktree_path.to_path_buf(), tool.clone());
            self.sessions
                .kill_session(&spec)
                .map_err(|error| error.message())?;
        }
        Ok(())
    }

    /// Kills every tool session of every worktree, then removes the project.
    /// Nothing is deleted when a kill fails.
    pub fn delete_project(&self, path: &Path, tools: &[String]) -> Result<(), String> {
        let worktrees: Vec<PathBuf> = self
            .filesystem
            .list_worktree_paths(path)
            .map_err(|error| error.message())?;
        for worktree in &worktrees {
            self.kill_tool_sessions(worktree, tools)?;
        }
        self.filesystem
            .delete_project(path)
            .map_err(|error| error.message())
    }

    pub fn delete_worktree(
        &self,
        project_path: &Path,
        worktree_path: &Path,
        tools: &[String],
    ) -> Result<(), String> {
        self.kill_tool_sessions(worktree_path, tools)?;
        self.filesystem
            .delete_worktree(project_path, worktree_path)
            .map_err(|error| error.message())
    }
}

fn single(task: impl FnOnce() -> Msg + Send + 'static) -> Dispatch {
    Dispatch::Tasks(vec![Box::new(task)])
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::keys::handle_mode_key;
use super::model::{Mode, Model, WarmStart};
use super::msg::{Effect, Msg};
use crate::domain::{SessionSpec, tool_needs_warmup};

pub fn init(mut model: Model) -> (Model, Vec<Effect>) {
    model.mode = Mode::Loading;
    let roots = model.roots.clone();
    (model, vec![Effect::ScanDirs { roots }])
}

/// Folds one message into the model. Never blocks and never fails; unknown
/// or stale messages leave the model as it was.
pub fn update(model: Model, msg: Msg) -> (Model, Vec<Effect>) {
    let mut model = model;
    let effects = match msg {
        Msg::Key(name) => {
            let outcome = handle_key(model, &name);
            model = outcome.model;
            outcome.effects
        }
        Msg::ScanCompleted { result } => {
            match result {
                Ok(dirs) => {
                    model.mode = Mode::Browsing;
                    model.error = None;
                    model.pending_spec = None;
                    model.dirs = dirs;
                    model.refilter_projects();
                    model.selected_idx = 0;
                }
                Err(error) => enter_error(&mut model, error),
            }
            Vec::new()
        }
        Msg::QueryChanged { query } => {
            model.query = query;
            model.refilter_projects();
            model.selected_idx = 0;
            Vec::new()
        }
        Msg::ProjectCreated { result } => match result {
            Ok(path) => open_project(&mut model, path),
            Err(error) => {
                enter_error(&mut model, error);
                Vec::new()
            }
        },
        Msg::ProjectDeleted { result } => match result {
            Ok(()) => {
                model.mode = Mode::Browsing;
                model.delete_project_target = None;
                model.pending_spec = None;
                vec![Effect::ScanDirs {
                    roots: model.roots.clone(),
                }]
            }
            Err(error) => {
                model.delete_project_target = None;
                enter_error(&mut model, error);
                Vec::new()
            }
        },
        Msg::WorktreesLoaded { result } => {
            match result {
                Ok(listing) => {
                    model.project_warning = listing.warning;
                    model.worktrees = listing.worktrees;
                    model.refilter_worktrees();
                    model.worktree_idx = 0;
                }
                Err(error) => enter_error(&mut model, error),
            }
            Vec::new()
        }
        Msg::WorktreeQueryChanged { query } => {
            model.worktree_query = query;
            model.refilter_worktrees();
            model.worktree_idx = 0;
            Vec::new()
        }
        Msg::WorktreeCreated { result } => match result {
            Ok(path) => {
                model.selected_worktree_path = Some(path);
                enter_tool_mode(&mut model)
            }
            Err(error) => {
                enter_error(&mut model, error);
                Vec::new()
            }
        },
        Msg::WorktreeDeleted { result } => match result {
            Ok(()) => {
                model.mode = Mode::Worktree;
                model.delete_worktree_target = None;
                model.pending_spec = None;
                model
                    .selected_project
                    .clone()
                    .map(|path| vec![Effect::LoadWorktrees { path }])
                    .unwrap_or_default()
            }
            Err(error) => {
                model.delete_worktree_target = None;
                enter_error(&mut model, error);
                Vec::new()
            }
        },
        Msg::ToolQueryChanged { query } => {
            model.tool_query = query;
            model.refilter_tools();
            model.tool_idx = 0;
            model.tool_error = None;
            Vec::new()
        }
        Msg::ToolPrewarmStarted {
            dir_path,
            tool,
            started_at,
        } => {
            if !prewarm_is_current(&model, &dir_path) {
                return (model, Vec::new());
            }
            if counts_toward_warmup(&model, &tool) {
                model.tool_warmup_completed += 1;
                model
                    .tool_warm_start
                    .insert(tool, WarmStart::StartedAt(started_at));
            }
            Vec::new()
        }
        Msg::ToolPrewarmExisting { dir_path, tool } => {
            if !prewarm_is_current(&model, &dir_path) {
                return (model, Vec::new());
            }
            if counts_toward_warmup(&model, &tool) {
                model.tool_warmup_completed += 1;
            }
            model.tool_warm_start.insert(tool.clone(), WarmStart::Existing);
            model.tool_errors.remove(&tool);

            if model.pending_tool_is(&tool) {
                open_pending(&mut model)
            } else {
                Vec::new()
            }
        }
        Msg::ToolPrewarmFailed {
            dir_path,
            tool,
            error,
        } => {
            if !prewarm_is_current(&model, &dir_path) {
                return (model, Vec::new());
            }
            if counts_toward_warmup(&model, &tool) {
                model.tool_warmup_completed += 1;
                model.tool_warmup_failed += 1;
            }
            model.tool_errors.insert(tool.clone(), error.clone());

            if model.pending_tool_is(&tool) {
                model.tool_error = Some(error);
                model.pending_spec = None;
                model.mode = Mode::Tool;
            }
            Vec::new()
        }
        Msg::ToolDelayElapsed { tool } => {
            if model.pending_tool_is(&tool) {
                open_pending(&mut model)
            } else {
                Vec::new()
            }
        }
        Msg::SessionsListed { result } => {
            match result {
                Ok(sessions) => {
                    model.sessions = sessions;
                    model.session_error = None;
                }
                Err(error) => {
                    model.sessions = Vec::new();
                    model.session_error = Some(error);
                }
            }
            model.refilter_sessions();
            model.session_idx = 0;
            Vec::new()
        }
        Msg::SessionQueryChanged { query } => {
            model.session_query = query;
            model.refilter_sessions();
            model.session_idx = 0;
            Vec::new()
        }
        Msg::SessionAttached { result } => {
            match result {
                Ok(()) if model.mode == Mode::Sessions => leave_sessions(&mut model),
                Ok(()) => {}
                Err(error) => model.session_error = Some(error),
            }
            Vec::new()
        }
    };

    (model, effects)
}

/// Result of routing one key. `handled == false` means the caller should
/// hand the key to the query input instead.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyOutcome {
    pub model: Model,
    pub effects: Vec<Effect>,
    pub handled: bool,
}

pub fn handle_key(model: Model, key_name: &str) -> KeyOutcome {
    handle_mode_key(model, key_name)
}

/// The query-change message for the list the current mode edits.
pub fn query_changed(mode: Mode, query: String) -> Option<Msg> {
    match mode {
        Mode::Browsing => Some(Msg::QueryChanged { query }),
        Mode::Worktree => Some(Msg::WorktreeQueryChanged { query }),
        Mode::Tool => Some(Msg::ToolQueryChanged { query }),
        Mode::Sessions => Some(Msg::SessionQueryChanged { query }),
        _ => None,
    }
}

fn enter_error(model: &mut Model, error: String) {
    model.error = Some(error);
    model.mode = Mode::Error;
    model.pending_spec = None;
}

/// Prewarm reports belong to the worktree they were started for; reports for
/// a worktree the user has since left are dropped.
fn prewarm_is_current(model: &Model, dir_path: &Path) -> bool {
    model.selected_worktree_path.as_deref() == Some(dir_path)
}

fn counts_toward_warmup(model: &Model, tool: &str) -> bool {
    tool_needs_warmup(tool)
        && model.tools.iter().any(|known| known == tool)
        && !model.tool_prewarm_reported(tool)
        && model.tool_warmup_completed < model.tool_warmup_total
}

fn open_pending(model: &mut Model) -> Vec<Effect> {
    let Some(spec) = model.pending_spec.take() else {
        return Vec::new();
    };
    model.mode = Mode::Tool;
    model.tool_error = None;
    vec![Effect::OpenSession { spec }]
}

pub(super) fn open_project(model: &mut Model, path: PathBuf) -> Vec<Effect> {
    model.selected_project = Some(path.clone());
    model.mode = Mode::Worktree;
    model.pending_spec = None;
    model.worktree_query.clear();
    model.worktree_idx = 0;
    model.project_warning = None;
    model.worktrees.clear();
    model.filtered_worktrees.clear();
    vec![Effect::LoadWorktrees { path }]
}

pub(super) fn enter_tool_mode(model: &mut Model) -> Vec<Effect> {
    let Some(dir_path) = model.selected_worktree_path.clone() else {
        return Vec::new();
    };

    model.mode = Mode::Tool;
    model.tool_query.clear();
    model.refilter_tools();
    model.tool_idx = 0;
    model.tool_error = None;
    model.pending_spec = None;
    model.tool_warm_start = HashMap::with_capacity(model.tools.len());
    model.tool_errors = HashMap::with_capacity(model.tools.len());
    model.tool_warmup_total = model.warmup_tool_count();
    model.tool_warmup_completed = 0;
    model.tool_warmup_failed = 0;

    vec![Effect::PrewarmAllTools {
        dir_path,
        tools: model.tools.clone(),
    }]
}

pub(super) fn start_tool(model: &mut Model, tool: String) -> Vec<Effect> {
    if let Some(error) = model.tool_errors.get(&tool) {
        model.tool_error = Some(error.clone());
        return Vec::new();
    }
    let Some(dir_path) = model.selected_worktree_path.clone() else {
        return Vec::new();
    };

    let spec = SessionSpec::new(dir_path, tool.clone());
    if !tool_needs_warmup(&tool)
        || matches!(model.tool_warm_start.get(&tool), Some(WarmStart::Existing))
    {
        return vec![Effect::OpenSession { spec }];
    }

    model.tool_error = None;
    model.pending_spec = Some(spec.clone());
    model.mode = Mode::ToolStarting;
    vec![Effect::CheckToolReady { spec }]
}

pub(super) fn leave_sessions(model: &mut Model) {
    model.mode = model.session_return_mode;
    model.session_query.clear();
    model.sessions.clear();
    model.filtered_sessions.clear();
    model.session_idx = 0;
    model.session_error = None;
}

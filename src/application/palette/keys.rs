use super::model::{Mode, Model};
use super::msg::{Effect, KeyAction};
use super::update::{KeyOutcome, enter_tool_mode, leave_sessions, open_project, start_tool};

pub(super) fn handle_mode_key(model: Model, key_name: &str) -> KeyOutcome {
    let action = KeyAction::from_key_name(key_name);
    let mut model = model;
    let (effects, handled) = match model.mode {
        Mode::Loading => loading_key(action),
        Mode::Browsing => browsing_key(&mut model, action),
        Mode::Worktree => worktree_key(&mut model, action),
        Mode::WorktreeDeleteConfirm => worktree_delete_key(&mut model, action),
        Mode::ProjectDeleteConfirm => project_delete_key(&mut model, action),
        Mode::Tool => tool_key(&mut model, action),
        Mode::ToolStarting => tool_starting_key(&mut model, action),
        Mode::Sessions => sessions_key(&mut model, action),
        Mode::Error => error_key(action),
    };

    KeyOutcome {
        model,
        effects,
        handled,
    }
}

type Handled = (Vec<Effect>, bool);

fn consumed(effects: Vec<Effect>) -> Handled {
    (effects, true)
}

fn unhandled() -> Handled {
    (Vec::new(), false)
}

fn quit() -> Handled {
    consumed(vec![Effect::Quit])
}

fn move_index(index: &mut usize, rows: usize, action: KeyAction) {
    let last = rows.saturating_sub(1);
    *index = match action {
        KeyAction::Up => index.saturating_sub(1),
        KeyAction::Down => (*index + 1).min(last),
        KeyAction::Home => 0,
        KeyAction::End => last,
        _ => *index,
    };
}

fn is_movement(action: KeyAction) -> bool {
    matches!(
        action,
        KeyAction::Up | KeyAction::Down | KeyAction::Home | KeyAction::End
    )
}

fn open_sessions(model: &mut Model) -> Handled {
    model.session_return_mode = model.mode;
    model.mode = Mode::Sessions;
    model.session_query.clear();
    model.sessions.clear();
    model.filtered_sessions.clear();
    model.session_idx = 0;
    model.session_error = None;
    consumed(vec![Effect::ListSessions])
}

fn cycle_theme(model: &mut Model) -> Handled {
    model.theme = model.theme.next();
    consumed(Vec::new())
}

fn loading_key(action: Option<KeyAction>) -> Handled {
    match action {
        Some(KeyAction::Cancel | KeyAction::Quit) => quit(),
        _ => consumed(Vec::new()),
    }
}

fn error_key(action: Option<KeyAction>) -> Handled {
    match action {
        Some(KeyAction::Cancel | KeyAction::Quit) => quit(),
        _ => consumed(Vec::new()),
    }
}

fn browsing_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    let Some(action) = action else {
        return unhandled();
    };

    match action {
        action if is_movement(action) => {
            let rows = model.project_row_count();
            move_index(&mut model.selected_idx, rows, action);
            consumed(Vec::new())
        }
        KeyAction::Enter => {
            if model.creation_slot_focused() {
                return match model.create_project_path() {
                    Some(path) => consumed(vec![Effect::CreateProject { path }]),
                    None => consumed(Vec::new()),
                };
            }
            match model.selected_dir().map(|entry| entry.path.clone()) {
                Some(path) => consumed(open_project(model, path)),
                None => consumed(Vec::new()),
            }
        }
        KeyAction::Delete => {
            if model.creation_slot_focused() {
                return consumed(Vec::new());
            }
            if let Some(path) = model.selected_dir().map(|entry| entry.path.clone()) {
                model.delete_project_target = Some(path);
                model.mode = Mode::ProjectDeleteConfirm;
            }
            consumed(Vec::new())
        }
        KeyAction::Sessions => open_sessions(model),
        KeyAction::CycleTheme => cycle_theme(model),
        KeyAction::Cancel | KeyAction::Quit => quit(),
        _ => unhandled(),
    }
}

fn worktree_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    let Some(action) = action else {
        return unhandled();
    };

    match action {
        action if is_movement(action) => {
            let rows = model.worktree_row_count();
            move_index(&mut model.worktree_idx, rows, action);
            consumed(Vec::new())
        }
        KeyAction::Enter => {
            if model.worktree_creation_slot_focused() {
                let (Some(project_path), Some(branch)) =
                    (model.selected_project.clone(), model.create_worktree_branch())
                else {
                    return consumed(Vec::new());
                };
                return consumed(vec![Effect::CreateWorktree {
                    project_path,
                    branch,
                }]);
            }
            match model.selected_worktree().map(|worktree| worktree.path.clone()) {
                Some(path) => {
                    model.selected_worktree_path = Some(path);
                    consumed(enter_tool_mode(model))
                }
                None => consumed(Vec::new()),
            }
        }
        KeyAction::Delete => {
            if model.worktree_creation_slot_focused() {
                return consumed(Vec::new());
            }
            if let Some(path) = model.selected_worktree().map(|worktree| worktree.path.clone()) {
                model.delete_worktree_target = Some(path);
                model.mode = Mode::WorktreeDeleteConfirm;
            }
            consumed(Vec::new())
        }
        KeyAction::Cancel => {
            model.mode = Mode::Browsing;
            model.selected_project = None;
            model.project_warning = None;
            model.worktree_query.clear();
            model.worktrees.clear();
            model.filtered_worktrees.clear();
            model.worktree_idx = 0;
            model.selected_worktree_path = None;
            consumed(Vec::new())
        }
        KeyAction::Sessions => open_sessions(model),
        KeyAction::CycleTheme => cycle_theme(model),
        KeyAction::Quit => quit(),
        _ => unhandled(),
    }
}

fn worktree_delete_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    match action {
        Some(KeyAction::Enter) => {
            let (Some(project_path), Some(worktree_path)) = (
                model.selected_project.clone(),
                model.delete_worktree_target.clone(),
            ) else {
                model.mode = Mode::Worktree;
                model.delete_worktree_target = None;
                return consumed(Vec::new());
            };
            consumed(vec![Effect::DeleteWorktree {
                project_path,
                worktree_path,
            }])
        }
        Some(KeyAction::Cancel) => {
            model.mode = Mode::Worktree;
            model.delete_worktree_target = None;
            consumed(Vec::new())
        }
        Some(KeyAction::Quit) => quit(),
        _ => consumed(Vec::new()),
    }
}

fn project_delete_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    match action {
        Some(KeyAction::Enter) => match model.delete_project_target.clone() {
            Some(path) => consumed(vec![Effect::DeleteProject { path }]),
            None => {
                model.mode = Mode::Browsing;
                consumed(Vec::new())
            }
        },
        Some(KeyAction::Cancel) => {
            model.mode = Mode::Browsing;
            model.delete_project_target = None;
            consumed(Vec::new())
        }
        Some(KeyAction::Quit) => quit(),
        _ => consumed(Vec::new()),
    }
}

fn tool_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    let Some(action) = action else {
        return unhandled();
    };

    match action {
        action if is_movement(action) => {
            let rows = model.filtered_tools.len();
            move_index(&mut model.tool_idx, rows, action);
            consumed(Vec::new())
        }
        KeyAction::Enter => match model.selected_tool().cloned() {
            Some(tool) => consumed(start_tool(model, tool)),
            None => consumed(Vec::new()),
        },
        KeyAction::Cancel => {
            model.mode = Mode::Worktree;
            model.selected_worktree_path = None;
            model.tool_query.clear();
            model.tool_idx = 0;
            model.tool_error = None;
            model.refilter_tools();
            let effects = model
                .selected_project
                .clone()
                .map(|path| vec![Effect::LoadWorktrees { path }])
                .unwrap_or_default();
            consumed(effects)
        }
        KeyAction::Sessions => open_sessions(model),
        KeyAction::CycleTheme => cycle_theme(model),
        KeyAction::Quit => quit(),
        _ => unhandled(),
    }
}

fn tool_starting_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    match action {
        Some(KeyAction::Cancel) => {
            model.pending_spec = None;
            model.tool_error = None;
            model.mode = Mode::Tool;
            consumed(Vec::new())
        }
        Some(KeyAction::Quit) => quit(),
        _ => consumed(Vec::new()),
    }
}

fn sessions_key(model: &mut Model, action: Option<KeyAction>) -> Handled {
    let Some(action) = action else {
        return unhandled();
    };

    match action {
        action if is_movement(action) => {
            let rows = model.filtered_sessions.len();
            move_index(&mut model.session_idx, rows, action);
            consumed(Vec::new())
        }
        KeyAction::Enter => match model.selected_session().cloned() {
            Some(session) => consumed(vec![Effect::AttachSession { session }]),
            None => consumed(Vec::new()),
        },
        KeyAction::Cancel => {
            leave_sessions(model);
            consumed(Vec::new())
        }
        KeyAction::CycleTheme => cycle_theme(model),
        KeyAction::Quit => quit(),
        _ => consumed(Vec::new()),
    }
}

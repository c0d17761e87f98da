use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const TOOL_NONE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub env: &'static [(&'static str, &'static str)],
}

const TOOL_REGISTRY: [ToolDefinition; 5] = [
    ToolDefinition {
        name: "opencode",
        env: &[("OPENCODE_CONFIG_CONTENT", r#"{"theme":"gruvbox"}"#)],
    },
    ToolDefinition {
        name: "claude",
        env: &[],
    },
    ToolDefinition {
        name: "amp",
        env: &[],
    },
    ToolDefinition {
        name: "codex",
        env: &[],
    },
    ToolDefinition {
        name: TOOL_NONE,
        env: &[],
    },
];

pub const fn tool_registry() -> &'static [ToolDefinition] {
    &TOOL_REGISTRY
}

/// Registry tool names in display order. Callers own the returned list.
pub fn supported_tools() -> Vec<String> {
    TOOL_REGISTRY
        .iter()
        .map(|definition| definition.name.to_string())
        .collect()
}

pub fn is_supported_tool(name: &str) -> bool {
    tool_definition(name).is_some()
}

pub fn tool_definition(name: &str) -> Option<&'static ToolDefinition> {
    TOOL_REGISTRY
        .iter()
        .find(|definition| definition.name == name)
}

pub fn tool_env(name: &str) -> Vec<(String, String)> {
    tool_definition(name)
        .map(|definition| {
            definition
                .env
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn tool_needs_warmup(name: &str) -> bool {
    name != TOOL_NONE
}

/// Replaces `/` and whitespace with `-`.
pub fn sanitize_worktree_name(name: &str) -> String {
    name.chars()
        .map(|character| {
            if character == '/' || character.is_whitespace() {
                '-'
            } else {
                character
            }
        })
        .collect()
}

/// Git branch for a typed worktree name: trimmed, whitespace runs become a
/// single `-`, slashes are kept.
pub fn branch_name(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join("-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub exists: bool,
    pub last_used: Option<SystemTime>,
    pub score: i64,
}

impl DirEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            name,
            exists: true,
            last_used: None,
            score: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_last_used(mut self, last_used: Option<SystemTime>) -> Self {
        self.last_used = last_used;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    pub path: PathBuf,
    pub name: String,
    pub branch: String,
}

impl Worktree {
    pub fn new(path: PathBuf, name: &str, branch: impl Into<String>) -> Self {
        Self {
            path,
            name: sanitize_worktree_name(name),
            branch: branch.into(),
        }
    }
}

/// A non-empty warning always comes with an empty worktree list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorktreeListing {
    pub worktrees: Vec<Worktree>,
    pub warning: Option<String>,
}

impl WorktreeListing {
    pub fn from_worktrees(worktrees: Vec<Worktree>) -> Self {
        Self {
            worktrees,
            warning: None,
        }
    }

    pub fn degenerate(warning: impl Into<String>) -> Self {
        let warning = warning.into();
        Self {
            worktrees: Vec::new(),
            warning: (!warning.is_empty()).then_some(warning),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub dir_path: PathBuf,
    pub tool: String,
    pub detach: bool,
}

impl SessionSpec {
    pub fn new(dir_path: impl Into<PathBuf>, tool: impl Into<String>) -> Self {
        Self {
            dir_path: dir_path.into(),
            tool: tool.into(),
            detach: false,
        }
    }

    pub fn detached(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub name: String,
    pub dir_path: PathBuf,
    pub tool: String,
    pub project: Option<String>,
    pub branch: Option<String>,
}

impl SessionInfo {
    pub fn new(name: impl Into<String>, dir_path: PathBuf, tool: impl Into<String>) -> Self {
        let (project, branch) = derive_project_and_branch(&dir_path);
        Self {
            name: name.into(),
            dir_path,
            tool: tool.into(),
            project,
            branch,
        }
    }
}

fn derive_project_and_branch(dir_path: &Path) -> (Option<String>, Option<String>) {
    let branch = dir_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty());
    let project = dir_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty());
    (project, branch)
}

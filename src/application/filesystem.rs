use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{DirEntry, Worktree, WorktreeListing, branch_name, sanitize_worktree_name};
use crate::infrastructure::process::{execute, failure_message};

pub const NO_REPOSITORY_WARNING: &str = "Project has no repository. Create a project first.";
pub const MULTIPLE_REPOSITORIES_WARNING: &str =
    "Project has multiple primary repos. Keep only one worktree with a .git directory.";
pub const BARE_REPOSITORY_DIR: &str = ".bare";
pub const MAIN_BRANCH: &str = "main";
const DETACHED_BRANCH: &str = "(detached)";
const SKIPPED_DIRS: [&str; 7] = [
    ".git",
    "node_modules",
    "vendor",
    ".cache",
    "__pycache__",
    ".venv",
    "target",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesystemError {
    NoRepository,
    MultipleRepositories,
    GitCommandFailed(String),
    Io(String),
}

impl FilesystemError {
    pub fn message(&self) -> String {
        match self {
            Self::NoRepository => NO_REPOSITORY_WARNING.to_string(),
            Self::MultipleRepositories => MULTIPLE_REPOSITORIES_WARNING.to_string(),
            Self::GitCommandFailed(message) => format!("git command failed: {message}"),
            Self::Io(message) => format!("io error: {message}"),
        }
    }
}

/// Blocking filesystem operations behind the palette and `rv`.
pub trait WorkspaceFilesystem: Send + Sync {
    fn scan_dirs(&self, roots: &[PathBuf], max_depth: usize)
    -> Result<Vec<DirEntry>, FilesystemError>;
    fn create_project(&self, path: &Path) -> Result<PathBuf, FilesystemError>;
    fn delete_project(&self, path: &Path) -> Result<(), FilesystemError>;
    fn list_worktree_paths(&self, project_path: &Path) -> Result<Vec<PathBuf>, FilesystemError>;
    fn list_worktrees(&self, project_path: &Path) -> Result<WorktreeListing, FilesystemError>;
    fn create_worktree(&self, project_path: &Path, branch: &str)
    -> Result<PathBuf, FilesystemError>;
    fn delete_worktree(
        &self,
        project_path: &Path,
        worktree_path: &Path,
    ) -> Result<(), FilesystemError>;
    fn prune_worktrees(&self, project_path: &Path) -> Result<(), FilesystemError>;
}

/// Runs git in `cwd` and returns stdout.
pub trait GitRunner: Send + Sync {
    fn run(&self, cwd: &Path, args: &[String]) -> Result<String, String>;
}

pub struct CommandGitRunner;

impl GitRunner for CommandGitRunner {
    fn run(&self, cwd: &Path, args: &[String]) -> Result<String, String> {
        let output = execute("git", args, Some(cwd))?;
        if output.success {
            return Ok(output.stdout);
        }
        Err(failure_message("git", args, &output))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PrimaryRepo {
    Missing,
    Multiple,
    Found(PathBuf),
}

pub struct GitWorkspaceFilesystem<R = CommandGitRunner> {
    git: R,
}

impl GitWorkspaceFilesystem<CommandGitRunner> {
    pub fn new() -> Self {
        Self {
            git: CommandGitRunner,
        }
    }
}

impl Default for GitWorkspaceFilesystem<CommandGitRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: GitRunner> GitWorkspaceFilesystem<R> {
    pub fn with_runner(git: R) -> Self {
        Self { git }
    }

    fn git(&self, cwd: &Path, args: &[&str]) -> Result<String, FilesystemError> {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
        self.git
            .run(cwd, &args)
            .map_err(FilesystemError::GitCommandFailed)
    }

    fn primary_repo_or_error(&self, project_path: &Path) -> Result<PathBuf, FilesystemError> {
        match primary_repo(project_path)? {
            PrimaryRepo::Found(path) => Ok(path),
            PrimaryRepo::Missing => Err(FilesystemError::NoRepository),
            PrimaryRepo::Multiple => Err(FilesystemError::MultipleRepositories),
        }
    }

    fn init_bare_repo(&self, project_path: &Path, bare: &Path) -> Result<(), FilesystemError> {
        let bare_arg = bare.to_string_lossy().to_string();
        if self
            .git(project_path, &["init", "--bare", "-b", MAIN_BRANCH, &bare_arg])
            .is_ok()
        {
            return Ok(());
        }

        self.git(project_path, &["init", "--bare", &bare_arg])?;
        self.git(
            project_path,
            &[
                "--git-dir",
                &bare_arg,
                "symbolic-ref",
                "HEAD",
                "refs/heads/main",
            ],
        )?;
        Ok(())
    }

    fn add_main_worktree(&self, bare: &Path, main: &Path) -> Result<(), FilesystemError> {
        let main_arg = main.to_string_lossy().to_string();
        let orphan = self.git(
            bare,
            &["worktree", "add", "--orphan", "-b", MAIN_BRANCH, &main_arg],
        );
        if orphan.is_ok() {
            return Ok(());
        }

        self.git(bare, &["worktree", "add", &main_arg, MAIN_BRANCH])
            .map(|_| ())
    }

    fn branch_exists(&self, repo: &Path, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        self.git(repo, &["rev-parse", "--verify", "--quiet", &reference])
            .is_ok()
    }
}

impl<R: GitRunner> WorkspaceFilesystem for GitWorkspaceFilesystem<R> {
    fn scan_dirs(
        &self,
        roots: &[PathBuf],
        max_depth: usize,
    ) -> Result<Vec<DirEntry>, FilesystemError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for root in roots {
            if !root.is_dir() {
                continue;
            }
            let mut queue = VecDeque::from([(root.clone(), 0usize)]);
            while let Some((dir, depth)) = queue.pop_front() {
                if depth >= max_depth {
                    continue;
                }
                let children = match child_dirs(&dir) {
                    Ok(children) => children,
                    Err(error) if &dir == root => return Err(error),
                    Err(_) => continue,
                };

                for child in children {
                    let canonical = fs::canonicalize(&child).unwrap_or_else(|_| child.clone());
                    if !seen.insert(canonical) {
                        continue;
                    }
                    let last_used = fs::metadata(&child)
                        .and_then(|metadata| metadata.modified())
                        .ok();
                    let is_project = is_project_dir(&child);
                    entries.push(DirEntry::new(child.clone()).with_last_used(last_used));
                    if !is_project {
                        queue.push_back((child, depth + 1));
                    }
                }
            }
        }

        Ok(entries)
    }

    fn create_project(&self, path: &Path) -> Result<PathBuf, FilesystemError> {
        fs::create_dir_all(path).map_err(|error| FilesystemError::Io(error.to_string()))?;
        let bare = path.join(BARE_REPOSITORY_DIR);
        if bare.is_dir() {
            return Ok(path.to_path_buf());
        }

        self.init_bare_repo(path, &bare)?;
        self.add_main_worktree(&bare, &path.join(MAIN_BRANCH))?;
        Ok(path.to_path_buf())
    }

    fn delete_project(&self, path: &Path) -> Result<(), FilesystemError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(FilesystemError::Io(error.to_string())),
        }
    }

    fn list_worktree_paths(&self, project_path: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
        let listing = self.list_worktrees(project_path)?;
        Ok(listing
            .worktrees
            .into_iter()
            .map(|worktree| worktree.path)
            .collect())
    }

    fn list_worktrees(&self, project_path: &Path) -> Result<WorktreeListing, FilesystemError> {
        let repo = match primary_repo(project_path)? {
            PrimaryRepo::Found(repo) => repo,
            PrimaryRepo::Missing => return Ok(WorktreeListing::degenerate(NO_REPOSITORY_WARNING)),
            PrimaryRepo::Multiple => {
                return Ok(WorktreeListing::degenerate(MULTIPLE_REPOSITORIES_WARNING));
            }
        };

        let porcelain = self.git(&repo, &["worktree", "list", "--porcelain"])?;
        let worktrees = parse_worktree_porcelain(&porcelain)?
            .into_iter()
            .filter(|entry| !entry.is_bare)
            .map(|entry| {
                let name = worktree_name(project_path, &entry.path);
                let branch = entry
                    .branch
                    .unwrap_or_else(|| DETACHED_BRANCH.to_string());
                Worktree::new(entry.path, &name, branch)
            })
            .collect();
        Ok(WorktreeListing::from_worktrees(worktrees))
    }

    fn create_worktree(
        &self,
        project_path: &Path,
        branch: &str,
    ) -> Result<PathBuf, FilesystemError> {
        let repo = self.primary_repo_or_error(project_path)?;
        let branch = branch_name(branch);
        let name = sanitize_worktree_name(&branch);
        if name.is_empty() {
            return Err(FilesystemError::GitCommandFailed(
                "branch name is required".to_string(),
            ));
        }

        let worktree_path = project_path.join(&name);
        let path_arg = worktree_path.to_string_lossy().to_string();
        if self.branch_exists(&repo, &branch) {
            self.git(&repo, &["worktree", "add", &path_arg, &branch])?;
            return Ok(worktree_path);
        }

        if self
            .git(&repo, &["worktree", "add", "-b", &branch, &path_arg])
            .is_err()
        {
            self.git(&repo, &["worktree", "add", "--orphan", "-b", &branch, &path_arg])?;
        }
        Ok(worktree_path)
    }

    fn delete_worktree(
        &self,
        project_path: &Path,
        worktree_path: &Path,
    ) -> Result<(), FilesystemError> {
        let repo = self.primary_repo_or_error(project_path)?;
        if worktree_path.exists() {
            let path_arg = worktree_path.to_string_lossy().to_string();
            if self.git(&repo, &["worktree", "remove", &path_arg]).is_err() {
                self.git(&repo, &["worktree", "remove", "--force", &path_arg])?;
            }
        }
        self.prune_worktrees(project_path)
    }

    fn prune_worktrees(&self, project_path: &Path) -> Result<(), FilesystemError> {
        let repo = self.primary_repo_or_error(project_path)?;
        self.git(&repo, &["worktree", "prune"]).map(|_| ())
    }
}

fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>, FilesystemError> {
    let read_dir = fs::read_dir(dir).map_err(|error| {
        FilesystemError::Io(format!("read {}: {error}", dir.display()))
    })?;

    let mut children: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
        })
        .map(|entry| entry.path())
        .collect();
    children.sort();
    Ok(children)
}

fn is_project_dir(path: &Path) -> bool {
    path.join(BARE_REPOSITORY_DIR).is_dir() || path.join(".git").exists()
}

fn primary_repo(project_path: &Path) -> Result<PrimaryRepo, FilesystemError> {
    let mut markers = Vec::new();
    let bare = project_path.join(BARE_REPOSITORY_DIR);
    if bare.is_dir() {
        markers.push(bare);
    }
    if project_path.join(".git").is_dir() {
        markers.push(project_path.to_path_buf());
    }

    let read_dir = match fs::read_dir(project_path) {
        Ok(read_dir) => read_dir,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(PrimaryRepo::Missing),
        Err(error) => return Err(FilesystemError::Io(error.to_string())),
    };
    let mut children: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.join(".git").is_dir())
        .collect();
    children.sort();
    markers.extend(children);

    Ok(match markers.len() {
        0 => PrimaryRepo::Missing,
        1 => PrimaryRepo::Found(markers.remove(0)),
        _ => PrimaryRepo::Multiple,
    })
}

fn worktree_name(project_path: &Path, worktree_path: &Path) -> String {
    match worktree_path.strip_prefix(project_path) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            sanitize_worktree_name(&relative.to_string_lossy())
        }
        _ => worktree_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| worktree_path.to_string_lossy().into_owned()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedWorktree {
    path: PathBuf,
    branch: Option<String>,
    is_bare: bool,
}

fn parse_worktree_porcelain(input: &str) -> Result<Vec<ParsedWorktree>, FilesystemError> {
    let mut worktrees = Vec::new();
    let mut current: Option<ParsedWorktree> = None;

    for line in input.lines() {
        if line.trim().is_empty() {
            worktrees.extend(current.take());
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            worktrees.extend(current.take());
            current = Some(ParsedWorktree {
                path: PathBuf::from(path),
                branch: None,
                is_bare: false,
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            return Err(FilesystemError::GitCommandFailed(
                "worktree list: metadata before any worktree line".to_string(),
            ));
        };
        if let Some(branch_ref) = line.strip_prefix("branch ") {
            entry.branch = Some(short_branch_name(branch_ref));
        } else if line == "bare" {
            entry.is_bare = true;
        } else if line == "detached" {
            entry.branch = None;
        }
    }
    worktrees.extend(current);

    Ok(worktrees)
}

fn short_branch_name(branch_ref: &str) -> String {
    branch_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(branch_ref)
        .to_string()
}

#[cfg(test)]
mod tests;

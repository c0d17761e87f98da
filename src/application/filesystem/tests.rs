use super::{
    FilesystemError, GitRunner, GitWorkspaceFilesystem, MULTIPLE_REPOSITORIES_WARNING,
    NO_REPOSITORY_WARNING, WorkspaceFilesystem, parse_worktree_porcelain,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug)]
struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(label: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "rivet-fs-{label}-{}-{timestamp}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("test dir should be created");
        Self { path }
    }

    fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path.join(relative);
        fs::create_dir_all(&path).expect("nested dir should be created");
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

#[derive(Default)]
struct StubGitRunner {
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    outcomes: Mutex<Vec<Result<String, String>>>,
}

impl StubGitRunner {
    fn with_outcomes(outcomes: Vec<Result<String, String>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes),
        }
    }

    fn args(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn cwds(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(cwd, _)| cwd.clone())
            .collect()
    }
}

impl GitRunner for StubGitRunner {
    fn run(&self, cwd: &Path, args: &[String]) -> Result<String, String> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((cwd.to_path_buf(), args.to_vec()));
        let mut outcomes = self.outcomes.lock().expect("outcomes lock");
        if outcomes.is_empty() {
            return Ok(String::new());
        }
        outcomes.remove(0)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn names(entries: &[crate::domain::DirEntry]) -> Vec<String> {
    entries.iter().map(|entry| entry.name.clone()).collect()
}

#[test]
fn scan_skips_hidden_and_blacklisted_and_stops_at_projects() {
    let root = TestDir::new("scan");
    root.mkdir("alpha");
    root.mkdir("beta/.bare");
    root.mkdir("beta/main");
    root.mkdir("gamma/nested");
    root.mkdir(".hidden/inner");
    root.mkdir("node_modules/pkg");
    root.mkdir("target/debug");

    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());
    let entries = filesystem
        .scan_dirs(&[root.path.clone()], 3)
        .expect("scan should succeed");

    assert_eq!(names(&entries), vec!["alpha", "beta", "gamma", "nested"]);
    assert!(entries.iter().all(|entry| entry.exists));
    assert!(entries.iter().all(|entry| entry.last_used.is_some()));
}

#[test]
fn scan_respects_depth_and_deduplicates_roots() {
    let root = TestDir::new("scan-depth");
    root.mkdir("one/two/three");

    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());
    let shallow = filesystem
        .scan_dirs(&[root.path.clone(), root.path.clone()], 1)
        .expect("scan should succeed");
    assert_eq!(names(&shallow), vec!["one"]);

    let deep = filesystem
        .scan_dirs(&[root.path.clone()], 2)
        .expect("scan should succeed");
    assert_eq!(names(&deep), vec!["one", "two"]);
}

#[test]
fn scan_ignores_missing_roots() {
    let root = TestDir::new("scan-missing");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());
    let entries = filesystem
        .scan_dirs(&[root.path.join("absent")], 3)
        .expect("missing root should be skipped");
    assert!(entries.is_empty());
}

#[test]
fn listing_without_repository_is_degenerate() {
    let project = TestDir::new("no-repo");
    project.mkdir("loose");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    let listing = filesystem
        .list_worktrees(&project.path)
        .expect("listing should succeed");
    assert_eq!(listing.warning.as_deref(), Some(NO_REPOSITORY_WARNING));
    assert!(listing.worktrees.is_empty());
}

#[test]
fn listing_with_multiple_primary_repos_is_degenerate() {
    let project = TestDir::new("multi-repo");
    project.mkdir("one/.git");
    project.mkdir("two/.git");
    let runner = StubGitRunner::default();
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let listing = filesystem
        .list_worktrees(&project.path)
        .expect("listing should succeed");
    assert_eq!(listing.warning.as_deref(), Some(MULTIPLE_REPOSITORIES_WARNING));
    assert!(filesystem.git.args().is_empty());
}

#[test]
fn listing_reads_porcelain_from_bare_repo() {
    let project = TestDir::new("listing");
    let bare = project.mkdir(".bare");
    let porcelain = format!(
        "worktree {bare}\nbare\n\nworktree {root}/main\nHEAD 1111\nbranch refs/heads/main\n\nworktree {root}/feature/login\nHEAD 2222\ndetached\n\nworktree /elsewhere/spike\nHEAD 3333\nbranch refs/heads/spike\n",
        bare = bare.display(),
        root = project.path.display(),
    );
    let runner = StubGitRunner::with_outcomes(vec![Ok(porcelain)]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let listing = filesystem
        .list_worktrees(&project.path)
        .expect("listing should succeed");
    assert_eq!(listing.warning, None);
    let summary: Vec<(String, String)> = listing
        .worktrees
        .iter()
        .map(|worktree| (worktree.name.clone(), worktree.branch.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("main".to_string(), "main".to_string()),
            ("feature-login".to_string(), "(detached)".to_string()),
            ("spike".to_string(), "spike".to_string()),
        ]
    );
    assert_eq!(filesystem.git.cwds(), vec![bare]);
    assert_eq!(
        filesystem.git.args(),
        vec![strings(&["worktree", "list", "--porcelain"])]
    );
}

#[test]
fn create_worktree_makes_new_branch() {
    let project = TestDir::new("create-new");
    let bare = project.mkdir(".bare");
    let runner = StubGitRunner::with_outcomes(vec![Err("not a branch".to_string()), Ok(String::new())]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let path = filesystem
        .create_worktree(&project.path, "feature/login")
        .expect("worktree should be created");
    let expected = project.path.join("feature-login");
    assert_eq!(path, expected);
    assert_eq!(
        filesystem.git.args(),
        vec![
            strings(&["rev-parse", "--verify", "--quiet", "refs/heads/feature/login"]),
            strings(&[
                "worktree",
                "add",
                "-b",
                "feature/login",
                &expected.to_string_lossy(),
            ]),
        ]
    );
    assert!(filesystem.git.cwds().iter().all(|cwd| cwd == &bare));
}

#[test]
fn create_worktree_reuses_existing_branch() {
    let project = TestDir::new("create-existing");
    project.mkdir(".bare");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    let path = filesystem
        .create_worktree(&project.path, "release")
        .expect("worktree should be created");
    assert_eq!(
        filesystem.git.args()[1],
        strings(&["worktree", "add", &path.to_string_lossy(), "release"])
    );
}

#[test]
fn create_worktree_falls_back_to_orphan_branch() {
    let project = TestDir::new("create-orphan");
    project.mkdir(".bare");
    let runner = StubGitRunner::with_outcomes(vec![
        Err("missing".to_string()),
        Err("invalid reference: HEAD".to_string()),
        Ok(String::new()),
    ]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let path = filesystem
        .create_worktree(&project.path, "first")
        .expect("orphan worktree should be created");
    assert_eq!(
        filesystem.git.args()[2],
        strings(&["worktree", "add", "--orphan", "-b", "first", &path.to_string_lossy()])
    );
}

#[test]
fn create_worktree_without_repository_fails_with_warning() {
    let project = TestDir::new("create-no-repo");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    let error = filesystem
        .create_worktree(&project.path, "feature")
        .expect_err("creation should fail");
    assert_eq!(error, FilesystemError::NoRepository);
    assert_eq!(error.message(), NO_REPOSITORY_WARNING);
}

#[test]
fn create_project_falls_back_to_symbolic_ref() {
    let root = TestDir::new("create-project");
    let project = root.path.join("demo");
    let runner = StubGitRunner::with_outcomes(vec![
        Err("unknown switch `b'".to_string()),
        Ok(String::new()),
        Ok(String::new()),
        Ok(String::new()),
    ]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let created = filesystem
        .create_project(&project)
        .expect("project should be created");
    assert_eq!(created, project);
    assert!(project.is_dir());

    let bare = project.join(".bare").to_string_lossy().to_string();
    let main = project.join("main").to_string_lossy().to_string();
    assert_eq!(
        filesystem.git.args(),
        vec![
            strings(&["init", "--bare", "-b", "main", &bare]),
            strings(&["init", "--bare", &bare]),
            strings(&["--git-dir", &bare, "symbolic-ref", "HEAD", "refs/heads/main"]),
            strings(&["worktree", "add", "--orphan", "-b", "main", &main]),
        ]
    );
}

#[test]
fn create_project_surfaces_git_failure() {
    let root = TestDir::new("create-project-fail");
    let runner = StubGitRunner::with_outcomes(vec![
        Err("first".to_string()),
        Err("git init --bare: permission denied".to_string()),
    ]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let error = filesystem
        .create_project(&root.path.join("demo"))
        .expect_err("creation should fail");
    assert_eq!(
        error,
        FilesystemError::GitCommandFailed("git init --bare: permission denied".to_string())
    );
}

#[test]
fn delete_worktree_forces_then_prunes() {
    let project = TestDir::new("delete-worktree");
    project.mkdir(".bare");
    let worktree = project.mkdir("feature");
    let runner = StubGitRunner::with_outcomes(vec![
        Err("contains modified files".to_string()),
        Ok(String::new()),
        Ok(String::new()),
    ]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    filesystem
        .delete_worktree(&project.path, &worktree)
        .expect("delete should succeed");
    let path = worktree.to_string_lossy().to_string();
    assert_eq!(
        filesystem.git.args(),
        vec![
            strings(&["worktree", "remove", &path]),
            strings(&["worktree", "remove", "--force", &path]),
            strings(&["worktree", "prune"]),
        ]
    );
}

#[test]
fn delete_missing_worktree_only_prunes() {
    let project = TestDir::new("delete-missing");
    project.mkdir(".bare");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    filesystem
        .delete_worktree(&project.path, &project.path.join("gone"))
        .expect("delete should succeed");
    assert_eq!(filesystem.git.args(), vec![strings(&["worktree", "prune"])]);
}

#[test]
fn prune_runs_in_primary_repo() {
    let project = TestDir::new("prune");
    let bare = project.mkdir(".bare");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    filesystem
        .prune_worktrees(&project.path)
        .expect("prune should succeed");
    assert_eq!(filesystem.git.args(), vec![strings(&["worktree", "prune"])]);
    assert_eq!(filesystem.git.cwds(), vec![bare]);
}

#[test]
fn prune_without_repository_fails_without_running_git() {
    let project = TestDir::new("prune-no-repo");
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    let error = filesystem
        .prune_worktrees(&project.path)
        .expect_err("prune should fail");
    assert_eq!(error, FilesystemError::NoRepository);
    assert!(filesystem.git.args().is_empty());
}

#[test]
fn prune_failure_is_reported() {
    let project = TestDir::new("prune-fails");
    project.mkdir(".bare");
    let runner = StubGitRunner::with_outcomes(vec![Err("fatal: locked".to_string())]);
    let filesystem = GitWorkspaceFilesystem::with_runner(runner);

    let error = filesystem
        .prune_worktrees(&project.path)
        .expect_err("prune should fail");
    assert!(matches!(error, FilesystemError::GitCommandFailed(_)));
}

#[test]
fn delete_project_removes_tree_and_tolerates_absence() {
    let root = TestDir::new("delete-project");
    let project = root.mkdir("demo/main");
    let project = project.parent().expect("parent").to_path_buf();
    let filesystem = GitWorkspaceFilesystem::with_runner(StubGitRunner::default());

    filesystem
        .delete_project(&project)
        .expect("delete should succeed");
    assert!(!project.exists());
    filesystem
        .delete_project(&project)
        .expect("second delete should be a no-op");
}

#[test]
fn porcelain_rejects_metadata_before_worktree() {
    let error = parse_worktree_porcelain("branch refs/heads/main\n").expect_err("should fail");
    assert!(matches!(error, FilesystemError::GitCommandFailed(_)));
}

use std::path::{Path, PathBuf};

use crate::application::palette::clean_path;
use crate::domain::{SessionInfo, SessionSpec, tool_env, tool_needs_warmup};
use crate::infrastructure::process::{CommandOutput, command_line, execute, execute_interactive};

const TMUX: &str = "tmux";
const FALLBACK_SHELL: &str = "/bin/sh";
const TERMINAL_ENV_KEYS: [&str; 5] = [
    "TERM",
    "TERM_PROGRAM",
    "TERM_PROGRAM_VERSION",
    "COLORTERM",
    "COLORFGBG",
];
const TOOL_THEN_SHELL: &str = "\"$1\"; exec \"$0\"";
const LIST_WINDOWS_FORMAT: &str = "#{session_name}\t#{window_name}\t#{session_path}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    CommandFailed { command: String, output: String },
    Io(String),
}

impl SessionError {
    pub fn message(&self) -> String {
        match self {
            Self::CommandFailed { command, output } if output.is_empty() => {
                format!("{command}: command failed")
            }
            Self::CommandFailed { command, output } => format!("{command}: {output}"),
            Self::Io(message) => message.clone(),
        }
    }
}

/// Session lifecycle against the terminal multiplexer.
pub trait SessionManager: Send + Sync {
    fn open_session(&self, spec: &SessionSpec) -> Result<(), SessionError>;
    /// Ensures the tool window exists. `true` when this call created it.
    fn prewarm_session(&self, spec: &SessionSpec) -> Result<bool, SessionError>;
    fn kill_session(&self, spec: &SessionSpec) -> Result<(), SessionError>;
    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError>;
    fn attach_session(&self, name: &str) -> Result<(), SessionError>;
    fn switch_to_last_client(&self) -> Result<(), SessionError>;
    fn inside_multiplexer(&self) -> bool;
}

pub trait MultiplexerRunner: Send + Sync {
    fn output(&self, args: &[String]) -> Result<CommandOutput, String>;
    fn interactive(&self, args: &[String]) -> Result<(), String>;
}

pub struct TmuxRunner;

impl MultiplexerRunner for TmuxRunner {
    fn output(&self, args: &[String]) -> Result<CommandOutput, String> {
        execute(TMUX, args, None)
    }

    fn interactive(&self, args: &[String]) -> Result<(), String> {
        execute_interactive(TMUX, args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnvironment {
    pub shell: String,
    pub inside_tmux: bool,
    pub tmux_pane: Option<String>,
    pub terminal_env: Vec<(String, String)>,
}

impl Default for SessionEnvironment {
    fn default() -> Self {
        Self {
            shell: FALLBACK_SHELL.to_string(),
            inside_tmux: false,
            tmux_pane: None,
            terminal_env: Vec::new(),
        }
    }
}

impl SessionEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            shell: non_empty("SHELL").unwrap_or_else(|| FALLBACK_SHELL.to_string()),
            inside_tmux: non_empty("TMUX").is_some(),
            tmux_pane: non_empty("TMUX_PANE"),
            terminal_env: TERMINAL_ENV_KEYS
                .iter()
                .filter_map(|key| non_empty(key).map(|value| ((*key).to_string(), value)))
                .collect(),
        }
    }
}

/// Workspace session name for a worktree directory: the cleaned path with
/// every run of characters outside `[A-Za-z0-9_-]` collapsed to `-`.
pub fn workspace_session_name(dir_path: &Path) -> String {
    let cleaned = clean_path(dir_path);
    let mut name = String::new();
    let mut last_was_separator = false;
    for character in cleaned.to_string_lossy().chars() {
        if character.is_ascii_alphanumeric() || character == '_' || character == '-' {
            name.push(character);
            last_was_separator = false;
            continue;
        }
        if !last_was_separator {
            name.push('-');
            last_was_separator = true;
        }
    }
    name.trim_matches('-').to_string()
}

pub fn window_target(session: &str, window: &str) -> String {
    format!("={session}:{window}")
}

pub fn kill_error_is_tolerated(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    lower.contains("can't find session") || lower.contains("no server running")
}

pub fn duplicate_session_error(output: &str) -> bool {
    output.to_ascii_lowercase().contains("duplicate session")
}

fn no_server_error(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    lower.contains("no server running") || lower.contains("error connecting to")
}

fn strings<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

pub struct TmuxSessionManager<R = TmuxRunner> {
    runner: R,
    environment: SessionEnvironment,
}

impl TmuxSessionManager<TmuxRunner> {
    pub fn from_env() -> Self {
        Self::new(TmuxRunner, SessionEnvironment::from_env())
    }
}

impl<R: MultiplexerRunner> TmuxSessionManager<R> {
    pub fn new(runner: R, environment: SessionEnvironment) -> Self {
        Self {
            runner,
            environment,
        }
    }

    fn run(&self, args: Vec<String>) -> Result<CommandOutput, SessionError> {
        self.runner.output(&args).map_err(SessionError::Io)
    }

    fn run_checked(&self, args: Vec<String>) -> Result<CommandOutput, SessionError> {
        let output = self.run(args.clone())?;
        if output.success {
            return Ok(output);
        }
        Err(command_failed(&args, &output))
    }

    fn has_session(&self, session: &str) -> Result<bool, SessionError> {
        let output = self.run(strings(["has-session", "-t", &format!("={session}")]))?;
        Ok(output.success)
    }

    fn has_window(&self, session: &str, window: &str) -> Result<bool, SessionError> {
        let output = self.run_checked(strings([
            "list-windows",
            "-t",
            &format!("={session}"),
            "-F",
            "#{window_name}",
        ]))?;
        Ok(output.stdout.lines().any(|line| line.trim() == window))
    }

    fn launch_args(&self, spec: &SessionSpec) -> Vec<String> {
        let mut args = strings(["-c", &spec.dir_path.to_string_lossy()]);
        for (key, value) in tool_env(&spec.tool)
            .into_iter()
            .chain(self.environment.terminal_env.iter().cloned())
        {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        if tool_needs_warmup(&spec.tool) {
            args.extend(strings([
                "sh",
                "-c",
                TOOL_THEN_SHELL,
                &self.environment.shell,
                &spec.tool,
            ]));
        }
        args
    }

    fn new_window(&self, session: &str, spec: &SessionSpec) -> Result<(), SessionError> {
        let target = format!("={session}:");
        let mut args = strings(["new-window", "-d", "-t", &target, "-n", &spec.tool]);
        args.extend(self.launch_args(spec));
        self.run_checked(args).map(|_| ())
    }

    fn ensure_session(&self, spec: &SessionSpec) -> Result<bool, SessionError> {
        let session = workspace_session_name(&spec.dir_path);
        if self.has_session(&session)? {
            if self.has_window(&session, &spec.tool)? {
                return Ok(false);
            }
            self.new_window(&session, spec)?;
            return Ok(true);
        }

        let mut args = strings(["new-session", "-d", "-s", &session, "-n", &spec.tool]);
        args.extend(self.launch_args(spec));
        let output = self.run(args.clone())?;
        if output.success {
            return Ok(true);
        }
        if duplicate_session_error(&output.combined()) {
            if !self.has_window(&session, &spec.tool)? {
                self.new_window(&session, spec)?;
            }
            return Ok(true);
        }
        Err(command_failed(&args, &output))
    }

    fn client_tty(&self) -> Option<String> {
        let pane = self.environment.tmux_pane.as_ref()?;
        let output = self
            .run(strings(["display-message", "-p", "-t", pane, "#{client_tty}"]))
            .ok()?;
        let tty = output.stdout.trim().to_string();
        (output.success && !tty.is_empty()).then_some(tty)
    }

    fn switch_to(&self, target: &str) -> Result<(), SessionError> {
        if let Some(tty) = self.client_tty() {
            let output = self.run(strings(["switch-client", "-c", &tty, "-t", target]))?;
            if output.success {
                return Ok(());
            }
        }
        self.run_checked(strings(["switch-client", "-t", target]))
            .map(|_| ())
    }

    fn attach_target(&self, target: &str) -> Result<(), SessionError> {
        self.run_checked(strings(["select-window", "-t", target]))?;
        if self.environment.inside_tmux {
            return self.switch_to(target);
        }

        let args = strings(["attach-session", "-t", target]);
        self.runner
            .interactive(&args)
            .map_err(|output| SessionError::CommandFailed {
                command: command_line(TMUX, &args),
                output,
            })
    }
}

impl<R: MultiplexerRunner> SessionManager for TmuxSessionManager<R> {
    fn open_session(&self, spec: &SessionSpec) -> Result<(), SessionError> {
        self.ensure_session(spec)?;
        if spec.detach {
            return Ok(());
        }
        let session = workspace_session_name(&spec.dir_path);
        self.attach_target(&window_target(&session, &spec.tool))
    }

    fn prewarm_session(&self, spec: &SessionSpec) -> Result<bool, SessionError> {
        self.ensure_session(spec)
    }

    fn kill_session(&self, spec: &SessionSpec) -> Result<(), SessionError> {
        let session = workspace_session_name(&spec.dir_path);
        let args = strings(["kill-session", "-t", &format!("={session}")]);
        let output = self.run(args.clone())?;
        if output.success || kill_error_is_tolerated(&output.combined()) {
            return Ok(());
        }
        Err(command_failed(&args, &output))
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError> {
        let args = strings(["list-windows", "-a", "-F", LIST_WINDOWS_FORMAT]);
        let output = self.run(args.clone())?;
        if !output.success {
            if no_server_error(&output.combined()) {
                return Ok(Vec::new());
            }
            return Err(command_failed(&args, &output));
        }
        Ok(parse_window_list(&output.stdout))
    }

    fn attach_session(&self, name: &str) -> Result<(), SessionError> {
        self.attach_target(&format!("={name}"))
    }

    fn switch_to_last_client(&self) -> Result<(), SessionError> {
        self.run_checked(strings(["switch-client", "-l"])).map(|_| ())
    }

    fn inside_multiplexer(&self) -> bool {
        self.environment.inside_tmux
    }
}

fn command_failed(args: &[String], output: &CommandOutput) -> SessionError {
    SessionError::CommandFailed {
        command: command_line(TMUX, args),
        output: output.combined(),
    }
}

fn parse_window_list(stdout: &str) -> Vec<SessionInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let session = fields.next()?.trim();
            let window = fields.next()?.trim();
            let path = fields.next().unwrap_or_default().trim();
            if session.is_empty() || window.is_empty() {
                return None;
            }
            Some(SessionInfo::new(
                format!("{session}:{window}"),
                PathBuf::from(path),
                window,
            ))
        })
        .collect()
}

use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stderr followed by trimmed stdout, skipping empty parts.
    pub fn combined(&self) -> String {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{program} {}", args.join(" "))
}

pub fn execute(program: &str, args: &[String], cwd: Option<&Path>) -> Result<CommandOutput, String> {
    let mut command = Command::new(program);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    let output = command
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|error| format!("{}: {error}", command_line(program, args)))?;

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Runs with the terminal attached and waits for the child to exit.
pub fn execute_interactive(program: &str, args: &[String]) -> Result<(), String> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|error| format!("{}: {error}", command_line(program, args)))?;

    if status.success() {
        return Ok(());
    }
    Err(format!("{}: exit status {status}", command_line(program, args)))
}

pub fn failure_message(program: &str, args: &[String], output: &CommandOutput) -> String {
    let detail = output.combined();
    if detail.is_empty() {
        return format!("{}: command failed", command_line(program, args));
    }
    format!("{}: {detail}", command_line(program, args))
}

/// `stty sane` against the controlling terminal.
pub fn reset_terminal() -> Result<(), String> {
    let status = Command::new("stty")
        .arg("sane")
        .stdin(Stdio::inherit())
        .status()
        .map_err(|error| format!("stty sane: {error}"))?;
    if status.success() {
        return Ok(());
    }
    Err(format!("stty sane: exit status {status}"))
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rivet::application::filesystem::GitWorkspaceFilesystem;
use rivet::application::palette::Model;
use rivet::application::runtime::EffectRuntime;
use rivet::application::sessions::TmuxSessionManager;
use rivet::domain::supported_tools;
use rivet::infrastructure::config;
use rivet::infrastructure::event_log::{
    self, DEBUG_RECORD_DIR, Event, EventLogger, FileEventLogger, NullEventLogger,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct CliArgs {
    event_log_path: Option<PathBuf>,
    debug_record: bool,
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> std::io::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(argument) = args.next() {
        match argument.as_str() {
            "--event-log" => {
                let Some(path) = args.next() else {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "--event-log requires a file path",
                    ));
                };
                cli.event_log_path = Some(PathBuf::from(path));
            }
            "--debug-record" => {
                cli.debug_record = true;
            }
            _ => {}
        }
    }

    Ok(cli)
}

fn resolve_event_log_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }

    let record_dir = Path::new(DEBUG_RECORD_DIR);
    if path.starts_with(record_dir) {
        return path;
    }

    record_dir.join(path)
}

fn ensure_event_log_parent_directory(path: &Path) -> std::io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent)
}

fn main() -> std::io::Result<()> {
    let cli = parse_cli_args(std::env::args().skip(1))?;
    let cwd = std::env::current_dir()?;
    let debug_record_path = if cli.debug_record {
        Some(event_log::debug_record_path(&cwd)?)
    } else {
        None
    };
    if let Some(path) = debug_record_path.as_ref() {
        eprintln!("rivet debug record: {}", path.display());
    }
    let event_log_path = debug_record_path.or(cli.event_log_path.map(resolve_event_log_path));
    let event_log: Box<dyn EventLogger> = match event_log_path.as_ref() {
        Some(path) => {
            ensure_event_log_parent_directory(path)?;
            Box::new(FileEventLogger::open(path)?)
        }
        None => Box::new(NullEventLogger),
    };

    let (config, load_error) = config::load_or_default();
    if let Some(error) = load_error {
        eprintln!("rivet: {error}, using defaults");
        event_log.log(Event::new("config", "load_failed").with_data("error", Value::from(error)));
    }

    let home = dirs::home_dir();
    let model = Model::new(config.resolved_roots(home.as_deref()), supported_tools())
        .with_home(home)
        .with_theme(config.theme());
    let runtime = EffectRuntime::new(
        Arc::new(GitWorkspaceFilesystem::new()),
        Arc::new(TmuxSessionManager::from_env()),
    )
    .with_max_depth(config.max_depth)
    .with_warmup_delay(config.warmup_delay());

    rivet::ui::tui::run(model, runtime, event_log)
}

#[cfg(test)]
mod main_tests;

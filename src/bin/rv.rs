use std::fs;
use std::process::ExitCode;

use rivet::application::filesystem::GitWorkspaceFilesystem;
use rivet::application::headless::{self, HeadlessContext, HeadlessError, Resolver};
use rivet::application::sessions::TmuxSessionManager;
use rivet::infrastructure::config;
use rivet::infrastructure::event_log::{EventLogger, FileEventLogger, NullEventLogger};

fn open_event_log(request: &headless::HeadlessRequest) -> Result<Box<dyn EventLogger>, String> {
    let Some(path) = request.event_log_path.as_ref() else {
        return Ok(Box::new(NullEventLogger));
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|error| format!("event log directory create failed: {error}"))?;
    }
    FileEventLogger::open(path)
        .map(|logger| Box::new(logger) as Box<dyn EventLogger>)
        .map_err(|error| format!("event log open failed: {error}"))
}

fn run() -> Result<(), String> {
    let request =
        headless::parse_args(std::env::args().skip(1)).map_err(|error| error.message())?;
    let event_log = open_event_log(&request)?;

    let (config, load_error) = config::load_or_default();
    if let Some(error) = load_error {
        eprintln!("rv: {error}, using defaults");
    }
    let home = dirs::home_dir();
    let cwd = std::env::current_dir().map_err(|error| format!("cwd unavailable: {error}"))?;
    let context = HeadlessContext {
        roots: config.resolved_roots(home.as_deref()),
        home,
        cwd,
        max_depth: config.max_depth,
    };

    let filesystem = GitWorkspaceFilesystem::new();
    let sessions = TmuxSessionManager::from_env();
    let resolver = Resolver {
        context: &context,
        filesystem: &filesystem,
        logger: event_log.as_ref(),
    };
    headless::run(&request, &resolver, &sessions)
        .map(|_| ())
        .map_err(|error: HeadlessError| error.message())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("rv: {message}");
            ExitCode::FAILURE
        }
    }
}

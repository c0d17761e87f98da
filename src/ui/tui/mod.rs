use std::sync::{Arc, Mutex};
use std::time::Duration;

use ftui::core::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
use ftui::core::geometry::Rect;
use ftui::layout::{Constraint, Flex};
use ftui::render::budget::FrameBudgetConfig;
use ftui::render::frame::Frame;
use ftui::runtime::WidgetRefreshConfig;
use ftui::text::{
    Line as FtLine, Span as FtSpan, Text as FtText, display_width as text_display_width,
};
use ftui::widgets::Widget;
use ftui::widgets::block::Block;
use ftui::widgets::borders::Borders;
use ftui::widgets::paragraph::Paragraph;
use ftui::{App, Cmd, Model, PackedRgba, ScreenMode, Style};
use ftui_extras::text_effects::{ColorGradient, StyledText, TextEffect};
use serde_json::Value;

use crate::application::palette::{self, Effect, Mode, Msg as CoreMsg, Theme, WarmStart};
use crate::application::runtime::{Dispatch, EffectRuntime};
use crate::application::sessions::SessionManager;
use crate::domain::{SessionInfo, SessionSpec};
use crate::infrastructure::event_log::{
    Event as LogEvent, EventLogger, effect_event, mode_change_event, msg_event,
};
use crate::infrastructure::process::reset_terminal;

mod keys;
use keys::{edit_query, key_name};
mod msg;
use msg::Msg;
mod update;
mod view;

const HEADER_HEIGHT: u16 = 1;
const INPUT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;
const ANIMATION_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy)]
struct UiTheme {
    base: PackedRgba,
    mantle: PackedRgba,
    crust: PackedRgba,
    surface0: PackedRgba,
    surface1: PackedRgba,
    overlay0: PackedRgba,
    text: PackedRgba,
    subtext0: PackedRgba,
    blue: PackedRgba,
    lavender: PackedRgba,
    yellow: PackedRgba,
    red: PackedRgba,
    peach: PackedRgba,
    mauve: PackedRgba,
    teal: PackedRgba,
}

fn ui_theme(theme: Theme) -> UiTheme {
    match theme {
        Theme::Mocha => UiTheme {
            base: PackedRgba::rgb(30, 30, 46),
            mantle: PackedRgba::rgb(24, 24, 37),
            crust: PackedRgba::rgb(17, 17, 27),
            surface0: PackedRgba::rgb(49, 50, 68),
            surface1: PackedRgba::rgb(69, 71, 90),
            overlay0: PackedRgba::rgb(108, 112, 134),
            text: PackedRgba::rgb(205, 214, 244),
            subtext0: PackedRgba::rgb(166, 173, 200),
            blue: PackedRgba::rgb(137, 180, 250),
            lavender: PackedRgba::rgb(180, 190, 254),
            yellow: PackedRgba::rgb(249, 226, 175),
            red: PackedRgba::rgb(243, 139, 168),
            peach: PackedRgba::rgb(250, 179, 135),
            mauve: PackedRgba::rgb(203, 166, 247),
            teal: PackedRgba::rgb(148, 226, 213),
        },
        Theme::Gruvbox => UiTheme {
            base: PackedRgba::rgb(40, 40, 40),
            mantle: PackedRgba::rgb(50, 48, 47),
            crust: PackedRgba::rgb(29, 32, 33),
            surface0: PackedRgba::rgb(60, 56, 54),
            surface1: PackedRgba::rgb(80, 73, 69),
            overlay0: PackedRgba::rgb(146, 131, 116),
            text: PackedRgba::rgb(235, 219, 178),
            subtext0: PackedRgba::rgb(213, 196, 161),
            blue: PackedRgba::rgb(131, 165, 152),
            lavender: PackedRgba::rgb(184, 187, 38),
            yellow: PackedRgba::rgb(250, 189, 47),
            red: PackedRgba::rgb(251, 73, 52),
            peach: PackedRgba::rgb(254, 128, 25),
            mauve: PackedRgba::rgb(211, 134, 155),
            teal: PackedRgba::rgb(142, 192, 124),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewLayout {
    header: Rect,
    input: Rect,
    list: Rect,
    status: Rect,
}

/// What to do with the real terminal once the palette has left the
/// alternate screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    Quit,
    Open(SessionSpec),
    Attach(SessionInfo),
}

impl ExitAction {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Open(_) => "open_session",
            Self::Attach(_) => "attach_session",
        }
    }
}

type ExitSlot = Arc<Mutex<Option<ExitAction>>>;

struct PaletteApp {
    model: palette::Model,
    runtime: EffectRuntime,
    event_log: Box<dyn EventLogger>,
    exit: ExitSlot,
    animation_frame: usize,
}

impl PaletteApp {
    fn new(model: palette::Model, runtime: EffectRuntime, event_log: Box<dyn EventLogger>) -> Self {
        Self {
            model,
            runtime,
            event_log,
            exit: Arc::new(Mutex::new(None)),
            animation_frame: 0,
        }
    }

    fn exit_action(&self) -> Option<ExitAction> {
        self.exit.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Model for PaletteApp {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Self::Message> {
        self.init_model()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Self::Message> {
        self.update_model(msg)
    }

    fn view(&self, frame: &mut Frame) {
        self.render_model(frame);
    }
}

/// Runs the palette until it exits, then restores the terminal and carries
/// out the exit action on it.
pub fn run(
    model: palette::Model,
    runtime: EffectRuntime,
    event_log: Box<dyn EventLogger>,
) -> std::io::Result<()> {
    let sessions = runtime.sessions();
    event_log.log(
        LogEvent::new("app", "started")
            .with_data("roots", Value::from(model.roots.len()))
            .with_data("theme", Value::from(model.theme.label())),
    );

    let app = PaletteApp::new(model, runtime, event_log);
    let exit = Arc::clone(&app.exit);
    App::new(app)
        .screen_mode(ScreenMode::AltScreen)
        .with_budget(FrameBudgetConfig::strict(Duration::from_millis(250)))
        .with_widget_refresh(WidgetRefreshConfig {
            enabled: false,
            ..WidgetRefreshConfig::default()
        })
        .run()?;

    let action = exit
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or(ExitAction::Quit);
    if !matches!(action, ExitAction::Quit) {
        reset_terminal().map_err(std::io::Error::other)?;
    }
    perform_exit(&action, sessions.as_ref()).map_err(std::io::Error::other)
}

fn perform_exit(action: &ExitAction, sessions: &dyn SessionManager) -> Result<(), String> {
    match action {
        ExitAction::Quit => Ok(()),
        ExitAction::Open(spec) => sessions.open_session(spec).map_err(|error| error.message()),
        ExitAction::Attach(session) => sessions
            .attach_session(&session.name)
            .map_err(|error| error.message()),
    }
}

#[cfg(test)]
mod tests;

use super::*;

impl PaletteApp {
    pub(super) fn init_model(&mut self) -> Cmd<Msg> {
        let (model, effects) = palette::init(std::mem::take(&mut self.model));
        self.model = model;
        self.dispatch(effects)
    }

    pub(super) fn update_model(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Key(key_event) => self.handle_key_event(key_event),
            Msg::Core(msg) => self.apply(msg),
            Msg::Tick => self.advance_animation(),
            Msg::Noop => Cmd::None,
        }
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) -> Cmd<Msg> {
        if !matches!(key_event.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return Cmd::None;
        }
        let Some(name) = key_name(&key_event) else {
            return Cmd::None;
        };

        self.event_log.log(msg_event(&CoreMsg::Key(name.clone())));
        let before = self.model.mode;
        let outcome = palette::handle_key(std::mem::take(&mut self.model), &name);
        self.model = outcome.model;
        self.log_mode_change(before);
        if outcome.handled {
            return self.dispatch(outcome.effects);
        }

        let Some(query) = self.model.current_query() else {
            return Cmd::None;
        };
        let Some(edited) = edit_query(query, &key_event) else {
            return Cmd::None;
        };
        match palette::query_changed(self.model.mode, edited) {
            Some(msg) => self.apply(msg),
            None => Cmd::None,
        }
    }

    fn apply(&mut self, msg: CoreMsg) -> Cmd<Msg> {
        self.event_log.log(msg_event(&msg));
        let before = self.model.mode;
        let (model, effects) = palette::update(std::mem::take(&mut self.model), msg);
        self.model = model;
        self.log_mode_change(before);
        self.dispatch(effects)
    }

    fn log_mode_change(&self, before: Mode) {
        if before != self.model.mode {
            self.event_log.log(mode_change_event(before, self.model.mode));
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) -> Cmd<Msg> {
        let mut cmds = Vec::new();
        for effect in effects {
            self.event_log.log(effect_event(&effect));
            match self.runtime.plan(effect, &self.model) {
                Dispatch::Tasks(tasks) => {
                    cmds.extend(
                        tasks
                            .into_iter()
                            .map(|task| Cmd::task(move || Msg::Core(task()))),
                    );
                }
                Dispatch::Quit => return self.finish(ExitAction::Quit),
                Dispatch::Open(spec) => return self.finish(ExitAction::Open(spec)),
                Dispatch::Attach(session) => return self.finish(ExitAction::Attach(session)),
            }
        }

        if self.animating() {
            cmds.push(Cmd::tick(Duration::from_millis(ANIMATION_INTERVAL_MS)));
        }
        if cmds.is_empty() {
            return Cmd::None;
        }
        Cmd::batch(cmds)
    }

    fn finish(&mut self, action: ExitAction) -> Cmd<Msg> {
        let mut event = LogEvent::new("exit", action.kind());
        match &action {
            ExitAction::Quit => {}
            ExitAction::Open(spec) => {
                event = event
                    .with_data(
                        "dir",
                        Value::from(spec.dir_path.to_string_lossy().to_string()),
                    )
                    .with_data("tool", Value::from(spec.tool.clone()));
            }
            ExitAction::Attach(session) => {
                event = event.with_data("session", Value::from(session.name.clone()));
            }
        }
        self.event_log.log(event);

        if let Ok(mut slot) = self.exit.lock() {
            *slot = Some(action);
        }
        Cmd::Quit
    }

    pub(super) fn animating(&self) -> bool {
        matches!(self.model.mode, Mode::Loading | Mode::ToolStarting)
    }

    fn advance_animation(&mut self) -> Cmd<Msg> {
        if !self.animating() {
            return Cmd::None;
        }
        self.animation_frame = self.animation_frame.wrapping_add(1);
        Cmd::tick(Duration::from_millis(ANIMATION_INTERVAL_MS))
    }
}

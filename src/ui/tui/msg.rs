use super::*;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Msg {
    Key(KeyEvent),
    Tick,
    Core(CoreMsg),
    Noop,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        match event {
            Event::Key(key_event) => Self::Key(key_event),
            Event::Tick => Self::Tick,
            _ => Self::Noop,
        }
    }
}

impl From<CoreMsg> for Msg {
    fn from(msg: CoreMsg) -> Self {
        Self::Core(msg)
    }
}

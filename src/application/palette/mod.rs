mod keys;
mod model;
mod msg;
mod update;

pub use model::{Mode, Model, Theme, WarmStart, clean_path, looks_like_path};
pub use msg::{Effect, KeyAction, Msg};
pub use update::{KeyOutcome, handle_key, init, query_changed, update};

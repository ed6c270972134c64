mod config;
mod controller;
mod history;
mod keys;

pub use config::{SessionConfig, SessionConfigBuilder, SessionConfigBuilderError};
pub use controller::{Action, KeyEvent, Selected, Session};
pub use history::{CommitEntry, History};
pub use keys::key_to_action;

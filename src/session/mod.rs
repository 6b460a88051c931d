pub mod keys;
pub mod state;
pub mod transition;

pub use keys::{event_from_key, parse_scripted_keys};
pub use state::{Exchange, Mode, SessionState, HELP_INPUT, HELP_RUNNING, HELP_VIEWING};
pub use transition::{
    reduce, CycleDirection, DispatchRequest, InputEdit, RunCompletion, SessionEffect,
    SessionEvent,
};

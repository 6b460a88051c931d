pub mod runtime;
pub mod terminal;
pub mod view;

pub use runtime::{run_scripted, ActionHost, Flow, SessionExit, SessionRuntime};
pub use terminal::{run_session_tui, TerminalHost};

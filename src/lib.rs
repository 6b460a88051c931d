pub mod app;
pub mod clipboard;
pub mod config;
pub mod options;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod shared;
pub mod shell;
pub mod tui;

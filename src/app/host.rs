use crate::clipboard::copy_to_clipboard;
use crate::shell::run_shell_command;
use crate::tui::ActionHost;

/// Action host for runs without a terminal UI: one-shot prompts and scripted sessions.
#[derive(Debug, Default)]
pub struct DirectHost;

impl ActionHost for DirectHost {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        copy_to_clipboard(text).map_err(|err| err.to_string())
    }

    fn run_shell(&mut self, command: &str) -> Result<(), String> {
        run_shell_command(command)
    }
}

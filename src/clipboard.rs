use crate::provider::is_binary_available;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("{command} failed: {reason}")]
    Command { command: String, reason: String },
    #[error("clipboard unavailable: {0}. Install xclip/xsel on Linux")]
    Unavailable(String),
}

/// Clipboard helpers tried before the in-process clipboard. External tools keep
/// ownership of the selection after this process exits, which an in-process X11
/// clipboard does not.
const CLIPBOARD_COMMANDS: [(&str, &[&str]); 4] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Tries each installed helper in turn, then the in-process clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let helpers = CLIPBOARD_COMMANDS
        .iter()
        .copied()
        .filter(|(command, _)| helper_applies(command) && is_binary_available(command));
    let helper_error = match pipe_to_first_working(helpers, text) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    copy_in_process(text).map_err(|err| match helper_error {
        Some(helper_error) => ClipboardError::Unavailable(format!("{helper_error}; {err}")),
        None => ClipboardError::Unavailable(err),
    })
}

/// wl-copy only works inside a Wayland session.
fn helper_applies(command: &str) -> bool {
    command != "wl-copy" || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

/// Returns the last helper failure, or `None` when there was nothing to try.
fn pipe_to_first_working<'a>(
    helpers: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    text: &str,
) -> Result<(), Option<ClipboardError>> {
    let mut last_error = None;
    for (command, args) in helpers {
        match pipe_to_command(command, args, text) {
            Ok(()) => return Ok(()),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error)
}

fn copy_in_process(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_text(text.to_string())
        .map_err(|err| err.to_string())
}

fn pipe_to_command(command: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let failure = |reason: String| ClipboardError::Command {
        command: command.to_string(),
        reason,
    };
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| failure(err.to_string()))?;
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(text.as_bytes()) {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(failure(err.to_string()));
        }
    }
    let status = child.wait().map_err(|err| failure(err.to_string()))?;
    if !status.success() {
        return Err(failure(format!("exit status {status}")));
    }
    Ok(())
}

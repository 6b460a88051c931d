use std::process::Command;

/// Runs `command` through `sh -c` with this process's stdin, stdout and stderr.
/// Callers must release the terminal first.
pub fn run_shell_command(command: &str) -> Result<(), String> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .map_err(|err| format!("failed to start sh: {err}"))?;
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(format!("exit status {code}")),
        None => Err("terminated by signal".to_string()),
    }
}

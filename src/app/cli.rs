use crate::provider::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    Clipboard,
    Exec,
}

impl OutputTarget {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "stdout" => Ok(Self::Stdout),
            "clipboard" => Ok(Self::Clipboard),
            "exec" => Ok(Self::Exec),
            other => Err(format!(
                "invalid --output `{other}`; expected stdout, clipboard, or exec"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub cli: Option<Backend>,
    pub prompt: Option<String>,
    /// Zero-based; the flag itself is 1-based.
    pub select: usize,
    pub output: OutputTarget,
    pub timeout_secs: Option<u64>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            cli: None,
            prompt: None,
            select: 0,
            output: OutputTarget::Stdout,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Version,
    Session(CliOptions),
}

pub fn parse_cli_args(args: &[String]) -> Result<CliCommand, String> {
    let mut options = CliOptions::default();
    let mut saw_select = false;
    let mut saw_output = false;
    let mut index = 0;
    while index < args.len() {
        let (flag, inline) = match args[index].split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (args[index].as_str(), None),
        };
        match flag {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "--cli" | "--prompt" | "--select" | "--output" | "--timeout" => {
                let value = match inline {
                    Some(value) => value,
                    None => {
                        index += 1;
                        args.get(index)
                            .cloned()
                            .ok_or_else(|| format!("missing value for {flag}\n\n{}", help_text()))?
                    }
                };
                apply_flag(&mut options, flag, &value)?;
                saw_select |= flag == "--select";
                saw_output |= flag == "--output";
            }
            other => return Err(format!("unknown argument `{other}`\n\n{}", help_text())),
        }
        index += 1;
    }

    if options.prompt.is_none() && (saw_select || saw_output) {
        return Err("--select and --output require --prompt".to_string());
    }
    Ok(CliCommand::Session(options))
}

fn apply_flag(options: &mut CliOptions, flag: &str, value: &str) -> Result<(), String> {
    match flag {
        "--cli" => {
            let backend = Backend::try_from(value).map_err(|err| err.to_string())?;
            options.cli = Some(backend);
        }
        "--prompt" => {
            if value.trim().is_empty() {
                return Err("--prompt must not be empty".to_string());
            }
            options.prompt = Some(value.to_string());
        }
        "--select" => {
            let position = value
                .parse::<usize>()
                .ok()
                .filter(|position| *position > 0)
                .ok_or_else(|| format!("invalid --select `{value}`; expected a number from 1"))?;
            options.select = position - 1;
        }
        "--output" => options.output = OutputTarget::parse(value)?,
        "--timeout" => {
            let secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| format!("invalid --timeout `{value}`; expected seconds > 0"))?;
            options.timeout_secs = Some(secs);
        }
        _ => {}
    }
    Ok(())
}

pub fn version_text() -> String {
    format!("instassist {}", env!("CARGO_PKG_VERSION"))
}

pub fn help_text() -> String {
    [
        "instassist: ask an AI CLI for options and copy or run one",
        "",
        "Usage: instassist [flags]",
        "",
        "Flags:",
        "  --cli <name>           Backend to start with (codex, claude, gemini, opencode)",
        "  --prompt <text>        Run once without the TUI and print the chosen option",
        "  --select <n>           Option to pick with --prompt, 1 is the top ranked (default 1)",
        "  --output <target>      What --prompt does with the option: stdout, clipboard, exec",
        "  --timeout <secs>       Per-run deadline (default 300)",
        "  -V, --version          Print version",
        "  -h, --help             Print this help",
        "",
        "Config: ~/.instassist/config.yaml   Log: ~/.instassist/logs/instassist.log",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn no_arguments_starts_an_interactive_session() {
        assert_eq!(
            parse_cli_args(&[]),
            Ok(CliCommand::Session(CliOptions::default()))
        );
    }

    #[test]
    fn prompt_flags_parse_in_both_forms() {
        let parsed = parse_cli_args(&args(&[
            "--cli",
            "Claude",
            "--prompt=list files",
            "--select",
            "2",
            "--output=exec",
            "--timeout",
            "30",
        ]))
        .expect("parse");
        let CliCommand::Session(options) = parsed else {
            panic!("expected session");
        };
        assert_eq!(options.cli, Some(Backend::Claude));
        assert_eq!(options.prompt.as_deref(), Some("list files"));
        assert_eq!(options.select, 1);
        assert_eq!(options.output, OutputTarget::Exec);
        assert_eq!(options.timeout_secs, Some(30));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_cli_args(&args(&["--cli", "bard"])).is_err());
        assert!(parse_cli_args(&args(&["--prompt", "x", "--select", "0"])).is_err());
        assert!(parse_cli_args(&args(&["--prompt", "x", "--output", "file"])).is_err());
        assert!(parse_cli_args(&args(&["--timeout", "0"])).is_err());
        assert!(parse_cli_args(&args(&["--prompt"])).is_err());
    }

    #[test]
    fn select_without_prompt_is_rejected() {
        let err = parse_cli_args(&args(&["--select", "2"])).expect_err("should fail");
        assert!(err.contains("require --prompt"));
    }

    #[test]
    fn unknown_argument_includes_help() {
        let err = parse_cli_args(&args(&["--verbose"])).expect_err("should fail");
        assert!(err.contains("unknown argument `--verbose`"));
        assert!(err.contains("Usage: instassist"));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(
            parse_cli_args(&args(&["--help", "--bogus"])),
            Ok(CliCommand::Help)
        );
        assert_eq!(parse_cli_args(&args(&["-V"])), Ok(CliCommand::Version));
        assert!(version_text().starts_with("instassist "));
    }
}

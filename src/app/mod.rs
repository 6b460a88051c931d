pub mod cli;
pub mod host;
pub mod oneshot;

use crate::app::cli::{help_text, parse_cli_args, version_text, CliCommand, CliOptions};
use crate::app::host::DirectHost;
use crate::app::oneshot::{run_once, OneShotRequest};
use crate::config::{default_state_root, load_global_settings, log_path, Settings};
use crate::prompt::resolve_schema_path;
use crate::provider::{Backend, RunnerRegistry};
use crate::session::{parse_scripted_keys, SessionState};
use crate::shared::logging::EventLog;
use crate::tui::{run_scripted, run_session_tui, SessionExit, SessionRuntime};
use std::io::{self, IsTerminal};
use std::time::Duration;

/// Key script for driving a session without a terminal, e.g. `l,s,enter,enter`.
pub const SCRIPT_KEYS_ENV: &str = "INSTASSIST_SCRIPT_KEYS";

/// Entry point behind the binary. The returned text is printed on success.
pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let options = match parse_cli_args(&args)? {
        CliCommand::Help => return Ok(help_text()),
        CliCommand::Version => return Ok(version_text()),
        CliCommand::Session(options) => options,
    };

    let settings = load_global_settings().map_err(|err| err.to_string())?;
    let log = event_log(&settings);
    let timeout = options
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.timeout());
    let registry = build_registry(&settings, &options, &log)?;

    if let Some(prompt) = options.prompt.as_deref() {
        let request = OneShotRequest {
            prompt,
            select: options.select,
            output: options.output,
            timeout,
        };
        return run_once(&registry, request, &mut DirectHost, &log);
    }

    let state = SessionState::new(registry);
    let exit = match std::env::var(SCRIPT_KEYS_ENV) {
        Ok(raw) => {
            let keys = parse_scripted_keys(&raw)
                .map_err(|err| format!("invalid {SCRIPT_KEYS_ENV}: {err}"))?;
            let mut runtime = SessionRuntime::new(DirectHost, timeout, log.clone());
            let (_, exit) = run_scripted(&mut runtime, state, keys);
            exit
        }
        Err(_) => {
            if !(io::stdin().is_terminal() && io::stdout().is_terminal()) {
                return Err(
                    "interactive mode needs a terminal; use --prompt for non-interactive runs"
                        .to_string(),
                );
            }
            run_session_tui(state, timeout, log.clone())?
        }
    };
    log.info("session.ended", exit_label(&exit));
    Ok(exit.summary())
}

fn event_log(settings: &Settings) -> EventLog {
    if !settings.log_enabled {
        return EventLog::disabled();
    }
    match default_state_root() {
        Ok(root) => EventLog::to_file(log_path(&root)),
        Err(_) => EventLog::disabled(),
    }
}

fn build_registry(
    settings: &Settings,
    options: &CliOptions,
    log: &EventLog,
) -> Result<RunnerRegistry, String> {
    let schema_path = resolve_schema_path().map_err(|err| err.to_string())?;
    let mut registry = RunnerRegistry::discover(&settings.runner_binaries(), schema_path)
        .map_err(|err| {
            log.error("startup.no_backends", &err.to_string());
            err.to_string()
        })?;

    let available = registry
        .runners()
        .iter()
        .map(|runner| runner.backend.as_str())
        .collect::<Vec<_>>()
        .join(",");
    log.info("startup", &format!("available={available}"));

    let preferred = match options.cli {
        Some(backend) => Some(backend),
        None => settings
            .default_cli
            .as_deref()
            .and_then(|name| Backend::try_from(name).ok()),
    };
    if let Some(backend) = preferred {
        if !registry.select_by_name(backend.as_str()) {
            if options.cli.is_some() {
                return Err(format!(
                    "{backend} is not installed; available: {available}"
                ));
            }
            log.warn(
                "startup.default_cli_unavailable",
                &format!("{backend} not found, using {}", registry.current().backend),
            );
        }
    }
    Ok(registry)
}

fn exit_label(exit: &SessionExit) -> &'static str {
    match exit {
        SessionExit::Copied(_) => "copied",
        SessionExit::Executed(_) => "executed",
        SessionExit::Quit => "quit",
    }
}

use crate::app::cli::OutputTarget;
use crate::prompt::build_prompt;
use crate::provider::{CancelToken, RunnerRegistry};
use crate::session::Exchange;
use crate::shared::logging::EventLog;
use crate::tui::ActionHost;
use std::time::Duration;

pub struct OneShotRequest<'a> {
    pub prompt: &'a str,
    pub select: usize,
    pub output: OutputTarget,
    pub timeout: Duration,
}

/// Runs one prompt on the active backend and hands the chosen option to `output`.
/// Run and parse failures come back as errors that carry the raw output.
pub fn run_once<H: ActionHost>(
    registry: &RunnerRegistry,
    request: OneShotRequest<'_>,
    host: &mut H,
    log: &EventLog,
) -> Result<String, String> {
    let backend = registry.current().backend;
    log.info(
        "run.dispatched",
        &format!("backend={backend} mode=oneshot"),
    );
    let result = registry.invoke(
        registry.active_index(),
        &build_prompt(request.prompt),
        request.timeout,
        &CancelToken::new(),
    );
    let exchange = Exchange::from_run(
        backend,
        request.prompt,
        &result.output_text(),
        result.error.map(|err| err.to_string()),
    );

    if let Some(err) = &exchange.run_error {
        log.warn("run.failed", &format!("backend={backend} error={err}"));
        return Err(with_raw_output(err, &exchange.raw_output));
    }
    if let Some(err) = &exchange.parse_error {
        log.warn("parse.failed", &format!("backend={backend} error={err}"));
        return Err(with_raw_output(&err.to_string(), &exchange.raw_output));
    }
    log.info(
        "run.completed",
        &format!("backend={backend} options={}", exchange.options.len()),
    );

    let option = exchange.options.get(request.select).ok_or_else(|| {
        format!(
            "option {} requested but {backend} returned {}",
            request.select + 1,
            exchange.options.len()
        )
    })?;

    match request.output {
        OutputTarget::Stdout => Ok(option.value.clone()),
        OutputTarget::Clipboard => {
            host.copy_to_clipboard(&option.value).map_err(|err| {
                log.warn("clipboard.failed", &err);
                format!("copy failed: {err}")
            })?;
            Ok(format!("copied to clipboard: {}", option.value))
        }
        OutputTarget::Exec => {
            log.info("exec.started", &option.value);
            host.run_shell(&option.value).map_err(|err| {
                log.warn("exec.failed", &err);
                format!("exec failed: {err}")
            })?;
            Ok(String::new())
        }
    }
}

fn with_raw_output(problem: &str, raw: &str) -> String {
    if raw.is_empty() || raw == problem {
        problem.to_string()
    } else {
        format!("{problem}\n{raw}")
    }
}

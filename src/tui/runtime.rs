use crate::provider::{Backend, CancelToken};
use crate::session::{
    event_from_key, reduce, DispatchRequest, RunCompletion, SessionEffect, SessionEvent,
    SessionState,
};
use crate::shared::logging::EventLog;
use crossterm::event::KeyEvent;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// Performs the actions that leave the session: clipboard writes and shell runs.
pub trait ActionHost {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String>;
    fn run_shell(&mut self, command: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    Copied(String),
    Executed(String),
    Quit,
}

impl SessionExit {
    pub fn summary(&self) -> String {
        match self {
            SessionExit::Copied(value) => format!("copied to clipboard: {value}"),
            SessionExit::Executed(_) | SessionExit::Quit => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(SessionExit),
}

struct InFlightRun {
    backend: Backend,
    result_rx: Receiver<RunCompletion>,
    cancel: CancelToken,
}

/// Executes reducer effects. Owns the at-most-one in-flight backend run.
pub struct SessionRuntime<H: ActionHost> {
    host: H,
    in_flight: Option<InFlightRun>,
    timeout: Duration,
    log: EventLog,
}

impl<H: ActionHost> SessionRuntime<H> {
    pub fn new(host: H, timeout: Duration, log: EventLog) -> Self {
        Self {
            host,
            in_flight: None,
            timeout,
            log,
        }
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies `event` and every follow-up event its effects produce.
    pub fn step(&mut self, state: SessionState, event: SessionEvent) -> (SessionState, Flow) {
        let mut state = state;
        let mut next = Some(event);
        let mut pending_exit = SessionExit::Quit;

        while let Some(event) = next.take() {
            let completion = matches!(event, SessionEvent::RunCompleted(_));
            let (updated, effect) = reduce(state, event);
            state = updated;
            if completion {
                self.log_parse_failure(&state);
            }
            match effect {
                SessionEffect::None => {}
                SessionEffect::Dispatch(request) => self.dispatch(&state, request),
                SessionEffect::CopyToClipboard(value) => {
                    let result = self.host.copy_to_clipboard(&value);
                    if let Err(err) = &result {
                        self.log.warn("clipboard.failed", err);
                    }
                    pending_exit = SessionExit::Copied(value);
                    next = Some(SessionEvent::ClipboardResult(result));
                }
                SessionEffect::RunShell(command) => {
                    self.log.info("exec.started", &command);
                    let result = self.host.run_shell(&command);
                    if let Err(err) = &result {
                        self.log.warn("exec.failed", err);
                    }
                    pending_exit = SessionExit::Executed(command);
                    next = Some(SessionEvent::ShellResult(result));
                }
                SessionEffect::Quit => {
                    self.cancel_in_flight();
                    return (state, Flow::Exit(pending_exit));
                }
            }
        }
        (state, Flow::Continue)
    }

    pub fn step_key(&mut self, state: SessionState, key: KeyEvent) -> (SessionState, Flow) {
        match event_from_key(state.mode, key) {
            Some(event) => self.step(state, event),
            None => (state, Flow::Continue),
        }
    }

    fn dispatch(&mut self, state: &SessionState, request: DispatchRequest) {
        self.log.info(
            "run.dispatched",
            &format!("backend={} prompt_bytes={}", request.backend, request.prompt.len()),
        );
        let registry = state.registry.clone();
        let timeout = self.timeout;
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let backend = request.backend;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = registry.invoke(
                request.runner_index,
                &request.prompt,
                timeout,
                &worker_cancel,
            );
            let _ = tx.send(RunCompletion {
                backend: request.backend,
                output: result.output_text(),
                error: result.error.map(|err| err.to_string()),
            });
        });
        self.in_flight = Some(InFlightRun {
            backend,
            result_rx: rx,
            cancel,
        });
    }

    /// Non-blocking check for the in-flight run's completion.
    pub fn poll_completion(&mut self) -> Option<SessionEvent> {
        let worker = self.in_flight.take()?;
        match worker.result_rx.try_recv() {
            Ok(completion) => Some(self.completed(completion)),
            Err(TryRecvError::Empty) => {
                self.in_flight = Some(worker);
                None
            }
            Err(TryRecvError::Disconnected) => Some(self.worker_lost(worker.backend)),
        }
    }

    /// Blocks up to `limit` for the in-flight run's completion.
    pub fn wait_completion(&mut self, limit: Duration) -> Option<SessionEvent> {
        let worker = self.in_flight.take()?;
        match worker.result_rx.recv_timeout(limit) {
            Ok(completion) => Some(self.completed(completion)),
            Err(RecvTimeoutError::Timeout) => {
                self.in_flight = Some(worker);
                None
            }
            Err(RecvTimeoutError::Disconnected) => Some(self.worker_lost(worker.backend)),
        }
    }

    fn completed(&self, completion: RunCompletion) -> SessionEvent {
        match &completion.error {
            Some(err) => self.log.warn(
                "run.failed",
                &format!("backend={} error={err}", completion.backend),
            ),
            None => self.log.info(
                "run.completed",
                &format!(
                    "backend={} output_bytes={}",
                    completion.backend,
                    completion.output.len()
                ),
            ),
        }
        SessionEvent::RunCompleted(completion)
    }

    fn log_parse_failure(&self, state: &SessionState) {
        if let Some(exchange) = &state.exchange {
            if let Some(err) = &exchange.parse_error {
                self.log.warn(
                    "parse.failed",
                    &format!("backend={} error={err}", exchange.backend),
                );
            }
        }
    }

    fn worker_lost(&self, backend: Backend) -> SessionEvent {
        self.log.error("run.worker_lost", "run worker disconnected unexpectedly");
        SessionEvent::RunCompleted(RunCompletion {
            backend,
            output: String::new(),
            error: Some("run worker disconnected unexpectedly".to_string()),
        })
    }

    /// Signals the in-flight child to be killed and stops listening for it. The
    /// worker thread is left to finish on its own.
    pub fn cancel_in_flight(&mut self) {
        if let Some(worker) = self.in_flight.take() {
            worker.cancel.cancel();
            self.log.info("run.cancelled", "session ended while a run was in flight");
        }
    }
}

const SCRIPTED_WAIT_SLICE: Duration = Duration::from_millis(50);

/// Drives a session from a fixed key script without a terminal. Each key waits
/// for any in-flight run to finish first, so scripts read in the order a user
/// would type them. Running out of keys ends the session as a plain quit.
pub fn run_scripted<H: ActionHost>(
    runtime: &mut SessionRuntime<H>,
    state: SessionState,
    keys: Vec<KeyEvent>,
) -> (SessionState, SessionExit) {
    let mut state = state;
    for key in keys {
        let (settled, flow) = settle(runtime, state);
        if let Flow::Exit(exit) = flow {
            return (settled, exit);
        }
        let (next, flow) = runtime.step_key(settled, key);
        state = next;
        if let Flow::Exit(exit) = flow {
            return (state, exit);
        }
    }
    let (state, flow) = settle(runtime, state);
    runtime.cancel_in_flight();
    match flow {
        Flow::Exit(exit) => (state, exit),
        Flow::Continue => (state, SessionExit::Quit),
    }
}

fn settle<H: ActionHost>(
    runtime: &mut SessionRuntime<H>,
    mut state: SessionState,
) -> (SessionState, Flow) {
    while runtime.is_running() {
        if let Some(event) = runtime.wait_completion(SCRIPTED_WAIT_SLICE) {
            let (next, flow) = runtime.step(state, event);
            state = next;
            if let Flow::Exit(_) = flow {
                return (state, flow);
            }
        }
    }
    (state, Flow::Continue)
}

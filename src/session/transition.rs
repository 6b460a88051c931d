use crate::options::clean_text;
use crate::prompt::build_prompt;
use crate::provider::Backend;
use crate::session::state::{Exchange, Mode, SessionState, HELP_INPUT, HELP_VIEWING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEdit {
    Insert(char),
    InsertText(String),
    Newline,
    Backspace,
}

/// Result of one backend run as reported by the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCompletion {
    pub backend: Backend,
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Edit(InputEdit),
    Submit { auto_execute: bool },
    CycleRunner(CycleDirection),
    RunCompleted(RunCompletion),
    MoveSelection(isize),
    Copy,
    Run,
    Reset,
    ClipboardResult(Result<(), String>),
    ShellResult(Result<(), String>),
    Tick,
    Quit,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::Edit(_) => "edit",
            SessionEvent::Submit { .. } => "submit",
            SessionEvent::CycleRunner(_) => "cycle_runner",
            SessionEvent::RunCompleted(_) => "run_completed",
            SessionEvent::MoveSelection(_) => "move_selection",
            SessionEvent::Copy => "copy",
            SessionEvent::Run => "run",
            SessionEvent::Reset => "reset",
            SessionEvent::ClipboardResult(_) => "clipboard_result",
            SessionEvent::ShellResult(_) => "shell_result",
            SessionEvent::Tick => "tick",
            SessionEvent::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub runner_index: usize,
    pub backend: Backend,
    pub prompt: String,
}

/// Side effect requested by a transition. The event loop performs it and reports
/// back through another event where the outcome matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    Dispatch(DispatchRequest),
    CopyToClipboard(String),
    RunShell(String),
    Quit,
}

/// Applies one event. Events that do not apply to the current mode leave the
/// state untouched and request nothing.
pub fn reduce(mut state: SessionState, event: SessionEvent) -> (SessionState, SessionEffect) {
    let effect = match event {
        SessionEvent::Quit => SessionEffect::Quit,
        SessionEvent::CycleRunner(direction) => {
            match direction {
                CycleDirection::Next => state.registry.cycle_next(),
                CycleDirection::Prev => state.registry.cycle_prev(),
            }
            state.status = format!("using {} • {}", state.backend_name(), state.mode.help_text());
            SessionEffect::None
        }
        SessionEvent::Tick => {
            if state.mode == Mode::Running {
                state.spinner_frame = state.spinner_frame.wrapping_add(1);
            }
            SessionEffect::None
        }
        SessionEvent::Edit(edit) if state.mode == Mode::Composing => {
            apply_edit(&mut state.input, edit);
            SessionEffect::None
        }
        SessionEvent::Submit { auto_execute } if state.mode == Mode::Composing => {
            submit(&mut state, auto_execute)
        }
        SessionEvent::RunCompleted(completion) if state.mode == Mode::Running => {
            complete(&mut state, completion)
        }
        SessionEvent::MoveSelection(delta) if state.mode == Mode::Reviewing => {
            let count = state.options().len();
            if count > 0 {
                let count = count as isize;
                state.selected = (state.selected as isize + delta).rem_euclid(count) as usize;
            }
            SessionEffect::None
        }
        SessionEvent::Copy if state.mode == Mode::Reviewing => match state.action_target() {
            Some(value) => SessionEffect::CopyToClipboard(value),
            None => {
                state.status = format!("nothing to copy • {HELP_VIEWING}");
                SessionEffect::None
            }
        },
        SessionEvent::Run if state.mode == Mode::Reviewing => match state.action_target() {
            Some(value) => {
                state.status = format!("running: {}", clean_text(&value));
                SessionEffect::RunShell(value)
            }
            None => {
                state.status = format!("nothing to run • {HELP_VIEWING}");
                SessionEffect::None
            }
        },
        SessionEvent::Reset if state.mode == Mode::Reviewing => {
            state.mode = Mode::Composing;
            state.input.clear();
            state.exchange = None;
            state.selected = 0;
            state.auto_execute = false;
            state.status = HELP_INPUT.to_string();
            SessionEffect::None
        }
        SessionEvent::ClipboardResult(result) if state.mode == Mode::Reviewing => match result {
            Ok(()) => {
                state.status = "copied to clipboard".to_string();
                SessionEffect::Quit
            }
            Err(err) => {
                state.status = format!("copy failed: {err} • {HELP_VIEWING}");
                SessionEffect::None
            }
        },
        SessionEvent::ShellResult(result) if state.mode == Mode::Reviewing => match result {
            Ok(()) => SessionEffect::Quit,
            Err(err) => {
                state.status = format!("exec failed: {err} • {HELP_VIEWING}");
                SessionEffect::None
            }
        },
        _ => SessionEffect::None,
    };
    (state, effect)
}

fn apply_edit(input: &mut String, edit: InputEdit) {
    match edit {
        InputEdit::Insert(ch) => input.push(ch),
        InputEdit::InsertText(text) => input.push_str(&text),
        InputEdit::Newline => input.push('\n'),
        InputEdit::Backspace => {
            input.pop();
        }
    }
}

fn submit(state: &mut SessionState, auto_execute: bool) -> SessionEffect {
    let user_prompt = state.input.trim_end_matches('\n').to_string();
    if user_prompt.trim().is_empty() {
        state.status = format!("prompt is empty • {HELP_INPUT}");
        return SessionEffect::None;
    }

    let runner_index = state.registry.active_index();
    let backend = state.registry.current().backend;
    state.mode = Mode::Running;
    state.last_prompt = user_prompt.clone();
    state.exchange = None;
    state.selected = 0;
    state.spinner_frame = 0;
    state.auto_execute = auto_execute;
    state.running_backend = Some(backend);
    state.status = format!("running {backend}… • {}", Mode::Running.help_text());

    SessionEffect::Dispatch(DispatchRequest {
        runner_index,
        backend,
        prompt: build_prompt(&user_prompt),
    })
}

fn complete(state: &mut SessionState, completion: RunCompletion) -> SessionEffect {
    let exchange = Exchange::from_run(
        completion.backend,
        &state.last_prompt,
        &completion.output,
        completion.error,
    );
    let auto_execute = std::mem::take(&mut state.auto_execute);
    state.running_backend = None;
    state.mode = Mode::Reviewing;
    state.selected = 0;

    state.status = if exchange.run_error.is_some() {
        format!("error from {} • {HELP_VIEWING}", exchange.backend)
    } else if let Some(err) = &exchange.parse_error {
        format!("parse error: {err} • {HELP_VIEWING}")
    } else {
        HELP_VIEWING.to_string()
    };

    let effect = match exchange.options.first() {
        Some(top) if auto_execute => {
            state.status = format!("running: {}", clean_text(&top.value));
            SessionEffect::RunShell(top.value.clone())
        }
        _ => SessionEffect::None,
    };
    state.exchange = Some(exchange);
    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Runner, RunnerRegistry};
    use std::path::PathBuf;

    const TWO_OPTIONS: &str = r#"Here you go:
{"options":[{"value":"ls","description":"short","recommendation_order":2},{"value":"ls -la","description":"long","recommendation_order":1}]}"#;

    fn state() -> SessionState {
        let registry = RunnerRegistry::from_runners(
            vec![
                Runner {
                    backend: Backend::Codex,
                    binary: "codex".to_string(),
                },
                Runner {
                    backend: Backend::Gemini,
                    binary: "gemini".to_string(),
                },
            ],
            PathBuf::from("/tmp/schema.json"),
        )
        .expect("registry");
        SessionState::new(registry)
    }

    fn typed(text: &str) -> SessionState {
        let mut state = state();
        state.input = text.to_string();
        state
    }

    fn completed(state: SessionState, output: &str) -> (SessionState, SessionEffect) {
        reduce(
            state,
            SessionEvent::RunCompleted(RunCompletion {
                backend: Backend::Codex,
                output: output.to_string(),
                error: None,
            }),
        )
    }

    fn reviewing(output: &str) -> SessionState {
        let (state, _) = reduce(typed("list files"), SessionEvent::Submit { auto_execute: false });
        completed(state, output).0
    }

    #[test]
    fn blank_submit_stays_composing_without_dispatch() {
        let (state, effect) = reduce(typed("  \n "), SessionEvent::Submit { auto_execute: false });
        assert_eq!(state.mode, Mode::Composing);
        assert_eq!(effect, SessionEffect::None);
        assert!(state.status.starts_with("prompt is empty"));
    }

    #[test]
    fn submit_dispatches_wrapped_prompt_to_active_runner() {
        let mut state = typed("list files");
        state.registry.cycle_next();
        let (state, effect) = reduce(state, SessionEvent::Submit { auto_execute: false });

        assert_eq!(state.mode, Mode::Running);
        assert_eq!(state.last_prompt, "list files");
        let SessionEffect::Dispatch(request) = effect else {
            panic!("expected dispatch, got {effect:?}");
        };
        assert_eq!(request.runner_index, 1);
        assert_eq!(request.backend, Backend::Gemini);
        assert_eq!(request.prompt, build_prompt("list files"));
    }

    #[test]
    fn completion_ranks_options_and_selects_first() {
        let state = reviewing(TWO_OPTIONS);
        assert_eq!(state.mode, Mode::Reviewing);
        let values = state
            .options()
            .iter()
            .map(|option| option.value.as_str())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["ls -la", "ls"]);
        assert_eq!(state.selected, 0);
        assert_eq!(state.status, HELP_VIEWING);
    }

    #[test]
    fn selection_wraps_both_ways() {
        let state = reviewing(TWO_OPTIONS);
        let (state, _) = reduce(state, SessionEvent::MoveSelection(-1));
        assert_eq!(state.selected, 1);
        let (state, _) = reduce(state, SessionEvent::MoveSelection(1));
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn malformed_output_copies_raw_text() {
        let state = reviewing("I could not do that.");
        assert_eq!(state.mode, Mode::Reviewing);
        assert!(state.status.starts_with("parse error: no valid options JSON found"));

        let (state, effect) = reduce(state, SessionEvent::MoveSelection(1));
        assert_eq!(state.selected, 0);
        assert_eq!(effect, SessionEffect::None);

        let (_, effect) = reduce(state, SessionEvent::Copy);
        assert_eq!(
            effect,
            SessionEffect::CopyToClipboard("I could not do that.".to_string())
        );
    }

    #[test]
    fn run_without_options_runs_raw_output() {
        let state = reviewing("echo hi");
        let (state, effect) = reduce(state, SessionEvent::Run);
        assert_eq!(effect, SessionEffect::RunShell("echo hi".to_string()));
        assert_eq!(state.status, "running: echo hi");
    }

    #[test]
    fn auto_execute_runs_top_option_right_after_parsing() {
        let (state, _) = reduce(typed("list files"), SessionEvent::Submit { auto_execute: true });
        let (state, effect) = completed(
            state,
            r#"{"options":[{"value":"ls -la","description":"","recommendation_order":1}]}"#,
        );
        assert_eq!(effect, SessionEffect::RunShell("ls -la".to_string()));
        assert!(!state.auto_execute);
    }

    #[test]
    fn auto_execute_without_options_waits_for_the_user() {
        let (state, _) = reduce(typed("list files"), SessionEvent::Submit { auto_execute: true });
        let (state, effect) = completed(state, "nothing useful");
        assert_eq!(effect, SessionEffect::None);
        assert_eq!(state.mode, Mode::Reviewing);
    }

    #[test]
    fn run_error_is_reported_in_status() {
        let (state, _) = reduce(typed("p"), SessionEvent::Submit { auto_execute: false });
        let (state, _) = reduce(
            state,
            SessionEvent::RunCompleted(RunCompletion {
                backend: Backend::Codex,
                output: String::new(),
                error: Some("codex exited with code 1".to_string()),
            }),
        );
        assert!(state.status.starts_with("error from codex"));
        assert_eq!(state.raw_output(), "codex exited with code 1");
    }

    #[test]
    fn events_outside_their_mode_are_ignored() {
        let composing = typed("abc");
        let (state, effect) = reduce(composing.clone(), SessionEvent::Copy);
        assert_eq!(state, composing);
        assert_eq!(effect, SessionEffect::None);

        let (running, _) = reduce(typed("abc"), SessionEvent::Submit { auto_execute: false });
        let (state, _) = reduce(running.clone(), SessionEvent::Edit(InputEdit::Insert('x')));
        assert_eq!(state.input, running.input);
        let (_, effect) = reduce(running, SessionEvent::Submit { auto_execute: false });
        assert_eq!(effect, SessionEffect::None);
    }

    #[test]
    fn cycling_during_a_run_keeps_the_running_backend() {
        let (state, _) = reduce(typed("p"), SessionEvent::Submit { auto_execute: false });
        let (state, _) = reduce(state, SessionEvent::CycleRunner(CycleDirection::Next));
        assert_eq!(state.backend_name(), "gemini");
        assert_eq!(state.backend_in_flight(), "codex");
    }

    #[test]
    fn reset_returns_to_an_empty_prompt() {
        let state = reviewing(TWO_OPTIONS);
        let (state, _) = reduce(state, SessionEvent::Reset);
        assert_eq!(state.mode, Mode::Composing);
        assert!(state.input.is_empty());
        assert!(state.exchange.is_none());
        assert_eq!(state.status, HELP_INPUT);
    }

    #[test]
    fn clipboard_and_shell_results_decide_exit() {
        let state = reviewing(TWO_OPTIONS);
        let (state, effect) = reduce(state, SessionEvent::ClipboardResult(Err("busy".to_string())));
        assert_eq!(effect, SessionEffect::None);
        assert!(state.status.starts_with("copy failed: busy"));

        let (state, effect) = reduce(state, SessionEvent::ShellResult(Err("exit status 2".to_string())));
        assert_eq!(effect, SessionEffect::None);
        assert!(state.status.starts_with("exec failed: exit status 2"));

        let (_, effect) = reduce(state, SessionEvent::ClipboardResult(Ok(())));
        assert_eq!(effect, SessionEffect::Quit);
    }

    #[test]
    fn spinner_only_advances_while_running() {
        let (state, _) = reduce(typed("x"), SessionEvent::Tick);
        assert_eq!(state.spinner_frame, 0);
        let (state, _) = reduce(state, SessionEvent::Submit { auto_execute: false });
        let (state, _) = reduce(state, SessionEvent::Tick);
        assert_eq!(state.spinner_frame, 1);
    }
}

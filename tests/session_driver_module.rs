use instassist::provider::{Backend, Runner, RunnerRegistry};
use instassist::session::{parse_scripted_keys, Mode, SessionEvent, SessionState};
use instassist::shared::logging::EventLog;
use instassist::tui::{run_scripted, ActionHost, Flow, SessionExit, SessionRuntime};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const LS_REPLY: &str = r#"{"options":[{"value":"ls -la","description":"long listing","recommendation_order":1},{"value":"ls","description":"plain","recommendation_order":2}]}"#;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

#[derive(Default)]
struct RecordingHost {
    copied: Vec<String>,
    executed: Vec<String>,
}

impl ActionHost for RecordingHost {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        self.copied.push(text.to_string());
        Ok(())
    }

    fn run_shell(&mut self, command: &str) -> Result<(), String> {
        self.executed.push(command.to_string());
        Ok(())
    }
}

fn session_with(dir: &Path, backend: Backend, body: &str) -> SessionState {
    let bin = dir.join(format!("{}-mock", backend.as_str()));
    write_script(&bin, body);
    let registry = RunnerRegistry::from_runners(
        vec![Runner {
            backend,
            binary: bin.display().to_string(),
        }],
        dir.join("options.schema.json"),
    )
    .expect("registry");
    SessionState::new(registry)
}

fn runtime(log: EventLog) -> SessionRuntime<RecordingHost> {
    SessionRuntime::new(RecordingHost::default(), Duration::from_secs(10), log)
}

#[test]
fn prompt_to_reviewing_lists_ranked_options() {
    let dir = tempdir().expect("tempdir");
    let state = session_with(
        dir.path(),
        Backend::Claude,
        &format!("#!/bin/sh\necho 'Sure!'\necho '{LS_REPLY}'\n"),
    );
    let mut runtime = runtime(EventLog::disabled());

    let keys = parse_scripted_keys("l,i,s,t,space,f,i,l,e,s,enter").expect("keys");
    let (state, exit) = run_scripted(&mut runtime, state, keys);

    assert_eq!(exit, SessionExit::Quit);
    assert_eq!(state.mode, Mode::Reviewing);
    assert_eq!(state.last_prompt, "list files");
    let values = state
        .options()
        .iter()
        .map(|option| option.value.as_str())
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["ls -la", "ls"]);
    assert_eq!(state.selected, 0);
}

#[test]
fn selecting_second_option_and_copying_exits_with_it() {
    let dir = tempdir().expect("tempdir");
    let state = session_with(
        dir.path(),
        Backend::Codex,
        &format!("#!/bin/sh\ncat > /dev/null\necho '{LS_REPLY}'\n"),
    );
    let mut runtime = runtime(EventLog::disabled());

    let keys = parse_scripted_keys("l,s,enter,down,enter").expect("keys");
    let (_, exit) = run_scripted(&mut runtime, state, keys);

    assert_eq!(exit, SessionExit::Copied("ls".to_string()));
    assert_eq!(runtime.host_mut().copied, vec!["ls".to_string()]);
}

#[test]
fn ctrl_r_submit_executes_top_option_without_review() {
    let dir = tempdir().expect("tempdir");
    let state = session_with(
        dir.path(),
        Backend::Gemini,
        &format!("#!/bin/sh\necho '{LS_REPLY}'\n"),
    );
    let mut runtime = runtime(EventLog::disabled());

    let keys = parse_scripted_keys("l,s,ctrl-r").expect("keys");
    let (_, exit) = run_scripted(&mut runtime, state, keys);

    assert_eq!(exit, SessionExit::Executed("ls -la".to_string()));
    assert_eq!(runtime.host_mut().executed, vec!["ls -la".to_string()]);
    assert!(runtime.host_mut().copied.is_empty());
}

#[test]
fn failing_backend_output_can_be_copied_raw() {
    let dir = tempdir().expect("tempdir");
    let state = session_with(
        dir.path(),
        Backend::Opencode,
        "#!/bin/sh\necho 'rate limited' >&2\nexit 2\n",
    );
    let mut runtime = runtime(EventLog::disabled());

    let keys = parse_scripted_keys("x,enter").expect("keys");
    let (state, _) = run_scripted(&mut runtime, state, keys);
    assert!(state.status.starts_with("error from opencode"));
    assert_eq!(state.raw_output(), "rate limited");

    let keys = parse_scripted_keys("enter").expect("keys");
    let (_, exit) = run_scripted(&mut runtime, state, keys);
    assert_eq!(exit, SessionExit::Copied("rate limited".to_string()));
}

#[test]
fn new_prompt_after_review_starts_a_fresh_exchange() {
    let dir = tempdir().expect("tempdir");
    let state = session_with(
        dir.path(),
        Backend::Claude,
        &format!("#!/bin/sh\necho '{LS_REPLY}'\n"),
    );
    let mut runtime = runtime(EventLog::disabled());

    let keys = parse_scripted_keys("a,enter,alt-enter,b,enter").expect("keys");
    let (state, _) = run_scripted(&mut runtime, state, keys);
    assert_eq!(state.mode, Mode::Reviewing);
    assert_eq!(state.last_prompt, "b");
}

#[test]
fn quitting_mid_run_cancels_the_backend() {
    let dir = tempdir().expect("tempdir");
    let marker = dir.path().join("finished");
    let state = session_with(
        dir.path(),
        Backend::Claude,
        &format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
    );
    let mut runtime = runtime(EventLog::disabled());

    let mut state = state;
    state.input = "slow".to_string();
    let (state, flow) = runtime.step(state, SessionEvent::Submit { auto_execute: false });
    assert_eq!(flow, Flow::Continue);
    assert_eq!(state.mode, Mode::Running);
    assert!(runtime.is_running());

    let (_, flow) = runtime.step(state, SessionEvent::Quit);
    assert_eq!(flow, Flow::Exit(SessionExit::Quit));
    assert!(!runtime.is_running());

    thread::sleep(Duration::from_millis(1500));
    assert!(!marker.exists());
}

#[test]
fn session_events_are_logged_as_json_lines() {
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join("logs/instassist.log");
    let state = session_with(dir.path(), Backend::Claude, "#!/bin/sh\necho 'no json'\n");
    let mut runtime = runtime(EventLog::to_file(log_path.clone()));

    let keys = parse_scripted_keys("q,enter").expect("keys");
    let _ = run_scripted(&mut runtime, state, keys);

    let events = fs::read_to_string(&log_path)
        .expect("log")
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().unwrap_or_default().to_string()
        })
        .collect::<Vec<_>>();
    assert_eq!(
        events,
        vec!["run.dispatched", "run.completed", "parse.failed"]
    );
}

use crate::clipboard::copy_to_clipboard;
use crate::session::{InputEdit, Mode, SessionEvent, SessionState};
use crate::shared::logging::EventLog;
use crate::shell::run_shell_command;
use crate::tui::runtime::{ActionHost, Flow, SessionExit, SessionRuntime};
use crate::tui::view::render;
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const UI_POLL_INTERVAL: Duration = Duration::from_millis(40);
const SPINNER_TICK_INTERVAL: Duration = Duration::from_millis(80);

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal for the session. A shell command needs the real screen, so
/// the terminal is released before it runs and taken back if it fails.
pub struct TerminalHost {
    terminal: Option<TuiTerminal>,
}

impl TerminalHost {
    pub fn open() -> Result<Self, String> {
        Ok(Self {
            terminal: Some(setup_terminal()?),
        })
    }

    fn draw(&mut self, state: &SessionState) -> Result<(), String> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        terminal
            .draw(|frame| render(frame, state))
            .map_err(|e| format!("failed to render session UI: {e}"))?;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), String> {
        match self.terminal.take() {
            Some(mut terminal) => teardown_terminal(&mut terminal),
            None => Ok(()),
        }
    }

    fn resume(&mut self) -> Result<(), String> {
        if self.terminal.is_none() {
            let mut terminal = setup_terminal()?;
            terminal
                .clear()
                .map_err(|e| format!("failed to clear terminal: {e}"))?;
            self.terminal = Some(terminal);
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<(), String> {
        self.suspend()
    }
}

impl ActionHost for TerminalHost {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        copy_to_clipboard(text).map_err(|err| err.to_string())
    }

    fn run_shell(&mut self, command: &str) -> Result<(), String> {
        self.suspend()?;
        let result = run_shell_command(command);
        if result.is_err() {
            self.resume()?;
        }
        result
    }
}

/// Runs the interactive session until the user quits, copies, or executes.
pub fn run_session_tui(
    state: SessionState,
    timeout: Duration,
    log: EventLog,
) -> Result<SessionExit, String> {
    let host = TerminalHost::open()?;
    let mut runtime = SessionRuntime::new(host, timeout, log);
    let result = run_event_loop(&mut runtime, state);
    runtime.cancel_in_flight();

    let close_result = runtime.into_host().close();
    let exit = result?;
    close_result?;
    Ok(exit)
}

fn run_event_loop(
    runtime: &mut SessionRuntime<TerminalHost>,
    mut state: SessionState,
) -> Result<SessionExit, String> {
    let mut last_tick = Instant::now();
    loop {
        if let Some(event) = runtime.poll_completion() {
            let (next, flow) = runtime.step(state, event);
            state = next;
            if let Flow::Exit(exit) = flow {
                return Ok(exit);
            }
        }
        if state.mode == Mode::Running && last_tick.elapsed() >= SPINNER_TICK_INTERVAL {
            let (next, _) = runtime.step(state, SessionEvent::Tick);
            state = next;
            last_tick = Instant::now();
        }
        runtime.host_mut().draw(&state)?;

        if !event::poll(UI_POLL_INTERVAL).map_err(|e| format!("failed to poll events: {e}"))? {
            continue;
        }
        let (next, flow) = match event::read().map_err(|e| format!("failed to read event: {e}"))? {
            Event::Key(key) => runtime.step_key(state, key),
            Event::Paste(text) => {
                runtime.step(state, SessionEvent::Edit(InputEdit::InsertText(text)))
            }
            _ => (state, Flow::Continue),
        };
        state = next;
        if let Flow::Exit(exit) = flow {
            return Ok(exit);
        }
    }
}

fn setup_terminal() -> Result<TuiTerminal, String> {
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste, cursor::Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("failed to initialize terminal: {e}"))
}

fn teardown_terminal(terminal: &mut TuiTerminal) -> Result<(), String> {
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen,
        cursor::Show
    )
    .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    terminal
        .show_cursor()
        .map_err(|e| format!("failed to restore cursor: {e}"))?;
    Ok(())
}

use crate::options::{parse_options, OptionEntry, ParseError};
use crate::provider::{Backend, RunnerRegistry};

pub const HELP_INPUT: &str = "enter: send • ctrl+r: send & run • alt+enter/ctrl+j: newline • ctrl+n/ctrl+p: switch cli • esc: quit";
pub const HELP_RUNNING: &str = "ctrl+n/ctrl+p: switch cli for next prompt • esc: quit";
pub const HELP_VIEWING: &str = "up/down/j/k: select • enter: copy & exit • ctrl+r: run & exit • alt+enter: new prompt • esc/q: quit";

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Composing,
    Running,
    Reviewing,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Composing => "composing",
            Mode::Running => "running",
            Mode::Reviewing => "reviewing",
        }
    }

    pub fn help_text(self) -> &'static str {
        match self {
            Mode::Composing => HELP_INPUT,
            Mode::Running => HELP_RUNNING,
            Mode::Reviewing => HELP_VIEWING,
        }
    }
}

/// One finished request/response cycle. Built once when a run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub backend: Backend,
    pub prompt: String,
    pub raw_output: String,
    pub options: Vec<OptionEntry>,
    pub parse_error: Option<ParseError>,
    pub run_error: Option<String>,
}

impl Exchange {
    /// A failed run is never parsed. When it produced no output, the error text
    /// stands in as the raw output so there is always something to show or copy.
    pub fn from_run(
        backend: Backend,
        prompt: &str,
        output: &str,
        run_error: Option<String>,
    ) -> Self {
        let trimmed = output.trim();
        if let Some(error) = run_error {
            let raw_output = if trimmed.is_empty() {
                error.clone()
            } else {
                trimmed.to_string()
            };
            return Self {
                backend,
                prompt: prompt.to_string(),
                raw_output,
                options: Vec::new(),
                parse_error: None,
                run_error: Some(error),
            };
        }

        let (options, parse_error) = match parse_options(trimmed) {
            Ok(options) => (options, None),
            Err(err) => (Vec::new(), Some(err)),
        };
        Self {
            backend,
            prompt: prompt.to_string(),
            raw_output: trimmed.to_string(),
            options,
            parse_error,
            run_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub registry: RunnerRegistry,
    pub input: String,
    pub last_prompt: String,
    pub exchange: Option<Exchange>,
    pub selected: usize,
    pub status: String,
    pub auto_execute: bool,
    pub running_backend: Option<Backend>,
    pub spinner_frame: usize,
}

impl SessionState {
    pub fn new(registry: RunnerRegistry) -> Self {
        Self {
            mode: Mode::Composing,
            registry,
            input: String::new(),
            last_prompt: String::new(),
            exchange: None,
            selected: 0,
            status: HELP_INPUT.to_string(),
            auto_execute: false,
            running_backend: None,
            spinner_frame: 0,
        }
    }

    pub fn options(&self) -> &[OptionEntry] {
        self.exchange
            .as_ref()
            .map(|exchange| exchange.options.as_slice())
            .unwrap_or_default()
    }

    pub fn raw_output(&self) -> &str {
        self.exchange
            .as_ref()
            .map(|exchange| exchange.raw_output.as_str())
            .unwrap_or_default()
    }

    pub fn selected_option(&self) -> Option<&OptionEntry> {
        self.options().get(self.selected)
    }

    /// Text acted on by copy and run: the selected option's value, else the raw output.
    pub fn action_target(&self) -> Option<String> {
        if let Some(option) = self.selected_option() {
            if !option.value.is_empty() {
                return Some(option.value.clone());
            }
        }
        let raw = self.raw_output();
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn backend_name(&self) -> &'static str {
        self.registry.current().backend.as_str()
    }

    /// Backend of the run in flight. Cycling during a run only affects the next prompt.
    pub fn backend_in_flight(&self) -> &'static str {
        self.running_backend
            .map(Backend::as_str)
            .unwrap_or_else(|| self.backend_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_run_without_output_shows_error_text() {
        let exchange = Exchange::from_run(
            Backend::Codex,
            "p",
            "  \n",
            Some("codex timed out after 300000ms".to_string()),
        );
        assert_eq!(exchange.raw_output, "codex timed out after 300000ms");
        assert!(exchange.options.is_empty());
        assert!(exchange.parse_error.is_none());
    }

    #[test]
    fn failed_run_keeps_output_and_skips_parsing() {
        let exchange = Exchange::from_run(
            Backend::Claude,
            "p",
            r#"{"options":[{"value":"ls","description":"","recommendation_order":1}]}"#,
            Some("claude exited with code 2".to_string()),
        );
        assert!(exchange.options.is_empty());
        assert!(exchange.raw_output.starts_with(r#"{"options""#));
        assert_eq!(exchange.run_error.as_deref(), Some("claude exited with code 2"));
    }

    #[test]
    fn successful_run_with_noise_records_parse_error() {
        let exchange = Exchange::from_run(Backend::Gemini, "p", "no json here\n", None);
        assert_eq!(exchange.parse_error, Some(ParseError::NotFound));
        assert_eq!(exchange.raw_output, "no json here");
    }
}

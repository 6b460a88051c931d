use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unknown backend `{0}`; expected one of: codex, claude, gemini, opencode")]
    UnknownBackend(String),
    #[error("no AI CLIs found. Please install at least one of: {expected}")]
    NoBackendsAvailable { expected: String },
    #[error("backend binary missing for {backend}: {binary}")]
    MissingBinary { backend: Backend, binary: String },
    #[error("{backend} exited with code {exit_code}")]
    NonZeroExit { backend: Backend, exit_code: i32 },
    #[error("{backend} timed out after {timeout_ms}ms")]
    Timeout { backend: Backend, timeout_ms: u64 },
    #[error("{backend} run was cancelled")]
    Cancelled { backend: Backend },
    #[error("io error running {binary}: {source}")]
    Io {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Backend {
    Codex,
    Claude,
    Gemini,
    Opencode,
}

/// Discovery order at startup; the registry keeps available backends in this order.
pub const ALL_BACKENDS: [Backend; 4] = [
    Backend::Codex,
    Backend::Claude,
    Backend::Gemini,
    Backend::Opencode,
];

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Codex => "codex",
            Backend::Claude => "claude",
            Backend::Gemini => "gemini",
            Backend::Opencode => "opencode",
        }
    }

    pub fn default_binary(self) -> &'static str {
        self.as_str()
    }

    pub fn expected_names() -> String {
        ALL_BACKENDS
            .iter()
            .map(|backend| backend.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Backend {
    type Error = ProviderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "codex" => Ok(Self::Codex),
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            "opencode" => Ok(Self::Opencode),
            other => Err(ProviderError::UnknownBackend(other.to_string())),
        }
    }
}

/// Executable name or path per backend. Unset entries use the backend's own name.
#[derive(Debug, Clone, Default)]
pub struct RunnerBinaries {
    pub overrides: BTreeMap<Backend, String>,
}

impl RunnerBinaries {
    pub fn binary_for(&self, backend: Backend) -> String {
        self.overrides
            .get(&backend)
            .cloned()
            .unwrap_or_else(|| backend.default_binary().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runner {
    pub backend: Backend,
    pub binary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub binary: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl InvocationSpec {
    pub fn command_form(&self) -> String {
        if self.args.is_empty() {
            return self.binary.clone();
        }
        format!("{} {}", self.binary, self.args.join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub schema_path: PathBuf,
    pub timeout: Duration,
}

/// Combined stdout/stderr of one run plus the execution error, if any.
///
/// Output is kept on failure so a partially useful reply can still be shown.
#[derive(Debug)]
pub struct RunOutput {
    pub output: Vec<u8>,
    pub error: Option<ProviderError>,
}

impl RunOutput {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}

/// Shared flag checked by the runner's wait loop; cancelling kills the child.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

use crate::provider::availability::is_binary_available;
use crate::provider::runner::run_prompt;
use crate::provider::{
    Backend, CancelToken, InvocationContext, ProviderError, RunOutput, Runner, RunnerBinaries,
    ALL_BACKENDS,
};
use std::path::PathBuf;
use std::time::Duration;

/// Backends available on this machine, in discovery order, plus the active selection.
///
/// Never empty: construction fails instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerRegistry {
    runners: Vec<Runner>,
    active: usize,
    schema_path: PathBuf,
}

impl RunnerRegistry {
    pub fn discover(
        binaries: &RunnerBinaries,
        schema_path: PathBuf,
    ) -> Result<Self, ProviderError> {
        Self::discover_with(binaries, schema_path, is_binary_available)
    }

    pub fn discover_with(
        binaries: &RunnerBinaries,
        schema_path: PathBuf,
        is_available: impl Fn(&str) -> bool,
    ) -> Result<Self, ProviderError> {
        let runners = ALL_BACKENDS
            .iter()
            .map(|backend| Runner {
                backend: *backend,
                binary: binaries.binary_for(*backend),
            })
            .filter(|runner| is_available(&runner.binary))
            .collect();
        Self::from_runners(runners, schema_path)
    }

    pub fn from_runners(
        runners: Vec<Runner>,
        schema_path: PathBuf,
    ) -> Result<Self, ProviderError> {
        if runners.is_empty() {
            return Err(ProviderError::NoBackendsAvailable {
                expected: Backend::expected_names(),
            });
        }
        Ok(Self {
            runners,
            active: 0,
            schema_path,
        })
    }

    pub fn count(&self) -> usize {
        self.runners.len()
    }

    pub fn runners(&self) -> &[Runner] {
        &self.runners
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn current(&self) -> &Runner {
        &self.runners[self.active]
    }

    pub fn cycle_next(&mut self) {
        self.active = (self.active + 1) % self.runners.len();
    }

    pub fn cycle_prev(&mut self) {
        self.active = (self.active + self.runners.len() - 1) % self.runners.len();
    }

    /// Makes `name` active when it is available; returns whether it was found.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match self
            .runners
            .iter()
            .position(|runner| runner.backend.as_str().eq_ignore_ascii_case(name.trim()))
        {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    pub fn runner(&self, index: usize) -> Option<&Runner> {
        self.runners.get(index)
    }

    pub fn invocation_context(&self, timeout: Duration) -> InvocationContext {
        InvocationContext {
            schema_path: self.schema_path.clone(),
            timeout,
        }
    }

    /// Runs `prompt` on the runner at `index`. Blocks until exit, timeout, or cancel.
    pub fn invoke(
        &self,
        index: usize,
        prompt: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> RunOutput {
        let runner = self.runners[index % self.runners.len()].clone();
        run_prompt(&runner, prompt, &self.invocation_context(timeout), cancel)
    }
}

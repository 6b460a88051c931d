pub mod availability;
pub mod invocation;
pub mod registry;
pub mod runner;
pub mod types;

pub use availability::is_binary_available;
pub use invocation::build_invocation;
pub use registry::RunnerRegistry;
pub use runner::run_prompt;
pub use types::{
    Backend, CancelToken, InvocationContext, InvocationSpec, ProviderError, RunOutput, Runner,
    RunnerBinaries, ALL_BACKENDS, DEFAULT_RUN_TIMEOUT,
};

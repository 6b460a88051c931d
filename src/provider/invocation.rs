use crate::provider::{Backend, InvocationSpec, Runner};
use std::path::Path;

/// Builds the command line for one backend. Codex reads the prompt from stdin;
/// the others take it as an argument.
pub fn build_invocation(runner: &Runner, prompt: &str, schema_path: &Path) -> InvocationSpec {
    let schema = schema_path.display().to_string();
    match runner.backend {
        Backend::Codex => InvocationSpec {
            binary: runner.binary.clone(),
            args: vec!["exec".to_string(), "--output-schema".to_string(), schema],
            stdin: Some(prompt.to_string()),
        },
        Backend::Claude => InvocationSpec {
            binary: runner.binary.clone(),
            args: vec![
                "-p".to_string(),
                prompt.to_string(),
                "--json-schema".to_string(),
                schema,
            ],
            stdin: None,
        },
        Backend::Gemini => InvocationSpec {
            binary: runner.binary.clone(),
            args: vec![
                "--output-format".to_string(),
                "json".to_string(),
                prompt.to_string(),
            ],
            stdin: None,
        },
        Backend::Opencode => InvocationSpec {
            binary: runner.binary.clone(),
            args: vec![
                "run".to_string(),
                "--format".to_string(),
                "json".to_string(),
                prompt.to_string(),
            ],
            stdin: None,
        },
    }
}

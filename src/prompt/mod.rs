pub mod schema;

pub use schema::{resolve_schema_path, SchemaError, OPTIONS_SCHEMA, SCHEMA_FILE_NAME};

const PROMPT_PREFIX: &str =
    "Give me one or more concise options with short descriptions for the following: ";
const PROMPT_TRAILER: &str = r#"Respond ONLY with JSON shaped like {"options":[{"value":"...","description":"...","recommendation_order":1}]}. No extra text."#;

/// Wraps a user request with the option-list instructions sent to every backend.
///
/// Never fails; rejecting blank requests is the caller's job.
pub fn build_prompt(user_text: &str) -> String {
    format!("{PROMPT_PREFIX}{user_text}\n{PROMPT_TRAILER}")
}

use crate::shared::serde_ext::null_as_default;
use serde::{Deserialize, Serialize};

pub mod parse;

pub use parse::{clean_text, parse_options, rank_options, OPTIONS_MARKER};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OptionEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// 1-based rank hint; zero or negative means unranked.
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation_order: i64,
}

impl OptionEntry {
    pub fn is_ranked(&self) -> bool {
        self.recommendation_order > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OptionResponse {
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no valid options JSON found")]
    NotFound,
}

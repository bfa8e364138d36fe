//! Provider strategies
//!
//! A strategy is one (endpoint version, model, output mode) combination.
//! The chain walker tries them in list order; earlier entries are preferred.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete endpoint descriptor tried during generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStrategy {
    /// API version path segment, e.g. `v1beta`
    pub api_version: String,
    /// Model identifier, e.g. `gemini-2.5-flash`
    pub model: String,
    /// Request JSON output mode (`responseMimeType: application/json`)
    #[serde(default = "default_structured_output")]
    pub structured_output: bool,
}

fn default_structured_output() -> bool {
    true
}

impl ProviderStrategy {
    pub fn new(api_version: &str, model: &str, structured_output: bool) -> Self {
        Self {
            api_version: api_version.to_string(),
            model: model.to_string(),
            structured_output,
        }
    }

    /// Same endpoint and model with plain-text output
    pub fn without_structured_output(&self) -> Self {
        Self {
            structured_output: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for ProviderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.model)?;
        if self.structured_output {
            write!(f, "+json")?;
        }
        Ok(())
    }
}

/// Built-in strategy list, most capable first
///
/// The trailing `v1` entry rejects `responseMimeType`, so it usually runs in
/// plain-text mode after its first attempt.
pub fn default_strategies() -> Vec<ProviderStrategy> {
    vec![
        ProviderStrategy::new("v1beta", "gemini-2.5-flash-preview-09-2025", true),
        ProviderStrategy::new("v1beta", "gemini-2.5-flash", true),
        ProviderStrategy::new("v1beta", "gemini-2.0-flash", true),
        ProviderStrategy::new("v1", "gemini-1.5-flash", true),
    ]
}

//! Token mapper configuration.

use serde::{Deserialize, Serialize};

use ringdex_common::Result;

/// Which token mapping strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Numeric for uniformly distributed `i64` tokens, generic otherwise.
    #[default]
    Auto,
    Numeric,
    Generic,
}

/// Token mapper options, as found in an index's options document.
///
/// ```json
/// { "token_strategy": "auto" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenMapperOptions {
    #[serde(rename = "token_strategy")]
    pub strategy: StrategyChoice,
}

impl TokenMapperOptions {
    pub fn from_json(json: &str) -> Result<TokenMapperOptions> {
        Ok(serde_json::from_str(json)?)
    }
}

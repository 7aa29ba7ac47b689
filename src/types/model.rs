use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a chat model identifier.
///
/// This can be one of the models offered in the model picker or a custom
/// string value for anything else the endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Models offered by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Llama 3.1 8B, instant tier.
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama31_8bInstant,

    /// Llama 3.1 70B, versatile tier.
    #[serde(rename = "llama-3.1-70b-versatile")]
    Llama31_70bVersatile,

    /// Mixtral 8x7B with a 32k context.
    #[serde(rename = "mixtral-8x7b-32768")]
    Mixtral8x7b32768,
}

impl KnownModel {
    /// All known models, in picker order.
    pub const ALL: [KnownModel; 3] = [
        KnownModel::Llama31_8bInstant,
        KnownModel::Llama31_70bVersatile,
        KnownModel::Mixtral8x7b32768,
    ];

    /// The API identifier of the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Llama31_8bInstant => "llama-3.1-8b-instant",
            KnownModel::Llama31_70bVersatile => "llama-3.1-70b-versatile",
            KnownModel::Mixtral8x7b32768 => "mixtral-8x7b-32768",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Llama31_8bInstant)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    /// Parses a model name, falling back to a custom identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(s))
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        match model.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

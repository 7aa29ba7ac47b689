//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the REPL starts topics with.  The configuration holds the
//! learner's current picks; a topic snapshots them when it starts.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::client::{DEFAULT_TEMPERATURE, api_key_from_env};
use crate::error::{Error, Result};
use crate::types::{KnowledgeLevel, Model};

/// Command-line arguments for the learnindeep-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Topic to start learning immediately.
    #[arrrg(optional, "Topic to start learning right away", "TOPIC")]
    pub topic: Option<String>,

    /// Self-declared knowledge level.
    #[arrrg(
        optional,
        "Knowledge level: beginner, basics, intermediate, advanced (default: beginner)",
        "LEVEL"
    )]
    pub level: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: llama-3.1-8b-instant)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-1.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// API key; falls back to GROQ_API_KEY.
    #[arrrg(optional, "API key (default: $GROQ_API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Alternate OpenAI-compatible endpoint.
    #[arrrg(optional, "Base URL of the chat completion API", "URL")]
    pub base_url: Option<String>,

    /// Auto-save the transcript here after every reply.
    #[arrrg(optional, "Auto-save the transcript to this file", "FILE")]
    pub transcript: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model new topics will use.
    pub model: Model,

    /// The knowledge level new topics will declare.
    pub level: KnowledgeLevel,

    /// Sampling temperature new topics will use.
    pub temperature: f32,

    /// Topic to start as soon as the REPL comes up.
    pub topic: Option<String>,

    /// The API key, if one has been supplied.
    pub api_key: Option<String>,

    /// Alternate API endpoint.
    pub base_url: Option<String>,

    /// Path to persist transcripts automatically after each reply.
    pub transcript_path: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: llama-3.1-8b-instant
    /// - Level: Complete Beginner
    /// - Temperature: 0.7
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            level: KnowledgeLevel::default(),
            temperature: DEFAULT_TEMPERATURE,
            topic: None,
            api_key: None,
            base_url: None,
            transcript_path: None,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the knowledge level.
    pub fn with_level(mut self, level: KnowledgeLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the topic to start with.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Fills in the API key from `GROQ_API_KEY` when none was given.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = api_key_from_env();
        }
        self
    }

    /// Sets the transcript auto-save path.
    pub fn with_transcript_path(mut self, path: Option<PathBuf>) -> Self {
        self.transcript_path = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The API key, or an empty string when none is known.
    pub fn credential(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(model) = args.model {
            config.model = Model::from(model.as_str());
        }
        if let Some(level) = args.level {
            config.level = level
                .parse()
                .map_err(|err: String| Error::validation(err, Some("level".to_string())))?;
        }
        if let Some(temperature) = args.temperature {
            config.temperature = parse_temperature(&temperature)
                .map_err(|err| Error::validation(err, Some("temperature".to_string())))?;
        }
        config.topic = args.topic.filter(|topic| !topic.trim().is_empty());
        config.api_key = args.api_key.filter(|key| !key.trim().is_empty());
        config.base_url = args.base_url;
        config.transcript_path = args.transcript.map(PathBuf::from);
        config.use_color = !args.no_color;
        Ok(config)
    }
}

/// Parses a temperature, accepting only finite values in `[0.0, 1.0]`.
pub fn parse_temperature(value: &str) -> std::result::Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| "expects a value between 0 and 1".to_string())?;
    if is_valid_temperature(parsed) {
        Ok(parsed)
    } else {
        Err("expects a value between 0 and 1".to_string())
    }
}

/// Returns true if `temperature` is usable for sampling.
pub fn is_valid_temperature(temperature: f32) -> bool {
    temperature.is_finite() && (0.0..=1.0).contains(&temperature)
}

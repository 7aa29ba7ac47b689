//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing the learner to pick a topic, tune settings, and manage the
//! session without sending anything to the professor.

use crate::chat::config::parse_temperature;
use crate::types::KnowledgeLevel;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start learning a topic (replaces any active one).
    Start(String),

    /// Set the knowledge level for the next topic.
    Level(KnowledgeLevel),

    /// Change the model for the next topic.
    Model(String),

    /// Set the sampling temperature for the next topic.
    Temperature(f32),

    /// Supply the API key.
    Key(String),

    /// End the active topic and clear the transcript.
    Reset,

    /// Replay the conversation so far.
    History,

    /// Set the auto-save transcript path.
    TranscriptPath(String),

    /// Clear the auto-save transcript path.
    ClearTranscriptPath,

    /// Save the transcript to a specific file immediately.
    SaveTranscript(String),

    /// Load conversation history from a file.
    LoadTranscript(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a message to the professor.
///
/// # Examples
///
/// ```
/// # use learnindeep::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/start Rust ownership").is_some());
/// assert!(parse_command("What is a lifetime?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "start" | "learn" => match argument {
            Some(topic) => ChatCommand::Start(topic.to_string()),
            None => ChatCommand::Invalid("/start requires a topic".to_string()),
        },
        "level" => match argument {
            Some(arg) => match arg.parse::<KnowledgeLevel>() {
                Ok(level) => ChatCommand::Level(level),
                Err(err) => ChatCommand::Invalid(err),
            },
            None => ChatCommand::Invalid(
                "/level requires one of: beginner, basics, intermediate, advanced".to_string(),
            ),
        },
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "temperature" | "temp" => match argument {
            Some(arg) => match parse_temperature(arg) {
                Ok(value) => ChatCommand::Temperature(value),
                Err(err) => ChatCommand::Invalid(format!("/temperature {err}")),
            },
            None => ChatCommand::Invalid("/temperature requires a value".to_string()),
        },
        "key" => match argument {
            Some(key) => ChatCommand::Key(key.to_string()),
            None => ChatCommand::Invalid("/key requires an API key".to_string()),
        },
        "reset" | "clear" => ChatCommand::Reset,
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "transcript" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearTranscriptPath,
            Some(arg) => ChatCommand::TranscriptPath(arg.to_string()),
            None => ChatCommand::Invalid("/transcript requires a file path".to_string()),
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(arg) => ChatCommand::LoadTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /start <topic>         Start learning a topic (replaces the current one)
  /level <level>         Set knowledge level: beginner, basics, intermediate, advanced
  /model <name>          Change the model (e.g., /model llama-3.1-70b-versatile)
  /temperature <v>       Set temperature 0.0-1.0
  /key <api key>         Supply the API key
  /reset                 End the topic and clear the conversation
  /history               Replay the conversation so far
  /transcript <file>     Enable auto-saving transcripts (or 'clear')
  /save <file>           Save the current transcript immediately
  /load <file>           Load a transcript into the active topic
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Model, level and temperature changes take effect on the next /start."#
}

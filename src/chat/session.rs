//! Core learning session management.
//!
//! This module provides the `TutorSession` struct which owns the transcript
//! of one learning topic and the client handle used to talk to the professor.
//!
//! A session is either idle (no topic, empty transcript, no client handle) or
//! active (a topic, a transcript whose first and only system message is the
//! professor prompt, and a client handle built when the topic started).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use time::OffsetDateTime;

use crate::chat::config::is_valid_temperature;
use crate::client::{ClientSettings, Completion, Connector, GroqConnector};
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_RESETS, SESSION_START_FAILURES, SESSION_STARTS, SESSION_TRANSCRIPT_MESSAGES,
    SESSION_TURN_FAILURES, SESSION_TURNS,
};
use crate::template::{PROFESSOR_SYSTEM_PROMPT, opening_request};
use crate::types::{ChatMessage, ChatRole, KnowledgeLevel, Model, Reply, Usage};

/// Result of a successful StartTopic or SendTurn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The professor's reply, already appended to the transcript.
    pub reply: String,
    /// Token usage for the request, when reported.
    pub usage: Option<Usage>,
    /// Set when the reply arrived but auto-saving the transcript failed.
    pub save_error: Option<Error>,
}

/// Aggregated stats for a learning session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Whether a topic is active.
    pub started: bool,
    /// The active topic, empty when idle.
    pub topic: String,
    /// The knowledge level declared for the active topic.
    pub level: Option<KnowledgeLevel>,
    /// The model serving the active topic.
    pub model: Option<Model>,
    /// The temperature of the active topic.
    pub temperature: Option<f32>,
    /// The number of messages in the transcript, system message included.
    pub message_count: usize,
    /// The auto-save transcript path, if set.
    pub transcript_path: Option<PathBuf>,
    /// Total token usage across all requests.
    pub total_usage: Usage,
    /// Total number of successful API requests made.
    pub total_requests: u64,
    /// Usage of the last successful request, if available.
    pub last_turn_usage: Option<Usage>,
}

/// A learning session: one topic, one transcript, one client handle.
pub struct TutorSession<K: Connector = GroqConnector> {
    connector: K,
    client: Option<K::Client>,
    topic: String,
    level: Option<KnowledgeLevel>,
    model: Option<Model>,
    temperature: Option<f32>,
    messages: Vec<ChatMessage>,
    usage_totals: Usage,
    last_turn_usage: Option<Usage>,
    request_count: u64,
    transcript_path: Option<PathBuf>,
}

impl TutorSession<GroqConnector> {
    /// Creates an idle session that will talk to the public Groq endpoint.
    pub fn new() -> Self {
        Self::with_connector(GroqConnector::new())
    }
}

impl Default for TutorSession<GroqConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Connector> TutorSession<K> {
    /// Creates an idle session that builds client handles with `connector`.
    pub fn with_connector(connector: K) -> Self {
        Self {
            connector,
            client: None,
            topic: String::new(),
            level: None,
            model: None,
            temperature: None,
            messages: Vec::new(),
            usage_totals: Usage::default(),
            last_turn_usage: None,
            request_count: 0,
            transcript_path: None,
        }
    }

    /// Starts learning `topic`, replacing whatever topic was active.
    ///
    /// Builds a fresh client handle, sends the professor prompt plus the
    /// opening request, and records the reply.  Missing input is rejected
    /// before anything changes.  Any later failure leaves the session idle:
    /// no transcript, no topic, no client handle.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty topic or credential or an
    /// out-of-range temperature, and the client's error if the handle cannot
    /// be built or the request fails.
    pub async fn start_topic(
        &mut self,
        topic: &str,
        level: KnowledgeLevel,
        credential: &str,
        model: Model,
        temperature: f32,
    ) -> Result<TurnOutcome> {
        let topic = topic.trim();
        if credential.trim().is_empty() {
            return Err(Error::validation(
                "Please enter an API key",
                Some("credential".to_string()),
            ));
        }
        if topic.is_empty() {
            return Err(Error::validation(
                "Please enter a topic",
                Some("topic".to_string()),
            ));
        }
        if !is_valid_temperature(temperature) {
            return Err(Error::validation(
                "temperature must be between 0 and 1",
                Some("temperature".to_string()),
            ));
        }

        self.clear_state();
        tracing::info!(topic, level = %level, model = %model, temperature, "starting topic");

        let settings = ClientSettings {
            credential: credential.to_string(),
            model: model.clone(),
            temperature,
        };
        let client = match self.connector.connect(&settings) {
            Ok(client) => client,
            Err(err) => return Err(self.abort_start(err)),
        };

        let messages = vec![
            ChatMessage::system(PROFESSOR_SYSTEM_PROMPT),
            ChatMessage::user(opening_request(topic, level)),
        ];
        let reply = match client.complete(&messages).await {
            Ok(reply) => reply,
            Err(err) => return Err(self.abort_start(err)),
        };

        self.messages = messages;
        self.client = Some(client);
        self.topic = topic.to_string();
        self.level = Some(level);
        self.model = Some(model);
        self.temperature = Some(temperature);
        SESSION_STARTS.click();
        Ok(self.accept_reply(reply))
    }

    /// Sends one learner turn and records the professor's reply.
    ///
    /// The learner's message is appended before the request goes out and
    /// stays there if the request fails, so the transcript always shows what
    /// was asked.  The whole transcript is sent every time.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no topic is active or the text is
    /// blank (nothing is appended in either case), and the client's error
    /// when the request fails.
    pub async fn send_turn(&mut self, user_text: &str) -> Result<TurnOutcome> {
        let Some(client) = self.client.as_ref() else {
            return Err(Error::validation(
                "No topic is active; start one with /start <topic>",
                None,
            ));
        };
        if user_text.trim().is_empty() {
            return Err(Error::validation("message is empty", None));
        }

        self.messages.push(ChatMessage::user(user_text));
        tracing::debug!(messages = self.messages.len(), "sending turn");
        match client.complete(&self.messages).await {
            Ok(reply) => {
                SESSION_TURNS.click();
                Ok(self.accept_reply(reply))
            }
            Err(err) => {
                SESSION_TURN_FAILURES.click();
                tracing::warn!(error = %err, "turn failed; learner message kept");
                Err(err)
            }
        }
    }

    /// Ends the active topic: clears the transcript, topic, and client handle.
    pub fn reset(&mut self) {
        self.clear_state();
        SESSION_RESETS.click();
        tracing::info!("session reset");
    }

    /// Returns true while a topic is active.
    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    /// Returns true if a client handle is held.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// The active topic, empty when idle.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The knowledge level of the active topic.
    pub fn level(&self) -> Option<KnowledgeLevel> {
        self.level
    }

    /// The model serving the active topic.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// The temperature of the active topic.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// The full transcript, system message included.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The transcript as shown to the learner: everything but the system message.
    pub fn visible_messages(&self) -> &[ChatMessage] {
        match self.messages.first() {
            Some(first) if first.is_system() => &self.messages[1..],
            _ => &self.messages,
        }
    }

    /// The most recent professor reply.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::Assistant)
            .map(|message| message.content.as_str())
    }

    /// Returns the number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Sets the auto-save transcript path.
    pub fn set_transcript_path(&mut self, path: Option<PathBuf>) {
        self.transcript_path = path;
    }

    /// Returns the configured transcript path, if any.
    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript_path.as_deref()
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile {
            version: TRANSCRIPT_VERSION,
            topic: self.topic.clone(),
            level: self.level,
            saved_at: OffsetDateTime::now_utc(),
            messages: self.messages.clone(),
        };
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Loads a transcript into the active topic, replacing its history.
    ///
    /// The client handle is kept, so the conversation continues with the
    /// model and key of the active topic.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if !self.is_started() {
            return Err(Error::validation(
                "start a topic before loading a transcript",
                None,
            ));
        }
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        validate_transcript(&transcript)?;

        self.messages = transcript.messages;
        self.topic = transcript.topic.trim().to_string();
        self.level = transcript.level;
        Ok(())
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            started: self.is_started(),
            topic: self.topic.clone(),
            level: self.level,
            model: self.model.clone(),
            temperature: self.temperature,
            message_count: self.message_count(),
            transcript_path: self.transcript_path.clone(),
            total_usage: self.usage_totals,
            total_requests: self.request_count,
            last_turn_usage: self.last_turn_usage,
        }
    }

    fn accept_reply(&mut self, reply: Reply) -> TurnOutcome {
        self.messages.push(ChatMessage::assistant(reply.content.clone()));
        self.request_count = self.request_count.saturating_add(1);
        self.last_turn_usage = reply.usage;
        if let Some(usage) = reply.usage {
            self.usage_totals = self.usage_totals + usage;
        }
        SESSION_TRANSCRIPT_MESSAGES.add(self.messages.len() as f64);
        TurnOutcome {
            reply: reply.content,
            usage: reply.usage,
            save_error: self.auto_save_transcript().err(),
        }
    }

    fn abort_start(&mut self, err: Error) -> Error {
        SESSION_START_FAILURES.click();
        tracing::warn!(
            error = %err,
            credential_failure = err.is_credential_failure(),
            "start failed"
        );
        self.clear_state();
        err
    }

    fn clear_state(&mut self) {
        self.messages.clear();
        self.topic.clear();
        self.level = None;
        self.model = None;
        self.temperature = None;
        self.client = None;
    }

    fn auto_save_transcript(&self) -> Result<()> {
        if let Some(path) = &self.transcript_path {
            self.save_transcript_to(path)
        } else {
            Ok(())
        }
    }
}

const TRANSCRIPT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    topic: String,
    #[serde(default)]
    level: Option<KnowledgeLevel>,
    #[serde(with = "crate::utils::time")]
    saved_at: OffsetDateTime,
    messages: Vec<ChatMessage>,
}

fn validate_transcript(transcript: &TranscriptFile) -> Result<()> {
    if transcript.version != TRANSCRIPT_VERSION {
        return Err(Error::validation(
            format!("unsupported transcript version {}", transcript.version),
            Some("version".to_string()),
        ));
    }
    let starts_with_system = transcript
        .messages
        .first()
        .is_some_and(ChatMessage::is_system);
    let system_count = transcript.messages.iter().filter(|m| m.is_system()).count();
    if !starts_with_system || system_count != 1 {
        return Err(Error::validation(
            "transcript must begin with exactly one system message",
            Some("messages".to_string()),
        ));
    }
    if transcript.topic.trim().is_empty() {
        return Err(Error::validation(
            "transcript has no topic",
            Some("topic".to_string()),
        ));
    }
    // A failed turn leaves its question in place, so repeated user messages
    // are allowed; an assistant reply always answers a user message.
    let mut previous = ChatRole::System;
    for message in &transcript.messages[1..] {
        let answers_nothing = message.role == ChatRole::Assistant && previous != ChatRole::User;
        if answers_nothing {
            return Err(Error::validation(
                "assistant message does not follow a user message",
                Some("messages".to_string()),
            ));
        }
        previous = message.role;
    }
    if previous == ChatRole::System {
        return Err(Error::validation(
            "transcript has no conversation after the system message",
            Some("messages".to_string()),
        ));
    }
    Ok(())
}

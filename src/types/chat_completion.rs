use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, ChatRole, Model};

/// Body of a `chat/completions` request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatCompletionRequest<'a> {
    /// Model to sample from.
    pub model: &'a Model,

    /// The whole transcript, system message first.
    pub messages: &'a [ChatMessage],

    /// Sampling temperature.
    pub temperature: f32,
}

/// Body of a successful `chat/completions` response.
///
/// Only the fields the tutor reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    /// Completion identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// The model that actually served the request.
    #[serde(default)]
    pub model: Option<String>,

    /// Generated choices; the tutor only ever asks for one.
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token accounting for the request.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One generated alternative.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ResponseMessage,

    /// Why generation stopped (`stop`, `length`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The message inside a [`Choice`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResponseMessage {
    /// Always `assistant` in practice.
    pub role: ChatRole,

    /// Generated text; some gateways send `null` for empty output.
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage reported by the completion API.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the transcript that was sent.
    pub prompt_tokens: u64,

    /// Tokens generated in the reply.
    pub completion_tokens: u64,

    /// Sum of the two.
    pub total_tokens: u64,
}

impl Usage {
    /// Create a new `Usage` from prompt and completion token counts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

/// The professor's answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Generated text.
    pub content: String,

    /// Token usage, when the API reported it.
    pub usage: Option<Usage>,

    /// Why generation stopped, when reported.
    pub finish_reason: Option<String>,
}

impl Reply {
    /// Create a reply carrying only text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            finish_reason: None,
        }
    }

    /// Attach token usage.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use serde_json::{json, to_value};

    #[test]
    fn request_wire_format() {
        let model = Model::Known(KnownModel::Llama31_8bInstant);
        let messages = vec![ChatMessage::system("Be a professor"), ChatMessage::user("Hi")];
        let request = ChatCompletionRequest {
            model: &model,
            messages: &messages,
            temperature: 0.5,
        };
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "model": "llama-3.1-8b-instant",
                "messages": [
                    {"role": "system", "content": "Be a professor"},
                    {"role": "user", "content": "Hi"}
                ],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn response_deserialization() {
        let json = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "llama-3.1-8b-instant",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Welcome to Lesson 1"},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        });
        let response: ChatCompletionResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("Welcome to Lesson 1")
        );
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage, Some(Usage::new(120, 30)));
    }

    #[test]
    fn response_tolerates_null_content() {
        let json = json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        });
        let response: ChatCompletionResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.choices[0].message.content, None);
        assert!(response.usage.is_none());
    }

    #[test]
    fn usage_adds() {
        let total = Usage::new(10, 5) + Usage::new(20, 7);
        assert_eq!(total, Usage::new(30, 12));
        assert_eq!(total.total_tokens, 42);
    }
}

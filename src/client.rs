use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_AUTH_FAILURES, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Model, Reply};

/// Base URL of Groq's OpenAI-compatible API.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
/// Environment variable consulted when no credential is supplied.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads the credential from [`API_KEY_ENV`], treating an empty value as unset.
pub fn api_key_from_env() -> Option<String> {
    env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty())
}

/// Something that can turn a transcript into the next assistant reply.
///
/// The session owns exactly one of these per active topic.
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    /// Sends the whole transcript and returns the generated reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Reply>;
}

/// Everything needed to build a client handle when a topic starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// The API key.
    pub credential: String,
    /// Model to sample from.
    pub model: Model,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Builds client handles.
///
/// The session calls [`Connector::connect`] once per StartTopic, so handles
/// live exactly as long as the topic they were created for.
pub trait Connector {
    /// The handle type produced.
    type Client: Completion;

    /// Builds a handle from the settings.
    fn connect(&self, settings: &ClientSettings) -> Result<Self::Client>;
}

/// Connector producing [`Groq`] handles.
#[derive(Debug, Clone)]
pub struct GroqConnector {
    base_url: String,
    timeout: Duration,
}

impl GroqConnector {
    /// Create a connector for the public Groq endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a connector for a custom OpenAI-compatible endpoint.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(base_url) => normalize_base_url(&base_url)?,
            None => DEFAULT_API_URL.to_string(),
        };
        Ok(Self {
            base_url,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    /// The endpoint handles will talk to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for GroqConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for GroqConnector {
    type Client = Groq;

    fn connect(&self, settings: &ClientSettings) -> Result<Groq> {
        Groq::with_options(
            settings.credential.clone(),
            settings.model.clone(),
            settings.temperature,
            Some(self.base_url.clone()),
            Some(self.timeout),
        )
    }
}

/// Client handle for a Groq (or any OpenAI-compatible) chat endpoint.
///
/// The model and temperature are fixed at construction.
#[derive(Debug, Clone)]
pub struct Groq {
    api_key: String,
    model: Model,
    temperature: f32,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl Groq {
    /// Create a new client for the public Groq endpoint.
    pub fn new(api_key: String, model: Model, temperature: f32) -> Result<Self> {
        Self::with_options(api_key, model, temperature, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: String,
        model: Model,
        temperature: f32,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }
        // Header values cannot carry control characters; refuse up front.
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;

        let base_url = match base_url {
            Some(base_url) => normalize_base_url(&base_url)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            model,
            temperature,
            client,
            base_url,
            timeout,
        })
    }

    /// The model this handle samples from.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The sampling temperature of this handle.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            code: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_code = detail.as_ref().and_then(|e| e.code.clone());
        let mut error_message = detail
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_body.clone());
        // Bad requests carry the code separately; everyone else gets it inline.
        if !matches!(status_code, 400 | 413)
            && let Some(code) = &error_code
            && !error_message.contains(code.as_str())
        {
            error_message = format!("{error_message} [{code}]");
        }

        match status_code {
            400 | 413 => Error::bad_request(error_message, error_code),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message),
        }
    }

    /// Send the transcript and get the next reply.
    pub async fn send(&self, messages: &[ChatMessage]) -> Result<Reply> {
        let url = format!("{}chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            temperature = self.temperature,
            "sending chat completion"
        );

        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let result = self.send_request(&url, &request).await;
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());

        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_credential_failure() {
                CLIENT_AUTH_FAILURES.click();
            }
            tracing::warn!(
                error = %err,
                status = err.status_code(),
                unreachable = err.is_connection(),
                "chat completion failed"
            );
        }
        result
    }

    async fn send_request(&self, url: &str, request: &ChatCompletionRequest<'_>) -> Result<Reply> {
        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(e.to_string(), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        reply_from_completion(completion)
    }
}

#[async_trait::async_trait]
impl Completion for Groq {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Reply> {
        self.send(messages).await
    }
}

fn reply_from_completion(completion: ChatCompletionResponse) -> Result<Reply> {
    let usage = completion.usage;
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::serialization(
            "completion response contained no choices",
            None,
        ));
    };
    tracing::debug!(
        finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
        "chat completion received"
    );
    Ok(Reply {
        content: choice.message.content.unwrap_or_default(),
        usage,
        finish_reason: choice.finish_reason,
    })
}

/// Validates a base URL and guarantees a trailing slash so paths can be appended.
fn normalize_base_url(base_url: &str) -> Result<String> {
    let parsed = Url::parse(base_url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("unsupported URL scheme: {}", parsed.scheme()),
            Some("base_url".to_string()),
        ));
    }
    let mut normalized = parsed.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Choice, KnownModel, ResponseMessage, Usage};
    use crate::types::ChatRole;

    fn model() -> Model {
        Model::Known(KnownModel::Llama31_8bInstant)
    }

    #[test]
    fn client_creation() {
        let client = Groq::new("test-key".to_string(), model(), 0.7).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
        assert_eq!(client.model(), &model());
        assert_eq!(client.temperature(), 0.7);

        let client = Groq::with_options(
            "test-key".to_string(),
            model(),
            0.2,
            Some("http://localhost:8080/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn empty_key_is_refused() {
        let err = Groq::new("   ".to_string(), model(), 0.7).unwrap_err();
        assert!(err.is_authentication());
        assert!(err.is_credential_failure());
    }

    #[test]
    fn bad_base_url_is_refused() {
        let err = GroqConnector::with_options(Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err =
            GroqConnector::with_options(Some("ftp://example.com/".to_string()), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn connector_builds_configured_handle() {
        let connector =
            GroqConnector::with_options(Some("https://example.com/openai/v1".to_string()), None)
                .unwrap();
        assert_eq!(connector.base_url(), "https://example.com/openai/v1/");
        let settings = ClientSettings {
            credential: "key".to_string(),
            model: Model::Custom("gemma2-9b-it".to_string()),
            temperature: 0.3,
        };
        let client = connector.connect(&settings).unwrap();
        assert_eq!(client.model(), &settings.model);
        assert_eq!(client.temperature(), 0.3);
        assert_eq!(client.base_url, "https://example.com/openai/v1/");
    }

    #[test]
    fn reply_takes_first_choice() {
        let completion = ChatCompletionResponse {
            id: None,
            model: None,
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: ChatRole::Assistant,
                    content: Some("Lesson 1".to_string()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(Usage::new(10, 2)),
        };
        let reply = reply_from_completion(completion).unwrap();
        assert_eq!(reply.content, "Lesson 1");
        assert_eq!(reply.usage, Some(Usage::new(10, 2)));
        assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn reply_without_choices_is_an_error() {
        let completion = ChatCompletionResponse {
            id: None,
            model: None,
            choices: Vec::new(),
            usage: None,
        };
        assert!(matches!(
            reply_from_completion(completion),
            Err(Error::Serialization { .. })
        ));
    }
}

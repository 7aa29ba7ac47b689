// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod template;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{
    API_KEY_ENV, ClientSettings, Completion, Connector, DEFAULT_API_URL, Groq, GroqConnector,
    api_key_from_env,
};
pub use error::{Error, ErrorContext, Result};
pub use observability::register_biometrics;
pub use template::{PROFESSOR_SYSTEM_PROMPT, opening_request};
pub use types::*;

// Public modules
pub mod chat_completion;
pub mod chat_message;
pub mod knowledge_level;
pub mod model;

// Re-exports
pub use chat_completion::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, Reply, ResponseMessage, Usage,
};
pub use chat_message::{ChatMessage, ChatRole};
pub use knowledge_level::KnowledgeLevel;
pub use model::{KnownModel, Model};

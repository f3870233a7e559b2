//! Rafiq - Arabic-first AI assistant for the terminal
//!
//! A chat client for OpenAI-compatible chat-completion APIs that:
//! - Maintains an append-only conversation transcript with per-mode
//!   system instructions
//! - Ships the classic assistant tasks (summarize, translate, code help,
//!   text analysis, ...) as one-shot tools over the same provider pathway
//! - Keeps the API key in a small injected credential store

pub mod config;
pub mod credentials;
pub mod provider;
pub mod session;
pub mod tools;
pub mod tui;

pub use config::AppConfig;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use provider::{ChatClient, ProviderRequest, Role};
pub use session::{ConversationMode, Message, Sender, Session, SessionManager, SessionOutcome};
pub use tools::{ToolInput, ToolKind};

/// Result type for Rafiq operations
pub type Result<T> = std::result::Result<T, RafiqError>;

/// Errors that can occur in Rafiq
#[derive(Debug, thiserror::Error)]
pub enum RafiqError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

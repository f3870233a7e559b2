//! Conversation session management.
//!
//! The session owns the ordered transcript of one conversation, turns it
//! into provider requests, and applies replies (or synthesized error
//! messages) back into the transcript. All state lives in memory; a new
//! session is a blank slate apart from the seeded greeting, and `clear`
//! resets back to exactly that.
//!
//! Per session the state machine is `Idle -> AwaitingReply -> Idle`: at
//! most one request is in flight, a second submit while awaiting a reply
//! is rejected, and the only way out of `AwaitingReply` is applying an
//! outcome (success or failure).

mod manager;
mod mode;

pub use manager::SessionManager;
pub use mode::ConversationMode;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::provider::{ChatMessage, ProviderRequest};

/// Token ceiling for chat replies, independent of mode.
pub const MAX_COMPLETION_TOKENS: u32 = 2000;

/// Greeting seeded into a brand-new session.
pub const WELCOME_GREETING: &str = "مرحباً! أنا رفيق، مساعدك الذكي. يمكنني مساعدتك في مختلف المهام من البرمجة إلى الكتابة والتحليل والترجمة وحل المشكلات. كيف يمكنني مساعدتك اليوم؟";

/// Greeting seeded after clearing the conversation.
pub const NEW_CHAT_GREETING: &str = "مرحباً! تم بدء محادثة جديدة. كيف يمكنني مساعدتك؟";

/// Shown in the transcript when no API key is stored.
pub const MISSING_KEY_REPLY: &str = "يرجى إدخال مفتاح OpenAI API في الإعدادات أولاً.";

/// Shown in the transcript when the provider call fails.
pub const TRANSPORT_ERROR_REPLY: &str =
    "حدث خطأ أثناء الاتصال بالذكاء الاصطناعي. تحقق من اتصالك أو المفتاح.";

/// Substituted when the provider returns an empty reply.
pub const EMPTY_REPLY_FALLBACK: &str = "لم أتمكن من توليد رد.";

// ─── Transcript ─────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only ordered message history.
///
/// Always starts with an assistant greeting. Timestamps are clamped so
/// `created_at` never decreases along the transcript, even if the wall
/// clock steps backwards between appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A fresh transcript seeded with the welcome greeting.
    pub fn new() -> Self {
        Self::seeded(WELCOME_GREETING)
    }

    fn seeded(greeting: &str) -> Self {
        Self {
            messages: vec![Message {
                sender: Sender::Assistant,
                text: greeting.to_string(),
                created_at: Utc::now(),
            }],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn append(&mut self, sender: Sender, text: impl Into<String>) {
        self.append_at(sender, text, Utc::now());
    }

    fn append_at(&mut self, sender: Sender, text: impl Into<String>, at: DateTime<Utc>) {
        let created_at = match self.messages.last() {
            Some(prev) if prev.created_at > at => prev.created_at,
            _ => at,
        };
        self.messages.push(Message {
            sender,
            text: text.into(),
            created_at,
        });
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Session ────────────────────────────────────────────────────────

/// Whether a request is currently in flight for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    AwaitingReply,
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("input is empty")]
    EmptyInput,

    #[error("a request is already in flight")]
    RequestInFlight,
}

/// Result of one dispatched submission, as seen by the session.
///
/// The provider boundary reduces to "some text" or "some failure"; the
/// session turns each failure case into its fixed in-transcript reply.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The provider returned text (possibly empty).
    Reply(String),
    /// No API key was available; the request was never sent.
    MissingCredential,
    /// The provider call failed. `detail` is for the log, not the user.
    TransportFailure { detail: String },
}

/// One conversation: transcript + mode + in-flight flag.
#[derive(Debug, Clone)]
pub struct Session {
    transcript: Transcript,
    mode: ConversationMode,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::with_mode(ConversationMode::General)
    }

    pub fn with_mode(mode: ConversationMode) -> Self {
        Self {
            transcript: Transcript::new(),
            mode,
            state: SessionState::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    /// Switch modes. Takes effect from the next request; the transcript
    /// is untouched.
    pub fn set_mode(&mut self, mode: ConversationMode) {
        self.mode = mode;
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == SessionState::AwaitingReply
    }

    /// Accept a user submission: append the user message, mark the
    /// session awaiting a reply, and return the request to send.
    ///
    /// Exactly one outbound request corresponds to each accepted
    /// submission. Blank input and reentrant submits are rejected
    /// without touching the transcript.
    pub fn submit(&mut self, text: &str) -> Result<ProviderRequest, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if self.state == SessionState::AwaitingReply {
            return Err(SubmitError::RequestInFlight);
        }

        self.transcript.append(Sender::User, text);
        self.state = SessionState::AwaitingReply;
        Ok(self.build_request())
    }

    /// Build the provider request for the current transcript and mode.
    ///
    /// Deterministic: one leading system entry with the mode's
    /// instructions, then every transcript message in order.
    pub fn build_request(&self) -> ProviderRequest {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(ChatMessage::system(self.mode.instructions()));
        for msg in self.transcript.messages() {
            messages.push(match msg.sender {
                Sender::User => ChatMessage::user(&msg.text),
                Sender::Assistant => ChatMessage::assistant(&msg.text),
            });
        }

        ProviderRequest {
            messages,
            temperature: self.mode.temperature(),
            max_tokens: MAX_COMPLETION_TOKENS,
        }
    }

    /// Apply the outcome of the in-flight request.
    ///
    /// Appends exactly one assistant message and unconditionally returns
    /// the session to idle so the next submission becomes possible.
    pub fn apply_result(&mut self, outcome: SessionOutcome) {
        let text = match outcome {
            SessionOutcome::Reply(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    EMPTY_REPLY_FALLBACK.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            SessionOutcome::MissingCredential => {
                warn!("submission dropped: no API key configured");
                MISSING_KEY_REPLY.to_string()
            }
            SessionOutcome::TransportFailure { detail } => {
                warn!("provider call failed: {detail}");
                TRANSPORT_ERROR_REPLY.to_string()
            }
        };

        self.transcript.append(Sender::Assistant, text);
        self.state = SessionState::Idle;
    }

    /// Discard the conversation and reseed the new-chat greeting.
    ///
    /// Always succeeds. Any in-flight request is forgotten; callers that
    /// dispatched one are expected to drop its outcome (see the TUI's
    /// generation counter).
    pub fn clear(&mut self) {
        self.transcript = Transcript::seeded(NEW_CHAT_GREETING);
        self.state = SessionState::Idle;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

//! Integration tests for the conversation session manager

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rafiq::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use rafiq::provider::Role;
use rafiq::session::{
    ConversationMode, Sender, Session, SessionManager, SessionOutcome, MISSING_KEY_REPLY,
    NEW_CHAT_GREETING, TRANSPORT_ERROR_REPLY, WELCOME_GREETING,
};
use rafiq::tools::{self, ToolInput, ToolKind};
use rafiq::{AppConfig, ChatClient};
use tempfile::TempDir;

fn manager_with_store(store: Arc<dyn CredentialStore>) -> SessionManager {
    SessionManager::new(ChatClient::new(&AppConfig::default()), store)
}

/// A manager whose requests can never reach a server: any dispatch that
/// actually attempts the network fails fast with a connection error.
fn unroutable_manager(store: Arc<dyn CredentialStore>) -> SessionManager {
    let config = AppConfig {
        base_url: "http://127.0.0.1:9/v1".to_string(),
        ..AppConfig::default()
    };
    SessionManager::new(ChatClient::new(&config), store)
}

/// The request carries one leading system entry plus every transcript
/// message, roles mapped in order.
#[test]
fn test_build_request_entry_count_and_roles() {
    let mut session = Session::with_mode(ConversationMode::Analysis);
    let _ = session.submit("حلل هذا النص").unwrap();
    session.apply_result(SessionOutcome::Reply("تحليل".into()));
    let _ = session.submit("وماذا عن النبرة؟").unwrap();
    session.apply_result(SessionOutcome::Reply("النبرة ودية".into()));

    let request = session.build_request();
    assert_eq!(request.messages.len(), session.transcript().len() + 1);

    assert_eq!(request.messages[0].role, Role::System);
    for (entry, msg) in request.messages[1..]
        .iter()
        .zip(session.transcript().messages())
    {
        let expected = match msg.sender {
            Sender::User => Role::User,
            Sender::Assistant => Role::Assistant,
        };
        assert_eq!(entry.role, expected);
        assert_eq!(entry.content, msg.text);
    }
}

/// Clearing twice yields the same transcript as clearing once, apart
/// from timestamps.
#[test]
fn test_clear_is_idempotent() {
    let mut session = Session::new();
    let _ = session.submit("سؤال").unwrap();
    session.apply_result(SessionOutcome::Reply("جواب".into()));

    session.clear();
    let once: Vec<_> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| (m.sender, m.text.clone()))
        .collect();

    session.clear();
    let twice: Vec<_> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| (m.sender, m.text.clone()))
        .collect();

    assert_eq!(once, twice);
}

/// One accepted submission grows the transcript by exactly two entries.
#[tokio::test]
async fn test_append_only_growth() {
    let manager = manager_with_store(Arc::new(MemoryCredentialStore::new()));
    let mut session = Session::new();
    let before = session.transcript().len();

    manager.submit(&mut session, "مرحبا").await.unwrap();
    assert_eq!(session.transcript().len(), before + 2);
}

/// A second submit while one is awaiting a reply appends nothing and
/// produces no second request.
#[test]
fn test_reentrant_submit_is_rejected() {
    let mut session = Session::new();
    let _ = session.submit("الأولى").unwrap();
    let len_after_first = session.transcript().len();

    assert!(session.submit("الثانية").is_err());
    assert_eq!(session.transcript().len(), len_after_first);

    // Resolving the first submission frees the session again.
    session.apply_result(SessionOutcome::Reply("رد".into()));
    assert!(session.submit("الثانية").is_ok());
}

/// Scenario A: a cleared session holds a single assistant greeting.
#[test]
fn test_scenario_a_clear_yields_single_greeting() {
    let mut session = Session::new();
    assert_eq!(session.transcript().messages()[0].text, WELCOME_GREETING);

    session.clear();
    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Sender::Assistant);
    assert_eq!(messages[0].text, NEW_CHAT_GREETING);
}

/// Scenario B: submitting with no stored key appends the fixed
/// missing-credential reply and never attempts the network.
#[tokio::test]
async fn test_scenario_b_missing_credential() {
    // An unroutable endpoint: if the manager attempted a request at
    // all, the reply would be the transport-failure string instead.
    let manager = unroutable_manager(Arc::new(MemoryCredentialStore::new()));

    let mode: ConversationMode = "برمجة".parse().unwrap();
    let mut session = Session::with_mode(mode);
    let before = session.transcript().len();

    manager.submit(&mut session, "اشرح هذا الكود").await.unwrap();

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), before + 2);
    assert_eq!(messages[messages.len() - 2].sender, Sender::User);

    let last = messages.last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, MISSING_KEY_REPLY);
    assert!(!session.is_awaiting_reply());
}

/// Scenario C: a provider reply lands verbatim as the final assistant
/// message.
#[test]
fn test_scenario_c_reply_applied() {
    let mut session = Session::new();
    let _ = session.submit("سؤال").unwrap();
    session.apply_result(SessionOutcome::Reply("X".into()));

    let last = session.transcript().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, "X");
}

/// Scenario D: a failed provider call appends the fixed transport
/// failure reply and returns the session to idle.
#[tokio::test]
async fn test_scenario_d_transport_failure() {
    let temp = TempDir::new().unwrap();
    let store = FileCredentialStore::new(temp.path());
    store.set("sk-test-key").unwrap();

    let manager = unroutable_manager(Arc::new(store));
    let mut session = Session::new();

    manager.submit(&mut session, "مرحبا").await.unwrap();

    let last = session.transcript().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, TRANSPORT_ERROR_REPLY);
    assert!(!session.is_awaiting_reply());
}

/// Scenario E: creative vs general differ only in temperature, never
/// in entry structure.
#[test]
fn test_scenario_e_temperature_is_the_only_difference() {
    let mut session = Session::new();
    let _ = session.submit("اقترح فكرة").unwrap();
    session.apply_result(SessionOutcome::Reply("فكرة".into()));

    session.set_mode(ConversationMode::General);
    let general = session.build_request();
    session.set_mode(ConversationMode::Creative);
    let creative = session.build_request();

    assert_eq!(general.messages.len(), creative.messages.len());
    assert_eq!(general.max_tokens, creative.max_tokens);
    for (g, c) in general.messages.iter().zip(creative.messages.iter()) {
        assert_eq!(g.role, c.role);
    }
    // Transcript-derived entries are identical; only the leading
    // instruction entry tracks the mode.
    for (g, c) in general.messages[1..].iter().zip(creative.messages[1..].iter()) {
        assert_eq!(g.content, c.content);
    }

    assert_eq!(general.temperature, 0.7);
    assert_eq!(creative.temperature, 0.9);
}

/// Tools reuse the same credential short-circuit as the chat.
#[tokio::test]
async fn test_tool_run_without_key() {
    let manager = unroutable_manager(Arc::new(MemoryCredentialStore::new()));
    let input = ToolInput::new("نص للتلخيص");
    let result = tools::run(&manager, ToolKind::Summarize, &input).await;
    assert_eq!(result, MISSING_KEY_REPLY);
}

/// A key stored through the file store is picked up on the next
/// dispatch without rebuilding the manager.
#[tokio::test]
async fn test_key_saved_mid_session_is_picked_up() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileCredentialStore::new(temp.path()));
    let manager = unroutable_manager(store.clone());
    let mut session = Session::new();

    manager.submit(&mut session, "الأولى").await.unwrap();
    assert_eq!(session.transcript().last().unwrap().text, MISSING_KEY_REPLY);

    // Saving the key flips the next failure from missing-credential to
    // an actual (attempted) network failure.
    store.set("sk-test-key").unwrap();
    manager.submit(&mut session, "الثانية").await.unwrap();
    assert_eq!(
        session.transcript().last().unwrap().text,
        TRANSPORT_ERROR_REPLY
    );
}

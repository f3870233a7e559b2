//! Orchestration of one submission: credential lookup, dispatch, outcome.

use std::sync::Arc;

use tracing::warn;

use super::{Session, SessionOutcome, SubmitError};
use crate::credentials::CredentialStore;
use crate::provider::{ChatClient, ProviderRequest};

/// Ties the session core to the provider client and the credential
/// store. Cheap to clone; the TUI hands clones to spawned dispatch
/// tasks.
#[derive(Clone)]
pub struct SessionManager {
    client: ChatClient,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionManager {
    pub fn new(client: ChatClient, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Resolve a built request into an outcome.
    ///
    /// The credential is read fresh here, and a missing key
    /// short-circuits before any network attempt. Never returns an
    /// error: every failure becomes an outcome the session can apply.
    pub async fn dispatch(&self, request: ProviderRequest) -> SessionOutcome {
        let key = match self.credentials.get() {
            Ok(Some(key)) => key,
            Ok(None) => return SessionOutcome::MissingCredential,
            Err(e) => {
                warn!("credential store read failed: {e}");
                return SessionOutcome::MissingCredential;
            }
        };

        match self.client.complete(&key, request).await {
            Ok(text) => SessionOutcome::Reply(text),
            Err(e) => SessionOutcome::TransportFailure {
                detail: e.to_string(),
            },
        }
    }

    /// Submit, await the reply, and apply it in one call.
    ///
    /// Used by the plain CLI mode; the TUI splits the same steps so the
    /// dispatch can run on a spawned task.
    pub async fn submit(&self, session: &mut Session, text: &str) -> Result<(), SubmitError> {
        let request = session.submit(text)?;
        let outcome = self.dispatch(request).await;
        session.apply_result(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::credentials::MemoryCredentialStore;

    fn manager_without_key() -> SessionManager {
        let client = ChatClient::new(&AppConfig::default());
        SessionManager::new(client, Arc::new(MemoryCredentialStore::new()))
    }

    #[tokio::test]
    async fn test_dispatch_short_circuits_without_key() {
        let manager = manager_without_key();
        let request = Session::new().build_request();
        match manager.dispatch(request).await {
            SessionOutcome::MissingCredential => {}
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_round_trip_without_key() {
        let manager = manager_without_key();
        let mut session = Session::new();
        manager.submit(&mut session, "مرحبا").await.unwrap();

        assert_eq!(session.transcript().len(), 3);
        assert_eq!(
            session.transcript().last().unwrap().text,
            crate::session::MISSING_KEY_REPLY
        );
        assert!(!session.is_awaiting_reply());
    }
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{RelayError, Result};
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::message::Turn;
use crate::registry::SessionRegistry;

/// Rejects an empty user id or message. Only the empty string is refused;
/// whitespace is passed through untouched.
pub fn validate_input(user_id: &str, message: &str) -> Result<()> {
    if message.is_empty() {
        return Err(RelayError::InvalidInput("The message field is empty".into()));
    }
    if user_id.is_empty() {
        return Err(RelayError::InvalidInput("The user_id field is empty".into()));
    }
    Ok(())
}

/// Keeps per-user transcripts and forwards them to a completion provider.
///
/// Calls for the same user are serialized: the user's transcript stays locked
/// from appending the user turn until the assistant turn is recorded (or the
/// provider fails). Calls for different users run concurrently.
pub struct ConversationRelay<P: CompletionProvider> {
    registry: SessionRegistry,
    provider: Arc<P>,
    model: String,
    timeout: Duration,
}

impl<P: CompletionProvider> ConversationRelay<P> {
    pub fn new(
        registry: SessionRegistry,
        provider: Arc<P>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            provider,
            model: model.into(),
            timeout,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Appends `message` to the user's transcript, asks the provider for the
    /// next turn and records it.
    ///
    /// On provider failure the user turn stays recorded and no assistant turn
    /// is appended.
    pub async fn send(&self, user_id: &str, message: &str) -> Result<String> {
        validate_input(user_id, message)?;

        let (shared, created) = self.registry.open(user_id).await;
        if created {
            info!(user_id, "opening conversation");
        }

        let mut transcript = shared.lock().await;
        debug!(user_id, turns = transcript.len(), "conversation length");
        trace!(user_id, content = message, "user turn");
        transcript.push(Turn::user(message));

        let payload = transcript.to_payload()?;
        let request = CompletionRequest {
            model: &self.model,
            payload: &payload,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(RelayError::ProviderUnavailable(format!(
                "no response within {}s",
                self.timeout.as_secs_f32()
            ))),
        };

        let answer = match outcome {
            Ok(answer) => answer,
            Err(err) => {
                warn!(user_id, error = %err, "completion provider call failed");
                return Err(err);
            }
        };

        debug!(user_id, chars = answer.chars().count(), "assistant turn received");
        trace!(user_id, content = %answer, "assistant turn");
        transcript.push(Turn::assistant(answer.clone()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubProvider;
    use crate::message::Role;

    fn relay(stub: StubProvider) -> ConversationRelay<StubProvider> {
        ConversationRelay::new(
            SessionRegistry::new(),
            Arc::new(stub),
            "gemini-2.5-pro",
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn records_user_then_assistant() {
        let relay = relay(StubProvider::new(vec!["hi there".into()]));

        let answer = relay.send("alice", "hello").await.unwrap();

        assert_eq!(answer, "hi there");
        let transcript = relay.registry().snapshot("alice").await.unwrap();
        assert_eq!(
            transcript.turns(),
            &[Turn::user("hello"), Turn::assistant("hi there")]
        );
        let requests = relay.provider().requests();
        assert_eq!(requests[0].model, "gemini-2.5-pro");
        assert_eq!(requests[0].payload, r#"[{"role":"user","content":"hello"}]"#);
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected_without_entry() {
        let relay = relay(StubProvider::new(vec!["unused".into()]));

        let err = relay.send("", "hello").await.unwrap_err();

        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert!(relay.registry().is_empty().await);
        assert!(relay.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn whitespace_message_is_forwarded() {
        let relay = relay(StubProvider::new(vec!["¿Qué querés cocinar?".into()]));

        relay.send("alice", " ").await.unwrap();

        let transcript = relay.registry().snapshot("alice").await.unwrap();
        assert_eq!(transcript.turns()[0].content(), " ");
        assert_eq!(transcript.turns()[1].role(), Role::Assistant);
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_unavailable() {
        let stub = StubProvider::new(vec!["too late".into()]).with_delay(Duration::from_millis(200));
        let relay = ConversationRelay::new(
            SessionRegistry::new(),
            Arc::new(stub),
            "gemini-2.5-pro",
            Duration::from_millis(20),
        );

        let err = relay.send("bob", "hey").await.unwrap_err();

        assert!(matches!(err, RelayError::ProviderUnavailable(_)));
        let transcript = relay.registry().snapshot("bob").await.unwrap();
        assert_eq!(transcript.turns(), &[Turn::user("hey")]);
    }

    #[tokio::test]
    async fn malformed_reply_leaves_only_user_turn() {
        let relay = relay(StubProvider::scripted(vec![Err(
            RelayError::ProviderMalformedResponse("no candidates".into()),
        )]));

        let err = relay.send("bob", "hey").await.unwrap_err();

        assert_eq!(err.code(), "provider_unavailable");
        assert_eq!(relay.registry().snapshot("bob").await.unwrap().len(), 1);
    }
}

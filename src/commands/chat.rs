use serde::{Deserialize, Serialize};

use super::{require_login, run_metered, Outcome};
use crate::error::AppError;
use crate::metering::MeteredAction;
use crate::models::{ChatMessage, Role, Session};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Flag that shows the user's own key in clear instead of masked
pub const SHOW_API_KEY_FLAG: &str = "show_api_key";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Session,
    Server,
    Missing,
}

/// What the chat pages will bill to. The server key itself is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyView {
    pub source: KeySource,
    pub key: Option<String>,
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let hidden = if chars.len() > 4 { chars.len() - 4 } else { chars.len() };
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

/// Session key first, then the server key. Having neither fails validation
/// before the gate.
fn resolve_api_key(state: &AppState, session: &Session) -> Result<String, AppError> {
    session
        .api_key()
        .or(state.default_api_key.as_deref())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Please enter your API key".to_string()))
}

pub fn api_key(state: &AppState, session: &Session) -> ApiKeyView {
    match session.api_key() {
        Some(key) => ApiKeyView {
            source: KeySource::Session,
            key: Some(if session.flag(SHOW_API_KEY_FLAG) {
                key.to_string()
            } else {
                mask(key)
            }),
        },
        None if state.default_api_key.is_some() => ApiKeyView {
            source: KeySource::Server,
            key: None,
        },
        None => ApiKeyView {
            source: KeySource::Missing,
            key: None,
        },
    }
}

/// Store the user's own key for this session; blank or absent clears it
pub fn set_api_key(state: &AppState, session: &mut Session, key: Option<String>) -> ApiKeyView {
    session.set_api_key(key);
    tracing::info!(
        "API key {} for {}",
        if session.api_key().is_some() { "set" } else { "cleared" },
        session.username().unwrap_or("anonymous")
    );
    api_key(state, session)
}

fn validate_prompt(prompt: &str) -> Result<&str, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("Prompt must not be empty".to_string()));
    }
    Ok(prompt)
}

/// One-shot completion; history is not touched
pub async fn simple_chat(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
    prompt: &str,
) -> Result<Outcome<ChatReply>, AppError> {
    require_login(session)?;
    let prompt = validate_prompt(prompt)?;
    let key = resolve_api_key(state, session)?;
    let inference = state.inference.clone();

    run_metered(state, session_id, session, MeteredAction::SimpleChat, || async move {
        let reply = inference.complete(&key, prompt).await?;
        Ok(ChatReply { reply })
    })
    .await
}

/// Multi-turn chat. Both turns are recorded only when the remote call succeeds.
pub async fn assistant_chat(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
    prompt: &str,
) -> Result<Outcome<ChatReply>, AppError> {
    require_login(session)?;
    let prompt = validate_prompt(prompt)?.to_string();
    let key = resolve_api_key(state, session)?;

    let mut conversation = session.chat_history().to_vec();
    conversation.push(ChatMessage::user(prompt.clone()));
    let inference = state.inference.clone();

    let outcome = run_metered(state, session_id, session, MeteredAction::AssistantChat, || async move {
        let reply = inference.chat(&key, &conversation).await?;
        Ok(ChatReply { reply })
    })
    .await?;

    if let Outcome::Completed { value, .. } = &outcome {
        session.append_chat_message(Role::User, prompt);
        session.append_chat_message(Role::Assistant, value.reply.clone());
    }

    Ok(outcome)
}

pub fn chat_history(session: &Session) -> Vec<ChatMessage> {
    session.chat_history().to_vec()
}

pub fn clear_chat(session: &mut Session) -> Vec<ChatMessage> {
    session.clear_chat_history();
    session.chat_history().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{test_state, StubInference, SERVER_KEY};
    use crate::models::DEFAULT_GREETING;
    use crate::services::OpenAiClient;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_simple_chat_debits_one() {
        let state = test_state(Arc::new(StubInference::default())).await;
        let mut session = Session::authenticated_with("alice", 10);

        let outcome = simple_chat(&state, "s", &mut session, "hello").await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed {
                value: ChatReply {
                    reply: "echo: hello".into()
                },
                remaining_uses: 9
            }
        );
        assert_eq!(session.chat_history().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_gate() {
        let stub = Arc::new(StubInference::default());
        let state = test_state(stub.clone()).await;
        let mut session = Session::authenticated_with("alice", 10);

        let err = simple_chat(&state, "s", &mut session, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stub.calls(), 0);
        assert_eq!(session.remaining_uses(), 10);
    }

    #[tokio::test]
    async fn test_assistant_chat_records_turns() {
        let state = test_state(Arc::new(StubInference::default())).await;
        let mut session = Session::authenticated_with("alice", 10);

        let outcome = assistant_chat(&state, "s", &mut session, "hi").await.unwrap();
        assert!(matches!(outcome, Outcome::Completed { remaining_uses: 5, .. }));

        let history = session.chat_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], ChatMessage::user("hi"));
        // stub replies with the length of the conversation it was sent
        assert_eq!(history[2], ChatMessage::assistant("reply #2"));
    }

    #[tokio::test]
    async fn test_assistant_chat_denied_with_three_left() {
        let stub = Arc::new(StubInference::default());
        let state = test_state(stub.clone()).await;
        let mut session = Session::authenticated_with("alice", 3);

        let outcome = assistant_chat(&state, "s", &mut session, "hi").await.unwrap();
        assert!(outcome.is_denied());
        assert_eq!(session.remaining_uses(), 3);
        assert_eq!(session.chat_history().len(), 1);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_assistant_chat_failure_keeps_history_and_balance() {
        let state = test_state(Arc::new(StubInference::failing())).await;
        let mut session = Session::authenticated_with("alice", 10);

        let err = assistant_chat(&state, "s", &mut session, "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(session.remaining_uses(), 10);
        assert_eq!(session.chat_history().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_500_does_not_debit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&crate::config::InferenceConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();
        let state = test_state(Arc::new(client)).await;
        let mut session = Session::authenticated_with("alice", 1);

        let result = simple_chat(&state, "s", &mut session, "hello").await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(session.remaining_uses(), 1);
    }

    #[tokio::test]
    async fn test_session_key_wins_over_server_key() {
        let stub = Arc::new(StubInference::default());
        let state = test_state(stub.clone()).await;
        let mut session = Session::authenticated_with("alice", 10);

        simple_chat(&state, "s", &mut session, "one").await.unwrap();
        session.set_api_key(Some("r8_mine".into()));
        assistant_chat(&state, "s", &mut session, "two").await.unwrap();

        assert_eq!(stub.keys(), vec![SERVER_KEY.to_string(), "r8_mine".to_string()]);
    }

    #[tokio::test]
    async fn test_no_key_anywhere_rejected_before_gate() {
        let stub = Arc::new(StubInference::default());
        let mut state = test_state(stub.clone()).await;
        state.default_api_key = None;
        let mut session = Session::authenticated_with("alice", 10);

        let err = simple_chat(&state, "s", &mut session, "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = assistant_chat(&state, "s", &mut session, "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(stub.calls(), 0);
        assert_eq!(session.remaining_uses(), 10);
        assert_eq!(api_key(&state, &session).source, KeySource::Missing);
    }

    #[tokio::test]
    async fn test_anonymous_chat_needs_login_before_validation() {
        let state = test_state(Arc::new(StubInference::default())).await;
        let mut session = Session::initialize();

        let err = simple_chat(&state, "s", &mut session, "  ").await.unwrap_err();
        assert!(matches!(err, AppError::LoginRequired));
    }

    #[tokio::test]
    async fn test_api_key_view_masks_unless_shown() {
        let state = test_state(Arc::new(StubInference::default())).await;
        let mut session = Session::authenticated_with("alice", 10);
        assert_eq!(
            api_key(&state, &session),
            ApiKeyView {
                source: KeySource::Server,
                key: None
            }
        );

        let view = set_api_key(&state, &mut session, Some("r8_abcdef".into()));
        assert_eq!(view.source, KeySource::Session);
        assert_eq!(view.key.as_deref(), Some("*****cdef"));

        session.toggle_flag(SHOW_API_KEY_FLAG);
        assert_eq!(api_key(&state, &session).key.as_deref(), Some("r8_abcdef"));

        let view = set_api_key(&state, &mut session, None);
        assert_eq!(view.source, KeySource::Server);
    }

    #[test]
    fn test_mask_short_keys_fully() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("abcd"), "****");
        assert_eq!(mask("abcde"), "*bcde");
    }

    #[test]
    fn test_clear_chat_after_four_messages() {
        let mut session = Session::authenticated_with("alice", 10);
        session.append_chat_message(Role::User, "a");
        session.append_chat_message(Role::Assistant, "b");
        session.append_chat_message(Role::User, "c");

        let history = clear_chat(&mut session);
        assert_eq!(history, vec![ChatMessage::assistant(DEFAULT_GREETING)]);
        assert_eq!(chat_history(&session).len(), 1);
    }
}

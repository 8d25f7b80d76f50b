use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Session, SessionStatus, UserRecord};
use crate::AppState;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{1,64}$";

/// Username rules applied at signup, compiled once at start-up
pub struct UsernameRules {
    pattern: Option<Regex>,
}

impl UsernameRules {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(USERNAME_PATTERN).ok(),
        }
    }

    pub fn is_valid(&self, username: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|re| re.is_match(username))
            .unwrap_or(false)
    }
}

impl Default for UsernameRules {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Register a new user. The caller's session is left as it is.
pub async fn signup(state: &AppState, form: &Credentials) -> Result<(), AppError> {
    let username = form.username.trim();
    if !state.usernames.is_valid(username) {
        return Err(AppError::Validation(
            "Username must be 1-64 letters, digits, '.', '_' or '-'".to_string(),
        ));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".to_string()));
    }

    let created = state
        .db
        .create_user(&UserRecord::new(username.to_string(), form.password.clone()))
        .await?;

    if !created {
        return Err(AppError::DuplicateUsername(username.to_string()));
    }

    tracing::info!("User registered: {}", username);
    Ok(())
}

/// Check credentials and log the session in with the configured grant
pub async fn login(
    state: &AppState,
    session: &mut Session,
    form: &Credentials,
) -> Result<SessionStatus, AppError> {
    let username = form.username.trim();
    if !state.db.validate_credentials(username, &form.password).await? {
        tracing::info!("Login rejected for {}", username);
        return Err(AppError::InvalidCredentials);
    }

    session.login_with_grant(username, state.initial_grant);
    tracing::info!("User logged in: {} (grant={})", username, state.initial_grant);
    Ok(session.status())
}

pub fn logout(session: &mut Session) -> SessionStatus {
    if let Some(username) = session.username() {
        tracing::info!("User logged out: {}", username);
    }
    session.logout();
    session.status()
}

pub fn status(session: &Session) -> SessionStatus {
    session.status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{test_state, StubInference};
    use std::sync::Arc;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let state = test_state(Arc::new(StubInference::default())).await;
        signup(&state, &creds("alice", "pw")).await.unwrap();

        let mut session = Session::initialize();
        let status = login(&state, &mut session, &creds("alice", "pw")).await.unwrap();
        assert!(status.authenticated);
        assert_eq!(status.username.as_deref(), Some("alice"));
        assert_eq!(status.remaining_uses, 10);
    }

    #[tokio::test]
    async fn test_duplicate_signup() {
        let state = test_state(Arc::new(StubInference::default())).await;
        signup(&state, &creds("alice", "pw")).await.unwrap();
        let err = signup(&state, &creds("alice", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername(name) if name == "alice"));
    }

    #[test]
    fn test_username_rules() {
        let rules = UsernameRules::new();
        assert!(rules.is_valid("alice.b-c_1"));
        assert!(!rules.is_valid(""));
        assert!(!rules.is_valid("has space"));
        assert!(!rules.is_valid(&"x".repeat(65)));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let state = test_state(Arc::new(StubInference::default())).await;
        assert!(matches!(
            signup(&state, &creds("", "pw")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            signup(&state, &creds("bad name", "pw")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            signup(&state, &creds("alice", "")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session_unchanged() {
        let state = test_state(Arc::new(StubInference::default())).await;
        signup(&state, &creds("alice", "pw")).await.unwrap();

        let mut session = Session::initialize();
        let before = session.clone();
        let err = login(&state, &mut session, &creds("alice", "nope")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert_eq!(session, before);
    }

    #[test]
    fn test_logout_returns_anonymous_status() {
        let mut session = Session::authenticated_with("alice", 4);
        let status = logout(&mut session);
        assert!(!status.authenticated);
        assert_eq!(status.remaining_uses, 0);
        assert_eq!(status.username, None);
    }
}

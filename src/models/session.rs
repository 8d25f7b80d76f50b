use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opening line the assistant shows in a fresh chat
pub const DEFAULT_GREETING: &str = "How may I assist you today?";

/// Units granted on every successful login
pub const LOGIN_GRANT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    fn greeting() -> Self {
        Self::assistant(DEFAULT_GREETING)
    }
}

/// Per-user state for one login-to-logout interaction.
///
/// The counter is only moved through [`Session::withdraw`] and
/// [`Session::deposit`], which the metering layer owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    username: Option<String>,
    remaining_uses: u32,
    chat_history: Vec<ChatMessage>,
    flags: HashMap<String, bool>,
    /// Inference key entered by the user; wins over the server key
    api_key: Option<String>,
}

/// Snapshot returned to the client after every state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub username: Option<String>,
    pub remaining_uses: u32,
}

impl Session {
    /// Anonymous session with no credit
    pub fn initialize() -> Self {
        Self {
            authenticated: false,
            username: None,
            remaining_uses: 0,
            chat_history: vec![ChatMessage::greeting()],
            flags: HashMap::new(),
            api_key: None,
        }
    }

    /// Mark the session as logged in. Credentials must already be validated.
    pub fn login(&mut self, username: impl Into<String>) {
        self.login_with_grant(username, LOGIN_GRANT);
    }

    /// Same as [`Session::login`] with a deployment-specific grant
    pub fn login_with_grant(&mut self, username: impl Into<String>, grant: u32) {
        *self = Self::initialize();
        self.authenticated = true;
        self.username = Some(username.into());
        self.remaining_uses = grant;
    }

    pub fn logout(&mut self) {
        *self = Self::initialize();
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn remaining_uses(&self) -> u32 {
        self.remaining_uses
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn append_chat_message(&mut self, role: Role, content: impl Into<String>) {
        self.chat_history.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    pub fn clear_chat_history(&mut self) {
        self.chat_history = vec![ChatMessage::greeting()];
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    /// Flip a flag and return its new value
    pub fn toggle_flag(&mut self, name: &str) -> bool {
        let value = !self.flag(name);
        self.flags.insert(name.to_string(), value);
        value
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Store or clear the user's inference key. Blank input clears it.
    pub fn set_api_key(&mut self, key: Option<String>) {
        self.api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            authenticated: self.authenticated,
            username: self.username.clone(),
            remaining_uses: self.remaining_uses,
        }
    }

    /// Subtract `cost`, clamping at zero. Returns the new balance.
    pub(crate) fn withdraw(&mut self, cost: u32) -> u32 {
        self.remaining_uses = self.remaining_uses.saturating_sub(cost);
        self.remaining_uses
    }

    /// Add `amount`. Returns the new balance.
    pub(crate) fn deposit(&mut self, amount: u32) -> u32 {
        self.remaining_uses = self.remaining_uses.saturating_add(amount);
        self.remaining_uses
    }

    #[cfg(test)]
    pub(crate) fn authenticated_with(username: &str, remaining_uses: u32) -> Self {
        let mut session = Self::initialize();
        session.authenticated = true;
        session.username = Some(username.to_string());
        session.remaining_uses = remaining_uses;
        session
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_anonymous() {
        let session = Session::initialize();
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
        assert_eq!(session.remaining_uses(), 0);
        assert_eq!(session.chat_history(), &[ChatMessage::assistant(DEFAULT_GREETING)]);
    }

    #[test]
    fn test_login_always_grants_ten() {
        let mut session = Session::authenticated_with("alice", 0);
        session.login("alice");
        assert_eq!(session.remaining_uses(), 10);

        let mut rich = Session::authenticated_with("bob", 500);
        rich.login("bob");
        assert_eq!(rich.remaining_uses(), 10);
        assert_eq!(rich.username(), Some("bob"));
        assert!(rich.is_authenticated());
    }

    #[test]
    fn test_logout_resets_everything() {
        let mut session = Session::initialize();
        session.login("alice");
        session.append_chat_message(Role::User, "hi");
        session.set_flag("show_api_key", true);
        session.logout();

        assert_eq!(session, Session::initialize());
    }

    #[test]
    fn test_logout_then_login_matches_fresh_login() {
        let mut reused = Session::initialize();
        reused.login("alice");
        reused.append_chat_message(Role::User, "hello");
        reused.append_chat_message(Role::Assistant, "hi there");
        reused.toggle_flag("show_api_key");
        reused.withdraw(3);
        reused.logout();
        reused.login("carol");

        let mut fresh = Session::initialize();
        fresh.login("carol");

        assert_eq!(reused, fresh);
        assert!(!reused.flag("show_api_key"));
    }

    #[test]
    fn test_clear_history_leaves_single_greeting() {
        let mut session = Session::authenticated_with("alice", 10);
        session.append_chat_message(Role::User, "one");
        session.append_chat_message(Role::Assistant, "two");
        session.append_chat_message(Role::User, "three");
        assert_eq!(session.chat_history().len(), 4);

        session.clear_chat_history();
        assert_eq!(session.chat_history().len(), 1);
        assert_eq!(session.chat_history()[0].role, Role::Assistant);
        assert_eq!(session.chat_history()[0].content, DEFAULT_GREETING);
    }

    #[test]
    fn test_history_keeps_insertion_order() {
        let mut session = Session::initialize();
        session.append_chat_message(Role::User, "a");
        session.append_chat_message(Role::Assistant, "b");
        let contents: Vec<&str> = session
            .chat_history()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec![DEFAULT_GREETING, "a", "b"]);
    }

    #[test]
    fn test_flags_default_false_and_toggle() {
        let mut session = Session::initialize();
        assert!(!session.flag("show_api_key"));
        assert!(session.toggle_flag("show_api_key"));
        assert!(session.flag("show_api_key"));
        assert!(!session.toggle_flag("show_api_key"));
    }

    #[test]
    fn test_api_key_cleared_on_logout() {
        let mut session = Session::authenticated_with("alice", 10);
        session.set_api_key(Some(" r8_user ".into()));
        assert_eq!(session.api_key(), Some("r8_user"));

        session.set_api_key(Some("   ".into()));
        assert_eq!(session.api_key(), None);

        session.set_api_key(Some("r8_user".into()));
        session.logout();
        assert_eq!(session.api_key(), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hey")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hey"}"#);
    }
}

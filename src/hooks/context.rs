use serde::{Deserialize, Serialize};

use crate::metering::MeteredAction;

/// Context for a metered action about to run
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Unique action identifier
    pub action_id: String,
    /// Registry id of the session performing the action
    pub session_id: String,
    pub username: Option<String>,
    pub action: MeteredAction,
    /// Configured cost for this action
    pub cost: u32,
    /// Balance before any debit
    pub remaining_before: u32,
    /// Unix epoch seconds
    pub timestamp: i64,
    pub timestamp_iso: String,
}

impl ActionContext {
    pub fn new(
        session_id: &str,
        username: Option<&str>,
        action: MeteredAction,
        cost: u32,
        remaining_before: u32,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            username: username.map(str::to_string),
            action,
            cost,
            remaining_before,
            timestamp: now.timestamp(),
            timestamp_iso: now.to_rfc3339(),
        }
    }

    /// First 16 chars of the session id, used for log file naming
    pub fn short_session_id(&self) -> String {
        self.session_id.chars().take(16).collect()
    }
}

/// What happened once the action finished
#[derive(Debug, Clone, Default)]
pub struct OutcomeContext {
    pub is_success: bool,
    /// Set when the gate refused the action before it ran
    pub denied: bool,
    pub error_message: Option<String>,
    /// Balance after settlement (unchanged on failure or denial)
    pub remaining_after: u32,
    pub duration_ms: u64,
    pub timestamp: i64,
}

impl OutcomeContext {
    pub fn success(remaining_after: u32) -> Self {
        Self {
            is_success: true,
            remaining_after,
            timestamp: chrono::Utc::now().timestamp(),
            ..Default::default()
        }
    }

    pub fn failure(remaining_after: u32, msg: String) -> Self {
        Self {
            is_success: false,
            error_message: Some(msg),
            remaining_after,
            timestamp: chrono::Utc::now().timestamp(),
            ..Default::default()
        }
    }

    pub fn denied(remaining_after: u32, warning: String) -> Self {
        Self {
            denied: true,
            ..Self::failure(remaining_after, warning)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// JSON structure for usage log files
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub action_id: String,
    pub session_id: String,
    pub username: Option<String>,
    pub action: MeteredAction,
    pub cost: u32,
    pub remaining_before: u32,
    pub remaining_after: u32,
    pub success: bool,
    pub denied: bool,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub timestamp: i64,
    pub timestamp_iso: String,
}

impl UsageLogEntry {
    pub fn from_contexts(action: &ActionContext, outcome: &OutcomeContext) -> Self {
        Self {
            action_id: action.action_id.clone(),
            session_id: action.session_id.clone(),
            username: action.username.clone(),
            action: action.action,
            cost: action.cost,
            remaining_before: action.remaining_before,
            remaining_after: outcome.remaining_after,
            success: outcome.is_success,
            denied: outcome.denied,
            error_message: outcome.error_message.clone(),
            duration_ms: outcome.duration_ms,
            timestamp: action.timestamp,
            timestamp_iso: action.timestamp_iso.clone(),
        }
    }
}

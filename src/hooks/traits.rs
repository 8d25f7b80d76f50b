use async_trait::async_trait;
use super::context::{ActionContext, OutcomeContext};

/// Hook trait for observing the metered action lifecycle (read-only).
/// Only `on_action_complete` is required; the per-outcome callbacks default to no-ops.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Called after the gate admits the action, before it runs
    async fn on_action_before(&self, _ctx: &ActionContext) {}

    /// Called when the action succeeded and the debit was applied
    async fn on_action_success(&self, _ctx: &ActionContext, _outcome: &OutcomeContext) {}

    /// Called when the action failed; no debit was applied
    async fn on_action_failed(&self, _ctx: &ActionContext, _outcome: &OutcomeContext) {}

    /// Called when the gate refused the action
    async fn on_action_denied(&self, _ctx: &ActionContext, _outcome: &OutcomeContext) {}

    /// Called once per action, whatever the outcome
    async fn on_action_complete(&self, ctx: &ActionContext, outcome: &OutcomeContext);

    /// Return the hook name for logging purposes
    fn name(&self) -> &'static str;
}

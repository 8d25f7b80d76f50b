pub mod account;
pub mod auth;
pub mod chat;
pub mod content;
pub mod media;

use serde::Serialize;
use std::future::Future;
use std::time::Instant;

use crate::error::AppError;
use crate::hooks::{ActionContext, OutcomeContext};
use crate::metering::{Denial, MeteredAction};
use crate::models::Session;
use crate::AppState;

/// Result of a metered action that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Completed { value: T, remaining_uses: u32 },
    Denied(Denial),
}

impl<T> Outcome<T> {
    pub fn is_denied(&self) -> bool {
        matches!(self, Outcome::Denied(_))
    }
}

/// Metered actions are only offered to logged-in sessions
pub(crate) fn require_login(session: &Session) -> Result<(), AppError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::LoginRequired)
    }
}

/// Gate, run and settle one metered action.
///
/// The balance is debited only when `op` succeeds. A denial or a failed
/// `op` leaves it untouched.
pub(crate) async fn run_metered<T, F, Fut>(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
    action: MeteredAction,
    op: F,
) -> Result<Outcome<T>, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    require_login(session)?;

    let ctx = ActionContext::new(
        session_id,
        session.username(),
        action,
        state.gate.costs().cost(action),
        session.remaining_uses(),
    );

    if let Err(denial) = state.gate.admit(session, action) {
        let outcome = OutcomeContext::denied(session.remaining_uses(), denial.warning.clone());
        state.hooks.trigger_outcome(&ctx, &outcome).await;
        return Ok(Outcome::Denied(denial));
    }

    state.hooks.trigger_action_before(&ctx).await;
    let started = Instant::now();

    match op().await {
        Ok(value) => {
            let remaining_uses = state.gate.settle(session, action);
            let outcome = OutcomeContext::success(remaining_uses)
                .with_duration(started.elapsed().as_millis() as u64);
            state.hooks.trigger_outcome(&ctx, &outcome).await;

            tracing::info!(
                "ACTION: {} | User: {} | Remaining: {}",
                action,
                session.username().unwrap_or("unknown"),
                remaining_uses
            );
            Ok(Outcome::Completed {
                value,
                remaining_uses,
            })
        }
        Err(e) => {
            let outcome = OutcomeContext::failure(session.remaining_uses(), e.to_string())
                .with_duration(started.elapsed().as_millis() as u64);
            state.hooks.trigger_outcome(&ctx, &outcome).await;

            tracing::warn!("ACTION FAILED: {} | {} | no debit applied", action, e);
            Err(e)
        }
    }
}

use serde::Serialize;

use super::{CostTable, MeteredAction};
use crate::models::Session;

/// `true` iff the session has any credit left
pub fn check_access(session: &Session) -> bool {
    session.remaining_uses() > 0
}

/// Subtract `cost` from the balance, clamping at zero
pub fn debit(session: &mut Session, cost: u32) -> u32 {
    session.withdraw(cost)
}

/// Add `amount` to the balance. No upper bound.
pub fn credit(session: &mut Session, amount: u32) -> u32 {
    session.deposit(amount)
}

/// Soft rejection shown to the user when credit is short
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub action: MeteredAction,
    pub cost: u32,
    pub remaining_uses: u32,
    pub warning: String,
}

/// Pre-check and debit policy for metered actions
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    costs: CostTable,
}

impl AccessGate {
    pub fn new(costs: CostTable) -> Self {
        Self { costs }
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// Decide whether `action` may run. Returns the cost that will be
    /// settled on success; never touches the balance.
    pub fn admit(&self, session: &Session, action: MeteredAction) -> Result<u32, Denial> {
        let cost = self.costs.cost(action);
        let remaining = session.remaining_uses();

        if !check_access(session) || remaining < cost {
            tracing::info!(
                "GATE: denied {} for {} (cost={}, remaining={})",
                action,
                session.username().unwrap_or("anonymous"),
                cost,
                remaining
            );
            return Err(Denial {
                action,
                cost,
                remaining_uses: remaining,
                warning: format!(
                    "Not enough remaining uses for {} (needs {}, have {}). Please recharge.",
                    action, cost, remaining
                ),
            });
        }

        Ok(cost)
    }

    /// Debit the configured cost once `action` has completed successfully
    pub fn settle(&self, session: &mut Session, action: MeteredAction) -> u32 {
        let cost = self.costs.cost(action);
        let remaining = debit(session, cost);
        tracing::debug!("GATE: settled {} cost={} remaining={}", action, cost, remaining);
        remaining
    }
}

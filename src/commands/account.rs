use serde::Serialize;

use crate::error::AppError;
use crate::metering::credit;
use crate::models::Session;
use crate::services::RechargeForm;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RechargeReceipt {
    pub credited: u32,
    pub remaining_uses: u32,
}

/// Validate the mock payment form and credit the chosen package
pub fn recharge(
    state: &AppState,
    session: &mut Session,
    form: &RechargeForm,
) -> Result<RechargeReceipt, AppError> {
    if !session.is_authenticated() {
        return Err(AppError::LoginRequired);
    }

    let amount = state.recharge.validate(form)?;
    let remaining_uses = credit(session, amount);
    tracing::info!(
        "RECHARGE: {} +{} -> {}",
        session.username().unwrap_or("unknown"),
        amount,
        remaining_uses
    );

    Ok(RechargeReceipt {
        credited: amount,
        remaining_uses,
    })
}

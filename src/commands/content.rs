use serde::Serialize;

use super::{run_metered, Outcome};
use crate::error::AppError;
use crate::metering::MeteredAction;
use crate::models::Session;
use crate::AppState;

pub const REVEAL_FLAG: &str = "reveal_text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagState {
    pub name: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealedText {
    pub text: String,
}

pub fn toggle_flag(session: &mut Session, name: &str) -> Result<FlagState, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Flag name must not be empty".to_string()));
    }
    if name == REVEAL_FLAG {
        return Err(AppError::Validation(format!(
            "'{}' is only set by unlocking the hidden text",
            REVEAL_FLAG
        )));
    }
    let value = session.toggle_flag(name);
    Ok(FlagState {
        name: name.to_string(),
        value,
    })
}

/// Show the hidden text again without charge once this session unlocked it
pub fn revealed_text(state: &AppState, session: &Session) -> Result<RevealedText, AppError> {
    if !session.flag(REVEAL_FLAG) {
        return Err(AppError::Locked(
            "Hidden text is locked; unlock it first".to_string(),
        ));
    }
    Ok(RevealedText {
        text: state.hidden_text.clone(),
    })
}

/// Unlock the hidden text for this session
pub async fn reveal_text(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
) -> Result<Outcome<RevealedText>, AppError> {
    let text = state.hidden_text.clone();
    let outcome = run_metered(state, session_id, session, MeteredAction::RevealText, || async move {
        Ok(RevealedText { text })
    })
    .await?;

    if !outcome.is_denied() {
        session.set_flag(REVEAL_FLAG, true);
    }
    Ok(outcome)
}

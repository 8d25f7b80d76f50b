use serde::{Deserialize, Serialize};

use super::{require_login, run_metered, Outcome};
use crate::error::AppError;
use crate::metering::MeteredAction;
use crate::models::Session;
use crate::services::{FilterKind, VideoEntry};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct PlayRequest {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playback {
    pub label: String,
    pub url: String,
}

/// Run a named filter over an uploaded image and return PNG bytes
pub async fn apply_image_filter(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
    image: bytes::Bytes,
    filter: &str,
) -> Result<Outcome<Vec<u8>>, AppError> {
    require_login(session)?;
    let filter: FilterKind = filter.parse()?;
    if image.is_empty() {
        return Err(AppError::Validation("Please upload an image file".to_string()));
    }
    let filters = state.filters.clone();

    run_metered(state, session_id, session, MeteredAction::ImageFilter, || async move {
        tokio::task::spawn_blocking(move || filters.apply(&image, filter))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("filter task panicked: {}", e)))?
    })
    .await
}

pub fn list_videos(state: &AppState) -> Vec<VideoEntry> {
    state.catalog.entries().to_vec()
}

pub async fn play_video(
    state: &AppState,
    session_id: &str,
    session: &mut Session,
    label: &str,
) -> Result<Outcome<Playback>, AppError> {
    require_login(session)?;
    let url = state
        .catalog
        .url_for(label)
        .ok_or_else(|| AppError::Validation(format!("Unknown video: {}", label)))?
        .to_string();

    run_metered(state, session_id, session, MeteredAction::VideoPlay, || async move {
        Ok(Playback {
            label: label.to_string(),
            url,
        })
    })
    .await
}

pub mod gate;

pub use gate::{credit, AccessGate, Denial};

use serde::{Deserialize, Serialize};

/// Every action that consumes units from a session's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteredAction {
    ImageFilter,
    VideoPlay,
    SimpleChat,
    AssistantChat,
    RevealText,
}

impl MeteredAction {
    pub const ALL: [MeteredAction; 5] = [
        MeteredAction::ImageFilter,
        MeteredAction::VideoPlay,
        MeteredAction::SimpleChat,
        MeteredAction::AssistantChat,
        MeteredAction::RevealText,
    ];

    /// Key used in config files and usage logs
    pub fn key(&self) -> &'static str {
        match self {
            MeteredAction::ImageFilter => "image_filter",
            MeteredAction::VideoPlay => "video_play",
            MeteredAction::SimpleChat => "simple_chat",
            MeteredAction::AssistantChat => "assistant_chat",
            MeteredAction::RevealText => "reveal_text",
        }
    }
}

impl std::fmt::Display for MeteredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Debit applied after each kind of action succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub image_filter: u32,
    pub video_play: u32,
    pub simple_chat: u32,
    pub assistant_chat: u32,
    pub reveal_text: u32,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            image_filter: 1,
            video_play: 1,
            simple_chat: 1,
            assistant_chat: 5,
            reveal_text: 10,
        }
    }
}

impl CostTable {
    pub fn cost(&self, action: MeteredAction) -> u32 {
        match action {
            MeteredAction::ImageFilter => self.image_filter,
            MeteredAction::VideoPlay => self.video_play,
            MeteredAction::SimpleChat => self.simple_chat,
            MeteredAction::AssistantChat => self.assistant_chat,
            MeteredAction::RevealText => self.reveal_text,
        }
    }

    /// Every cost must be positive
    pub fn validate(&self) -> anyhow::Result<()> {
        for action in MeteredAction::ALL {
            if self.cost(action) == 0 {
                anyhow::bail!("cost for '{}' must be a positive integer", action);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_costs() {
        let costs = CostTable::default();
        assert_eq!(costs.cost(MeteredAction::ImageFilter), 1);
        assert_eq!(costs.cost(MeteredAction::VideoPlay), 1);
        assert_eq!(costs.cost(MeteredAction::SimpleChat), 1);
        assert_eq!(costs.cost(MeteredAction::AssistantChat), 5);
        assert_eq!(costs.cost(MeteredAction::RevealText), 10);
        assert!(costs.validate().is_ok());
    }

    #[test]
    fn test_zero_cost_is_rejected() {
        let costs = CostTable {
            video_play: 0,
            ..Default::default()
        };
        let err = costs.validate().unwrap_err();
        assert!(err.to_string().contains("video_play"));
    }

    #[test]
    fn test_action_keys_match_serde_names() {
        for action in MeteredAction::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.key()));
        }
    }
}

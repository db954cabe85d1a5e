/// Persisted game state and the result of applying a batch to it
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of the game state record in the local store
pub const GAME_STATE_KEY: &str = "gameState";

/// The single persisted scoring record.
///
/// Always read and written as a whole. A missing record reads as `GameState::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub karma: i64,
    pub total_tabs_closed: u64,
    /// Unlocked badge ids in unlock order, no duplicates
    pub badges: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl GameState {
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b == badge_id)
    }

    /// Append a badge unless it is already present. Returns true when it was added.
    pub fn award_badge(&mut self, badge_id: &str) -> bool {
        if self.has_badge(badge_id) {
            return false;
        }
        self.badges.push(badge_id.to_string());
        true
    }
}

/// Outcome of one applied tab-close batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub new_state: GameState,
    pub added_karma: i64,
    pub is_bonus_window: bool,
    pub new_badges: Vec<String>,
}

/// Payload for the daily score submission to the ranking backend
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game_state::GameState;
use crate::settings::Settings;
use crate::store::{KeyValueStore, StoreError};

pub const INSTALLATION_ID_KEY: &str = "installationId";
pub const ANONYMOUS_ANGEL: &str = "Anonymous Angel";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub uuid: Uuid,
    pub angel_name: String,
    pub karma: i64,
    pub tabs_closed: u64,
    pub timestamp: DateTime<Utc>,
}

impl ScoreSubmission {
    pub fn from_state(uuid: Uuid, angel_name: &str, state: &GameState, timestamp: DateTime<Utc>) -> ScoreSubmission {
        let angel_name = angel_name.trim();
        ScoreSubmission {
            uuid,
            angel_name: if angel_name.is_empty() {
                ANONYMOUS_ANGEL.to_string()
            } else {
                angel_name.to_string()
            },
            karma: state.karma,
            tabs_closed: state.total_tabs_closed,
            timestamp,
        }
    }
}

/// This installation's id, created and persisted on first use
pub async fn installation_id<S: KeyValueStore>(store: &S) -> Result<Uuid, StoreError> {
    if let Some(value) = store.get(INSTALLATION_ID_KEY).await? {
        match serde_json::from_value::<Uuid>(value) {
            Ok(id) => return Ok(id),
            Err(e) => log::warn!("Replacing unreadable installation id: {}", e),
        }
    }

    let id = Uuid::new_v4();
    store.set(INSTALLATION_ID_KEY, serde_json::to_value(id)?).await?;
    log::info!("New installation id {}", id);
    Ok(id)
}

/// The submission for `state`, or `None` when the user has not opted in to ranking stats.
///
/// Without consent no installation id is created either.
pub async fn consented_submission<S: KeyValueStore>(
    store: &S,
    settings: &Settings,
    state: &GameState,
    timestamp: DateTime<Utc>,
) -> Result<Option<ScoreSubmission>, StoreError> {
    if !settings.consent_stats {
        log::debug!("Ranking stats not consented, skipping submission");
        return Ok(None);
    }

    let uuid = installation_id(store).await?;
    Ok(Some(ScoreSubmission::from_state(uuid, &settings.angel_name, state, timestamp)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use futures::executor::block_on;

    #[test]
    fn test_from_state() {
        let state = GameState {
            karma: 420,
            total_tabs_closed: 42,
            ..GameState::default()
        };
        let timestamp = Utc.with_ymd_and_hms(2024, 10, 28, 13, 0, 0).unwrap();

        let submission = ScoreSubmission::from_state(Uuid::nil(), " Gabriel ", &state, timestamp);
        let json = serde_json::to_value(&submission).unwrap();

        assert_eq!(json["uuid"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["angelName"], "Gabriel");
        assert_eq!(json["karma"], 420);
        assert_eq!(json["tabsClosed"], 42);
        assert_eq!(json["timestamp"], "2024-10-28T13:00:00Z");
    }

    #[test]
    fn test_empty_angel_name_is_anonymous() {
        let submission = ScoreSubmission::from_state(Uuid::nil(), "", &GameState::default(), Utc::now());
        assert_eq!(submission.angel_name, ANONYMOUS_ANGEL);
    }

    #[test]
    fn test_installation_id_is_stable() {
        let store = MemoryStore::new();

        let first = block_on(installation_id(&store)).unwrap();
        let second = block_on(installation_id(&store)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_installation_id_replaces_garbage() {
        let store = MemoryStore::new();
        block_on(store.set(INSTALLATION_ID_KEY, serde_json::json!(17))).unwrap();

        let id = block_on(installation_id(&store)).unwrap();

        assert_eq!(block_on(store.get(INSTALLATION_ID_KEY)).unwrap(), Some(serde_json::to_value(id).unwrap()));
    }

    #[test]
    fn test_no_submission_without_consent() {
        let store = MemoryStore::new();

        let submission = block_on(consented_submission(&store, &Settings::default(), &GameState::default(), Utc::now())).unwrap();

        assert_eq!(submission, None);
        assert_eq!(block_on(store.get(INSTALLATION_ID_KEY)).unwrap(), None);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_submission_with_consent() {
        let store = MemoryStore::new();
        let settings = Settings {
            consent_stats: true,
            angel_name: "Raphael".to_string(),
            ..Settings::default()
        };
        let state = GameState {
            karma: 90,
            total_tabs_closed: 9,
            ..GameState::default()
        };

        let submission = block_on(consented_submission(&store, &settings, &state, Utc::now())).unwrap().unwrap();

        assert_eq!(submission.angel_name, "Raphael");
        assert_eq!(submission.karma, 90);
        assert_eq!(submission.uuid, block_on(installation_id(&store)).unwrap());
    }
}

/// Local log of cleanups, stored under `tabHistory` in chrome.storage.local
use crate::tab_data::HistoryRecord;
use serde::{Deserialize, Serialize};

pub const HISTORY_KEY: &str = "tabHistory";

/// Oldest records are dropped beyond this many
pub const MAX_HISTORY_RECORDS: usize = 100;

/// History records, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TabHistory {
    pub records: Vec<HistoryRecord>,
}

impl TabHistory {
    pub fn new() -> Self {
        TabHistory {
            records: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: HistoryRecord) {
        self.records.push(record);
        if self.records.len() > MAX_HISTORY_RECORDS {
            let excess = self.records.len() - MAX_HISTORY_RECORDS;
            self.records.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// The newest `n` records, newest first
    pub fn recent(&self, n: usize) -> Vec<&HistoryRecord> {
        self.records.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab_data::SavedTab;
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_record(minutes: i64) -> HistoryRecord {
        HistoryRecord {
            date: Utc.with_ymd_and_hms(2024, 10, 28, 12, 0, 0).unwrap() + Duration::minutes(minutes),
            tabs: vec![SavedTab {
                url: "https://google.com".to_string(),
                title: "Google".to_string(),
            }],
        }
    }

    #[test]
    fn test_history_new() {
        let history = TabHistory::new();
        assert_eq!(history.len(), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_add_record() {
        let mut history = TabHistory::new();

        history.add_record(create_test_record(0));

        assert_eq!(history.len(), 1);
        assert_eq!(history.records[0].tabs[0].title, "Google");
    }

    #[test]
    fn test_add_record_keeps_newest_hundred() {
        let mut history = TabHistory::new();

        for minute in 0..105 {
            history.add_record(create_test_record(minute));
        }

        assert_eq!(history.len(), MAX_HISTORY_RECORDS);
        assert_eq!(history.records[0], create_test_record(5));
        assert_eq!(history.records[99], create_test_record(104));
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut history = TabHistory::new();
        for minute in 0..3 {
            history.add_record(create_test_record(minute));
        }

        let recent = history.recent(2);

        assert_eq!(recent, vec![&create_test_record(2), &create_test_record(1)]);
        assert_eq!(history.recent(10).len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut history = TabHistory::new();
        history.add_record(create_test_record(0));

        history.clear();

        assert!(history.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut history = TabHistory::new();
        history.add_record(create_test_record(0));

        let json = serde_json::to_value(&history).unwrap();
        let deserialized: TabHistory = serde_json::from_value(json.clone()).unwrap();

        assert!(json.is_array());
        assert_eq!(deserialized, history);
    }
}

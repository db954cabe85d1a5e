/// Data structures for tabs and the local history log
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A browser tab as reported by the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    pub fn new(id: i32, url: String, title: String) -> TabInfo {
        TabInfo { id, url, title }
    }
}

/// A tab kept in the history log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedTab {
    pub title: String,
    pub url: String,
}

impl From<&TabInfo> for SavedTab {
    fn from(tab: &TabInfo) -> Self {
        SavedTab {
            title: tab.title.clone(),
            url: tab.url.clone(),
        }
    }
}

/// One cleanup: the tabs that were open when it ran
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub date: DateTime<Utc>,
    pub tabs: Vec<SavedTab>,
}

impl HistoryRecord {
    pub fn new(date: DateTime<Utc>, tabs: &[TabInfo]) -> HistoryRecord {
        HistoryRecord {
            date,
            tabs: tabs.iter().map(SavedTab::from).collect(),
        }
    }
}

/// Last known URL of every open tab.
///
/// `tabs.onRemoved` only reports the tab id, so the URL has to be remembered
/// from `onCreated`/`onUpdated` while the tab is alive.
#[derive(Debug, Default)]
pub struct TabUrlTracker {
    urls: HashMap<i32, String>,
}

impl TabUrlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a snapshot of the currently open tabs
    pub fn seed(&mut self, tabs: &[TabInfo]) {
        self.urls = tabs.iter().map(|tab| (tab.id, tab.url.clone())).collect();
    }

    pub fn update(&mut self, tab_id: i32, url: &str) {
        self.urls.insert(tab_id, url.to_string());
    }

    /// Forget a closed tab, returning its last URL if it was known
    pub fn remove(&mut self, tab_id: i32) -> Option<String> {
        self.urls.remove(&tab_id)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

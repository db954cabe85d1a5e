/// Notification flavor text
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Reminder before the scheduled cleanup
    Warn,
    /// Scheduled cleanup has run
    Close,
    Ranking,
    /// Tabs were closed and scored
    Cleanup,
    /// Nothing left to close
    Clean,
}

struct FlavorText {
    title: &'static str,
    message: &'static str,
}

const WARN: &[FlavorText] = &[
    FlavorText { title: "⏰ Cleanup time is coming", message: "{count} tabs are open. Keep the ones you really need!" },
    FlavorText { title: "😇 Time to tidy up", message: "Good work today. How about clearing out the browser too?" },
    FlavorText { title: "🔥 Burn the tabs", message: "Too many tabs! Trim them down before the bonus window." },
];

const CLOSE: &[FlavorText] = &[
    FlavorText { title: "🚪 Browsing is over for today", message: "{count} tabs were recorded and closed." },
    FlavorText { title: "🌙 Good night, tabs", message: "Today's {count} tabs are saved to history. Get some rest." },
];

const RANKING: &[FlavorText] = &[
    FlavorText { title: "🏆 Daily ranking", message: "Today's tab destroyer results are in." },
    FlavorText { title: "💀 Survival report", message: "The count of today's clean-browser survivors is done." },
];

const CLEANUP: &[FlavorText] = &[
    FlavorText { title: "✨ Purified", message: "{count} tabs ascended. Karma {karma} ({delta})." },
    FlavorText { title: "🗑️ Eliminated", message: "{count} tabs removed. Karma {karma} ({delta})." },
];

const CLEAN: &[FlavorText] = &[
    FlavorText { title: "✨ Pristine", message: "Not a single tab to close. Keep it up!" },
    FlavorText { title: "🧘 Zen mode", message: "Zero tabs, clear mind." },
];

fn variants(kind: NotificationKind) -> &'static [FlavorText] {
    match kind {
        NotificationKind::Warn => WARN,
        NotificationKind::Close => CLOSE,
        NotificationKind::Ranking => RANKING,
        NotificationKind::Cleanup => CLEANUP,
        NotificationKind::Clean => CLEAN,
    }
}

/// Text handed to the bridge for display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub message: String,
}

/// Pick a random variant of `kind` and fill in `params`
pub fn notification_content(kind: NotificationKind, params: &HashMap<&str, String>) -> NotificationContent {
    let index = random_index(variants(kind).len());
    notification_content_at(kind, index, params)
}

/// Variant `index` (wrapping) of `kind`, with `params` filled in
pub fn notification_content_at(kind: NotificationKind, index: usize, params: &HashMap<&str, String>) -> NotificationContent {
    let options = variants(kind);
    let choice = &options[index % options.len()];

    NotificationContent {
        title: choice.title.to_string(),
        message: fill_placeholders(choice.message, params),
    }
}

/// Replace `{name}` with `params["name"]`; unknown placeholders stay as written
pub fn fill_placeholders(template: &str, params: &HashMap<&str, String>) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

    placeholder
        .replace_all(template, |caps: &Captures| {
            params
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn random_index(len: usize) -> usize {
    let mut buf = [0u8; 4];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u32::from_le_bytes(buf) as usize % len.max(1),
        Err(e) => {
            log::warn!("No randomness for flavor text: {}", e);
            0
        }
    }
}

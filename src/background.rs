/// Background service worker glue: tab events in, badge and notifications out
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::batch::{classify_url, ClosedTabBatch, Debouncer, FlushDecision, TabCloseKind};
use crate::clock::{Clock, SystemClock};
use crate::engine::ScoringEngine;
use crate::game_state::{GameState, ProcessResult};
use crate::history::{TabHistory, HISTORY_KEY};
use crate::notifications::{notification_content, NotificationKind};
use crate::scoring::badge_name;
use crate::settings::{Settings, CLOSE_ALARM, WARN_ALARM};
use crate::store::{self, ChromeStore};
use crate::submission::consented_submission;
use crate::tab_data::{HistoryRecord, TabInfo, TabUrlTracker};
use crate::updates::{update_status, Release};

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = getSettings)]
    async fn get_settings() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = getAllTabs)]
    async fn get_all_tabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = closeTabs)]
    async fn close_tabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = replaceAlarms)]
    async fn replace_alarms(alarms: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = scheduleFlush)]
    fn schedule_flush(delay_ms: f64, callback: &js_sys::Function);

    #[wasm_bindgen(js_name = setBadgeText)]
    fn set_badge_text(text: &str);

    #[wasm_bindgen(js_name = showNotification)]
    fn show_notification(title: &str, message: &str, require_interaction: bool, silent: bool);

    #[wasm_bindgen(catch, js_name = fetchLatestRelease)]
    async fn fetch_latest_release(repo: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = extensionVersion)]
    fn extension_version() -> String;
}

struct BackgroundWorker {
    engine: Rc<ScoringEngine<ChromeStore>>,
    debouncer: RefCell<Debouncer>,
    tabs: RefCell<TabUrlTracker>,
}

thread_local! {
    static WORKER: BackgroundWorker = BackgroundWorker {
        engine: Rc::new(ScoringEngine::with_system_clock(ChromeStore)),
        debouncer: RefCell::new(Debouncer::default()),
        tabs: RefCell::new(TabUrlTracker::new()),
    };
}

fn engine() -> Rc<ScoringEngine<ChromeStore>> {
    WORKER.with(|w| Rc::clone(&w.engine))
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {:?}", e)))
}

/// Chrome shows about four characters of badge text
const BADGE_TEXT_MAX: usize = 4;

const BADGE_UNITS: &[(u64, &str)] = &[
    (1_000, "k"),
    (1_000_000, "M"),
    (1_000_000_000, "G"),
    (1_000_000_000_000, "T"),
    (1_000_000_000_000_000, "P"),
    (1_000_000_000_000_000_000, "E"),
];

/// Badge text for the toolbar icon, never longer than four characters.
/// Large scores are truncated to the first unit that fits, e.g. 12345 → "12k".
pub fn format_badge_text(karma: i64) -> String {
    let plain = karma.to_string();
    if plain.len() <= BADGE_TEXT_MAX {
        return plain;
    }

    let sign = if karma < 0 { "-" } else { "" };
    let magnitude = karma.unsigned_abs();
    for (divisor, unit) in BADGE_UNITS {
        // A nonzero score never reads as zero
        let text = format!("{}{}{}", sign, (magnitude / divisor).max(1), unit);
        if text.len() <= BADGE_TEXT_MAX {
            return text;
        }
    }
    plain
}

/// Remember the URL a tab currently shows (tabs.onCreated / tabs.onUpdated)
pub fn on_tab_updated(tab_id: i32, url: &str) {
    WORKER.with(|w| w.tabs.borrow_mut().update(tab_id, url));
}

/// tabs.onRemoved: classify by the tab's last known URL. Tabs opened before the
/// worker started and never updated since are unknown and count as regular tabs.
pub fn on_tab_closed(tab_id: i32) {
    let url = WORKER.with(|w| w.tabs.borrow_mut().remove(tab_id));
    let kind = match url {
        Some(url) => classify_url(&url),
        None => {
            log::debug!("No URL known for tab {}", tab_id);
            TabCloseKind::Normal
        }
    };
    record_close(kind);
}

/// Load the URLs of all open tabs, e.g. when the service worker starts
pub async fn seed_tabs() -> Result<usize, JsValue> {
    let tabs = current_tabs().await?;
    WORKER.with(|w| w.tabs.borrow_mut().seed(&tabs));
    log::debug!("Tracking {} open tabs", tabs.len());
    Ok(tabs.len())
}

/// Record one closed tab by its last URL and arm the flush timer
pub fn on_tab_removed(url: &str) {
    record_close(classify_url(url));
}

fn record_close(kind: TabCloseKind) {
    let now = js_sys::Date::now();
    let due_at = WORKER.with(|w| w.debouncer.borrow_mut().record(kind, now));
    arm_flush(due_at - now);
}

fn arm_flush(delay_ms: f64) {
    let callback = Closure::once_into_js(flush_due);
    schedule_flush(delay_ms.max(0.0), callback.unchecked_ref());
}

fn flush_due() {
    let now = js_sys::Date::now();
    let decision = WORKER.with(|w| w.debouncer.borrow_mut().poll(now));

    match decision {
        FlushDecision::Ready(batch) => spawn_local(async move {
            if let Err(e) = apply_batch(batch).await {
                log::error!("Failed to score closed tabs: {:?}", e);
            }
        }),
        FlushDecision::Retry(delay_ms) => {
            log::debug!("Flush not due yet, retrying in {} ms", delay_ms);
            arm_flush(delay_ms);
        }
        FlushDecision::Idle => {}
    }
}

/// Drain whatever is pending right away, e.g. before the worker is suspended
pub async fn flush_now() -> Result<JsValue, JsValue> {
    let batch = WORKER.with(|w| w.debouncer.borrow_mut().take());
    match batch {
        Some(batch) => apply_batch(batch).await,
        None => Ok(JsValue::NULL),
    }
}

async fn apply_batch(batch: ClosedTabBatch) -> Result<JsValue, JsValue> {
    let result = engine()
        .process_batch(batch.normal_count, batch.blank_count)
        .await
        .map_err(to_js)?;

    match result {
        Some(result) => {
            announce(&result, batch.total()).await;
            to_js_value(&result)
        }
        None => Ok(JsValue::NULL),
    }
}

async fn announce(result: &ProcessResult, closed: u32) {
    set_badge_text(&format_badge_text(result.new_state.karma));

    let settings = load_settings().await;
    if !settings.enable_notification {
        return;
    }
    let silent = !settings.enable_sound;

    let params = HashMap::from([
        ("count", closed.to_string()),
        ("karma", result.new_state.karma.to_string()),
        ("delta", format!("{:+}", result.added_karma)),
    ]);
    let content = notification_content(NotificationKind::Cleanup, &params);
    show_notification(&content.title, &content.message, false, silent);

    let engine = engine();
    for badge in &result.new_badges {
        show_notification("🏅 Badge unlocked", badge_name(engine.badges(), badge), false, silent);
    }
}

async fn load_settings() -> Settings {
    let parsed = get_settings()
        .await
        .and_then(|js| serde_wasm_bindgen::from_value::<Settings>(js).map_err(JsValue::from));

    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Using default settings: {:?}", e);
            Settings::default()
        }
    }
}

pub async fn process_tab_batch(normal_count: u32, blank_count: u32) -> Result<JsValue, JsValue> {
    apply_batch(ClosedTabBatch { normal_count, blank_count }).await
}

pub async fn grant_bonus(amount: i32) -> Result<f64, JsValue> {
    let karma = engine().add_bonus(i64::from(amount)).await.map_err(to_js)?;
    set_badge_text(&format_badge_text(karma));
    Ok(karma as f64)
}

pub async fn game_state() -> Result<JsValue, JsValue> {
    let state: GameState = engine().load_state().await.map_err(to_js)?;
    to_js_value(&state)
}

pub fn is_bonus_window_now() -> bool {
    engine().is_bonus_window_now()
}

async fn current_tabs() -> Result<Vec<TabInfo>, JsValue> {
    let tabs_js = get_all_tabs().await?;
    serde_wasm_bindgen::from_value(tabs_js).map_err(|e| JsValue::from_str(&format!("Failed to parse tabs: {:?}", e)))
}

/// Append the currently open tabs to the history log and return them
pub async fn record_history() -> Result<Vec<TabInfo>, JsValue> {
    let tabs = current_tabs().await?;

    let mut history: TabHistory = store::load_or_default(&ChromeStore, HISTORY_KEY).await.map_err(to_js)?;
    history.add_record(HistoryRecord::new(Utc::now(), &tabs));
    store::save(&ChromeStore, HISTORY_KEY, &history).await.map_err(to_js)?;

    log::info!("Recorded {} tabs to history ({} records)", tabs.len(), history.len());
    Ok(tabs)
}

pub async fn clear_history() -> Result<(), JsValue> {
    store::save(&ChromeStore, HISTORY_KEY, &TabHistory::new()).await.map_err(to_js)?;
    log::info!("History cleared");
    Ok(())
}

pub async fn recent_history(limit: usize) -> Result<JsValue, JsValue> {
    let history: TabHistory = store::load_or_default(&ChromeStore, HISTORY_KEY).await.map_err(to_js)?;
    to_js_value(&history.recent(limit))
}

/// Register the warn and close alarms from the current settings
pub async fn setup_alarms() -> Result<(), JsValue> {
    let settings = load_settings().await;
    let plan = settings.alarm_plan(&SystemClock.now()).map_err(to_js)?;

    if plan.is_empty() {
        log::info!("Timer disabled");
    }
    replace_alarms(to_js_value(&plan)?).await?;
    for alarm in &plan {
        log::info!("Alarm {} set for {}", alarm.name, alarm.when);
    }
    Ok(())
}

pub async fn on_alarm(name: &str) -> Result<(), JsValue> {
    log::info!("Alarm fired: {}", name);

    match name {
        WARN_ALARM => {
            let count = current_tabs().await?.len();
            let kind = if count == 0 { NotificationKind::Clean } else { NotificationKind::Warn };
            notify(kind, count, true).await;
        }
        CLOSE_ALARM => {
            let tabs = record_history().await?;
            export_to_spreadsheet(tabs.len()).await;
            let tab_ids: Vec<i32> = tabs.iter().map(|t| t.id).collect();
            let kind = if tab_ids.is_empty() { NotificationKind::Clean } else { NotificationKind::Close };
            close_tabs(to_js_value(&tab_ids)?).await?;
            notify(kind, tab_ids.len(), false).await;
        }
        other => log::warn!("Unknown alarm {}", other),
    }
    Ok(())
}

// Delivery needs a separately deployed Apps Script endpoint; until then the
// export is only logged.
async fn export_to_spreadsheet(tab_count: usize) {
    match load_settings().await.spreadsheet_export(tab_count) {
        Ok(Some(export)) => log::info!(
            "Spreadsheet export: {} tabs to sheet {:?} of {}",
            export.tab_count,
            export.sheet_name,
            export.spreadsheet_id
        ),
        Ok(None) => {}
        Err(e) => log::error!("Spreadsheet export skipped: {}", e),
    }
}

async fn notify(kind: NotificationKind, count: usize, require_interaction: bool) {
    let settings = load_settings().await;
    if !settings.enable_notification {
        return;
    }
    let params = HashMap::from([("count", count.to_string())]);
    let content = notification_content(kind, &params);
    show_notification(&content.title, &content.message, require_interaction, !settings.enable_sound);
}

/// Today's score in the shape the ranking backend accepts, or null without stats consent
pub async fn score_submission() -> Result<JsValue, JsValue> {
    let settings = load_settings().await;
    let state = engine().load_state().await.map_err(to_js)?;

    let submission = consented_submission(&ChromeStore, &settings, &state, Utc::now())
        .await
        .map_err(to_js)?;
    match submission {
        Some(submission) => to_js_value(&submission),
        None => Ok(JsValue::NULL),
    }
}

/// Compare the latest GitHub release with the running version. Null when the check fails.
pub async fn check_for_updates() -> Result<JsValue, JsValue> {
    let release = match fetch_latest_release(crate::updates::GITHUB_REPO).await {
        Ok(js) if !js.is_null() => js,
        Ok(_) => return Ok(JsValue::NULL),
        Err(e) => {
            log::warn!("Update check failed: {:?}", e);
            return Ok(JsValue::NULL);
        }
    };
    let release: Release = serde_wasm_bindgen::from_value(release)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse release: {:?}", e)))?;

    let status = update_status(&release, &extension_version());
    if status.has_update {
        log::info!("Update available: {}", release.tag_name);
    }
    to_js_value(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_badge_text() {
        assert_eq!(format_badge_text(0), "0");
        assert_eq!(format_badge_text(9_999), "9999");
        assert_eq!(format_badge_text(-42), "-42");
        assert_eq!(format_badge_text(12_345), "12k");
        assert_eq!(format_badge_text(-10_500), "-10k");
        assert_eq!(format_badge_text(-999), "-999");
        assert_eq!(format_badge_text(999_999), "999k");
        assert_eq!(format_badge_text(1_000_000), "1M");
    }

    #[test]
    fn test_badge_text_fits_for_negative_scores() {
        assert_eq!(format_badge_text(-9_999), "-9k");
        assert_eq!(format_badge_text(-123_456), "-1M");
        assert_eq!(format_badge_text(i64::MAX), "9E");
        assert_eq!(format_badge_text(i64::MIN), "-9E");
    }

    proptest! {
        #[test]
        fn prop_badge_text_at_most_four_chars(karma in any::<i64>()) {
            prop_assert!(format_badge_text(karma).len() <= BADGE_TEXT_MAX);
        }
    }
}

/// Tab Cleanup - Chrome Extension that scores closing tabs
/// Built with Rust + WASM

mod background;
pub mod batch;
pub mod clock;
pub mod engine;
pub mod game_state;
pub mod history;
pub mod notifications;
pub mod scoring;
pub mod settings;
pub mod store;
pub mod submission;
pub mod tab_data;
pub mod updates;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Tab lifecycle, wired to chrome.tabs events by service_worker.js
#[wasm_bindgen(js_name = onTabUpdated)]
pub fn on_tab_updated(tab_id: i32, url: &str) {
    background::on_tab_updated(tab_id, url);
}

#[wasm_bindgen(js_name = onTabClosed)]
pub fn on_tab_closed(tab_id: i32) {
    background::on_tab_closed(tab_id);
}

#[wasm_bindgen(js_name = seedTabs)]
pub async fn seed_tabs() -> Result<usize, JsValue> {
    background::seed_tabs().await
}

// For hosts that already know the removed tab's last URL
#[wasm_bindgen(js_name = onTabRemoved)]
pub fn on_tab_removed(url: &str) {
    background::on_tab_removed(url);
}

#[wasm_bindgen(js_name = flushPendingTabs)]
pub async fn flush_pending_tabs() -> Result<JsValue, JsValue> {
    background::flush_now().await
}

// Scoring engine entry points
#[wasm_bindgen(js_name = processBatch)]
pub async fn process_batch(normal_count: u32, blank_count: u32) -> Result<JsValue, JsValue> {
    background::process_tab_batch(normal_count, blank_count).await
}

#[wasm_bindgen(js_name = addBonus)]
pub async fn add_bonus(amount: i32) -> Result<f64, JsValue> {
    background::grant_bonus(amount).await
}

#[wasm_bindgen(js_name = loadState)]
pub async fn load_state() -> Result<JsValue, JsValue> {
    background::game_state().await
}

#[wasm_bindgen(js_name = isBonusWindow)]
pub fn is_bonus_window() -> bool {
    background::is_bonus_window_now()
}

#[wasm_bindgen(js_name = isBlankTabUrl)]
pub fn is_blank_tab_url(url: &str) -> bool {
    batch::classify_url(url) == batch::TabCloseKind::Blank
}

// History log
#[wasm_bindgen(js_name = recordHistory)]
pub async fn record_history() -> Result<usize, JsValue> {
    background::record_history().await.map(|tabs| tabs.len())
}

#[wasm_bindgen(js_name = clearHistory)]
pub async fn clear_history() -> Result<(), JsValue> {
    background::clear_history().await
}

#[wasm_bindgen(js_name = recentHistory)]
pub async fn recent_history(limit: usize) -> Result<JsValue, JsValue> {
    background::recent_history(limit).await
}

// Schedule
#[wasm_bindgen(js_name = setupAlarms)]
pub async fn setup_alarms() -> Result<(), JsValue> {
    background::setup_alarms().await
}

#[wasm_bindgen(js_name = onAlarm)]
pub async fn on_alarm(name: String) -> Result<(), JsValue> {
    background::on_alarm(&name).await
}

// Ranking
#[wasm_bindgen(js_name = scoreSubmission)]
pub async fn score_submission() -> Result<JsValue, JsValue> {
    background::score_submission().await
}

#[wasm_bindgen(js_name = checkForUpdates)]
pub async fn check_for_updates() -> Result<JsValue, JsValue> {
    background::check_for_updates().await
}

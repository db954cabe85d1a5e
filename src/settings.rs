/// User options synced through chrome.storage.sync, and the alarm plan derived from them
use std::sync::OnceLock;

use chrono::{DateTime, Days, FixedOffset, NaiveTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WARN_ALARM: &str = "warnAlarm";
pub const CLOSE_ALARM: &str = "closeAlarm";

/// Alarms repeat daily
pub const ALARM_PERIOD_MINUTES: u32 = 24 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid time of day for {field}: {value:?} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(String),
    #[error("not a Google Sheets URL: {0:?}")]
    InvalidSpreadsheetUrl(String),
}

/// Options page settings. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub warn_time: String,
    pub close_time: String,
    pub enable_timer: bool,
    pub enable_notification: bool,
    pub enable_sound: bool,
    pub enable_spreadsheet: bool,
    pub spreadsheet_url: String,
    pub sheet_name: String,
    pub angel_name: String,
    pub consent_stats: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            warn_time: "18:00".to_string(),
            close_time: "21:00".to_string(),
            enable_timer: true,
            enable_notification: true,
            enable_sound: false,
            enable_spreadsheet: false,
            spreadsheet_url: String::new(),
            sheet_name: "tabCleaner".to_string(),
            angel_name: String::new(),
            consent_stats: false,
        }
    }
}

/// One repeating alarm to register with the host
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSpec {
    pub name: &'static str,
    /// First fire time, epoch milliseconds
    pub when: i64,
    pub period_in_minutes: u32,
}

impl Settings {
    /// Next warn and close alarms after `now`, or an empty plan when the timer is off
    pub fn alarm_plan(&self, now: &DateTime<FixedOffset>) -> Result<Vec<AlarmSpec>, SettingsError> {
        if !self.enable_timer {
            return Ok(Vec::new());
        }

        let warn = next_occurrence(parse_time_of_day("warnTime", &self.warn_time)?, now)?;
        let close = next_occurrence(parse_time_of_day("closeTime", &self.close_time)?, now)?;

        Ok(vec![
            AlarmSpec {
                name: WARN_ALARM,
                when: warn.timestamp_millis(),
                period_in_minutes: ALARM_PERIOD_MINUTES,
            },
            AlarmSpec {
                name: CLOSE_ALARM,
                when: close.timestamp_millis(),
                period_in_minutes: ALARM_PERIOD_MINUTES,
            },
        ])
    }
}

/// Where the cleanup log goes when spreadsheet export is on
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetExport {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub tab_count: usize,
}

impl Settings {
    /// Export target for a cleanup of `tab_count` tabs.
    ///
    /// `Ok(None)` when export is off or no URL is configured.
    pub fn spreadsheet_export(&self, tab_count: usize) -> Result<Option<SpreadsheetExport>, SettingsError> {
        if !self.enable_spreadsheet || self.spreadsheet_url.trim().is_empty() {
            return Ok(None);
        }

        let spreadsheet_id = spreadsheet_id(&self.spreadsheet_url)
            .ok_or_else(|| SettingsError::InvalidSpreadsheetUrl(self.spreadsheet_url.clone()))?;

        Ok(Some(SpreadsheetExport {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: self.sheet_name.clone(),
            tab_count,
        }))
    }
}

/// Spreadsheet id out of a sheet URL such as `https://docs.google.com/spreadsheets/d/<id>/edit`
pub fn spreadsheet_id(url: &str) -> Option<&str> {
    static SHEET_ID: OnceLock<Regex> = OnceLock::new();
    let pattern = SHEET_ID.get_or_init(|| Regex::new(r"/d/([a-zA-Z0-9\-_]+)").expect("sheet id pattern is valid"));
    pattern.captures(url).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Parse "HH:MM" (24-hour clock)
pub fn parse_time_of_day(field: &'static str, value: &str) -> Result<NaiveTime, SettingsError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| SettingsError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

/// `time` today in `now`'s offset, or tomorrow if that is not strictly after `now`
pub fn next_occurrence(time: NaiveTime, now: &DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, SettingsError> {
    let today = now.date_naive().and_time(time);
    let candidate = now
        .timezone()
        .from_local_datetime(&today)
        .single()
        .ok_or_else(|| SettingsError::NonexistentLocalTime(today.to_string()))?;

    if candidate > *now {
        return Ok(candidate);
    }

    let tomorrow = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| SettingsError::NonexistentLocalTime(today.to_string()))?;
    now.timezone()
        .from_local_datetime(&tomorrow)
        .single()
        .ok_or_else(|| SettingsError::NonexistentLocalTime(tomorrow.to_string()))
}

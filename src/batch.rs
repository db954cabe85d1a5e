/// Classification and debounced batching of closed tabs
use serde::{Deserialize, Serialize};
use url::Url;

/// Quiet period before a pending batch is handed to the engine
pub const DEFAULT_QUIET_PERIOD_MS: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabCloseKind {
    Normal,
    /// New-tab page or empty page
    Blank,
}

/// Classify a closed tab by its last URL
///
/// Examples:
/// - "" / "about:blank" → Blank
/// - chrome://newtab/ → Blank
/// - https://github.com → Normal
pub fn classify_url(url: &str) -> TabCloseKind {
    let url = url.trim();
    if url.is_empty() {
        return TabCloseKind::Blank;
    }

    match Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "about" => match parsed.path().trim_end_matches('/') {
                "blank" | "newtab" => TabCloseKind::Blank,
                _ => TabCloseKind::Normal,
            },
            "chrome" | "edge" | "brave" => {
                let host = parsed.host_str().unwrap_or_default();
                let bare = parsed.path().trim_matches('/').is_empty();
                if bare && matches!(host, "newtab" | "new-tab-page") {
                    TabCloseKind::Blank
                } else {
                    TabCloseKind::Normal
                }
            }
            _ => TabCloseKind::Normal,
        },
        Err(_) => TabCloseKind::Normal,
    }
}

/// Counts of closed tabs gathered over one debounce window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTabBatch {
    pub normal_count: u32,
    pub blank_count: u32,
}

impl ClosedTabBatch {
    pub fn with_event(self, kind: TabCloseKind) -> ClosedTabBatch {
        match kind {
            TabCloseKind::Normal => ClosedTabBatch {
                normal_count: self.normal_count.saturating_add(1),
                ..self
            },
            TabCloseKind::Blank => ClosedTabBatch {
                blank_count: self.blank_count.saturating_add(1),
                ..self
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normal_count == 0 && self.blank_count == 0
    }

    pub fn total(&self) -> u32 {
        self.normal_count.saturating_add(self.blank_count)
    }
}

/// What a fired flush timer should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlushDecision {
    /// Quiet period over: score this batch
    Ready(ClosedTabBatch),
    /// Tabs are pending but not yet due; re-arm a timer for this many ms
    Retry(f64),
    Idle,
}

/// Accumulates closed tabs until no new close has arrived for `quiet_period_ms`.
///
/// Time is passed in as milliseconds (e.g. `Date.now()`), the host owns the timers.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_period_ms: f64,
    pending: ClosedTabBatch,
    last_event_ms: Option<f64>,
}

impl Debouncer {
    pub fn new(quiet_period_ms: f64) -> Self {
        Debouncer {
            quiet_period_ms,
            pending: ClosedTabBatch::default(),
            last_event_ms: None,
        }
    }

    pub fn quiet_period_ms(&self) -> f64 {
        self.quiet_period_ms
    }

    pub fn pending(&self) -> ClosedTabBatch {
        self.pending
    }

    /// Add one closed tab. Returns the time at which the batch becomes due.
    pub fn record(&mut self, kind: TabCloseKind, now_ms: f64) -> f64 {
        self.pending = self.pending.with_event(kind);
        self.last_event_ms = Some(now_ms);
        now_ms + self.quiet_period_ms
    }

    /// When the pending batch becomes due, if anything is pending
    pub fn due_at(&self) -> Option<f64> {
        match self.last_event_ms {
            Some(last) if !self.pending.is_empty() => Some(last + self.quiet_period_ms),
            _ => None,
        }
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        match self.last_event_ms {
            Some(last) => !self.pending.is_empty() && now_ms - last >= self.quiet_period_ms,
            None => false,
        }
    }

    /// Drain the pending batch if the quiet period has passed
    pub fn take_if_due(&mut self, now_ms: f64) -> Option<ClosedTabBatch> {
        if self.is_due(now_ms) {
            self.take()
        } else {
            None
        }
    }

    /// Decide what a timer firing at `now_ms` does. A timer that fires early
    /// gets `Retry` so pending tabs always have a timer left to flush them.
    pub fn poll(&mut self, now_ms: f64) -> FlushDecision {
        if let Some(batch) = self.take_if_due(now_ms) {
            return FlushDecision::Ready(batch);
        }
        match self.due_at() {
            Some(due) => FlushDecision::Retry((due - now_ms).max(0.0)),
            None => FlushDecision::Idle,
        }
    }

    /// Drain the pending batch regardless of timing. Never yields an empty batch.
    pub fn take(&mut self) -> Option<ClosedTabBatch> {
        let batch = std::mem::take(&mut self.pending);
        self.last_event_ms = None;
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD_MS)
    }
}

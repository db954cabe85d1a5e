/// Scoring engine: applies tab-close batches and bonuses to the persisted game state
use chrono::Utc;
use futures::lock::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::game_state::{GameState, ProcessResult, GAME_STATE_KEY};
use crate::scoring::{award_badges, Badge, ScoringRules, BADGES};
use crate::store::{self, KeyValueStore, StoreError};

/// Owns the game-state store.
///
/// Every operation holds the store lock for its whole load-modify-save cycle, so
/// overlapping calls from the host run one after another instead of losing updates.
pub struct ScoringEngine<S, C = SystemClock> {
    store: Mutex<S>,
    clock: C,
    rules: ScoringRules,
    badges: &'static [Badge],
}

impl<S: KeyValueStore> ScoringEngine<S, SystemClock> {
    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> ScoringEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        ScoringEngine {
            store: Mutex::new(store),
            clock,
            rules: ScoringRules::default(),
            badges: BADGES,
        }
    }

    pub fn with_rules(mut self, rules: ScoringRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_badges(mut self, badges: &'static [Badge]) -> Self {
        self.badges = badges;
        self
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn badges(&self) -> &'static [Badge] {
        self.badges
    }

    pub fn is_bonus_window_now(&self) -> bool {
        self.rules.is_bonus_window(&self.clock.now())
    }

    /// Current persisted state, or the zero state when nothing has been saved yet
    pub async fn load_state(&self) -> Result<GameState, StoreError> {
        let store = self.store.lock().await;
        load_from(&*store).await
    }

    /// Persist `state` as a whole, stamped with the current time. Last writer wins.
    pub async fn save_state(&self, mut state: GameState) -> Result<GameState, StoreError> {
        let store = self.store.lock().await;
        self.save_to(&*store, &mut state).await?;
        Ok(state)
    }

    /// Apply one batch of closed tabs.
    ///
    /// Returns `Ok(None)` without touching storage when both counts are zero.
    pub async fn process_batch(&self, normal_count: u32, blank_count: u32) -> Result<Option<ProcessResult>, StoreError> {
        if normal_count == 0 && blank_count == 0 {
            return Ok(None);
        }

        let store = self.store.lock().await;
        let mut state = load_from(&*store).await?;

        let now = self.clock.now();
        let is_bonus_window = self.rules.is_bonus_window(&now);
        let added_karma = self.rules.compute_delta(normal_count, blank_count, &now);

        let closed = u64::from(normal_count) + u64::from(blank_count);
        state.karma = state.karma.saturating_add(added_karma);
        state.total_tabs_closed = state.total_tabs_closed.saturating_add(closed);
        let new_badges = award_badges(&mut state, self.badges);

        self.save_to(&*store, &mut state).await?;

        log::info!(
            "Closed {} tabs ({} blank): {:+} karma{}, total {}",
            closed,
            blank_count,
            added_karma,
            if is_bonus_window { " (bonus window)" } else { "" },
            state.karma
        );
        for badge in &new_badges {
            log::info!("Badge unlocked: {}", badge);
        }

        Ok(Some(ProcessResult {
            new_state: state,
            added_karma,
            is_bonus_window,
            new_badges,
        }))
    }

    /// Add `amount` karma directly, bypassing multipliers, counters and badges.
    /// Returns the new karma total.
    pub async fn add_bonus(&self, amount: i64) -> Result<i64, StoreError> {
        let store = self.store.lock().await;
        let mut state = load_from(&*store).await?;

        state.karma = state.karma.saturating_add(amount);
        self.save_to(&*store, &mut state).await?;

        log::info!("Bonus {:+} karma, total {}", amount, state.karma);
        Ok(state.karma)
    }

    /// Stamp and persist the full record. Callers hold the store lock.
    async fn save_to(&self, store: &S, state: &mut GameState) -> Result<(), StoreError> {
        state.last_updated = Some(self.clock.now().with_timezone(&Utc));
        store::save(store, GAME_STATE_KEY, state).await
    }
}

async fn load_from<S: KeyValueStore>(store: &S) -> Result<GameState, StoreError> {
    store::load_or_default(store, GAME_STATE_KEY).await
}

/// Karma rules: bonus window, per-tab points and badge thresholds
use chrono::{DateTime, TimeZone, Timelike};
use crate::game_state::GameState;

/// A badge unlocked once `totalTabsClosed` reaches `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub threshold: u64,
    /// Stable id, stored in `GameState::badges`
    pub id: &'static str,
    /// Shown to the user
    pub name: &'static str,
}

/// Badge table, ordered by threshold. Add rows here to add badges.
pub const BADGES: &[Badge] = &[
    Badge { threshold: 100, id: "novice_cleaner", name: "Novice Cleaner: 100 tabs closed" },
];

/// Display name for a badge id, falling back to the id itself for unknown badges
pub fn badge_name<'a>(badges: &[Badge], id: &'a str) -> &'a str {
    badges
        .iter()
        .find(|badge| badge.id == id)
        .map_or(id, |badge| badge.name)
}

/// Scoring parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRules {
    /// First hour (local time) of the bonus window, inclusive
    pub bonus_start_hour: u32,
    /// Hour the bonus window ends, exclusive
    pub bonus_end_hour: u32,
    pub bonus_multiplier: i64,
    pub base_points_per_tab: i64,
    /// Points per closed blank tab; never scaled by the multiplier
    pub blank_penalty_per_tab: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules {
            bonus_start_hour: 18,
            bonus_end_hour: 22,
            bonus_multiplier: 2,
            base_points_per_tab: 10,
            blank_penalty_per_tab: -1,
        }
    }
}

impl ScoringRules {
    /// Whether `now` falls in the bonus window, judged on the hour of `now`'s own offset
    pub fn is_bonus_window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let hour = now.hour();
        hour >= self.bonus_start_hour && hour < self.bonus_end_hour
    }

    pub fn multiplier<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> i64 {
        if self.is_bonus_window(now) {
            self.bonus_multiplier
        } else {
            1
        }
    }

    /// Karma earned by closing `normal_count` regular tabs and `blank_count` blank tabs at `now`.
    ///
    /// The multiplier only applies to regular tabs, so the result can be negative
    /// when blank tabs dominate.
    pub fn compute_delta<Tz: TimeZone>(&self, normal_count: u32, blank_count: u32, now: &DateTime<Tz>) -> i64 {
        let normal_points = i64::from(normal_count) * self.base_points_per_tab * self.multiplier(now);
        let penalty_points = i64::from(blank_count) * self.blank_penalty_per_tab;
        normal_points + penalty_points
    }
}

/// Award every badge in `badges` whose threshold `state` has reached.
/// Returns the ids that were newly added.
pub fn award_badges(state: &mut GameState, badges: &[Badge]) -> Vec<String> {
    let total = state.total_tabs_closed;
    let mut added = Vec::new();

    for badge in badges.iter().filter(|badge| total >= badge.threshold) {
        if state.award_badge(badge.id) {
            added.push(badge.id.to_string());
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 10, 28, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_bonus_window_boundaries() {
        let rules = ScoringRules::default();

        assert!(!rules.is_bonus_window(&at(17, 59)));
        assert!(rules.is_bonus_window(&at(18, 0)));
        assert!(rules.is_bonus_window(&at(21, 59)));
        assert!(!rules.is_bonus_window(&at(22, 0)));
        assert!(!rules.is_bonus_window(&at(0, 0)));
    }

    #[test]
    fn test_bonus_window_uses_local_hour() {
        let rules = ScoringRules::default();
        // 10:00 UTC is 19:00 at UTC+9
        let utc = chrono::Utc.with_ymd_and_hms(2024, 10, 28, 10, 0, 0).unwrap();

        assert!(!rules.is_bonus_window(&utc));
        assert!(rules.is_bonus_window(&utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap())));
    }

    #[test]
    fn test_compute_delta_outside_window() {
        let rules = ScoringRules::default();

        assert_eq!(rules.compute_delta(3, 0, &at(9, 0)), 30);
        assert_eq!(rules.compute_delta(3, 2, &at(9, 0)), 28);
    }

    #[test]
    fn test_penalty_is_not_multiplied() {
        let rules = ScoringRules::default();
        let bonus = at(19, 30);

        assert_eq!(rules.compute_delta(0, 10, &bonus), -10);
        assert_eq!(rules.compute_delta(10, 0, &bonus), 200);
        assert_eq!(rules.compute_delta(10, 10, &bonus), 190);
    }

    #[test]
    fn test_custom_rules() {
        let rules = ScoringRules {
            bonus_start_hour: 6,
            bonus_end_hour: 9,
            bonus_multiplier: 3,
            base_points_per_tab: 5,
            blank_penalty_per_tab: -2,
        };

        assert_eq!(rules.compute_delta(2, 1, &at(7, 0)), 28);
        assert_eq!(rules.compute_delta(2, 1, &at(18, 0)), 8);
    }

    #[test]
    fn test_award_badges_at_threshold() {
        let mut state = GameState {
            total_tabs_closed: 100,
            ..GameState::default()
        };

        let added = award_badges(&mut state, BADGES);

        assert_eq!(added, vec!["novice_cleaner".to_string()]);
        assert!(award_badges(&mut state, BADGES).is_empty());
        assert_eq!(state.badges.len(), 1);
    }

    #[test]
    fn test_award_badges_below_threshold() {
        let mut state = GameState {
            total_tabs_closed: 99,
            ..GameState::default()
        };

        assert!(award_badges(&mut state, BADGES).is_empty());
        assert!(state.badges.is_empty());
    }

    #[test]
    fn test_award_badges_extended_table() {
        let table = [
            Badge { threshold: 10, id: "first_steps", name: "First Steps" },
            Badge { threshold: 50, id: "tidy", name: "Tidy" },
            Badge { threshold: 100, id: "novice_cleaner", name: "Novice Cleaner" },
        ];
        let mut state = GameState {
            total_tabs_closed: 60,
            badges: vec!["first_steps".to_string()],
            ..GameState::default()
        };

        let added = award_badges(&mut state, &table);

        assert_eq!(added, vec!["tidy".to_string()]);
        assert_eq!(state.badges, vec!["first_steps".to_string(), "tidy".to_string()]);
    }

    #[test]
    fn test_badge_name() {
        assert_eq!(badge_name(BADGES, "novice_cleaner"), "Novice Cleaner: 100 tabs closed");
        assert_eq!(badge_name(BADGES, "retired_badge"), "retired_badge");
    }

    proptest! {
        #[test]
        fn prop_delta_matches_formula(normal in 0u32..10_000, blank in 0u32..10_000, hour in 0u32..24) {
            let rules = ScoringRules::default();
            let now = at(hour, 0);
            let multiplier = if (18..22).contains(&hour) { 2 } else { 1 };

            let delta = rules.compute_delta(normal, blank, &now);

            prop_assert_eq!(delta, i64::from(normal) * 10 * multiplier - i64::from(blank));
            prop_assert_eq!(delta, rules.compute_delta(normal, blank, &now));
        }
    }
}

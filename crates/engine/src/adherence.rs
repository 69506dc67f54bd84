//! Adherence calculator: turns a log history into a cycle-aware status.
//!
//! A gap of four or more days since the most recent log is read as a
//! deliberate rest period lasting up to seven days from that log. Otherwise
//! the status reports the run of consecutive logged days ending today, and how
//! many of the most recent of those days had bleeding.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use okusuri_common::types::LogEntry;

/// Days without a log after which the user is considered resting.
pub const REST_PERIOD_THRESHOLD_DAYS: i64 = 4;

/// Length of a rest period counted from the last log.
pub const REST_PERIOD_LENGTH_DAYS: i64 = 7;

/// Older history cannot affect the reported streak.
pub const MAX_STREAK_LOOKBACK_DAYS: u32 = 30;

/// Derived adherence status; recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdherenceStatus {
    RestPeriod { days_left: u32 },
    Active { streak: u32, bleeding_days: u32 },
}

impl AdherenceStatus {
    /// Status of a user with no history.
    pub const ZERO: AdherenceStatus = AdherenceStatus::Active {
        streak: 0,
        bleeding_days: 0,
    };

    pub fn current_streak(&self) -> u32 {
        match self {
            AdherenceStatus::Active { streak, .. } => *streak,
            AdherenceStatus::RestPeriod { .. } => 0,
        }
    }

    pub fn is_rest_period(&self) -> bool {
        matches!(self, AdherenceStatus::RestPeriod { .. })
    }

    pub fn rest_days_left(&self) -> u32 {
        match self {
            AdherenceStatus::RestPeriod { days_left } => *days_left,
            AdherenceStatus::Active { .. } => 0,
        }
    }

    pub fn consecutive_bleeding_days(&self) -> u32 {
        match self {
            AdherenceStatus::Active { bleeding_days, .. } => *bleeding_days,
            AdherenceStatus::RestPeriod { .. } => 0,
        }
    }
}

impl Default for AdherenceStatus {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Flat JSON view of [`AdherenceStatus`] returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatus {
    pub current_streak: u32,
    pub is_rest_period: bool,
    pub rest_days_left: u32,
    pub consecutive_bleeding: u32,
}

impl From<AdherenceStatus> for MedicationStatus {
    fn from(status: AdherenceStatus) -> Self {
        Self {
            current_streak: status.current_streak(),
            is_rest_period: status.is_rest_period(),
            rest_days_left: status.rest_days_left(),
            consecutive_bleeding: status.consecutive_bleeding_days(),
        }
    }
}

pub struct AdherenceCalculator;

impl AdherenceCalculator {
    /// Compute the adherence status of `history` as of `today`.
    ///
    /// Entries are compared by calendar date. Duplicate entries for one day
    /// are not merged; the first one in `history` wins.
    pub fn compute(history: &[LogEntry], today: NaiveDate) -> AdherenceStatus {
        let Some(latest) = history.iter().map(|e| e.date).max() else {
            return AdherenceStatus::ZERO;
        };

        let gap = (today - latest).num_days();
        if gap >= REST_PERIOD_THRESHOLD_DAYS {
            let days_left = (REST_PERIOD_LENGTH_DAYS - gap).max(0) as u32;
            return AdherenceStatus::RestPeriod { days_left };
        }

        let mut streak = 0u32;
        let mut bleeding_days = 0u32;
        // Bleeding is counted over the most recent days only; the first
        // non-bleeding day walking backward closes the run.
        let mut bleeding_run_open = true;

        for offset in 0..MAX_STREAK_LOOKBACK_DAYS {
            let check_date = today - Duration::days(offset as i64);
            let Some(entry) = history.iter().find(|e| e.date == check_date) else {
                break;
            };

            streak += 1;
            if entry.has_bleeding && bleeding_run_open {
                bleeding_days += 1;
            } else {
                bleeding_run_open = false;
            }
        }

        AdherenceStatus::Active {
            streak,
            bleeding_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn days_ago(n: i64, has_bleeding: bool) -> LogEntry {
        LogEntry::new(today() - Duration::days(n), has_bleeding)
    }

    #[test]
    fn test_empty_history_is_zero() {
        assert_eq!(AdherenceCalculator::compute(&[], today()), AdherenceStatus::ZERO);
    }

    #[test]
    fn test_bleeding_streak_scenario() {
        let logs = [days_ago(0, true), days_ago(1, true), days_ago(2, false)];
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(status.current_streak(), 3);
        assert!(!status.is_rest_period());
        assert_eq!(status.rest_days_left(), 0);
        assert_eq!(status.consecutive_bleeding_days(), 2);
    }

    #[test]
    fn test_rest_period_scenario() {
        let status = AdherenceCalculator::compute(&[days_ago(5, false)], today());
        assert_eq!(status, AdherenceStatus::RestPeriod { days_left: 2 });
    }

    #[test]
    fn test_rest_days_left_shrinks_to_zero() {
        let mut previous = u32::MAX;
        for gap in 4..12 {
            let status = AdherenceCalculator::compute(&[days_ago(gap, true)], today());
            assert!(status.is_rest_period());
            assert_eq!(status.current_streak(), 0);
            assert_eq!(status.consecutive_bleeding_days(), 0);
            let left = status.rest_days_left();
            assert!(left <= previous);
            assert_eq!(left as i64, (7 - gap).max(0));
            previous = left;
        }
    }

    #[test]
    fn test_short_gap_reports_broken_streak() {
        for gap in 1..4 {
            let logs = [days_ago(gap, false), days_ago(gap + 1, false)];
            let status = AdherenceCalculator::compute(&logs, today());
            assert_eq!(status, AdherenceStatus::ZERO, "gap {gap}");
        }
    }

    #[test]
    fn test_streak_stops_at_first_missing_day() {
        let logs = [
            days_ago(0, false),
            days_ago(1, false),
            days_ago(3, false),
            days_ago(4, false),
        ];
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(status.current_streak(), 2);
    }

    #[test]
    fn test_streak_capped_at_thirty_days() {
        let logs: Vec<LogEntry> = (0..45).map(|n| days_ago(n, false)).collect();
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(status.current_streak(), MAX_STREAK_LOOKBACK_DAYS);
    }

    #[test]
    fn test_history_order_does_not_matter() {
        let logs = [days_ago(2, false), days_ago(0, true), days_ago(1, false)];
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(
            status,
            AdherenceStatus::Active {
                streak: 3,
                bleeding_days: 1
            }
        );
    }

    #[test]
    fn test_non_bleeding_today_resets_bleeding_count() {
        let logs = [days_ago(0, false), days_ago(1, true), days_ago(2, true)];
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(status.current_streak(), 3);
        assert_eq!(status.consecutive_bleeding_days(), 0);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let logs = [days_ago(0, true), days_ago(0, false)];
        let status = AdherenceCalculator::compute(&logs, today());
        assert_eq!(status.current_streak(), 1);
        assert_eq!(status.consecutive_bleeding_days(), 1);
    }

    #[test]
    fn test_bleeding_never_exceeds_streak() {
        let logs: Vec<LogEntry> = (0..40).map(|n| days_ago(n, true)).collect();
        let status = AdherenceCalculator::compute(&logs, today());
        assert!(status.consecutive_bleeding_days() <= status.current_streak());
        assert_eq!(status.consecutive_bleeding_days(), MAX_STREAK_LOOKBACK_DAYS);
    }

    #[test]
    fn test_future_entry_stays_in_streak_branch() {
        let tomorrow = LogEntry::new(today() + Duration::days(1), false);
        let status = AdherenceCalculator::compute(&[tomorrow, days_ago(0, false)], today());
        assert_eq!(status.current_streak(), 1);
    }

    #[test]
    fn test_flat_view() {
        let view = MedicationStatus::from(AdherenceStatus::RestPeriod { days_left: 3 });
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["isRestPeriod"], true);
        assert_eq!(json["restDaysLeft"], 3);
        assert_eq!(json["currentStreak"], 0);
        assert_eq!(json["consecutiveBleeding"], 0);
    }
}

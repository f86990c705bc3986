use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserId;

pub const DEFAULT_DAILY_GOAL: i32 = 10;

/// Persisted per-user statistics row (`user_stats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStats {
    pub user_id: UserId,
    pub total_flashcards: i32,
    pub studied_today: i32,
    pub average_score: f64,
    pub study_streak: i32,
    pub last_streak_date: Option<NaiveDate>,
    pub daily_goal: i32,
    pub created_at: String, // ISO 8601 string
    pub updated_at: String, // ISO 8601 string
}

impl UserStats {
    /// Row inserted the first time a user's stats are requested
    pub fn defaults_for(user_id: UserId) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            user_id,
            total_flashcards: 0,
            studied_today: 0,
            average_score: 0.0,
            study_streak: 0,
            last_streak_date: None,
            daily_goal: DEFAULT_DAILY_GOAL,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// View model handed to the client. Mirrors [`UserStats`] but may run ahead
/// of it while an optimistic update is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudyStats {
    pub total_flashcards: i32,
    pub studied_today: i32,
    pub average_score: i32,
    pub streak_days: i32,
    pub daily_goal: i32,
    pub progress_percentage: f64,
}

impl Default for StudyStats {
    fn default() -> Self {
        Self {
            total_flashcards: 0,
            studied_today: 0,
            average_score: 0,
            streak_days: 0,
            daily_goal: DEFAULT_DAILY_GOAL,
            progress_percentage: 0.0,
        }
    }
}

impl StudyStats {
    /// Apply a change to `studied_today`, keeping the progress bar in step.
    ///
    /// Returns the new count, or `None` without touching anything on overflow.
    pub fn add_studied(&mut self, delta: i32) -> Option<i32> {
        let studied = self.studied_today.checked_add(delta)?;
        self.set_studied(studied);
        Some(studied)
    }

    pub fn set_studied(&mut self, studied: i32) {
        self.studied_today = studied;
        self.progress_percentage = progress_percentage(self.studied_today, self.daily_goal);
    }
}

impl From<&UserStats> for StudyStats {
    fn from(record: &UserStats) -> Self {
        StudyStats {
            total_flashcards: record.total_flashcards,
            studied_today: record.studied_today,
            average_score: record.average_score.round() as i32,
            streak_days: record.study_streak,
            daily_goal: record.daily_goal,
            progress_percentage: progress_percentage(record.studied_today, record.daily_goal),
        }
    }
}

/// Share of the daily goal reached, capped at 100. A non-positive goal
/// yields 0.
pub fn progress_percentage(studied_today: i32, daily_goal: i32) -> f64 {
    if daily_goal <= 0 {
        return 0.0;
    }
    (studied_today as f64 / daily_goal as f64 * 100.0).min(100.0)
}

/// Subset of `user_stats` columns to write. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsPatch {
    pub total_flashcards: Option<i32>,
    pub studied_today: Option<i32>,
    pub average_score: Option<f64>,
    pub study_streak: Option<i32>,
    pub last_streak_date: Option<NaiveDate>,
}

impl StatsPatch {
    pub fn total_flashcards(count: i32) -> Self {
        Self {
            total_flashcards: Some(count),
            ..Self::default()
        }
    }

    pub fn studied_today(count: i32) -> Self {
        Self {
            studied_today: Some(count),
            ..Self::default()
        }
    }

    pub fn average_score(average: f64) -> Self {
        Self {
            average_score: Some(average),
            ..Self::default()
        }
    }

    pub fn streak(streak: i32, date: NaiveDate) -> Self {
        Self {
            study_streak: Some(streak),
            last_streak_date: Some(date),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

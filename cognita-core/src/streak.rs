use chrono::NaiveDate;

/// Result of applying today's study activity to a stored streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Already counted today; nothing to write
    Unchanged,
    /// No previous streak date
    Started,
    /// Studied yesterday, streak continues
    Extended { streak: i32 },
    /// Gap of more than one day (or a last date in the future)
    Reset,
}

impl StreakUpdate {
    /// New stored streak value, or `None` when nothing should be written
    pub fn new_streak(&self) -> Option<i32> {
        match self {
            StreakUpdate::Unchanged => None,
            StreakUpdate::Started | StreakUpdate::Reset => Some(1),
            StreakUpdate::Extended { streak } => Some(*streak),
        }
    }
}

pub struct StreakCalculator;

impl StreakCalculator {
    /// Decide how a streak moves when the user studies on `today`
    pub fn advance(
        current_streak: i32,
        last_streak_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> StreakUpdate {
        let Some(last) = last_streak_date else {
            return StreakUpdate::Started;
        };

        match Self::days_between(last, today) {
            0 => StreakUpdate::Unchanged,
            1 => StreakUpdate::Extended {
                streak: current_streak + 1,
            },
            // Includes negative gaps from clock skew
            _ => StreakUpdate::Reset,
        }
    }

    /// Whole calendar days from `from` to `to`
    pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_study_starts_streak() {
        let update = StreakCalculator::advance(0, None, date(2025, 3, 10));
        assert_eq!(update, StreakUpdate::Started);
        assert_eq!(update.new_streak(), Some(1));
    }

    #[test]
    fn test_next_day_extends_streak() {
        let update = StreakCalculator::advance(4, Some(date(2025, 3, 10)), date(2025, 3, 11));
        assert_eq!(update, StreakUpdate::Extended { streak: 5 });
        assert_eq!(update.new_streak(), Some(5));
    }

    #[test]
    fn test_same_day_is_noop() {
        let update = StreakCalculator::advance(4, Some(date(2025, 3, 10)), date(2025, 3, 10));
        assert_eq!(update, StreakUpdate::Unchanged);
        assert_eq!(update.new_streak(), None);
    }

    #[test]
    fn test_gap_resets_streak() {
        let update = StreakCalculator::advance(9, Some(date(2025, 3, 10)), date(2025, 3, 13));
        assert_eq!(update, StreakUpdate::Reset);
        assert_eq!(update.new_streak(), Some(1));
    }

    #[test]
    fn test_future_last_date_resets_streak() {
        let update = StreakCalculator::advance(9, Some(date(2025, 3, 12)), date(2025, 3, 10));
        assert_eq!(update, StreakUpdate::Reset);
    }

    #[test]
    fn test_month_and_year_boundaries() {
        assert_eq!(
            StreakCalculator::advance(2, Some(date(2024, 2, 29)), date(2024, 3, 1)),
            StreakUpdate::Extended { streak: 3 }
        );
        assert_eq!(
            StreakCalculator::advance(30, Some(date(2025, 12, 31)), date(2026, 1, 1)),
            StreakUpdate::Extended { streak: 31 }
        );
    }
}

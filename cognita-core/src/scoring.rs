pub struct ScoringEngine;

impl ScoringEngine {
    /// Fold one session's percentage into the stored running average.
    ///
    /// `studied_today` is read after the session's own cards were counted,
    /// so the previous average covers `studied_today - 1` samples. A count
    /// of zero means there is no history and the score becomes the average.
    pub fn running_average(current_average: f64, studied_today: i32, new_score: f64) -> f64 {
        let new_score = Self::clamp_score(new_score);
        if studied_today <= 0 {
            return new_score;
        }

        let samples = studied_today as f64;
        let average = (current_average * (samples - 1.0) + new_score) / samples;
        Self::clamp_score(average)
    }

    /// Percentages are kept inside 0..=100; NaN counts as 0
    pub fn clamp_score(score: f64) -> f64 {
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 100.0)
    }
}

/// Right/wrong answers gathered during one study or quiz session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub correct: u32,
    pub total: u32,
}

impl SessionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    pub fn from_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        let mut tally = Self::new();
        for answer in answers {
            tally.record(answer);
        }
        tally
    }

    pub fn score_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_session_bootstraps_average() {
        assert_eq!(ScoringEngine::running_average(0.0, 0, 80.0), 80.0);
        // After the session's own increment the count is 1 and history is ignored
        assert_eq!(ScoringEngine::running_average(55.0, 1, 80.0), 80.0);
    }

    #[test]
    fn test_running_average_weights_previous_samples() {
        assert_eq!(ScoringEngine::running_average(80.0, 2, 100.0), 90.0);
        assert_eq!(ScoringEngine::running_average(90.0, 3, 60.0), 80.0);
    }

    #[test]
    fn test_average_stays_in_range() {
        assert_eq!(ScoringEngine::running_average(50.0, 0, 140.0), 100.0);
        assert_eq!(ScoringEngine::running_average(50.0, 2, -20.0), 25.0);
        assert_eq!(ScoringEngine::running_average(50.0, 0, f64::NAN), 0.0);
    }

    #[test]
    fn test_session_tally() {
        let tally = SessionTally::from_answers([true, false, true, true]);
        assert_eq!(tally.correct, 3);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.score_percent(), 75.0);
    }

    #[test]
    fn test_empty_session_scores_zero() {
        let tally = SessionTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.score_percent(), 0.0);
    }
}

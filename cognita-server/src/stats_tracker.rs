use std::sync::Arc;

use cognita_core::{
    Clock, NotificationSink, ScoringEngine, StreakCalculator, StreakUpdate, newly_unlocked,
    unlock_notification,
};
use cognita_persistence::{StatsStore, StoreError};
use cognita_types::{Notification, StatsPatch, StudyStats, UserId};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const LOAD_FAILED: &str = "Failed to load your stats. Please try again.";
const FLASHCARDS_FAILED: &str = "Failed to update flashcard count.";
const STUDIED_FAILED: &str = "Failed to update study progress.";
const AVERAGE_FAILED: &str = "Failed to update average score.";
const STREAK_FAILED: &str = "Failed to update study streak.";
const RESET_FAILED: &str = "Failed to reset daily stats.";

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn delta_overflow(field: &str, delta: i32) -> TrackerError {
    TrackerError::InvalidArgument(format!("{} change of {} is out of range", field, delta))
}

#[derive(Debug, Clone)]
struct TrackerState {
    user: Option<UserId>,
    stats: StudyStats,
    loading: bool,
    /// Set once the first fetch after sign-in has succeeded
    loaded: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            user: None,
            stats: StudyStats::default(),
            loading: false,
            loaded: false,
        }
    }
}

/// Study statistics for one signed-in user.
///
/// Mutations are applied to the local snapshot first and then written to
/// the [`StatsStore`]. Failed writes are reverted (counters, absolute sets)
/// or resynchronised with a fetch (average score, streak). Every failure
/// raises an error notification; every operation is a silent no-op while
/// signed out.
///
/// The state lock is never held across a store call.
pub struct StatsTracker {
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    state: RwLock<TrackerState>,
}

impl StatsTracker {
    pub fn new(
        store: Arc<dyn StatsStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            state: RwLock::new(TrackerState::default()),
        }
    }

    /// Attach a user and load their stats, creating the row if needed
    pub async fn sign_in(&self, user_id: UserId) -> Result<(), TrackerError> {
        {
            let mut state = self.state.write().await;
            *state = TrackerState {
                user: Some(user_id),
                loading: true,
                ..TrackerState::default()
            };
        }
        info!(%user_id, "Stats session started");
        self.fetch_stats().await
    }

    /// Drop the user and fall back to default stats
    pub async fn sign_out(&self) {
        let mut state = self.state.write().await;
        if let Some(user_id) = state.user {
            info!(%user_id, "Stats session ended");
        }
        *state = TrackerState::default();
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.state.read().await.user
    }

    pub async fn snapshot(&self) -> StudyStats {
        self.state.read().await.stats.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn fetch_stats(&self) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };

        self.update_state(user_id, |state| state.loading = true).await;

        let result = self.load_stats(user_id).await;

        match result {
            Ok(stats) => {
                self.update_state(user_id, |state| {
                    state.stats = stats;
                    state.loading = false;
                    state.loaded = true;
                })
                .await;
                Ok(())
            }
            Err(err) => {
                self.update_state(user_id, |state| state.loading = false).await;
                error!(%user_id, "Error fetching user stats: {}", err);
                self.notifier.notify(Notification::error(LOAD_FAILED));
                Err(err.into())
            }
        }
    }

    pub async fn update_total_flashcards(&self, delta: i32) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        let before = self.snapshot().await;
        self.apply_total_flashcards(user_id, delta).await?;
        self.announce_unlocks(&before).await;
        Ok(())
    }

    pub async fn update_total_flashcards_to_count(&self, count: i32) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        if count < 0 {
            return Err(TrackerError::InvalidArgument(format!(
                "flashcard count must not be negative, got {}",
                count
            )));
        }
        let before = self.snapshot().await;
        self.set_total_flashcards(user_id, count).await?;
        self.announce_unlocks(&before).await;
        Ok(())
    }

    /// Replace the local flashcard total with the store's exact count
    pub async fn sync_total_flashcards(&self) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };

        let count = match self.store.count_flashcards(user_id).await {
            Ok(count) => count,
            Err(err) => {
                error!(%user_id, "Error syncing flashcard count: {}", err);
                self.notifier.notify(Notification::error(FLASHCARDS_FAILED));
                return Err(err.into());
            }
        };
        let count = i32::try_from(count).map_err(|_| {
            TrackerError::InvalidArgument(format!("flashcard count {} out of range", count))
        })?;

        debug!(%user_id, count, "Syncing flashcard total");
        self.update_total_flashcards_to_count(count).await
    }

    pub async fn update_studied_today(&self, delta: i32) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        let before = self.snapshot().await;
        self.apply_studied_today(user_id, delta).await?;
        self.announce_unlocks(&before).await;
        Ok(())
    }

    /// Fold one session's percentage into the running average
    pub async fn update_average_score(&self, score: f64) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        let before = self.snapshot().await;
        self.apply_average_score(user_id, score).await?;
        self.announce_unlocks(&before).await;
        Ok(())
    }

    pub async fn update_study_streak(&self) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        let before = self.snapshot().await;
        self.apply_study_streak(user_id).await?;
        self.announce_unlocks(&before).await;
        Ok(())
    }

    /// Record a finished study or quiz session.
    ///
    /// Runs the studied count, average and streak updates in that order. Every
    /// step runs even if an earlier one failed; the first error is returned.
    pub async fn complete_study_session(
        &self,
        score: f64,
        cards_studied: i32,
    ) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };
        let before = self.snapshot().await;

        let results = [
            self.apply_studied_today(user_id, cards_studied).await,
            self.apply_average_score(user_id, score).await,
            self.apply_study_streak(user_id).await,
        ];

        if let Some(err) = results.into_iter().find_map(Result::err) {
            error!(%user_id, "Error completing study session: {}", err);
            self.announce_unlocks(&before).await;
            return Err(err);
        }

        let plural = if cards_studied == 1 { "" } else { "s" };
        self.notifier.notify(Notification::info(
            "Great job!",
            format!(
                "You studied {} card{} and scored {}%",
                cards_studied,
                plural,
                ScoringEngine::clamp_score(score).round() as i64
            ),
        ));
        info!(%user_id, cards_studied, score, "Study session completed");

        self.announce_unlocks(&before).await;
        Ok(())
    }

    pub async fn reset_daily_stats(&self) -> Result<(), TrackerError> {
        let Some(user_id) = self.current_user().await else {
            return Ok(());
        };

        if let Err(err) = self
            .store
            .update_stats(user_id, StatsPatch::studied_today(0))
            .await
        {
            error!(%user_id, "Error resetting daily stats: {}", err);
            self.notifier.notify(Notification::error(RESET_FAILED));
            return Err(err.into());
        }

        self.update_state(user_id, |state| {
            state.stats.studied_today = 0;
            state.stats.progress_percentage = 0.0;
        })
        .await;
        Ok(())
    }

    async fn load_stats(&self, user_id: UserId) -> Result<StudyStats, StoreError> {
        match self.store.fetch_stats(user_id).await? {
            Some(record) => Ok(StudyStats::from(&record)),
            None => {
                self.store.insert_default_stats(user_id).await?;
                debug!(%user_id, "Created default stats row");
                Ok(StudyStats::default())
            }
        }
    }

    /// Refetch after a failed or non-invertible write. Failures only log.
    async fn resync(&self, user_id: UserId) {
        match self.load_stats(user_id).await {
            Ok(stats) => {
                self.update_state(user_id, |state| state.stats = stats).await;
            }
            Err(err) => warn!(%user_id, "Failed to resynchronise stats: {}", err),
        }
    }

    async fn apply_total_flashcards(
        &self,
        user_id: UserId,
        delta: i32,
    ) -> Result<(), TrackerError> {
        let applied = self
            .update_state(user_id, |state| {
                let total = state.stats.total_flashcards.checked_add(delta)?;
                state.stats.total_flashcards = total;
                Some(total)
            })
            .await;
        let total = match applied {
            Some(Some(total)) => total,
            Some(None) => return Err(delta_overflow("total flashcards", delta)),
            None => delta,
        };

        let result = match self.store.increment_total_flashcards(user_id, delta).await {
            Err(err) if err.is_procedure_missing() => {
                debug!(%user_id, "{}; writing total directly", err);
                self.store
                    .update_stats(user_id, StatsPatch::total_flashcards(total))
                    .await
            }
            other => other,
        };

        if let Err(err) = result {
            self.update_state(user_id, |state| {
                state.stats.total_flashcards = state.stats.total_flashcards.saturating_sub(delta)
            })
            .await;
            error!(%user_id, delta, "Error updating total flashcards: {}", err);
            self.notifier.notify(Notification::error(FLASHCARDS_FAILED));
            return Err(err.into());
        }
        Ok(())
    }

    async fn set_total_flashcards(&self, user_id: UserId, count: i32) -> Result<(), TrackerError> {
        let previous = self
            .update_state(user_id, |state| {
                std::mem::replace(&mut state.stats.total_flashcards, count)
            })
            .await
            .unwrap_or_default();

        if let Err(err) = self
            .store
            .update_stats(user_id, StatsPatch::total_flashcards(count))
            .await
        {
            self.update_state(user_id, |state| state.stats.total_flashcards = previous)
                .await;
            error!(%user_id, count, "Error updating total flashcards count: {}", err);
            self.notifier.notify(Notification::error(FLASHCARDS_FAILED));
            return Err(err.into());
        }
        Ok(())
    }

    async fn apply_studied_today(&self, user_id: UserId, delta: i32) -> Result<(), TrackerError> {
        let applied = self
            .update_state(user_id, |state| state.stats.add_studied(delta))
            .await;
        let studied = match applied {
            Some(Some(studied)) => studied,
            Some(None) => return Err(delta_overflow("studied today", delta)),
            None => delta,
        };

        let result = match self.store.increment_studied_today(user_id, delta).await {
            Err(err) if err.is_procedure_missing() => {
                debug!(%user_id, "{}; writing studied count directly", err);
                self.store
                    .update_stats(user_id, StatsPatch::studied_today(studied))
                    .await
            }
            other => other,
        };

        if let Err(err) = result {
            self.update_state(user_id, |state| {
                let studied = state.stats.studied_today.saturating_sub(delta);
                state.stats.set_studied(studied)
            })
            .await;
            error!(%user_id, delta, "Error updating studied today: {}", err);
            self.notifier.notify(Notification::error(STUDIED_FAILED));
            return Err(err.into());
        }
        Ok(())
    }

    async fn apply_average_score(&self, user_id: UserId, score: f64) -> Result<(), TrackerError> {
        let record = match self.store.fetch_stats(user_id).await {
            Ok(record) => record,
            Err(err) => {
                error!(%user_id, "Error reading stats for average score: {}", err);
                self.notifier.notify(Notification::error(AVERAGE_FAILED));
                return Err(err.into());
            }
        };

        let (current_average, studied_today) = record
            .map(|r| (r.average_score, r.studied_today))
            .unwrap_or((0.0, 0));
        let average = ScoringEngine::running_average(current_average, studied_today, score);

        self.update_state(user_id, |state| {
            state.stats.average_score = average.round() as i32
        })
        .await;

        if let Err(err) = self
            .store
            .update_stats(user_id, StatsPatch::average_score(average))
            .await
        {
            self.resync(user_id).await;
            error!(%user_id, average, "Error updating average score: {}", err);
            self.notifier.notify(Notification::error(AVERAGE_FAILED));
            return Err(err.into());
        }
        debug!(%user_id, average, studied_today, "Average score updated");
        Ok(())
    }

    async fn apply_study_streak(&self, user_id: UserId) -> Result<(), TrackerError> {
        // `None` means the procedure ran and the outcome is only known remotely
        let result = match self.store.update_study_streak(user_id).await {
            Ok(()) => Ok(None),
            Err(err) if err.is_procedure_missing() => {
                debug!(%user_id, "{}; computing streak locally", err);
                self.manual_study_streak(user_id).await.map(Some)
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(Some(StreakUpdate::Unchanged)) => return Ok(()),
            Ok(_) => {}
            Err(err) => {
                error!(%user_id, "Error updating study streak: {}", err);
                self.notifier.notify(Notification::error(STREAK_FAILED));
                return Err(err.into());
            }
        }

        match self.load_stats(user_id).await {
            Ok(stats) => {
                self.update_state(user_id, |state| state.stats = stats).await;
                Ok(())
            }
            Err(err) => {
                error!(%user_id, "Error refreshing stats after streak update: {}", err);
                self.notifier.notify(Notification::error(STREAK_FAILED));
                Err(err.into())
            }
        }
    }

    /// Read-modify-write streak for stores without the atomic procedure
    async fn manual_study_streak(&self, user_id: UserId) -> Result<StreakUpdate, StoreError> {
        let today = self.clock.today();
        let record = self.store.fetch_stats(user_id).await?;
        let (streak, last_date) = record
            .map(|r| (r.study_streak, r.last_streak_date))
            .unwrap_or((0, None));

        let update = StreakCalculator::advance(streak, last_date, today);
        if let Some(new_streak) = update.new_streak() {
            self.store
                .update_stats(user_id, StatsPatch::streak(new_streak, today))
                .await?;
        }
        Ok(update)
    }

    /// Announce achievements unlocked since `before`, once stats are loaded
    async fn announce_unlocks(&self, before: &StudyStats) {
        let (loaded, current) = {
            let state = self.state.read().await;
            (state.loaded, state.stats.clone())
        };
        if !loaded {
            return;
        }
        for achievement in newly_unlocked(before, &current) {
            info!(achievement = %achievement.id, "Achievement unlocked");
            self.notifier.notify(unlock_notification(&achievement));
        }
    }

    /// Mutate the state only if `user_id` is still the signed-in user
    async fn update_state<T>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut TrackerState) -> T,
    ) -> Option<T> {
        let mut state = self.state.write().await;
        if state.user == Some(user_id) {
            Some(f(&mut state))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cognita_core::{FixedClock, NotificationQueue};
    use cognita_persistence::StatsRepository;
    use cognita_persistence::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use uuid::Uuid;

    async fn create_tracker() -> (StatsTracker, NotificationQueue) {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let clock: Arc<FixedClock> = Arc::new(FixedClock::on_date(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        ));
        let store = StatsRepository::new(db).with_clock(clock.clone());
        let queue = NotificationQueue::new();
        let tracker = StatsTracker::new(Arc::new(store), clock, Arc::new(queue.clone()));
        (tracker, queue)
    }

    #[tokio::test]
    async fn test_signed_out_operations_are_silent() {
        let (tracker, queue) = create_tracker().await;

        tracker.update_total_flashcards(3).await.unwrap();
        tracker.update_studied_today(1).await.unwrap();
        tracker.complete_study_session(90.0, 4).await.unwrap();
        tracker.reset_daily_stats().await.unwrap();

        assert_eq!(tracker.snapshot().await, StudyStats::default());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_creates_defaults_without_toasts() {
        let (tracker, queue) = create_tracker().await;

        tracker.sign_in(Uuid::new_v4()).await.unwrap();

        assert!(!tracker.is_loading().await);
        assert_eq!(tracker.snapshot().await, StudyStats::default());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_resets_snapshot() {
        let (tracker, _queue) = create_tracker().await;
        tracker.sign_in(Uuid::new_v4()).await.unwrap();
        tracker.update_total_flashcards(4).await.unwrap();

        tracker.sign_out().await;

        assert_eq!(tracker.current_user().await, None);
        assert_eq!(tracker.snapshot().await.total_flashcards, 0);
    }

    #[tokio::test]
    async fn test_negative_count_is_rejected() {
        let (tracker, _queue) = create_tracker().await;
        tracker.sign_in(Uuid::new_v4()).await.unwrap();

        let err = tracker.update_total_flashcards_to_count(-1).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidArgument(_)));
    }
}

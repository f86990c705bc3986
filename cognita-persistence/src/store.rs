use async_trait::async_trait;
use cognita_types::{StatsPatch, UserId, UserStats};

use crate::error::StoreError;

pub const INCREMENT_TOTAL_FLASHCARDS: &str = "increment_total_flashcards";
pub const INCREMENT_STUDIED_TODAY: &str = "increment_studied_today";
pub const UPDATE_STUDY_STREAK: &str = "update_study_streak";

/// Remote store holding one `user_stats` row per user plus the user's
/// flashcards.
///
/// The three procedure methods are optional capabilities. A store that does
/// not offer one returns [`StoreError::ProcedureNotFound`]; callers treat
/// that, and only that, as a signal to fall back to read-modify-write.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn fetch_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StoreError>;

    /// Insert the default row for a user and return it
    async fn insert_default_stats(&self, user_id: UserId) -> Result<UserStats, StoreError>;

    /// Write the columns set in `patch`. A missing row is not an error.
    async fn update_stats(&self, user_id: UserId, patch: StatsPatch) -> Result<(), StoreError>;

    async fn increment_total_flashcards(
        &self,
        user_id: UserId,
        amount: i32,
    ) -> Result<(), StoreError>;

    async fn increment_studied_today(&self, user_id: UserId, amount: i32)
    -> Result<(), StoreError>;

    /// Advance the streak for today's date as one indivisible step
    async fn update_study_streak(&self, user_id: UserId) -> Result<(), StoreError>;

    /// Exact number of flashcards owned by the user
    async fn count_flashcards(&self, user_id: UserId) -> Result<u64, StoreError>;
}

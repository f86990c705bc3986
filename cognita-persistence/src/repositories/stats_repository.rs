use async_trait::async_trait;
use cognita_core::{Clock, StreakCalculator, SystemClock};
use cognita_types::{StatsPatch, UserId, UserStats};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{flashcards, prelude::*, user_stats};
use crate::error::StoreError;
use crate::store::{
    INCREMENT_STUDIED_TODAY, INCREMENT_TOTAL_FLASHCARDS, StatsStore, UPDATE_STUDY_STREAK,
};

/// `sea-orm` backed [`StatsStore`].
///
/// The atomic procedures run as single UPDATE statements (or one
/// transaction for the streak). Deployments that do not provide them are
/// modelled with `with_procedures(false)`.
pub struct StatsRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    procedures_enabled: bool,
}

impl StatsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            procedures_enabled: true,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_procedures(mut self, enabled: bool) -> Self {
        self.procedures_enabled = enabled;
        self
    }

    fn model_to_stats(model: user_stats::Model) -> UserStats {
        UserStats {
            user_id: model.user_id,
            total_flashcards: model.total_flashcards,
            studied_today: model.studied_today,
            average_score: model.average_score,
            study_streak: model.study_streak,
            last_streak_date: model.last_streak_date,
            daily_goal: model.daily_goal,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }

    fn require_procedure(&self, name: &'static str) -> Result<(), StoreError> {
        if self.procedures_enabled {
            Ok(())
        } else {
            Err(StoreError::ProcedureNotFound { name })
        }
    }

    fn now(&self) -> sea_orm::prelude::DateTimeWithTimeZone {
        self.clock.now().into()
    }

    async fn find_model(&self, user_id: UserId) -> Result<Option<user_stats::Model>, StoreError> {
        let model = UserStatsRows::find()
            .filter(user_stats::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model)
    }

    async fn increment_column(
        &self,
        user_id: UserId,
        column: user_stats::Column,
        amount: i32,
    ) -> Result<(), StoreError> {
        UserStatsRows::update_many()
            .col_expr(column, Expr::col(column).add(amount))
            .col_expr(user_stats::Column::UpdatedAt, Expr::value(self.now()))
            .filter(user_stats::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StatsStore for StatsRepository {
    async fn fetch_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StoreError> {
        Ok(self.find_model(user_id).await?.map(Self::model_to_stats))
    }

    async fn insert_default_stats(&self, user_id: UserId) -> Result<UserStats, StoreError> {
        let defaults = UserStats::defaults_for(user_id);
        let now = self.now();

        let row = user_stats::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id),
            total_flashcards: ActiveValue::Set(defaults.total_flashcards),
            studied_today: ActiveValue::Set(defaults.studied_today),
            average_score: ActiveValue::Set(defaults.average_score),
            study_streak: ActiveValue::Set(defaults.study_streak),
            last_streak_date: ActiveValue::Set(None),
            daily_goal: ActiveValue::Set(defaults.daily_goal),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let saved = row.insert(&self.db).await?;
        tracing::debug!(%user_id, "Initialized user stats");
        Ok(Self::model_to_stats(saved))
    }

    async fn update_stats(&self, user_id: UserId, patch: StatsPatch) -> Result<(), StoreError> {
        let mut update = UserStatsRows::update_many()
            .col_expr(user_stats::Column::UpdatedAt, Expr::value(self.now()))
            .filter(user_stats::Column::UserId.eq(user_id));

        if let Some(total) = patch.total_flashcards {
            update = update.col_expr(user_stats::Column::TotalFlashcards, Expr::value(total));
        }
        if let Some(studied) = patch.studied_today {
            update = update.col_expr(user_stats::Column::StudiedToday, Expr::value(studied));
        }
        if let Some(average) = patch.average_score {
            update = update.col_expr(user_stats::Column::AverageScore, Expr::value(average));
        }
        if let Some(streak) = patch.study_streak {
            update = update.col_expr(user_stats::Column::StudyStreak, Expr::value(streak));
        }
        if let Some(date) = patch.last_streak_date {
            update = update.col_expr(user_stats::Column::LastStreakDate, Expr::value(date));
        }

        let result = update.exec(&self.db).await?;
        if result.rows_affected == 0 {
            tracing::debug!(%user_id, "Stats update matched no row");
        }
        Ok(())
    }

    async fn increment_total_flashcards(
        &self,
        user_id: UserId,
        amount: i32,
    ) -> Result<(), StoreError> {
        self.require_procedure(INCREMENT_TOTAL_FLASHCARDS)?;
        self.increment_column(user_id, user_stats::Column::TotalFlashcards, amount)
            .await
    }

    async fn increment_studied_today(
        &self,
        user_id: UserId,
        amount: i32,
    ) -> Result<(), StoreError> {
        self.require_procedure(INCREMENT_STUDIED_TODAY)?;
        self.increment_column(user_id, user_stats::Column::StudiedToday, amount)
            .await
    }

    async fn update_study_streak(&self, user_id: UserId) -> Result<(), StoreError> {
        self.require_procedure(UPDATE_STUDY_STREAK)?;

        let txn = self.db.begin().await?;
        let Some(model) = UserStatsRows::find()
            .filter(user_stats::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Ok(());
        };

        let today = self.clock.today();
        let update = StreakCalculator::advance(model.study_streak, model.last_streak_date, today);
        if let Some(streak) = update.new_streak() {
            let mut row: user_stats::ActiveModel = model.into();
            row.study_streak = ActiveValue::Set(streak);
            row.last_streak_date = ActiveValue::Set(Some(today));
            row.updated_at = ActiveValue::Set(self.now());
            row.update(&txn).await?;
        }

        txn.commit().await?;
        tracing::debug!(%user_id, ?update, "Study streak procedure applied");
        Ok(())
    }

    async fn count_flashcards(&self, user_id: UserId) -> Result<u64, StoreError> {
        let count = Flashcards::find()
            .filter(flashcards::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

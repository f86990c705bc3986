use anyhow::Result;
use cognita_types::{Difficulty, Flashcard, FlashcardId, NewFlashcard, UserId};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use crate::entities::{flashcards, prelude::*};

pub struct FlashcardRepository {
    db: DatabaseConnection,
}

impl FlashcardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_flashcard(model: flashcards::Model) -> Flashcard {
        Flashcard {
            id: model.id,
            user_id: model.user_id,
            pdf_name: model.pdf_name,
            question: model.question,
            answer: model.answer,
            difficulty: model.difficulty.as_deref().and_then(Difficulty::parse),
            created_at: model.created_at.to_rfc3339(),
        }
    }

    /// Store a batch of generated cards for `user_id` and return them with ids
    pub async fn insert_many(
        &self,
        user_id: UserId,
        cards: Vec<NewFlashcard>,
    ) -> Result<Vec<Flashcard>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let models: Vec<flashcards::Model> = cards
            .into_iter()
            .map(|card| flashcards::Model {
                id: Uuid::new_v4(),
                user_id,
                pdf_name: card.pdf_name,
                question: card.question,
                answer: card.answer,
                difficulty: card.difficulty.map(|d| d.as_str().to_string()),
                created_at: now,
            })
            .collect();

        let rows = models.iter().cloned().map(|model| flashcards::ActiveModel {
            id: ActiveValue::Set(model.id),
            user_id: ActiveValue::Set(model.user_id),
            pdf_name: ActiveValue::Set(model.pdf_name),
            question: ActiveValue::Set(model.question),
            answer: ActiveValue::Set(model.answer),
            difficulty: ActiveValue::Set(model.difficulty),
            created_at: ActiveValue::Set(model.created_at),
        });

        Flashcards::insert_many(rows).exec(&self.db).await?;
        tracing::debug!(%user_id, count = models.len(), "Saved flashcards");

        Ok(models.into_iter().map(Self::model_to_flashcard).collect())
    }

    /// All cards owned by the user, newest first
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Flashcard>> {
        let models = Flashcards::find()
            .filter(flashcards::Column::UserId.eq(user_id))
            .order_by_desc(flashcards::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Self::model_to_flashcard).collect())
    }

    /// Delete one of the user's cards. Returns false if no such card exists.
    pub async fn delete(&self, user_id: UserId, id: FlashcardId) -> Result<bool> {
        let result = Flashcards::delete_many()
            .filter(flashcards::Column::Id.eq(id))
            .filter(flashcards::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_user(&self, user_id: UserId) -> Result<u64> {
        let count = Flashcards::find()
            .filter(flashcards::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

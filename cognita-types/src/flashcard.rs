use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{FlashcardId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub user_id: UserId,
    pub pdf_name: Option<String>,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<Difficulty>,
    pub created_at: String, // ISO 8601 string
}

/// A generated card that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewFlashcard {
    pub pdf_name: Option<String>,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<Difficulty>,
}

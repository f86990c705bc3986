use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Difficulty, FlashcardId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuizQuestion {
    pub id: FlashcardId,
    pub question: String,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub difficulty: Option<Difficulty>,
    pub pdf_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuizAnswer {
    pub question_id: FlashcardId,
    pub selected: String,
    pub correct: String,
}

impl QuizAnswer {
    pub fn is_correct(&self) -> bool {
        self.selected == self.correct
    }
}

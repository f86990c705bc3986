use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    Achievement, Flashcard, NewFlashcard, Notification, QuizAnswer, QuizQuestion, StudyStats,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeltaRequest {
    #[serde(default = "default_delta")]
    pub delta: i32,
}

fn default_delta() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CountRequest {
    pub count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreRequest {
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompleteSessionRequest {
    pub score: f64,
    #[serde(default = "default_delta")]
    pub cards_studied: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaveFlashcardsRequest {
    pub flashcards: Vec<NewFlashcard>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GradeQuizRequest {
    pub answers: Vec<QuizAnswer>,
}

/// Every stats-bearing response carries the toasts raised while serving it
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatsResponse {
    pub stats: StudyStats,
    pub loading: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FlashcardsResponse {
    pub flashcards: Vec<Flashcard>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuizResultResponse {
    pub score: f64,
    pub correct: u32,
    pub total: u32,
    pub stats: StudyStats,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AchievementsResponse {
    pub achievements: Vec<Achievement>,
    pub unlocked_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: crate::ApiError,
    pub notifications: Vec<Notification>,
}

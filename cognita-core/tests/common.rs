use chrono::NaiveDate;
use cognita_types::{Difficulty, Flashcard, StudyStats};
use uuid::Uuid;

/// Creates a deck of `size` cards with distinct answers
pub fn create_test_deck(size: usize) -> Vec<Flashcard> {
    let user_id = Uuid::new_v4();
    (0..size)
        .map(|i| create_test_card(user_id, &format!("What is {}?", i), &format!("{}", i)))
        .collect()
}

/// Creates a single card owned by `user_id`
pub fn create_test_card(user_id: Uuid, question: &str, answer: &str) -> Flashcard {
    Flashcard {
        id: Uuid::new_v4(),
        user_id,
        pdf_name: Some("biology.pdf".to_string()),
        question: question.to_string(),
        answer: answer.to_string(),
        difficulty: Some(Difficulty::Medium),
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Stats snapshot with the given streak, average and card count
pub fn stats_with(streak_days: i32, average_score: i32, total_flashcards: i32) -> StudyStats {
    StudyStats {
        total_flashcards,
        average_score,
        streak_days,
        ..StudyStats::default()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

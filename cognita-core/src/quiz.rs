use anyhow::{Result, anyhow};
use cognita_types::{Flashcard, QuizAnswer, QuizQuestion};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::SessionTally;

pub const DISTRACTOR_COUNT: usize = 3;
pub const MIN_QUIZ_QUESTIONS: usize = 5;
pub const DEFAULT_MAX_QUIZ_QUESTIONS: usize = 10;

/// Builds multiple-choice quizzes out of a user's flashcards
pub struct QuizBuilder {
    max_questions: usize,
}

impl Default for QuizBuilder {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUIZ_QUESTIONS,
        }
    }
}

impl QuizBuilder {
    pub fn new(max_questions: usize) -> Self {
        Self {
            max_questions: max_questions.max(1),
        }
    }

    /// How many questions a deck of `deck_size` cards produces
    pub fn question_count(&self, deck_size: usize) -> usize {
        let seventy_percent = deck_size * 7 / 10;
        seventy_percent
            .max(MIN_QUIZ_QUESTIONS)
            .min(self.max_questions)
            .min(deck_size)
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        cards: &[Flashcard],
        rng: &mut R,
    ) -> Result<Vec<QuizQuestion>> {
        if cards.is_empty() {
            return Err(anyhow!("No flashcards available to build a quiz"));
        }

        let mut questions: Vec<QuizQuestion> = cards
            .iter()
            .map(|card| Self::question_for(card, cards, rng))
            .collect();

        questions.shuffle(rng);
        questions.truncate(self.question_count(cards.len()));

        tracing::debug!(deck_size = cards.len(), questions = questions.len(), "Built quiz");
        Ok(questions)
    }

    fn question_for<R: Rng + ?Sized>(
        card: &Flashcard,
        deck: &[Flashcard],
        rng: &mut R,
    ) -> QuizQuestion {
        let mut distractors: Vec<String> = Vec::new();
        for other in deck.iter().filter(|other| other.id != card.id) {
            if other.answer != card.answer && !distractors.contains(&other.answer) {
                distractors.push(other.answer.clone());
            }
        }

        distractors.shuffle(rng);
        distractors.truncate(DISTRACTOR_COUNT);

        let mut options = vec![card.answer.clone()];
        options.extend(distractors);
        options.shuffle(rng);

        QuizQuestion {
            id: card.id,
            question: card.question.clone(),
            correct_answer: card.answer.clone(),
            options,
            difficulty: card.difficulty,
            pdf_name: card.pdf_name.clone(),
        }
    }
}

/// Tally a finished quiz
pub fn grade_quiz(answers: &[QuizAnswer]) -> SessionTally {
    SessionTally::from_answers(answers.iter().map(QuizAnswer::is_correct))
}

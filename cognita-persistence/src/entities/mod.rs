pub mod prelude;

pub mod flashcards;
pub mod user_stats;

pub use super::flashcards::Entity as Flashcards;
pub use super::user_stats::Entity as UserStatsRows;

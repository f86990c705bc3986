pub mod flashcard_repository;
pub mod stats_repository;

pub use flashcard_repository::FlashcardRepository;
pub use stats_repository::StatsRepository;

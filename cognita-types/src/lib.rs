pub mod achievement;
pub mod errors;
pub mod flashcard;
pub mod messages;
pub mod notification;
pub mod quiz;
pub mod stats;

// Re-export all types
pub use achievement::*;
pub use errors::*;
pub use flashcard::*;
pub use messages::*;
pub use notification::*;
pub use quiz::*;
pub use stats::*;

pub type UserId = uuid::Uuid;
pub type FlashcardId = uuid::Uuid;

pub mod achievements;
pub mod clock;
pub mod notifications;
pub mod quiz;
pub mod scoring;
pub mod streak;

// Re-export main components
pub use achievements::*;
pub use clock::*;
pub use notifications::*;
pub use quiz::*;
pub use scoring::*;
pub use streak::*;

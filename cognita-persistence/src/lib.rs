pub mod connection;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use repositories::{FlashcardRepository, StatsRepository};
pub use store::StatsStore;

use cognita_core::Clock;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

pub struct DatabaseManager {
    connection: DatabaseConnection,
}

impl DatabaseManager {
    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let connection = connection::connect_and_migrate(database_url).await?;
        Ok(Self { connection })
    }

    pub fn stats_repository(
        &self,
        clock: Arc<dyn Clock>,
        procedures_enabled: bool,
    ) -> StatsRepository {
        StatsRepository::new(self.connection.clone())
            .with_clock(clock)
            .with_procedures(procedures_enabled)
    }

    pub fn flashcard_repository(&self) -> FlashcardRepository {
        FlashcardRepository::new(self.connection.clone())
    }
}

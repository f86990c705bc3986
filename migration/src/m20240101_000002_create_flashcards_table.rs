use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flashcards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flashcards::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Flashcards::UserId).uuid().not_null())
                    .col(ColumnDef::new(Flashcards::PdfName).string().null())
                    .col(ColumnDef::new(Flashcards::Question).text().not_null())
                    .col(ColumnDef::new(Flashcards::Answer).text().not_null())
                    .col(ColumnDef::new(Flashcards::Difficulty).string().null())
                    .col(
                        ColumnDef::new(Flashcards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Every flashcard query is scoped to one user
        manager
            .create_index(
                Index::create()
                    .name("idx_flashcards_user_id")
                    .table(Flashcards::Table)
                    .col(Flashcards::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flashcards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Flashcards {
    Table,
    Id,
    UserId,
    PdfName,
    Question,
    Answer,
    Difficulty,
    CreatedAt,
}

use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The deployment does not provide this server-side procedure
    #[error("remote procedure `{name}` is not available")]
    ProcedureNotFound { name: &'static str },
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_procedure_missing(&self) -> bool {
        matches!(self, StoreError::ProcedureNotFound { .. })
    }
}

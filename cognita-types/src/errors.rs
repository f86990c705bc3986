use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ApiError {
    AuthenticationRequired,
    InvalidToken,
    SessionExpired,
    NotFound { resource: String },
    InvalidRequest { message: String },
    NoFlashcards,
    InternalError { message: String },
}

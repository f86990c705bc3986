use std::sync::Arc;

use cognita_core::{QuizBuilder, evaluate_achievements, grade_quiz};
use cognita_persistence::FlashcardRepository;
use cognita_types::{
    AchievementsResponse, ApiError, ErrorResponse, FlashcardId, FlashcardsResponse,
    GradeQuizRequest, Notification, QuizResponse, QuizResultResponse, SaveFlashcardsRequest,
    StatsResponse, UserId,
};
use serde::Serialize;
use warp::http::StatusCode;

use crate::auth::{AuthError, AuthService};
use crate::sessions::{SessionHandle, SessionManager};
use crate::stats_tracker::TrackerError;

pub type ApiReply = warp::reply::WithStatus<warp::reply::Json>;

/// A tracker operation requested over HTTP
#[derive(Debug, Clone, PartialEq)]
pub enum StatsAction {
    Refresh,
    Reset,
    AddFlashcards(i32),
    SetFlashcards(i32),
    SyncFlashcards,
    AddStudied(i32),
    Score(f64),
    Streak,
    CompleteSession { score: f64, cards_studied: i32 },
}

fn reply<T: Serialize>(body: &T, status: StatusCode) -> ApiReply {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error_reply(error: ApiError, status: StatusCode, notifications: Vec<Notification>) -> ApiReply {
    reply(
        &ErrorResponse {
            error,
            notifications,
        },
        status,
    )
}

fn internal_error(message: impl Into<String>, notifications: Vec<Notification>) -> ApiReply {
    error_reply(
        ApiError::InternalError {
            message: message.into(),
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        notifications,
    )
}

fn tracker_failure(err: TrackerError, notifications: Vec<Notification>) -> ApiReply {
    match err {
        TrackerError::InvalidArgument(message) => error_reply(
            ApiError::InvalidRequest { message },
            StatusCode::BAD_REQUEST,
            notifications,
        ),
        TrackerError::Store(err) => internal_error(err.to_string(), notifications),
    }
}

fn authenticate(auth_header: Option<String>, auth: &AuthService) -> Result<UserId, ApiReply> {
    let Some(header) = auth_header else {
        return Err(error_reply(
            ApiError::AuthenticationRequired,
            StatusCode::UNAUTHORIZED,
            Vec::new(),
        ));
    };

    auth.validate_header(&header)
        .map(|user| user.id)
        .map_err(|err| {
            let error = match err {
                AuthError::TokenExpired => ApiError::SessionExpired,
                AuthError::MissingToken => ApiError::AuthenticationRequired,
                _ => ApiError::InvalidToken,
            };
            error_reply(error, StatusCode::UNAUTHORIZED, Vec::new())
        })
}

/// Authenticate and return the caller's session, opening it if needed
async fn open_session(
    auth_header: Option<String>,
    sessions: &SessionManager,
    auth: &AuthService,
) -> Result<(UserId, SessionHandle), ApiReply> {
    let user_id = authenticate(auth_header, auth)?;
    match sessions.open(user_id).await {
        Ok(session) => Ok((user_id, session)),
        Err(err) => Err(tracker_failure(
            err,
            sessions.drain_notifications(user_id).await,
        )),
    }
}

async fn stats_reply(session: &SessionHandle) -> ApiReply {
    let response = StatsResponse {
        stats: session.tracker.snapshot().await,
        loading: session.tracker.is_loading().await,
        notifications: session.notifications.drain(),
    };
    reply(&response, StatusCode::OK)
}

async fn finish(session: &SessionHandle, result: Result<(), TrackerError>) -> ApiReply {
    match result {
        Ok(()) => stats_reply(session).await,
        Err(err) => tracker_failure(err, session.notifications.drain()),
    }
}

pub async fn handle_sign_in(
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    match open_session(auth_header, &sessions, &auth).await {
        Ok((_, session)) => Ok(stats_reply(&session).await),
        Err(reply) => Ok(reply),
    }
}

pub async fn handle_sign_out(
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let user_id = match authenticate(auth_header, &auth) {
        Ok(user_id) => user_id,
        Err(reply) => return Ok(reply),
    };

    let closed = sessions.close(user_id).await;
    Ok(reply(
        &serde_json::json!({ "signedOut": closed }),
        StatusCode::OK,
    ))
}

pub async fn handle_get_stats(
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    handle_sign_in(auth_header, sessions, auth).await
}

pub async fn handle_stats_action(
    action: StatsAction,
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let (user_id, session) = match open_session(auth_header, &sessions, &auth).await {
        Ok(opened) => opened,
        Err(reply) => return Ok(reply),
    };

    tracing::debug!(%user_id, ?action, "Stats action");
    let tracker = &session.tracker;
    let result = match action {
        StatsAction::Refresh => tracker.fetch_stats().await,
        StatsAction::Reset => tracker.reset_daily_stats().await,
        StatsAction::AddFlashcards(delta) => tracker.update_total_flashcards(delta).await,
        StatsAction::SetFlashcards(count) => tracker.update_total_flashcards_to_count(count).await,
        StatsAction::SyncFlashcards => tracker.sync_total_flashcards().await,
        StatsAction::AddStudied(delta) => tracker.update_studied_today(delta).await,
        StatsAction::Score(score) => tracker.update_average_score(score).await,
        StatsAction::Streak => tracker.update_study_streak().await,
        StatsAction::CompleteSession {
            score,
            cards_studied,
        } => {
            if cards_studied < 0 {
                return Ok(error_reply(
                    ApiError::InvalidRequest {
                        message: "cardsStudied must not be negative".to_string(),
                    },
                    StatusCode::BAD_REQUEST,
                    session.notifications.drain(),
                ));
            }
            tracker.complete_study_session(score, cards_studied).await
        }
    };

    Ok(finish(&session, result).await)
}

pub async fn handle_list_flashcards(
    auth_header: Option<String>,
    flashcards: Arc<FlashcardRepository>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let user_id = match authenticate(auth_header, &auth) {
        Ok(user_id) => user_id,
        Err(reply) => return Ok(reply),
    };

    match flashcards.list_for_user(user_id).await {
        Ok(cards) => Ok(reply(
            &FlashcardsResponse {
                flashcards: cards,
                notifications: sessions.drain_notifications(user_id).await,
            },
            StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!(%user_id, "Failed to list flashcards: {}", err);
            Ok(internal_error("Failed to fetch flashcards", Vec::new()))
        }
    }
}

/// Store generated cards, then count them into the user's total
pub async fn handle_save_flashcards(
    request: SaveFlashcardsRequest,
    auth_header: Option<String>,
    flashcards: Arc<FlashcardRepository>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let (user_id, session) = match open_session(auth_header, &sessions, &auth).await {
        Ok(opened) => opened,
        Err(reply) => return Ok(reply),
    };

    if request.flashcards.is_empty() {
        return Ok(error_reply(
            ApiError::InvalidRequest {
                message: "No flashcards provided".to_string(),
            },
            StatusCode::BAD_REQUEST,
            session.notifications.drain(),
        ));
    }
    if request
        .flashcards
        .iter()
        .any(|card| card.question.trim().is_empty() || card.answer.trim().is_empty())
    {
        return Ok(error_reply(
            ApiError::InvalidRequest {
                message: "Flashcards need a question and an answer".to_string(),
            },
            StatusCode::BAD_REQUEST,
            session.notifications.drain(),
        ));
    }

    let saved = match flashcards.insert_many(user_id, request.flashcards).await {
        Ok(saved) => saved,
        Err(err) => {
            tracing::error!(%user_id, "Failed to save flashcards: {}", err);
            return Ok(internal_error(
                "Failed to save flashcards",
                session.notifications.drain(),
            ));
        }
    };

    // The cards are stored either way; a failed count update only toasts
    let added = i32::try_from(saved.len()).unwrap_or(i32::MAX);
    if let Err(err) = session.tracker.update_total_flashcards(added).await {
        tracing::warn!(%user_id, "Flashcards saved but total not updated: {}", err);
    }

    Ok(reply(
        &FlashcardsResponse {
            flashcards: saved,
            notifications: session.notifications.drain(),
        },
        StatusCode::CREATED,
    ))
}

/// Delete a card, then resynchronise the total with the exact count
pub async fn handle_delete_flashcard(
    id: FlashcardId,
    auth_header: Option<String>,
    flashcards: Arc<FlashcardRepository>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let (user_id, session) = match open_session(auth_header, &sessions, &auth).await {
        Ok(opened) => opened,
        Err(reply) => return Ok(reply),
    };

    match flashcards.delete(user_id, id).await {
        Ok(true) => {}
        Ok(false) => {
            return Ok(error_reply(
                ApiError::NotFound {
                    resource: format!("flashcard {}", id),
                },
                StatusCode::NOT_FOUND,
                session.notifications.drain(),
            ));
        }
        Err(err) => {
            tracing::error!(%user_id, %id, "Failed to delete flashcard: {}", err);
            return Ok(internal_error(
                "Failed to delete flashcard",
                session.notifications.drain(),
            ));
        }
    }

    let result = session.tracker.sync_total_flashcards().await;
    Ok(finish(&session, result).await)
}

pub async fn handle_get_quiz(
    auth_header: Option<String>,
    flashcards: Arc<FlashcardRepository>,
    quiz: Arc<QuizBuilder>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let user_id = match authenticate(auth_header, &auth) {
        Ok(user_id) => user_id,
        Err(reply) => return Ok(reply),
    };

    let cards = match flashcards.list_for_user(user_id).await {
        Ok(cards) => cards,
        Err(err) => {
            tracing::error!(%user_id, "Failed to load flashcards for quiz: {}", err);
            return Ok(internal_error("Failed to fetch flashcards", Vec::new()));
        }
    };

    if cards.is_empty() {
        return Ok(error_reply(
            ApiError::NoFlashcards,
            StatusCode::BAD_REQUEST,
            Vec::new(),
        ));
    }

    let built = {
        let mut rng = rand::thread_rng();
        quiz.build(&cards, &mut rng)
    };

    match built {
        Ok(questions) => Ok(reply(&QuizResponse { questions }, StatusCode::OK)),
        Err(err) => {
            tracing::error!(%user_id, "Failed to build quiz: {}", err);
            Ok(internal_error(err.to_string(), Vec::new()))
        }
    }
}

/// Grade the submitted answers and record them as one study session
pub async fn handle_grade_quiz(
    request: GradeQuizRequest,
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let (_, session) = match open_session(auth_header, &sessions, &auth).await {
        Ok(opened) => opened,
        Err(reply) => return Ok(reply),
    };

    if request.answers.is_empty() {
        return Ok(error_reply(
            ApiError::InvalidRequest {
                message: "No answers submitted".to_string(),
            },
            StatusCode::BAD_REQUEST,
            session.notifications.drain(),
        ));
    }

    let tally = grade_quiz(&request.answers);
    let score = tally.score_percent();
    let cards = i32::try_from(tally.total).unwrap_or(i32::MAX);

    if let Err(err) = session.tracker.complete_study_session(score, cards).await {
        return Ok(tracker_failure(err, session.notifications.drain()));
    }

    Ok(reply(
        &QuizResultResponse {
            score,
            correct: tally.correct,
            total: tally.total,
            stats: session.tracker.snapshot().await,
            notifications: session.notifications.drain(),
        },
        StatusCode::OK,
    ))
}

pub async fn handle_achievements(
    auth_header: Option<String>,
    sessions: Arc<SessionManager>,
    auth: Arc<AuthService>,
) -> Result<ApiReply, warp::Rejection> {
    let (_, session) = match open_session(auth_header, &sessions, &auth).await {
        Ok(opened) => opened,
        Err(reply) => return Ok(reply),
    };

    let achievements = evaluate_achievements(&session.tracker.snapshot().await);
    let unlocked_count = achievements.iter().filter(|a| a.unlocked).count() as u32;
    let total_count = achievements.len() as u32;

    Ok(reply(
        &AchievementsResponse {
            achievements,
            unlocked_count,
            total_count,
        },
        StatusCode::OK,
    ))
}

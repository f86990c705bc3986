use std::sync::Arc;
use warp::Filter;

use crate::auth::AuthService;
use crate::handlers::StatsAction;
use crate::sessions::SessionManager;
use cognita_core::QuizBuilder;
use cognita_persistence::FlashcardRepository;
use cognita_types::{
    CompleteSessionRequest, CountRequest, DeltaRequest, FlashcardId, GradeQuizRequest,
    SaveFlashcardsRequest, ScoreRequest,
};

pub mod auth;
pub mod config;
pub mod handlers;
pub mod sessions;
pub mod stats_tracker;

fn with_action(
    action: StatsAction,
) -> impl Filter<Extract = (StatsAction,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || action.clone())
}

pub fn create_routes(
    session_manager: Arc<SessionManager>,
    flashcard_repository: Arc<FlashcardRepository>,
    auth_service: Arc<AuthService>,
    quiz_builder: Arc<QuizBuilder>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let sessions_filter = warp::any().map({
        let session_manager = session_manager.clone();
        move || session_manager.clone()
    });

    let flashcards_filter = warp::any().map({
        let flashcard_repository = flashcard_repository.clone();
        move || flashcard_repository.clone()
    });

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    let quiz_filter = warp::any().map({
        let quiz_builder = quiz_builder.clone();
        move || quiz_builder.clone()
    });

    let auth_header = warp::header::optional::<String>("authorization");

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Session lifecycle
    let sign_in = warp::path("session")
        .and(warp::path::end())
        .and(warp::post())
        .and(auth_header)
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_sign_in);

    let sign_out = warp::path("session")
        .and(warp::path::end())
        .and(warp::delete())
        .and(auth_header)
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_sign_out);

    // Stats
    let get_stats = warp::path("stats")
        .and(warp::path::end())
        .and(warp::get())
        .and(auth_header)
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_get_stats);

    let refresh = warp::path!("stats" / "refresh")
        .and(warp::post())
        .and(with_action(StatsAction::Refresh));

    let reset = warp::path!("stats" / "reset")
        .and(warp::post())
        .and(with_action(StatsAction::Reset));

    let add_flashcards = warp::path!("stats" / "flashcards")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: DeltaRequest| StatsAction::AddFlashcards(body.delta));

    let set_flashcards = warp::path!("stats" / "flashcards")
        .and(warp::put())
        .and(warp::body::json())
        .map(|body: CountRequest| StatsAction::SetFlashcards(body.count));

    let sync_flashcards = warp::path!("stats" / "flashcards" / "sync")
        .and(warp::post())
        .and(with_action(StatsAction::SyncFlashcards));

    let studied = warp::path!("stats" / "studied")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: DeltaRequest| StatsAction::AddStudied(body.delta));

    let score = warp::path!("stats" / "score")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: ScoreRequest| StatsAction::Score(body.score));

    let streak = warp::path!("stats" / "streak")
        .and(warp::post())
        .and(with_action(StatsAction::Streak));

    let complete = warp::path!("sessions" / "complete")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: CompleteSessionRequest| StatsAction::CompleteSession {
            score: body.score,
            cards_studied: body.cards_studied,
        });

    let stats_actions = refresh
        .or(reset)
        .unify()
        .or(add_flashcards)
        .unify()
        .or(set_flashcards)
        .unify()
        .or(sync_flashcards)
        .unify()
        .or(studied)
        .unify()
        .or(score)
        .unify()
        .or(streak)
        .unify()
        .or(complete)
        .unify()
        .and(auth_header)
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_stats_action);

    // Flashcards
    let list_flashcards = warp::path("flashcards")
        .and(warp::path::end())
        .and(warp::get())
        .and(auth_header)
        .and(flashcards_filter.clone())
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_list_flashcards);

    let save_flashcards = warp::path("flashcards")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<SaveFlashcardsRequest>())
        .and(auth_header)
        .and(flashcards_filter.clone())
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_save_flashcards);

    let delete_flashcard = warp::path!("flashcards" / FlashcardId)
        .and(warp::delete())
        .and(auth_header)
        .and(flashcards_filter.clone())
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_delete_flashcard);

    // Quiz
    let get_quiz = warp::path("quiz")
        .and(warp::path::end())
        .and(warp::get())
        .and(auth_header)
        .and(flashcards_filter.clone())
        .and(quiz_filter)
        .and(auth_filter.clone())
        .and_then(handlers::handle_get_quiz);

    let grade_quiz = warp::path!("quiz" / "grade")
        .and(warp::post())
        .and(warp::body::json::<GradeQuizRequest>())
        .and(auth_header)
        .and(sessions_filter.clone())
        .and(auth_filter.clone())
        .and_then(handlers::handle_grade_quiz);

    let achievements = warp::path("achievements")
        .and(warp::path::end())
        .and(warp::get())
        .and(auth_header)
        .and(sessions_filter)
        .and(auth_filter)
        .and_then(handlers::handle_achievements);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    health
        .or(sign_in)
        .or(sign_out)
        .or(get_stats)
        .or(stats_actions)
        .or(list_flashcards)
        .or(save_flashcards)
        .or(delete_flashcard)
        .or(get_quiz)
        .or(grade_quiz)
        .or(achievements)
        .with(cors)
        .with(warp::log("cognita"))
}


use cognita_persistence::{StatsStore, StoreError};
use cognita_server::stats_tracker::TrackerError;
use cognita_types::{StatsPatch, StudyStats};
use std::sync::atomic::Ordering;
use test_helpers::*;

#[tokio::test]
async fn test_sign_in_creates_row_lazily() {
    let setup = TestSetup::new(true).await;
    assert!(setup.direct.fetch_stats(setup.user_id).await.unwrap().is_none());

    setup.tracker.sign_in(setup.user_id).await.unwrap();

    let stored = setup.stored().await;
    assert_eq!(stored.daily_goal, 10);
    assert_eq!(stored.total_flashcards, 0);
    assert_eq!(setup.tracker.snapshot().await, StudyStats::default());
    assert!(!setup.tracker.is_loading().await);
    assert!(setup.notifications.is_empty());
}

#[tokio::test]
async fn test_sign_in_loads_existing_row() {
    let setup = TestSetup::new(true).await;
    setup.direct.insert_default_stats(setup.user_id).await.unwrap();
    setup
        .write(StatsPatch {
            total_flashcards: Some(12),
            studied_today: Some(4),
            average_score: Some(77.6),
            ..StatsPatch::default()
        })
        .await;

    setup.tracker.sign_in(setup.user_id).await.unwrap();

    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.total_flashcards, 12);
    assert_eq!(stats.average_score, 78);
    assert_eq!(stats.progress_percentage, 40.0);
    // Loading existing progress is not an unlock
    assert!(setup.notifications.is_empty());
}

#[tokio::test]
async fn test_failed_load_clears_loading_and_toasts() {
    let setup = TestSetup::new(true).await;
    FlakyStore::set(&setup.store.fail_fetch, true);

    let result = setup.tracker.sign_in(setup.user_id).await;

    assert!(matches!(result, Err(TrackerError::Store(_))));
    assert!(!setup.tracker.is_loading().await);
    assert_eq!(setup.tracker.current_user().await, Some(setup.user_id));
    assert_eq!(setup.tracker.snapshot().await, StudyStats::default());
    assert_eq!(
        setup.error_toasts(),
        vec!["Failed to load your stats. Please try again."]
    );

    // A later refresh recovers
    FlakyStore::set(&setup.store.fail_fetch, false);
    setup.tracker.fetch_stats().await.unwrap();
    assert!(setup.error_toasts().is_empty());
}

#[tokio::test]
async fn test_signed_out_operations_do_nothing() {
    let setup = TestSetup::new(true).await;
    FlakyStore::set(&setup.store.fail_fetch, true);
    FlakyStore::set(&setup.store.fail_updates, true);
    FlakyStore::set(&setup.store.fail_increments, true);

    setup.tracker.fetch_stats().await.unwrap();
    setup.tracker.update_total_flashcards(2).await.unwrap();
    setup.tracker.update_total_flashcards_to_count(4).await.unwrap();
    setup.tracker.sync_total_flashcards().await.unwrap();
    setup.tracker.update_studied_today(1).await.unwrap();
    setup.tracker.update_average_score(50.0).await.unwrap();
    setup.tracker.update_study_streak().await.unwrap();
    setup.tracker.complete_study_session(50.0, 1).await.unwrap();
    setup.tracker.reset_daily_stats().await.unwrap();

    assert!(setup.notifications.is_empty());
    assert_eq!(setup.store.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_streak_advances_by_calendar_day() {
    for procedures in [true, false] {
        let setup = TestSetup::signed_in(procedures).await;
        setup.write(StatsPatch::streak(4, date(2025, 6, 9))).await;

        // Next day
        setup.tracker.update_study_streak().await.unwrap();
        let stored = setup.stored().await;
        assert_eq!(stored.study_streak, 5, "procedures: {}", procedures);
        assert_eq!(stored.last_streak_date, Some(date(2025, 6, 10)));
        assert_eq!(setup.tracker.snapshot().await.streak_days, 5);

        // Same day again
        setup.tracker.update_study_streak().await.unwrap();
        assert_eq!(setup.stored().await.study_streak, 5);

        // Two missed days
        setup.clock.set_date(date(2025, 6, 13));
        setup.tracker.update_study_streak().await.unwrap();
        let stored = setup.stored().await;
        assert_eq!(stored.study_streak, 1);
        assert_eq!(stored.last_streak_date, Some(date(2025, 6, 13)));
        assert_eq!(setup.tracker.snapshot().await.streak_days, 1);
    }
}

#[tokio::test]
async fn test_first_streak_starts_at_one() {
    let setup = TestSetup::signed_in(false).await;

    setup.tracker.update_study_streak().await.unwrap();

    let stored = setup.stored().await;
    assert_eq!(stored.study_streak, 1);
    assert_eq!(stored.last_streak_date, Some(date(2025, 6, 10)));
}

#[tokio::test]
async fn test_same_day_streak_update_is_idempotent() {
    for procedures in [true, false] {
        let setup = TestSetup::signed_in(procedures).await;

        setup.tracker.update_study_streak().await.unwrap();
        let after_first = setup.stored().await;
        let updates_after_first = setup.store.update_calls.load(Ordering::SeqCst);

        setup.tracker.update_study_streak().await.unwrap();

        assert_eq!(setup.stored().await, after_first);
        assert_eq!(
            setup.store.update_calls.load(Ordering::SeqCst),
            updates_after_first
        );
    }
}

#[tokio::test]
async fn test_clock_skew_resets_streak() {
    let setup = TestSetup::signed_in(false).await;
    setup.write(StatsPatch::streak(9, date(2025, 6, 12))).await;

    setup.tracker.update_study_streak().await.unwrap();

    assert_eq!(setup.stored().await.study_streak, 1);
}

#[tokio::test]
async fn test_streak_failure_toasts_and_keeps_local_state() {
    let setup = TestSetup::signed_in(false).await;
    FlakyStore::set(&setup.store.fail_fetch, true);

    let result = setup.tracker.update_study_streak().await;

    assert!(result.is_err());
    assert_eq!(setup.tracker.snapshot().await.streak_days, 0);
    assert_eq!(setup.error_toasts(), vec!["Failed to update study streak."]);
}

#[tokio::test]
async fn test_first_session_sets_average() {
    let setup = TestSetup::signed_in(true).await;

    setup.tracker.complete_study_session(80.0, 1).await.unwrap();

    let stored = setup.stored().await;
    assert_eq!(stored.average_score, 80.0);
    assert_eq!(stored.studied_today, 1);
    assert_eq!(stored.study_streak, 1);
    assert_eq!(setup.tracker.snapshot().await.average_score, 80);
}

#[tokio::test]
async fn test_running_average_over_sessions() {
    let setup = TestSetup::signed_in(true).await;
    setup
        .write(StatsPatch {
            studied_today: Some(1),
            average_score: Some(80.0),
            ..StatsPatch::default()
        })
        .await;
    setup.tracker.fetch_stats().await.unwrap();

    setup.tracker.complete_study_session(100.0, 1).await.unwrap();

    let stored = setup.stored().await;
    assert_eq!(stored.studied_today, 2);
    assert_eq!(stored.average_score, 90.0);
    assert_eq!(setup.tracker.snapshot().await.average_score, 90);
}

#[tokio::test]
async fn test_out_of_range_score_is_clamped() {
    let setup = TestSetup::signed_in(true).await;

    setup.tracker.update_average_score(140.0).await.unwrap();

    assert_eq!(setup.stored().await.average_score, 100.0);
}

#[tokio::test]
async fn test_progress_is_capped_at_goal() {
    let setup = TestSetup::signed_in(true).await;

    setup.tracker.update_studied_today(15).await.unwrap();

    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.studied_today, 15);
    assert_eq!(stats.progress_percentage, 100.0);
    assert_eq!(setup.stored().await.studied_today, 15);
}

#[tokio::test]
async fn test_failed_flashcard_increment_is_reverted() {
    let setup = TestSetup::signed_in(false).await;
    setup.tracker.update_total_flashcards(2).await.unwrap();
    FlakyStore::set(&setup.store.fail_updates, true);

    let result = setup.tracker.update_total_flashcards(5).await;

    assert!(result.is_err());
    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 2);
    assert_eq!(setup.stored().await.total_flashcards, 2);
    assert_eq!(setup.error_toasts(), vec!["Failed to update flashcard count."]);
}

#[tokio::test]
async fn test_genuine_procedure_error_skips_fallback() {
    let setup = TestSetup::signed_in(true).await;
    FlakyStore::set(&setup.store.fail_increments, true);

    let result = setup.tracker.update_studied_today(2).await;

    assert!(matches!(
        result,
        Err(TrackerError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(setup.store.update_calls.load(Ordering::SeqCst), 0);
    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.studied_today, 0);
    assert_eq!(stats.progress_percentage, 0.0);
    assert_eq!(setup.error_toasts(), vec!["Failed to update study progress."]);
}

#[tokio::test]
async fn test_missing_procedure_falls_back_to_direct_write() {
    let setup = TestSetup::signed_in(false).await;

    setup.tracker.update_studied_today(3).await.unwrap();
    setup.tracker.update_total_flashcards(4).await.unwrap();

    let stored = setup.stored().await;
    assert_eq!(stored.studied_today, 3);
    assert_eq!(stored.total_flashcards, 4);
    assert_eq!(setup.store.update_calls.load(Ordering::SeqCst), 2);
    assert!(setup.error_toasts().is_empty());
}

#[tokio::test]
async fn test_fallback_writes_from_local_basis() {
    let setup = TestSetup::signed_in(false).await;
    setup.tracker.update_total_flashcards(3).await.unwrap();

    // Another client moves the remote total without this tracker noticing
    setup.write(StatsPatch::total_flashcards(10)).await;

    setup.tracker.update_total_flashcards(2).await.unwrap();

    // The stale local basis wins: 3 + 2, not 10 + 2
    assert_eq!(setup.stored().await.total_flashcards, 5);
    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 5);
}

#[tokio::test]
async fn test_set_count_failure_restores_previous_value() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.update_total_flashcards_to_count(6).await.unwrap();
    FlakyStore::set(&setup.store.fail_updates, true);

    assert!(setup.tracker.update_total_flashcards_to_count(40).await.is_err());

    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 6);
    assert_eq!(setup.error_toasts(), vec!["Failed to update flashcard count."]);
}

#[tokio::test]
async fn test_sync_uses_exact_flashcard_count() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.update_total_flashcards(20).await.unwrap();
    setup.add_cards(7).await;

    setup.tracker.sync_total_flashcards().await.unwrap();

    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 7);
    assert_eq!(setup.stored().await.total_flashcards, 7);
}

#[tokio::test]
async fn test_sync_count_failure() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.update_total_flashcards(3).await.unwrap();
    FlakyStore::set(&setup.store.fail_count, true);

    assert!(setup.tracker.sync_total_flashcards().await.is_err());
    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 3);
}

#[tokio::test]
async fn test_failed_average_write_resyncs() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.complete_study_session(60.0, 1).await.unwrap();
    setup.notifications.drain();
    FlakyStore::set(&setup.store.fail_updates, true);

    let result = setup.tracker.update_average_score(100.0).await;

    assert!(result.is_err());
    assert_eq!(setup.tracker.snapshot().await.average_score, 60);
    assert_eq!(setup.stored().await.average_score, 60.0);
    assert_eq!(setup.error_toasts(), vec!["Failed to update average score."]);
}

#[tokio::test]
async fn test_partial_session_keeps_earlier_steps() {
    let setup = TestSetup::signed_in(true).await;
    FlakyStore::set(&setup.store.fail_streak, true);

    let result = setup.tracker.complete_study_session(70.0, 2).await;

    assert!(result.is_err());
    let stored = setup.stored().await;
    assert_eq!(stored.studied_today, 2);
    assert_eq!(stored.average_score, 35.0);
    assert_eq!(stored.study_streak, 0);

    let toasts = setup.notifications.drain();
    assert!(toasts.iter().all(|n| n.title != "Great job!"));
    assert!(
        toasts
            .iter()
            .any(|n| n.description == "Failed to update study streak.")
    );
}

#[tokio::test]
async fn test_failed_average_still_advances_streak() {
    let setup = TestSetup::signed_in(true).await;
    FlakyStore::set(&setup.store.fail_updates, true);

    let result = setup.tracker.complete_study_session(80.0, 1).await;

    assert!(matches!(result, Err(TrackerError::Store(_))));
    let stored = setup.stored().await;
    assert_eq!(stored.studied_today, 1);
    assert_eq!(stored.average_score, 0.0);
    assert_eq!(stored.study_streak, 1);

    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.streak_days, 1);
    assert_eq!(stats.average_score, 0);
    assert_eq!(setup.error_toasts(), vec!["Failed to update average score."]);
}

#[tokio::test]
async fn test_session_attempts_every_step() {
    let setup = TestSetup::signed_in(false).await;
    FlakyStore::set(&setup.store.fail_updates, true);

    assert!(setup.tracker.complete_study_session(90.0, 1).await.is_err());

    // Studied fallback, average write and manual streak write
    assert_eq!(setup.store.update_calls.load(Ordering::SeqCst), 3);
    let stored = setup.stored().await;
    assert_eq!(stored.studied_today, 0);
    assert_eq!(stored.average_score, 0.0);
    assert_eq!(stored.study_streak, 0);
    assert_eq!(
        setup.error_toasts(),
        vec![
            "Failed to update study progress.",
            "Failed to update average score.",
            "Failed to update study streak.",
        ]
    );
}

#[tokio::test]
async fn test_overflowing_flashcard_delta_is_rejected() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.update_total_flashcards(1).await.unwrap();

    let result = setup.tracker.update_total_flashcards(i32::MAX).await;

    assert!(matches!(result, Err(TrackerError::InvalidArgument(_))));
    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 1);
    assert_eq!(setup.stored().await.total_flashcards, 1);
    assert!(setup.error_toasts().is_empty());
}

#[tokio::test]
async fn test_overflowing_studied_delta_is_rejected() {
    let setup = TestSetup::signed_in(false).await;
    setup.tracker.update_studied_today(3).await.unwrap();

    let result = setup.tracker.update_studied_today(i32::MAX).await;

    assert!(matches!(result, Err(TrackerError::InvalidArgument(_))));
    // Rejected before the fallback write
    assert_eq!(setup.store.update_calls.load(Ordering::SeqCst), 1);
    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.studied_today, 3);
    assert_eq!(stats.progress_percentage, 30.0);
    assert_eq!(setup.stored().await.studied_today, 3);
}

#[tokio::test]
async fn test_minimum_delta_reverts_without_overflow() {
    let setup = TestSetup::signed_in(true).await;
    FlakyStore::set(&setup.store.fail_increments, true);

    let result = setup.tracker.update_total_flashcards(i32::MIN).await;

    assert!(matches!(result, Err(TrackerError::Store(_))));
    assert_eq!(setup.tracker.snapshot().await.total_flashcards, 0);
    assert_eq!(setup.error_toasts(), vec!["Failed to update flashcard count."]);
}

#[tokio::test]
async fn test_completed_session_summary_toast() {
    let setup = TestSetup::signed_in(true).await;

    setup.tracker.complete_study_session(75.4, 3).await.unwrap();
    let toasts = setup.notifications.drain();
    let summary = toasts.iter().find(|n| n.title == "Great job!").unwrap();
    assert_eq!(summary.description, "You studied 3 cards and scored 75%");

    setup.tracker.complete_study_session(100.0, 1).await.unwrap();
    let toasts = setup.notifications.drain();
    let summary = toasts.iter().find(|n| n.title == "Great job!").unwrap();
    assert_eq!(summary.description, "You studied 1 card and scored 100%");
}

#[tokio::test]
async fn test_unlocks_are_announced_once() {
    let setup = TestSetup::signed_in(true).await;

    setup.tracker.update_total_flashcards(10).await.unwrap();
    let toasts = setup.notifications.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "🥉 Achievement Unlocked!");
    assert_eq!(
        toasts[0].description,
        "Getting Started: Create your first 10 flashcards"
    );

    setup.tracker.update_total_flashcards(1).await.unwrap();
    assert!(setup.notifications.is_empty());
}

#[tokio::test]
async fn test_reset_daily_stats() {
    let setup = TestSetup::signed_in(true).await;
    setup.tracker.update_studied_today(6).await.unwrap();

    setup.tracker.reset_daily_stats().await.unwrap();
    let stats = setup.tracker.snapshot().await;
    assert_eq!(stats.studied_today, 0);
    assert_eq!(stats.progress_percentage, 0.0);
    assert_eq!(setup.stored().await.studied_today, 0);

    setup.tracker.update_studied_today(2).await.unwrap();
    FlakyStore::set(&setup.store.fail_updates, true);
    assert!(setup.tracker.reset_daily_stats().await.is_err());
    assert_eq!(setup.tracker.snapshot().await.studied_today, 2);
    assert_eq!(setup.error_toasts(), vec!["Failed to reset daily stats."]);
}

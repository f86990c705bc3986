use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cognita_core::{Clock, LogSink, NotificationBus, NotificationQueue};
use cognita_persistence::StatsStore;
use cognita_types::{Notification, UserId};
use tokio::sync::RwLock;

use crate::stats_tracker::{StatsTracker, TrackerError};

/// What a request needs from a user's session
#[derive(Clone)]
pub struct SessionHandle {
    pub tracker: Arc<StatsTracker>,
    pub notifications: NotificationQueue,
}

struct Session {
    handle: SessionHandle,
    started_at: Instant,
    last_activity: Instant,
}

impl Session {
    fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// One [`StatsTracker`] per signed-in user
pub struct SessionManager {
    sessions: RwLock<HashMap<UserId, Session>>,
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn StatsStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            clock,
        }
    }

    /// Return the user's session, signing them in first if there is none.
    ///
    /// A session whose initial load fails is still registered so a later
    /// refresh can recover; the load error is returned.
    pub async fn open(&self, user_id: UserId) -> Result<SessionHandle, TrackerError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(&user_id) {
                session.last_activity = Instant::now();
                return Ok(session.handle.clone());
            }

            let notifications = NotificationQueue::new();
            let bus = NotificationBus::new()
                .with_sink(Arc::new(notifications.clone()))
                .with_sink(Arc::new(LogSink));
            let tracker = Arc::new(StatsTracker::new(
                self.store.clone(),
                self.clock.clone(),
                Arc::new(bus),
            ));
            let handle = SessionHandle {
                tracker,
                notifications,
            };
            let now = Instant::now();
            sessions.insert(
                user_id,
                Session {
                    handle: handle.clone(),
                    started_at: now,
                    last_activity: now,
                },
            );
            handle
        };

        tracing::info!(%user_id, "Opened stats session");
        handle.tracker.sign_in(user_id).await?;
        Ok(handle)
    }

    /// Sign the user out and forget the session. Returns false if there was none.
    pub async fn close(&self, user_id: UserId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&user_id)
        };

        match removed {
            Some(session) => {
                session.handle.tracker.sign_out().await;
                tracing::info!(
                    %user_id,
                    duration_secs = session.started_at.elapsed().as_secs(),
                    "Closed stats session"
                );
                true
            }
            None => false,
        }
    }

    /// Pending toasts for the user, oldest first
    pub async fn drain_notifications(&self, user_id: UserId) -> Vec<Notification> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&user_id)
            .map(|session| session.handle.notifications.drain())
            .unwrap_or_default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn cleanup_inactive_sessions(&self, timeout: Duration) -> usize {
        let expired: Vec<(UserId, Session)> = {
            let mut sessions = self.sessions.write().await;
            let stale: Vec<UserId> = sessions
                .iter()
                .filter(|(_, session)| session.is_inactive(timeout))
                .map(|(user_id, _)| *user_id)
                .collect();
            stale
                .into_iter()
                .filter_map(|user_id| sessions.remove(&user_id).map(|s| (user_id, s)))
                .collect()
        };

        for (user_id, session) in &expired {
            session.handle.tracker.sign_out().await;
            tracing::info!(%user_id, "Expired inactive stats session");
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognita_core::SystemClock;
    use cognita_persistence::StatsRepository;
    use cognita_persistence::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use uuid::Uuid;

    async fn create_manager() -> SessionManager {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SessionManager::new(Arc::new(StatsRepository::new(db)), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_open_reuses_existing_session() {
        let manager = create_manager().await;
        let user_id = Uuid::new_v4();

        let first = manager.open(user_id).await.unwrap();
        let second = manager.open(user_id).await.unwrap();

        assert!(Arc::ptr_eq(&first.tracker, &second.tracker));
        assert_eq!(manager.session_count().await, 1);
        assert_eq!(first.tracker.current_user().await, Some(user_id));
    }

    #[tokio::test]
    async fn test_close_signs_out() {
        let manager = create_manager().await;
        let user_id = Uuid::new_v4();
        let handle = manager.open(user_id).await.unwrap();

        assert!(manager.close(user_id).await);
        assert!(!manager.close(user_id).await);
        assert_eq!(handle.tracker.current_user().await, None);
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_sessions() {
        let manager = create_manager().await;
        manager.open(Uuid::new_v4()).await.unwrap();
        manager.open(Uuid::new_v4()).await.unwrap();

        assert_eq!(
            manager
                .cleanup_inactive_sessions(Duration::from_secs(3600))
                .await,
            0
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            manager
                .cleanup_inactive_sessions(Duration::from_millis(5))
                .await,
            2
        );
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_notifications_are_per_user() {
        let manager = create_manager().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let alice_session = manager.open(alice).await.unwrap();
        manager.open(bob).await.unwrap();

        alice_session
            .tracker
            .complete_study_session(100.0, 1)
            .await
            .unwrap();

        assert!(manager.drain_notifications(bob).await.is_empty());
        let toasts = manager.drain_notifications(alice).await;
        assert!(toasts.iter().any(|n| n.title == "Great job!"));
        assert!(manager.drain_notifications(alice).await.is_empty());
    }
}

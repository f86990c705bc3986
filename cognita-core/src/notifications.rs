use cognita_types::Notification;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Receiver for user-facing notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Buffers notifications until the caller drains them
#[derive(Clone, Default)]
pub struct NotificationQueue {
    pending: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for NotificationQueue {
    fn notify(&self, notification: Notification) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(notification);
        }
    }
}

/// Writes notifications to the log only
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        if notification.is_error() {
            tracing::warn!(title = %notification.title, "{}", notification.description);
        } else {
            tracing::info!(title = %notification.title, "{}", notification.description);
        }
    }
}

/// Fans each notification out to every registered sink
#[derive(Default)]
pub struct NotificationBus {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, notification: Notification) {
        for sink in &self.sinks {
            sink.notify(notification.clone());
        }
    }
}

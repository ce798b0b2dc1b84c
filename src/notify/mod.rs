//! Transient user notifications.
//!
//! Toasts are queued by the views and shown by the front end until they expire. Every toast is also
//! written to the log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Oldest toasts are dropped past this many.
const MAX_TOASTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Shared toast queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    toasts: Arc<Mutex<VecDeque<Toast>>>,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(VecDeque::new())),
            ttl,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    fn push(&self, kind: ToastKind, message: String) {
        match kind {
            ToastKind::Error => tracing::warn!(toast = %message),
            _ => tracing::info!(toast = %message),
        }

        let mut toasts = self.lock();
        toasts.push_back(Toast {
            kind,
            message,
            raised_at: Instant::now(),
        });
        while toasts.len() > MAX_TOASTS {
            toasts.pop_front();
        }
    }

    /// Toasts that have not expired yet, oldest first. Expired ones are discarded.
    pub fn visible(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut toasts = self.lock();
        toasts.retain(|t| now.duration_since(t.raised_at) < self.ttl);
        toasts.iter().cloned().collect()
    }

    /// Take every queued toast, expired or not.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().drain(..).collect()
    }

    /// Most recent toast, if any.
    pub fn last(&self) -> Option<Toast> {
        self.lock().back().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

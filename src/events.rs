//! Notification hub for badge unlocks and throttled challenge requests
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;
use dashmap::DashMap;
use tracing::error;

use crate::{challenge::Throttled, models::Badge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    BadgeEarned,
    ChallengeThrottled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    BadgeEarned(Badge),
    ChallengeThrottled { card_id: String, wait_secs: i64 },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::BadgeEarned(_) => NotificationKind::BadgeEarned,
            Notification::ChallengeThrottled { .. } => NotificationKind::ChallengeThrottled,
        }
    }

    /// Text shown to the learner
    pub fn message(&self) -> String {
        match self {
            Notification::BadgeEarned(badge) => {
                format!("🎉 Badge Unlocked: {} {}!", badge.icon, badge.name)
            }
            Notification::ChallengeThrottled { wait_secs, .. } => Throttled {
                wait_secs: *wait_secs,
            }
            .to_string(),
        }
    }
}

pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

pub struct NotificationHub {
    handlers: DashMap<NotificationKind, Vec<NotificationHandler>>,
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("kinds", &self.handlers.len())
            .finish()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn on<F>(&self, kind: NotificationKind, handler: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    pub fn on_badge_earned<F>(&self, handler: F)
    where
        F: Fn(&Badge) + Send + Sync + 'static,
    {
        self.on(NotificationKind::BadgeEarned, move |n| {
            if let Notification::BadgeEarned(badge) = n {
                handler(badge);
            }
        })
    }

    pub fn on_challenge_throttled<F>(&self, handler: F)
    where
        F: Fn(&str, i64) + Send + Sync + 'static,
    {
        self.on(NotificationKind::ChallengeThrottled, move |n| {
            if let Notification::ChallengeThrottled { card_id, wait_secs } = n {
                handler(card_id, *wait_secs);
            }
        })
    }

    /// Register `handler` for every kind
    pub fn on_any<F>(&self, handler: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        for kind in [
            NotificationKind::BadgeEarned,
            NotificationKind::ChallengeThrottled,
        ] {
            let handler = handler.clone();
            self.on(kind, move |n| handler(n));
        }
    }

    /// Handlers run outside the registry lock, so they may register more
    /// handlers. Those only see later notifications.
    pub fn emit(&self, notification: &Notification) {
        let kind = notification.kind();
        let handlers: Vec<NotificationHandler> = self
            .handlers
            .get(&kind)
            .map(|handlers| handlers.value().clone())
            .unwrap_or_default();
        for handler in handlers {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(notification);
            }))
            .is_err()
            {
                error!("🚨 Notification handler panicked for {:?}", kind);
            }
        }
    }
}

/// Bounded queue of toast messages waiting to be shown. When full the oldest
/// message is dropped.
#[derive(Debug)]
pub struct Toasts {
    queue: ArrayQueue<String>,
}

impl Toasts {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        self.queue.force_push(message.into());
    }

    pub fn drain(&self) -> Vec<String> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::catalog::test::badge;

    #[test]
    fn dispatches_by_kind() {
        let hub = NotificationHub::new();
        let badges = Arc::new(Mutex::new(Vec::new()));
        let throttles = Arc::new(AtomicUsize::new(0));
        {
            let badges = badges.clone();
            hub.on_badge_earned(move |b| badges.lock().unwrap().push(b.id.clone()));
        }
        {
            let throttles = throttles.clone();
            hub.on_challenge_throttled(move |_, _| {
                throttles.fetch_add(1, Ordering::SeqCst);
            });
        }

        hub.emit(&Notification::BadgeEarned(badge("adept", 10, None)));
        hub.emit(&Notification::ChallengeThrottled {
            card_id: "a".into(),
            wait_secs: 30,
        });
        assert_eq!(*badges.lock().unwrap(), ["adept"]);
        assert_eq!(throttles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_handler_does_not_stop_others() {
        let hub = NotificationHub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        hub.on(NotificationKind::BadgeEarned, |_| panic!("boom"));
        {
            let calls = calls.clone();
            hub.on_any(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        hub.emit(&Notification::BadgeEarned(badge("adept", 10, None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn messages() {
        let mut b = badge("ml", 5, Some("Machine Learning"));
        b.name = "ML Novice".into();
        b.icon = "🌟".into();
        assert_eq!(
            Notification::BadgeEarned(b).message(),
            "🎉 Badge Unlocked: 🌟 ML Novice!"
        );
        let throttled = Notification::ChallengeThrottled {
            card_id: "a".into(),
            wait_secs: 12,
        };
        assert_eq!(
            throttled.message(),
            "Please wait 12s before generating another challenge for this card."
        );
        assert_eq!(throttled.message(), Throttled { wait_secs: 12 }.to_string());
    }

    #[test]
    fn handler_can_register_another_handler() {
        let hub = Arc::new(NotificationHub::new());
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let inner_hub = hub.clone();
            let calls = calls.clone();
            hub.on_badge_earned(move |_| {
                let calls = calls.clone();
                inner_hub.on_badge_earned(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                });
            });
        }
        hub.emit(&Notification::BadgeEarned(badge("adept", 10, None)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        hub.emit(&Notification::BadgeEarned(badge("adept", 10, None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn toasts_drop_oldest_when_full() {
        let toasts = Toasts::new(2);
        toasts.push("one");
        toasts.push("two");
        toasts.push("three");
        assert_eq!(toasts.drain(), ["two", "three"]);
        assert!(toasts.drain().is_empty());
    }
}

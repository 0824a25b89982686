//! Authentication state notifications
//!
//! Every sign-up, sign-in, sign-out and credential change is published on a
//! broadcast channel. Subscribers receive events in publish order; the latest
//! event is also kept in a watch channel so late observers can read the
//! current state without replaying history. Dropping an [`AuthSubscription`]
//! unsubscribes it.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::{broadcast, watch};

use crate::db::repositories::{LoginLogEntry, LoginLogRepository};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedUp { account_id: String, email: String },
    SignedIn { account_id: String, email: String, ip: Option<String> },
    SignInFailed { email: String, ip: Option<String>, reason: String },
    SignedOut { account_id: String },
    PasswordReset { account_id: String },
    EmailVerified { account_id: String },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedUp { .. } => "signed_up",
            AuthEvent::SignedIn { .. } => "signed_in",
            AuthEvent::SignInFailed { .. } => "sign_in_failed",
            AuthEvent::SignedOut { .. } => "signed_out",
            AuthEvent::PasswordReset { .. } => "password_reset",
            AuthEvent::EmailVerified { .. } => "email_verified",
        }
    }
}

/// Publisher side, shared through `Arc`.
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
    latest: watch::Sender<Option<AuthEvent>>,
    subscribers: Arc<AtomicUsize>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (latest, _) = watch::channel(None);
        Self {
            sender,
            latest,
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn publish(&self, event: AuthEvent) {
        tracing::debug!("auth event: {}", event.name());
        self.latest.send_replace(Some(event.clone()));
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> AuthSubscription {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        AuthSubscription {
            receiver: self.sender.subscribe(),
            counter: self.subscribers.clone(),
        }
    }

    /// Most recent event, if any
    pub fn latest(&self) -> watch::Receiver<Option<AuthEvent>> {
        self.latest.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription. Unsubscribes on drop.
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
    counter: Arc<AtomicUsize>,
}

impl AuthSubscription {
    /// Next event, or `None` once the publisher is gone. Events missed
    /// because the subscriber fell behind are skipped with a warning.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("auth subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Record sign-in outcomes into the login log until the publisher closes.
pub fn spawn_login_audit(
    events: &AuthEvents,
    logs: Arc<dyn LoginLogRepository>,
) -> tokio::task::JoinHandle<()> {
    let mut subscription = events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let entry = match event {
                AuthEvent::SignedIn { email, ip, .. } => LoginLogEntry::success(email, ip),
                AuthEvent::SignInFailed { email, ip, reason } => {
                    LoginLogEntry::failure(email, ip, reason)
                }
                _ => continue,
            };
            if let Err(e) = logs.record(&entry).await {
                tracing::warn!("Failed to record login attempt: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, repositories::SqlxLoginLogRepository};
    use std::time::Duration;

    #[tokio::test]
    async fn test_subscribers_see_events_in_order() {
        let events = AuthEvents::new();
        let mut sub = events.subscribe();

        events.publish(AuthEvent::SignedUp {
            account_id: "a".to_string(),
            email: "a@example.com".to_string(),
        });
        events.publish(AuthEvent::SignedOut {
            account_id: "a".to_string(),
        });

        assert_eq!(sub.next().await.unwrap().name(), "signed_up");
        assert_eq!(sub.next().await.unwrap().name(), "signed_out");
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let events = AuthEvents::new();
        let a = events.subscribe();
        let b = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);
        drop(a);
        assert_eq!(events.subscriber_count(), 1);
        drop(b);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_latest_tracks_current_state() {
        let events = AuthEvents::new();
        let latest = events.latest();
        assert!(latest.borrow().is_none());

        events.publish(AuthEvent::EmailVerified {
            account_id: "a".to_string(),
        });
        assert_eq!(
            latest.borrow().as_ref().map(AuthEvent::name),
            Some("email_verified")
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let events = AuthEvents::new();
        events.publish(AuthEvent::SignedOut {
            account_id: "a".to_string(),
        });
    }

    #[tokio::test]
    async fn test_login_audit_records_attempts() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqlxLoginLogRepository::new(pool));

        let events = AuthEvents::new();
        let _audit = spawn_login_audit(&events, repo.clone());

        events.publish(AuthEvent::SignInFailed {
            email: "ana@example.com".to_string(),
            ip: Some("10.0.0.1".to_string()),
            reason: "invalid_credentials".to_string(),
        });
        events.publish(AuthEvent::SignedIn {
            account_id: "a".to_string(),
            email: "ana@example.com".to_string(),
            ip: None,
        });

        let mut logged = Vec::new();
        for _ in 0..50 {
            logged = repo.recent_for_email("ana@example.com", 10).await.unwrap();
            if logged.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().any(|e| e.success));
        assert!(logged
            .iter()
            .any(|e| e.failure_reason.as_deref() == Some("invalid_credentials")));
    }
}

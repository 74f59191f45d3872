//! Metrics-tracking credential manager wrapper.
//!
//! [`Tracker`] transparently wraps any [`CredentialManager`] and records
//! attempts, failures, unauthorized denials and elapsed time for every
//! password retrieval. Results pass through unchanged.
//!
//! ```rust,ignore
//! let backend = select(default_candidates(&config)).await?;
//! let metrics = Arc::new(PasswordMetrics::register(MetricsRegistry::global())?);
//! let manager = Tracker::new(backend, metrics);
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{warn, Span};

use super::error::Result;
use super::types::{DbKey, SecretString};
use super::CredentialManager;
use crate::observability::PasswordMetrics;

/// Metrics decorator for [`CredentialManager`] implementations.
pub struct Tracker<M: CredentialManager> {
    inner: M,
    metrics: Arc<PasswordMetrics>,
}

impl<M: CredentialManager> Tracker<M> {
    pub fn new(inner: M, metrics: Arc<PasswordMetrics>) -> Self {
        Self { inner, metrics }
    }

    pub fn metrics(&self) -> &PasswordMetrics {
        &self.metrics
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: CredentialManager> CredentialManager for Tracker<M> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn password(&self, request_span: &Span, identity: &DbKey) -> Result<SecretString> {
        self.metrics.record_attempt();

        let start = Instant::now();
        let result = self.inner.password(request_span, identity).await;
        self.metrics.record_elapsed(start.elapsed());

        if let Err(ref e) = result {
            self.metrics.record_failure(e.is_not_authorized());
            warn!(
                parent: request_span,
                identity = ?identity,
                credential_manager = %self.inner.name(),
                error = %e,
                "Failed to retrieve password"
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credmgrs::CredentialError;
    use crate::observability::{MetricsRegistry, PasswordMetricsSnapshot};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Returns a fixed outcome keyed on the caller's IAM ARN.
    struct Scripted;

    #[async_trait]
    impl CredentialManager for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn password(&self, _span: &Span, identity: &DbKey) -> Result<SecretString> {
            match identity.iam_arn.as_str() {
                "allowed" => Ok(SecretString::new("pw1")),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(SecretString::new("pw1"))
                }
                "denied" => Err(CredentialError::NotAuthorized),
                _ => Err(CredentialError::not_found("approzium/db.example.com:5432")),
            }
        }
    }

    fn tracker() -> Tracker<Scripted> {
        let metrics = PasswordMetrics::register(&MetricsRegistry::new()).unwrap();
        Tracker::new(Scripted, Arc::new(metrics))
    }

    fn identity(arn: &str) -> DbKey {
        DbKey::new(arn, "db.example.com", "5432", "alice")
    }

    #[tokio::test]
    async fn test_success_counts_attempt_only() {
        let tracker = tracker();
        assert_eq!(tracker.name(), "scripted");

        let password = tracker.password(&Span::none(), &identity("allowed")).await.unwrap();
        assert_eq!(password.expose_secret(), "pw1");

        let snapshot = tracker.metrics().snapshot();
        assert_eq!((snapshot.attempts, snapshot.failures, snapshot.unauthorized), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_not_authorized_counts_failure_and_unauthorized() {
        let tracker = tracker();

        let err = tracker.password(&Span::none(), &identity("denied")).await.unwrap_err();
        assert!(err.is_not_authorized());

        let snapshot = tracker.metrics().snapshot();
        assert_eq!((snapshot.attempts, snapshot.failures, snapshot.unauthorized), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_other_failures_are_not_unauthorized() {
        let tracker = tracker();

        let err = tracker.password(&Span::none(), &identity("unknown")).await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));

        let snapshot = tracker.metrics().snapshot();
        assert_eq!((snapshot.attempts, snapshot.failures, snapshot.unauthorized), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_elapsed_time_is_accumulated() {
        let tracker = tracker();
        tracker.password(&Span::none(), &identity("slow")).await.unwrap();
        assert!(tracker.metrics().snapshot().request_milliseconds >= 20);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failures_are_logged_against_request_span() {
        let tracker = tracker();
        let id = identity("denied");
        let span = crate::password_request_span!(id);

        let _ = tracker.password(&span, &id).await;
        assert!(logs_contain("Failed to retrieve password"));
        assert!(logs_contain("not authorized"));
        assert!(logs_contain("password_request"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_lose_no_updates() {
        let tracker = Arc::new(tracker());

        let calls = (0..100).map(|i| {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let arn = if i % 2 == 0 { "allowed" } else { "denied" };
                tracker.password(&Span::none(), &identity(arn)).await.is_ok()
            })
        });

        let results = futures::future::join_all(calls).await;
        let successes = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(successes, 50);

        let snapshot = tracker.metrics().snapshot();
        assert_eq!(
            snapshot,
            PasswordMetricsSnapshot {
                attempts: 100,
                failures: 50,
                unauthorized: 50,
                request_milliseconds: snapshot.request_milliseconds,
            }
        );
    }
}

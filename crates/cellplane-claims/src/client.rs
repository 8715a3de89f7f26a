//! Deadline and retry wrapper around a [`ClaimStore`].
//!
//! Every outbound call runs under a per-attempt timeout; transient
//! failures (including timeouts) retry once; the whole operation is
//! bounded by a total deadline. A request never holds a lock across
//! these calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use cellplane_products::ProductDefinition;

use crate::claim::Claim;
use crate::store::{ApplyOutcome, ClaimStore, StoreError};

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default total deadline across attempts.
pub const DEFAULT_TOTAL_DEADLINE: Duration = Duration::from_secs(10);

/// Store facade the handlers use.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn ClaimStore>,
    attempt_timeout: Duration,
    total_deadline: Duration,
}

impl StoreClient {
    pub fn new(inner: Arc<dyn ClaimStore>) -> Self {
        Self::with_deadlines(inner, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_TOTAL_DEADLINE)
    }

    pub fn with_deadlines(
        inner: Arc<dyn ClaimStore>,
        attempt_timeout: Duration,
        total_deadline: Duration,
    ) -> Self {
        Self {
            inner,
            attempt_timeout,
            total_deadline,
        }
    }

    pub async fn get_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Claim>, StoreError> {
        self.run("get_claim", || {
            self.inner.get_claim(product, namespace, name)
        })
        .await
    }

    pub async fn apply_claim(
        &self,
        product: &ProductDefinition,
        claim: &Claim,
    ) -> Result<ApplyOutcome, StoreError> {
        self.run("apply_claim", || self.inner.apply_claim(product, claim))
            .await
    }

    pub async fn delete_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        self.run("delete_claim", || {
            self.inner.delete_claim(product, namespace, name)
        })
        .await
    }

    pub async fn connection_secret_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        self.run("connection_secret_exists", || {
            self.inner.connection_secret_exists(namespace, name)
        })
        .await
    }

    /// One retry on transient errors, per-attempt and total deadlines.
    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempt_timeout = self.attempt_timeout;
        let attempts = async {
            match timeout(attempt_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(StoreError::UpstreamTransient(e))) => {
                    warn!(%op, error = %e, "transient store error, retrying");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    warn!(%op, "store attempt timed out, retrying");
                }
            }
            match timeout(attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::UpstreamTransient(format!(
                    "{op} timed out after retry"
                ))),
            }
        };

        match timeout(self.total_deadline, attempts).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::UpstreamTransient(format!(
                "{op} exceeded total deadline"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::store::MemoryClaimStore;

    /// Store that fails transiently for the first `failures` calls.
    struct FlakyStore {
        calls: AtomicU32,
        failures: u32,
        terminal: bool,
    }

    impl FlakyStore {
        fn transient(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                terminal: false,
            }
        }

        fn terminal() -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures: u32::MAX,
                terminal: true,
            }
        }

        fn maybe_fail(&self) -> Result<(), StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.terminal {
                    Err(StoreError::Upstream("boom".to_string()))
                } else {
                    Err(StoreError::UpstreamTransient("blip".to_string()))
                }
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ClaimStore for FlakyStore {
        async fn get_claim(
            &self,
            _product: &ProductDefinition,
            _namespace: &str,
            _name: &str,
        ) -> Result<Option<Claim>, StoreError> {
            self.maybe_fail().map(|_| None)
        }

        async fn apply_claim(
            &self,
            _product: &ProductDefinition,
            _claim: &Claim,
        ) -> Result<ApplyOutcome, StoreError> {
            self.maybe_fail().map(|_| ApplyOutcome::Applied)
        }

        async fn delete_claim(
            &self,
            _product: &ProductDefinition,
            _namespace: &str,
            _name: &str,
        ) -> Result<bool, StoreError> {
            self.maybe_fail().map(|_| false)
        }

        async fn connection_secret_exists(
            &self,
            _namespace: &str,
            _name: &str,
        ) -> Result<bool, StoreError> {
            self.maybe_fail().map(|_| false)
        }
    }

    fn product() -> ProductDefinition {
        cellplane_products::builtin_products()
            .into_iter()
            .find(|p| p.name == "mysql")
            .unwrap()
    }

    #[tokio::test]
    async fn passes_through_success() {
        let client = StoreClient::new(Arc::new(MemoryClaimStore::new()));
        let result = client.get_claim(&product(), "default", "a").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn retries_once_on_transient_error() {
        let store = Arc::new(FlakyStore::transient(1));
        let client = StoreClient::new(store.clone());

        let result = client.get_claim(&product(), "default", "a").await;
        assert!(result.is_ok());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_second_transient_failure() {
        let store = Arc::new(FlakyStore::transient(2));
        let client = StoreClient::new(store.clone());

        let result = client.get_claim(&product(), "default", "a").await;
        assert!(matches!(result, Err(StoreError::UpstreamTransient(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn terminal_errors_do_not_retry() {
        let store = Arc::new(FlakyStore::terminal());
        let client = StoreClient::new(store.clone());

        let result = client.get_claim(&product(), "default", "a").await;
        assert!(matches!(result, Err(StoreError::Upstream(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    /// Store whose calls never complete.
    struct HangingStore;

    #[async_trait]
    impl ClaimStore for HangingStore {
        async fn get_claim(
            &self,
            _product: &ProductDefinition,
            _namespace: &str,
            _name: &str,
        ) -> Result<Option<Claim>, StoreError> {
            std::future::pending().await
        }

        async fn apply_claim(
            &self,
            _product: &ProductDefinition,
            _claim: &Claim,
        ) -> Result<ApplyOutcome, StoreError> {
            std::future::pending().await
        }

        async fn delete_claim(
            &self,
            _product: &ProductDefinition,
            _namespace: &str,
            _name: &str,
        ) -> Result<bool, StoreError> {
            std::future::pending().await
        }

        async fn connection_secret_exists(
            &self,
            _namespace: &str,
            _name: &str,
        ) -> Result<bool, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn attempt_timeouts_surface_as_transient() {
        let client = StoreClient::with_deadlines(
            Arc::new(HangingStore),
            Duration::from_millis(10),
            Duration::from_millis(100),
        );
        let result = client.get_claim(&product(), "default", "a").await;
        assert!(matches!(result, Err(StoreError::UpstreamTransient(_))));
    }
}

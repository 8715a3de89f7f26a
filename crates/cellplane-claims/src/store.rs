//! The sticky-store adapter.
//!
//! Handlers never talk to an orchestrator directly; they go through
//! [`ClaimStore`]. Apply semantics are server-side-apply style:
//! repeated applies with the same logical content converge, and the
//! orchestrator owns the fields the control plane writes.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use cellplane_products::ProductDefinition;

use crate::claim::Claim;

/// Result of applying a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The orchestrator accepted the claim.
    Applied,
    /// No orchestrator is reachable; the claim is only returned to the
    /// caller (return-only mode).
    StandaloneOnly,
}

/// Errors surfaced by claim-store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The orchestrator is reachable but the product's CRD is absent.
    #[error("{kind} CRD is not installed in the orchestrator")]
    DependencyMissing { kind: String },

    /// A retryable failure (network blip, timeout, conflict).
    #[error("transient orchestrator error: {0}")]
    UpstreamTransient(String),

    /// A non-retryable orchestrator failure.
    #[error("orchestrator error: {0}")]
    Upstream(String),
}

/// Abstract claim storage.
///
/// `connection_secret_exists` reports presence only; secret contents
/// never cross this interface.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn get_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Claim>, StoreError>;

    async fn apply_claim(
        &self,
        product: &ProductDefinition,
        claim: &Claim,
    ) -> Result<ApplyOutcome, StoreError>;

    /// Delete a claim. Returns whether it existed.
    async fn delete_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError>;

    async fn connection_secret_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError>;
}

// ── In-memory store ───────────────────────────────────────────────

#[derive(Default)]
struct MemoryInner {
    /// (kind, namespace, name) → claim.
    claims: HashMap<(String, String, String), Claim>,
    /// (namespace, secret name) pairs that exist.
    secrets: HashSet<(String, String)>,
}

/// In-memory claim store with server-side-apply semantics.
///
/// Used in tests and in single-process deployments where the
/// orchestrator integration runs elsewhere.
#[derive(Default)]
pub struct MemoryClaimStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a connection secret as present (simulates the orchestrator
    /// finishing provisioning).
    pub async fn put_secret(&self, namespace: &str, name: &str) {
        let mut inner = self.inner.write().await;
        inner
            .secrets
            .insert((namespace.to_string(), name.to_string()));
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn get_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Claim>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .claims
            .get(&(
                product.kind.clone(),
                namespace.to_string(),
                name.to_string(),
            ))
            .cloned())
    }

    async fn apply_claim(
        &self,
        product: &ProductDefinition,
        claim: &Claim,
    ) -> Result<ApplyOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let key = (
            product.kind.clone(),
            claim.metadata.namespace.clone(),
            claim.metadata.name.clone(),
        );
        debug!(kind = %product.kind, name = %claim.metadata.name, "claim applied");
        inner.claims.insert(key, claim.clone());
        Ok(ApplyOutcome::Applied)
    }

    async fn delete_claim(
        &self,
        product: &ProductDefinition,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .claims
            .remove(&(
                product.kind.clone(),
                namespace.to_string(),
                name.to_string(),
            ))
            .is_some())
    }

    async fn connection_secret_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .secrets
            .contains(&(namespace.to_string(), name.to_string())))
    }
}

// ── Standalone store ──────────────────────────────────────────────

/// Return-only store for running without an orchestrator.
///
/// Sticky lookups find nothing, applies report [`ApplyOutcome::StandaloneOnly`],
/// and deletes are no-ops. The API still returns the built Claim so it
/// can be applied out of band.
#[derive(Debug, Default)]
pub struct StandaloneStore;

impl StandaloneStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClaimStore for StandaloneStore {
    async fn get_claim(
        &self,
        _product: &ProductDefinition,
        _namespace: &str,
        _name: &str,
    ) -> Result<Option<Claim>, StoreError> {
        Ok(None)
    }

    async fn apply_claim(
        &self,
        _product: &ProductDefinition,
        _claim: &Claim,
    ) -> Result<ApplyOutcome, StoreError> {
        Ok(ApplyOutcome::StandaloneOnly)
    }

    async fn delete_claim(
        &self,
        _product: &ProductDefinition,
        _namespace: &str,
        _name: &str,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn connection_secret_exists(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::claim::{ClaimMetadata, ClaimSpec, CompositionSelector, SecretRef};

    fn product() -> ProductDefinition {
        cellplane_products::builtin_products()
            .into_iter()
            .find(|p| p.name == "mysql")
            .unwrap()
    }

    fn claim(name: &str) -> Claim {
        Claim {
            api_version: "db.platform.example.org/v1alpha1".to_string(),
            kind: "MySQLInstanceClaim".to_string(),
            metadata: ClaimMetadata {
                namespace: "default".to_string(),
                name: name.to_string(),
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
            },
            spec: ClaimSpec {
                parameters: BTreeMap::new(),
                composition_selector: CompositionSelector {
                    match_labels: BTreeMap::new(),
                },
                write_connection_secret_to_ref: SecretRef {
                    name: format!("{name}-conn"),
                },
            },
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips_claims() {
        let store = MemoryClaimStore::new();
        let p = product();

        assert!(store.get_claim(&p, "default", "a").await.unwrap().is_none());

        let outcome = store.apply_claim(&p, &claim("a")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);

        let fetched = store.get_claim(&p, "default", "a").await.unwrap().unwrap();
        assert_eq!(fetched.metadata.name, "a");
    }

    #[tokio::test]
    async fn memory_store_apply_is_idempotent() {
        let store = MemoryClaimStore::new();
        let p = product();
        store.apply_claim(&p, &claim("a")).await.unwrap();
        store.apply_claim(&p, &claim("a")).await.unwrap();
        let fetched = store.get_claim(&p, "default", "a").await.unwrap().unwrap();
        assert_eq!(fetched, claim("a"));
    }

    #[tokio::test]
    async fn memory_store_delete() {
        let store = MemoryClaimStore::new();
        let p = product();
        store.apply_claim(&p, &claim("a")).await.unwrap();

        assert!(store.delete_claim(&p, "default", "a").await.unwrap());
        assert!(!store.delete_claim(&p, "default", "a").await.unwrap());
        assert!(store.get_claim(&p, "default", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_secrets_report_presence_only() {
        let store = MemoryClaimStore::new();
        assert!(!store
            .connection_secret_exists("default", "a-conn")
            .await
            .unwrap());
        store.put_secret("default", "a-conn").await;
        assert!(store
            .connection_secret_exists("default", "a-conn")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn standalone_store_is_return_only() {
        let store = StandaloneStore::new();
        let p = product();

        assert!(store.get_claim(&p, "default", "a").await.unwrap().is_none());
        assert_eq!(
            store.apply_claim(&p, &claim("a")).await.unwrap(),
            ApplyOutcome::StandaloneOnly
        );
        assert!(!store.delete_claim(&p, "default", "a").await.unwrap());
        assert!(!store
            .connection_secret_exists("default", "a-conn")
            .await
            .unwrap());
    }
}

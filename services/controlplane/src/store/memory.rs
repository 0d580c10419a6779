//! In-memory implementation of the policy store.
//!
//! # Purpose
//! Implements [`PolicyStore`] with `Vec`s guarded by `tokio::sync::RwLock`. It
//! exists for:
//! - local development and tests (no external dependencies)
//! - single-instance deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all policies and bindings are lost on restart; the
//!   predefined groups are re-seeded at startup.
//! - **Single-process consistency**: writes take the write lock, reloads take
//!   the read lock, so a reload sees either all of a write or none of it.
//! - **No multi-node coordination**: every instance has its own state. Use the
//!   Postgres store when several control-plane instances share policies.
use super::{PolicyStore, StoreResult};
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory policy store.
///
/// Cloning shares the underlying state, so a clone handed to the engine and
/// one kept by an admin handler observe the same records.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// Policy tuples in insertion order.
    policies: Arc<RwLock<Vec<PolicyRule>>>,
    /// User-to-group bindings in insertion order.
    bindings: Arc<RwLock<Vec<GroupingRule>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for InMemoryStore {
    async fn load_policies(&self) -> StoreResult<Vec<PolicyRule>> {
        Ok(self.policies.read().await.clone())
    }

    async fn load_bindings(&self) -> StoreResult<Vec<GroupingRule>> {
        Ok(self.bindings.read().await.clone())
    }

    async fn add_policy(&self, policy: PolicyRule) -> StoreResult<bool> {
        let mut policies = self.policies.write().await;
        if policies.contains(&policy) {
            return Ok(false);
        }
        policies.push(policy);
        metrics::gauge!("vulpes_rbac_policies_total").set(policies.len() as f64);
        Ok(true)
    }

    async fn remove_policy(&self, policy: &PolicyRule) -> StoreResult<bool> {
        let mut policies = self.policies.write().await;
        let before = policies.len();
        policies.retain(|item| item != policy);
        metrics::gauge!("vulpes_rbac_policies_total").set(policies.len() as f64);
        Ok(policies.len() != before)
    }

    async fn add_binding(&self, binding: GroupingRule) -> StoreResult<bool> {
        let mut bindings = self.bindings.write().await;
        if bindings.contains(&binding) {
            return Ok(false);
        }
        bindings.push(binding);
        Ok(true)
    }

    async fn remove_binding(&self, binding: &GroupingRule) -> StoreResult<bool> {
        let mut bindings = self.bindings.write().await;
        let before = bindings.len();
        bindings.retain(|item| item != binding);
        Ok(bindings.len() != before)
    }

    async fn seed_policies(&self, seed: Vec<PolicyRule>) -> StoreResult<()> {
        // One write guard for the whole batch keeps the seed atomic for readers.
        let mut policies = self.policies.write().await;
        for policy in seed {
            if !policies.contains(&policy) {
                policies.push(policy);
            }
        }
        metrics::gauge!("vulpes_rbac_policies_total").set(policies.len() as f64);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(subject: &str, sid: &str, operation: &str) -> PolicyRule {
        PolicyRule {
            subject: subject.to_string(),
            object: "clusters".to_string(),
            sid: sid.to_string(),
            operation: operation.to_string(),
        }
    }

    #[tokio::test]
    async fn add_policy_is_idempotent() {
        let store = InMemoryStore::new();
        assert!(store.add_policy(rule("foo", "1", "read")).await.expect("add"));
        assert!(!store.add_policy(rule("foo", "1", "read")).await.expect("add"));
        assert_eq!(store.load_policies().await.expect("load").len(), 1);
    }

    #[tokio::test]
    async fn remove_missing_policy_is_noop() {
        let store = InMemoryStore::new();
        store.add_policy(rule("foo", "1", "read")).await.expect("add");
        assert!(
            !store
                .remove_policy(&rule("foo", "2", "read"))
                .await
                .expect("remove")
        );
        assert!(
            store
                .remove_policy(&rule("foo", "1", "read"))
                .await
                .expect("remove")
        );
        assert!(store.load_policies().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn binding_add_twice_matches_add_once() {
        let once = InMemoryStore::new();
        once.add_binding(GroupingRule::new("foo", "readonly"))
            .await
            .expect("add");

        let twice = InMemoryStore::new();
        twice
            .add_binding(GroupingRule::new("foo", "readonly"))
            .await
            .expect("add");
        let inserted = twice
            .add_binding(GroupingRule::new("foo", "readonly"))
            .await
            .expect("add");
        assert!(!inserted);

        assert_eq!(
            once.load_bindings().await.expect("load"),
            twice.load_bindings().await.expect("load")
        );
    }

    #[tokio::test]
    async fn remove_missing_binding_is_noop() {
        let store = InMemoryStore::new();
        let removed = store
            .remove_binding(&GroupingRule::new("foo", "root"))
            .await
            .expect("remove");
        assert!(!removed);
    }

    #[tokio::test]
    async fn resolve_groups_for_user_filters_by_user() {
        let store = InMemoryStore::new();
        store
            .add_binding(GroupingRule::new("foo", "readonly"))
            .await
            .expect("add");
        store
            .add_binding(GroupingRule::new("foo", "root"))
            .await
            .expect("add");
        store
            .add_binding(GroupingRule::new("bar", "readwrite"))
            .await
            .expect("add");

        let groups = store.resolve_groups_for_user("foo").await.expect("groups");
        assert_eq!(
            groups.into_iter().collect::<Vec<_>>(),
            vec!["readonly".to_string(), "root".to_string()]
        );
        assert!(
            store
                .resolve_groups_for_user("nobody")
                .await
                .expect("groups")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn list_bindings_filters() {
        let store = InMemoryStore::new();
        store
            .add_binding(GroupingRule::new("foo", "readonly"))
            .await
            .expect("add");
        store
            .add_binding(GroupingRule::new("bar", "readonly"))
            .await
            .expect("add");
        store
            .add_binding(GroupingRule::new("bar", "root"))
            .await
            .expect("add");

        assert_eq!(store.list_bindings(None, None).await.expect("list").len(), 3);
        assert_eq!(
            store
                .list_bindings(Some("bar"), None)
                .await
                .expect("list")
                .len(),
            2
        );
        assert_eq!(
            store
                .list_bindings(None, Some("readonly"))
                .await
                .expect("list")
                .len(),
            2
        );
        assert_eq!(
            store
                .list_bindings(Some("bar"), Some("root"))
                .await
                .expect("list"),
            vec![GroupingRule::new("bar", "root")]
        );
    }

    #[tokio::test]
    async fn seed_skips_existing_rules() {
        let store = InMemoryStore::new();
        store.add_policy(rule("root", "*", "*")).await.expect("add");
        store
            .seed_policies(vec![rule("root", "*", "*"), rule("readonly", "*", "read")])
            .await
            .expect("seed");
        store
            .seed_policies(vec![rule("readonly", "*", "read")])
            .await
            .expect("seed");
        assert_eq!(store.load_policies().await.expect("load").len(), 2);
        assert!(!store.is_durable());
        assert_eq!(store.backend_name(), "memory");
        store.health_check().await.expect("healthy");
    }
}

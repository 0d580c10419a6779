//! RBAC enforcement engine.
//!
//! # Purpose and responsibility
//! Answers `(subject, object, sid, operation)` authorization requests and
//! resolves list scopes, always against freshly reloaded store state.
//!
//! # Where it fits
//! The HTTP authorization middleware calls [`RbacEngine::enforce`] for
//! single-resource and mutating requests and
//! [`RbacEngine::resolve_list_scope`] for list requests. Admin handlers mutate
//! the store directly; the next evaluation observes their writes.
//!
//! # Key invariants and assumptions
//! - Every evaluation starts with [`RbacEngine::reload`]; there is no cached
//!   snapshot to go stale.
//! - A reload failure or timeout is an error, never a decision.
//! - The model is allow-only; no tuple means deny.
//!
//! # Security considerations
//! - Callers must treat `Err` as deny and report it.
//! - Scope-id and object patterns are unanchored regexes (see
//!   [`vulpes_authz::key_match`]).
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use crate::store::{PolicyStore, StoreError};
use casbin::{CoreApi, Enforcer, MemoryAdapter, MgmtApi};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use vulpes_authz::{
    GroupPolicy, IdRange, ObjectType, PolicyEntry, UserPolicy, casbin_model, key_match,
    register_matcher, resolve_id_range,
};

#[derive(Debug, Error)]
pub enum RbacError {
    #[error("policy store error: {0}")]
    Store(#[from] StoreError),
    #[error("policy engine error: {0}")]
    Casbin(#[from] casbin::Error),
    #[error("policy reload timed out after {0:?}")]
    ReloadTimeout(Duration),
}

pub type RbacResult<T> = Result<T, RbacError>;

/// Point-in-time copy of every policy and binding in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    pub policies: Vec<PolicyRule>,
    pub bindings: Vec<GroupingRule>,
}

impl PolicySnapshot {
    /// Groups `user` is bound to in this snapshot.
    pub fn groups_for(&self, user: &str) -> BTreeSet<String> {
        self.bindings
            .iter()
            .filter(|binding| binding.user == user)
            .map(|binding| binding.group.clone())
            .collect()
    }

    /// Narrow the snapshot to the bindings of `subject` itself.
    ///
    /// Group membership is one level deep: a group bound to another group
    /// does not pass the outer group's grants on to its members.
    pub fn for_subject(&self, subject: &str) -> PolicySnapshot {
        PolicySnapshot {
            policies: self.policies.clone(),
            bindings: self
                .bindings
                .iter()
                .filter(|binding| binding.user == subject)
                .cloned()
                .collect(),
        }
    }

    /// Policies granted to `subject` directly or through its groups whose
    /// object pattern matches `object`.
    pub fn policies_for(&self, subject: &str, object: &str) -> Vec<PolicyEntry> {
        let groups = self.groups_for(subject);
        self.policies
            .iter()
            .filter(|rule| key_match(object, &rule.object))
            .filter_map(|rule| {
                let object = rule.object.parse::<ObjectType>().ok()?;
                if rule.subject == subject {
                    Some(PolicyEntry::User(UserPolicy::new(
                        rule.subject.clone(),
                        object,
                        rule.sid.clone(),
                        &rule.operation,
                    )))
                } else if groups.contains(&rule.subject) {
                    Some(PolicyEntry::Group(GroupPolicy::new(
                        rule.subject.clone(),
                        object,
                        rule.sid.clone(),
                        &rule.operation,
                    )))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Build an in-memory casbin enforcer from a snapshot.
///
/// # What it does
/// Loads the embedded model, registers the custom key matcher, inserts every
/// policy and binding, and compiles role links.
///
/// # Errors
/// - Returns casbin errors for an invalid model or insertion failures.
pub async fn build_enforcer(snapshot: &PolicySnapshot) -> casbin::Result<Enforcer> {
    // Step 1: Load the embedded model.
    let model = casbin_model().await?;
    // Step 2: Use an in-memory adapter; the store is the source of truth.
    let adapter = MemoryAdapter::default();
    let mut enforcer = Enforcer::new(model, adapter).await?;
    // Step 3: The model's matcher calls our key matcher by name.
    register_matcher(&mut enforcer);

    for policy in &snapshot.policies {
        enforcer.add_policy(policy.to_raw()).await?;
    }
    for binding in &snapshot.bindings {
        enforcer.add_grouping_policy(binding.to_raw()).await?;
    }

    // Step 4: Build role links after all rules are loaded.
    enforcer.build_role_links()?;
    Ok(enforcer)
}

#[derive(Debug, Clone)]
pub struct RbacConfig {
    pub reload_timeout: Duration,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            reload_timeout: Duration::from_millis(crate::config::DEFAULT_RELOAD_TIMEOUT_MS),
        }
    }
}

/// Enforcement engine bound to one policy store.
#[derive(Clone)]
pub struct RbacEngine {
    store: Arc<dyn PolicyStore>,
    config: RbacConfig,
}

impl RbacEngine {
    pub fn new(store: Arc<dyn PolicyStore>, config: RbacConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Load every policy and binding from the store.
    ///
    /// Bounded by the configured reload timeout; dropping the returned future
    /// abandons the reload.
    pub async fn reload(&self) -> RbacResult<PolicySnapshot> {
        let started = Instant::now();
        let load = async {
            tokio::try_join!(self.store.load_policies(), self.store.load_bindings())
        };
        let result = tokio::time::timeout(self.config.reload_timeout, load).await;
        metrics::histogram!("vulpes_authz_reload_seconds").record(started.elapsed().as_secs_f64());
        match result {
            Ok(Ok((policies, bindings))) => Ok(PolicySnapshot { policies, bindings }),
            Ok(Err(err)) => {
                metrics::counter!("vulpes_authz_reload_failures_total").increment(1);
                tracing::error!(error = %err, backend = self.store.backend_name(), "policy reload failed");
                Err(err.into())
            }
            Err(_) => {
                metrics::counter!("vulpes_authz_reload_failures_total").increment(1);
                tracing::error!(
                    timeout_ms = self.config.reload_timeout.as_millis() as u64,
                    "policy reload timed out"
                );
                Err(RbacError::ReloadTimeout(self.config.reload_timeout))
            }
        }
    }

    /// Decide whether `subject` may perform `operation` on `object`/`sid`.
    pub async fn enforce(
        &self,
        subject: &str,
        object: &str,
        sid: &str,
        operation: &str,
    ) -> RbacResult<bool> {
        let snapshot = self.reload().await?;
        let allowed = enforce_snapshot(&snapshot, subject, object, sid, operation).await?;
        let decision = if allowed { "allow" } else { "deny" };
        metrics::counter!("vulpes_authz_decisions_total", "decision" => decision).increment(1);
        tracing::debug!(subject, object, sid, operation, decision, "rbac decision");
        Ok(allowed)
    }

    /// Rows of `object` that `subject` may list.
    pub async fn resolve_list_scope(&self, subject: &str, object: &str) -> RbacResult<IdRange> {
        let snapshot = self.reload().await?;
        let range = resolve_id_range(&snapshot.policies_for(subject, object));
        tracing::debug!(subject, object, unrestricted = range.is_unrestricted(), "list scope resolved");
        Ok(range)
    }
}

/// Evaluate one request against a snapshot without touching the store.
///
/// Only the subject's own bindings reach casbin, so its role manager cannot
/// follow group-to-group chains that [`PolicySnapshot::policies_for`] ignores.
pub async fn enforce_snapshot(
    snapshot: &PolicySnapshot,
    subject: &str,
    object: &str,
    sid: &str,
    operation: &str,
) -> RbacResult<bool> {
    let enforcer = build_enforcer(&snapshot.for_subject(subject)).await?;
    Ok(enforcer.enforce((subject, object, sid, operation))?)
}

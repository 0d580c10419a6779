//! Backing stores for RBAC policies and group bindings.
//!
//! # Purpose
//! Defines the [`PolicyStore`] contract the enforcement engine reloads from on
//! every evaluation, plus the in-memory and Postgres implementations.
//!
//! # Key invariants
//! - All methods are safe to call concurrently.
//! - Inserts are idempotent; removing a missing record is a no-op.
//! - A reload never observes a half-applied write.
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load_policies(&self) -> StoreResult<Vec<PolicyRule>>;
    async fn load_bindings(&self) -> StoreResult<Vec<GroupingRule>>;

    /// Returns `true` when the rule was not present before.
    async fn add_policy(&self, policy: PolicyRule) -> StoreResult<bool>;
    /// Returns `true` when a rule was removed.
    async fn remove_policy(&self, policy: &PolicyRule) -> StoreResult<bool>;

    /// Returns `true` when the binding was not present before.
    async fn add_binding(&self, binding: GroupingRule) -> StoreResult<bool>;
    /// Returns `true` when a binding was removed.
    async fn remove_binding(&self, binding: &GroupingRule) -> StoreResult<bool>;

    /// Insert every policy that is missing, atomically.
    async fn seed_policies(&self, policies: Vec<PolicyRule>) -> StoreResult<()>;

    async fn resolve_groups_for_user(&self, user: &str) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .load_bindings()
            .await?
            .into_iter()
            .filter(|binding| binding.user == user)
            .map(|binding| binding.group)
            .collect())
    }

    async fn list_bindings(
        &self,
        user: Option<&str>,
        group: Option<&str>,
    ) -> StoreResult<Vec<GroupingRule>> {
        Ok(self
            .load_bindings()
            .await?
            .into_iter()
            .filter(|binding| user.is_none_or(|user| binding.user == user))
            .filter(|binding| group.is_none_or(|group| binding.group == group))
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

//! Postgres-backed implementation of the policy store.
//!
//! # What this module is
//! The durable, shared [`PolicyStore`] used when several control-plane
//! instances must agree on one set of policies and bindings. Every instance
//! reloads from these tables before each authorization decision, so a
//! revocation committed by one instance is seen by the next request on any
//! other.
//!
//! # Key invariants
//! - `rbac_policies` and `rbac_bindings` carry composite primary keys over
//!   every column of the tuple; inserts use `ON CONFLICT DO NOTHING`, which
//!   makes them idempotent.
//! - Bootstrap seeding runs in one transaction so readers never see a
//!   partially installed set of predefined groups.
//!
//! # Security notes
//! - Database URLs may contain credentials; they are never logged.
//! - No dynamic SQL; every statement is a fixed string with bound parameters.
//!
//! # Operational notes
//! - Migrations run at connect time via `sqlx::migrate!("./migrations")`.
//! - Pool timeouts are explicit so a dead database fails the reload (and the
//!   request, closed) instead of hanging it.
use super::{PolicyStore, StoreResult};
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Durable policy store backed by Postgres.
///
/// # Errors
/// - Connection, migration and query failures surface as
///   [`super::StoreError`].
///
/// # Example
/// ```rust,no_run
/// use controlplane::config::PostgresConfig;
/// use controlplane::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbPolicy {
    subject: String,
    object_type: String,
    sid: String,
    operation: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbBinding {
    user_name: String,
    group_name: String,
}

impl From<DbPolicy> for PolicyRule {
    fn from(row: DbPolicy) -> Self {
        PolicyRule {
            subject: row.subject,
            object: row.object_type,
            sid: row.sid,
            operation: row.operation,
        }
    }
}

impl From<DbBinding> for GroupingRule {
    fn from(row: DbBinding) -> Self {
        GroupingRule {
            user: row.user_name,
            group: row.group_name,
        }
    }
}

impl PostgresStore {
    /// Connect, run migrations and return a ready store.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            max_connections = config.max_connections,
            "postgres policy store ready"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's responsibility.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyStore for PostgresStore {
    async fn load_policies(&self) -> StoreResult<Vec<PolicyRule>> {
        let rows: Vec<DbPolicy> = sqlx::query_as(
            "SELECT subject, object_type, sid, operation FROM rbac_policies \
             ORDER BY created_at, subject",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PolicyRule::from).collect())
    }

    async fn load_bindings(&self) -> StoreResult<Vec<GroupingRule>> {
        let rows: Vec<DbBinding> = sqlx::query_as(
            "SELECT user_name, group_name FROM rbac_bindings ORDER BY created_at, user_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GroupingRule::from).collect())
    }

    async fn add_policy(&self, policy: PolicyRule) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO rbac_policies (subject, object_type, sid, operation) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&policy.subject)
        .bind(&policy.object)
        .bind(&policy.sid)
        .bind(&policy.operation)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_policy(&self, policy: &PolicyRule) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM rbac_policies \
             WHERE subject = $1 AND object_type = $2 AND sid = $3 AND operation = $4",
        )
        .bind(&policy.subject)
        .bind(&policy.object)
        .bind(&policy.sid)
        .bind(&policy.operation)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_binding(&self, binding: GroupingRule) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO rbac_bindings (user_name, group_name) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&binding.user)
        .bind(&binding.group)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_binding(&self, binding: &GroupingRule) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM rbac_bindings WHERE user_name = $1 AND group_name = $2")
                .bind(&binding.user)
                .bind(&binding.group)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn seed_policies(&self, policies: Vec<PolicyRule>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for policy in policies {
            sqlx::query(
                "INSERT INTO rbac_policies (subject, object_type, sid, operation) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(&policy.subject)
            .bind(&policy.object)
            .bind(&policy.sid)
            .bind(&policy.operation)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn resolve_groups_for_user(&self, user: &str) -> StoreResult<BTreeSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT group_name FROM rbac_bindings WHERE user_name = $1")
                .bind(user)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(group,)| group).collect())
    }

    async fn list_bindings(
        &self,
        user: Option<&str>,
        group: Option<&str>,
    ) -> StoreResult<Vec<GroupingRule>> {
        let rows: Vec<DbBinding> = sqlx::query_as(
            "SELECT user_name, group_name FROM rbac_bindings \
             WHERE ($1::TEXT IS NULL OR user_name = $1) \
               AND ($2::TEXT IS NULL OR group_name = $2) \
             ORDER BY created_at, user_name",
        )
        .bind(user)
        .bind(group)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GroupingRule::from).collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn db_rows_convert_to_rules() {
        let policy = PolicyRule::from(DbPolicy {
            subject: "foo".to_string(),
            object_type: "clusters".to_string(),
            sid: "3".to_string(),
            operation: "read".to_string(),
        });
        assert_eq!(policy.object, "clusters");
        let binding = GroupingRule::from(DbBinding {
            user_name: "foo".to_string(),
            group_name: "root".to_string(),
        });
        assert_eq!(binding, GroupingRule::new("foo", "root"));
    }
}

//! Predefined groups and role assignment.
//!
//! # Purpose
//! Installs the four predefined group policies at startup and maps account
//! roles onto group bindings.
//!
//! # Key invariants
//! - Installing predefined policies is idempotent; restarts never duplicate
//!   tuples.
//! - A user holds at most one predefined group at a time through
//!   [`assign_role`]; custom groups are left untouched.
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use crate::store::{PolicyStore, StoreResult};
use serde::{Deserialize, Serialize};
use vulpes_authz::{
    ADMIN_GROUP, READ_ONLY_GROUP, READ_WRITE_GROUP, READ_WRITE_UPDATE_GROUP,
    predefined_group_policies,
};

pub const PREDEFINED_GROUPS: [&str; 4] = [
    ADMIN_GROUP,
    READ_ONLY_GROUP,
    READ_WRITE_GROUP,
    READ_WRITE_UPDATE_GROUP,
];

/// Seed the predefined group policies into `store`.
pub async fn install_predefined_policies(store: &dyn PolicyStore) -> StoreResult<()> {
    let seed: Vec<PolicyRule> = predefined_group_policies()
        .into_iter()
        .map(PolicyRule::from)
        .collect();
    let count = seed.len();
    store.seed_policies(seed).await?;
    tracing::info!(
        count,
        backend = store.backend_name(),
        "predefined group policies installed"
    );
    Ok(())
}

/// Account role as stored by the user service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Reader,
    #[serde(alias = "readwrite")]
    ReadWrite,
    #[serde(alias = "readwriteupdate")]
    ReadWriteUpdate,
    Admin,
    Root,
}

impl UserRole {
    pub fn group(self) -> &'static str {
        group_for_role(self)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reader" => Ok(UserRole::Reader),
            "read_write" | "readwrite" => Ok(UserRole::ReadWrite),
            "read_write_update" | "readwriteupdate" => Ok(UserRole::ReadWriteUpdate),
            "admin" => Ok(UserRole::Admin),
            "root" => Ok(UserRole::Root),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Predefined group a role is bound to.
pub fn group_for_role(role: UserRole) -> &'static str {
    match role {
        UserRole::Reader => READ_ONLY_GROUP,
        UserRole::ReadWrite => READ_WRITE_GROUP,
        UserRole::ReadWriteUpdate => READ_WRITE_UPDATE_GROUP,
        UserRole::Admin | UserRole::Root => ADMIN_GROUP,
    }
}

/// Bind `user` to the group for `role`, dropping other predefined groups.
///
/// Returns the group the user ends up in.
pub async fn assign_role(
    store: &dyn PolicyStore,
    user: &str,
    role: UserRole,
) -> StoreResult<&'static str> {
    let target = group_for_role(role);
    // Add first so the user is never left without the new grant.
    store.add_binding(GroupingRule::new(user, target)).await?;
    for group in PREDEFINED_GROUPS.iter().filter(|group| **group != target) {
        store
            .remove_binding(&GroupingRule::new(user, *group))
            .await?;
    }
    tracing::info!(user, group = target, "role assigned");
    Ok(target)
}

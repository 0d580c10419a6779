//! Policy tuples, group bindings and the predefined groups.
//!
//! # Purpose
//! Defines the fixed four-column policy schema `(subject, object, sid,
//! operation)` and the two-column binding schema `(user, group)` that the
//! casbin model evaluates.
//!
//! # How it fits
//! Stores persist these shapes, the enforcer loads them into casbin via
//! [`RawPolicy::raw`], and the list-scope resolver walks them.
//!
//! # Key invariants
//! - `raw()` is always ordered `[subject, object, sid, operation]` for
//!   policies and `[user, group]` for bindings.
//! - Construction never fails; enumerations are validated at the boundary.
//!
//! # Examples
//! ```rust
//! use vulpes_authz::{ObjectType, Operation, RawPolicy, UserPolicy};
//!
//! let policy = UserPolicy::new("foo", ObjectType::Clusters, "*", Operation::Read);
//! assert_eq!(policy.raw(), ["foo", "clusters", "*", "read"]);
//! ```
//!
//! # Common pitfalls
//! - Passing a hand-written operation regex instead of
//!   [`build_operation_set`] loses the word-boundary anchors.
use crate::object::{ObjectType, SID_ALL};
use crate::operation::{Operation, build_operation_set};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const ADMIN_GROUP: &str = "root";
pub const READ_ONLY_GROUP: &str = "readonly";
pub const READ_WRITE_GROUP: &str = "readwrite";
pub const READ_WRITE_UPDATE_GROUP: &str = "readwriteupdate";

/// Ordered flat representation consumed by the policy engine.
pub trait RawPolicy {
    fn raw(&self) -> &[String];
}

/// Policy granted directly to a user.
///
/// # Example
/// ```rust
/// use vulpes_authz::{ObjectType, Operation, UserPolicy};
///
/// let policy = UserPolicy::new("foo", ObjectType::Clusters, "7", Operation::Update);
/// assert_eq!(policy.user_name(), "foo");
/// assert_eq!(policy.sid(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPolicy([String; 4]);

impl UserPolicy {
    pub fn new(
        user_name: impl Into<String>,
        object: ObjectType,
        sid: impl Into<String>,
        operation: impl AsRef<str>,
    ) -> Self {
        Self([
            user_name.into(),
            object.as_str().to_string(),
            sid.into(),
            operation.as_ref().to_string(),
        ])
    }

    pub fn user_name(&self) -> &str {
        &self.0[0]
    }

    pub fn object_type(&self) -> &str {
        &self.0[1]
    }

    pub fn sid(&self) -> &str {
        &self.0[2]
    }

    pub fn operation(&self) -> &str {
        &self.0[3]
    }
}

impl RawPolicy for UserPolicy {
    fn raw(&self) -> &[String] {
        &self.0
    }
}

/// Policy granted to every member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupPolicy([String; 4]);

impl GroupPolicy {
    pub fn new(
        group_name: impl Into<String>,
        object: ObjectType,
        sid: impl Into<String>,
        operation: impl AsRef<str>,
    ) -> Self {
        Self([
            group_name.into(),
            object.as_str().to_string(),
            sid.into(),
            operation.as_ref().to_string(),
        ])
    }

    pub fn group_name(&self) -> &str {
        &self.0[0]
    }

    pub fn object_type(&self) -> &str {
        &self.0[1]
    }

    pub fn sid(&self) -> &str {
        &self.0[2]
    }

    pub fn operation(&self) -> &str {
        &self.0[3]
    }
}

impl RawPolicy for GroupPolicy {
    fn raw(&self) -> &[String] {
        &self.0
    }
}

/// Membership of a user in a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupBinding([String; 2]);

impl GroupBinding {
    pub fn new(user_name: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self([user_name.into(), group_name.into()])
    }

    pub fn user_name(&self) -> &str {
        &self.0[0]
    }

    pub fn group_name(&self) -> &str {
        &self.0[1]
    }
}

impl RawPolicy for GroupBinding {
    fn raw(&self) -> &[String] {
        &self.0
    }
}

/// Any record the policy engine stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyEntry {
    User(UserPolicy),
    Group(GroupPolicy),
    Binding(GroupBinding),
}

impl RawPolicy for PolicyEntry {
    fn raw(&self) -> &[String] {
        match self {
            PolicyEntry::User(policy) => policy.raw(),
            PolicyEntry::Group(policy) => policy.raw(),
            PolicyEntry::Binding(binding) => binding.raw(),
        }
    }
}

impl From<UserPolicy> for PolicyEntry {
    fn from(policy: UserPolicy) -> Self {
        PolicyEntry::User(policy)
    }
}

impl From<GroupPolicy> for PolicyEntry {
    fn from(policy: GroupPolicy) -> Self {
        PolicyEntry::Group(policy)
    }
}

impl From<GroupBinding> for PolicyEntry {
    fn from(binding: GroupBinding) -> Self {
        PolicyEntry::Binding(binding)
    }
}

pub static ADMIN_POLICY: LazyLock<GroupPolicy> =
    LazyLock::new(|| GroupPolicy::new(ADMIN_GROUP, ObjectType::All, SID_ALL, Operation::All));

pub static READ_ONLY_POLICY: LazyLock<GroupPolicy> = LazyLock::new(|| {
    GroupPolicy::new(
        READ_ONLY_GROUP,
        ObjectType::All,
        SID_ALL,
        build_operation_set(&[Operation::Read]),
    )
});

pub static READ_WRITE_POLICY: LazyLock<GroupPolicy> = LazyLock::new(|| {
    GroupPolicy::new(
        READ_WRITE_GROUP,
        ObjectType::All,
        SID_ALL,
        build_operation_set(&[Operation::Read, Operation::Create]),
    )
});

pub static READ_WRITE_UPDATE_POLICY: LazyLock<GroupPolicy> = LazyLock::new(|| {
    GroupPolicy::new(
        READ_WRITE_UPDATE_GROUP,
        ObjectType::All,
        SID_ALL,
        build_operation_set(&[Operation::Read, Operation::Create, Operation::Update]),
    )
});

/// Group policies installed at bootstrap, in installation order.
pub fn predefined_group_policies() -> Vec<GroupPolicy> {
    vec![
        ADMIN_POLICY.clone(),
        READ_ONLY_POLICY.clone(),
        READ_WRITE_POLICY.clone(),
        READ_WRITE_UPDATE_POLICY.clone(),
    ]
}

/// True when `policy` is exactly the super-admin group policy.
///
/// Used for display and audit only; enforcement never consults it.
pub fn is_admin_policy(policy: &PolicyEntry) -> bool {
    match policy {
        PolicyEntry::Group(group) => group.raw() == ADMIN_POLICY.raw(),
        _ => false,
    }
}

/// True when any binding places its user in the admin group.
pub fn binding_to_admin(bindings: &[GroupBinding]) -> bool {
    bindings
        .iter()
        .any(|binding| binding.group_name() == ADMIN_GROUP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_preserves_field_order() {
        let user = UserPolicy::new("foo", ObjectType::Clusters, "12", Operation::Read);
        assert_eq!(user.raw(), ["foo", "clusters", "12", "read"]);
        assert_eq!(user.user_name(), "foo");
        assert_eq!(user.object_type(), "clusters");
        assert_eq!(user.sid(), "12");
        assert_eq!(user.operation(), "read");

        let group = GroupPolicy::new("ops", ObjectType::Users, "*", Operation::Delete);
        assert_eq!(group.raw(), ["ops", "users", "*", "delete"]);
        assert_eq!(group.group_name(), "ops");

        let binding = GroupBinding::new("foo", "ops");
        assert_eq!(binding.raw(), ["foo", "ops"]);
        assert_eq!(binding.user_name(), "foo");
        assert_eq!(binding.group_name(), "ops");
    }

    #[test]
    fn policies_accept_operation_sets() {
        let set = build_operation_set(&[Operation::Read, Operation::Delete]);
        let policy = UserPolicy::new("foo", ObjectType::Clusters, "*", &set);
        assert_eq!(policy.operation(), r"\b(read|delete)\b");
    }

    #[test]
    fn predefined_groups_are_wildcard_scoped() {
        let policies = predefined_group_policies();
        assert_eq!(policies.len(), 4);
        for policy in &policies {
            assert_eq!(policy.object_type(), "*");
            assert_eq!(policy.sid(), "*");
        }
        assert_eq!(ADMIN_POLICY.operation(), "*");
        assert_eq!(READ_ONLY_POLICY.operation(), r"\b(read)\b");
        assert_eq!(READ_WRITE_POLICY.operation(), r"\b(read|create)\b");
        assert_eq!(
            READ_WRITE_UPDATE_POLICY.operation(),
            r"\b(read|create|update)\b"
        );
    }

    #[test]
    fn admin_policy_detection_is_structural() {
        assert!(is_admin_policy(&PolicyEntry::Group(GroupPolicy::new(
            ADMIN_GROUP,
            ObjectType::All,
            "*",
            Operation::All,
        ))));
        // Same fields as a user policy never count as the admin group policy.
        assert!(!is_admin_policy(&PolicyEntry::User(UserPolicy::new(
            ADMIN_GROUP,
            ObjectType::All,
            "*",
            Operation::All,
        ))));
        assert!(!is_admin_policy(&PolicyEntry::Group(
            READ_WRITE_POLICY.clone()
        )));
        assert!(!is_admin_policy(&PolicyEntry::Binding(GroupBinding::new(
            "foo",
            ADMIN_GROUP
        ))));
    }

    #[test]
    fn binding_to_admin_scans_all_bindings() {
        let bindings = vec![
            GroupBinding::new("foo", READ_ONLY_GROUP),
            GroupBinding::new("foo", ADMIN_GROUP),
        ];
        assert!(binding_to_admin(&bindings));
        assert!(!binding_to_admin(&bindings[..1]));
        assert!(!binding_to_admin(&[]));
    }
}

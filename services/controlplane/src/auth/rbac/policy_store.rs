//! RBAC policy/binding record shapes.
//!
//! # Purpose
//! Defines the named-field records shared by the stores, the enforcement
//! engine and the admin API, with conversions to and from the flat tuples the
//! policy model uses.
use serde::{Deserialize, Serialize};
use vulpes_authz::{GroupBinding, GroupPolicy, RawPolicy, UserPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    pub subject: String,
    pub object: String,
    pub sid: String,
    pub operation: String,
}

impl PolicyRule {
    pub fn to_raw(&self) -> Vec<String> {
        vec![
            self.subject.clone(),
            self.object.clone(),
            self.sid.clone(),
            self.operation.clone(),
        ]
    }
}

impl From<UserPolicy> for PolicyRule {
    fn from(policy: UserPolicy) -> Self {
        // Constructors guarantee four fields.
        let raw = policy.raw();
        Self {
            subject: raw[0].clone(),
            object: raw[1].clone(),
            sid: raw[2].clone(),
            operation: raw[3].clone(),
        }
    }
}

impl From<GroupPolicy> for PolicyRule {
    fn from(policy: GroupPolicy) -> Self {
        let raw = policy.raw();
        Self {
            subject: raw[0].clone(),
            object: raw[1].clone(),
            sid: raw[2].clone(),
            operation: raw[3].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingRule {
    pub user: String,
    pub group: String,
}

impl GroupingRule {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    pub fn to_raw(&self) -> Vec<String> {
        vec![self.user.clone(), self.group.clone()]
    }
}

impl From<GroupBinding> for GroupingRule {
    fn from(binding: GroupBinding) -> Self {
        Self::new(binding.user_name(), binding.group_name())
    }
}

impl From<GroupingRule> for GroupBinding {
    fn from(rule: GroupingRule) -> Self {
        GroupBinding::new(rule.user, rule.group)
    }
}

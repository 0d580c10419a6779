//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the control-plane admin API.
use crate::auth::rbac::bootstrap::UserRole;
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use serde::{Deserialize, Serialize};
use vulpes_authz::{IdRange, ObjectType, Operation};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Policy to add or remove.
///
/// Exactly one of `operation` (a single operation or a stored operation-set
/// pattern) and `operations` (a list folded into one set) must be given.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolicyRequest {
    pub subject: String,
    pub object: ObjectType,
    pub sid: String,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Stored policy tuple as listed by the admin API.
#[derive(Debug, Serialize, Deserialize)]
pub struct PolicyView {
    #[serde(flatten)]
    pub rule: PolicyRule,
    /// Set on the super-admin group policy.
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListPoliciesResponse {
    pub items: Vec<PolicyView>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolicyFilter {
    pub subject: Option<String>,
    pub object: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindingRequest {
    pub user: String,
    pub group: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindingFilter {
    pub user: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBindingsResponse {
    pub items: Vec<GroupingRule>,
}

/// Outcome of an idempotent write; `changed` is false when the write was a
/// no-op.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationResponse {
    pub changed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScopeQuery {
    pub object_type: ObjectType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScopeResponse {
    pub user: String,
    pub object_type: ObjectType,
    pub range: IdRange,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoleAssignmentRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleAssignmentResponse {
    pub user: String,
    pub group: String,
    /// Whether the user is now bound to the admin group.
    pub admin: bool,
}

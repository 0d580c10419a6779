//! RBAC admin API handlers.
//!
//! # Purpose and responsibility
//! Lets operators manage policy tuples, group bindings and role assignments,
//! and lets any caller inspect their own list scope.
//!
//! # Where it fits
//! Mounted under `/api/v1/auth/...`, so the authorization middleware checks
//! these requests against the `auth` object type like any other resource.
//! Writes go straight to the store; the next evaluation reloads them.
//!
//! # Key invariants and assumptions
//! - Request bodies are validated with the model's parse helpers before they
//!   reach the store.
//! - Writes are idempotent: `201` when something changed, `200` otherwise.
//! - Policy, binding and role writes additionally require the caller to be
//!   bound to the admin group; `create` on `auth` alone cannot grant itself
//!   root.
use crate::api::authorize::ListScope;
use crate::api::error::{
    ApiError, api_forbidden, api_internal, api_internal_rbac, api_unauthorized,
    api_validation_error,
};
use crate::api::types::{
    BindingFilter, BindingRequest, ListBindingsResponse, ListPoliciesResponse, MutationResponse,
    PolicyFilter, PolicyRequest, PolicyView, RoleAssignmentRequest, RoleAssignmentResponse,
    ScopeQuery, ScopeResponse,
};
use crate::app::AppState;
use crate::auth::principal::{self, Principal};
use crate::auth::rbac::bootstrap::{PREDEFINED_GROUPS, assign_role};
use crate::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use std::collections::BTreeSet;
use vulpes_authz::{
    GroupBinding, GroupPolicy, ObjectType, PolicyEntry, binding_to_admin, build_operation_set,
    is_admin_policy, parse_operation_pattern, validate_sid,
};

fn mutation_status(changed: bool) -> (StatusCode, Json<MutationResponse>) {
    let status = if changed {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(MutationResponse { changed }))
}

/// Validate a policy request and turn it into a storable rule.
///
/// # Errors
/// - Returns a validation error for blank subjects, malformed scope ids, and
///   missing, conflicting or unknown operations.
pub fn policy_from_request(body: PolicyRequest) -> Result<PolicyRule, ApiError> {
    let subject = body.subject.trim();
    if subject.is_empty() {
        return Err(api_validation_error("subject is required"));
    }
    validate_sid(&body.sid).map_err(|err| api_validation_error(&err.to_string()))?;
    let operation = match (body.operation, body.operations.is_empty()) {
        (Some(operation), true) => parse_operation_pattern(operation.trim())
            .map_err(|err| api_validation_error(&err.to_string()))?,
        (None, false) => build_operation_set(&body.operations),
        (Some(_), false) => {
            return Err(api_validation_error(
                "operation and operations are mutually exclusive",
            ));
        }
        (None, true) => return Err(api_validation_error("operation is required")),
    };
    Ok(PolicyRule {
        subject: subject.to_string(),
        object: body.object.as_str().to_string(),
        sid: body.sid,
        operation,
    })
}

/// Caller identity, falling back to the header when the middleware was
/// bypassed.
fn caller(
    state: &AppState,
    principal: Option<Extension<Principal>>,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    match principal {
        Some(Extension(principal)) => Ok(principal),
        None => principal::from_headers(headers, &state.authz.user_header)
            .ok_or_else(|| api_unauthorized("missing caller identity")),
    }
}

async fn admin_bindings(state: &AppState, user: &str) -> Result<bool, ApiError> {
    let bindings: Vec<GroupBinding> = state
        .store
        .list_bindings(Some(user), None)
        .await
        .map_err(|err| api_internal("failed to load bindings", &err))?
        .into_iter()
        .map(|binding| GroupBinding::new(binding.user, binding.group))
        .collect();
    Ok(binding_to_admin(&bindings))
}

/// Reject callers that are not bound to the admin group.
///
/// Skipped in debug mode, where the middleware is bypassed as well.
async fn require_admin(
    state: &AppState,
    principal: Option<Extension<Principal>>,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    if state.authz.debug {
        return Ok(());
    }
    let principal = caller(state, principal, headers)?;
    if admin_bindings(state, &principal.user).await? {
        return Ok(());
    }
    tracing::info!(user = %principal.user, "admin write denied");
    Err(api_forbidden("policy administration requires the admin group"))
}

/// Tag each rule that is exactly the super-admin group policy.
///
/// A rule counts as a group policy when its subject is a predefined group or
/// appears as the group side of some binding.
fn policy_views(rules: Vec<PolicyRule>, bindings: &[GroupingRule]) -> Vec<PolicyView> {
    let groups: BTreeSet<&str> = PREDEFINED_GROUPS
        .iter()
        .copied()
        .chain(bindings.iter().map(|binding| binding.group.as_str()))
        .collect();
    rules
        .into_iter()
        .map(|rule| {
            let admin = groups.contains(rule.subject.as_str())
                && rule.object.parse::<ObjectType>().is_ok_and(|object| {
                    is_admin_policy(&PolicyEntry::Group(GroupPolicy::new(
                        rule.subject.clone(),
                        object,
                        rule.sid.clone(),
                        &rule.operation,
                    )))
                });
            PolicyView { rule, admin }
        })
        .collect()
}

fn binding_from_request(body: BindingRequest) -> Result<GroupingRule, ApiError> {
    let user = body.user.trim();
    let group = body.group.trim();
    if user.is_empty() || group.is_empty() {
        return Err(api_validation_error("user and group are required"));
    }
    Ok(GroupingRule::new(user, group))
}

/// List policy tuples. Requires unrestricted read on `auth`.
pub async fn list_policies(
    State(state): State<AppState>,
    ListScope(scope): ListScope,
    Query(filter): Query<PolicyFilter>,
) -> Result<Json<ListPoliciesResponse>, ApiError> {
    if !scope.is_unrestricted() {
        return Err(api_forbidden("listing policies requires read on auth"));
    }
    let bindings = state
        .store
        .load_bindings()
        .await
        .map_err(|err| api_internal("failed to load bindings", &err))?;
    let rules = state
        .store
        .load_policies()
        .await
        .map_err(|err| api_internal("failed to load policies", &err))?
        .into_iter()
        .filter(|rule| {
            filter
                .subject
                .as_deref()
                .is_none_or(|subject| rule.subject == subject)
        })
        .filter(|rule| {
            filter
                .object
                .as_deref()
                .is_none_or(|object| rule.object == object)
        })
        .collect();
    Ok(Json(ListPoliciesResponse {
        items: policy_views(rules, &bindings),
    }))
}

pub async fn add_policy(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Json(body): Json<PolicyRequest>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    require_admin(&state, principal, &headers).await?;
    let rule = policy_from_request(body)?;
    let changed = state
        .store
        .add_policy(rule.clone())
        .await
        .map_err(|err| api_internal("failed to add policy", &err))?;
    tracing::info!(
        subject = %rule.subject,
        object = %rule.object,
        sid = %rule.sid,
        operation = %rule.operation,
        changed,
        "policy added"
    );
    Ok(mutation_status(changed))
}

pub async fn remove_policy(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Json(body): Json<PolicyRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    require_admin(&state, principal, &headers).await?;
    let rule = policy_from_request(body)?;
    let changed = state
        .store
        .remove_policy(&rule)
        .await
        .map_err(|err| api_internal("failed to remove policy", &err))?;
    tracing::info!(subject = %rule.subject, object = %rule.object, changed, "policy removed");
    Ok(Json(MutationResponse { changed }))
}

/// List group bindings. Requires unrestricted read on `auth`.
pub async fn list_bindings(
    State(state): State<AppState>,
    ListScope(scope): ListScope,
    Query(filter): Query<BindingFilter>,
) -> Result<Json<ListBindingsResponse>, ApiError> {
    if !scope.is_unrestricted() {
        return Err(api_forbidden("listing bindings requires read on auth"));
    }
    let items = state
        .store
        .list_bindings(filter.user.as_deref(), filter.group.as_deref())
        .await
        .map_err(|err| api_internal("failed to load bindings", &err))?;
    Ok(Json(ListBindingsResponse { items }))
}

pub async fn add_binding(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Json(body): Json<BindingRequest>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    require_admin(&state, principal, &headers).await?;
    let binding = binding_from_request(body)?;
    let changed = state
        .store
        .add_binding(binding.clone())
        .await
        .map_err(|err| api_internal("failed to add binding", &err))?;
    tracing::info!(user = %binding.user, group = %binding.group, changed, "binding added");
    Ok(mutation_status(changed))
}

pub async fn remove_binding(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Json(body): Json<BindingRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    require_admin(&state, principal, &headers).await?;
    let binding = binding_from_request(body)?;
    let changed = state
        .store
        .remove_binding(&binding)
        .await
        .map_err(|err| api_internal("failed to remove binding", &err))?;
    tracing::info!(user = %binding.user, group = %binding.group, changed, "binding removed");
    Ok(Json(MutationResponse { changed }))
}

/// Report the caller's list scope for an object type.
pub async fn caller_scope(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ScopeResponse>, ApiError> {
    let principal = caller(&state, principal, &headers)?;
    let range = state
        .engine
        .resolve_list_scope(&principal.user, query.object_type.as_str())
        .await
        .map_err(|err| api_internal_rbac("failed to resolve scope", &err))?;
    Ok(Json(ScopeResponse {
        user: principal.user,
        object_type: query.object_type,
        range,
    }))
}

/// Bind a user to the predefined group for a role.
pub async fn set_user_role(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(body): Json<RoleAssignmentRequest>,
) -> Result<Json<RoleAssignmentResponse>, ApiError> {
    require_admin(&state, principal, &headers).await?;
    let user = name.trim();
    if user.is_empty() {
        return Err(api_validation_error("user name is required"));
    }
    let group = assign_role(state.store.as_ref(), user, body.role)
        .await
        .map_err(|err| api_internal("failed to assign role", &err))?;
    let admin = admin_bindings(&state, user).await?;
    Ok(Json(RoleAssignmentResponse {
        user: user.to_string(),
        group: group.to_string(),
        admin,
    }))
}

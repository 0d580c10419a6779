//! HTTP authorization middleware.
//!
//! # Purpose and responsibility
//! Maps every `/api/v1/...` request onto an RBAC question and either answers
//! it (403 on deny) or, for list reads, attaches the caller's [`ListScope`] so
//! handlers can narrow their queries.
//!
//! # Where it fits
//! Installed with `route_layer` on the API router in [`crate::app`]. System
//! endpoints are mounted outside it.
//!
//! # Key invariants and assumptions
//! - The first path segment after `/api/v1/` names the object type; the second
//!   is the scope id only when it is numeric.
//! - Engine errors never turn into an allow.
//! - A list read never fails authorization; an empty scope means zero rows.
//!
//! # Security considerations
//! - The identity header must be set by a trusted authenticating proxy and
//!   stripped from client input upstream.
//! - Debug mode disables authorization entirely.
use crate::api::error::{
    ApiError, api_forbidden, api_internal_rbac, api_method_not_allowed, api_not_found,
    api_unauthorized,
};
use crate::app::AppState;
use crate::auth::principal::{self, Principal};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::Method;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use vulpes_authz::{IdRange, ObjectType, Operation};

pub const API_PREFIX: &str = "/api/v1/";

/// Resource addressed by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub object: ObjectType,
    /// Empty when the path addresses a collection.
    pub sid: String,
}

/// Derive the object type and scope id from a request path.
///
/// Returns `None` for paths outside [`API_PREFIX`] and `Some(Err)` carrying the
/// raw segment for unknown object types.
pub fn object_from_path(path: &str) -> Option<Result<RequestTarget, String>> {
    let rest = path.strip_prefix(API_PREFIX)?;
    let mut segments = rest.split('/').filter(|segment| !segment.is_empty());
    let object = segments.next()?;
    let object = match object.parse::<ObjectType>() {
        Ok(ObjectType::All) | Err(_) => return Some(Err(object.to_string())),
        Ok(object) => object,
    };
    let sid = match segments.next() {
        Some(segment) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => {
            segment.to_string()
        }
        _ => String::new(),
    };
    Some(Ok(RequestTarget { object, sid }))
}

/// Rows of the requested object type the caller may list.
///
/// Defaults to [`IdRange::All`] when the middleware did not resolve a scope,
/// which only happens when authorization is bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListScope(pub IdRange);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ListScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ListScope>()
            .cloned()
            .unwrap_or(ListScope(IdRange::All)))
    }
}

/// Axum middleware enforcing RBAC on API requests.
pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    if state.authz.debug || state.authz.always_allow.contains(&path) {
        return Ok(next.run(request).await);
    }

    let Some(principal) = principal::from_headers(request.headers(), &state.authz.user_header)
    else {
        return Err(api_unauthorized("missing caller identity"));
    };

    let target = match object_from_path(&path) {
        Some(Ok(target)) => target,
        Some(Err(object)) => {
            tracing::debug!(object = %object, "request for unknown object type");
            return Err(api_not_found("unknown object type"));
        }
        None => return Ok(next.run(request).await),
    };

    let method = request.method().clone();
    let Some(operation) = Operation::from_http_method(method.as_str()) else {
        return Err(api_method_not_allowed(method.as_str()));
    };

    if method == Method::GET && target.sid.is_empty() {
        let range = state
            .engine
            .resolve_list_scope(&principal.user, target.object.as_str())
            .await
            .map_err(|err| api_internal_rbac("authorization unavailable", &err))?;
        tracing::debug!(
            user = %principal.user,
            object = %target.object,
            unrestricted = range.is_unrestricted(),
            "list request scoped"
        );
        request.extensions_mut().insert(ListScope(range));
    } else {
        let allowed = state
            .engine
            .enforce(
                &principal.user,
                target.object.as_str(),
                &target.sid,
                operation.as_str(),
            )
            .await
            .map_err(|err| api_internal_rbac("authorization unavailable", &err))?;
        if !allowed {
            tracing::info!(
                user = %principal.user,
                object = %target.object,
                sid = %target.sid,
                operation = %operation,
                "request denied"
            );
            return Err(api_forbidden("operation not permitted"));
        }
    }

    request.extensions_mut().insert::<Principal>(principal);
    Ok(next.run(request).await)
}

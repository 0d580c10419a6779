//! Control-plane HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::auth::rbac::enforcer::{RbacConfig, RbacEngine};
use crate::config::ControlPlaneConfig;
use crate::store::PolicyStore;
use axum::Router;
use axum::http::HeaderName;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Authorization middleware settings.
#[derive(Debug, Clone)]
pub struct AuthzSettings {
    /// Skip authorization entirely.
    pub debug: bool,
    /// Exact request paths that bypass authorization.
    pub always_allow: HashSet<String>,
    /// Header carrying the authenticated user name.
    pub user_header: HeaderName,
}

impl AuthzSettings {
    pub fn from_config(config: &ControlPlaneConfig) -> anyhow::Result<Self> {
        Ok(Self {
            debug: config.debug,
            always_allow: config.always_allow_paths.iter().cloned().collect(),
            user_header: HeaderName::from_bytes(config.user_header.as_bytes())?,
        })
    }
}

impl Default for AuthzSettings {
    fn default() -> Self {
        Self {
            debug: false,
            always_allow: HashSet::new(),
            user_header: HeaderName::from_static(crate::config::DEFAULT_USER_HEADER),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub store: Arc<dyn PolicyStore>,
    pub engine: RbacEngine,
    pub authz: AuthzSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn PolicyStore>, rbac: RbacConfig, authz: AuthzSettings) -> Self {
        Self {
            api_version: "v1".to_string(),
            engine: RbacEngine::new(store.clone(), rbac),
            store,
            authz,
        }
    }
}

/// Routes served under `/api/v1/`, without state or middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/auth/policies",
            axum::routing::get(api::rbac::list_policies)
                .post(api::rbac::add_policy)
                .delete(api::rbac::remove_policy),
        )
        .route(
            "/api/v1/auth/bindings",
            axum::routing::get(api::rbac::list_bindings)
                .post(api::rbac::add_binding)
                .delete(api::rbac::remove_binding),
        )
        .route(
            "/api/v1/auth/scope",
            axum::routing::get(api::rbac::caller_scope),
        )
        .route(
            "/api/v1/auth/users/:name/role",
            axum::routing::post(api::rbac::set_user_role),
        )
}

/// Wrap `routes` in the authorization middleware and add system endpoints.
///
/// Exposed so embedding services can mount their own `/api/v1/` resources
/// behind the same checks.
pub fn build_router_with(state: AppState, routes: Router<AppState>) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    let protected = routes.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        api::authorize::authorize,
    ));

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .merge(protected)
        .layer(trace_layer)
        .with_state(state)
}

pub fn build_router(state: AppState) -> Router {
    build_router_with(state, api_routes())
}

use controlplane::app::{AppState, AuthzSettings};
use controlplane::auth::rbac::bootstrap::install_predefined_policies;
use controlplane::auth::rbac::enforcer::RbacConfig;
use controlplane::auth::rbac::policy_store::GroupingRule;
use controlplane::store::PolicyStore;
use controlplane::store::memory::InMemoryStore;
use std::sync::Arc;

#[allow(dead_code)]
pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[allow(dead_code)]
/// Memory-backed state with the predefined groups installed and `admin`
/// bound to the root group.
pub async fn seeded_state(authz: AuthzSettings) -> (InMemoryStore, AppState) {
    let store = InMemoryStore::new();
    install_predefined_policies(&store).await.expect("seed");
    store
        .add_binding(GroupingRule::new("admin", "root"))
        .await
        .expect("bind admin");
    let state = AppState::new(Arc::new(store.clone()), RbacConfig::default(), authz);
    (store, state)
}

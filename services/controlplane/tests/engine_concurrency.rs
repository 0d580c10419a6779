use controlplane::auth::rbac::bootstrap::install_predefined_policies;
use controlplane::auth::rbac::enforcer::{RbacConfig, RbacEngine};
use controlplane::auth::rbac::policy_store::{GroupingRule, PolicyRule};
use controlplane::store::PolicyStore;
use controlplane::store::memory::InMemoryStore;
use std::sync::Arc;

const USERS: [&str; 4] = ["admin", "bob", "dave", "nobody"];
const OBJECTS: [&str; 3] = ["users", "clusters", "auth"];
const SIDS: [&str; 4] = ["", "5", "52", "7"];
const OPS: [&str; 4] = ["read", "create", "update", "delete"];

async fn engine() -> RbacEngine {
    let store = InMemoryStore::new();
    install_predefined_policies(&store).await.expect("seed");
    store
        .add_binding(GroupingRule::new("admin", "root"))
        .await
        .expect("bind");
    store
        .add_binding(GroupingRule::new("bob", "readonly"))
        .await
        .expect("bind");
    store
        .add_policy(PolicyRule {
            subject: "dave".to_string(),
            object: "clusters".to_string(),
            sid: "5".to_string(),
            operation: r"\b(read|delete)\b".to_string(),
        })
        .await
        .expect("policy");
    RbacEngine::new(Arc::new(store), RbacConfig::default())
}

fn requests() -> Vec<(String, String, String, String)> {
    let mut out = Vec::new();
    for user in USERS {
        for object in OBJECTS {
            for sid in SIDS {
                for op in OPS {
                    out.push((
                        user.to_string(),
                        object.to_string(),
                        sid.to_string(),
                        op.to_string(),
                    ));
                }
            }
        }
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_enforce_matches_sequential() {
    let engine = engine().await;
    let requests = requests();

    let mut sequential = Vec::with_capacity(requests.len());
    for (user, object, sid, op) in &requests {
        sequential.push(engine.enforce(user, object, sid, op).await.expect("enforce"));
    }

    let mut handles = Vec::with_capacity(requests.len());
    for (user, object, sid, op) in requests.clone() {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.enforce(&user, &object, &sid, &op).await
        }));
    }
    let mut parallel = Vec::with_capacity(handles.len());
    for handle in handles {
        parallel.push(handle.await.expect("join").expect("enforce"));
    }

    assert_eq!(sequential, parallel);
    // Spot checks so agreement is not trivially all-false.
    let index = |user: &str, object: &str, sid: &str, op: &str| {
        requests
            .iter()
            .position(|r| r.0 == user && r.1 == object && r.2 == sid && r.3 == op)
            .expect("request present")
    };
    assert!(sequential[index("admin", "auth", "", "delete")]);
    assert!(sequential[index("bob", "users", "7", "read")]);
    assert!(!sequential[index("bob", "users", "7", "update")]);
    assert!(sequential[index("dave", "clusters", "52", "delete")]);
    assert!(!sequential[index("dave", "clusters", "7", "read")]);
    assert!(!sequential[index("nobody", "clusters", "5", "read")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_list_scope_is_stable() {
    let engine = engine().await;
    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.resolve_list_scope("dave", "clusters").await
        }));
    }
    for handle in handles {
        let range = handle.await.expect("join").expect("scope");
        assert_eq!(range, vulpes_authz::IdRange::Ids(vec![5]));
    }
}

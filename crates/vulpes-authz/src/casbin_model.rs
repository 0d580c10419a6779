use crate::matcher::MATCHER_FUNCTION;
use casbin::prelude::DefaultModel;
use std::sync::LazyLock;

static MODEL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
[request_definition]
r = sub, obj, sid, op

[policy_definition]
p = sub, obj, sid, op

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && {f}(r.obj, p.obj) && {f}(r.sid, p.sid) && {f}(r.op, p.op)
"#,
        f = MATCHER_FUNCTION
    )
});

pub fn casbin_model_string() -> &'static str {
    MODEL.as_str()
}

pub async fn casbin_model() -> casbin::Result<DefaultModel> {
    DefaultModel::from_str(casbin_model_string()).await
}

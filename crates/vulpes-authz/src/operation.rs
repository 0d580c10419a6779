use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// Canonical string for the wildcard operation.
pub const OP_ALL: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    #[serde(rename = "*")]
    All,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::All => OP_ALL,
        }
    }

    /// Map an HTTP method to the logical operation it performs.
    ///
    /// Methods outside GET/POST/PUT/PATCH/DELETE have no operation and must be
    /// rejected by the caller.
    pub fn from_http_method(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Operation::Read),
            "POST" => Some(Operation::Create),
            "PUT" | "PATCH" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl AsRef<str> for Operation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Operation::Read),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            OP_ALL => Ok(Operation::All),
            other => Err(AuthzError::InvalidOperation(other.to_string())),
        }
    }
}

/// Build a matcher pattern granting every operation in `ops`.
///
/// The result is a word-boundary anchored alternation such as
/// `\b(read|create)\b`, so `read` never matches `readonly` under the
/// unanchored matcher. A wildcard anywhere in the list collapses the whole set
/// to `*`. An empty list yields an empty pattern.
pub fn build_operation_set(ops: &[Operation]) -> String {
    if ops.is_empty() {
        return String::new();
    }
    if ops.contains(&Operation::All) {
        return OP_ALL.to_string();
    }
    let names: Vec<&str> = ops.iter().map(|op| op.as_str()).collect();
    format!(r"\b({})\b", names.join("|"))
}

/// Parse a stored operation column: either a single operation or an
/// operation set produced by [`build_operation_set`].
pub fn parse_operation_pattern(value: &str) -> AuthzResult<String> {
    if let Ok(op) = value.parse::<Operation>() {
        return Ok(op.as_str().to_string());
    }
    let inner = value
        .strip_prefix(r"\b(")
        .and_then(|rest| rest.strip_suffix(r")\b"))
        .ok_or_else(|| AuthzError::InvalidOperation(value.to_string()))?;
    let mut ops = Vec::new();
    for name in inner.split('|') {
        ops.push(name.parse::<Operation>()?);
    }
    Ok(build_operation_set(&ops))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_string_roundtrip() {
        let ops = [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::All,
        ];

        for op in ops {
            let as_str = op.as_str();
            assert_eq!(as_str.parse::<Operation>().ok(), Some(op));
            assert_eq!(op.to_string(), as_str);
        }
    }

    #[test]
    fn operation_from_str_invalid() {
        let err = "write".parse::<Operation>().expect_err("unknown op");
        assert_eq!(err, AuthzError::InvalidOperation("write".to_string()));
    }

    #[test]
    fn http_methods_map_to_operations() {
        assert_eq!(Operation::from_http_method("GET"), Some(Operation::Read));
        assert_eq!(Operation::from_http_method("POST"), Some(Operation::Create));
        assert_eq!(Operation::from_http_method("PUT"), Some(Operation::Update));
        assert_eq!(Operation::from_http_method("PATCH"), Some(Operation::Update));
        assert_eq!(
            Operation::from_http_method("DELETE"),
            Some(Operation::Delete)
        );
        assert_eq!(Operation::from_http_method("OPTIONS"), None);
    }

    #[test]
    fn operation_set_is_boundary_anchored() {
        assert_eq!(
            build_operation_set(&[Operation::Read, Operation::Create]),
            r"\b(read|create)\b"
        );
        assert_eq!(build_operation_set(&[Operation::Read]), r"\b(read)\b");
    }

    #[test]
    fn operation_set_wildcard_short_circuits() {
        assert_eq!(build_operation_set(&[Operation::All]), "*");
        assert_eq!(
            build_operation_set(&[Operation::Read, Operation::All]),
            "*"
        );
        assert_eq!(
            build_operation_set(&[Operation::Read, Operation::Update, Operation::All]),
            "*"
        );
    }

    #[test]
    fn operation_set_empty() {
        assert_eq!(build_operation_set(&[]), "");
    }

    #[test]
    fn parse_operation_pattern_accepts_sets() {
        assert_eq!(parse_operation_pattern("read").expect("single"), "read");
        assert_eq!(parse_operation_pattern("*").expect("wildcard"), "*");
        assert_eq!(
            parse_operation_pattern(r"\b(read|update)\b").expect("set"),
            r"\b(read|update)\b"
        );
        assert_eq!(parse_operation_pattern(r"\b(read|*)\b").expect("set"), "*");
    }

    #[test]
    fn parse_operation_pattern_rejects_free_regex() {
        assert!(parse_operation_pattern("re.*").is_err());
        assert!(parse_operation_pattern(r"\b(read|write)\b").is_err());
        assert!(parse_operation_pattern("").is_err());
    }

    #[test]
    fn operation_serde_names() {
        assert_eq!(Operation::All.as_ref(), "*");
        assert_eq!(Operation::Delete.as_ref(), "delete");
    }
}

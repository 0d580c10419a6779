use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// Scope id granting every instance of an object type.
pub const SID_ALL: &str = "*";

/// Resource category a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    #[serde(rename = "users")]
    Users,
    #[serde(rename = "clusters")]
    Clusters,
    #[serde(rename = "auth")]
    Auth,
    #[serde(rename = "*")]
    All,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Users => "users",
            ObjectType::Clusters => "clusters",
            ObjectType::Auth => "auth",
            ObjectType::All => "*",
        }
    }
}

impl AsRef<str> for ObjectType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "users" => Ok(ObjectType::Users),
            "clusters" => Ok(ObjectType::Clusters),
            "auth" => Ok(ObjectType::Auth),
            "*" => Ok(ObjectType::All),
            other => Err(AuthzError::InvalidObjectType(other.to_string())),
        }
    }
}

/// Validate a scope id supplied at the API boundary.
///
/// Accepts the wildcard or a non-negative integer primary key.
pub fn validate_sid(sid: &str) -> AuthzResult<()> {
    if sid == SID_ALL {
        return Ok(());
    }
    match sid.parse::<u64>() {
        Ok(_) => Ok(()),
        Err(_) => Err(AuthzError::InvalidScopeId(sid.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_roundtrip() {
        for object in [
            ObjectType::Users,
            ObjectType::Clusters,
            ObjectType::Auth,
            ObjectType::All,
        ] {
            assert_eq!(object.as_str().parse::<ObjectType>().ok(), Some(object));
        }
    }

    #[test]
    fn object_type_rejects_unknown() {
        let err = "nodes".parse::<ObjectType>().expect_err("unknown");
        assert!(matches!(err, AuthzError::InvalidObjectType(_)));
    }

    #[test]
    fn sid_validation() {
        assert!(validate_sid("*").is_ok());
        assert!(validate_sid("42").is_ok());
        assert!(validate_sid("").is_err());
        assert!(validate_sid("-1").is_err());
        assert!(validate_sid("5|6").is_err());
    }
}

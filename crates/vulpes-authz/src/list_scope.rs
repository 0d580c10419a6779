//! List-scope resolution.
//!
//! # Purpose
//! Reduces the policies applying to a subject for one object type into the
//! set of row ids a list request may return, so list endpoints can filter with
//! `WHERE id IN (...)` instead of enforcing row by row.
//!
//! # Key invariants
//! - Only tuples granting `read` (directly, through an operation set, or via
//!   `*`) contribute.
//! - A single qualifying wildcard-sid tuple makes the scope unrestricted.
//! - An empty id set is an explicit "nothing visible", never "no filter".
use crate::matcher::key_match;
use crate::object::SID_ALL;
use crate::operation::{OP_ALL, Operation};
use crate::policy::{PolicyEntry, RawPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rows a list request may return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum IdRange {
    /// Every row of the object type.
    All,
    /// Only rows whose primary key is listed; empty means none.
    Ids(Vec<i64>),
}

impl IdRange {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, IdRange::All)
    }
}

/// True when an operation column grants read access.
pub fn grants_read(operation: &str) -> bool {
    operation == OP_ALL || key_match(Operation::Read.as_str(), operation)
}

/// Resolve the visible id range from a subject's policies.
///
/// Binding records among `policies` are ignored. Scope ids that are not
/// integers are skipped.
pub fn resolve_id_range(policies: &[PolicyEntry]) -> IdRange {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for policy in policies {
        if matches!(policy, PolicyEntry::Binding(_)) {
            continue;
        }
        let raw = policy.raw();
        let (Some(sid), Some(operation)) = (raw.get(2), raw.get(3)) else {
            continue;
        };
        if sid.is_empty() || !grants_read(operation) {
            continue;
        }
        if sid == SID_ALL {
            return IdRange::All;
        }
        match sid.parse::<i64>() {
            Ok(id) => {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
            Err(_) => {
                tracing::debug!(sid = %sid, "skipping non-numeric scope id in list scope");
            }
        }
    }
    IdRange::Ids(ids)
}

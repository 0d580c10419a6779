//! Vulpes access-control primitives shared by the control plane.
//!
//! # Purpose
//! Centralizes the RBAC policy schema, the casbin model and its custom key
//! matcher, and list-scope resolution.
//!
//! # How it fits
//! The control plane persists [`UserPolicy`], [`GroupPolicy`] and
//! [`GroupBinding`] records, loads them into a casbin enforcer built from
//! [`casbin_model`] with [`register_matcher`] installed, and uses
//! [`resolve_id_range`] to narrow list queries.
//!
//! # Key invariants
//! - Policies are `(subject, object, sid, operation)`; bindings are
//!   `(user, group)`.
//! - The model is allow-only: absence of a matching tuple is the only deny.
//! - `*` matches everything; other patterns are unanchored regexes.
//!
//! # Examples
//! ```rust
//! use vulpes_authz::{Operation, build_operation_set, key_match};
//!
//! let ops = build_operation_set(&[Operation::Read, Operation::Create]);
//! assert!(key_match("read", &ops));
//! assert!(!key_match("readonly", &ops));
//! ```
//!
//! # Common pitfalls
//! - Scope-id patterns are unanchored: a grant on `5` also covers `52`.
mod casbin_model;
mod errors;
mod list_scope;
mod matcher;
mod object;
mod operation;
mod policy;

pub use casbin_model::{casbin_model, casbin_model_string};
pub use errors::{AuthzError, AuthzResult};
pub use list_scope::{IdRange, grants_read, resolve_id_range};
pub use matcher::{MATCHER_FUNCTION, custom_key_match, key_match, register_matcher};
pub use object::{ObjectType, SID_ALL, validate_sid};
pub use operation::{OP_ALL, Operation, build_operation_set, parse_operation_pattern};
pub use policy::{
    ADMIN_GROUP, ADMIN_POLICY, GroupBinding, GroupPolicy, PolicyEntry, READ_ONLY_GROUP,
    READ_ONLY_POLICY, READ_WRITE_GROUP, READ_WRITE_POLICY, READ_WRITE_UPDATE_GROUP,
    READ_WRITE_UPDATE_POLICY, RawPolicy, UserPolicy, binding_to_admin, is_admin_policy,
    predefined_group_policies,
};

//! Control-plane authorization modules.
//!
//! # Purpose
//! Groups the caller identity model and RBAC enforcement.
pub mod principal;
pub mod rbac;

//! RBAC module wiring.
//!
//! # Purpose
//! Exposes the enforcement engine, predefined-group bootstrap, and the policy
//! record types shared with the stores.
pub mod bootstrap;
pub mod enforcer;
pub mod policy_store;

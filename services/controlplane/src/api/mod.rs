//! Control-plane HTTP API module.
//!
//! # Purpose
//! Exposes the authorization middleware, the RBAC admin handlers, and shared
//! error and payload types.
pub mod authorize;
pub mod error;
pub mod rbac;
pub mod system;
pub mod types;

//! Control-plane service library crate.
//!
//! # Purpose
//! Exposes the RBAC enforcement engine, policy stores, authorization
//! middleware, admin API, and configuration for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the HTTP API and storage backends for clarity.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod observability;
pub mod store;

//! Caller identity model and helpers.
//!
//! # Purpose
//! Extracts the authenticated user name the fronting gateway places in a
//! request header. Session handling happens upstream; this service trusts the
//! header and only authorizes.
use axum::http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user: String,
}

impl Principal {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}

/// Read the caller from `header`. Missing, non-UTF-8 or blank values yield
/// `None`.
pub fn from_headers(headers: &HeaderMap, header: &HeaderName) -> Option<Principal> {
    let value = headers.get(header)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(Principal::new(value))
}

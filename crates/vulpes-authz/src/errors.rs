use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("invalid object type: {0}")]
    InvalidObjectType(String),
    #[error("invalid scope id: {0}")]
    InvalidScopeId(String),
    #[error("expected 2 parameters, got {0}")]
    MatcherArity(usize),
    #[error("matcher parameters must be strings")]
    MatcherArgument,
}

pub type AuthzResult<T> = Result<T, AuthzError>;

use crate::{AuthzError, AuthzResult};
use casbin::function_map::OperatorFunction;
use casbin::{CoreApi, Enforcer};
use regex::Regex;
use rhai::Dynamic;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Name the matcher is registered under in the casbin model.
pub const MATCHER_FUNCTION: &str = "vulpesKeyMatch";

/// Upper bound on cached patterns; the cache is emptied when it is reached.
const PATTERN_CACHE_LIMIT: usize = 1024;

/// Compiled policy patterns keyed by source. `None` marks a pattern that
/// failed to compile.
static PATTERN_CACHE: LazyLock<Mutex<HashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(pattern, error = %err, "policy pattern is not a valid regex");
            None
        }
    }
}

fn cached_pattern(pattern: &str) -> Option<Regex> {
    let Ok(mut cache) = PATTERN_CACHE.lock() else {
        return compile(pattern);
    };
    if let Some(compiled) = cache.get(pattern) {
        return compiled.clone();
    }
    let compiled = compile(pattern);
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

/// Test a request attribute against a stored policy attribute.
///
/// `*` matches everything. Any other pattern is a regular expression searched
/// for anywhere in `value`; it is not anchored, so `5` also matches `52`
/// unless the pattern carries its own boundaries. A pattern that does not
/// compile matches nothing.
pub fn key_match(value: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    cached_pattern(pattern).is_some_and(|re| re.is_match(value))
}

/// Arity- and type-checked form of [`key_match`] over engine values.
///
/// Expects exactly `[value, pattern]`, both strings.
pub fn custom_key_match(params: &[Dynamic]) -> AuthzResult<bool> {
    if params.len() != 2 {
        return Err(AuthzError::MatcherArity(params.len()));
    }
    let (value, pattern) = match (params[0].clone().into_string(), params[1].clone().into_string())
    {
        (Ok(value), Ok(pattern)) => (value, pattern),
        _ => return Err(AuthzError::MatcherArgument),
    };
    Ok(key_match(&value, &pattern))
}

fn key_match_dynamic(value: Dynamic, pattern: Dynamic) -> Dynamic {
    match custom_key_match(&[value, pattern]) {
        Ok(matched) => matched.into(),
        Err(err) => {
            tracing::warn!(error = %err, "policy matcher rejected arguments");
            false.into()
        }
    }
}

/// Install the matcher into an enforcer under [`MATCHER_FUNCTION`].
pub fn register_matcher(enforcer: &mut Enforcer) {
    enforcer.add_function(MATCHER_FUNCTION, OperatorFunction::Arg2(key_match_dynamic));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_patterns_are_compiled_once() {
        let pattern = r"^cache-test-\d+$";
        assert!(key_match("cache-test-1", pattern));
        assert!(key_match("cache-test-22", pattern));
        assert!(!key_match("cache-test-x", pattern));
        let cached = PATTERN_CACHE
            .lock()
            .expect("cache lock")
            .get(pattern)
            .cloned();
        assert!(matches!(cached, Some(Some(_))));
    }

    #[test]
    fn invalid_patterns_stay_unmatched_when_cached() {
        for _ in 0..3 {
            assert!(!key_match("anything", "(unclosed"));
        }
        let cached = PATTERN_CACHE
            .lock()
            .expect("cache lock")
            .get("(unclosed")
            .cloned();
        assert!(matches!(cached, Some(None)));
    }

    #[test]
    fn wildcard_pattern_matches_anything() {
        assert!(key_match("clusters", "*"));
        assert!(key_match("", "*"));
        assert!(key_match("anything at all", "*"));
    }

    #[test]
    fn exact_pattern_matches() {
        assert!(key_match("clusters", "clusters"));
        assert!(!key_match("users", "clusters"));
    }

    #[test]
    fn operation_sets_respect_word_boundaries() {
        let pattern = r"\b(read|create)\b";
        assert!(key_match("read", pattern));
        assert!(key_match("create", pattern));
        assert!(!key_match("update", pattern));
        assert!(!key_match("readonly", pattern));
    }

    #[test]
    fn unanchored_patterns_match_substrings() {
        // Scope ids and object types are matched without anchors: a grant on
        // sid 5 also covers 52 and 15. Pinned here so any change is explicit.
        assert!(key_match("52", "5"));
        assert!(key_match("15", "5"));
        assert!(key_match("readX", "read"));
        assert!(key_match("clusters", "cluster"));
        assert!(!key_match("7", "5"));
    }

    #[test]
    fn invalid_regex_never_matches() {
        assert!(!key_match("read", "(read"));
        assert!(!key_match("**", "**"));
    }

    #[test]
    fn custom_key_match_checks_arity() {
        let err = custom_key_match(&[Dynamic::from("read".to_string())]).expect_err("arity");
        assert_eq!(err, AuthzError::MatcherArity(1));

        let three = vec![
            Dynamic::from("a".to_string()),
            Dynamic::from("b".to_string()),
            Dynamic::from("c".to_string()),
        ];
        let err = custom_key_match(&three).expect_err("arity");
        assert_eq!(err, AuthzError::MatcherArity(3));
    }

    #[test]
    fn custom_key_match_requires_strings() {
        let err = custom_key_match(&[Dynamic::from(5_i64), Dynamic::from("5".to_string())])
            .expect_err("non-string");
        assert_eq!(err, AuthzError::MatcherArgument);
    }

    #[test]
    fn custom_key_match_delegates_to_key_match() {
        let params = [
            Dynamic::from("read".to_string()),
            Dynamic::from(r"\b(read)\b".to_string()),
        ];
        assert_eq!(custom_key_match(&params), Ok(true));
    }

    #[test]
    fn dynamic_adapter_defaults_to_no_match() {
        let result = key_match_dynamic(Dynamic::from(true), Dynamic::from("*".to_string()));
        assert_eq!(result.as_bool(), Ok(false));
        let result = key_match_dynamic(
            Dynamic::from("clusters".to_string()),
            Dynamic::from("*".to_string()),
        );
        assert_eq!(result.as_bool(), Ok(true));
    }
}

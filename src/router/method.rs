//! Method comparison strategies used when picking a tree for a request.

use http::Method;
use serde::Deserialize;
use std::str::FromStr;

/// How a request method is compared against the method a tree was registered
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodMatch {
    /// The request method must equal the tree method.
    #[default]
    Exact,
    /// Like `Exact`, but an `OPTIONS` request also matches trees of every other
    /// method so that preflight requests reach the route they probe.
    Cors,
}

impl MethodMatch {
    /// `true` when a request with method `requested` may be served by a tree
    /// registered for `registered`.
    #[inline]
    #[must_use]
    pub fn matches(self, registered: &Method, requested: &Method) -> bool {
        match self {
            MethodMatch::Exact => registered == requested,
            MethodMatch::Cors => registered == requested || requested == Method::OPTIONS,
        }
    }
}

impl FromStr for MethodMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MethodMatch::Exact),
            "cors" => Ok(MethodMatch::Cors),
            other => Err(format!("unknown method match '{other}' (expected exact|cors)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert!(MethodMatch::Exact.matches(&Method::GET, &Method::GET));
        assert!(!MethodMatch::Exact.matches(&Method::GET, &Method::OPTIONS));
    }

    #[test]
    fn test_cors_preflight() {
        assert!(MethodMatch::Cors.matches(&Method::POST, &Method::OPTIONS));
        assert!(MethodMatch::Cors.matches(&Method::GET, &Method::OPTIONS));
        assert!(!MethodMatch::Cors.matches(&Method::POST, &Method::GET));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("CORS".parse::<MethodMatch>(), Ok(MethodMatch::Cors));
        assert_eq!("exact".parse::<MethodMatch>(), Ok(MethodMatch::Exact));
        assert!("loose".parse::<MethodMatch>().is_err());
    }
}

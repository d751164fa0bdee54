//! Route definitions and pattern parsing.
//!
//! A pattern is a `/`-separated path where a segment may start with a capture
//! marker:
//!
//! - `:name` captures exactly one non-empty segment
//! - `*name` captures the rest of the path, slashes included, and must be the
//!   last segment
//!
//! Markers are only recognised at the start of a segment, so `/v1:beta` is a
//! plain literal.

use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::handler::HandlerChain;

/// One parsed piece of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    /// Literal text, matched byte for byte.
    Static(&'a str),
    /// `:name` capture.
    Param(&'a str),
    /// `*name` capture.
    Wildcard(&'a str),
}

/// Split `pattern` into literal and capture pieces.
///
/// `key` is the text actually inserted into the trie; for host routes it is
/// the host followed by `pattern`. Errors always quote `pattern`.
pub(crate) fn parse_pattern<'a>(pattern: &str, key: &'a str) -> Result<Vec<Piece<'a>>> {
    let bytes = key.as_bytes();
    let mut pieces = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let at_segment_start = i == 0 || bytes[i - 1] == b'/';
        let marker = bytes[i];
        if !at_segment_start || (marker != b':' && marker != b'*') {
            i += 1;
            continue;
        }

        if literal_start < i {
            pieces.push(Piece::Static(&key[literal_start..i]));
        }
        let name_end = key[i + 1..].find('/').map_or(key.len(), |n| i + 1 + n);
        let name = &key[i + 1..name_end];
        if name.is_empty() {
            return Err(RouterError::invalid_pattern(pattern, "empty capture name"));
        }
        if name.contains([':', '*']) {
            return Err(RouterError::invalid_pattern(
                pattern,
                format!("capture name '{name}' contains a marker character"),
            ));
        }
        if names.contains(&name) {
            return Err(RouterError::invalid_pattern(
                pattern,
                format!("capture name '{name}' is bound twice"),
            ));
        }
        names.push(name);

        if marker == b'*' {
            if name_end != key.len() {
                return Err(RouterError::invalid_pattern(
                    pattern,
                    "wildcard must be the final segment",
                ));
            }
            pieces.push(Piece::Wildcard(name));
        } else {
            pieces.push(Piece::Param(name));
        }
        i = name_end;
        literal_start = i;
    }

    if literal_start < key.len() {
        pieces.push(Piece::Static(&key[literal_start..]));
    }
    Ok(pieces)
}

/// A registered route: method, pattern and the handler chain to run.
///
/// Routes are immutable once registered and shared between the trie that
/// resolves them and the contexts that serve them.
pub struct Route {
    method: Method,
    host: Option<String>,
    pattern: String,
    key: String,
    param_names: Vec<Arc<str>>,
    chain: HandlerChain,
}

impl Route {
    /// Validate `pattern` and build a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] when the pattern does not start
    /// with `/`, has a non-final wildcard, an empty capture name or binds the
    /// same name twice.
    pub fn new(
        method: Method,
        host: Option<&str>,
        pattern: &str,
        chain: HandlerChain,
    ) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(RouterError::invalid_pattern(pattern, "pattern must start with '/'"));
        }
        let key = match host {
            Some(host) => format!("{host}{pattern}"),
            None => pattern.to_string(),
        };
        let param_names = parse_pattern(pattern, &key)?
            .into_iter()
            .filter_map(|piece| match piece {
                Piece::Param(name) | Piece::Wildcard(name) => Some(Arc::from(name)),
                Piece::Static(_) => None,
            })
            .collect();

        Ok(Self {
            method,
            host: host.map(str::to_string),
            pattern: pattern.to_string(),
            key,
            param_names,
            chain,
        })
    }

    /// HTTP method the route answers.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Host the route is bound to, for domain routes.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Pattern as registered, without the host.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Text inserted into the trie (`host + pattern` for domain routes).
    #[must_use]
    pub fn match_key(&self) -> &str {
        &self.key
    }

    /// Capture names in pattern order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Handlers run for this route, middleware included.
    #[must_use]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .field("handlers", &self.chain.len())
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{} {}{}", self.method, host, self.pattern),
            None => write!(f, "{} {}", self.method, self.pattern),
        }
    }
}

//! Registration-time errors.
//!
//! Everything here is raised while the route table is being built. Request-time
//! failures (no matching method, no matching path, handler errors and panics)
//! never surface as `RouterError`; they are turned into responses through the
//! [`ErrorRegistry`](crate::router::ErrorRegistry).

use thiserror::Error;

/// Errors returned by the registration API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The route pattern is malformed: a wildcard that is not the final
    /// segment, an empty capture name, or the same capture name bound twice.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern as given by the caller
        pattern: String,
        /// Human readable explanation
        reason: String,
    },

    /// A route with the same method and pattern is already registered.
    /// The first registration stays active.
    #[error("route conflict: {method} {pattern} is already registered")]
    RouteConflict {
        /// HTTP method of the rejected registration
        method: String,
        /// Pattern of the rejected registration
        pattern: String,
    },

    /// Error handlers can only be bound to 4xx and 5xx status codes.
    #[error("invalid error status {0}: expected a 4xx or 5xx code")]
    InvalidStatus(u16),

    /// Host routes require a router built with domain routing enabled.
    #[error("cannot register host route for '{host}': domain routing is disabled")]
    DomainRoutingDisabled {
        /// Host the caller tried to register
        host: String,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for registration operations.
pub type Result<T> = std::result::Result<T, RouterError>;

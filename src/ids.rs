//! Request identifiers.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// ULID-backed identifier assigned to every request the router serves.
///
/// Idle pooled contexts carry the nil id so that a stale id can never be
/// mistaken for the one of a live request.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    /// Generate a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// The all-zero id used by contexts that are not serving a request.
    #[must_use]
    pub const fn nil() -> Self {
        Self(ulid::Ulid::nil())
    }

    /// `true` for the id of an idle context.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse an id forwarded by an upstream proxy; generate one if the header
    /// is missing or malformed.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_else(Self::new)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

//! HTTP verb as a typed enum.
//!
//! The routing layer recognises exactly five verbs. A route registered
//! without a verb constraint (the builder's `any`) is stored as
//! `Option<Verb>::None` and acts as a catch-all for its path.
//!
//! Inbound methods outside this set (OPTIONS, HEAD, WebDAV extensions, …)
//! are not rejected — they simply never match a verb-specific route, so
//! resolution for them probes only the catch-all key space.

use std::fmt;
use std::str::FromStr;

/// A verb a route can be constrained to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

impl Verb {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Patch  => "PATCH",
            Self::Post   => "POST",
            Self::Put    => "PUT",
        }
    }
}

/// Parses an uppercase verb string (e.g. `"GET"`). Case-sensitive per
/// RFC 9110 §9.1 — callers normalise the inbound method first.
impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE" => Ok(Self::Delete),
            "GET"    => Ok(Self::Get),
            "PATCH"  => Ok(Self::Patch),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            _        => Err(()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_wire_form() {
        for verb in [Verb::Delete, Verb::Get, Verb::Patch, Verb::Post, Verb::Put] {
            assert_eq!(verb.as_str().parse::<Verb>(), Ok(verb));
        }
    }

    #[test]
    fn rejects_lowercase_and_unknown_methods() {
        assert!("get".parse::<Verb>().is_err());
        assert!("OPTIONS".parse::<Verb>().is_err());
        assert!("".parse::<Verb>().is_err());
    }
}

//! Unified infrastructure error type.

use std::fmt;

/// The error type returned by corso's fallible infrastructure operations.
///
/// Application-level failures (routing misses, token refusals, unknown
/// actions) are expressed as HTTP [`Response`](crate::Response) values or
/// as [`DispatchError`](crate::DispatchError), not as `Error`s. This type
/// surfaces what can actually go wrong underneath: binding a port or
/// accepting a connection.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

//! Incoming HTTP request type.

/// Header the inbound request token is read from, and the one a fresh
/// token is issued under on every dispatched response.
pub const TOKEN_HEADER: &str = "x-request-token";

/// An incoming HTTP request, as handed over by the host pipeline.
///
/// Deliberately plain: method, path, headers, body bytes. Cookie and body
/// parsing stay with the host — this layer only needs enough to route,
/// gate, and hand context to the invoked action.
pub struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self { method: method.into(), path: path.into(), headers, body }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request token echoed back by the client, if any.
    pub fn token(&self) -> Option<&str> {
        self.header(TOKEN_HEADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(
            "GET",
            "/",
            vec![("X-Request-Token".to_owned(), "abc".to_owned())],
            Vec::new(),
        );
        assert_eq!(req.header("x-request-token"), Some("abc"));
        assert_eq!(req.token(), Some("abc"));
        assert_eq!(req.header("x-other"), None);
    }
}

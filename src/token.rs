//! Anti-CSRF request tokens.
//!
//! A token is a signed credential bound to a single-use server-side secret
//! (the nonce) and scoped to a handler identity. The dispatcher issues one
//! on every dispatch and embeds it in the response; the client echoes it
//! back on its next POST, where validation consumes the nonce. One token,
//! one mutation — replaying a consumed token fails verification because
//! the secret behind it is gone.
//!
//! Wire format: `base64url(scope).nonce_id.base64url(hmac_sha256)` where
//! the signature covers `"{scope}.{nonce_id}"`. The base64 alphabet is
//! dot-free, so splitting on `.` is unambiguous.
//!
//! Scope mismatches are deliberately reported as [`TokenError::Missing`]:
//! a probing client learns nothing about which check failed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const SECRET_LEN: usize = 32;
const NONCE_ID_LEN: usize = 16;

/// How long an outstanding nonce stays valid. Tokens are issued on every
/// dispatch but consumed only on POST, so unconsumed secrets must age out.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

// ── RequestToken ──────────────────────────────────────────────────────────────

/// A freshly issued token, ready for embedding into a response.
#[derive(Clone, Debug)]
pub struct RequestToken {
    scope: String,
    nonce_id: String,
    signed: String,
}

impl RequestToken {
    /// The handler identity this token is bound to.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Identifier of the server-side secret that signed this token.
    pub fn nonce_id(&self) -> &str {
        &self.nonce_id
    }

    /// The serialized signed form the client echoes back.
    pub fn signed(&self) -> &str {
        &self.signed
    }
}

// ── TokenError ────────────────────────────────────────────────────────────────

/// Why validation refused a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenError {
    /// No token on the request — or one whose scope does not cover the
    /// target (intentionally not distinguished).
    Missing,
    /// A token was presented but could not be verified: malformed,
    /// signature mismatch, or its nonce was already consumed or expired.
    NonVerifiable,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("request token missing"),
            Self::NonVerifiable => f.write_str("request token not verifiable"),
        }
    }
}

impl std::error::Error for TokenError {}

// ── RequestTokenGuard ─────────────────────────────────────────────────────────

struct SecretEntry {
    secret: [u8; SECRET_LEN],
    issued_at: Instant,
}

/// Issues and validates single-use request tokens.
///
/// The nonce store is shared mutable state across concurrent requests; the
/// whole verify-then-revoke sequence runs under one lock so two requests
/// can never both consume the same secret.
pub struct RequestTokenGuard {
    secrets: Mutex<HashMap<String, SecretEntry>>,
    trusted_prefix: Option<String>,
    ttl: Duration,
}

impl RequestTokenGuard {
    pub fn new() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            trusted_prefix: None,
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Scopes starting with `prefix` validate against any handler identity.
    /// Reserved for the host framework's own authentication flows.
    pub fn with_trusted_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.trusted_prefix = Some(prefix.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Creates a token scoped to `scope`, backed by a fresh single-use
    /// secret. Expired leftovers are pruned on the way.
    pub fn issue(&self, scope: &str) -> RequestToken {
        let mut rng = rand::thread_rng();

        let mut id_bytes = [0u8; NONCE_ID_LEN];
        rng.fill_bytes(&mut id_bytes);
        let nonce_id = URL_SAFE_NO_PAD.encode(id_bytes);

        let mut secret = [0u8; SECRET_LEN];
        rng.fill_bytes(&mut secret);

        let signature = sign(&secret, scope, &nonce_id);
        let signed = format!(
            "{}.{nonce_id}.{}",
            URL_SAFE_NO_PAD.encode(scope),
            URL_SAFE_NO_PAD.encode(signature),
        );

        let mut secrets = lock(&self.secrets);
        secrets.retain(|_, entry| entry.issued_at.elapsed() <= self.ttl);
        secrets.insert(nonce_id.clone(), SecretEntry { secret, issued_at: Instant::now() });

        RequestToken { scope: scope.to_owned(), nonce_id, signed }
    }

    /// Verifies a token echoed back by the client against the current
    /// handler identity and consumes its secret on success.
    pub fn validate(&self, raw: Option<&str>, identity: &str) -> Result<(), TokenError> {
        let raw = raw.filter(|t| !t.is_empty()).ok_or(TokenError::Missing)?;

        let (scope, nonce_id, signature) = parse(raw).ok_or(TokenError::NonVerifiable)?;

        let mut secrets = lock(&self.secrets);
        let (secret, issued_at) = {
            let entry = secrets.get(nonce_id).ok_or(TokenError::NonVerifiable)?;
            (entry.secret, entry.issued_at)
        };
        if issued_at.elapsed() > self.ttl {
            secrets.remove(nonce_id);
            return Err(TokenError::NonVerifiable);
        }

        let mut mac = HmacSha256::new_from_slice(&secret)
            .expect("HMAC accepts keys of any size");
        mac.update(message(&scope, nonce_id).as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return Err(TokenError::NonVerifiable);
        }

        let trusted = self
            .trusted_prefix
            .as_deref()
            .is_some_and(|prefix| scope.starts_with(prefix));
        if scope != identity && !trusted {
            debug!(%scope, %identity, "token scope mismatch, reporting as missing");
            return Err(TokenError::Missing);
        }

        secrets.remove(nonce_id);
        Ok(())
    }

    /// Number of outstanding (unconsumed, unpruned) secrets.
    pub fn outstanding(&self) -> usize {
        lock(&self.secrets).len()
    }
}

impl Default for RequestTokenGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(secrets: &Mutex<HashMap<String, SecretEntry>>)
-> std::sync::MutexGuard<'_, HashMap<String, SecretEntry>> {
    // A panic while holding the lock leaves only prunable state behind.
    secrets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn message(scope: &str, nonce_id: &str) -> String {
    format!("{scope}.{nonce_id}")
}

fn sign(secret: &[u8], scope: &str, nonce_id: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any size");
    mac.update(message(scope, nonce_id).as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn parse(raw: &str) -> Option<(String, &str, Vec<u8>)> {
    let mut parts = raw.split('.');
    let scope_b64 = parts.next()?;
    let nonce_id = parts.next()?;
    let sig_b64 = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let scope = String::from_utf8(URL_SAFE_NO_PAD.decode(scope_b64).ok()?).ok()?;
    let signature = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
    Some((scope, nonce_id, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_token_validates_exactly_once() {
        let guard = RequestTokenGuard::new();
        let token = guard.issue("Orders");

        assert_eq!(guard.validate(Some(token.signed()), "Orders"), Ok(()));
        // Replay: the secret was revoked on first success.
        assert_eq!(
            guard.validate(Some(token.signed()), "Orders"),
            Err(TokenError::NonVerifiable),
        );
    }

    #[test]
    fn absent_or_empty_tokens_are_missing() {
        let guard = RequestTokenGuard::new();
        assert_eq!(guard.validate(None, "Orders"), Err(TokenError::Missing));
        assert_eq!(guard.validate(Some(""), "Orders"), Err(TokenError::Missing));
    }

    #[test]
    fn garbage_tokens_are_non_verifiable() {
        let guard = RequestTokenGuard::new();
        for raw in ["not-a-token", "a.b", "a.b.c.d", "!!!.x.!!!"] {
            assert_eq!(guard.validate(Some(raw), "Orders"), Err(TokenError::NonVerifiable), "{raw}");
        }
    }

    #[test]
    fn tampered_signatures_fail() {
        let guard = RequestTokenGuard::new();
        let token = guard.issue("Orders");
        let mut tampered = token.signed().to_owned();
        tampered.pop();
        assert_eq!(guard.validate(Some(&tampered), "Orders"), Err(TokenError::NonVerifiable));
    }

    #[test]
    fn scope_mismatch_is_reported_as_missing() {
        let guard = RequestTokenGuard::new();
        let token = guard.issue("Orders");
        assert_eq!(guard.validate(Some(token.signed()), "Pages"), Err(TokenError::Missing));
        // The mismatch did not consume the secret: the right scope still works.
        assert_eq!(guard.validate(Some(token.signed()), "Orders"), Ok(()));
    }

    #[test]
    fn trusted_prefix_bypasses_the_identity_check() {
        let guard = RequestTokenGuard::new().with_trusted_prefix("core/auth");
        let token = guard.issue("core/auth/login");
        assert_eq!(guard.validate(Some(token.signed()), "Orders"), Ok(()));
    }

    #[test]
    fn expired_nonces_are_non_verifiable_and_pruned() {
        let guard = RequestTokenGuard::new().with_ttl(Duration::from_millis(1));
        let token = guard.issue("Orders");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(
            guard.validate(Some(token.signed()), "Orders"),
            Err(TokenError::NonVerifiable),
        );
        // issue() prunes aged-out leftovers.
        guard.issue("Pages");
        assert_eq!(guard.outstanding(), 1);
    }

    #[test]
    fn issued_tokens_expose_their_binding() {
        let guard = RequestTokenGuard::new();
        let token = guard.issue("Orders");
        assert_eq!(token.scope(), "Orders");
        assert!(token.signed().contains(token.nonce_id()));
    }
}

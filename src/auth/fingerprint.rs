//! Credential fingerprinting.
//!
//! A request's cookie set is identified by a deterministic 160-bit digest so
//! the authorization store can answer "have these exact credentials been
//! confirmed before?" without keeping the cookies themselves.

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use sha1::{Digest, Sha1};

/// A single session cookie supplied in a request body.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive cookie data.
#[derive(Clone, Deserialize)]
pub struct Cookie {
    /// Cookie name (`a`, `b`, etc.).
    pub name: String,
    /// Cookie value (sensitive — never log).
    value: String,
}

impl Cookie {
    /// Creates a new cookie pair.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Computes the fingerprint of a cookie set: the SHA-1 digest of every
/// `name=value` pair concatenated in list order, as 40 lowercase hex chars.
///
/// Pure and deterministic: the same sequence always yields the same digest.
/// The concatenation is order-sensitive — callers must submit cookies in a
/// consistent order for cache hits to register. Pairs are deliberately NOT
/// sorted before hashing; sorting would change every published fingerprint.
///
/// An empty set is legal input and hashes to the digest of the empty string.
/// It must never be treated as a valid authorization key; the decision
/// service rejects empty credential sets before fingerprinting matters.
#[must_use]
pub fn fingerprint(cookies: &[Cookie]) -> String {
    let mut hasher = Sha1::new();
    for cookie in cookies {
        hasher.update(cookie.name.as_bytes());
        hasher.update(b"=");
        hasher.update(cookie.value.as_bytes());
    }
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // write! to a String cannot fail
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

//! Request signing for the CareHQ API.
//!
//! Every request carries a signature computed as
//!
//! ```text
//! hex(DIGEST("{timestamp}{canonical_body}{api_secret}"))
//! ```
//!
//! where the canonical body is the signed parameter set flattened as
//! `key1 v1 v1' key2 v2 ...` with no separators, in insertion order. The
//! service currently expects SHA-1; [`Signer`] takes the digest algorithm as
//! a parameter so it can be switched without touching callers.

use ring::digest;

use crate::params::MultiValueDict;

/// Header carrying the account the API key belongs to.
pub const ACCOUNT_ID_HEADER: &str = "X-CareHQ-AccountId";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-CareHQ-APIKey";

/// Header carrying the hex-encoded request signature.
pub const SIGNATURE_HEADER: &str = "X-CareHQ-Signature";

/// Header carrying the Unix timestamp (seconds) the signature was built with.
pub const TIMESTAMP_HEADER: &str = "X-CareHQ-Timestamp";

/// Computes request signatures with a fixed digest algorithm.
#[derive(Debug, Clone, Copy)]
pub struct Signer {
    algorithm: &'static digest::Algorithm,
}

impl Default for Signer {
    fn default() -> Self {
        Self::new(&digest::SHA1_FOR_LEGACY_USE_ONLY)
    }
}

impl Signer {
    pub fn new(algorithm: &'static digest::Algorithm) -> Self {
        Self { algorithm }
    }

    /// Digest `timestamp ++ body ++ secret` and render it as lowercase hex.
    pub fn sign(&self, timestamp: &str, body: &str, secret: &str) -> String {
        let mut ctx = digest::Context::new(self.algorithm);
        ctx.update(timestamp.as_bytes());
        ctx.update(body.as_bytes());
        ctx.update(secret.as_bytes());
        hex::encode(ctx.finish())
    }
}

/// Sign with the service's default algorithm (SHA-1).
pub fn sign(timestamp: &str, body: &str, secret: &str) -> String {
    Signer::default().sign(timestamp, body, secret)
}

/// Build the canonical signature body for a parameter set.
///
/// Each key is emitted once, followed by all of its values. Keys that hold no
/// values still contribute their name. An absent set yields an empty body.
pub fn canonical_body(params: Option<&MultiValueDict>) -> String {
    let Some(params) = params else {
        return String::new();
    };
    let mut body = String::new();
    for (key, values) in params.iter() {
        body.push_str(key);
        for value in values {
            body.push_str(value);
        }
    }
    body
}

/// Current Unix time in whole seconds, formatted for [`TIMESTAMP_HEADER`].
pub fn unix_timestamp() -> String {
    time::OffsetDateTime::now_utc().unix_timestamp().to_string()
}

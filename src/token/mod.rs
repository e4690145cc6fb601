//! Capability tokens embedded in streaming URLs.
//!
//! Two independent link encodings are supported, selected by path shape:
//!
//! - **Signed segments**: `scope/object/expiry/signature`, where the
//!   signature is a SHA-256 digest over the first three fields and a
//!   server-held secret.
//! - **Encrypted blob**: a single URL-safe base64 segment carrying the
//!   AES-128-CBC encryption of `scope|object|expiry` (see [`blob`]).
//!
//! Both encode the same claim: the bearer may stream one object until the
//! expiry instant. Expiry is checked at request time by the HTTP layer, not
//! here, so decode/verify results stay cacheable.

pub mod blob;

use crate::ids::{ObjectId, ScopeId};
use sha2::{Digest, Sha256};

/// The claim carried by a streaming link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityToken {
    pub scope: ScopeId,
    pub object: ObjectId,
    /// Unix seconds. The token is valid strictly before this instant.
    pub expires_at: u64,
}

impl CapabilityToken {
    /// A token whose expiry is `now` or earlier is no longer valid.
    pub fn is_expired(&self, now_unix: u64) -> bool {
        self.expires_at <= now_unix
    }
}

/// Errors from decoding the encrypted blob form.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid cipher key or IV length")]
    InvalidKey,

    #[error("token is not valid base64")]
    Encoding,

    #[error("token decryption failed")]
    Decrypt,

    #[error("malformed token payload")]
    Payload,
}

/// Compute the hex signature for a signed link.
pub fn sign(scope: ScopeId, object: ObjectId, expires_at: u64, secret: &str) -> String {
    let digest = Sha256::digest(format!("{scope}|{object}|{expires_at}|{secret}").as_bytes());
    hex::encode(digest)
}

/// Verify the signature of a signed link.
///
/// Returns `false` for any mismatch or malformed signature; never panics.
pub fn verify(
    scope: ScopeId,
    object: ObjectId,
    expires_at: u64,
    signature: &str,
    secret: &str,
) -> bool {
    if signature.is_empty() {
        return false;
    }
    sign(scope, object, expires_at, secret) == signature
}

/// Generate a random 32-byte hex secret suitable for `[auth] secret_key`.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

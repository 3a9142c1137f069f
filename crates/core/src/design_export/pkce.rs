//! PKCE material and anti-CSRF state generation
//!
//! Implements the client half of RFC 7636: a random code verifier kept
//! secret until token exchange, and its SHA-256 challenge sent with the
//! authorization request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Verifier entropy in bytes; encodes to 43 characters, the RFC 7636 floor.
const VERIFIER_BYTES: usize = 32;

/// State-token entropy in bytes, before encoding.
const STATE_BYTES: usize = 64;

/// PKCE verifier/challenge pair for one authorization attempt.
#[derive(Debug, Clone)]
pub struct PkceMaterial {
    /// Random secret, base64url without padding. Stored alongside the
    /// authorization state and sent only during token exchange.
    pub code_verifier: String,

    /// BASE64URL(SHA256(code_verifier)), sent in the authorization request.
    pub code_challenge: String,
}

impl PkceMaterial {
    /// Generate a fresh verifier/challenge pair.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let code_verifier = URL_SAFE_NO_PAD.encode(bytes);
        let code_challenge = challenge_for(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    /// The challenge transform name; always `S256`.
    #[must_use]
    pub const fn challenge_method() -> &'static str {
        "S256"
    }
}

/// Compute the S256 challenge for a verifier.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generate a random anti-CSRF state token (64 bytes of entropy).
#[must_use]
pub fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

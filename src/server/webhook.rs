//! GitHub webhook signature verification and payload decoding.
//!
//! GitHub signs the webhook payloads with HMAC-SHA1 if a secret is configured,
//! and sends the signature in the `X-Hub-Signature` header as `sha1=<hex>`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// The header carrying the signature of the payload.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// A custom error describing the error cases of the webhook handling.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The payload is not valid JSON, or it does not describe a repository.
    #[error("cannot decode payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// The secret cannot be used as an HMAC key.
    #[error("invalid signing key")]
    InvalidKey,
}

/// The parts of a GitHub push event used for mirroring.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WebhookPayload {
    pub repository: WebhookRepository,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WebhookRepository {
    /// The owner and name of the repository, e.g. `acme/repo`.
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub name: String,
}

/// Parses a signature header (e.g. "sha1=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex).
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_signature = header.strip_prefix("sha1=")?;
    hex::decode(hex_signature).ok()
}

/// Computes the signature header GitHub would send for this payload.
pub fn signature_header(payload: &[u8], secret: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| WebhookError::InvalidKey)?;
    mac.update(payload);
    Ok(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies a signature header against the payload and the secret.
///
/// The comparison happens in constant time.
pub fn verify_signature(payload: &[u8], header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);

    mac.verify_slice(&expected).is_ok()
}

pub fn parse_payload(body: &[u8]) -> Result<WebhookPayload, WebhookError> {
    Ok(serde_json::from_slice(body)?)
}

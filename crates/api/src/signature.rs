//! Webhook signature verification.
//!
//! The gateway signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{payload}"` and sends `t=<timestamp>,v1=<hex>` in the
//! signature header. Verification failures reject the delivery before any
//! parsing or processing happens.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the gateway signature.
pub const SIGNATURE_HEADER: &str = "gateway-signature";

/// Signature verification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature header is missing.
    #[error("Missing signature header")]
    MissingHeader,

    /// The signature header is not in `t=...,v1=...` form.
    #[error("Malformed signature header")]
    Malformed,

    /// The signature does not match the payload.
    #[error("Signature mismatch")]
    Mismatch,
}

/// Verifies a webhook payload against its signature header.
///
/// # Errors
///
/// Returns `Malformed` when the header cannot be parsed and `Mismatch` when
/// the digest disagrees with the payload.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut provided = None;
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => provided = Some(value),
            _ => {}
        }
    }
    let (Some(timestamp), Some(provided)) = (timestamp, provided) else {
        return Err(SignatureError::Malformed);
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Byte-wise comparison over fixed-length hex digests.
    if expected.as_bytes() != provided.as_bytes() {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Signs a payload the way the gateway does (test and tooling helper).
#[must_use]
pub fn sign_payload(payload: &[u8], timestamp: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with an HMAC of the raw request body, keyed by
//! the webhook secret, and sends it as `<algorithm>=<hex digest>`.
//! `X-Hub-Signature` carries `sha1=...`; `X-Hub-Signature-256` carries
//! `sha256=...`.
//!
//! Verification fails closed: every malformed input is an error.

use axum::http::HeaderMap;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Primary signature header.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// SHA-256 signature header, consulted when the primary one is absent.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,

    #[error("signature header is not of the form <algorithm>=<hex digest>")]
    Malformed,

    #[error("unsupported signature algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    #[error("signature digest is not valid hex")]
    InvalidHex,

    #[error("signature digest is {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("signature does not match payload")]
    Mismatch,

    #[error("webhook secret rejected as HMAC key")]
    InvalidKey,
}

/// HMAC algorithms GitHub signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    fn from_prefix(prefix: &str) -> Result<Self, SignatureError> {
        match prefix.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Algorithm::Sha1),
            "sha256" => Ok(Algorithm::Sha256),
            _ => Err(SignatureError::UnsupportedAlgorithm(prefix.to_string())),
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
        }
    }

    fn digest_len(self) -> usize {
        match self {
            Algorithm::Sha1 => 20,
            Algorithm::Sha256 => 32,
        }
    }
}

/// Pick the signature header value from a request.
///
/// Returns `Ok(None)` when neither header is present and
/// `Err(Malformed)` when the value is not visible ASCII.
pub fn signature_from_headers(headers: &HeaderMap) -> Result<Option<&str>, SignatureError> {
    let value = headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(SIGNATURE_256_HEADER));

    match value {
        Some(v) => v.to_str().map(Some).map_err(|_| SignatureError::Malformed),
        None => Ok(None),
    }
}

/// Verify a `<algorithm>=<hex>` signature over `payload`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature: Option<&str>,
) -> Result<Algorithm, SignatureError> {
    let signature = signature.ok_or(SignatureError::Missing)?.trim();
    let (prefix, hex_digest) = signature
        .split_once('=')
        .ok_or(SignatureError::Malformed)?;

    let algorithm = Algorithm::from_prefix(prefix)?;
    let digest = hex::decode(hex_digest).map_err(|_| SignatureError::InvalidHex)?;

    if digest.len() != algorithm.digest_len() {
        return Err(SignatureError::WrongLength {
            expected: algorithm.digest_len(),
            actual: digest.len(),
        });
    }

    match algorithm {
        Algorithm::Sha1 => verify_mac::<HmacSha1>(secret, payload, &digest)?,
        Algorithm::Sha256 => verify_mac::<HmacSha256>(secret, payload, &digest)?,
    }

    Ok(algorithm)
}

/// Compute the header value GitHub would send for `payload`.
pub fn sign_payload(
    algorithm: Algorithm,
    secret: &str,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let digest = match algorithm {
        Algorithm::Sha1 => compute_mac::<HmacSha1>(secret, payload)?,
        Algorithm::Sha256 => compute_mac::<HmacSha256>(secret, payload)?,
    };
    Ok(format!("{}={}", algorithm.prefix(), hex::encode(digest)))
}

fn keyed<M: Mac + KeyInit>(secret: &str) -> Result<M, SignatureError> {
    <M as KeyInit>::new_from_slice(secret.as_bytes()).map_err(|_| {
        warn!("webhook_signature_invalid_key");
        SignatureError::InvalidKey
    })
}

fn compute_mac<M: Mac + KeyInit>(secret: &str, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = keyed::<M>(secret)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison via `Mac::verify_slice`.
fn verify_mac<M: Mac + KeyInit>(
    secret: &str,
    payload: &[u8],
    digest: &[u8],
) -> Result<(), SignatureError> {
    let mut mac = keyed::<M>(secret)?;
    mac.update(payload);
    mac.verify_slice(digest).map_err(|_| SignatureError::Mismatch)
}

//! Off-chain check-in attestations.
//!
//! The attestation service issues a time-bounded signed statement authorizing
//! one check-in for one address. Attestations are fetched fresh per attempt
//! and never cached; a stale or malformed one is rejected before anything is
//! sent to the wallet.
//!
//! The signature arrives hex-encoded and is decoded exactly once, in
//! [`decode_signature`]; both the dry-run and the commit path consume the
//! decoded bytes, so the encoding contract lives in a single place.

use alloy_primitives::{hex, Address, Bytes};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::MintgateError;

/// A server-issued, time-bounded authorization for a single check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// Opaque identity hash bound into the signature.
    pub identity_hash: String,
    /// Issuance time, unix seconds.
    pub timestamp: u64,
    /// Decoded signature bytes.
    pub signature: Bytes,
}

impl Attestation {
    /// Rejects the attestation unless `|now - timestamp| <= max_skew`.
    pub fn ensure_fresh(&self, now: u64, max_skew: u64) -> Result<(), MintgateError> {
        let skew = now.abs_diff(self.timestamp);
        if skew > max_skew {
            return Err(MintgateError::StaleAttestation { skew, limit: max_skew });
        }
        Ok(())
    }
}

/// Decodes the attestation signature from its wire form: hex, optionally
/// `0x`-prefixed, even length, nonempty.
pub fn decode_signature(raw: &str) -> Result<Bytes, MintgateError> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    if digits.is_empty() {
        return Err(MintgateError::MalformedAttestation("empty signature".into()));
    }
    let bytes = hex::decode(digits).map_err(|err| {
        MintgateError::MalformedAttestation(format!("signature is not valid hex: {err}"))
    })?;
    Ok(bytes.into())
}

/// Wire shape of the attestation endpoint response. Every field is required;
/// absence is a hard error, never defaulted.
#[derive(Debug, Deserialize)]
struct AttestationPayload {
    signature: Option<String>,
    #[serde(rename = "ipHash", alias = "ipAddress")]
    identity: Option<String>,
    timestamp: Option<u64>,
}

impl AttestationPayload {
    fn into_attestation(self) -> Result<Attestation, MintgateError> {
        let missing =
            |field: &str| MintgateError::MalformedAttestation(format!("missing field `{field}`"));
        let signature = self.signature.ok_or_else(|| missing("signature"))?;
        let identity_hash = self.identity.ok_or_else(|| missing("ipHash"))?;
        let timestamp = self.timestamp.ok_or_else(|| missing("timestamp"))?;
        Ok(Attestation { identity_hash, timestamp, signature: decode_signature(&signature)? })
    }
}

/// Source of check-in attestations, keyed by address.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Fetches a fresh attestation for `address`. Implementations must not
    /// cache.
    async fn fetch(&self, address: Address) -> Result<Attestation, MintgateError>;
}

/// [`AttestationSource`] backed by the HTTP endpoint
/// `GET <url>?address=<addr>`.
#[derive(Debug, Clone)]
pub struct HttpAttestationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAttestationClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }
}

#[async_trait]
impl AttestationSource for HttpAttestationClient {
    async fn fetch(&self, address: Address) -> Result<Attestation, MintgateError> {
        debug!(%address, endpoint = %self.endpoint, "fetching attestation");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address.to_string())])
            .send()
            .await
            .map_err(|err| MintgateError::ServerError(err.to_string()))?
            .error_for_status()
            .map_err(|err| MintgateError::ServerError(err.to_string()))?;
        let payload: AttestationPayload = response
            .json()
            .await
            .map_err(|err| MintgateError::MalformedAttestation(err.to_string()))?;
        payload.into_attestation()
    }
}

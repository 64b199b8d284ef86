//! The injected wallet capability.
//!
//! Browser wallets expose the [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193)
//! provider API. This crate consumes that surface through [`WalletProvider`],
//! a capability trait injected once at construction time, so the whole
//! session/orchestration stack is polymorphic over a real injected provider
//! and a deterministic test double.

use alloy_primitives::{Address, ChainId, TxHash};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;

use crate::network::ChainDescriptor;

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// EIP-1193 error code for `wallet_switchEthereumChain` targeting a chain the
/// wallet has never been told about.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// A failure reported by the injected wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// There is no injected provider (e.g. no wallet extension installed).
    #[error("no injected wallet provider is available")]
    Unavailable,

    /// The provider returned a JSON-RPC error object.
    #[error("wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The event payload could not be interpreted.
    #[error("invalid chain id payload: {0}")]
    InvalidChainId(String),
}

impl ProviderError {
    /// Whether the error is the EIP-1193 "user rejected request" code.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code: USER_REJECTED_REQUEST, .. })
    }

    /// Whether the error is the "unrecognized chain" code that
    /// `wallet_switchEthereumChain` reports for chains the wallet does not
    /// know, which triggers the add-chain fallback.
    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, Self::Rpc { code: UNRECOGNIZED_CHAIN, .. })
    }
}

/// Events the injected provider pushes out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// `accountsChanged`: the selected account set changed. An empty list
    /// means the wallet disconnected.
    AccountsChanged(Vec<Address>),
    /// `chainChanged`: the wallet's active chain changed.
    ChainChanged(ChainId),
    /// `disconnect`: the provider lost its connection.
    Disconnected,
}

/// The EIP-1193 surface this crate consumes.
///
/// Methods map one-to-one onto the provider RPCs named in their docs. Event
/// delivery is not part of the trait: callers hand the session synchronizer a
/// [`WalletEvent`] stream whose lifetime scopes the subscription.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// `eth_accounts` — the already-authorized accounts, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_requestAccounts` — prompts the user to connect.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`. On success the wallet also switches to the
    /// newly registered chain.
    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError>;

    /// `eth_sendTransaction` — the wallet signs and submits in one step and
    /// returns the transaction hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError>;
}

/// Parses the `chainChanged` payload, which EIP-1193 delivers as a
/// hex-quantity string (`"0x38"`), tolerating plain decimal as well.
pub fn parse_chain_id(raw: &str) -> Result<ChainId, ProviderError> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| ProviderError::InvalidChainId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_chain_ids() {
        assert_eq!(parse_chain_id("0x38").unwrap(), 56);
        assert_eq!(parse_chain_id("0X38").unwrap(), 56);
        assert_eq!(parse_chain_id("56").unwrap(), 56);
        assert_eq!(parse_chain_id(" 0x1 ").unwrap(), 1);
    }

    #[test]
    fn rejects_garbage_chain_ids() {
        assert!(parse_chain_id("bsc").is_err());
        assert!(parse_chain_id("0x").is_err());
        assert!(parse_chain_id("").is_err());
    }

    #[test]
    fn classifies_eip1193_codes() {
        let rejected = ProviderError::Rpc { code: 4001, message: "nope".into() };
        assert!(rejected.is_user_rejection());
        assert!(!rejected.is_unrecognized_chain());

        let unknown = ProviderError::Rpc { code: 4902, message: "unknown chain".into() };
        assert!(unknown.is_unrecognized_chain());
        assert!(!unknown.is_user_rejection());
    }
}

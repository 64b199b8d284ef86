use alloy_primitives::{Address, TxHash, U256};

use crate::{checkin::CheckInBlocked, mint::MintBlocked, provider::ProviderError};

/// Classified, user-displayable failure of a wallet, chain, or attestation
/// operation.
///
/// Every error is terminal for the attempt that produced it; nothing in this
/// crate retries, apart from the deterministic switch-then-add-chain handshake
/// in [`NetworkGuard`](crate::network::NetworkGuard). Raw diagnostic detail is
/// preserved inside the variant whenever it is more specific than the
/// classification itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintgateError {
    /// No injected wallet provider is available.
    #[error("no wallet provider is available")]
    WalletUnavailable,

    /// The user declined the request in their wallet UI.
    #[error("the user rejected the wallet request")]
    UserRejectedRequest,

    /// `wallet_switchEthereumChain` failed for a reason other than the chain
    /// being unknown to the wallet.
    #[error("failed to switch the wallet to chain {chain_id}: {reason}")]
    NetworkSwitchFailed { chain_id: u64, reason: String },

    /// `wallet_addEthereumChain` failed after the switch reported an
    /// unrecognized chain.
    #[error("failed to register chain {chain_id} with the wallet: {reason}")]
    ChainRegistrationFailed { chain_id: u64, reason: String },

    /// No contract code exists at the configured address on the active chain.
    #[error("no contract is deployed at {address} on the active chain")]
    ContractUnavailable { address: Address },

    /// The contract's read-only pre-flight rejected the check-in arguments.
    /// The real transaction was never sent.
    #[error("check-in rejected by pre-flight (code {code}): {message}")]
    ValidationFailed { code: u8, message: String },

    /// The attestation timestamp falls outside the freshness window.
    #[error("attestation is {skew}s out of date (limit {limit}s)")]
    StaleAttestation { skew: u64, limit: u64 },

    /// The attestation response is missing a field or carries a field that
    /// cannot be decoded.
    #[error("malformed attestation: {0}")]
    MalformedAttestation(String),

    /// The user's native balance is below the contract-required minimum.
    #[error("balance {available} wei is below the required minimum {required} wei")]
    InsufficientBalance { required: U256, available: U256 },

    /// The submitted transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHash },

    /// The attestation service could not be reached or returned a failure.
    #[error("attestation service request failed: {0}")]
    ServerError(String),

    /// The wallet session (address or chain) changed while the operation was
    /// in flight; the stale result was discarded.
    #[error("the wallet session changed while the operation was in flight")]
    SessionInvalidated,

    /// Another attempt is already running on this orchestrator.
    #[error("another attempt is already in flight")]
    AttemptInFlight,

    /// Check-in is blocked by the current snapshot state.
    #[error("check-in is not available: {0}")]
    CheckInUnavailable(CheckInBlocked),

    /// Minting is blocked by the current snapshot state.
    #[error("minting is not available: {0}")]
    MintUnavailable(MintBlocked),

    /// A read against the chain RPC failed.
    #[error("chain RPC request failed: {0}")]
    Rpc(String),

    /// A wallet provider call failed outside the classifications above.
    #[error(transparent)]
    Provider(ProviderError),
}

impl MintgateError {
    /// Classifies a raw provider failure, folding EIP-1193 user rejections
    /// into [`Self::UserRejectedRequest`].
    pub fn from_wallet(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejectedRequest
        } else if matches!(err, ProviderError::Unavailable) {
            Self::WalletUnavailable
        } else {
            Self::Provider(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_rejection_is_classified() {
        let err = MintgateError::from_wallet(ProviderError::Rpc {
            code: 4001,
            message: "User rejected the request.".into(),
        });
        assert_eq!(err, MintgateError::UserRejectedRequest);
    }

    #[test]
    fn missing_provider_is_classified() {
        let err = MintgateError::from_wallet(ProviderError::Unavailable);
        assert_eq!(err, MintgateError::WalletUnavailable);
    }

    #[test]
    fn other_rpc_errors_keep_their_detail() {
        let err = MintgateError::from_wallet(ProviderError::Rpc {
            code: -32603,
            message: "internal error".into(),
        });
        assert!(err.to_string().contains("internal error"));
    }
}

//! Chain enforcement before risky operations.
//!
//! [`NetworkGuard`] makes sure the wallet sits on the required chain before a
//! connect or a state-changing submission. If the wallet does not know the
//! chain it falls back to registering it with full metadata — a single
//! deterministic two-step handshake, never a retry loop.

use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::MintgateError,
    provider::{ProviderError, WalletProvider},
};

/// Full chain metadata, shaped as the `wallet_addEthereumChain` request
/// parameter ([EIP-3085](https://eips.ethereum.org/EIPS/eip-3085)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// The chain id, serialized as a hex quantity string (`"0x38"`).
    #[serde(with = "hex_chain_id")]
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Where the wallet currently stands relative to the required chain.
///
/// `CorrectChain` is re-validated before every risky write, never cached
/// across writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    /// The active chain could not be determined.
    Unknown,
    WrongChain,
    CorrectChain,
}

/// Verifies and, with user approval, forces the wallet onto the required
/// chain.
#[derive(Debug, Clone)]
pub struct NetworkGuard {
    descriptor: ChainDescriptor,
}

impl NetworkGuard {
    pub fn new(descriptor: ChainDescriptor) -> Self {
        Self { descriptor }
    }

    /// The chain this guard enforces.
    pub fn required_chain(&self) -> ChainId {
        self.descriptor.chain_id
    }

    /// Queries the wallet's active chain without prompting.
    pub async fn status<W: WalletProvider + ?Sized>(&self, wallet: &W) -> ChainStatus {
        match wallet.chain_id().await {
            Ok(id) if id == self.descriptor.chain_id => ChainStatus::CorrectChain,
            Ok(_) => ChainStatus::WrongChain,
            Err(err) => {
                warn!(%err, "failed to query wallet chain id");
                ChainStatus::Unknown
            }
        }
    }

    /// Ensures the wallet is on the required chain.
    ///
    /// Algorithm: ask the wallet to switch; if it reports the chain as
    /// unrecognized, register it via `wallet_addEthereumChain` (which also
    /// switches on success). At most one add-then-retry per call. Any other
    /// switch failure surfaces as [`MintgateError::NetworkSwitchFailed`].
    pub async fn ensure_chain<W: WalletProvider + ?Sized>(
        &self,
        wallet: &W,
    ) -> Result<(), MintgateError> {
        let target = self.descriptor.chain_id;
        if let Ok(current) = wallet.chain_id().await {
            if current == target {
                return Ok(());
            }
        }

        match wallet.switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unrecognized_chain() => {
                debug!(chain_id = target, "chain unknown to wallet, registering");
                self.register_chain(wallet).await
            }
            Err(err) if err.is_user_rejection() => Err(MintgateError::UserRejectedRequest),
            Err(ProviderError::Unavailable) => Err(MintgateError::WalletUnavailable),
            Err(err) => Err(MintgateError::NetworkSwitchFailed {
                chain_id: target,
                reason: err.to_string(),
            }),
        }
    }

    async fn register_chain<W: WalletProvider + ?Sized>(
        &self,
        wallet: &W,
    ) -> Result<(), MintgateError> {
        match wallet.add_chain(&self.descriptor).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_user_rejection() => Err(MintgateError::UserRejectedRequest),
            Err(err) => Err(MintgateError::ChainRegistrationFailed {
                chain_id: self.descriptor.chain_id,
                reason: err.to_string(),
            }),
        }
    }
}

mod hex_chain_id {
    use alloy_primitives::ChainId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ChainId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{id:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChainId, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(id) => Ok(id),
            Raw::Str(s) => {
                crate::provider::parse_chain_id(&s).map_err(serde::de::Error::custom)
            }
        }
    }
}

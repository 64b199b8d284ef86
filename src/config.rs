//! Client configuration.

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};

use crate::network::{ChainDescriptor, NativeCurrency};

/// Seconds either side of "now" within which an attestation timestamp is
/// accepted.
pub const DEFAULT_ATTESTATION_MAX_SKEW: u64 = 300;

/// Everything the client stack needs to know about one deployment: the
/// required chain, the gated contract, the attestation service, and the gas
/// overrides for the two state-changing calls.
///
/// The gas limits are explicit because the check-in pre-flight is a view call
/// and does not yield a representative estimate for the real submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The chain all reads and writes are bound to.
    pub chain: ChainDescriptor,
    /// Address of the gated NFT contract.
    pub contract_address: Address,
    /// Base URL of the attestation endpoint, queried as `?address=<addr>`.
    pub attestation_url: String,
    /// Gas limit override for `checkIn`.
    pub check_in_gas_limit: u64,
    /// Gas limit override for `mint`.
    pub mint_gas_limit: u64,
    /// Attestation freshness window in seconds.
    pub attestation_max_skew: u64,
    /// Public mint price used when the contract does not expose one.
    pub fallback_mint_price_wei: U256,
}

impl ClientConfig {
    /// The BNB Smart Chain deployment profile.
    pub fn bsc() -> Self {
        Self {
            chain: ChainDescriptor {
                chain_id: 56,
                chain_name: "BNB Smart Chain".into(),
                native_currency: NativeCurrency {
                    name: "BNB".into(),
                    symbol: "BNB".into(),
                    decimals: 18,
                },
                rpc_urls: vec!["https://bsc-dataseed.binance.org/".into()],
                block_explorer_urls: vec!["https://bscscan.com".into()],
            },
            contract_address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            attestation_url: "https://attest.example.org/api/checkin".into(),
            check_in_gas_limit: 300_000,
            mint_gas_limit: 500_000,
            attestation_max_skew: DEFAULT_ATTESTATION_MAX_SKEW,
            // 0.015 BNB
            fallback_mint_price_wei: U256::from(15_000_000_000_000_000u64),
        }
    }

    /// The chain id this deployment requires.
    pub fn required_chain(&self) -> u64 {
        self.chain.chain_id
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::bsc()
    }
}

//! Contract ABI bindings and the chain read/write capability.
//!
//! All node-backed access goes through [`ChainClient`], injected once and
//! mockable in tests. The real implementation, [`NodeChainClient`], wraps an
//! alloy [`Provider`] and the `sol!`-generated bindings; the wallet never
//! appears here — state-changing calls are encoded to calldata by the
//! orchestrators and submitted through the injected wallet, which signs and
//! sends in one step.

use std::time::Duration;

use alloy_primitives::{Address, TxHash, TxKind, U256};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_sol_types::sol;
use async_trait::async_trait;
use tracing::trace;

use crate::{attestation::Attestation, error::MintgateError};

sol! {
    #[sol(rpc)]
    interface IGatedNft {
        function isWhitelisted(address account) external view returns (bool);
        function hasMinted(address owner) external view returns (bool);
        function getMintedCountByAddress(address owner) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function mintPrice() external view returns (uint256);
        function mintedCount() external view returns (uint256);
        function MAX_SUPPLY() external view returns (uint256);
        function mintingEnabled() external view returns (bool);
        function mintStartTimestamp() external view returns (uint256);
        function isCheckInPeriodActive() external view returns (bool);
        function startDate() external view returns (uint256);
        function endDate() external view returns (uint256);
        function minBnbBalance() external view returns (uint256);
        function getUserCheckInStatus(address account)
            external
            view
            returns (uint256 lastCheckIn, uint256 totalCheckIns, bool checkedInToday);
        function hasCheckedInToday(address account) external view returns (bool);
        function testCheckIn(string identityHash, uint256 timestamp, bytes signature)
            external
            view
            returns (uint8 errorCode, string errorMessage);

        function mint(address to) external payable;
        function checkIn(string identityHash, uint256 timestamp, bytes signature) external;
    }
}

/// Result of the contract's read-only check-in pre-flight (`testCheckIn`).
/// A nonzero `code` means the real transaction would revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunOutcome {
    pub code: u8,
    pub message: String,
}

impl DryRunOutcome {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Per-user check-in state as reported by `getUserCheckInStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserCheckInStatus {
    pub last_check_in: u64,
    pub total_check_ins: u64,
    pub checked_in_today: bool,
}

/// The node-backed read batch and confirmation wait.
///
/// Polymorphic over the real provider and deterministic test doubles; the
/// whole reader/orchestrator stack only sees this trait.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Whether contract code exists at the configured address.
    async fn contract_deployed(&self) -> Result<bool, MintgateError>;

    async fn is_whitelisted(&self, account: Address) -> Result<bool, MintgateError>;
    async fn has_minted(&self, account: Address) -> Result<bool, MintgateError>;
    async fn minted_count(&self) -> Result<U256, MintgateError>;
    async fn max_supply(&self) -> Result<U256, MintgateError>;
    async fn mint_price(&self) -> Result<U256, MintgateError>;
    async fn minting_enabled(&self) -> Result<bool, MintgateError>;
    async fn mint_start_timestamp(&self) -> Result<u64, MintgateError>;

    async fn check_in_period_active(&self) -> Result<bool, MintgateError>;
    /// `(startDate, endDate)` of the check-in period, unix seconds.
    async fn check_in_window(&self) -> Result<(u64, u64), MintgateError>;
    async fn min_balance(&self) -> Result<U256, MintgateError>;
    /// Native-currency balance of `account`.
    async fn native_balance(&self, account: Address) -> Result<U256, MintgateError>;
    async fn user_check_in_status(
        &self,
        account: Address,
    ) -> Result<UserCheckInStatus, MintgateError>;
    async fn has_checked_in_today(&self, account: Address) -> Result<bool, MintgateError>;

    /// Runs the contract's read-only check-in validation with the exact
    /// arguments the real transaction would carry, from `account`.
    async fn test_check_in(
        &self,
        account: Address,
        attestation: &Attestation,
    ) -> Result<DryRunOutcome, MintgateError>;

    /// Waits for one confirmation of `tx_hash` and returns its success
    /// status.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<bool, MintgateError>;
}

/// Builds the `eth_sendTransaction` request for a contract call submitted
/// through the wallet.
///
/// The gas limit is always set explicitly: the check-in pre-flight is a view
/// call and yields no representative estimate.
pub(crate) fn call_request(
    from: Address,
    to: Address,
    calldata: Vec<u8>,
    value: U256,
    gas_limit: u64,
) -> TransactionRequest {
    TransactionRequest {
        from: Some(from),
        to: Some(TxKind::Call(to)),
        value: Some(value),
        gas: Some(gas_limit),
        input: TransactionInput::new(calldata.into()),
        ..Default::default()
    }
}

/// [`ChainClient`] implementation backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct NodeChainClient<P> {
    provider: P,
    address: Address,
    receipt_poll_interval: Duration,
}

impl<P: Provider> NodeChainClient<P> {
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address, receipt_poll_interval: Duration::from_secs(3) }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    fn contract(&self) -> IGatedNft::IGatedNftInstance<&P> {
        IGatedNft::new(self.address, &self.provider)
    }
}

fn rpc_err(err: impl std::fmt::Display) -> MintgateError {
    MintgateError::Rpc(err.to_string())
}

fn to_u64(value: U256) -> u64 {
    value.saturating_to()
}

#[async_trait]
impl<P: Provider> ChainClient for NodeChainClient<P> {
    async fn contract_deployed(&self) -> Result<bool, MintgateError> {
        let code = self.provider.get_code_at(self.address).await.map_err(rpc_err)?;
        Ok(!code.is_empty())
    }

    async fn is_whitelisted(&self, account: Address) -> Result<bool, MintgateError> {
        self.contract().isWhitelisted(account).call().await.map_err(rpc_err)
    }

    async fn has_minted(&self, account: Address) -> Result<bool, MintgateError> {
        self.contract().hasMinted(account).call().await.map_err(rpc_err)
    }

    async fn minted_count(&self) -> Result<U256, MintgateError> {
        self.contract().mintedCount().call().await.map_err(rpc_err)
    }

    async fn max_supply(&self) -> Result<U256, MintgateError> {
        self.contract().MAX_SUPPLY().call().await.map_err(rpc_err)
    }

    async fn mint_price(&self) -> Result<U256, MintgateError> {
        self.contract().mintPrice().call().await.map_err(rpc_err)
    }

    async fn minting_enabled(&self) -> Result<bool, MintgateError> {
        self.contract().mintingEnabled().call().await.map_err(rpc_err)
    }

    async fn mint_start_timestamp(&self) -> Result<u64, MintgateError> {
        self.contract().mintStartTimestamp().call().await.map(to_u64).map_err(rpc_err)
    }

    async fn check_in_period_active(&self) -> Result<bool, MintgateError> {
        self.contract().isCheckInPeriodActive().call().await.map_err(rpc_err)
    }

    async fn check_in_window(&self) -> Result<(u64, u64), MintgateError> {
        let start = self.contract().startDate().call().await.map_err(rpc_err)?;
        let end = self.contract().endDate().call().await.map_err(rpc_err)?;
        Ok((to_u64(start), to_u64(end)))
    }

    async fn min_balance(&self) -> Result<U256, MintgateError> {
        self.contract().minBnbBalance().call().await.map_err(rpc_err)
    }

    async fn native_balance(&self, account: Address) -> Result<U256, MintgateError> {
        self.provider.get_balance(account).await.map_err(rpc_err)
    }

    async fn user_check_in_status(
        &self,
        account: Address,
    ) -> Result<UserCheckInStatus, MintgateError> {
        let status =
            self.contract().getUserCheckInStatus(account).call().await.map_err(rpc_err)?;
        Ok(UserCheckInStatus {
            last_check_in: to_u64(status.lastCheckIn),
            total_check_ins: to_u64(status.totalCheckIns),
            checked_in_today: status.checkedInToday,
        })
    }

    async fn has_checked_in_today(&self, account: Address) -> Result<bool, MintgateError> {
        self.contract().hasCheckedInToday(account).call().await.map_err(rpc_err)
    }

    async fn test_check_in(
        &self,
        account: Address,
        attestation: &Attestation,
    ) -> Result<DryRunOutcome, MintgateError> {
        let outcome = self
            .contract()
            .testCheckIn(
                attestation.identity_hash.clone(),
                U256::from(attestation.timestamp),
                attestation.signature.clone(),
            )
            .from(account)
            .call()
            .await
            .map_err(rpc_err)?;
        Ok(DryRunOutcome { code: outcome.errorCode, message: outcome.errorMessage })
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<bool, MintgateError> {
        loop {
            if let Some(receipt) =
                self.provider.get_transaction_receipt(tx_hash).await.map_err(rpc_err)?
            {
                trace!(%tx_hash, status = receipt.status(), "transaction confirmed");
                return Ok(receipt.status());
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

/// Encodes the `checkIn` calldata from an attestation. The same byte encoding
/// the pre-flight validated is submitted verbatim.
pub(crate) fn check_in_calldata(attestation: &Attestation) -> Vec<u8> {
    use alloy_sol_types::SolCall;
    IGatedNft::checkInCall {
        identityHash: attestation.identity_hash.clone(),
        timestamp: U256::from(attestation.timestamp),
        signature: attestation.signature.clone(),
    }
    .abi_encode()
}

/// Encodes the `mint(to)` calldata.
pub(crate) fn mint_calldata(to: Address) -> Vec<u8> {
    use alloy_sol_types::SolCall;
    IGatedNft::mintCall { to }.abi_encode()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Bytes};
    use alloy_sol_types::SolCall;

    use super::*;

    #[test]
    fn check_in_calldata_round_trips() {
        let attestation = Attestation {
            identity_hash: "0xdeadbeef".into(),
            timestamp: 1_700_000_000,
            signature: Bytes::from(vec![0x01, 0x02, 0x03]),
        };
        let calldata = check_in_calldata(&attestation);
        let decoded = IGatedNft::checkInCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.identityHash, attestation.identity_hash);
        assert_eq!(decoded.timestamp, U256::from(attestation.timestamp));
        assert_eq!(decoded.signature, attestation.signature);
    }

    #[test]
    fn call_request_sets_explicit_gas_and_value() {
        let from = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let to = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let req = call_request(from, to, mint_calldata(from), U256::from(7u64), 500_000);
        assert_eq!(req.from, Some(from));
        assert_eq!(req.to, Some(TxKind::Call(to)));
        assert_eq!(req.gas, Some(500_000));
        assert_eq!(req.value, Some(U256::from(7u64)));
        assert!(req.input.input().is_some());
    }
}

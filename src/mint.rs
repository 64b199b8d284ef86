//! The one-time mint orchestrator.
//!
//! Display-time readiness is a pure function of the snapshot; submission-time
//! truth is re-read from the contract immediately before the transaction is
//! built, because price, supply, and whitelist status can all change between
//! display and submission.

use std::fmt;

use alloy_primitives::{TxHash, U256};
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::{
    attempt::{ActionAttempt, AttemptPhase},
    contract::{self, ChainClient},
    error::MintgateError,
    provider::WalletProvider,
    session::{Generation, SessionSynchronizer},
    snapshot::ChainSnapshot,
    utils::unix_now,
};

/// Why the mint cannot be attempted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintBlocked {
    NotConnected,
    WrongChain,
    ContractUnavailable,
    AlreadyMinted,
    SoldOut,
    MintingDisabled,
    NotYetStarted,
}

impl fmt::Display for MintBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotConnected => "wallet is not connected",
            Self::WrongChain => "wallet is on the wrong chain",
            Self::ContractUnavailable => "contract is not available",
            Self::AlreadyMinted => "this address has already minted",
            Self::SoldOut => "sold out",
            Self::MintingDisabled => "minting is disabled",
            Self::NotYetStarted => "minting has not started yet",
        };
        f.write_str(reason)
    }
}

/// Pure readiness predicate over the current snapshot.
///
/// `false` whenever the user already minted, the contract is missing, the
/// chain is wrong, the supply cap is reached, minting is disabled, or a
/// nonzero start time lies in the future.
pub fn mint_readiness(snapshot: &ChainSnapshot, now: u64) -> Result<(), MintBlocked> {
    if !snapshot.is_correct_chain {
        return Err(MintBlocked::WrongChain);
    }
    if !snapshot.is_contract_available {
        return Err(MintBlocked::ContractUnavailable);
    }
    if snapshot.has_minted {
        return Err(MintBlocked::AlreadyMinted);
    }
    if snapshot.is_sold_out() {
        return Err(MintBlocked::SoldOut);
    }
    if !snapshot.minting_enabled {
        return Err(MintBlocked::MintingDisabled);
    }
    if snapshot.mint_start_timestamp != 0 && now < snapshot.mint_start_timestamp {
        return Err(MintBlocked::NotYetStarted);
    }
    Ok(())
}

/// Convenience boolean form of [`mint_readiness`].
pub fn is_minting_available(snapshot: &ChainSnapshot, now: u64) -> bool {
    mint_readiness(snapshot, now).is_ok()
}

/// Runs the one-time mint protocol.
pub struct MintOrchestrator<C, W: ?Sized> {
    session: SessionSynchronizer<C, W>,
    attempt: Mutex<ActionAttempt>,
}

impl<C, W> MintOrchestrator<C, W>
where
    C: ChainClient,
    W: WalletProvider + ?Sized,
{
    pub fn new(session: SessionSynchronizer<C, W>) -> Self {
        Self { session, attempt: Mutex::new(ActionAttempt::default()) }
    }

    /// The current attempt phase and error, for display.
    pub fn attempt(&self) -> ActionAttempt {
        self.attempt.lock().clone()
    }

    /// Runs one complete mint attempt.
    #[instrument(skip(self), name = "mint")]
    pub async fn run(&self) -> Result<TxHash, MintgateError> {
        self.attempt.lock().begin()?;
        match self.execute().await {
            Ok(hash) => {
                self.attempt.lock().succeed();
                Ok(hash)
            }
            Err(err) => {
                self.attempt.lock().fail(err.clone());
                Err(err)
            }
        }
    }

    async fn execute(&self) -> Result<TxHash, MintgateError> {
        let session = self.session.session();
        let snapshot = self.session.snapshot();
        let origin = session.generation;

        let Some(address) = session.address else {
            return Err(MintgateError::MintUnavailable(MintBlocked::NotConnected));
        };
        match mint_readiness(&snapshot, unix_now()) {
            Ok(()) => {}
            Err(MintBlocked::ContractUnavailable) => {
                return Err(MintgateError::ContractUnavailable {
                    address: self.session.config().contract_address,
                });
            }
            Err(blocked) => return Err(MintgateError::MintUnavailable(blocked)),
        }

        // Submission-time truth: the snapshot may be seconds or minutes old,
        // so every gate and the price are read fresh and the attempt aborts
        // with the specific reason if anything changed.
        self.advance(AttemptPhase::DryRun);
        let client = self.session.client();
        let (enabled, start, minted, supply, price, whitelisted) = tokio::join!(
            client.minting_enabled(),
            client.mint_start_timestamp(),
            client.minted_count(),
            client.max_supply(),
            client.mint_price(),
            client.is_whitelisted(address),
        );
        let enabled = enabled?;
        let start = start?;
        let minted = minted?;
        let supply = supply?;
        let price = price?;
        let whitelisted = whitelisted?;

        if !enabled {
            return Err(MintgateError::MintUnavailable(MintBlocked::MintingDisabled));
        }
        if minted >= supply {
            return Err(MintgateError::MintUnavailable(MintBlocked::SoldOut));
        }
        if start != 0 && unix_now() < start {
            return Err(MintgateError::MintUnavailable(MintBlocked::NotYetStarted));
        }
        let value = if whitelisted { U256::ZERO } else { price };
        debug!(%value, whitelisted, "mint price resolved at submission time");

        self.guard_generation(origin)?;
        self.session.network().ensure_chain(&**self.session.wallet()).await?;

        self.advance(AttemptPhase::AwaitingSignature);
        let config = self.session.config();
        let tx = contract::call_request(
            address,
            config.contract_address,
            contract::mint_calldata(address),
            value,
            config.mint_gas_limit,
        );
        let tx_hash = self
            .session
            .wallet()
            .send_transaction(tx)
            .await
            .map_err(MintgateError::from_wallet)?;

        self.advance(AttemptPhase::AwaitingConfirmation);
        let confirmed = self.session.client().wait_for_confirmation(tx_hash).await?;
        if !confirmed {
            return Err(MintgateError::TransactionReverted { tx_hash });
        }
        self.guard_generation(origin)?;

        // Authoritative mint/whitelist/balance state comes from the chain.
        self.session.refresh().await;
        Ok(tx_hash)
    }

    fn advance(&self, phase: AttemptPhase) {
        self.attempt.lock().advance(phase);
    }

    fn guard_generation(&self, origin: Generation) -> Result<(), MintgateError> {
        if self.session.session().generation != origin {
            return Err(MintgateError::SessionInvalidated);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn mintable_snapshot() -> ChainSnapshot {
        let mut snap = ChainSnapshot::default();
        snap.is_correct_chain = true;
        snap.is_contract_available = true;
        snap.minting_enabled = true;
        snap.minted_count = 10;
        snap.max_supply = 100;
        snap.mint_start_timestamp = 0;
        snap
    }

    #[test]
    fn mintable_snapshot_is_available() {
        assert!(is_minting_available(&mintable_snapshot(), NOW));
    }

    #[test]
    fn already_minted_blocks() {
        let mut snap = mintable_snapshot();
        snap.has_minted = true;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::AlreadyMinted));
    }

    #[test]
    fn sold_out_blocks_regardless_of_enablement_and_start() {
        let mut snap = mintable_snapshot();
        snap.minted_count = snap.max_supply;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::SoldOut));

        // still sold out with minting disabled or a future start
        snap.minting_enabled = false;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::SoldOut));
        snap.mint_start_timestamp = NOW + 1_000;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::SoldOut));
    }

    #[test]
    fn disabled_minting_blocks() {
        let mut snap = mintable_snapshot();
        snap.minting_enabled = false;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::MintingDisabled));
    }

    #[test]
    fn future_start_blocks_until_reached() {
        let mut snap = mintable_snapshot();
        snap.mint_start_timestamp = NOW + 60;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::NotYetStarted));
        assert!(is_minting_available(&snap, NOW + 60));
        assert!(is_minting_available(&snap, NOW + 61));
    }

    #[test]
    fn zero_start_means_no_schedule_gate() {
        let mut snap = mintable_snapshot();
        snap.mint_start_timestamp = 0;
        assert!(is_minting_available(&snap, 0));
    }

    #[test]
    fn wrong_chain_and_missing_contract_block() {
        let mut snap = mintable_snapshot();
        snap.is_correct_chain = false;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::WrongChain));

        let mut snap = mintable_snapshot();
        snap.is_contract_available = false;
        assert_eq!(mint_readiness(&snap, NOW), Err(MintBlocked::ContractUnavailable));
    }
}

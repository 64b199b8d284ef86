//! The check-in orchestrator: validate → dry-run → commit → reconcile.
//!
//! The dry run is a contractual pre-flight defined by the contract itself
//! (`testCheckIn`), not a generic gas estimate: a reverted state-changing call
//! still costs the user gas, so nothing is submitted that the contract has
//! already said would fail. The commit then carries the exact arguments the
//! pre-flight validated, plus an explicit gas-limit override.

use std::{fmt, sync::Arc};

use alloy_primitives::TxHash;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::{
    attempt::{ActionAttempt, AttemptPhase},
    attestation::AttestationSource,
    contract::{self, ChainClient},
    error::MintgateError,
    provider::WalletProvider,
    session::{Generation, SessionSynchronizer},
    snapshot::ChainSnapshot,
    utils::unix_now,
};

/// Why a check-in cannot be attempted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInBlocked {
    NotConnected,
    WrongChain,
    ContractUnavailable,
    PeriodInactive,
    AlreadyCheckedIn,
    BelowMinimumBalance,
}

impl fmt::Display for CheckInBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotConnected => "wallet is not connected",
            Self::WrongChain => "wallet is on the wrong chain",
            Self::ContractUnavailable => "contract is not available",
            Self::PeriodInactive => "check-in period is not active",
            Self::AlreadyCheckedIn => "already checked in today",
            Self::BelowMinimumBalance => "balance is below the required minimum",
        };
        f.write_str(reason)
    }
}

/// Pure entry guard over the current snapshot. Never contacts the network.
pub fn check_in_readiness(snapshot: &ChainSnapshot) -> Result<(), CheckInBlocked> {
    if !snapshot.is_correct_chain {
        return Err(CheckInBlocked::WrongChain);
    }
    if !snapshot.is_contract_available {
        return Err(CheckInBlocked::ContractUnavailable);
    }
    if !snapshot.check_in_period_active {
        return Err(CheckInBlocked::PeriodInactive);
    }
    if snapshot.has_checked_in_today {
        return Err(CheckInBlocked::AlreadyCheckedIn);
    }
    if snapshot.user_balance_wei < snapshot.min_balance_wei {
        return Err(CheckInBlocked::BelowMinimumBalance);
    }
    Ok(())
}

/// Runs the recurring check-in protocol against the session owned by a
/// [`SessionSynchronizer`].
pub struct CheckInOrchestrator<C, W: ?Sized, A: ?Sized> {
    session: SessionSynchronizer<C, W>,
    attestations: Arc<A>,
    attempt: Mutex<ActionAttempt>,
}

impl<C, W, A> CheckInOrchestrator<C, W, A>
where
    C: ChainClient,
    W: WalletProvider + ?Sized,
    A: AttestationSource + ?Sized,
{
    pub fn new(session: SessionSynchronizer<C, W>, attestations: Arc<A>) -> Self {
        Self { session, attestations, attempt: Mutex::new(ActionAttempt::default()) }
    }

    /// The current attempt phase and error, for display.
    pub fn attempt(&self) -> ActionAttempt {
        self.attempt.lock().clone()
    }

    /// Runs one complete check-in attempt.
    ///
    /// Exactly one attempt may be in flight at a time; a second call while
    /// one is running fails with [`MintgateError::AttemptInFlight`]. All
    /// failures are terminal for the attempt — nothing is retried.
    #[instrument(skip(self), name = "check_in")]
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

        // Entry guards: reject without contacting the network.
        let Some(address) = session.address else {
            return Err(MintgateError::CheckInUnavailable(CheckInBlocked::NotConnected));
        };
        match check_in_readiness(&snapshot) {
            Ok(()) => {}
            Err(CheckInBlocked::ContractUnavailable) => {
                return Err(MintgateError::ContractUnavailable {
                    address: self.session.config().contract_address,
                });
            }
            Err(CheckInBlocked::BelowMinimumBalance) => {
                return Err(MintgateError::InsufficientBalance {
                    required: snapshot.min_balance_wei,
                    available: snapshot.user_balance_wei,
                });
            }
            Err(blocked) => return Err(MintgateError::CheckInUnavailable(blocked)),
        }

        // Dry run: fresh attestation, then the contract's own pre-flight.
        self.advance(AttemptPhase::DryRun);
        let attestation = self.attestations.fetch(address).await?;
        attestation.ensure_fresh(unix_now(), self.session.config().attestation_max_skew)?;

        let outcome = self.session.client().test_check_in(address, &attestation).await?;
        if !outcome.is_ok() {
            debug!(code = outcome.code, message = %outcome.message, "pre-flight rejected check-in");
            return Err(MintgateError::ValidationFailed {
                code: outcome.code,
                message: outcome.message,
            });
        }
        self.guard_generation(origin)?;

        // Chain correctness is re-validated, never cached, before the write.
        self.session.network().ensure_chain(&**self.session.wallet()).await?;

        self.advance(AttemptPhase::AwaitingSignature);
        let config = self.session.config();
        let tx = contract::call_request(
            address,
            config.contract_address,
            contract::check_in_calldata(&attestation),
            alloy_primitives::U256::ZERO,
            config.check_in_gas_limit,
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

        // Authoritative reconciliation: any locally projected counter is a
        // display nicety; the chain is re-read after every success.
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

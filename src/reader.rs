//! Batched on-chain reads producing a consistent [`ChainSnapshot`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    contract::ChainClient,
    session::WalletSession,
    snapshot::ChainSnapshot,
};

/// Runs the full read batch for one (address, chain, generation) triple.
///
/// A pass is tagged with the session generation at call start; the caller is
/// responsible for dropping the result if the generation has advanced by
/// completion time. Reads run concurrently, so a pass from an old session can
/// finish after a newer one was issued — the tag is what keeps the late
/// result inert.
#[derive(Debug, Clone)]
pub struct ChainStateReader<C> {
    client: Arc<C>,
    config: Arc<ClientConfig>,
}

impl<C: ChainClient> ChainStateReader<C> {
    pub fn new(client: Arc<C>, config: Arc<ClientConfig>) -> Self {
        Self { client, config }
    }

    /// Produces a snapshot for the given session view.
    ///
    /// Wrong chain, a disconnected session, or a missing contract all yield a
    /// snapshot with every contract-derived field at its safe default and
    /// `is_contract_available = false`; individual optional reads that fail
    /// fall back per-field instead of failing the batch.
    pub async fn refresh(&self, session: &WalletSession) -> ChainSnapshot {
        let generation = session.generation;
        let mut snapshot = ChainSnapshot::cleared(generation);

        let Some(address) = session.address else {
            return snapshot;
        };
        if session.chain_id != self.config.required_chain() {
            debug!(
                chain_id = session.chain_id,
                required = self.config.required_chain(),
                "wrong chain, producing safe-default snapshot"
            );
            return snapshot;
        }
        snapshot.is_correct_chain = true;

        // The code probe is the one required read: without it nothing below
        // can be trusted.
        match self.client.contract_deployed().await {
            Ok(true) => {}
            Ok(false) => {
                debug!(address = %self.config.contract_address, "no code at contract address");
                return snapshot;
            }
            Err(err) => {
                warn!(%err, "contract code probe failed");
                return snapshot;
            }
        }
        snapshot.is_contract_available = true;

        let client = &*self.client;
        let (
            whitelisted,
            has_minted,
            minted_count,
            max_supply,
            mint_price,
            minting_enabled,
            mint_start,
            period_active,
            window,
            min_balance,
            user_balance,
            check_in_status,
        ) = tokio::join!(
            client.is_whitelisted(address),
            client.has_minted(address),
            client.minted_count(),
            client.max_supply(),
            client.mint_price(),
            client.minting_enabled(),
            client.mint_start_timestamp(),
            client.check_in_period_active(),
            client.check_in_window(),
            client.min_balance(),
            client.native_balance(address),
            client.user_check_in_status(address),
        );

        snapshot.is_whitelisted = optional(whitelisted, "isWhitelisted", false);
        snapshot.has_minted = optional(has_minted, "hasMinted", false);
        snapshot.minted_count =
            optional(minted_count, "mintedCount", Default::default()).saturating_to();
        snapshot.max_supply =
            optional(max_supply, "MAX_SUPPLY", Default::default()).saturating_to();
        snapshot.mint_price_wei =
            optional(mint_price, "mintPrice", self.config.fallback_mint_price_wei);
        snapshot.minting_enabled = optional(minting_enabled, "mintingEnabled", false);
        snapshot.mint_start_timestamp = optional(mint_start, "mintStartTimestamp", 0);
        snapshot.check_in_period_active = optional(period_active, "isCheckInPeriodActive", false);
        let (start, end) = optional(window, "startDate/endDate", (0, 0));
        snapshot.check_in_start = start;
        snapshot.check_in_end = end;
        snapshot.min_balance_wei = optional(min_balance, "minBnbBalance", Default::default());
        snapshot.user_balance_wei = optional(user_balance, "balance", Default::default());

        match check_in_status {
            Ok(status) => {
                snapshot.last_check_in_timestamp = status.last_check_in;
                snapshot.total_check_ins = status.total_check_ins;
                snapshot.has_checked_in_today = status.checked_in_today;
            }
            Err(err) => {
                // The aggregated view is optional; the standalone flag is the
                // fallback that still gates the action correctly.
                debug!(%err, "getUserCheckInStatus failed, falling back to hasCheckedInToday");
                snapshot.has_checked_in_today =
                    optional(client.has_checked_in_today(address).await, "hasCheckedInToday", false);
            }
        }

        snapshot
    }
}

fn optional<T>(result: Result<T, crate::error::MintgateError>, what: &str, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, read = what, "optional read failed, using default");
            default
        }
    }
}

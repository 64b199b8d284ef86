//! The read-consistent view of on-chain state.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::session::Generation;

/// Display cap for the consecutive check-in counter.
pub const CHECK_IN_DISPLAY_CAP: u64 = 3;

/// Aggregated on-chain state for one (address, chain) pair.
///
/// Owned exclusively by the session synchronizer and replaced wholesale by a
/// completed reader pass whose [`Generation`] tag still matches the session;
/// a snapshot never mixes reads from two different (address, chain) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Session generation at the start of the reader pass that produced this
    /// snapshot.
    pub generation: Generation,
    /// Whether the wallet's active chain matched the required chain when the
    /// snapshot was taken.
    pub is_correct_chain: bool,
    /// Whether contract code exists at the configured address. `false` also
    /// covers "wrong network", in which case every contract-derived field
    /// below holds its safe default.
    pub is_contract_available: bool,

    pub is_whitelisted: bool,
    pub has_minted: bool,
    pub minted_count: u64,
    pub max_supply: u64,
    pub mint_price_wei: U256,
    pub minting_enabled: bool,
    /// Unix seconds; `0` means no scheduled start.
    pub mint_start_timestamp: u64,

    pub check_in_period_active: bool,
    pub check_in_start: u64,
    pub check_in_end: u64,
    pub min_balance_wei: U256,
    pub user_balance_wei: U256,
    pub last_check_in_timestamp: u64,
    pub total_check_ins: u64,
    pub has_checked_in_today: bool,
}

impl ChainSnapshot {
    /// The snapshot used before any read completed, and after a disconnect:
    /// every contract-derived field at its safe default.
    pub fn cleared(generation: Generation) -> Self {
        Self {
            generation,
            is_correct_chain: false,
            is_contract_available: false,
            is_whitelisted: false,
            has_minted: false,
            minted_count: 0,
            max_supply: 0,
            mint_price_wei: U256::ZERO,
            minting_enabled: false,
            mint_start_timestamp: 0,
            check_in_period_active: false,
            check_in_start: 0,
            check_in_end: 0,
            min_balance_wei: U256::ZERO,
            user_balance_wei: U256::ZERO,
            last_check_in_timestamp: 0,
            total_check_ins: 0,
            has_checked_in_today: false,
        }
    }

    /// The consecutive check-in counter as shown to the user, capped at 3.
    pub fn display_check_ins(&self) -> u64 {
        self.total_check_ins.min(CHECK_IN_DISPLAY_CAP)
    }

    /// Whether the mint is sold out.
    pub fn is_sold_out(&self) -> bool {
        self.minted_count >= self.max_supply
    }
}

impl Default for ChainSnapshot {
    fn default() -> Self {
        Self::cleared(Generation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_snapshot_has_safe_defaults() {
        let snap = ChainSnapshot::default();
        assert!(!snap.is_contract_available);
        assert!(!snap.is_correct_chain);
        assert!(!snap.minting_enabled);
        assert_eq!(snap.user_balance_wei, U256::ZERO);
        assert_eq!(snap.display_check_ins(), 0);
    }

    #[test]
    fn check_in_display_is_capped() {
        let mut snap = ChainSnapshot::default();
        snap.total_check_ins = 2;
        assert_eq!(snap.display_check_ins(), 2);
        snap.total_check_ins = 17;
        assert_eq!(snap.display_check_ins(), 3);
    }

    #[test]
    fn sold_out_includes_the_empty_collection() {
        let mut snap = ChainSnapshot::default();
        assert!(snap.is_sold_out());
        snap.max_supply = 100;
        snap.minted_count = 99;
        assert!(!snap.is_sold_out());
        snap.minted_count = 100;
        assert!(snap.is_sold_out());
    }
}

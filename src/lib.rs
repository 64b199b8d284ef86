//! # mintgate
//!
//! Wallet/chain state synchronization and gated on-chain actions for an
//! [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) wallet: a recurring
//! attested "check-in" and a one-time mint against a gated NFT contract.
//!
//! ## Architecture
//!
//! - [`SessionSynchronizer`] owns the [`WalletSession`]/[`ChainSnapshot`]
//!   pair. Wallet events flow through a single transition function; every
//!   address or chain change bumps a [`Generation`] that invalidates all
//!   in-flight reads and attempts by tag comparison — a late result from a
//!   previous account can never clobber the current account's state.
//! - [`NetworkGuard`] forces the required chain before risky operations,
//!   registering it with the wallet when unknown (one switch→add handshake,
//!   no retry loop).
//! - [`ChainStateReader`] turns a batch of read-only contract calls into a
//!   generation-tagged [`ChainSnapshot`] with per-field fault tolerance.
//! - [`CheckInOrchestrator`] and [`MintOrchestrator`] run the
//!   validate → dry-run → commit → reconcile protocol. Nothing is submitted
//!   that the contract's own read-only pre-flight has rejected, and every
//!   success is followed by an authoritative re-read.
//! - [`CountdownScheduler`] derives a mint-start countdown from snapshot
//!   fields without touching the network.
//!
//! The wallet, the chain RPC, and the attestation service are consumed
//! through capability traits ([`WalletProvider`], [`ChainClient`],
//! [`AttestationSource`]) injected once and replaceable with deterministic
//! doubles in tests.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod attempt;
pub mod attestation;
pub mod checkin;
pub mod config;
pub mod contract;
pub mod countdown;
pub mod error;
pub mod mint;
pub mod network;
pub mod provider;
pub mod reader;
pub mod session;
pub mod snapshot;

mod utils;

pub use attempt::{ActionAttempt, AttemptPhase};
pub use attestation::{decode_signature, Attestation, AttestationSource, HttpAttestationClient};
pub use checkin::{check_in_readiness, CheckInBlocked, CheckInOrchestrator};
pub use config::ClientConfig;
pub use contract::{ChainClient, DryRunOutcome, NodeChainClient, UserCheckInStatus};
pub use countdown::{countdown_to, Countdown, CountdownScheduler};
pub use error::MintgateError;
pub use mint::{is_minting_available, mint_readiness, MintBlocked, MintOrchestrator};
pub use network::{ChainDescriptor, ChainStatus, NativeCurrency, NetworkGuard};
pub use provider::{parse_chain_id, ProviderError, WalletEvent, WalletProvider};
pub use reader::ChainStateReader;
pub use session::{
    apply_event, Generation, SessionEvent, SessionSynchronizer, Transition, WalletSession,
};
pub use snapshot::ChainSnapshot;
pub use utils::unix_now;

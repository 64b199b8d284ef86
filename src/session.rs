//! Wallet session lifecycle and generation-tagged invalidation.
//!
//! [`SessionSynchronizer`] is the single owner of the
//! [`WalletSession`]/[`ChainSnapshot`] pair. Every state change flows through
//! one transition function, [`apply_event`], so the machine is deterministic
//! and unit-testable without a live provider. Address and chain changes bump
//! the session [`Generation`]; any asynchronous result tagged with an older
//! generation is discarded on arrival instead of being applied — there is no
//! explicit cancellation primitive, the tag comparison is the cancellation
//! mechanism.

use std::sync::Arc;

use alloy_primitives::{Address, ChainId};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    config::ClientConfig,
    contract::ChainClient,
    error::MintgateError,
    network::NetworkGuard,
    provider::{WalletEvent, WalletProvider},
    reader::ChainStateReader,
    snapshot::ChainSnapshot,
};

/// Monotonically increasing counter invalidating all in-flight work issued
/// before the latest session change.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

/// The wallet connection as this client sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: ChainId,
    pub connected: bool,
    pub generation: Generation,
}

impl WalletSession {
    /// The initial, disconnected session.
    pub fn disconnected() -> Self {
        Self { address: None, chain_id: 0, connected: false, generation: Generation::default() }
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Inputs to the session transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A successful connect: accounts granted and chain verified.
    Connected { address: Address, chain_id: ChainId },
    /// The wallet's `accountsChanged` event.
    AccountsChanged(Vec<Address>),
    /// The wallet's `chainChanged` event (out-of-band chain switch).
    ChainChanged(ChainId),
    /// Explicit disconnect, or the wallet's `disconnect` event.
    Disconnected,
}

/// What a transition asks the owner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Session data changed; session-dependent state must be reloaded.
    Refresh,
    /// The session ended; contract-derived state must be cleared.
    Cleared,
    /// Nothing changed.
    NoOp,
}

/// Applies one event to the session.
///
/// Any transition other than [`Transition::NoOp`] bumps the generation, which
/// invalidates every in-flight read and attempt tagged with an older value.
/// The generation stays monotonic across disconnects so that a read issued
/// before a disconnect can never match a session created after it.
pub fn apply_event(session: &mut WalletSession, event: SessionEvent) -> Transition {
    match event {
        SessionEvent::Connected { address, chain_id } => {
            session.address = Some(address);
            session.chain_id = chain_id;
            session.connected = true;
            session.generation = session.generation.next();
            Transition::Refresh
        }
        SessionEvent::AccountsChanged(accounts) => match accounts.first() {
            None => clear(session),
            Some(&address) if session.address == Some(address) => Transition::NoOp,
            Some(&address) => {
                session.address = Some(address);
                session.connected = true;
                session.generation = session.generation.next();
                Transition::Refresh
            }
        },
        SessionEvent::ChainChanged(chain_id) => {
            // Even a report of the same chain id means the wallet switched
            // out from under us at some point; in-flight reads can no longer
            // be trusted.
            session.chain_id = chain_id;
            session.generation = session.generation.next();
            Transition::Refresh
        }
        SessionEvent::Disconnected => clear(session),
    }
}

fn clear(session: &mut WalletSession) -> Transition {
    let generation = session.generation.next();
    *session = WalletSession::disconnected();
    session.generation = generation;
    Transition::Cleared
}

struct SessionState {
    session: WalletSession,
    snapshot: ChainSnapshot,
}

struct Inner<C, W: ?Sized> {
    state: Mutex<SessionState>,
    reader: ChainStateReader<C>,
    network: NetworkGuard,
    config: Arc<ClientConfig>,
    client: Arc<C>,
    wallet: Arc<W>,
}

/// Exclusive owner of the session/snapshot pair.
///
/// All other components read it and request refreshes but never mutate it
/// directly. Clones share the same state, the way
/// `BrowserWalletState`-style handles do.
pub struct SessionSynchronizer<C, W: ?Sized> {
    inner: Arc<Inner<C, W>>,
}

impl<C, W: ?Sized> Clone for SessionSynchronizer<C, W> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C, W> SessionSynchronizer<C, W>
where
    C: ChainClient,
    W: WalletProvider + ?Sized,
{
    pub fn new(wallet: Arc<W>, client: Arc<C>, config: Arc<ClientConfig>) -> Self {
        let network = NetworkGuard::new(config.chain.clone());
        let reader = ChainStateReader::new(Arc::clone(&client), Arc::clone(&config));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState {
                    session: WalletSession::disconnected(),
                    snapshot: ChainSnapshot::default(),
                }),
                reader,
                network,
                config,
                client,
                wallet,
            }),
        }
    }

    /// A copy of the current session.
    pub fn session(&self) -> WalletSession {
        self.inner.state.lock().session.clone()
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> ChainSnapshot {
        self.inner.state.lock().snapshot.clone()
    }

    pub(crate) fn wallet(&self) -> &Arc<W> {
        &self.inner.wallet
    }

    pub(crate) fn client(&self) -> &Arc<C> {
        &self.inner.client
    }

    pub(crate) fn network(&self) -> &NetworkGuard {
        &self.inner.network
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Connects the wallet: forces the required chain, requests accounts, and
    /// loads the first snapshot.
    pub async fn connect(&self) -> Result<WalletSession, MintgateError> {
        let wallet = &*self.inner.wallet;
        self.inner.network.ensure_chain(wallet).await?;

        let accounts = wallet.request_accounts().await.map_err(MintgateError::from_wallet)?;
        let Some(&address) = accounts.first() else {
            return Err(MintgateError::WalletUnavailable);
        };
        let chain_id = wallet.chain_id().await.map_err(MintgateError::from_wallet)?;

        self.dispatch(SessionEvent::Connected { address, chain_id }).await;
        Ok(self.session())
    }

    /// Restores an existing wallet authorization on startup, without
    /// prompting.
    ///
    /// Queries the already-authorized accounts (`eth_accounts`); when one
    /// exists, the session connects and the first snapshot loads. No account
    /// prompt and no chain switch are issued — a wrong chain simply yields a
    /// safe-default snapshot, and an unauthorized or unavailable wallet
    /// leaves the session disconnected.
    pub async fn resume(&self) -> Option<WalletSession> {
        let wallet = &*self.inner.wallet;
        let accounts = match wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(%err, "no session to resume");
                return None;
            }
        };
        let address = *accounts.first()?;
        let chain_id = match wallet.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                debug!(%err, "chain id probe failed during resume");
                return None;
            }
        };

        self.dispatch(SessionEvent::Connected { address, chain_id }).await;
        Some(self.session())
    }

    /// Resets the session to its disconnected value and clears the snapshot.
    pub async fn disconnect(&self) {
        self.dispatch(SessionEvent::Disconnected).await;
    }

    /// Routes one wallet event through the transition function and performs
    /// the resulting side effect.
    pub async fn handle_event(&self, event: WalletEvent) {
        let event = match event {
            WalletEvent::AccountsChanged(accounts) => SessionEvent::AccountsChanged(accounts),
            WalletEvent::ChainChanged(chain_id) => SessionEvent::ChainChanged(chain_id),
            WalletEvent::Disconnected => SessionEvent::Disconnected,
        };
        self.dispatch(event).await;
    }

    /// Consumes wallet events until the stream ends. Dropping the stream is
    /// what deregisters the subscription; the synchronizer holds no listener
    /// beyond this call.
    pub async fn run(&self, mut events: impl Stream<Item = WalletEvent> + Unpin) {
        while let Some(event) = events.next().await {
            trace!(?event, "wallet event");
            self.handle_event(event).await;
        }
        debug!("wallet event stream ended");
    }

    /// Re-reads all session-dependent chain state and applies it, unless the
    /// session changed while the reads were in flight.
    pub async fn refresh(&self) -> bool {
        let session = self.session();
        let snapshot = self.inner.reader.refresh(&session).await;
        self.apply_snapshot(snapshot)
    }

    async fn dispatch(&self, event: SessionEvent) {
        let transition = {
            let mut state = self.inner.state.lock();
            let transition = apply_event(&mut state.session, event);
            if transition == Transition::Cleared {
                state.snapshot = ChainSnapshot::cleared(state.session.generation);
            }
            transition
        };
        if transition == Transition::Refresh {
            self.refresh().await;
        }
    }

    /// Applies a completed reader pass if and only if its generation tag
    /// still matches the session. Returns whether it was applied.
    pub fn apply_snapshot(&self, snapshot: ChainSnapshot) -> bool {
        let mut state = self.inner.state.lock();
        if snapshot.generation != state.session.generation {
            debug!(
                stale = snapshot.generation.value(),
                current = state.session.generation.value(),
                "discarding stale snapshot"
            );
            return false;
        }
        state.snapshot = snapshot;
        true
    }
}

//! Mint-start countdown.
//!
//! The breakdown is a pure derivation over already-fetched snapshot fields;
//! the driver ticks once a second and never touches the network.

use std::{fmt, time::Duration};

use tracing::trace;

use crate::{snapshot::ChainSnapshot, utils::unix_now};

/// Time remaining until the mint start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No start time is scheduled (timestamp 0) or minting is disabled.
    NotScheduled,
    /// The start time has passed.
    AlreadyStarted,
    Remaining { days: u64, hours: u64, minutes: u64, seconds: u64 },
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotScheduled => f.write_str("not scheduled"),
            Self::AlreadyStarted => f.write_str("started"),
            Self::Remaining { days, hours, minutes, seconds } => {
                write!(f, "{days}d {hours:02}:{minutes:02}:{seconds:02}")
            }
        }
    }
}

/// Breaks the distance from `now` to `start` (both unix seconds) into a
/// day/hour/minute/second display.
pub fn countdown_to(start: u64, now: u64) -> Countdown {
    if start == 0 {
        return Countdown::NotScheduled;
    }
    if now >= start {
        return Countdown::AlreadyStarted;
    }
    let remaining = start - now;
    Countdown::Remaining {
        days: remaining / 86_400,
        hours: remaining % 86_400 / 3_600,
        minutes: remaining % 3_600 / 60,
        seconds: remaining % 60,
    }
}

/// Drives [`countdown_to`] on a fixed period while minting is enabled and a
/// future start time exists.
#[derive(Debug, Clone)]
pub struct CountdownScheduler {
    period: Duration,
}

impl CountdownScheduler {
    pub fn new() -> Self {
        Self { period: Duration::from_secs(1) }
    }

    pub fn with_period(period: Duration) -> Self {
        Self { period }
    }

    /// Ticks until the start time passes or minting is disabled, invoking
    /// `on_tick` with each derived value (including the terminal one), then
    /// returns — no timer outlives the countdown. `snapshot_fn` reads the
    /// already-fetched snapshot; this loop issues no network reads.
    pub async fn run<S, F>(&self, snapshot_fn: S, mut on_tick: F)
    where
        S: Fn() -> ChainSnapshot,
        F: FnMut(Countdown),
    {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            let snapshot = snapshot_fn();
            if !snapshot.minting_enabled {
                on_tick(Countdown::NotScheduled);
                return;
            }
            let countdown = countdown_to(snapshot.mint_start_timestamp, unix_now());
            trace!(%countdown, "countdown tick");
            on_tick(countdown);
            if !matches!(countdown, Countdown::Remaining { .. }) {
                return;
            }
        }
    }
}

impl Default for CountdownScheduler {
    fn default() -> Self {
        Self::new()
    }
}

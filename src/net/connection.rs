//! Exchange lifecycle tracking.
//!
//! # Responsibilities
//! - Give every proxied exchange a unique ID for tracing
//! - Follow each exchange through its phases
//!   (`Translating → Sending → {Relaying | Failed} → Done`)
//! - Count in-flight exchanges so shutdown can drain them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::resilience::timeouts;

/// Only uniqueness matters, so relaxed ordering is enough.
static EXCHANGE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one inbound request and its upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    pub fn new() -> Self {
        Self(EXCHANGE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exchange-{}", self.0)
    }
}

/// Where an exchange currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Building the outbound request (URI, headers, credentials).
    Translating,
    /// Waiting for the upstream response head.
    Sending,
    /// Copying the upstream response to the caller.
    Relaying,
    /// A classified failure is being reported.
    Failed,
    /// The caller response has been produced.
    Done,
}

impl ExchangePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangePhase::Done)
    }
}

/// Counts in-flight exchanges.
#[derive(Debug, Clone)]
pub struct ExchangeTracker {
    active: Arc<watch::Sender<u64>>,
}

impl ExchangeTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            active: Arc::new(tx),
        }
    }

    /// Register a new exchange. The count drops again when the guard does.
    pub fn track(&self) -> ExchangeGuard {
        self.active.send_modify(|n| *n += 1);
        let id = ExchangeId::new();
        tracing::trace!(exchange_id = %id, "Exchange started");
        ExchangeGuard {
            active: Arc::clone(&self.active),
            id,
            phase: ExchangePhase::Translating,
        }
    }

    pub fn active_count(&self) -> u64 {
        *self.active.borrow()
    }

    /// Wait until no exchange is in flight. Returns `false` if `limit`
    /// expired first.
    pub async fn wait_idle(&self, limit: Option<Duration>) -> bool {
        let mut rx = self.active.subscribe();
        let idle = timeouts::within(limit, rx.wait_for(|n| *n == 0)).await.is_ok();
        idle
    }
}

impl Default for ExchangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifetime of one exchange.
#[derive(Debug)]
pub struct ExchangeGuard {
    active: Arc<watch::Sender<u64>>,
    id: ExchangeId,
    phase: ExchangePhase,
}

impl ExchangeGuard {
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Move to `next`. Leaving `Done` is not possible.
    pub fn advance(&mut self, next: ExchangePhase) {
        if self.phase.is_terminal() {
            tracing::warn!(exchange_id = %self.id, to = ?next, "Exchange already finished");
            return;
        }
        tracing::trace!(exchange_id = %self.id, from = ?self.phase, to = ?next, "Exchange phase");
        self.phase = next;
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
        if self.phase.is_terminal() {
            tracing::trace!(exchange_id = %self.id, "Exchange finished");
        } else {
            // Caller went away mid-exchange; the upstream call was dropped with it.
            tracing::debug!(exchange_id = %self.id, phase = ?self.phase, "Exchange abandoned");
        }
    }
}

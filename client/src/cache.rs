//! Per-domain reconciliation of pulls and pushes
//!
//! Two uncoordinated sources feed one value. Pushes are authoritative and
//! always win. A pull may only overwrite the value if no push has been
//! accepted since the pull was issued, so a slow poll that was in flight
//! while a push arrived can never clobber the newer state.

use log::debug;
use srs_shared::RemoteError;

/// Captured when a pull is issued; compared when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullTicket {
    push_seq_at_issue: u64,
}

/// Outcome of offering an update to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Accepted and the observable value changed
    Replaced,
    /// Accepted but identical to the held value
    Unchanged,
    /// A pull overtaken by a push; discarded
    Stale,
}

impl Applied {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Applied::Stale)
    }
}

/// Last known good value of one domain
#[derive(Debug, Clone)]
pub struct DomainCache<T> {
    value: Option<T>,
    push_seq: u64,
    last_applied_seq: u64,
}

impl<T: PartialEq> DomainCache<T> {
    /// Empty cache; the first accepted pull or push fills it
    pub fn new() -> Self {
        Self {
            value: None,
            push_seq: 0,
            last_applied_seq: 0,
        }
    }

    /// `None` until the first accepted update
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Number of accepted pushes so far
    pub fn push_seq(&self) -> u64 {
        self.push_seq
    }

    /// Number of accepted updates from either source
    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    /// Records the push count at the moment a pull goes out
    ///
    /// The ticket must be handed back to [`DomainCache::on_pull_result`] or
    /// [`DomainCache::on_pull_failed`] when the pull resolves.
    pub fn begin_pull(&self) -> PullTicket {
        PullTicket {
            push_seq_at_issue: self.push_seq,
        }
    }

    /// Offers the result of a pull issued with `ticket`
    ///
    /// Returns [`Applied::Stale`] without touching the value if any push was
    /// accepted since the ticket was taken.
    pub fn on_pull_result(&mut self, ticket: PullTicket, value: T) -> Applied {
        if self.push_seq != ticket.push_seq_at_issue {
            debug!(
                "Discarding stale pull (issued at push {}, now at push {})",
                ticket.push_seq_at_issue, self.push_seq
            );
            return Applied::Stale;
        }
        self.accept(value)
    }

    /// A failed pull leaves the value untouched; reporting is the caller's job
    pub fn on_pull_failed(&self, ticket: PullTicket, error: &RemoteError) {
        debug!(
            "Pull issued at push {} failed, keeping last known value: {}",
            ticket.push_seq_at_issue, error
        );
    }

    /// Accepts a push unconditionally
    ///
    /// Every push bumps the push count, even one identical to the held value,
    /// so pulls in flight at that moment become stale.
    pub fn on_push_event(&mut self, value: T) -> Applied {
        self.push_seq += 1;
        self.accept(value)
    }

    fn accept(&mut self, value: T) -> Applied {
        self.last_applied_seq += 1;
        if self.value.as_ref() == Some(&value) {
            return Applied::Unchanged;
        }
        self.value = Some(value);
        Applied::Replaced
    }
}

impl<T: PartialEq> Default for DomainCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

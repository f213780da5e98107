//! Debounced re-sync after external document mutations.
//!
//! Only mutations from outside the projector count. Every qualifying
//! mutation restarts the window; the re-sync fires once when the window
//! runs out. Nothing partial is ever applied.

use crate::dom::{Mutation, MutationOrigin};

#[derive(Debug, Clone)]
pub struct ResyncScheduler {
    window_ms: u64,
    deadline: Option<u64>,
    coalesced: usize,
}

impl ResyncScheduler {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline: None,
            coalesced: 0,
        }
    }

    /// Feed a batch of observed mutations. Returns whether a re-sync is now pending.
    pub fn observe(&mut self, mutations: &[Mutation], now_ms: u64) -> bool {
        let external = mutations
            .iter()
            .filter(|m| m.origin == MutationOrigin::External)
            .count();
        if external > 0 {
            self.coalesced += external;
            self.deadline = Some(now_ms.saturating_add(self.window_ms));
            log::trace!("resync: {} external mutations, deadline {:?}", external, self.deadline);
        }
        self.deadline.is_some()
    }

    /// `true` exactly once, when the window has run out.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(d) if now_ms >= d => {
                log::debug!("resync: firing after {} coalesced mutations", self.coalesced);
                self.deadline = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.coalesced = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}

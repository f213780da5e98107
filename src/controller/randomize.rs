//! Randomization controller: pick a sentence, rebuild the tree, re-project.
//!
//! States are `Idle -> Randomizing -> Idle`. A call arriving while a pass is
//! in flight, or within the cool-down after the previous start, is rejected
//! with [`CoreError::ReentrancyRejected`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::clock::Cooldown;
use crate::dom::Document;
use crate::error::CoreError;
use crate::model::{SlotName, SlotTree};
use crate::projector::{DomProjector, ProjectionReport};
use crate::store::ExampleStore;
use crate::tree::build_tree;
use crate::visibility::VisibilityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomizeState {
    Idle,
    Randomizing,
}

/// Proof that a pass was admitted. Hand it back to [`RandomizationController::finish`].
#[derive(Debug)]
#[must_use]
pub struct RandomizeTicket {
    started_ms: u64,
}

impl RandomizeTicket {
    pub fn started_ms(&self) -> u64 {
        self.started_ms
    }
}

/// What a finished pass produced.
#[derive(Debug)]
pub struct RandomizeOutcome {
    pub tree: SlotTree,
    pub report: ProjectionReport,
}

pub struct RandomizationController {
    state: RandomizeState,
    rng: SmallRng,
    cooldown: Cooldown,
}

impl RandomizationController {
    pub fn new(cooldown_ms: u64) -> Self {
        Self::with_rng(SmallRng::from_entropy(), cooldown_ms)
    }

    /// Deterministic sentence choice, for tests and reproducible CLI output.
    pub fn with_seed(seed: u64, cooldown_ms: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed), cooldown_ms)
    }

    fn with_rng(rng: SmallRng, cooldown_ms: u64) -> Self {
        Self {
            state: RandomizeState::Idle,
            rng,
            cooldown: Cooldown::new(cooldown_ms),
        }
    }

    pub fn state(&self) -> RandomizeState {
        self.state
    }

    /// Enter `Randomizing`, or reject the call.
    pub fn try_begin(&mut self, now_ms: u64) -> Result<RandomizeTicket, CoreError> {
        let rejected = CoreError::ReentrancyRejected { operation: "randomize" };
        if self.state == RandomizeState::Randomizing {
            log::info!("{} (pass in flight)", rejected);
            return Err(rejected);
        }
        if !self.cooldown.admit(now_ms) {
            log::info!("{} (cooling down)", rejected);
            return Err(rejected);
        }
        self.state = RandomizeState::Randomizing;
        Ok(RandomizeTicket { started_ms: now_ms })
    }

    pub fn finish(&mut self, ticket: RandomizeTicket) {
        log::trace!("randomize pass started at {} ms finished", ticket.started_ms);
        self.state = RandomizeState::Idle;
    }

    /// Uniform choice among the distinct sentence ids, `None` when the store is empty.
    pub fn pick_sentence(&mut self, store: &ExampleStore) -> Option<String> {
        let ids = store.distinct_sentence_ids();
        if ids.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..ids.len());
        Some(ids[i].to_string())
    }

    /// Run one full pass: choose `requested` (or a random sentence), build the
    /// tree, project it, then re-apply every visibility flag.
    ///
    /// An unknown or missing sentence renders the blank tree instead of
    /// leaving the previous sentence on screen.
    #[allow(clippy::too_many_arguments)]
    pub fn randomize(
        &mut self,
        now_ms: u64,
        requested: Option<&str>,
        store: &ExampleStore,
        doc: &mut Document,
        projector: &DomProjector,
        vis: &VisibilityStore,
        expanded: Option<SlotName>,
    ) -> Result<RandomizeOutcome, CoreError> {
        let ticket = self.try_begin(now_ms)?;
        let sentence = match requested {
            Some(id) => Some(id.to_string()),
            None => self.pick_sentence(store),
        };
        let tree = match &sentence {
            Some(id) => build_tree(store.rows(), id),
            None => {
                log::warn!("randomize: example store is empty, rendering blank tree");
                SlotTree::blank(None)
            }
        };
        let report = projector.project_all(doc, &tree, vis, expanded);
        // Text writes may reset classes, so flags go on last.
        projector.apply_visibility(doc, vis);
        log::debug!(
            "randomize: sentence {:?}, {} skipped elements",
            tree.sentence_id,
            report.skipped.len()
        );
        self.finish(ticket);
        Ok(RandomizeOutcome { tree, report })
    }
}

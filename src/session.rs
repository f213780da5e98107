//! The session ties every component together for one front-end.
//!
//! It owns the example store, visibility flags, document, projector, both
//! controllers and the re-sync scheduler. Errors are logged and returned;
//! only a load failure is shown to the user, through the inline notice.

use std::rc::Rc;

use anyhow::Result as AnyResult;
use camino::Utf8Path;

use crate::collab::{NullSpeaker, Speaker};
use crate::config::EngineConfig;
use crate::controller::{
    Clock, RandomizationController, ResyncScheduler, SubslotToggleController, ToggleOutcome,
};
use crate::controls::ChannelToggleControl;
use crate::dom::{Document, Viewport, html};
use crate::error::CoreError;
use crate::model::{Channel, Row, SlotName, SlotTree};
use crate::projector::{DomProjector, ProjectionReport, naming};
use crate::store::{ContentSource, ExampleStore};
use crate::tree::build_tree;
use crate::visibility::VisibilityStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet.
    Empty,
    /// A fetch is pending; randomize and toggle are rejected meanwhile.
    Loading { preset: String },
    Ready,
}

pub struct Session {
    config: EngineConfig,
    store: ExampleStore,
    vis: VisibilityStore,
    doc: Document,
    projector: DomProjector,
    randomizer: RandomizationController,
    toggler: SubslotToggleController,
    resync: ResyncScheduler,
    clock: Rc<dyn Clock>,
    speaker: Box<dyn Speaker>,
    load_state: LoadState,
    current: Option<String>,
    notice: Option<String>,
}

impl Session {
    /// Build a session around `doc` and render the blank grid into it.
    pub fn new(
        config: EngineConfig,
        mut doc: Document,
        vis: VisibilityStore,
        clock: Rc<dyn Clock>,
    ) -> Self {
        doc.set_viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
        });
        doc.observe(true);
        let mut session = Self {
            randomizer: RandomizationController::new(config.randomize_cooldown_ms),
            toggler: SubslotToggleController::new(
                config.toggle_debounce_ms,
                config.region_edge_padding,
            ),
            resync: ResyncScheduler::new(config.resync_debounce_ms),
            config,
            store: ExampleStore::new(),
            vis,
            doc,
            projector: DomProjector::default(),
            clock,
            speaker: Box::new(NullSpeaker),
            load_state: LoadState::Empty,
            current: None,
            notice: None,
        };
        session.refresh();
        session
    }

    /// Seed sentence choice.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.randomizer = RandomizationController::with_seed(seed, self.config.randomize_cooldown_ms);
        self
    }

    pub fn with_projector(mut self, projector: DomProjector) -> Self {
        self.projector = projector;
        self.refresh();
        self
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn visibility(&self) -> &VisibilityStore {
        &self.vis
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for front-end writes. Those count as external
    /// mutations and schedule a re-sync on the next [`Session::tick`].
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn projector(&self) -> &DomProjector {
        &self.projector
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn current_sentence(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn expanded(&self) -> Option<SlotName> {
        self.toggler.expanded()
    }

    /// The inline load notice, if one is showing.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The tree of the current sentence, rebuilt from the rows.
    pub fn tree(&self) -> SlotTree {
        match &self.current {
            Some(id) => build_tree(self.store.rows(), id),
            None => SlotTree::blank(None),
        }
    }

    pub fn render_html(&self) -> String {
        html::render_html(&self.doc)
    }

    // ── loading ────────────────────────────────────────────────────────────

    /// Load a preset synchronously from `source`.
    pub fn load_preset<S: ContentSource>(
        &mut self,
        preset_id: &str,
        source: &mut S,
        path: &Utf8Path,
    ) -> Result<usize, CoreError> {
        self.begin_load(preset_id);
        let result = ExampleStore::load(source, path);
        self.complete_load(preset_id, result)
    }

    /// Mark a fetch as pending.
    pub fn begin_load(&mut self, preset_id: &str) {
        log::debug!("session: loading preset '{}'", preset_id);
        self.load_state = LoadState::Loading {
            preset: preset_id.to_string(),
        };
    }

    /// Finish a fetch started with [`Session::begin_load`].
    ///
    /// On failure the previous rows stay in place and the notice is shown.
    pub fn complete_load(
        &mut self,
        preset_id: &str,
        result: AnyResult<Vec<Row>>,
    ) -> Result<usize, CoreError> {
        match result {
            Ok(rows) => {
                let n = rows.len();
                self.store.replace(preset_id, rows);
                self.load_state = LoadState::Ready;
                self.set_notice(None);
                Ok(n)
            }
            Err(err) => {
                let err = CoreError::Load {
                    preset: preset_id.to_string(),
                    reason: format!("{:#}", err),
                };
                log::error!("{}", err);
                self.load_state = if self.store.is_empty() {
                    LoadState::Empty
                } else {
                    LoadState::Ready
                };
                self.set_notice(Some(err.to_string()));
                Err(err)
            }
        }
    }

    fn set_notice(&mut self, message: Option<String>) {
        self.projector.show_notice(&mut self.doc, message.as_deref());
        self.notice = message;
        self.settle();
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), CoreError> {
        if let LoadState::Loading { .. } = self.load_state {
            let err = CoreError::NotReady { operation };
            log::info!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    // ── randomize / toggle ─────────────────────────────────────────────────

    /// Show a randomly chosen sentence.
    pub fn randomize(&mut self) -> Result<ProjectionReport, CoreError> {
        self.run_randomize(None)
    }

    /// Show a specific sentence.
    pub fn randomize_to(&mut self, sentence_id: &str) -> Result<ProjectionReport, CoreError> {
        self.run_randomize(Some(sentence_id))
    }

    fn run_randomize(&mut self, requested: Option<&str>) -> Result<ProjectionReport, CoreError> {
        self.ensure_ready("randomize")?;
        let now = self.clock.now_ms();
        let outcome = self.randomizer.randomize(
            now,
            requested,
            &self.store,
            &mut self.doc,
            &self.projector,
            &self.vis,
            self.toggler.expanded(),
        )?;
        self.current = outcome.tree.sentence_id.clone();
        if let Some(open) = self.toggler.expanded() {
            let still_has_content = outcome
                .tree
                .slot(open)
                .map(|n| n.has_subslot_content())
                .unwrap_or(false);
            if still_has_content {
                self.toggler.reposition(&mut self.doc, &self.projector);
            } else {
                log::debug!("session: {} has no subslots in the new sentence, collapsing", open);
                self.toggler.collapse_all(&mut self.doc);
            }
        }
        self.settle();
        Ok(outcome.report)
    }

    /// Expand or collapse the subslot region of `slot`.
    pub fn toggle_subslot(&mut self, slot: SlotName) -> Result<ToggleOutcome, CoreError> {
        self.ensure_ready("toggle")?;
        let now = self.clock.now_ms();
        let tree = self.tree();
        let parent = tree.slot(slot).ok_or_else(|| CoreError::MissingElement {
            element_id: naming::slot_container_id(slot),
        })?;
        let outcome = self
            .toggler
            .toggle(now, parent, &mut self.doc, &self.projector, &self.vis)
            .inspect_err(|err| {
                if let CoreError::MissingElement { .. } = err {
                    log::warn!("toggle {}: {}", slot, err);
                }
            });
        self.settle();
        outcome
    }

    // ── visibility ─────────────────────────────────────────────────────────

    /// Persist one flag and apply it to the element right away.
    ///
    /// The flag is stored even when the element is not in the document.
    pub fn set_visibility(
        &mut self,
        element_id: &str,
        channel: Channel,
        visible: bool,
    ) -> Result<(), CoreError> {
        self.vis.set(element_id, channel, visible);
        let applied = self
            .projector
            .apply_visibility_to(&mut self.doc, &self.vis, element_id)
            .inspect_err(|err| log::warn!("set_visibility: {}", err));
        self.settle();
        applied
    }

    /// Flip one flag, returning the new visibility.
    ///
    /// On `MissingElement` the flipped flag is stored all the same.
    pub fn toggle_visibility(&mut self, element_id: &str, channel: Channel) -> Result<bool, CoreError> {
        let visible = !self.vis.get(element_id, channel);
        self.set_visibility(element_id, channel, visible)?;
        Ok(visible)
    }

    /// Reset every flag under `prefix` (empty for everything) to visible.
    pub fn show_all(&mut self, prefix: &str) -> usize {
        let n = self.vis.reset_all(prefix);
        self.projector.apply_visibility(&mut self.doc, &self.vis);
        self.settle();
        n
    }

    /// Flip a whole control and apply the result. Returns the new visibility.
    pub fn toggle_control(&mut self, control: &ChannelToggleControl) -> bool {
        let visible = control.toggle(&mut self.vis);
        self.projector.apply_visibility(&mut self.doc, &self.vis);
        self.settle();
        visible
    }

    /// Reset a control's elements to visible and apply the result.
    pub fn show_control(&mut self, control: &ChannelToggleControl) -> usize {
        let n = control.show_all(&mut self.vis);
        self.projector.apply_visibility(&mut self.doc, &self.vis);
        self.settle();
        n
    }

    // ── re-sync ────────────────────────────────────────────────────────────

    /// Drain recorded mutations into the scheduler. Returns whether a re-sync is pending.
    pub fn note_external_mutations(&mut self) -> bool {
        let mutations = self.doc.take_mutations();
        self.resync.observe(&mutations, self.clock.now_ms())
    }

    /// Drain the mutation log after one of our own operations. External
    /// writes in it still reach the scheduler.
    fn settle(&mut self) {
        self.note_external_mutations();
    }

    /// Advance timers. Returns `true` when a re-sync ran.
    pub fn tick(&mut self) -> bool {
        self.note_external_mutations();
        if !self.resync.poll(self.clock.now_ms()) {
            return false;
        }
        self.resync_now();
        true
    }

    /// Re-apply slot order and every visibility flag without rewriting text.
    pub fn resync_now(&mut self) {
        let tree = self.tree();
        let report = self.projector.apply_slot_order(&mut self.doc, &tree);
        let n = self.projector.apply_visibility(&mut self.doc, &self.vis);
        self.toggler.reposition(&mut self.doc, &self.projector);
        log::debug!("resync: {} containers, {} skipped", n, report.skipped.len());
        // Our own writes are never a reason to re-sync again.
        self.doc.take_mutations();
        self.resync.cancel();
    }

    /// Re-project the current sentence from scratch.
    pub fn refresh(&mut self) -> ProjectionReport {
        let tree = self.tree();
        let report = self
            .projector
            .project_all(&mut self.doc, &tree, &self.vis, self.toggler.expanded());
        self.projector.apply_visibility(&mut self.doc, &self.vis);
        self.toggler.reposition(&mut self.doc, &self.projector);
        self.settle();
        report
    }

    // ── speech ─────────────────────────────────────────────────────────────

    /// Speak the phrase of a slot or subslot container. Blank phrases are skipped.
    pub fn speak(&self, element_id: &str) -> Result<(), CoreError> {
        self.doc.require(element_id)?;
        let text = self
            .doc
            .element_by_id(&naming::channel_part_id(element_id, Channel::Text))
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            log::debug!("speak: {} has no phrase", element_id);
            return Ok(());
        }
        self.speaker.speak(&text);
        Ok(())
    }
}

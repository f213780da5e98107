//! Subslot toggle controller: at most one subslot region is expanded.
//!
//! Expanding a region collapses every other one first, projects the region,
//! links it visually to its parent slot, positions it under the parent
//! inside the viewport and finally re-applies the visibility flags to the
//! freshly projected subslots. Collapsing removes every inline adjustment
//! made during expansion.

use crate::dom::{Document, MutationOrigin, Rect};
use crate::error::CoreError;
use crate::model::{SlotName, SlotNode};
use crate::projector::layout::region_left;
use crate::projector::naming::{
    self, COLLAPSED_CLASS, EXPANDED_CLASS, TAB_ACTIVE_CLASS, TAB_CONNECTED_CLASS,
};
use crate::projector::DomProjector;
use crate::visibility::VisibilityStore;

/// Inline styles the controller may set on a region; all cleared on collapse.
const POSITION_STYLES: [&str; 4] = ["left", "margin-left", "top", "transform"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Collapsed,
    Expanded(SlotName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded(SlotName),
    Collapsed(SlotName),
    /// The slot has no subslot content in this sentence; nothing changed.
    NothingToExpand(SlotName),
}

pub struct SubslotToggleController {
    state: ToggleState,
    debounce_ms: u64,
    last: Option<(SlotName, u64)>,
    edge_padding: f32,
}

impl SubslotToggleController {
    pub fn new(debounce_ms: u64, edge_padding: f32) -> Self {
        Self {
            state: ToggleState::Collapsed,
            debounce_ms,
            last: None,
            edge_padding,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn expanded(&self) -> Option<SlotName> {
        match self.state {
            ToggleState::Expanded(s) => Some(s),
            ToggleState::Collapsed => None,
        }
    }

    /// Open `parent`'s region, or close it if it is the open one.
    ///
    /// A repeat toggle of the same slot inside the debounce window is
    /// dropped. A document without the region or parent container is
    /// rejected before anything changes.
    pub fn toggle(
        &mut self,
        now_ms: u64,
        parent: &SlotNode,
        doc: &mut Document,
        projector: &DomProjector,
        vis: &VisibilityStore,
    ) -> Result<ToggleOutcome, CoreError> {
        let slot = parent.name;
        if let Some((last_slot, at)) = self.last {
            if last_slot == slot && now_ms.saturating_sub(at) < self.debounce_ms {
                let err = CoreError::ReentrancyRejected { operation: "toggle" };
                log::info!("{} ({} within debounce window)", err, slot);
                return Err(err);
            }
        }
        doc.require(&naming::subslot_region_id(slot))?;
        doc.require(&naming::slot_container_id(slot))?;
        self.last = Some((slot, now_ms));

        if self.state == ToggleState::Expanded(slot) {
            collapse_region(doc, slot);
            self.state = ToggleState::Collapsed;
            log::debug!("toggle: collapsed {}", slot);
            return Ok(ToggleOutcome::Collapsed(slot));
        }
        if !parent.has_subslot_content() {
            log::info!("toggle: {} has no subslots, not expanding", slot);
            return Ok(ToggleOutcome::NothingToExpand(slot));
        }

        self.collapse_all(doc);
        self.expand(doc, parent, projector, vis);
        self.state = ToggleState::Expanded(slot);
        log::debug!("toggle: expanded {}", slot);
        Ok(ToggleOutcome::Expanded(slot))
    }

    /// Collapse every region, whatever the current state says.
    pub fn collapse_all(&mut self, doc: &mut Document) {
        for slot in SlotName::ALL {
            collapse_region(doc, slot);
        }
        self.state = ToggleState::Collapsed;
    }

    fn expand(
        &self,
        doc: &mut Document,
        parent: &SlotNode,
        projector: &DomProjector,
        vis: &VisibilityStore,
    ) {
        let slot = parent.name;
        let report = projector.project_subslot_region(doc, parent, vis);
        if !report.is_clean() {
            log::debug!("toggle: {} subslots of {} skipped", report.skipped.len(), slot);
        }

        self.place(doc, projector, slot);

        // Newly projected subslots must not come up visible if the user hid them.
        projector.apply_region_visibility(doc, vis, slot);
    }

    /// Re-align the expanded region under its parent after the row or the
    /// region contents changed. Does nothing while everything is collapsed.
    pub fn reposition(&self, doc: &mut Document, projector: &DomProjector) {
        if let Some(slot) = self.expanded() {
            self.place(doc, projector, slot);
        }
    }

    /// Open `slot`'s region and position it under the parent slot.
    fn place(&self, doc: &mut Document, projector: &DomProjector, slot: SlotName) {
        projector.refresh_layout(doc);
        let width = projector.region_width(doc, slot).unwrap_or(0.0);
        let viewport = doc.viewport();
        let edge_padding = self.edge_padding;

        doc.with_origin(MutationOrigin::Projector, |doc| {
            let (Some(region), Some(container)) = (
                doc.find(&naming::subslot_region_id(slot)),
                doc.find(&naming::slot_container_id(slot)),
            ) else {
                return;
            };
            doc.remove_class(region, COLLAPSED_CLASS);
            doc.add_class(region, EXPANDED_CLASS);
            doc.add_class(region, TAB_CONNECTED_CLASS);
            doc.remove_style(region, "display");
            doc.add_class(container, TAB_ACTIVE_CLASS);
            if let Some(button) = doc.find(&naming::toggle_button_id(slot)) {
                doc.set_attr(button, "aria-expanded", "true");
                doc.add_class(button, EXPANDED_CLASS);
            }

            let anchor = doc.rect(container).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
            let left = region_left(anchor, width, viewport.width, edge_padding);
            doc.set_style(region, "left", &format!("{}px", left.round()));
            let top = anchor.y + anchor.height;
            doc.set_rect(region, Some(Rect::new(left, top, width, 0.0)));
        });
    }
}

/// Undo everything expansion did to `slot`'s region, parent and button.
pub fn collapse_region(doc: &mut Document, slot: SlotName) {
    doc.with_origin(MutationOrigin::Projector, |doc| {
        if let Some(region) = doc.find(&naming::subslot_region_id(slot)) {
            doc.remove_class(region, EXPANDED_CLASS);
            doc.remove_class(region, TAB_CONNECTED_CLASS);
            doc.add_class(region, COLLAPSED_CLASS);
            for prop in POSITION_STYLES {
                doc.remove_style(region, prop);
            }
            doc.set_style(region, "display", "none");
            doc.set_rect(region, None);
        }
        if let Some(container) = doc.find(&naming::slot_container_id(slot)) {
            doc.remove_class(container, TAB_ACTIVE_CLASS);
        }
        if let Some(button) = doc.find(&naming::toggle_button_id(slot)) {
            doc.set_attr(button, "aria-expanded", "false");
            doc.remove_class(button, EXPANDED_CLASS);
        }
    });
}

//! DOM projector: writes a [`SlotTree`] and the visibility flags into a [`Document`].
//!
//! The projector owns all knowledge of the markup convention (see [`naming`]).
//! It never creates or removes elements, it only fills existing containers,
//! so a projection pass is idempotent: running it twice without a model
//! change leaves the document exactly as it was.
//!
//! All writes are attributed to [`MutationOrigin::Projector`], which keeps the
//! re-sync scheduler from reacting to them.
//!
//! Two different ways of hiding exist and must not be confused:
//!
//! - channel hiding: the user switched a channel off; the channel element gets
//!   a `hidden-*` class ([`naming::hidden_class`]).
//! - folding: the container has nothing to show at all; it gets
//!   [`naming::EMPTY_CLASS`] and `display: none`, regardless of the flags.

pub mod layout;
pub mod naming;

use crate::collab::{ImageLookup, NoImages};
use crate::dom::{Document, MutationOrigin, NodeId};
use crate::error::CoreError;
use crate::model::{Channel, SlotName, SlotNode, SlotTree, cmp_order};
use crate::visibility::VisibilityStore;

use layout::{FixedWidthMeasurer, LayoutConfig, TextMeasurer};
use naming::{
    ElementKey, EMPTY_CLASS, NO_SUBSLOTS_CLASS, NOTICE_ID, PLACEHOLDER_CLASS, SLOT_ROW_ID,
    TOP_DISPLAY_ID, TOP_DISPLAY_TEXT_ID,
};

/// Elements skipped during a pass. Projection always runs to the end.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProjectionReport {
    pub skipped: Vec<CoreError>,
}

impl ProjectionReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, err: CoreError) {
        log::warn!("projection: {}; skipping", err);
        self.skipped.push(err);
    }

    fn merge(&mut self, other: ProjectionReport) {
        self.skipped.extend(other.skipped);
    }
}

pub struct DomProjector {
    images: Box<dyn ImageLookup>,
    measurer: Box<dyn TextMeasurer>,
    layout: LayoutConfig,
}

impl Default for DomProjector {
    fn default() -> Self {
        Self::new(Box::new(NoImages), Box::new(FixedWidthMeasurer::default()))
    }
}

impl DomProjector {
    pub fn new(images: Box<dyn ImageLookup>, measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            images,
            measurer,
            layout: LayoutConfig::default(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn set_images(&mut self, images: Box<dyn ImageLookup>) {
        self.images = images;
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    // ── full pass ──────────────────────────────────────────────────────────

    /// Project the whole tree: banner, every slot, slot order, the expanded
    /// region (if any), then the estimated layout.
    pub fn project_all(
        &self,
        doc: &mut Document,
        tree: &SlotTree,
        vis: &VisibilityStore,
        expanded: Option<SlotName>,
    ) -> ProjectionReport {
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let mut report = ProjectionReport::default();
            if let Err(err) = self.project_top_display(doc, &tree.top_display_text) {
                report.skip(err);
            }
            for node in tree.slots.values() {
                if let Err(err) = self.project_slot(doc, node, vis) {
                    report.skip(err);
                }
            }
            report.merge(self.apply_slot_order(doc, tree));
            if let Some(parent) = expanded.and_then(|p| tree.slot(p)) {
                report.merge(self.project_subslot_region(doc, parent, vis));
            }
            self.refresh_layout(doc);
            report
        })
    }

    // ── slots ──────────────────────────────────────────────────────────────

    /// Write one top-level slot: text, image, channel classes, folding and the
    /// state of its subslot toggle button.
    pub fn project_slot(
        &self,
        doc: &mut Document,
        node: &SlotNode,
        vis: &VisibilityStore,
    ) -> Result<(), CoreError> {
        let id = naming::slot_container_id(node.name);
        doc.with_origin(MutationOrigin::Projector, |doc| {
            self.write_container(
                doc,
                &id,
                &node.phrase_text,
                &node.gloss_text,
                node.is_empty_with_descendants(),
                vis,
            )?;
            if let Some(toggle) = doc.find(&naming::toggle_button_id(node.name)) {
                let none = !node.has_subslot_content();
                doc.set_class(toggle, NO_SUBSLOTS_CLASS, none);
                if none {
                    doc.set_style(toggle, "display", "none");
                } else {
                    doc.remove_style(toggle, "display");
                }
            }
            Ok(())
        })
    }

    /// Project the ten subslot containers of `parent` and reorder them by
    /// declared order (stable; ties keep canonical order).
    ///
    /// Only meant for the currently expanded region.
    pub fn project_subslot_region(
        &self,
        doc: &mut Document,
        parent: &SlotNode,
        vis: &VisibilityStore,
    ) -> ProjectionReport {
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let mut report = ProjectionReport::default();
            let region_id = naming::subslot_region_id(parent.name);
            let region = match doc.require(&region_id) {
                Ok(r) => r,
                Err(err) => {
                    report.skip(err);
                    return report;
                }
            };
            for sub in parent.subslots.values() {
                let id = naming::subslot_container_id(parent.name, sub.name);
                if let Err(err) =
                    self.write_container(doc, &id, &sub.phrase_text, &sub.gloss_text, sub.is_blank(), vis)
                {
                    report.skip(err);
                }
            }
            self.order_region(doc, region, parent);
            report
        })
    }

    fn order_region(&self, doc: &mut Document, region: NodeId, parent: &SlotNode) {
        let children = doc.children(region).to_vec();
        let mut keyed: Vec<(NodeId, f64)> = Vec::new();
        let mut others: Vec<NodeId> = Vec::new();
        for &c in &children {
            let key = doc.get(c).id.as_deref().and_then(ElementKey::parse);
            match key {
                Some(ElementKey::Subslot { parent: p, name }) if p == parent.name => {
                    let order = parent.subslot(name).map(|s| s.display_order).unwrap_or(0.0);
                    keyed.push((c, order));
                }
                _ => others.push(c),
            }
        }
        // Canonical order first, then a stable sort on declared order.
        keyed.sort_by_key(|(c, _)| {
            doc.get(*c)
                .id
                .as_deref()
                .and_then(ElementKey::parse)
                .map(|k| match k {
                    ElementKey::Subslot { name, .. } => name.canonical_index(),
                    ElementKey::Slot(s) => s.canonical_index(),
                })
                .unwrap_or(usize::MAX)
        });
        keyed.sort_by(|a, b| cmp_order(a.1, b.1));
        let order: Vec<NodeId> = keyed.into_iter().map(|(c, _)| c).chain(others).collect();
        if let Err(err) = doc.reorder_children(region, &order) {
            log::warn!("projection: could not reorder region: {:#}", err);
        }
    }

    /// Show the fronted question word banner at the front of the sentence row,
    /// or take it out of layout when `text` is empty.
    pub fn project_top_display(&self, doc: &mut Document, text: &str) -> Result<(), CoreError> {
        let banner = doc.require(TOP_DISPLAY_ID)?;
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let text_node = doc.find(TOP_DISPLAY_TEXT_ID).unwrap_or(banner);
            let text = text.trim();
            doc.set_text(text_node, text);
            if text.is_empty() {
                doc.add_class(banner, EMPTY_CLASS);
                doc.set_style(banner, "display", "none");
            } else {
                doc.remove_class(banner, EMPTY_CLASS);
                doc.remove_style(banner, "display");
            }
            doc.set_style(banner, "order", "-1");
            if let Some(row) = doc.parent(banner) {
                let mut kids = doc.children(row).to_vec();
                if kids.first() != Some(&banner) {
                    kids.retain(|&k| k != banner);
                    kids.insert(0, banner);
                    if let Err(err) = doc.reorder_children(row, &kids) {
                        log::warn!("projection: could not move top display: {:#}", err);
                    }
                }
            }
            Ok(())
        })
    }

    /// Set the `order` style of every slot container to its rank in declared
    /// order. Containers are not moved, so listeners stay attached.
    pub fn apply_slot_order(&self, doc: &mut Document, tree: &SlotTree) -> ProjectionReport {
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let mut report = ProjectionReport::default();
            for (rank, node) in tree.ordered_slots().into_iter().enumerate() {
                match doc.require(&naming::slot_container_id(node.name)) {
                    Ok(c) => {
                        doc.set_style(c, "order", &rank.to_string());
                    }
                    Err(err) => report.skip(err),
                }
            }
            report
        })
    }

    fn write_container(
        &self,
        doc: &mut Document,
        container_id: &str,
        phrase: &str,
        gloss: &str,
        folded: bool,
        vis: &VisibilityStore,
    ) -> Result<(), CoreError> {
        let container = doc.require(container_id)?;
        for (channel, text) in [(Channel::Text, phrase), (Channel::AuxText, gloss)] {
            match doc.find(&naming::channel_part_id(container_id, channel)) {
                Some(part) => {
                    doc.set_text(part, text);
                    doc.set_class(part, "empty", text.trim().is_empty());
                }
                None => log::debug!("projection: {} has no {} part", container_id, channel),
            }
        }
        if let Some(img) = doc.find(&naming::channel_part_id(container_id, Channel::Image)) {
            let phrase = phrase.trim();
            let src = if phrase.is_empty() { None } else { self.images.lookup(phrase) };
            match src {
                Some(src) => {
                    doc.set_attr(img, "src", &src);
                    doc.set_attr(img, "alt", phrase);
                    doc.remove_class(img, PLACEHOLDER_CLASS);
                }
                None => {
                    doc.remove_attr(img, "src");
                    doc.remove_attr(img, "alt");
                    doc.add_class(img, PLACEHOLDER_CLASS);
                }
            }
        }
        doc.set_class(container, EMPTY_CLASS, folded);
        if folded {
            doc.set_style(container, "display", "none");
        } else {
            doc.remove_style(container, "display");
        }
        self.apply_channels(doc, container_id, vis);
        Ok(())
    }

    // ── visibility ─────────────────────────────────────────────────────────

    fn apply_channels(&self, doc: &mut Document, container_id: &str, vis: &VisibilityStore) {
        for channel in Channel::ALL {
            if let Some(part) = doc.find(&naming::channel_part_id(container_id, channel)) {
                doc.set_class(part, naming::hidden_class(channel), !vis.get(container_id, channel));
            }
        }
    }

    /// Re-apply the stored flags to every slot and subslot container present
    /// in the document. Returns how many containers were touched.
    pub fn apply_visibility(&self, doc: &mut Document, vis: &VisibilityStore) -> usize {
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let mut n = 0;
            for key in ElementKey::all() {
                let id = key.element_id();
                if doc.find(&id).is_some() {
                    self.apply_channels(doc, &id, vis);
                    n += 1;
                }
            }
            n
        })
    }

    /// Re-apply the stored flags to the subslot containers of one region.
    pub fn apply_region_visibility(
        &self,
        doc: &mut Document,
        vis: &VisibilityStore,
        parent: SlotName,
    ) -> usize {
        doc.with_origin(MutationOrigin::Projector, |doc| {
            let mut n = 0;
            for name in SlotName::ALL {
                let id = naming::subslot_container_id(parent, name);
                if doc.find(&id).is_some() {
                    self.apply_channels(doc, &id, vis);
                    n += 1;
                }
            }
            n
        })
    }

    /// Re-apply the stored flags to a single container.
    pub fn apply_visibility_to(
        &self,
        doc: &mut Document,
        vis: &VisibilityStore,
        element_id: &str,
    ) -> Result<(), CoreError> {
        doc.require(element_id)?;
        doc.with_origin(MutationOrigin::Projector, |doc| {
            self.apply_channels(doc, element_id, vis);
        });
        Ok(())
    }

    // ── misc ───────────────────────────────────────────────────────────────

    /// Recompute estimated rects for the slot row.
    pub fn refresh_layout(&self, doc: &mut Document) {
        if let Some(row) = doc.find(SLOT_ROW_ID) {
            layout::layout_row(doc, row, 0.0, 0.0, self.measurer.as_ref(), &self.layout);
        }
    }

    /// Estimated natural width of the region of `parent`.
    pub fn region_width(&self, doc: &Document, parent: SlotName) -> Option<f32> {
        let region = doc.find(&naming::subslot_region_id(parent))?;
        Some(layout::region_width(doc, region, self.measurer.as_ref(), &self.layout))
    }

    /// Show (or clear, with `None`) the inline load notice.
    pub fn show_notice(&self, doc: &mut Document, message: Option<&str>) {
        let Some(notice) = doc.find(NOTICE_ID) else {
            if let Some(m) = message {
                log::warn!("no notice element; message was: {}", m);
            }
            return;
        };
        doc.with_origin(MutationOrigin::Projector, |doc| match message {
            Some(m) => {
                doc.set_text(notice, m);
                doc.remove_style(notice, "display");
            }
            None => {
                doc.set_text(notice, "");
                doc.set_style(notice, "display", "none");
            }
        });
    }
}

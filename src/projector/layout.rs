//! Layout estimation for the slot row and subslot regions.
//!
//! Without a browser there is no layout engine, so widths are estimated from
//! text with a [`TextMeasurer`]. Front-ends that know real geometry may
//! overwrite the rects afterwards with [`Document::set_rect`].

use crate::dom::{Document, NodeId, Rect};
use crate::model::Channel;

use super::naming::{self, EMPTY_CLASS, SLOT_CLASS, SUBSLOT_CLASS};

pub trait TextMeasurer {
    /// Return the size of the rendered text (width, height) in document pixels.
    fn measure(&self, text: &str) -> (f32, f32);
}

/// Every character is `char_width` wide and lines are `line_height` tall.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMeasurer {
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for FixedWidthMeasurer {
    fn default() -> Self {
        Self {
            char_width: 9.0,
            line_height: 20.0,
        }
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn measure(&self, text: &str) -> (f32, f32) {
        (text.chars().count() as f32 * self.char_width, self.line_height)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Horizontal gap between neighbouring containers.
    pub gap: f32,
    /// Inner padding on each side of a container.
    pub padding: f32,
    /// Narrowest a container may be.
    pub min_width: f32,
    /// Height reserved for the image channel.
    pub image_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap: 8.0,
            padding: 6.0,
            min_width: 64.0,
            image_height: 80.0,
        }
    }
}

/// Estimated size of one slot or subslot container from its phrase and gloss.
pub fn container_size(
    doc: &Document,
    container_id: &str,
    measurer: &dyn TextMeasurer,
    cfg: &LayoutConfig,
) -> (f32, f32) {
    let mut w: f32 = 0.0;
    let mut h = cfg.image_height;
    for channel in [Channel::Text, Channel::AuxText] {
        if let Some(part) = doc.find(&naming::channel_part_id(container_id, channel)) {
            let (tw, th) = measurer.measure(&doc.get(part).text);
            w = w.max(tw);
            h += th;
        }
    }
    ((w + 2.0 * cfg.padding).max(cfg.min_width), h + 2.0 * cfg.padding)
}

/// Lay out the rendered children of `row` from left to right, following the
/// `order` style when present (child order otherwise). Hidden children get
/// no rect. Returns the total width used.
pub fn layout_row(
    doc: &mut Document,
    row: NodeId,
    origin_x: f32,
    origin_y: f32,
    measurer: &dyn TextMeasurer,
    cfg: &LayoutConfig,
) -> f32 {
    let mut items: Vec<(i64, usize, NodeId)> = doc
        .children(row)
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let order = doc
                .style(c, "order")
                .and_then(|o| o.trim().parse::<i64>().ok())
                .unwrap_or(0);
            (order, i, c)
        })
        .collect();
    items.sort();

    let mut x = origin_x;
    let mut max_h: f32 = 0.0;
    for (_, _, node) in items {
        let el = doc.get(node);
        if el.id.is_none() || !doc.is_rendered(node) || el.has_class(EMPTY_CLASS) {
            doc.set_rect(node, None);
            continue;
        }
        let id = el.id.clone().unwrap_or_default();
        let (w, h) = if el.has_class(SLOT_CLASS) || el.has_class(SUBSLOT_CLASS) {
            container_size(doc, &id, measurer, cfg)
        } else {
            let (tw, th) = measurer.measure(&doc.get(node).text);
            ((tw + 2.0 * cfg.padding).max(cfg.min_width), th + 2.0 * cfg.padding)
        };
        doc.set_rect(node, Some(Rect::new(x, origin_y, w, h)));
        x += w + cfg.gap;
        max_h = max_h.max(h);
    }
    let used = (x - origin_x - cfg.gap).max(0.0);
    doc.set_rect(row, Some(Rect::new(origin_x, origin_y, used, max_h)));
    used
}

/// Natural (unshifted) width of a region: its rendered subslots side by side.
pub fn region_width(doc: &Document, region: NodeId, measurer: &dyn TextMeasurer, cfg: &LayoutConfig) -> f32 {
    let mut total = 0.0;
    let mut count = 0;
    for &c in doc.children(region) {
        let el = doc.get(c);
        if el.has_class(EMPTY_CLASS) || el.style("display") == Some("none") {
            continue;
        }
        let Some(id) = el.id.as_deref() else {
            continue;
        };
        total += container_size(doc, id, measurer, cfg).0;
        count += 1;
    }
    if count > 1 {
        total += cfg.gap * (count - 1) as f32;
    }
    total
}

/// Horizontal position for a region so it starts under its parent slot
/// without leaving the viewport.
///
/// The region is aligned with the parent's left edge, then clamped to
/// `[edge_padding, viewport_width - edge_padding - region_width]`. A region
/// wider than the viewport pins to `edge_padding`.
pub fn region_left(parent: Rect, region_width: f32, viewport_width: f32, edge_padding: f32) -> f32 {
    let max_left = viewport_width - edge_padding - region_width;
    let wanted = parent.left();
    if max_left < edge_padding {
        return edge_padding;
    }
    wanted.clamp(edge_padding, max_left)
}

//! Slot tree builder.
//!
//! [`build_tree`] turns the rows of one example sentence into a [`SlotTree`].
//! All ten top-level slots and all ten subslots per parent always exist in
//! the result so the projector has a stable target to hide.

use std::collections::HashMap;

use crate::model::{Row, SlotName, SlotTree};

/// Build the slot tree for `sentence_id` from the full row set.
///
/// Never fails: an unknown sentence id yields an all-blank tree (and a log
/// line) so callers can render an empty-but-valid grid.
pub fn build_tree(rows: &[Row], sentence_id: &str) -> SlotTree {
    let mut tree = SlotTree::blank(Some(sentence_id.to_string()));
    let selected: Vec<&Row> = rows.iter().filter(|r| r.sentence_id == sentence_id).collect();
    if selected.is_empty() {
        log::warn!("build_tree: no rows for sentence '{}', rendering blank tree", sentence_id);
        return tree;
    }

    tree.top_display_text = selected
        .iter()
        .find(|r| r.is_top_of_sentence_display)
        .map(|r| r.phrase_text.trim().to_string())
        .unwrap_or_default();

    // Parents without their own row inherit the order carried by their subslot rows.
    let mut has_own_row: HashMap<SlotName, bool> = HashMap::new();
    let mut inherited_order: HashMap<SlotName, f64> = HashMap::new();

    for row in &selected {
        let Some(parent) = tree.slots.get_mut(&row.slot) else {
            continue;
        };
        match row.subslot_id {
            None => {
                parent.phrase_text = row.phrase_text.clone();
                parent.gloss_text = row.gloss_text.clone();
                parent.display_order = row.display_order;
                has_own_row.insert(row.slot, true);
            }
            Some(sub) => {
                if let Some(child) = parent.subslots.get_mut(&sub) {
                    child.phrase_text = row.phrase_text.clone();
                    child.gloss_text = row.gloss_text.clone();
                    child.display_order = row.subslot_display_order.unwrap_or(row.display_order);
                }
                inherited_order
                    .entry(row.slot)
                    .and_modify(|o| *o = o.min(row.display_order))
                    .or_insert(row.display_order);
            }
        }
    }

    for (name, order) in inherited_order {
        if !has_own_row.get(&name).copied().unwrap_or(false) {
            if let Some(parent) = tree.slots.get_mut(&name) {
                parent.display_order = order;
            }
        }
    }

    suppress_top_display_duplicates(&mut tree);
    tree
}

/// Blank every slot or subslot whose phrase equals the fronted question word.
///
/// Matching is by exact (trimmed) string equality, so two positions that
/// happen to carry the same text are both suppressed.
fn suppress_top_display_duplicates(tree: &mut SlotTree) {
    let top = tree.top_display_text.clone();
    if top.is_empty() {
        return;
    }
    for slot in tree.slots.values_mut() {
        if slot.phrase_text.trim() == top {
            log::debug!("top display '{}' suppressed in slot {}", top, slot.name);
            slot.clear_text();
        }
        for sub in slot.subslots.values_mut() {
            if sub.phrase_text.trim() == top {
                log::debug!("top display '{}' suppressed in {}/{}", top, slot.name, sub.name);
                sub.clear_text();
            }
        }
    }
}

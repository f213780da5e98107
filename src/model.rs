//! Core data model: example rows, slot names, content channels and the slot tree.
//!
//! The slot tree is rebuilt from scratch for every sentence shown (see
//! [`crate::tree::build_tree`]); nothing in here is mutated across
//! randomizations. Visibility flags live elsewhere
//! ([`crate::visibility::VisibilityStore`]) and are keyed by element id, never
//! by sentence content.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ────────────────────────────────────────────────────────────────────────────
// SlotName
// ────────────────────────────────────────────────────────────────────────────

/// One of the ten fixed grammatical roles.
///
/// The declaration order is the canonical order and is used as tie-break
/// whenever declared display order is absent or equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotName {
    M1,
    S,
    Aux,
    M2,
    V,
    C1,
    O1,
    O2,
    C2,
    M3,
}

impl SlotName {
    /// All slot names in canonical order.
    pub const ALL: [SlotName; 10] = [
        SlotName::M1,
        SlotName::S,
        SlotName::Aux,
        SlotName::M2,
        SlotName::V,
        SlotName::C1,
        SlotName::O1,
        SlotName::O2,
        SlotName::C2,
        SlotName::M3,
    ];

    /// Display label, e.g. `"M1"` or `"Aux"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SlotName::M1 => "M1",
            SlotName::S => "S",
            SlotName::Aux => "Aux",
            SlotName::M2 => "M2",
            SlotName::V => "V",
            SlotName::C1 => "C1",
            SlotName::O1 => "O1",
            SlotName::O2 => "O2",
            SlotName::C2 => "C2",
            SlotName::M3 => "M3",
        }
    }

    /// Lower-case fragment used when building element ids (`m1`, `aux`, ...).
    pub fn id_fragment(self) -> &'static str {
        match self {
            SlotName::M1 => "m1",
            SlotName::S => "s",
            SlotName::Aux => "aux",
            SlotName::M2 => "m2",
            SlotName::V => "v",
            SlotName::C1 => "c1",
            SlotName::O1 => "o1",
            SlotName::O2 => "o2",
            SlotName::C2 => "c2",
            SlotName::M3 => "m3",
        }
    }

    /// Position in [`SlotName::ALL`].
    pub fn canonical_index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the ten slot names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlotName(pub String);

impl fmt::Display for UnknownSlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown slot name '{}'", self.0)
    }
}

impl std::error::Error for UnknownSlotName {}

impl FromStr for SlotName {
    type Err = UnknownSlotName;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        SlotName::ALL
            .iter()
            .copied()
            .find(|n| n.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownSlotName(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Channel
// ────────────────────────────────────────────────────────────────────────────

/// Independently toggleable content kind of a slot or subslot container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Main phrase text.
    Text,
    /// Gloss / auxiliary text.
    #[serde(rename = "auxtext")]
    AuxText,
    /// Illustrative image.
    Image,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Text, Channel::AuxText, Channel::Image];

    /// Key used in the persisted visibility map.
    pub fn as_key(self) -> &'static str {
        match self {
            Channel::Text => "text",
            Channel::AuxText => "auxtext",
            Channel::Image => "image",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "phrase" => Ok(Channel::Text),
            "auxtext" | "gloss" => Ok(Channel::AuxText),
            "image" | "img" => Ok(Channel::Image),
            other => Err(anyhow::anyhow!("unknown channel '{}'", other)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row
// ────────────────────────────────────────────────────────────────────────────

/// One record of the example store: a slot or subslot occurrence of one
/// example sentence. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub sentence_id: String,
    pub slot: SlotName,
    /// `None` for top-level slot rows.
    pub subslot_id: Option<SlotName>,
    pub phrase_text: String,
    pub gloss_text: String,
    /// Declared order of the (parent) slot; defaults to `0`.
    pub display_order: f64,
    /// Declared order of a subslot within its parent.
    pub subslot_display_order: Option<f64>,
    pub is_top_of_sentence_display: bool,
}

impl Row {
    /// Uniqueness key `(sentenceId, slot, subslotId)`.
    pub fn key(&self) -> (&str, SlotName, Option<SlotName>) {
        (self.sentence_id.as_str(), self.slot, self.subslot_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Slot tree
// ────────────────────────────────────────────────────────────────────────────

/// A subslot of a top-level slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubslotNode {
    pub name: SlotName,
    pub phrase_text: String,
    pub gloss_text: String,
    pub display_order: f64,
}

impl SubslotNode {
    pub fn blank(name: SlotName) -> Self {
        Self {
            name,
            phrase_text: String::new(),
            gloss_text: String::new(),
            display_order: 0.0,
        }
    }

    /// True when neither phrase nor gloss carries visible text.
    pub fn is_blank(&self) -> bool {
        self.phrase_text.trim().is_empty() && self.gloss_text.trim().is_empty()
    }

    pub fn clear_text(&mut self) {
        self.phrase_text.clear();
        self.gloss_text.clear();
    }
}

/// A top-level slot with its ten subslots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotNode {
    pub name: SlotName,
    pub phrase_text: String,
    pub gloss_text: String,
    pub display_order: f64,
    /// Always holds all ten subslot names, in canonical order.
    pub subslots: IndexMap<SlotName, SubslotNode>,
}

impl SlotNode {
    pub fn blank(name: SlotName) -> Self {
        let subslots = SlotName::ALL
            .iter()
            .map(|&n| (n, SubslotNode::blank(n)))
            .collect();
        Self {
            name,
            phrase_text: String::new(),
            gloss_text: String::new(),
            display_order: 0.0,
            subslots,
        }
    }

    /// True when the slot's own phrase and gloss are empty.
    pub fn is_blank(&self) -> bool {
        self.phrase_text.trim().is_empty() && self.gloss_text.trim().is_empty()
    }

    pub fn has_subslot_content(&self) -> bool {
        self.subslots.values().any(|s| !s.is_blank())
    }

    /// Blank itself and every subslot blank: nothing to show at all.
    pub fn is_empty_with_descendants(&self) -> bool {
        self.is_blank() && !self.has_subslot_content()
    }

    pub fn subslot(&self, name: SlotName) -> Option<&SubslotNode> {
        self.subslots.get(&name)
    }

    /// Subslots sorted by declared order; ties keep canonical order.
    pub fn ordered_subslots(&self) -> Vec<&SubslotNode> {
        let mut v: Vec<&SubslotNode> = self.subslots.values().collect();
        v.sort_by(|a, b| cmp_order(a.display_order, b.display_order));
        v
    }

    pub fn clear_text(&mut self) {
        self.phrase_text.clear();
        self.gloss_text.clear();
    }
}

/// The full model for one example sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTree {
    pub sentence_id: Option<String>,
    /// Always holds all ten slot names, in canonical order.
    pub slots: IndexMap<SlotName, SlotNode>,
    /// Fronted question word shown in its own banner; empty when absent.
    pub top_display_text: String,
}

impl SlotTree {
    /// A tree where all ten slots (and their subslots) are blank.
    pub fn blank(sentence_id: Option<String>) -> Self {
        let slots = SlotName::ALL
            .iter()
            .map(|&n| (n, SlotNode::blank(n)))
            .collect();
        Self {
            sentence_id,
            slots,
            top_display_text: String::new(),
        }
    }

    pub fn slot(&self, name: SlotName) -> Option<&SlotNode> {
        self.slots.get(&name)
    }

    /// Slots sorted by declared order; ties keep canonical order.
    pub fn ordered_slots(&self) -> Vec<&SlotNode> {
        let mut v: Vec<&SlotNode> = self.slots.values().collect();
        v.sort_by(|a, b| cmp_order(a.display_order, b.display_order));
        v
    }

    /// Names of the slots that have something to show, in display order.
    pub fn visible_sequence(&self) -> Vec<SlotName> {
        self.ordered_slots()
            .into_iter()
            .filter(|s| !s.is_empty_with_descendants())
            .map(|s| s.name)
            .collect()
    }

    /// True when no slot has any content and there is no top display text.
    pub fn is_blank(&self) -> bool {
        self.top_display_text.is_empty()
            && self.slots.values().all(|s| s.is_empty_with_descendants())
    }
}

/// Total order on declared display-order numbers. Callers rely on a stable
/// sort so equal values keep canonical order.
pub fn cmp_order(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

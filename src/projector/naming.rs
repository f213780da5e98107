//! Element id and class naming convention.
//!
//! Every id the engine looks up is built here, so the markup convention can
//! change in one place.
//!
//! | element                     | id                        |
//! |-----------------------------|---------------------------|
//! | slot row                    | `slot-row`                |
//! | slot container              | `slot-m1`                 |
//! | slot part                   | `slot-m1-phrase`          |
//! | subslot toggle button       | `slot-m1-toggle`          |
//! | subslot region              | `slot-m1-sub`             |
//! | subslot container           | `slot-m1-sub-o1`          |
//! | top display banner / text   | `top-display`, `top-display-text` |

use crate::model::{Channel, SlotName};

pub const SLOT_ROW_ID: &str = "slot-row";
pub const REGION_ROW_ID: &str = "subslot-area";
pub const TOP_DISPLAY_ID: &str = "top-display";
pub const TOP_DISPLAY_TEXT_ID: &str = "top-display-text";
pub const NOTICE_ID: &str = "load-notice";

pub const SLOT_CLASS: &str = "slot";
pub const SUBSLOT_CLASS: &str = "subslot";
pub const REGION_CLASS: &str = "subslot-region";
/// Container with nothing to show at all (folded out of layout).
pub const EMPTY_CLASS: &str = "empty-slot";
/// Toggle button of a slot that has no subslot content.
pub const NO_SUBSLOTS_CLASS: &str = "no-subslots";
pub const EXPANDED_CLASS: &str = "expanded";
pub const COLLAPSED_CLASS: &str = "collapsed";
/// Parent slot visually joined to its open region.
pub const TAB_ACTIVE_CLASS: &str = "tab-active";
/// Open region visually joined to its parent slot.
pub const TAB_CONNECTED_CLASS: &str = "tab-connected";
pub const PLACEHOLDER_CLASS: &str = "placeholder";

/// Addresses one slot or subslot container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Slot(SlotName),
    Subslot { parent: SlotName, name: SlotName },
}

impl ElementKey {
    pub fn element_id(self) -> String {
        match self {
            ElementKey::Slot(s) => slot_container_id(s),
            ElementKey::Subslot { parent, name } => subslot_container_id(parent, name),
        }
    }

    /// Inverse of [`ElementKey::element_id`].
    pub fn parse(id: &str) -> Option<Self> {
        let rest = id.strip_prefix("slot-")?;
        let find = |frag: &str| SlotName::ALL.iter().copied().find(|s| s.id_fragment() == frag);
        match rest.split_once("-sub-") {
            Some((p, n)) => Some(ElementKey::Subslot {
                parent: find(p)?,
                name: find(n)?,
            }),
            None => find(rest).map(ElementKey::Slot),
        }
    }

    /// Every slot and subslot key, slots first, canonical order.
    pub fn all() -> Vec<ElementKey> {
        let mut out: Vec<ElementKey> = SlotName::ALL.iter().map(|&s| ElementKey::Slot(s)).collect();
        for parent in SlotName::ALL {
            for name in SlotName::ALL {
                out.push(ElementKey::Subslot { parent, name });
            }
        }
        out
    }
}

pub fn slot_container_id(slot: SlotName) -> String {
    format!("slot-{}", slot.id_fragment())
}

pub fn subslot_region_id(parent: SlotName) -> String {
    format!("slot-{}-sub", parent.id_fragment())
}

pub fn subslot_container_id(parent: SlotName, name: SlotName) -> String {
    format!("slot-{}-sub-{}", parent.id_fragment(), name.id_fragment())
}

pub fn toggle_button_id(parent: SlotName) -> String {
    format!("slot-{}-toggle", parent.id_fragment())
}

/// Part name of the child element holding a channel.
pub fn channel_part(channel: Channel) -> &'static str {
    match channel {
        Channel::Text => "phrase",
        Channel::AuxText => "gloss",
        Channel::Image => "image",
    }
}

/// Id of the child element of `container_id` holding `channel`.
pub fn channel_part_id(container_id: &str, channel: Channel) -> String {
    format!("{}-{}", container_id, channel_part(channel))
}

/// Class applied to a channel element the user has hidden.
pub fn hidden_class(channel: Channel) -> &'static str {
    match channel {
        Channel::Text => "hidden-text",
        Channel::AuxText => "hidden-auxtext",
        Channel::Image => "hidden-image",
    }
}

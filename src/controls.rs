//! One generic show/hide control for a channel over a list of elements.
//!
//! Checkbox rows, button bars and overlay panels are all presentations of
//! this one control. It only talks to the [`VisibilityStore`]; callers
//! re-apply the flags to the document afterwards.

use crate::model::{Channel, SlotName};
use crate::projector::naming;
use crate::visibility::VisibilityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    AllVisible,
    AllHidden,
    Mixed,
}

#[derive(Debug, Clone)]
pub struct ChannelToggleControl {
    element_ids: Vec<String>,
    channel: Channel,
    /// Id prefix covering exactly the listed elements, when one exists.
    scope: Option<String>,
}

impl ChannelToggleControl {
    pub fn new(element_ids: Vec<String>, channel: Channel) -> Self {
        Self {
            element_ids,
            channel,
            scope: None,
        }
    }

    /// The ten top-level slot containers.
    pub fn for_slots(channel: Channel) -> Self {
        Self::new(SlotName::ALL.iter().map(|&s| naming::slot_container_id(s)).collect(), channel)
    }

    /// The ten subslot containers of `parent`.
    pub fn for_subslots(parent: SlotName, channel: Channel) -> Self {
        let ids = SlotName::ALL
            .iter()
            .map(|&s| naming::subslot_container_id(parent, s))
            .collect();
        Self {
            element_ids: ids,
            channel,
            scope: Some(naming::subslot_region_id(parent)),
        }
    }

    pub fn element_ids(&self) -> &[String] {
        &self.element_ids
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn state(&self, vis: &VisibilityStore) -> ControlState {
        let visible = self
            .element_ids
            .iter()
            .filter(|id| vis.get(id, self.channel))
            .count();
        if visible == self.element_ids.len() {
            ControlState::AllVisible
        } else if visible == 0 {
            ControlState::AllHidden
        } else {
            ControlState::Mixed
        }
    }

    /// Hide everything when all is visible, show everything otherwise.
    /// Returns the new visibility.
    pub fn toggle(&self, vis: &mut VisibilityStore) -> bool {
        let next = self.state(vis) != ControlState::AllVisible;
        self.set_all(vis, next);
        next
    }

    pub fn set_all(&self, vis: &mut VisibilityStore, visible: bool) {
        vis.set_many(self.element_ids.iter().map(String::as_str), self.channel, visible);
    }

    /// Reset every channel of the covered elements to visible. Returns the
    /// number of elements that had overrides.
    pub fn show_all(&self, vis: &mut VisibilityStore) -> usize {
        if let Some(prefix) = &self.scope {
            return vis.reset_all(prefix);
        }
        let had = self
            .element_ids
            .iter()
            .filter(|id| Channel::ALL.iter().any(|&c| !vis.get(id, c)))
            .count();
        for channel in Channel::ALL {
            vis.set_many(self.element_ids.iter().map(String::as_str), channel, true);
        }
        had
    }
}

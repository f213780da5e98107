//! Visibility state store: the persisted per-element, per-channel show/hide map.
//!
//! Keys are element ids (`slot-m1`, `slot-m1-sub-o1`, ...), never sentence
//! content, so flags survive randomization and re-rendering. An absent entry
//! means visible. The persisted form is a flat JSON object holding only the
//! channels explicitly set away from the default:
//!
//! ```json
//! { "slot-m1-sub-o1": { "text": false }, "slot-v": { "image": false } }
//! ```

pub mod storage;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Channel;

/// Storage key of the visibility map.
pub const VISIBILITY_STORAGE_KEY: &str = "rephrase-visibility";

/// Per-element overrides. `None` means "default" (visible).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxtext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<bool>,
}

impl ChannelFlags {
    fn slot(&mut self, channel: Channel) -> &mut Option<bool> {
        match channel {
            Channel::Text => &mut self.text,
            Channel::AuxText => &mut self.auxtext,
            Channel::Image => &mut self.image,
        }
    }

    pub fn get(&self, channel: Channel) -> Option<bool> {
        match channel {
            Channel::Text => self.text,
            Channel::AuxText => self.auxtext,
            Channel::Image => self.image,
        }
    }

    fn is_default(&self) -> bool {
        self.text.is_none() && self.auxtext.is_none() && self.image.is_none()
    }

    /// Drop explicit `true` values so only real overrides remain.
    fn normalized(mut self) -> Self {
        for c in Channel::ALL {
            let s = self.slot(c);
            if *s == Some(true) {
                *s = None;
            }
        }
        self
    }
}

/// True when `id` equals `prefix` or lies below it (`prefix-...`).
pub fn id_in_scope(id: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || id == prefix
        || (id.len() > prefix.len() && id.starts_with(prefix) && id.as_bytes()[prefix.len()] == b'-')
}

/// Persisted visibility map.
///
/// Writes go to storage synchronously. When storage fails the store logs a
/// [`CoreError::Storage`] and keeps working in memory for the rest of the
/// session.
pub struct VisibilityStore {
    flags: BTreeMap<String, ChannelFlags>,
    storage: Option<Rc<dyn KeyValueStorage>>,
    key: String,
    last_error: Option<CoreError>,
}

impl std::fmt::Debug for VisibilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityStore")
            .field("flags", &self.flags)
            .field("persistent", &self.storage.is_some())
            .field("key", &self.key)
            .finish()
    }
}

impl Default for VisibilityStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl VisibilityStore {
    /// A store that never persists.
    pub fn in_memory() -> Self {
        Self {
            flags: BTreeMap::new(),
            storage: None,
            key: VISIBILITY_STORAGE_KEY.to_string(),
            last_error: None,
        }
    }

    /// Open the store backed by `storage` under the default key.
    pub fn open(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self::open_with_key(storage, VISIBILITY_STORAGE_KEY)
    }

    /// Open the store backed by `storage`, loading whatever is saved under `key`.
    ///
    /// Unreadable or corrupt data degrades to an empty in-memory store.
    pub fn open_with_key(storage: Rc<dyn KeyValueStorage>, key: &str) -> Self {
        let mut store = Self {
            flags: BTreeMap::new(),
            storage: Some(storage.clone()),
            key: key.to_string(),
            last_error: None,
        };
        let loaded = storage.get(key).and_then(|text| match text {
            None => Ok(BTreeMap::new()),
            Some(t) => serde_json::from_str::<BTreeMap<String, ChannelFlags>>(&t)
                .map_err(anyhow::Error::from),
        });
        match loaded {
            Ok(map) => {
                store.flags = map
                    .into_iter()
                    .map(|(k, v)| (k, v.normalized()))
                    .filter(|(_, v)| !v.is_default())
                    .collect();
                log::debug!("visibility: loaded {} overridden elements", store.flags.len());
            }
            Err(err) => store.degrade(format!("{:#}", err)),
        }
        store
    }

    fn degrade(&mut self, reason: String) {
        let err = CoreError::Storage {
            key: self.key.clone(),
            reason,
        };
        log::warn!("{}; continuing with in-memory visibility only", err);
        self.storage = None;
        self.last_error = Some(err);
    }

    /// Whether writes still reach durable storage.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// The storage failure that caused a fallback to memory, if any.
    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    /// Is `channel` of `element_id` visible? Defaults to `true`.
    pub fn get(&self, element_id: &str, channel: Channel) -> bool {
        self.flags
            .get(element_id)
            .and_then(|f| f.get(channel))
            .unwrap_or(true)
    }

    /// Set one flag and persist immediately. Last write wins.
    pub fn set(&mut self, element_id: &str, channel: Channel, visible: bool) {
        let changed = self.set_in_memory(element_id, channel, visible);
        if changed {
            self.persist();
        }
    }

    /// Flip one flag, returning the new value.
    pub fn toggle(&mut self, element_id: &str, channel: Channel) -> bool {
        let next = !self.get(element_id, channel);
        self.set(element_id, channel, next);
        next
    }

    /// Set several flags with a single write.
    pub fn set_many<'a>(
        &mut self,
        element_ids: impl IntoIterator<Item = &'a str>,
        channel: Channel,
        visible: bool,
    ) {
        let mut changed = false;
        for id in element_ids {
            changed |= self.set_in_memory(id, channel, visible);
        }
        if changed {
            self.persist();
        }
    }

    fn set_in_memory(&mut self, element_id: &str, channel: Channel, visible: bool) -> bool {
        let before = self.get(element_id, channel);
        if visible {
            if let Some(flags) = self.flags.get_mut(element_id) {
                *flags.slot(channel) = None;
                if flags.is_default() {
                    self.flags.remove(element_id);
                }
            }
        } else {
            *self
                .flags
                .entry(element_id.to_string())
                .or_default()
                .slot(channel) = Some(false);
        }
        before != visible
    }

    /// Reset every channel of every element under `prefix` to visible.
    /// Returns the number of elements that had overrides.
    pub fn reset_all(&mut self, prefix: &str) -> usize {
        let before = self.flags.len();
        self.flags.retain(|id, _| !id_in_scope(id, prefix));
        let removed = before - self.flags.len();
        if removed > 0 {
            log::debug!("visibility: reset {} elements under '{}'", removed, prefix);
            self.persist();
        }
        removed
    }

    /// Every `(element, channel)` currently hidden.
    pub fn hidden(&self) -> Vec<(String, Channel)> {
        let mut out = Vec::new();
        for (id, flags) in &self.flags {
            for c in Channel::ALL {
                if flags.get(c) == Some(false) {
                    out.push((id.clone(), c));
                }
            }
        }
        out
    }

    /// The persisted JSON form.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.flags).unwrap_or(serde_json::Value::Null)
    }

    fn persist(&mut self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let result = serde_json::to_string(&self.flags)
            .map_err(anyhow::Error::from)
            .and_then(|text| storage.set(&self.key, &text));
        if let Err(err) = result {
            self.degrade(format!("{:#}", err));
        }
    }
}

use std::rc::Rc;

use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use rephrase::error::CoreError;
use rephrase::model::Channel;
use rephrase::prefs::UiPrefs;
use rephrase::visibility::{
    FileStorage, KeyValueStorage, MemoryStorage, VISIBILITY_STORAGE_KEY, VisibilityStore,
    id_in_scope,
};
use tempfile::tempdir;

/// Reads fine, refuses every write.
struct ReadOnlyStorage(MemoryStorage);

impl KeyValueStorage for ReadOnlyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.0.get(key)
    }
    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("quota exceeded")
    }
    fn remove(&self, _key: &str) -> Result<()> {
        bail!("quota exceeded")
    }
}

fn stored(storage: &MemoryStorage) -> serde_json::Value {
    let text = storage.get(VISIBILITY_STORAGE_KEY).unwrap().unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn absent_flags_default_to_visible() {
    let vis = VisibilityStore::in_memory();
    for c in Channel::ALL {
        assert!(vis.get("slot-s", c));
    }
    assert!(!vis.is_persistent());
}

#[test]
fn only_non_default_channels_are_persisted() {
    let storage = Rc::new(MemoryStorage::new());
    let mut vis = VisibilityStore::open(storage.clone());
    vis.set("slot-m1-sub-o1", Channel::Text, false);
    vis.set("slot-v", Channel::Image, false);
    assert_eq!(
        stored(&storage),
        serde_json::json!({ "slot-m1-sub-o1": { "text": false }, "slot-v": { "image": false } })
    );

    vis.set("slot-v", Channel::Image, true);
    assert_eq!(stored(&storage), serde_json::json!({ "slot-m1-sub-o1": { "text": false } }));
    assert!(vis.get("slot-v", Channel::Image));
}

#[test]
fn flags_survive_reopening() {
    let storage = Rc::new(MemoryStorage::new());
    {
        let mut vis = VisibilityStore::open(storage.clone());
        vis.set("slot-s", Channel::AuxText, false);
        assert!(!vis.toggle("slot-o1", Channel::Image));
    }
    let vis = VisibilityStore::open(storage);
    assert!(!vis.get("slot-s", Channel::AuxText));
    assert!(!vis.get("slot-o1", Channel::Image));
    assert!(vis.get("slot-s", Channel::Text));
    assert_eq!(vis.hidden().len(), 2);
}

#[test]
fn explicit_true_entries_in_storage_are_dropped_on_load() {
    let storage = Rc::new(MemoryStorage::new().with_entry(
        VISIBILITY_STORAGE_KEY,
        r#"{ "slot-s": { "text": true, "image": false }, "slot-v": { "text": true } }"#,
    ));
    let vis = VisibilityStore::open(storage);
    assert_eq!(vis.to_json(), serde_json::json!({ "slot-s": { "image": false } }));
}

#[test]
fn reset_all_only_touches_the_prefix() {
    let mut vis = VisibilityStore::in_memory();
    vis.set("slot-m1-sub-o1", Channel::Text, false);
    vis.set("slot-m1-sub-s", Channel::Image, false);
    vis.set("slot-m1", Channel::Text, false);
    vis.set("slot-m10", Channel::Text, false);
    vis.set("slot-o1-sub-s", Channel::Text, false);

    assert_eq!(vis.reset_all("slot-m1-sub"), 2);
    assert!(vis.get("slot-m1-sub-o1", Channel::Text));
    assert!(!vis.get("slot-m1", Channel::Text));
    assert!(!vis.get("slot-m10", Channel::Text));

    assert_eq!(vis.reset_all("slot-m1"), 1);
    assert!(!vis.get("slot-m10", Channel::Text));
    assert_eq!(vis.reset_all(""), 2);
    assert!(vis.hidden().is_empty());
}

#[test]
fn scope_matching() {
    assert!(id_in_scope("slot-m1-sub-o1", "slot-m1"));
    assert!(id_in_scope("slot-m1", "slot-m1"));
    assert!(!id_in_scope("slot-m10", "slot-m1"));
    assert!(id_in_scope("anything", ""));
}

#[test]
fn corrupt_storage_degrades_to_memory() {
    let storage = Rc::new(MemoryStorage::new().with_entry(VISIBILITY_STORAGE_KEY, "{ nope"));
    let mut vis = VisibilityStore::open(storage.clone());
    assert!(!vis.is_persistent());
    assert!(matches!(vis.last_error(), Some(CoreError::Storage { .. })));

    vis.set("slot-s", Channel::Text, false);
    assert!(!vis.get("slot-s", Channel::Text));
    // The corrupt value is left alone.
    assert_eq!(storage.get(VISIBILITY_STORAGE_KEY).unwrap().as_deref(), Some("{ nope"));
}

#[test]
fn failing_writes_degrade_but_keep_the_value() {
    let storage = Rc::new(ReadOnlyStorage(MemoryStorage::new()));
    let mut vis = VisibilityStore::open(storage);
    assert!(vis.is_persistent());
    vis.set("slot-s", Channel::Text, false);
    assert!(!vis.is_persistent());
    assert!(!vis.get("slot-s", Channel::Text));
    vis.set("slot-v", Channel::Text, false);
    assert_eq!(vis.hidden().len(), 2);
}

#[test]
fn file_storage_writes_one_json_file_per_key() {
    let tmp = tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(tmp.path().join("state")).unwrap();
    let storage = Rc::new(FileStorage::new(&base));
    {
        let mut vis = VisibilityStore::open(storage.clone());
        vis.set("slot-m1-sub-o1", Channel::Text, false);
    }
    assert!(base.join(format!("{}.json", VISIBILITY_STORAGE_KEY)).is_file());
    let vis = VisibilityStore::open(Rc::new(FileStorage::new(&base)));
    assert!(!vis.get("slot-m1-sub-o1", Channel::Text));

    storage.remove(VISIBILITY_STORAGE_KEY).unwrap();
    assert_eq!(storage.get(VISIBILITY_STORAGE_KEY).unwrap(), None);
}

#[test]
fn ui_prefs_round_trip_and_clamp() {
    let storage = MemoryStorage::new();
    assert_eq!(UiPrefs::load(&storage), UiPrefs::default());

    let prefs = UiPrefs {
        zoom: 1.5,
        last_preset: Some("basic".into()),
    };
    prefs.save(&storage);
    assert_eq!(UiPrefs::load(&storage), prefs);

    let storage = MemoryStorage::new().with_entry(rephrase::prefs::PREFS_STORAGE_KEY, r#"{"zoom": 40}"#);
    assert_eq!(UiPrefs::load(&storage).zoom, rephrase::prefs::MAX_ZOOM);
}

#[test]
fn last_preset_is_saved_once_per_change() {
    let storage = MemoryStorage::new();
    let mut prefs = UiPrefs::load(&storage);
    assert_eq!(prefs.last_preset, None);

    prefs.remember_preset("questions", &storage);
    assert_eq!(UiPrefs::load(&storage).last_preset.as_deref(), Some("questions"));

    // Unchanged id: nothing is written, so a foreign edit survives.
    storage.set(rephrase::prefs::PREFS_STORAGE_KEY, r#"{"zoom": 2.0, "lastPreset": "questions"}"#).unwrap();
    prefs.remember_preset("questions", &storage);
    assert_eq!(UiPrefs::load(&storage).zoom, 2.0);
}

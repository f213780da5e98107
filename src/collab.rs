//! External collaborators: image lookup and speech.
//!
//! The engine only depends on the traits. Fuzzy tag matching and real speech
//! synthesis live outside this crate; the implementations here are the
//! minimal ones a headless or test setup needs.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Maps display text to an illustrative image path.
pub trait ImageLookup {
    /// `None` means "no image": the projector leaves a placeholder.
    fn lookup(&self, text: &str) -> Option<String>;
}

/// Never finds an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageLookup for NoImages {
    fn lookup(&self, _text: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(alias = "image_file", alias = "imageFile")]
    image: String,
    #[serde(default, alias = "meta_tags", alias = "metaTags")]
    tags: Vec<String>,
}

/// Exact, case-insensitive tag table.
#[derive(Debug, Clone, Default)]
pub struct TagTableLookup {
    by_tag: HashMap<String, String>,
}

impl TagTableLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: &str, image: &str) {
        let key = normalize(tag);
        if !key.is_empty() {
            self.by_tag.entry(key).or_insert_with(|| image.to_string());
        }
    }

    /// Parse `[{ "image": "...", "tags": ["...", ...] }, ...]`. The first
    /// entry claiming a tag wins.
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<TagEntry> =
            serde_json::from_str(text).context("Failed to parse image tag table")?;
        let mut table = Self::new();
        for e in entries {
            for t in &e.tags {
                table.insert(t, &e.image);
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl ImageLookup for TagTableLookup {
    fn lookup(&self, text: &str) -> Option<String> {
        self.by_tag.get(&normalize(text)).cloned()
    }
}

/// Speaks text aloud. Fire-and-forget: callers never wait for completion.
pub trait Speaker {
    fn speak(&self, text: &str);
}

/// Drops every utterance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn speak(&self, _text: &str) {}
}

/// Logs every utterance at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, text: &str) {
        log::info!("speak: {}", text);
    }
}

//! Example store: the read-only, ordered collection of [`Row`]s a drill runs on.
//!
//! Sub-modules:
//!
//! - [`source`] – File I/O abstraction (filesystem, zipped bundle, memory)
//! - [`preset`] – Preset file resolution

pub mod preset;
pub mod source;

pub use preset::*;
pub use source::*;

use crate::error::CoreError;
use crate::model::{Row, SlotName};
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Row as it appears in preset JSON. Only `sentenceId` and `slot` are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRow {
    #[serde(alias = "sentence_id")]
    sentence_id: Option<Value>,
    slot: Option<String>,
    #[serde(default, alias = "subslot_id")]
    subslot_id: Option<String>,
    #[serde(default, alias = "phrase_text")]
    phrase_text: Option<String>,
    #[serde(default, alias = "gloss_text")]
    gloss_text: Option<String>,
    #[serde(default, alias = "display_order")]
    display_order: Option<Value>,
    #[serde(default, alias = "subslot_display_order")]
    subslot_display_order: Option<Value>,
    #[serde(default, alias = "is_top_of_sentence_display")]
    is_top_of_sentence_display: Option<bool>,
}

/// Accept ids written as JSON strings or numbers.
fn id_from_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept numbers and numeric strings; anything else counts as missing.
fn order_from_value(v: Option<&Value>) -> Option<f64> {
    let parsed = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

impl RawRow {
    fn into_row(self, index: usize) -> Result<Row> {
        let sentence_id = self
            .sentence_id
            .as_ref()
            .and_then(id_from_value)
            .ok_or_else(|| anyhow!("row {}: missing required field `sentenceId`", index))?;
        let slot_text = self
            .slot
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("row {}: missing required field `slot`", index))?;
        let slot: SlotName = slot_text
            .parse()
            .with_context(|| format!("row {}: invalid `slot`", index))?;
        let subslot_id = match self.subslot_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(
                s.parse::<SlotName>()
                    .with_context(|| format!("row {}: invalid `subslotId`", index))?,
            ),
        };
        Ok(Row {
            sentence_id,
            slot,
            subslot_id,
            phrase_text: self.phrase_text.unwrap_or_default(),
            gloss_text: self.gloss_text.unwrap_or_default(),
            display_order: order_from_value(self.display_order.as_ref()).unwrap_or(0.0),
            subslot_display_order: order_from_value(self.subslot_display_order.as_ref()),
            is_top_of_sentence_display: self.is_top_of_sentence_display.unwrap_or(false),
        })
    }
}

/// Ordered, immutable snapshot of example rows for one preset.
#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
    preset_id: Option<String>,
    rows: Vec<Row>,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(preset_id: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            preset_id: Some(preset_id.into()),
            rows,
        }
    }

    /// Parse preset JSON (an array of row objects).
    ///
    /// Fails on malformed JSON, on a missing required field, or on an unknown
    /// slot name. Duplicate `(sentenceId, slot, subslotId)` rows keep the first
    /// occurrence and log a warning.
    pub fn parse_rows(text: &str, origin: &str) -> Result<Vec<Row>> {
        let raw: Vec<RawRow> = serde_json::from_str(text)
            .with_context(|| format!("Failed to parse example rows in {}", origin))?;
        let mut rows = Vec::with_capacity(raw.len());
        let mut seen: HashSet<(String, SlotName, Option<SlotName>)> = HashSet::new();
        for (i, r) in raw.into_iter().enumerate() {
            let row = r.into_row(i).with_context(|| format!("In {}", origin))?;
            let key = (row.sentence_id.clone(), row.slot, row.subslot_id);
            if !seen.insert(key) {
                log::warn!(
                    "{}: duplicate row for sentence '{}' slot {} subslot {:?}; keeping the first",
                    origin,
                    row.sentence_id,
                    row.slot,
                    row.subslot_id
                );
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Read and parse a preset file from any [`ContentSource`].
    pub fn load<S: ContentSource>(source: &mut S, path: &Utf8Path) -> Result<Vec<Row>> {
        let text = source.read_to_string(path)?;
        Self::parse_rows(&text, path.as_str())
    }

    /// Load into this store. On failure the current rows are left untouched.
    pub fn load_into<S: ContentSource>(
        &mut self,
        preset_id: &str,
        source: &mut S,
        path: &Utf8Path,
    ) -> std::result::Result<usize, CoreError> {
        match Self::load(source, path) {
            Ok(rows) => {
                let n = rows.len();
                self.replace(preset_id, rows);
                Ok(n)
            }
            Err(err) => Err(CoreError::Load {
                preset: preset_id.to_string(),
                reason: format!("{:#}", err),
            }),
        }
    }

    /// Swap in a complete new snapshot.
    pub fn replace(&mut self, preset_id: &str, rows: Vec<Row>) {
        log::info!("example store: preset '{}' with {} rows", preset_id, rows.len());
        self.preset_id = Some(preset_id.to_string());
        self.rows = rows;
    }

    pub fn preset_id(&self) -> Option<&str> {
        self.preset_id.as_deref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct sentence ids in first-seen order.
    pub fn distinct_sentence_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.sentence_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn contains_sentence(&self, sentence_id: &str) -> bool {
        self.rows.iter().any(|r| r.sentence_id == sentence_id)
    }

    pub fn rows_for<'a>(&'a self, sentence_id: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |r| r.sentence_id == sentence_id)
    }

    /// Parse many preset files in parallel, reporting the row count or the
    /// error for each one.
    pub fn validate_all(paths: &[Utf8PathBuf]) -> Vec<(Utf8PathBuf, Result<usize>)> {
        paths
            .par_iter()
            .map(|p| {
                let res = Self::load(&mut FsSource, p).map(|rows| rows.len());
                (p.clone(), res)
            })
            .collect()
    }
}

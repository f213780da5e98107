//! Preset resolution: locate `<preset>.json` example files on disk.

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Which presets were found (with path) and which were not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetLookupResult {
    pub found: Vec<(String, Utf8PathBuf)>,
    pub not_found: Vec<String>,
}

/// A preset discovered by [`PresetResolver::scan`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PresetEntry {
    pub id: String,
    pub path: Utf8PathBuf,
}

/// Resolver that searches for `PRESET.json` files in an ordered list of
/// directories (first match wins).
#[derive(Debug, Clone)]
pub struct PresetResolver {
    search_paths: Vec<Utf8PathBuf>,
}

impl PresetResolver {
    /// Create a resolver that will search the provided directories in order.
    pub fn new<P: AsRef<Utf8Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            search_paths: paths
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
        }
    }

    pub fn search_paths(&self) -> &[Utf8PathBuf] {
        &self.search_paths
    }

    /// Path of a single preset, if any search directory holds it.
    pub fn find(&self, preset_id: &str) -> Option<Utf8PathBuf> {
        let id = preset_id.trim();
        if id.is_empty() || id.contains('/') || id.contains('\\') {
            return None;
        }
        let file_name = format!("{}.json", id);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Locate the given preset ids. Duplicates and blank ids are skipped.
    pub fn locate<'a, I>(&self, ids: I) -> PresetLookupResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        use std::collections::HashSet;
        let mut found = Vec::new();
        let mut not_found = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for id in ids {
            let id = id.trim();
            if id.is_empty() || !seen.insert(id.to_string()) {
                continue;
            }
            match self.find(id) {
                Some(p) => found.push((id.to_string(), p)),
                None => not_found.push(id.to_string()),
            }
        }
        PresetLookupResult { found, not_found }
    }

    /// List every `*.json` preset below the search paths, recursively.
    ///
    /// When the same preset id appears in several directories only the first
    /// one (search-path order) is kept, matching [`PresetResolver::find`].
    pub fn scan(&self) -> Vec<PresetEntry> {
        let mut out: Vec<PresetEntry> = Vec::new();
        for dir in &self.search_paths {
            let mut here = Vec::new();
            for entry in WalkDir::new(dir.as_std_path())
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                    continue;
                };
                if path.extension() != Some("json") {
                    continue;
                }
                let Some(id) = path.file_stem().map(str::to_string) else {
                    continue;
                };
                if out.iter().any(|e| e.id == id) {
                    continue;
                }
                here.push(PresetEntry { id, path });
            }
            here.sort();
            here.dedup_by(|a, b| a.id == b.id);
            out.extend(here);
        }
        out
    }
}

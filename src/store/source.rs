//! Content source abstraction for reading preset files from the filesystem,
//! from a zipped preset bundle or from memory.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::io::Read;

/// Trait for abstracting preset I/O (filesystem vs. ZIP bundle vs. memory).
pub trait ContentSource {
    /// Read a file at the given logical path and return its content as a string.
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String>;
}

/// Reads files directly from the local filesystem.
pub struct FsSource;

impl ContentSource for FsSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        std::fs::read_to_string(path.as_str()).with_context(|| format!("Failed to read {}", path))
    }
}

/// Reads files from a zipped preset bundle.
pub struct ZipSource<R: Read + std::io::Seek> {
    zip: zip::ZipArchive<R>,
}

impl<R: Read + std::io::Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let zip = zip::ZipArchive::new(reader).context("Failed to open preset bundle")?;
        Ok(Self { zip })
    }

    /// Every file in the bundle, sorted. Directory entries are skipped.
    pub fn entries(&mut self) -> Result<Vec<Utf8PathBuf>> {
        let mut files = Vec::new();
        for i in 0..self.zip.len() {
            let name = self.zip.by_index(i)?.name().to_string();
            if !name.ends_with('/') {
                files.push(Utf8PathBuf::from(name));
            }
        }
        files.sort();
        Ok(files)
    }
}

fn normalize_logical(path: &Utf8Path) -> String {
    path.as_str()
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

impl<R: Read + std::io::Seek> ContentSource for ZipSource<R> {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        let p = normalize_logical(path);
        let mut f = self
            .zip
            .by_name(&p)
            .with_context(|| format!("File {} not found in bundle", p))?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .with_context(|| format!("Failed to read {} from bundle", p))?;
        Ok(s)
    }
}

/// Serves files from an in-memory map keyed by logical path.
#[derive(Debug, Clone, Default)]
pub struct MemSource {
    files: BTreeMap<String, String>,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ContentSource for MemSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        self.files
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("not found: {}", path))
    }
}

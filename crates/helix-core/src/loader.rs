//! Loads pre-cleaned record exports (`<category>.json`) and policy text.
//!
//! Format-specific cleaning (CSV, spreadsheets, PDFs) happens upstream; this
//! module only understands JSON arrays of records and plain `.txt` policy files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{AttendanceEntry, Category, Employee, LeaveEntry, Record};

#[derive(Default)]
pub struct RecordLoader;

impl RecordLoader {
    pub fn new() -> Self { Self }

    /// Every `<category>.json` directly under `dir`, keyed by category.
    /// Files whose stem is not a category are skipped.
    pub fn load_directory(&self, dir: &Path) -> Result<BTreeMap<Category, Vec<Record>>> {
        let mut out: BTreeMap<Category, Vec<Record>> = BTreeMap::new();
        for path in self.list_files(dir, "json", 1) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let category = match stem.parse::<Category>() {
                Ok(c) => c,
                Err(_) => {
                    warn!(path = %path.display(), "skipping file with unknown category name");
                    continue;
                }
            };
            let records = self.load_category_file(&path, category)?;
            info!(%category, count = records.len(), path = %path.display(), "loaded records");
            out.entry(category).or_default().extend(records);
        }
        Ok(out)
    }

    pub fn load_category_file(&self, path: &Path, category: Category) -> Result<Vec<Record>> {
        let records = match category {
            Category::Employees => read_array::<Employee>(path)?.into_iter().map(Record::from).collect(),
            Category::Attendance => read_array::<AttendanceEntry>(path)?.into_iter().map(Record::from).collect(),
            Category::Leave => read_array::<LeaveEntry>(path)?.into_iter().map(Record::from).collect(),
        };
        Ok(records)
    }

    /// Concatenated contents of every `.txt` file under `dir`, sorted by path.
    pub fn load_policy_text(&self, dir: &Path) -> Result<String> {
        let mut parts = Vec::new();
        for path in self.list_files(dir, "txt", usize::MAX) {
            let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            let text = String::from_utf8_lossy(&bytes);
            let text = text.trim();
            if !text.is_empty() { parts.push(text.to_string()); }
        }
        Ok(parts.join("\n\n"))
    }

    fn list_files(&self, root: &Path, extension: &str, max_depth: usize) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).max_depth(max_depth).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(extension) { files.push(path.to_path_buf()); }
        }
        files.sort();
        files
    }
}

fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::validation(format!("malformed records in {}: {e}", path.display())))
}

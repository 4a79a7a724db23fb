use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use helix_core::config::IndexSettings;
use helix_core::{Category, Error, IndexKind, QueryResult, Result};
use tracing::{info, warn};

use crate::index::{IndexOptions, IndexStats, VectorIndex};

/// Outcome of `IndexRegistry::load_all`. Failed categories stay unregistered.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<Category>,
    pub failed: Vec<(Category, Error)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool { self.failed.is_empty() }
}

/// One vector index per category, all sharing the embedding dimension.
pub struct IndexRegistry {
    dim: usize,
    settings: IndexSettings,
    indexes: BTreeMap<Category, VectorIndex>,
}

impl IndexRegistry {
    pub fn new(dim: usize, settings: &IndexSettings) -> Self {
        Self { dim, settings: settings.clone(), indexes: BTreeMap::new() }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { self.indexes.len() }

    pub fn is_empty(&self) -> bool { self.indexes.is_empty() }

    pub fn categories(&self) -> Vec<Category> { self.indexes.keys().copied().collect() }

    /// Registers a fresh index, replacing any existing one for `category`.
    pub fn create_index(&mut self, category: Category, kind: IndexKind) -> &mut VectorIndex {
        let options = IndexOptions::from_settings(self.dim, &IndexSettings { kind, ..self.settings.clone() });
        info!(%category, %kind, dim = self.dim, "created index");
        let index = VectorIndex::new(category.as_str(), options);
        match self.indexes.entry(category) {
            Entry::Occupied(mut slot) => {
                slot.insert(index);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(index),
        }
    }

    /// Existing index for `category`, or a new one of the configured kind.
    pub fn ensure_index(&mut self, category: Category) -> &mut VectorIndex {
        let options = IndexOptions::from_settings(self.dim, &self.settings);
        self.indexes.entry(category).or_insert_with(|| VectorIndex::new(category.as_str(), options))
    }

    pub fn get_index(&self, category: Category) -> Result<&VectorIndex> {
        self.indexes.get(&category).ok_or(Error::UnknownIndex(category))
    }

    pub fn get_index_mut(&mut self, category: Category) -> Result<&mut VectorIndex> {
        self.indexes.get_mut(&category).ok_or(Error::UnknownIndex(category))
    }

    /// Runs the query against every index independently. No merging.
    pub fn search_all(&self, query: &[f32], k: usize) -> Result<BTreeMap<Category, Vec<QueryResult>>> {
        let mut out = BTreeMap::new();
        for (category, index) in &self.indexes {
            out.insert(*category, index.search(query, k)?);
        }
        Ok(out)
    }

    pub fn index_paths(base_dir: &Path, category: Category) -> (PathBuf, PathBuf) {
        (
            base_dir.join(format!("{}_index.json", category.as_str())),
            base_dir.join(format!("{}_docs.json", category.as_str())),
        )
    }

    pub fn save_all(&self, base_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(base_dir).map_err(|e| Error::io(base_dir, e))?;
        for (category, index) in &self.indexes {
            let (index_path, docs_path) = Self::index_paths(base_dir, *category);
            index.save(&index_path, &docs_path)?;
        }
        Ok(())
    }

    /// Loads each category on its own; a missing or corrupt artifact only
    /// takes that category out.
    pub fn load_all(&mut self, base_dir: &Path, categories: &[Category]) -> LoadReport {
        let mut report = LoadReport::default();
        for &category in categories {
            let (index_path, docs_path) = Self::index_paths(base_dir, category);
            let loaded = VectorIndex::load(&index_path, &docs_path).and_then(|index| {
                if index.dim() == self.dim {
                    Ok(index)
                } else {
                    Err(Error::persistence(
                        category.as_str(),
                        format!("dimension {} does not match registry dimension {}", index.dim(), self.dim),
                    ))
                }
            });
            match loaded {
                Ok(index) => {
                    self.indexes.insert(category, index);
                    report.loaded.push(category);
                }
                Err(e) => {
                    warn!(%category, error = %e, "index unavailable");
                    report.failed.push((category, e));
                }
            }
        }
        report
    }

    pub fn stats(&self) -> BTreeMap<Category, IndexStats> {
        self.indexes.iter().map(|(c, i)| (*c, i.stats())).collect()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use helix_core::traits::{Embeddable, StructuredStore};
use helix_core::{Category, Error, Filter, Record, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matcher::Matcher;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    records: Vec<Record>,
    #[serde(default)]
    unique_fields: BTreeSet<String>,
}

impl Collection {
    fn duplicate_in<'r>(field: &str, records: impl IntoIterator<Item = &'r Record>, seen: &mut HashSet<String>) -> Option<String> {
        records.into_iter().filter_map(|r| r.field(field)).find(|v| !seen.insert(v.clone()))
    }
}

/// Category-partitioned record collections behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<Category, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Category, Collection>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Category, Collection>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(&*self.read())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "saved store snapshot");
        Ok(())
    }

    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let collections: BTreeMap<Category, Collection> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::persistence(path.display().to_string(), format!("unreadable store snapshot: {e}")))?;
        info!(path = %path.display(), categories = collections.len(), "loaded store snapshot");
        Ok(Self { collections: RwLock::new(collections) })
    }
}

impl StructuredStore for MemoryStore {
    fn insert_many(&self, category: Category, records: Vec<Record>) -> Result<usize> {
        if let Some(stray) = records.iter().find(|r| r.category() != category) {
            return Err(Error::validation(format!("record '{}' does not belong to '{category}'", stray.record_id())));
        }
        let mut guard = self.write();
        let collection = guard.entry(category).or_default();
        for field in &collection.unique_fields {
            let mut seen: HashSet<String> = collection.records.iter().filter_map(|r| r.field(field)).collect();
            if let Some(dup) = Collection::duplicate_in(field, &records, &mut seen) {
                return Err(Error::validation(format!("duplicate value '{dup}' for unique field '{field}' in '{category}'")));
            }
        }
        let inserted = records.len();
        collection.records.extend(records);
        debug!(%category, inserted, total = collection.records.len(), "inserted records");
        Ok(inserted)
    }

    fn find_one(&self, category: Category, filter: &Filter) -> Result<Option<Record>> {
        let matcher = Matcher::compile(filter)?;
        let guard = self.read();
        Ok(guard.get(&category).and_then(|c| c.records.iter().find(|r| matcher.matches(r)).cloned()))
    }

    fn find_many(&self, category: Category, filter: &Filter, limit: usize) -> Result<Vec<Record>> {
        let matcher = Matcher::compile(filter)?;
        let guard = self.read();
        let Some(collection) = guard.get(&category) else { return Ok(Vec::new()) };
        Ok(collection.records.iter().filter(|r| matcher.matches(r)).take(limit).cloned().collect())
    }

    fn count(&self, category: Category, filter: Option<&Filter>) -> Result<usize> {
        let matcher = filter.map(Matcher::compile).transpose()?;
        let guard = self.read();
        let Some(collection) = guard.get(&category) else { return Ok(0) };
        Ok(match matcher {
            Some(m) => collection.records.iter().filter(|r| m.matches(r)).count(),
            None => collection.records.len(),
        })
    }

    /// Removes every record; unique indexes stay in place.
    fn delete_all(&self, category: Category) -> Result<usize> {
        let mut guard = self.write();
        let removed = guard.get_mut(&category).map_or(0, |c| std::mem::take(&mut c.records).len());
        debug!(%category, removed, "deleted records");
        Ok(removed)
    }

    fn create_unique_index(&self, category: Category, field: &str) -> Result<()> {
        let mut guard = self.write();
        let collection = guard.entry(category).or_default();
        if collection.unique_fields.contains(field) { return Ok(()); }
        if let Some(dup) = Collection::duplicate_in(field, &collection.records, &mut HashSet::new()) {
            return Err(Error::validation(format!("cannot index '{field}' in '{category}': duplicate value '{dup}'")));
        }
        collection.unique_fields.insert(field.to_string());
        Ok(())
    }
}

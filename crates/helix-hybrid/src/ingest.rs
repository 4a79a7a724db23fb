use std::collections::BTreeMap;

use helix_core::config::{EmbeddingSettings, RetrievalSettings};
use helix_core::traits::{Embedder, StructuredStore};
use helix_core::{Category, Error, Record, Result};
use helix_vector::{embed_records, IndexRegistry};
use tracing::{info, warn};

/// Per-category outcome of `Ingestor::ingest_all`.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<(Category, usize)>,
    pub failed: Vec<(Category, Error)>,
}

/// Rebuilds store collections and vector indexes from raw records.
#[derive(Debug, Clone)]
pub struct Ingestor {
    batch_size: usize,
    attendance_limit: usize,
}

impl Ingestor {
    pub fn new(embedding: &EmbeddingSettings, retrieval: &RetrievalSettings) -> Self {
        Self { batch_size: embedding.batch_size.max(1), attendance_limit: retrieval.attendance_sample_limit }
    }

    /// Replaces `category` in both the store and its index. Returns the
    /// number of indexed documents. On failure the category is left empty in
    /// both.
    pub fn ingest<S: StructuredStore + ?Sized>(
        &self,
        store: &S,
        registry: &mut IndexRegistry,
        embedder: &dyn Embedder,
        category: Category,
        mut records: Vec<Record>,
    ) -> Result<usize> {
        if category == Category::Attendance && records.len() > self.attendance_limit {
            warn!(total = records.len(), limit = self.attendance_limit, "sampling attendance records");
            records.truncate(self.attendance_limit);
        }

        registry.ensure_index(category).clear();
        let outcome = store
            .delete_all(category)
            .and_then(|_| match category {
                Category::Employees => store.create_unique_index(category, "emp_id"),
                _ => Ok(()),
            })
            .and_then(|()| store.insert_many(category, records.clone()))
        .and_then(|_| embed_records(embedder, records, self.batch_size))
        .and_then(|docs| registry.get_index_mut(category)?.add(docs));

        let added = match outcome {
            Ok(added) => added,
            Err(e) => {
                // leave the category empty on both sides rather than half-replaced
                if let Err(cleanup) = store.delete_all(category) {
                    warn!(%category, error = %cleanup, "could not roll back store after failed ingestion");
                }
                registry.ensure_index(category).clear();
                return Err(e);
            }
        };
        info!(%category, added, "ingested category");
        Ok(added)
    }

    /// Ingests every category independently; one failure does not stop the rest.
    pub fn ingest_all<S: StructuredStore + ?Sized>(
        &self,
        store: &S,
        registry: &mut IndexRegistry,
        embedder: &dyn Embedder,
        records: BTreeMap<Category, Vec<Record>>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        for (category, batch) in records {
            match self.ingest(store, registry, embedder, category, batch) {
                Ok(n) => report.ingested.push((category, n)),
                Err(e) => {
                    warn!(%category, error = %e, "ingestion failed");
                    report.failed.push((category, e));
                }
            }
        }
        report
    }
}

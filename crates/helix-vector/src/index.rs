use std::path::Path;

use helix_core::config::IndexSettings;
use helix_core::{Document, Error, IndexKind, QueryResult, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ann::{build_ann, AnnIndex};
use crate::persist::{self, IndexArtifact};

/// Construction parameters of a `VectorIndex`; persisted with the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub kind: IndexKind,
    pub dim: usize,
    pub nlist: usize,
    pub nprobe: usize,
    pub train_iterations: usize,
    pub overfetch: usize,
}

impl IndexOptions {
    pub fn new(kind: IndexKind, dim: usize) -> Self {
        Self::from_settings(dim, &IndexSettings { kind, ..IndexSettings::default() })
    }

    pub fn from_settings(dim: usize, settings: &IndexSettings) -> Self {
        Self {
            kind: settings.kind,
            dim,
            nlist: settings.nlist,
            nprobe: settings.nprobe,
            train_iterations: settings.train_iterations,
            overfetch: settings.overfetch.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_vectors: usize,
    pub dimension: usize,
    pub index_kind: IndexKind,
    pub is_trained: bool,
    pub total_documents: usize,
}

/// Maps a squared L2 distance into `(0, 1]`; identical vectors score 1.
/// Overflowing distances bottom out at `f32::MIN_POSITIVE`, never zero.
#[inline]
pub fn similarity_from_distance(distance: f32) -> f32 {
    let s = 1.0 / (1.0 + f64::from(distance.max(0.0)));
    (s as f32).max(f32::MIN_POSITIVE)
}

/// One category's vectors and the documents they were computed from.
///
/// Position `i` of the ANN backend always belongs to `documents[i]`.
pub struct VectorIndex {
    name: String,
    options: IndexOptions,
    ann: Box<dyn AnnIndex>,
    documents: Vec<Document>,
}

impl VectorIndex {
    pub fn new(name: impl Into<String>, options: IndexOptions) -> Self {
        let ann = build_ann(&options);
        Self { name: name.into(), options, ann, documents: Vec::new() }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn options(&self) -> &IndexOptions { &self.options }

    pub fn dim(&self) -> usize { self.options.dim }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn documents(&self) -> &[Document] { &self.documents }

    fn check_dim(&self, what: &str, len: usize) -> Result<()> {
        if len != self.options.dim {
            return Err(Error::validation(format!(
                "{what} has dimension {len}, index '{}' expects {}",
                self.name, self.options.dim
            )));
        }
        Ok(())
    }

    /// Appends documents and their embeddings. The whole batch is checked
    /// first; on any error nothing is added.
    pub fn add(&mut self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() { return Ok(0); }
        let mut vectors = Vec::with_capacity(documents.len());
        for doc in &documents {
            let Some(embedding) = doc.embedding.as_ref() else {
                return Err(Error::validation(format!("document '{}' has no embedding", doc.id())));
            };
            self.check_dim(&format!("embedding of '{}'", doc.id()), embedding.len())?;
            vectors.push(embedding.clone());
        }
        let added = documents.len();
        self.ann.add(&vectors);
        self.documents.extend(documents);
        debug_assert_eq!(self.ann.len(), self.documents.len());
        debug!(index = %self.name, added, total = self.documents.len(), "added documents");
        Ok(added)
    }

    /// Explicit training for clustered backends; flat indexes ignore it.
    pub fn train(&mut self, sample: &[Vec<f32>]) -> Result<()> {
        for v in sample { self.check_dim("training vector", v.len())?; }
        self.ann.train(sample);
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        self.check_dim("query", query.len())?;
        if k == 0 || self.documents.is_empty() { return Ok(Vec::new()); }
        let results = self
            .ann
            .search(query, k)
            .into_iter()
            .filter_map(|n| {
                self.documents
                    .get(n.position)
                    .map(|doc| QueryResult { document: doc.clone(), similarity: similarity_from_distance(n.distance) })
            })
            .collect();
        Ok(results)
    }

    /// Search over `min(overfetch * k, len)` candidates, keep those accepted by
    /// `predicate`, return at most `k`. Fewer than `k` results are possible
    /// even when more matching documents exist.
    pub fn search_with_filter<F>(&self, query: &[f32], k: usize, predicate: F) -> Result<Vec<QueryResult>>
    where
        F: Fn(&Document) -> bool,
    {
        let fetch = self.options.overfetch.saturating_mul(k).min(self.documents.len());
        let mut results = self.search(query, fetch)?;
        results.retain(|r| predicate(&r.document));
        results.truncate(k);
        Ok(results)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_vectors: self.ann.len(),
            dimension: self.options.dim,
            index_kind: self.options.kind,
            is_trained: self.ann.is_trained(),
            total_documents: self.documents.len(),
        }
    }

    /// Drops all vectors and documents; the index becomes untrained.
    pub fn clear(&mut self) {
        self.ann = build_ann(&self.options);
        self.documents.clear();
        debug!(index = %self.name, "cleared");
    }

    pub fn save(&self, index_path: &Path, documents_path: &Path) -> Result<()> {
        let docs_bytes = serde_json::to_vec(&self.documents)?;
        persist::write_file(documents_path, &docs_bytes)?;
        let artifact = IndexArtifact::new(&self.name, &self.options, self.documents.len(), &docs_bytes, self.ann.snapshot());
        persist::write_file(index_path, &serde_json::to_vec(&artifact)?)?;
        info!(index = %self.name, documents = self.documents.len(), path = %index_path.display(), "saved index");
        Ok(())
    }

    pub fn load(index_path: &Path, documents_path: &Path) -> Result<Self> {
        let artifact = IndexArtifact::read(index_path)?;
        let docs_bytes = persist::read_file(documents_path)?;
        artifact.verify_documents(&docs_bytes)?;
        let documents: Vec<Document> = serde_json::from_slice(&docs_bytes)
            .map_err(|e| Error::persistence(&artifact.name, format!("unreadable documents artifact: {e}")))?;
        let IndexArtifact { name, options, document_count, ann, .. } = artifact;
        if ann.kind() != options.kind {
            return Err(Error::persistence(&name, format!("snapshot is {} but options say {}", ann.kind(), options.kind)));
        }
        ann.validate().map_err(|e| Error::persistence(&name, format!("corrupt index snapshot: {e}")))?;
        let ann = ann.into_index();
        if documents.len() != document_count || ann.len() != document_count {
            return Err(Error::persistence(
                &name,
                format!("expected {document_count} entries, found {} documents and {} vectors", documents.len(), ann.len()),
            ));
        }
        if ann.dim() != options.dim {
            return Err(Error::persistence(&name, format!("vector dimension {} differs from {}", ann.dim(), options.dim)));
        }
        info!(index = %name, documents = documents.len(), "loaded index");
        Ok(Self { name, options, ann, documents })
    }
}

use std::collections::BTreeMap;
use std::path::Path;

use helix_core::config::Settings;
use helix_core::traits::{Embedder, StructuredStore};
use helix_core::{Category, Document, Error, QueryResult, Record, Response, Result, SearchMethod};
use helix_vector::{IndexRegistry, LoadReport};
use tracing::{debug, info};

use crate::ingest::{IngestReport, Ingestor};
use crate::prompt::truncate_chars;
use crate::structured::StructuredMatcher;
use crate::synth::ResponseSynthesizer;

/// Evidence found for a query before any answer is generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Structured(Vec<Document>),
    Semantic(Vec<QueryResult>),
    Empty(SearchMethod),
}

impl Retrieval {
    pub fn method(&self) -> SearchMethod {
        match self {
            Retrieval::Structured(_) => SearchMethod::Structured,
            Retrieval::Semantic(_) => SearchMethod::Semantic,
            Retrieval::Empty(method) => *method,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Retrieval::Structured(docs) => docs.len(),
            Retrieval::Semantic(results) => results.len(),
            Retrieval::Empty(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Which indexes a semantic query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Category(Category),
}

/// Flattens per-category results into one list sorted by similarity, highest
/// first, keeping the first `k`. Equal scores keep category order.
pub fn merge_ranked(per_category: BTreeMap<Category, Vec<QueryResult>>, k: usize) -> Vec<QueryResult> {
    let mut merged: Vec<QueryResult> = per_category.into_values().flatten().collect();
    merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    merged.truncate(k);
    merged
}

pub fn apply_threshold(mut results: Vec<QueryResult>, threshold: f32) -> Vec<QueryResult> {
    results.retain(|r| r.similarity >= threshold);
    results
}

fn mean_similarity(results: &[QueryResult]) -> f32 {
    if results.is_empty() { return 0.0; }
    results.iter().map(|r| r.similarity).sum::<f32>() / results.len() as f32
}

/// Hybrid retrieval over a structured store and per-category vector indexes.
pub struct Retriever<S>
where
    S: StructuredStore,
{
    store: S,
    registry: IndexRegistry,
    embedder: Box<dyn Embedder>,
    synthesizer: ResponseSynthesizer,
    matcher: StructuredMatcher,
    ingestor: Ingestor,
    settings: Settings,
    policy_text: String,
}

impl<S> Retriever<S>
where
    S: StructuredStore,
{
    pub fn new(
        store: S,
        registry: IndexRegistry,
        embedder: Box<dyn Embedder>,
        synthesizer: ResponseSynthesizer,
        settings: &Settings,
    ) -> Result<Self> {
        if embedder.dim() != registry.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder produces {} dimensions but the index registry expects {}",
                embedder.dim(),
                registry.dim()
            )));
        }
        Ok(Self {
            matcher: StructuredMatcher::new(&settings.retrieval.id_prefix)?,
            ingestor: Ingestor::new(&settings.embedding, &settings.retrieval),
            settings: settings.clone(),
            store,
            registry,
            embedder,
            synthesizer,
            policy_text: String::new(),
        })
    }

    pub fn store(&self) -> &S { &self.store }

    pub fn registry(&self) -> &IndexRegistry { &self.registry }

    pub fn policy_text(&self) -> &str { &self.policy_text }

    pub fn set_policy_text(&mut self, text: impl Into<String>) { self.policy_text = text.into(); }

    pub fn query(&self, query: &str) -> Result<Response> {
        self.query_with(query, self.settings.retrieval.structured_enabled)
    }

    pub fn query_with(&self, query: &str, use_structured: bool) -> Result<Response> {
        let query = query.trim();
        info!(query, "processing query");
        let (docs, confidence, method) = match self.retrieve_with(query, use_structured)? {
            Retrieval::Empty(method) => {
                info!(%method, "no relevant information");
                return Ok(Response::no_information(method));
            }
            Retrieval::Structured(docs) => (docs, self.settings.retrieval.structured_confidence, SearchMethod::Structured),
            Retrieval::Semantic(results) => {
                let confidence = mean_similarity(&results);
                (results.into_iter().map(|r| r.document).collect(), confidence, SearchMethod::Semantic)
            }
        };
        let policy = truncate_chars(&self.policy_text, self.settings.retrieval.max_context_chars);
        self.synthesizer.synthesize(query, docs, confidence, method, policy)
    }

    pub fn retrieve(&self, query: &str) -> Result<Retrieval> {
        self.retrieve_with(query, self.settings.retrieval.structured_enabled)
    }

    fn retrieve_with(&self, query: &str, use_structured: bool) -> Result<Retrieval> {
        let query = query.trim();
        if query.is_empty() { return Ok(Retrieval::Empty(SearchMethod::None)); }

        if use_structured {
            let docs = self.matcher.lookup(&self.store, query)?;
            if !docs.is_empty() {
                debug!(hits = docs.len(), "structured match");
                return Ok(Retrieval::Structured(docs));
            }
        }

        let hits = self.query_semantic(query, Scope::All, self.settings.retrieval.top_k)?;
        let found = hits.len();
        let kept = apply_threshold(hits, self.settings.retrieval.similarity_threshold);
        debug!(found, kept = kept.len(), threshold = self.settings.retrieval.similarity_threshold, "semantic search");
        if kept.is_empty() {
            Ok(Retrieval::Empty(SearchMethod::Semantic))
        } else {
            Ok(Retrieval::Semantic(kept))
        }
    }

    /// Unthresholded nearest neighbours from one index or all of them.
    pub fn query_semantic(&self, query: &str, scope: Scope, k: usize) -> Result<Vec<QueryResult>> {
        let vector = self.embedder.embed(query).map_err(|e| Error::backend("embedding", e))?;
        match scope {
            Scope::All => Ok(merge_ranked(self.registry.search_all(&vector, k)?, k)),
            Scope::Category(category) => self.registry.get_index(category)?.search(&vector, k),
        }
    }

    pub fn ingest_category(&mut self, category: Category, records: Vec<Record>) -> Result<usize> {
        self.ingestor.ingest(&self.store, &mut self.registry, self.embedder.as_ref(), category, records)
    }

    pub fn ingest_all(&mut self, records: BTreeMap<Category, Vec<Record>>) -> IngestReport {
        self.ingestor.ingest_all(&self.store, &mut self.registry, self.embedder.as_ref(), records)
    }

    pub fn save_indexes(&self, base_dir: &Path) -> Result<()> { self.registry.save_all(base_dir) }

    pub fn load_indexes(&mut self, base_dir: &Path) -> LoadReport { self.registry.load_all(base_dir, &Category::ALL) }
}

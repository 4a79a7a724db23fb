//! Nearest-neighbor backends. Both store vectors by insertion position so the
//! owning `VectorIndex` can map a hit straight back to its document.

mod flat;
mod ivf;

use helix_core::IndexKind;
use serde::{Deserialize, Serialize};

pub use flat::FlatIndex;
pub use ivf::IvfIndex;

use crate::index::IndexOptions;

/// One search hit: insertion position plus squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Vector storage and k-NN search. Callers validate dimensions beforehand.
pub trait AnnIndex: Send + Sync {
    fn kind(&self) -> IndexKind;
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    fn is_trained(&self) -> bool;
    /// Fits the backend to a sample. A no-op once trained.
    fn train(&mut self, sample: &[Vec<f32>]);
    /// Appends vectors; their positions continue from `len()`.
    fn add(&mut self, vectors: &[Vec<f32>]);
    /// Up to `k` neighbors, ascending by distance.
    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor>;
    fn snapshot(&self) -> AnnSnapshot;
}

/// Serializable form of any backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnnSnapshot {
    Flat(FlatIndex),
    Ivf(IvfIndex),
}

impl AnnSnapshot {
    pub fn kind(&self) -> IndexKind {
        match self {
            AnnSnapshot::Flat(_) => IndexKind::Flat,
            AnnSnapshot::Ivf(_) => IndexKind::Ivf,
        }
    }

    /// Structural consistency of a deserialized snapshot.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            AnnSnapshot::Flat(f) => f.validate(),
            AnnSnapshot::Ivf(i) => i.validate(),
        }
    }

    pub fn into_index(self) -> Box<dyn AnnIndex> {
        match self {
            AnnSnapshot::Flat(f) => Box::new(f),
            AnnSnapshot::Ivf(i) => Box::new(i),
        }
    }
}

pub fn build_ann(options: &IndexOptions) -> Box<dyn AnnIndex> {
    match options.kind {
        IndexKind::Flat => Box::new(FlatIndex::new(options.dim)),
        IndexKind::Ivf => Box::new(IvfIndex::new(options.dim, options.nlist, options.nprobe, options.train_iterations)),
    }
}

#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| { let d = x - y; d * d }).sum()
}

pub(crate) fn sort_neighbors(hits: &mut Vec<Neighbor>, k: usize) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
    hits.truncate(k);
}

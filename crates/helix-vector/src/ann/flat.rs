use helix_core::IndexKind;
use serde::{Deserialize, Serialize};

use super::{sort_neighbors, squared_l2, AnnIndex, AnnSnapshot, Neighbor};

/// Exact scan over a contiguous `len * dim` buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self { Self { dim, data: Vec::new() } }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.dim == 0 { return Err("dimension is zero".into()); }
        if self.data.len() % self.dim != 0 {
            return Err(format!("{} values do not split into rows of {}", self.data.len(), self.dim));
        }
        Ok(())
    }
}

impl AnnIndex for FlatIndex {
    fn kind(&self) -> IndexKind { IndexKind::Flat }

    fn dim(&self) -> usize { self.dim }

    fn len(&self) -> usize { if self.dim == 0 { 0 } else { self.data.len() / self.dim } }

    fn is_trained(&self) -> bool { true }

    fn train(&mut self, _sample: &[Vec<f32>]) {}

    fn add(&mut self, vectors: &[Vec<f32>]) {
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors { self.data.extend_from_slice(v); }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.dim == 0 { return Vec::new(); }
        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, v)| Neighbor { position, distance: squared_l2(query, v) })
            .collect();
        sort_neighbors(&mut hits, k);
        hits
    }

    fn snapshot(&self) -> AnnSnapshot { AnnSnapshot::Flat(self.clone()) }
}

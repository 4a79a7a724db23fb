use helix_core::IndexKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{sort_neighbors, squared_l2, AnnIndex, AnnSnapshot, Neighbor};

const KMEANS_SEED: u64 = 0x5eed_1f00;

/// Inverted file index: k-means centroids partition the space and each
/// inverted list holds the positions of the vectors assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvfIndex {
    dim: usize,
    nlist: usize,
    nprobe: usize,
    iterations: usize,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<usize>>,
    data: Vec<f32>,
}

impl IvfIndex {
    pub fn new(dim: usize, nlist: usize, nprobe: usize, iterations: usize) -> Self {
        Self {
            dim,
            nlist: nlist.max(1),
            nprobe: nprobe.max(1),
            iterations: iterations.max(1),
            centroids: Vec::new(),
            lists: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Number of centroids actually trained; `nlist` clamped to the sample size.
    pub fn centroid_count(&self) -> usize { self.centroids.len() }

    /// Checks that every stored position is reachable through exactly one
    /// inverted list and that centroids match the dimension.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.dim == 0 { return Err("dimension is zero".into()); }
        if self.data.len() % self.dim != 0 {
            return Err(format!("{} values do not split into rows of {}", self.data.len(), self.dim));
        }
        if self.lists.len() != self.centroids.len() {
            return Err(format!("{} inverted lists for {} centroids", self.lists.len(), self.centroids.len()));
        }
        if let Some(c) = self.centroids.iter().find(|c| c.len() != self.dim) {
            return Err(format!("centroid of dimension {} in a {}-d index", c.len(), self.dim));
        }
        let len = self.len();
        let mut seen = vec![false; len];
        for &position in self.lists.iter().flatten() {
            match seen.get_mut(position) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("position {position} listed twice")),
                None => return Err(format!("position {position} out of range for {len} vectors")),
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(format!("position {missing} is not in any inverted list"));
        }
        Ok(())
    }

    fn nearest_centroid(&self, v: &[f32]) -> usize {
        nearest(&self.centroids, v)
    }
}

fn nearest(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_l2(c, v)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(i, _)| i)
}

fn kmeans(sample: &[Vec<f32>], k: usize, dim: usize, iterations: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut centroids: Vec<Vec<f32>> = rand::seq::index::sample(&mut rng, sample.len(), k)
        .into_iter()
        .map(|i| sample[i].clone())
        .collect();
    let mut assignment = vec![usize::MAX; sample.len()];
    for iter in 0..iterations {
        let mut changed = false;
        for (slot, v) in assignment.iter_mut().zip(sample) {
            let c = nearest(&centroids, v);
            if *slot != c { *slot = c; changed = true; }
        }
        if !changed {
            debug!(iter, "k-means converged");
            break;
        }
        let mut sums = vec![vec![0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (&c, v) in assignment.iter().zip(sample) {
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(v) { *s += x; }
        }
        for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            // empty clusters keep their previous centroid
            if count > 0 {
                *centroid = sum.into_iter().map(|s| s / count as f32).collect();
            }
        }
    }
    centroids
}

impl AnnIndex for IvfIndex {
    fn kind(&self) -> IndexKind { IndexKind::Ivf }

    fn dim(&self) -> usize { self.dim }

    fn len(&self) -> usize { if self.dim == 0 { 0 } else { self.data.len() / self.dim } }

    fn is_trained(&self) -> bool { !self.centroids.is_empty() }

    fn train(&mut self, sample: &[Vec<f32>]) {
        if self.is_trained() || sample.is_empty() { return; }
        let k = self.nlist.min(sample.len());
        self.centroids = kmeans(sample, k, self.dim, self.iterations);
        self.lists = vec![Vec::new(); k];
        let positions: Vec<(usize, usize)> = self
            .data
            .chunks_exact(self.dim.max(1))
            .enumerate()
            .map(|(pos, v)| (pos, self.nearest_centroid(v)))
            .collect();
        for (pos, c) in positions { self.lists[c].push(pos); }
        debug!(nlist = k, sample = sample.len(), "trained IVF quantizer");
    }

    fn add(&mut self, vectors: &[Vec<f32>]) {
        if vectors.is_empty() { return; }
        if !self.is_trained() { self.train(vectors); }
        for v in vectors {
            let position = self.len();
            let c = self.nearest_centroid(v);
            self.data.extend_from_slice(v);
            self.lists[c].push(position);
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || !self.is_trained() || self.data.is_empty() { return Vec::new(); }
        let mut ranked: Vec<(usize, f32)> = self.centroids.iter().enumerate().map(|(i, c)| (i, squared_l2(c, query))).collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut hits = Vec::new();
        for &(list, _) in ranked.iter().take(self.nprobe) {
            for &position in &self.lists[list] {
                let start = position * self.dim;
                if let Some(v) = self.data.get(start..start + self.dim) {
                    hits.push(Neighbor { position, distance: squared_l2(query, v) });
                }
            }
        }
        sort_neighbors(&mut hits, k);
        hits
    }

    fn snapshot(&self) -> AnnSnapshot { AnnSnapshot::Ivf(self.clone()) }
}

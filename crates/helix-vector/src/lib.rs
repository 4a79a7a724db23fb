//! In-process vector indexes: flat and IVF backends, a per-category registry,
//! JSON persistence with digest checks, and batch embedding of records.

pub mod ann;
pub mod index;
pub mod ingest;
pub mod persist;
pub mod registry;

pub use ann::{AnnIndex, AnnSnapshot, FlatIndex, IvfIndex, Neighbor};
pub use index::{similarity_from_distance, IndexOptions, IndexStats, VectorIndex};
pub use ingest::embed_records;
pub use registry::{IndexRegistry, LoadReport};

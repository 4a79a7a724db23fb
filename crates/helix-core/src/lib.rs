//! Shared domain model for the Helix HR retrieval engine: records, documents,
//! responses, collaborator traits, typed errors and configuration.

pub mod config;
pub mod error;
mod lenient;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Embeddable, Embedder, LanguageModel, StructuredStore};
pub use types::{
    AttendanceEntry, Category, ConfidenceLevel, Document, Employee, Filter, IndexKind, LeaveEntry, QueryResult,
    Record, Response, SearchMethod,
};

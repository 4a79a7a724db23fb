//! Hybrid HR retrieval: exact structured lookups first, semantic fan-out
//! search across category indexes otherwise, then one grounded LM answer.

pub mod ingest;
pub mod llm;
pub mod prompt;
pub mod retriever;
pub mod structured;
pub mod synth;

pub use ingest::{IngestReport, Ingestor};
pub use llm::OllamaModel;
pub use prompt::{truncate_chars, PromptBuilder};
pub use retriever::{apply_threshold, merge_ranked, Retrieval, Retriever, Scope};
pub use structured::{StructuredMatcher, StructuredQuery};
pub use synth::ResponseSynthesizer;

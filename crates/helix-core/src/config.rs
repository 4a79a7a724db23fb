//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K`).
//! Loading never touches the filesystem beyond reading those files.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::IndexKind;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Wraps an already assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    /// Typed, validated settings. Every section falls back to its defaults.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding `<category>.json` record files and policy `.txt` files.
    pub records_dir: String,
    /// Base directory for `<category>_index.json` / `<category>_docs.json`.
    pub index_dir: String,
    /// JSON snapshot of the structured store.
    pub store_snapshot: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            records_dir: "data".to_string(),
            index_dir: "indexes".to_string(),
            store_snapshot: "indexes/store.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Hashing,
    Sentence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: Option<String>,
    /// Output size of the hashing backend; the sentence backend reports its own.
    pub dimension: usize,
    pub batch_size: usize,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Hashing, model_dir: None, dimension: 384, batch_size: 32, max_len: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub kind: IndexKind,
    pub nlist: usize,
    pub nprobe: usize,
    pub train_iterations: usize,
    /// Candidate multiplier for filtered search. A heuristic, not a bound.
    pub overfetch: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { kind: IndexKind::Flat, nlist: 100, nprobe: 8, train_iterations: 20, overfetch: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub structured_enabled: bool,
    /// Fixed confidence reported for exact structured matches. Exact hits carry
    /// no similarity score, so this is a declared constant, not a statistic.
    pub structured_confidence: f32,
    pub id_prefix: String,
    pub max_context_chars: usize,
    pub attendance_sample_limit: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.3,
            structured_enabled: true,
            structured_confidence: 0.9,
            id_prefix: "EMP".to_string(),
            max_context_chars: 2000,
            attendance_sample_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "llama3.1".to_string(),
            max_tokens: 800,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&r.similarity_threshold) {
            return Err(Error::InvalidConfig("retrieval.similarity_threshold must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&r.structured_confidence) {
            return Err(Error::InvalidConfig("retrieval.structured_confidence must be within [0, 1]".into()));
        }
        if r.id_prefix.trim().is_empty() {
            return Err(Error::InvalidConfig("retrieval.id_prefix must not be empty".into()));
        }
        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 || self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.dimension, batch_size and max_len must be positive".into()));
        }
        let i = &self.index;
        if i.nlist == 0 || i.nprobe == 0 || i.train_iterations == 0 || i.overfetch == 0 {
            return Err(Error::InvalidConfig("index.nlist, nprobe, train_iterations and overfetch must be positive".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

//! Embedding providers: a deterministic hashing embedder and a local
//! candle-backed sentence encoder, selected from `EmbeddingSettings`.

mod device;
mod hashing;
mod pool;
mod sentence;
mod tokenize;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use helix_core::config::{expand_path, EmbeddingBackend, EmbeddingSettings};
use helix_core::traits::Embedder;
use tracing::info;

pub use device::select_device;
pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use sentence::SentenceEmbedder;
pub use tokenize::tokenize_batch;

const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Builds the configured embedder. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing embedder regardless of configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || settings.backend == EmbeddingBackend::Hashing {
        info!(dim = settings.dimension, "using hashing embedder");
        return Ok(Box::new(HashingEmbedder::new(settings.dimension)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(SentenceEmbedder::load(&model_dir, settings.max_len, settings.batch_size)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() { info!(var, path = %p.display(), "using model dir from environment"); return Ok(p); }
        }
    }
    for candidate in [format!("models/{DEFAULT_MODEL}"), format!("../models/{DEFAULT_MODEL}")] {
        let p = Path::new(&candidate);
        if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate the {DEFAULT_MODEL} model directory"))
}

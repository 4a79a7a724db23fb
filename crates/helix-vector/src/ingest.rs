use anyhow::anyhow;
use helix_core::traits::Embedder;
use helix_core::{Document, Error, Record, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Embeds records in batches, keeping input order. Any backend failure or a
/// short batch aborts the whole call.
pub fn embed_records(embedder: &dyn Embedder, records: Vec<Record>, batch_size: usize) -> Result<Vec<Document>> {
    if records.is_empty() { return Ok(Vec::new()); }
    let total = records.len();
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    let mut out = Vec::with_capacity(total);
    let mut pending = records.into_iter().map(Document::from_record).peekable();
    while pending.peek().is_some() {
        let batch: Vec<Document> = pending.by_ref().take(batch_size.max(1)).collect();
        let texts: Vec<String> = batch.iter().map(|d| d.embedding_text.clone().unwrap_or_default()).collect();
        let vectors = embedder.embed_batch(&texts).map_err(|e| Error::backend("embedding", e))?;
        if vectors.len() != batch.len() {
            return Err(Error::backend(
                "embedding",
                anyhow!("embedder returned {} vectors for {} texts", vectors.len(), batch.len()),
            ));
        }
        pb.inc(batch.len() as u64);
        out.extend(batch.into_iter().zip(vectors).map(|(doc, v)| doc.with_embedding(v)));
    }
    pb.finish_with_message("embedded");
    info!(records = total, "embedded records");
    Ok(out)
}

use std::path::Path;

use helix_core::config::{resolve_with_base, Config};
use helix_core::Category;
use helix_vector::IndexRegistry;

fn main() -> anyhow::Result<()> {
    let ws_root = Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap_or(Path::new("."));
    let settings = Config::load()?.settings()?;
    let index_dir = resolve_with_base(ws_root, &settings.data.index_dir);

    let mut registry = IndexRegistry::new(settings.embedding.dimension, &settings.index);
    let report = registry.load_all(&index_dir, &Category::ALL);
    for (category, stats) in registry.stats() {
        println!(
            "{category}: kind={} vectors={} documents={} trained={}",
            stats.index_kind, stats.total_vectors, stats.total_documents, stats.is_trained
        );
    }
    for (category, err) in &report.failed { println!("{category}: unavailable ({err})"); }
    Ok(())
}

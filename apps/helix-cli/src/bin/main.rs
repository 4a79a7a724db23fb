use std::env;
use std::path::{Path, PathBuf};

use helix_core::config::{resolve_with_base, Config, Settings};
use helix_core::loader::RecordLoader;
use helix_core::traits::StructuredStore;
use helix_core::Category;
use helix_embed::get_default_embedder;
use helix_hybrid::{OllamaModel, PromptBuilder, ResponseSynthesizer, Retrieval, Retriever};
use helix_store::MemoryStore;
use helix_vector::IndexRegistry;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: helix <ingest [records_dir] | query \"<text>\" | search \"<text>\" | stats>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

struct Paths {
    records_dir: PathBuf,
    index_dir: PathBuf,
    store_snapshot: PathBuf,
}

impl Paths {
    fn new(base: &Path, settings: &Settings) -> Self {
        Self {
            records_dir: resolve_with_base(base, &settings.data.records_dir),
            index_dir: resolve_with_base(base, &settings.data.index_dir),
            store_snapshot: resolve_with_base(base, &settings.data.store_snapshot),
        }
    }
}

fn build_retriever(settings: &Settings, paths: &Paths, fresh_store: bool) -> anyhow::Result<Retriever<MemoryStore>> {
    let store = if !fresh_store && paths.store_snapshot.exists() {
        MemoryStore::load_snapshot(&paths.store_snapshot)?
    } else {
        MemoryStore::new()
    };
    let embedder = get_default_embedder(&settings.embedding)?;
    let registry = IndexRegistry::new(embedder.dim(), &settings.index);
    let synthesizer = ResponseSynthesizer::new(Box::new(OllamaModel::new(&settings.llm)?), &settings.llm);
    Ok(Retriever::new(store, registry, embedder, synthesizer, settings)?)
}

fn load_serving_state(retriever: &mut Retriever<MemoryStore>, paths: &Paths) -> anyhow::Result<()> {
    let report = retriever.load_indexes(&paths.index_dir);
    for (category, err) in &report.failed { warn!(%category, error = %err, "serving without index"); }
    if paths.records_dir.is_dir() {
        retriever.set_policy_text(RecordLoader::new().load_policy_text(&paths.records_dir)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let base = env::current_dir()?;
    let mut paths = Paths::new(&base, &settings);
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "ingest" => {
            if let Some(dir) = args.first() { paths.records_dir = resolve_with_base(&base, dir); }
            println!("Ingesting from {}", paths.records_dir.display());
            let records = RecordLoader::new().load_directory(&paths.records_dir)?;
            let mut retriever = build_retriever(&settings, &paths, true)?;
            let report = retriever.ingest_all(records);
            retriever.save_indexes(&paths.index_dir)?;
            retriever.store().save_snapshot(&paths.store_snapshot)?;
            for (category, n) in &report.ingested { println!("✅ {category}: {n} records indexed"); }
            for (category, err) in &report.failed { println!("❌ {category}: {err}"); }
        }
        "query" => {
            let Some(text) = args.first() else { eprintln!("Usage: helix query \"<text>\""); std::process::exit(1) };
            let mut retriever = build_retriever(&settings, &paths, false)?;
            load_serving_state(&mut retriever, &paths)?;
            let response = retriever.query(text)?;
            println!("{}\n", response.answer);
            println!(
                "method: {}  confidence: {:.2} ({:?})",
                response.search_method, response.confidence, response.confidence_level
            );
            if response.has_sources() { println!("{}", PromptBuilder::format_source_references(&response.sources)); }
        }
        "search" => {
            let Some(text) = args.first() else { eprintln!("Usage: helix search \"<text>\""); std::process::exit(1) };
            let mut retriever = build_retriever(&settings, &paths, false)?;
            load_serving_state(&mut retriever, &paths)?;
            match retriever.retrieve(text)? {
                Retrieval::Structured(docs) => {
                    for doc in &docs { println!("[structured] {} {}", doc.category(), doc.id()); }
                }
                Retrieval::Semantic(hits) => {
                    for hit in &hits { println!("[{:.3}] {} {}", hit.similarity, hit.document.category(), hit.document.id()); }
                }
                Retrieval::Empty(method) => println!("No results ({method})"),
            }
        }
        "stats" => {
            let mut retriever = build_retriever(&settings, &paths, false)?;
            load_serving_state(&mut retriever, &paths)?;
            for category in Category::ALL {
                let stored = retriever.store().count(category, None)?;
                match retriever.registry().get_index(category) {
                    Ok(index) => {
                        let s = index.stats();
                        println!(
                            "{category}: stored={stored} vectors={} kind={} dim={} trained={}",
                            s.total_vectors, s.index_kind, s.dimension, s.is_trained
                        );
                    }
                    Err(_) => println!("{category}: stored={stored} (no index)"),
                }
            }
        }
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}

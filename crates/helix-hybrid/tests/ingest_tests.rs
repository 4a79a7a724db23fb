use std::collections::BTreeMap;

use helix_core::config::Settings;
use helix_core::traits::{Embedder, LanguageModel, StructuredStore};
use helix_core::{AttendanceEntry, Category, Employee, Record, SearchMethod};
use helix_embed::HashingEmbedder;
use helix_hybrid::{ResponseSynthesizer, Retrieval, Retriever};
use helix_store::MemoryStore;
use helix_vector::IndexRegistry;
use tempfile::TempDir;

struct EchoModel;

impl LanguageModel for EchoModel {
    fn generate(&self, prompt: &str, _: usize, _: f32) -> anyhow::Result<String> { Ok(format!("{} chars", prompt.len())) }
}

fn employee(id: &str, name: &str, dept: &str) -> Record {
    Record::Employee(Employee {
        emp_id: id.into(),
        name: name.into(),
        dept: Some(dept.into()),
        location: Some("Bengaluru".into()),
        role: None,
        joining_date: None,
        performance_rating: Some("4.2".into()),
        certifications: None,
    })
}

fn attendance(id: &str, day: u32) -> Record {
    Record::Attendance(AttendanceEntry {
        emp_id: id.into(),
        date: format!("2024-03-{day:02}"),
        check_in: Some("09:15".into()),
        check_out: None,
        location_logged: Some("Remote".into()),
        device: Some("Laptop".into()),
    })
}

fn settings() -> Settings {
    let mut s = Settings::default();
    s.embedding.dimension = 64;
    s.retrieval.attendance_sample_limit = 2;
    s.retrieval.similarity_threshold = 0.0;
    s
}

fn retriever(settings: &Settings) -> Retriever<MemoryStore> {
    let embedder = HashingEmbedder::new(settings.embedding.dimension);
    let registry = IndexRegistry::new(embedder.dim(), &settings.index);
    let synthesizer = ResponseSynthesizer::new(Box::new(EchoModel), &settings.llm);
    Retriever::new(MemoryStore::new(), registry, Box::new(embedder), synthesizer, settings).unwrap()
}

fn records() -> BTreeMap<Category, Vec<Record>> {
    let mut records = BTreeMap::new();
    records.insert(
        Category::Employees,
        vec![employee("EMP1001", "Priya Sharma", "Finance"), employee("EMP1002", "Arjun Mehta", "Engineering")],
    );
    records.insert(Category::Attendance, (1..=3).map(|d| attendance("EMP1001", d)).collect());
    records
}

#[test]
fn ingest_fills_store_and_indexes_with_attendance_cap() {
    let settings = settings();
    let mut r = retriever(&settings);
    let report = r.ingest_all(records());

    assert!(report.failed.is_empty(), "{:?}", report.failed);
    assert_eq!(report.ingested, vec![(Category::Employees, 2), (Category::Attendance, 2)]);
    assert_eq!(r.store().count(Category::Attendance, None).unwrap(), 2);
    let stats = r.registry().stats();
    assert_eq!(stats[&Category::Employees].total_documents, 2);
    assert_eq!(stats[&Category::Attendance].total_vectors, 2);

    let again = r.ingest_category(Category::Employees, vec![employee("EMP1003", "Kavya Iyer", "HR")]).unwrap();
    assert_eq!(again, 1, "re-ingestion replaces the category");
    assert_eq!(r.store().count(Category::Employees, None).unwrap(), 1);
    assert_eq!(r.registry().get_index(Category::Employees).unwrap().len(), 1);
}

#[test]
fn duplicate_employee_ids_fail_only_employees() {
    let settings = settings();
    let mut r = retriever(&settings);
    let mut input = records();
    input.insert(Category::Employees, vec![employee("EMP1", "A", "X"), employee("EMP1", "B", "Y")]);
    let report = r.ingest_all(input);

    assert_eq!(report.ingested, vec![(Category::Attendance, 2)]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_validation());
}

#[test]
fn failed_reingestion_leaves_store_and_index_in_step() {
    let settings = settings();
    let mut r = retriever(&settings);
    r.ingest_all(records());
    assert_eq!(r.registry().get_index(Category::Employees).unwrap().len(), 2);

    let err = r
        .ingest_category(Category::Employees, vec![employee("EMP3", "A", "X"), employee("EMP3", "B", "Y")])
        .unwrap_err();
    assert!(err.is_validation());

    let stored = r.store().count(Category::Employees, None).unwrap();
    let indexed = r.registry().get_index(Category::Employees).unwrap().len();
    assert_eq!(stored, indexed);
    assert_eq!(stored, 0);
    assert_eq!(r.store().count(Category::Attendance, None).unwrap(), 2, "other categories untouched");
}

#[test]
fn saved_indexes_serve_a_fresh_retriever() {
    let settings = settings();
    let tmp = TempDir::new().unwrap();
    let mut first = retriever(&settings);
    first.ingest_all(records());
    first.save_indexes(tmp.path()).unwrap();
    first.store().save_snapshot(&tmp.path().join("store.json")).unwrap();

    let embedder = HashingEmbedder::new(settings.embedding.dimension);
    let registry = IndexRegistry::new(embedder.dim(), &settings.index);
    let synthesizer = ResponseSynthesizer::new(Box::new(EchoModel), &settings.llm);
    let store = MemoryStore::load_snapshot(&tmp.path().join("store.json")).unwrap();
    let mut second = Retriever::new(store, registry, Box::new(embedder), synthesizer, &settings).unwrap();
    let report = second.load_indexes(tmp.path());
    assert_eq!(report.loaded, vec![Category::Employees, Category::Attendance]);
    assert_eq!(report.failed.len(), 1, "leave was never ingested");

    let structured = second.query("Tell me about employee Priya").unwrap();
    assert_eq!(structured.search_method, SearchMethod::Structured);
    assert_eq!(structured.sources[0].id(), "EMP1001");

    let Retrieval::Semantic(hits) = second.retrieve("Engineering department Bengaluru").unwrap() else {
        panic!("expected semantic hits");
    };
    assert!(hits.len() <= settings.retrieval.top_k);
    assert_eq!(first.retrieve("Engineering department Bengaluru").unwrap(), Retrieval::Semantic(hits));
}

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use helix_core::config::Settings;
use helix_core::traits::{Embedder, LanguageModel, StructuredStore};
use helix_core::{
    AttendanceEntry, Category, ConfidenceLevel, Document, Employee, Error, IndexKind, LeaveEntry, QueryResult, Record,
    SearchMethod,
};
use helix_hybrid::{apply_threshold, merge_ranked, ResponseSynthesizer, Retrieval, Retriever, Scope};
use helix_store::MemoryStore;
use helix_vector::IndexRegistry;

struct FixedEmbedder {
    vector: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl Embedder for FixedEmbedder {
    fn dim(&self) -> usize { self.vector.len() }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }
}

#[derive(Clone, Default)]
struct RecordingModel {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl LanguageModel for RecordingModel {
    fn generate(&self, prompt: &str, max_tokens: usize, temperature: f32) -> anyhow::Result<String> {
        assert_eq!(max_tokens, 800);
        assert!((temperature - 0.3).abs() < 1e-6);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("generated answer".to_string())
    }
}

struct FailingModel;

impl LanguageModel for FailingModel {
    fn generate(&self, _: &str, _: usize, _: f32) -> anyhow::Result<String> { Err(anyhow!("model offline")) }
}

fn employee(id: &str, name: &str) -> Record {
    Record::Employee(Employee {
        emp_id: id.into(),
        name: name.into(),
        dept: Some("Engineering".into()),
        location: Some("Pune".into()),
        role: Some("Developer".into()),
        joining_date: None,
        performance_rating: None,
        certifications: None,
    })
}

fn attendance(id: &str) -> Record {
    Record::Attendance(AttendanceEntry {
        emp_id: id.into(),
        date: "2024-02-01".into(),
        check_in: Some("09:00".into()),
        check_out: Some("18:00".into()),
        location_logged: None,
        device: None,
    })
}

fn leave(id: &str) -> Record {
    Record::Leave(LeaveEntry {
        emp_id: id.into(),
        leave_type: Some("Sick".into()),
        start_date: Some("2024-02-05".into()),
        end_date: None,
        days: Some(1.0),
        status: Some("Approved".into()),
        reason: None,
    })
}

/// A 1-d document whose similarity to the origin is exactly `similarity`.
fn at_similarity(record: Record, similarity: f32) -> Document {
    let distance = (1.0 / similarity - 1.0).sqrt();
    Document::from_record(record).with_embedding(vec![distance])
}

struct Harness {
    retriever: Retriever<MemoryStore>,
    embed_calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

/// Employees, attendance and leave indexes holding one document each at
/// similarities 0.9, 0.4 and 0.2 from the query vector.
fn harness(settings: &Settings) -> Harness {
    let store = MemoryStore::new();
    store.create_unique_index(Category::Employees, "emp_id").unwrap();
    store.insert_many(Category::Employees, vec![employee("EMP1001", "Alice Fernandes")]).unwrap();

    let mut registry = IndexRegistry::new(1, &settings.index);
    registry.create_index(Category::Employees, IndexKind::Flat).add(vec![at_similarity(employee("EMP1001", "Alice Fernandes"), 0.9)]).unwrap();
    registry.create_index(Category::Attendance, IndexKind::Flat).add(vec![at_similarity(attendance("EMP1001"), 0.4)]).unwrap();
    registry.create_index(Category::Leave, IndexKind::Flat).add(vec![at_similarity(leave("EMP1002"), 0.2)]).unwrap();

    let embed_calls = Arc::new(AtomicUsize::new(0));
    let embedder = FixedEmbedder { vector: vec![0.0], calls: embed_calls.clone() };
    let model = RecordingModel::default();
    let prompts = model.prompts.clone();
    let synthesizer = ResponseSynthesizer::new(Box::new(model), &settings.llm);
    let retriever = Retriever::new(store, registry, Box::new(embedder), synthesizer, settings).unwrap();
    Harness { retriever, embed_calls, prompts }
}

#[test]
fn identifier_query_short_circuits_without_embedding() {
    let h = harness(&Settings::default());
    let response = h.retriever.query("Employee EMP1001").unwrap();

    assert_eq!(response.search_method, SearchMethod::Structured);
    assert_eq!(response.source_count, 1);
    assert_eq!(response.sources[0].id(), "EMP1001");
    assert!((response.confidence - 0.9).abs() < 1e-6);
    assert_eq!(response.confidence_level, ConfidenceLevel::High);
    assert_eq!(response.answer, "generated answer");
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.prompts.lock().unwrap().len(), 1);
}

#[test]
fn name_marker_finds_employee_case_insensitively() {
    let h = harness(&Settings::default());
    let Retrieval::Structured(docs) = h.retriever.retrieve("who is the person Fernandes?").unwrap() else {
        panic!("expected structured retrieval");
    };
    assert_eq!(docs.len(), 1);
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_identifier_falls_back_to_semantic_search() {
    let h = harness(&Settings::default());
    let response = h.retriever.query("Employee EMP9999 Alice").unwrap();
    assert_eq!(response.search_method, SearchMethod::Semantic);
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn threshold_keeps_two_of_three_and_averages_confidence() {
    let h = harness(&Settings::default());
    let response = h.retriever.query("how are attendance and leave looking").unwrap();

    assert_eq!(response.search_method, SearchMethod::Semantic);
    assert_eq!(response.source_count, 2);
    assert_eq!(response.sources[0].category(), Category::Employees);
    assert_eq!(response.sources[1].category(), Category::Attendance);
    assert!((response.confidence - 0.65).abs() < 1e-4, "confidence {}", response.confidence);
    assert_eq!(response.confidence_level, ConfidenceLevel::Medium);
}

#[test]
fn disabling_structured_search_goes_straight_to_vectors() {
    let h = harness(&Settings::default());
    let response = h.retriever.query_with("Employee EMP1001", false).unwrap();
    assert_eq!(response.search_method, SearchMethod::Semantic);
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn nothing_above_threshold_yields_no_information_without_lm_call() {
    let mut settings = Settings::default();
    settings.retrieval.similarity_threshold = 0.95;
    let h = harness(&settings);
    let response = h.retriever.query("anything at all").unwrap();

    assert_eq!(response.search_method, SearchMethod::Semantic);
    assert_eq!(response.confidence, 0.0);
    assert!(response.sources.is_empty());
    assert_eq!(response.confidence_level, ConfidenceLevel::None);
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[test]
fn blank_query_touches_no_backend() {
    let h = harness(&Settings::default());
    let response = h.retriever.query("   ").unwrap();
    assert_eq!(response.search_method, SearchMethod::None);
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 0);
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[test]
fn policy_context_is_truncated_in_prompt() {
    let mut h = harness(&Settings::default());
    h.retriever.set_policy_text("é".repeat(2500));
    h.retriever.query("Employee EMP1001").unwrap();

    let prompts = h.prompts.lock().unwrap();
    let prompt = &prompts[0];
    assert!(prompt.contains(&format!("HR POLICIES:\n{}\n\nRELEVANT DATA:", "é".repeat(2000))));
    assert!(!prompt.contains(&"é".repeat(2001)));
}

#[test]
fn query_semantic_scopes_to_one_category() {
    let h = harness(&Settings::default());
    let leave_only = h.retriever.query_semantic("sick", Scope::Category(Category::Leave), 5).unwrap();
    assert_eq!(leave_only.len(), 1);
    assert_eq!(leave_only[0].document.category(), Category::Leave);

    let all = h.retriever.query_semantic("sick", Scope::All, 2).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].similarity >= all[1].similarity);
}

#[test]
fn language_model_failure_propagates() {
    let settings = Settings::default();
    let mut registry = IndexRegistry::new(1, &settings.index);
    registry.create_index(Category::Employees, IndexKind::Flat);
    let embedder = FixedEmbedder { vector: vec![0.0], calls: Arc::default() };
    let store = MemoryStore::new();
    store.insert_many(Category::Employees, vec![employee("EMP1", "Zed")]).unwrap();
    let synthesizer = ResponseSynthesizer::new(Box::new(FailingModel), &settings.llm);
    let retriever = Retriever::new(store, registry, Box::new(embedder), synthesizer, &settings).unwrap();

    let err = retriever.query("EMP1").unwrap_err();
    assert!(matches!(err, Error::Backend { stage: "language model", .. }), "{err}");
}

#[test]
fn embedder_and_registry_dimensions_must_agree() {
    let settings = Settings::default();
    let registry = IndexRegistry::new(8, &settings.index);
    let embedder = FixedEmbedder { vector: vec![0.0; 4], calls: Arc::default() };
    let synthesizer = ResponseSynthesizer::new(Box::new(FailingModel), &settings.llm);
    let err = Retriever::new(MemoryStore::new(), registry, Box::new(embedder), synthesizer, &settings).err();
    assert!(matches!(err, Some(Error::InvalidConfig(_))));
}

fn scored(id: &str, similarity: f32) -> QueryResult {
    QueryResult { document: Document::from_record(employee(id, id)), similarity }
}

#[test]
fn merge_is_sorted_bounded_and_preserves_scores() {
    let mut per_category = BTreeMap::new();
    per_category.insert(Category::Employees, vec![scored("a", 0.8), scored("b", 0.3)]);
    per_category.insert(Category::Leave, vec![scored("c", 0.9), scored("d", 0.5)]);
    let merged = merge_ranked(per_category, 3);
    assert_eq!(merged.iter().map(|r| r.document.id()).collect::<Vec<_>>(), vec!["c", "a", "d"]);
    assert_eq!(merged[1].similarity, 0.8);
    assert!(merge_ranked(BTreeMap::new(), 5).is_empty());
}

#[test]
fn raising_threshold_never_adds_results() {
    let results: Vec<QueryResult> = [0.95, 0.7, 0.5, 0.31, 0.3, 0.1].iter().map(|s| scored("x", *s)).collect();
    let mut previous = usize::MAX;
    for t in [0.0, 0.3, 0.31, 0.6, 0.99] {
        let kept = apply_threshold(results.clone(), t);
        assert!(kept.iter().all(|r| r.similarity >= t));
        assert!(kept.len() <= previous);
        previous = kept.len();
    }
    assert_eq!(apply_threshold(results, 0.3).len(), 5);
}

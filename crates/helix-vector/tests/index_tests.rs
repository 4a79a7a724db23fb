use helix_core::{Category, Document, Employee, Error, IndexKind, Record};
use helix_vector::{similarity_from_distance, IndexOptions, VectorIndex};

fn employee(id: &str, name: &str) -> Record {
    Record::Employee(Employee {
        emp_id: id.into(),
        name: name.into(),
        dept: None,
        location: None,
        role: None,
        joining_date: None,
        performance_rating: None,
        certifications: None,
    })
}

fn doc(id: &str, v: Vec<f32>) -> Document { Document::from_record(employee(id, id)).with_embedding(v) }

fn seeded(kind: IndexKind) -> VectorIndex { seeded_with(IndexOptions::new(kind, 4)) }

fn seeded_with(options: IndexOptions) -> VectorIndex {
    let mut idx = VectorIndex::new("employees", options);
    idx.add(vec![
        doc("EMP1", vec![1.0, 0.0, 0.0, 0.0]),
        doc("EMP2", vec![0.0, 1.0, 0.0, 0.0]),
        doc("EMP3", vec![0.0, 0.0, 1.0, 0.0]),
    ])
    .unwrap();
    idx
}

#[test]
fn wrong_dimension_rejects_whole_batch() {
    let mut idx = seeded(IndexKind::Flat);
    let err = idx
        .add(vec![doc("EMP4", vec![0.0, 0.0, 0.0, 1.0]), doc("EMP5", vec![1.0, 1.0, 1.0, 1.0, 1.0])])
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
    let stats = idx.stats();
    assert_eq!(stats.total_vectors, 3);
    assert_eq!(stats.total_documents, 3);
}

#[test]
fn missing_embedding_is_a_validation_error() {
    let mut idx = VectorIndex::new("employees", IndexOptions::new(IndexKind::Flat, 4));
    let err = idx.add(vec![Document::from_record(employee("EMP9", "Nine"))]).unwrap_err();
    assert!(err.is_validation());
    assert!(idx.is_empty());
}

#[test]
fn empty_index_and_zero_k_return_nothing() {
    let idx = VectorIndex::new("leave", IndexOptions::new(IndexKind::Flat, 4));
    assert!(idx.search(&[0.0; 4], 5).unwrap().is_empty());
    let idx = seeded(IndexKind::Flat);
    assert!(idx.search(&[0.0; 4], 0).unwrap().is_empty());
    assert!(idx.search(&[0.0; 3], 2).unwrap_err().is_validation());
}

#[test]
fn search_returns_document_at_matched_position() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let idx = seeded(kind);
        let hits = idx.search(&[0.0, 0.9, 0.1, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1, "{kind}");
        assert_eq!(hits[0].document.id(), "EMP2");
        assert_eq!(hits[0].document.category(), Category::Employees);
    }
}

#[test]
fn results_are_sorted_and_similarity_bounded() {
    let idx = seeded(IndexKind::Flat);
    let hits = idx.search(&[0.7, 0.2, 0.0, 0.0], 3).unwrap();
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) { assert!(pair[0].similarity >= pair[1].similarity); }
    for h in &hits { assert!(h.similarity > 0.0 && h.similarity <= 1.0); }

    assert_eq!(similarity_from_distance(0.0), 1.0);
    assert!(similarity_from_distance(0.5) > similarity_from_distance(2.0));
    assert!(similarity_from_distance(1e30) > 0.0);
    assert!(similarity_from_distance(f32::INFINITY) > 0.0);
    assert!(similarity_from_distance(f32::MAX) > 0.0);
}

#[test]
fn filtered_search_keeps_only_accepted_documents() {
    let idx = seeded(IndexKind::Flat);
    let hits = idx.search_with_filter(&[1.0, 0.0, 0.0, 0.0], 1, |d| d.id() != "EMP1").unwrap();
    assert_eq!(hits.len(), 1);
    assert_ne!(hits[0].document.id(), "EMP1");
    assert!(idx.search_with_filter(&[1.0, 0.0, 0.0, 0.0], 2, |_| false).unwrap().is_empty());
}

#[test]
fn filtered_search_only_sees_the_overfetch_window() {
    // EMP1 ranks first; EMP2 ties EMP3 for second and wins on insertion order.
    let query = [1.0, 0.0, 0.0, 0.0];
    let only_emp2 = |d: &Document| d.id() == "EMP2";

    let narrow = seeded_with(IndexOptions { overfetch: 1, ..IndexOptions::new(IndexKind::Flat, 4) });
    assert!(narrow.search_with_filter(&query, 1, only_emp2).unwrap().is_empty());

    let wider = seeded_with(IndexOptions { overfetch: 2, ..IndexOptions::new(IndexKind::Flat, 4) });
    let hits = wider.search_with_filter(&query, 1, only_emp2).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.id(), "EMP2");
}

#[test]
fn parallel_invariant_holds_across_adds_and_clear() {
    let mut idx = seeded(IndexKind::Ivf);
    idx.add(vec![doc("EMP4", vec![0.0, 0.0, 0.0, 1.0])]).unwrap();
    idx.add(Vec::new()).unwrap();
    let stats = idx.stats();
    assert_eq!(stats.total_vectors, stats.total_documents);
    assert_eq!(stats.total_documents, 4);
    assert!(stats.is_trained);

    idx.clear();
    let stats = idx.stats();
    assert_eq!((stats.total_vectors, stats.total_documents, stats.is_trained), (0, 0, false));
    assert_eq!(stats.index_kind, IndexKind::Ivf);
    assert_eq!(stats.dimension, 4);
}

#[test]
fn explicit_training_is_idempotent() {
    let mut idx = VectorIndex::new("attendance", IndexOptions::new(IndexKind::Ivf, 2));
    idx.train(&[vec![0.0, 0.0], vec![5.0, 5.0]]).unwrap();
    assert!(idx.stats().is_trained);
    idx.train(&[vec![9.0, 9.0]]).unwrap();
    idx.add(vec![doc("EMP1", vec![0.1, 0.0])]).unwrap();
    assert_eq!(idx.search(&[0.0, 0.0], 1).unwrap()[0].document.id(), "EMP1");
    assert!(idx.train(&[vec![1.0]]).unwrap_err().is_validation());
}

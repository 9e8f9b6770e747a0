use labelcommit::data::Data;
use labelcommit::label::{CategoryLabel, LabelTypeKind};
use labelcommit::persist::{self, PersistenceMode, Persistor};
use labelcommit::pipeline::{ExampleKind, LabeledExamples};
use labelcommit::record::Record;
use serde_json::Map;

fn batch(name: &str) -> LabeledExamples {
    LabeledExamples::new(
        ExampleKind::Category,
        vec![Record::new(
            Data::text("reviews.csv", "good"),
            vec![CategoryLabel::new(name).into()],
            Map::new(),
            Some(1),
        )],
    )
}

#[test]
fn in_memory_mode_allows_basic_operations() {
    let mut db = persist::open(&PersistenceMode::InMemory).expect("db");
    let summary = batch("POS").create(&mut db, 1, 1).expect("commit");
    assert_eq!(summary.examples, 1);
    assert_eq!(summary.labels.categories, 1);
}

#[test]
fn file_mode_survives_reopening() {
    // Use a temp path; reopen the same file to ensure the schema is reused
    let path = std::env::temp_dir()
        .join(format!("labelcommit_test_{}.db", std::process::id()))
        .to_string_lossy()
        .into_owned();
    // Ensure clean start
    let _ = std::fs::remove_file(&path);
    {
        let mut db = persist::open(&PersistenceMode::File(path.clone())).expect("db");
        batch("POS").create(&mut db, 1, 1).expect("commit");
    }
    {
        let mut db = persist::open(&PersistenceMode::File(path.clone())).expect("reopen");
        let summary = batch("POS").create(&mut db, 1, 1).expect("commit");
        assert_eq!(summary.label_types, 0, "label type from the first run is reused");
        let persistor = Persistor::new(&db);
        assert_eq!(persistor.examples(1).unwrap().len(), 2);
        assert_eq!(persistor.label_types(1, LabelTypeKind::Category).unwrap().len(), 1);
    }
    // Clean up
    let _ = std::fs::remove_file(&path);
}

#[test]
fn foreign_keys_are_enforced() {
    let db = persist::open(&PersistenceMode::InMemory).expect("db");
    let persistor = Persistor::new(&db);
    let result = persistor.add_categories(&[labelcommit::label::NewCategory {
        example: 99,
        user: 1,
        label_type: 99,
    }]);
    assert!(matches!(result, Err(labelcommit::CommitError::Persistence(_))));
}

#[test]
fn spans_must_have_positive_length() {
    let mut db = persist::open(&PersistenceMode::InMemory).expect("db");
    let empty_span = LabeledExamples::new(
        ExampleKind::Span,
        vec![Record::new(
            Data::text("f", "abc"),
            vec![labelcommit::label::SpanLabel::new("PER", 2, 2).into()],
            Map::new(),
            None,
        )],
    );
    assert!(empty_span.create(&mut db, 1, 1).is_err());
    assert!(Persistor::new(&db).examples(1).unwrap().is_empty());
}

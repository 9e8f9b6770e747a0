use labelcommit::data::Data;
use labelcommit::identity::SpanIdentityMap;
use labelcommit::label::{Label, LabelTypeKind, RelationLabel, SpanLabel};
use labelcommit::label_type::LabelTypeMapping;
use labelcommit::persist::{self, PersistenceMode, Persistor, SpanRow};
use labelcommit::pipeline::{ExampleKind, LabeledExamples};
use labelcommit::record::Record;
use labelcommit::CommitError;
use rusqlite::Connection;
use serde_json::Map;
use uuid::Uuid;

const PROJECT: i64 = 1;
const USER: i64 = 1;

fn setup() -> Connection {
    persist::open(&PersistenceMode::InMemory).expect("db")
}

fn record(labels: Vec<Label>) -> Record {
    Record::new(Data::text("relations.jsonl", "Bob in Rome"), labels, Map::new(), Some(1))
}

#[test]
fn relation_points_at_the_spans_it_names() {
    let mut db = setup();
    let u1 = SpanLabel::new("PER", 0, 3);
    let u2 = SpanLabel::new("LOC", 5, 8);
    let lives_in = RelationLabel::between(&u1, &u2, "lives_in");
    let batch = LabeledExamples::new(
        ExampleKind::Relation,
        vec![record(vec![u1.clone().into(), u2.clone().into(), lives_in.into()])],
    );
    let summary = batch.create(&mut db, PROJECT, USER).expect("commit");
    assert_eq!(summary.label_types, 3);
    assert_eq!(summary.labels.spans, 2);
    assert_eq!(summary.labels.relations, 1);

    let persistor = Persistor::new(&db);
    let spans = persistor.spans(PROJECT).unwrap();
    let durable = |uuid: Uuid| spans.iter().find(|s| s.uuid == uuid).map(|s| s.id).unwrap();
    let relations = persistor.relations(PROJECT).unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].from_span, durable(u1.uuid()));
    assert_eq!(relations[0].to_span, durable(u2.uuid()));

    let relation_types = persistor.label_types(PROJECT, LabelTypeKind::Relation).unwrap();
    assert_eq!(relation_types.len(), 1);
    assert_eq!(relation_types[0].text, "lives_in");
    assert_eq!(relations[0].label_type, relation_types[0].id);
}

#[test]
fn durable_spans_keep_their_uuids() {
    let mut db = setup();
    let spans: Vec<SpanLabel> = (0..5).map(|i| SpanLabel::new("PER", i * 10, i * 10 + 4)).collect();
    let batch = LabeledExamples::new(
        ExampleKind::Relation,
        vec![
            record(spans[..3].iter().cloned().map(Label::from).collect()),
            record(spans[3..].iter().cloned().map(Label::from).collect()),
        ],
    );
    batch.create(&mut db, PROJECT, USER).expect("commit");

    let persisted = Persistor::new(&db).spans(PROJECT).unwrap();
    assert_eq!(persisted.len(), spans.len());
    for (transient, durable) in spans.iter().zip(&persisted) {
        assert_eq!(durable.uuid, transient.uuid());
        assert_eq!(durable.start_offset, transient.start_offset());
    }
}

#[test]
fn relations_resolve_within_each_record_of_a_batch() {
    let mut db = setup();
    let mut records = Vec::new();
    let mut expected = Vec::new();
    for _ in 0..3 {
        let head = SpanLabel::new("PER", 0, 3);
        let tail = SpanLabel::new("LOC", 7, 11);
        expected.push((head.uuid(), tail.uuid()));
        let relation = RelationLabel::between(&head, &tail, "lives_in");
        // relation listed before its spans
        records.push(record(vec![relation.into(), tail.into(), head.into()]));
    }
    let batch = LabeledExamples::new(ExampleKind::Relation, records);
    batch.create(&mut db, PROJECT, USER).expect("commit");

    let persistor = Persistor::new(&db);
    let spans = persistor.spans(PROJECT).unwrap();
    let uuid_of = |id: i64| spans.iter().find(|s| s.id == id).map(|s| s.uuid).unwrap();
    let relations = persistor.relations(PROJECT).unwrap();
    let examples = persistor.examples(PROJECT).unwrap();
    assert_eq!(relations.len(), 3);
    for ((relation, example), (head, tail)) in relations.iter().zip(&examples).zip(expected) {
        assert_eq!(relation.example, example.id);
        assert_eq!(uuid_of(relation.from_span), head);
        assert_eq!(uuid_of(relation.to_span), tail);
    }
}

#[test]
fn dangling_relation_fails_and_rolls_back() {
    let mut db = setup();
    let u1 = SpanLabel::new("PER", 0, 3);
    let u2 = SpanLabel::new("LOC", 5, 8);
    let missing = Uuid::new_v4();
    let good = RelationLabel::between(&u1, &u2, "lives_in");
    let dangling = RelationLabel::new(u1.uuid(), missing, "works_for");
    let batch = LabeledExamples::new(
        ExampleKind::Relation,
        vec![
            record(vec![u1.into(), u2.into(), good.into()]),
            record(vec![dangling.into()]),
        ],
    );
    match batch.create(&mut db, PROJECT, USER) {
        Err(CommitError::UnresolvedSpan { uuid, type_name }) => {
            assert_eq!(uuid, missing);
            assert_eq!(type_name, "works_for");
        }
        other => panic!("expected an unresolved span, got {other:?}"),
    }
    let persistor = Persistor::new(&db);
    assert!(persistor.examples(PROJECT).unwrap().is_empty());
    assert!(persistor.spans(PROJECT).unwrap().is_empty());
    assert!(persistor.relations(PROJECT).unwrap().is_empty());
}

#[test]
fn span_map_resolves_only_persisted_uuids() {
    let kept = SpanLabel::new("PER", 0, 3);
    let rows = vec![SpanRow {
        id: 42,
        uuid: kept.uuid(),
        example: 1,
        user: 1,
        label_type: 1,
        start_offset: 0,
        end_offset: 3,
    }];
    let map = SpanIdentityMap::build(&[&kept], &rows).expect("map");
    assert_eq!(map.len(), 1);
    assert_eq!(map.resolve(kept.uuid(), "r").unwrap(), 42);
    assert!(matches!(
        map.resolve(Uuid::new_v4(), "r"),
        Err(CommitError::UnresolvedSpan { .. })
    ));

    let lost = SpanLabel::new("LOC", 5, 8);
    assert!(matches!(
        SpanIdentityMap::build(&[&kept, &lost], &rows),
        Err(CommitError::Invariant(_))
    ));
}

#[test]
fn relation_without_span_map_is_an_invariant_fault() {
    let relation: Label = RelationLabel::new(Uuid::new_v4(), Uuid::new_v4(), "r").into();
    let err = relation.create(1, 1, &LabelTypeMapping::empty(), None).unwrap_err();
    assert!(matches!(err, CommitError::Invariant(_)));
}

#[test]
fn span_filtered_by_cleaning_leaves_its_relation_dangling() {
    let mut db = setup();
    let first = SpanLabel::new("PER", 0, 5);
    let overlapping = SpanLabel::new("PER", 2, 8);
    let relation = RelationLabel::between(&first, &overlapping, "same_as");
    let mut batch = LabeledExamples::new(
        ExampleKind::Relation,
        vec![record(vec![first.into(), overlapping.into(), relation.into()])],
    );
    let warnings = batch.clean(&labelcommit::cleaner::SpanCleaner::new(false));
    assert_eq!(warnings.len(), 1);
    let err = batch.create(&mut db, PROJECT, USER).unwrap_err();
    assert!(matches!(err, CommitError::UnresolvedSpan { .. }));
}

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use labelcommit::data::Data;
use labelcommit::label::{Label, RelationLabel, SpanLabel};
use labelcommit::persist::{self, PersistenceMode};
use labelcommit::pipeline::{ExampleKind, LabeledExamples};
use labelcommit::record::Record;
use serde_json::Map;

fn relation_batch(records: usize) -> LabeledExamples {
    let records = (0..records)
        .map(|i| {
            let person = SpanLabel::new("PER", 0, 5);
            let place = SpanLabel::new("LOC", 15, 20);
            let relation = RelationLabel::between(&person, &place, "lives_in");
            let labels: Vec<Label> = vec![person.into(), place.into(), relation.into()];
            Record::new(
                Data::text("bench.jsonl", "Alice lives in Paris"),
                labels,
                Map::new(),
                Some(i + 1),
            )
        })
        .collect();
    LabeledExamples::new(ExampleKind::Relation, records)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    for size in [10, 1_000] {
        c.bench_function(&format!("relation commit {size}"), |b| {
            b.iter_batched(
                || {
                    let db = persist::open(&PersistenceMode::InMemory).unwrap();
                    (db, relation_batch(size))
                },
                |(mut db, batch)| black_box(batch.create(&mut db, 1, 1).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

//! Labelcommit – commits externally annotated documents into a SQLite store.
//!
//! An import arrives as a batch of *records*: one document each, plus the
//! labels an annotator attached to it. Labels are transient until committed:
//! * A [`label::Label`] is a category, a span, free text, or a relation
//!   between two spans of the same batch.
//! * A span carries a transient uuid; relations refer to spans by that uuid.
//! * Category, span and relation labels name a *label type*, which is
//!   defined once per project and shared by every label using that name.
//!
//! Committing a batch turns each record into a durable example, makes sure
//! every implied label type exists exactly once, and writes the labels
//! against the examples. Relation batches write their spans first and then
//! rewrite relation endpoints from span uuids to durable span identities.
//!
//! ## Modules
//! * [`label`] – The label variants and the durable rows they become.
//! * [`data`] – Document payloads projected into examples.
//! * [`record`] – One document with its labels, meta data and source line.
//! * [`cleaner`] – Per-project cleaning rules and the warnings they raise.
//! * [`label_type`] – Label-type derivation, idempotent persistence and lookup.
//! * [`identity`] – The span uuid to durable span table used by relations.
//! * [`persist`] – SQLite schema, bulk inserts and queries.
//! * [`pipeline`] – [`pipeline::LabeledExamples`], which commits a batch of one kind.
//! * [`config`] – Settings from file and environment.
//!
//! ## Quick Start
//! ```
//! use labelcommit::data::Data;
//! use labelcommit::label::{CategoryLabel, Label, SpanLabel};
//! use labelcommit::persist::{self, PersistenceMode, Persistor};
//! use labelcommit::pipeline::{ExampleKind, LabeledExamples};
//! use labelcommit::record::Record;
//!
//! let mut connection = persist::open(&PersistenceMode::InMemory).unwrap();
//! let record = Record::new(
//!     Data::text("news.jsonl", "Alice went home."),
//!     vec![
//!         Label::from(SpanLabel::new("PER", 0, 5)),
//!         Label::from(CategoryLabel::new("POS")),
//!     ],
//!     Default::default(),
//!     Some(1),
//! );
//! let batch = LabeledExamples::new(ExampleKind::SpanAndCategory, vec![record]);
//! let summary = batch.create(&mut connection, 1, 1).unwrap();
//! assert_eq!(summary.examples, 1);
//! assert_eq!(summary.label_types, 2);
//! assert_eq!(Persistor::new(&connection).spans(1).unwrap().len(), 1);
//! ```
//!
//! ## Transactions
//! [`pipeline::LabeledExamples::create`] runs all phases in one SQLite
//! transaction. Label-type mappings and re-read spans therefore see this
//! batch's own writes, and a failure anywhere (an unknown label type, a
//! relation pointing at a span that is not in the batch, a store error)
//! leaves the database as it was.

pub mod cleaner;
pub mod config;
pub mod data;
pub mod error;
pub mod identity;
pub mod label;
pub mod label_type;
pub mod persist;
pub mod pipeline;
pub mod record;

pub use error::{CommitError, Result};

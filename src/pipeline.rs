//! The labeled-example commit pipeline.
//!
//! A batch of [`Record`]s of one [`ExampleKind`] is committed in three
//! phases, all inside one transaction:
//!
//! 1. `create_data` inserts one example per record and returns them in
//!    record order, so records and examples can be zipped positionally.
//! 2. `create_label_type` derives the label types implied by the batch and
//!    inserts them, ignoring ones that already exist. Text batches skip it.
//! 3. `create_label` builds fresh name → label-type mappings from the store
//!    and inserts the labels the kind calls for.
//!
//! Relation batches commit in two steps within phase 3: spans first, then
//! relations whose endpoints are resolved from span uuids to the durable
//! spans just read back. Any failure drops the transaction, so a batch is
//! committed entirely or not at all.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cleaner::{CategoryCleaner, Cleaner, ParseWarning, PassThrough, SpanCleaner};
use crate::config::ProjectSettings;
use crate::error::{CommitError, Result};
use crate::identity::SpanIdentityMap;
use crate::label::{Label, LabelClass, LabelTypeKind, NewLabel, ProjectId, SpanLabel, UserId};
use crate::label_type::{LabelTypeBuckets, LabelTypeMapping};
use crate::persist::{Example, LabelCounts, Persistor};
use crate::record::Record;

/// Which labels a batch carries, and therefore how it is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleKind {
    Category,
    Span,
    Text,
    SpanAndCategory,
    Relation,
}
impl ExampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExampleKind::Category => "category",
            ExampleKind::Span => "span",
            ExampleKind::Text => "text",
            ExampleKind::SpanAndCategory => "span_and_category",
            ExampleKind::Relation => "relation",
        }
    }
    // text labels carry no type
    pub fn derives_label_types(&self) -> bool {
        !matches!(self, ExampleKind::Text)
    }
    /// The cleaning rule the project settings call for.
    pub fn cleaner(&self, project: &ProjectSettings) -> Box<dyn Cleaner> {
        match self {
            ExampleKind::Category => Box::new(CategoryCleaner::new(project.single_class_classification)),
            ExampleKind::Span | ExampleKind::SpanAndCategory | ExampleKind::Relation => {
                Box::new(SpanCleaner::new(project.allow_overlapping))
            }
            ExampleKind::Text => Box::new(PassThrough),
        }
    }
}
impl fmt::Display for ExampleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for ExampleKind {
    type Err = CommitError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "category" => Ok(ExampleKind::Category),
            "span" => Ok(ExampleKind::Span),
            "text" => Ok(ExampleKind::Text),
            "span_and_category" => Ok(ExampleKind::SpanAndCategory),
            "relation" => Ok(ExampleKind::Relation),
            _ => Err(CommitError::Input {
                message: format!("unknown example kind '{}'", s),
                line: None,
            }),
        }
    }
}

/// What a committed batch wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub examples: usize,
    // label types that did not exist before this batch
    pub label_types: usize,
    pub labels: LabelCounts,
}

pub struct LabeledExamples {
    kind: ExampleKind,
    records: Vec<Record>,
}

impl LabeledExamples {
    pub fn new(kind: ExampleKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }
    pub fn kind(&self) -> ExampleKind {
        self.kind
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cleans every record, collecting one warning per record that lost labels.
    pub fn clean(&mut self, cleaner: &dyn Cleaner) -> Vec<ParseWarning> {
        let mut warnings = Vec::new();
        for record in self.records.iter_mut() {
            if let Some(warning) = record.clean(cleaner) {
                warn!(filename = %warning.filename, line = ?warning.line_num, "{}", warning.message);
                warnings.push(warning);
            }
        }
        warnings
    }

    /// Commits the batch atomically.
    pub fn create(
        &self,
        connection: &mut Connection,
        project: ProjectId,
        user: UserId,
    ) -> Result<CommitSummary> {
        let started = Instant::now();
        let transaction = connection.transaction()?;
        let summary = self.create_with(&Persistor::new(&transaction), project, user)?;
        transaction.commit()?;
        info!(
            kind = %self.kind,
            ms = started.elapsed().as_secs_f64() * 1000.0,
            examples = summary.examples,
            label_types = summary.label_types,
            categories = summary.labels.categories,
            spans = summary.labels.spans,
            texts = summary.labels.texts,
            relations = summary.labels.relations,
            "batch committed"
        );
        Ok(summary)
    }

    /// Runs the three phases on a persistor whose connection the caller
    /// keeps transactional.
    pub fn create_with(
        &self,
        persistor: &Persistor,
        project: ProjectId,
        user: UserId,
    ) -> Result<CommitSummary> {
        let examples = self.create_data(persistor, project)?;
        let label_types = if self.kind.derives_label_types() {
            self.create_label_type(persistor, project)?
        } else {
            0
        };
        let labels = self.create_label(persistor, project, user, &examples)?;
        Ok(CommitSummary {
            examples: examples.len(),
            label_types,
            labels,
        })
    }

    pub fn create_data(&self, persistor: &Persistor, project: ProjectId) -> Result<Vec<Example>> {
        let examples: Vec<_> = self
            .records
            .iter()
            .map(|record| record.create_data(project))
            .collect();
        let examples = persistor.add_examples(&examples)?;
        debug!(project, count = examples.len(), "examples persisted");
        Ok(examples)
    }

    pub fn create_label_type(&self, persistor: &Persistor, project: ProjectId) -> Result<usize> {
        LabelTypeBuckets::from_records(&self.records, project).persist(persistor)
    }

    pub fn create_mapping(
        &self,
        persistor: &Persistor,
        project: ProjectId,
        kind: LabelTypeKind,
    ) -> Result<LabelTypeMapping> {
        LabelTypeMapping::load(persistor, project, kind)
    }

    /// Pairs each record with its example by position and materialises the
    /// record's labels against it.
    pub fn extract_labels(
        &self,
        user: UserId,
        examples: &[Example],
        mapping: &LabelTypeMapping,
        label_class: Option<LabelClass>,
        spans: Option<&SpanIdentityMap>,
    ) -> Result<Vec<NewLabel>> {
        if examples.len() != self.records.len() {
            return Err(CommitError::Invariant(format!(
                "{} records but {} examples",
                self.records.len(),
                examples.len()
            )));
        }
        let mut labels = Vec::new();
        for (record, example) in self.records.iter().zip(examples) {
            labels.extend(record.create_label(user, example.id, mapping, label_class, spans)?);
        }
        Ok(labels)
    }

    fn create_label(
        &self,
        persistor: &Persistor,
        project: ProjectId,
        user: UserId,
        examples: &[Example],
    ) -> Result<LabelCounts> {
        match self.kind {
            ExampleKind::Category => {
                let category_mapping = self.create_mapping(persistor, project, LabelTypeKind::Category)?;
                let categories = self.extract_labels(user, examples, &category_mapping, None, None)?;
                persistor.add_labels(&categories)
            }
            ExampleKind::Span => {
                let span_mapping = self.create_mapping(persistor, project, LabelTypeKind::Span)?;
                let spans = self.extract_labels(user, examples, &span_mapping, None, None)?;
                persistor.add_labels(&spans)
            }
            ExampleKind::Text => {
                let texts = self.extract_labels(user, examples, &LabelTypeMapping::empty(), None, None)?;
                persistor.add_labels(&texts)
            }
            ExampleKind::SpanAndCategory => {
                let span_mapping = self.create_mapping(persistor, project, LabelTypeKind::Span)?;
                let category_mapping = self.create_mapping(persistor, project, LabelTypeKind::Category)?;
                let spans = self.extract_labels(user, examples, &span_mapping, Some(LabelClass::Span), None)?;
                let categories = self.extract_labels(
                    user,
                    examples,
                    &category_mapping,
                    Some(LabelClass::Category),
                    None,
                )?;
                let mut counts = persistor.add_labels(&spans)?;
                counts += persistor.add_labels(&categories)?;
                Ok(counts)
            }
            ExampleKind::Relation => self.create_relations(persistor, project, user, examples),
        }
    }

    fn create_relations(
        &self,
        persistor: &Persistor,
        project: ProjectId,
        user: UserId,
        examples: &[Example],
    ) -> Result<LabelCounts> {
        let span_mapping = self.create_mapping(persistor, project, LabelTypeKind::Span)?;
        let relation_mapping = self.create_mapping(persistor, project, LabelTypeKind::Relation)?;

        let spans = self.extract_labels(user, examples, &span_mapping, Some(LabelClass::Span), None)?;
        let uuids: Vec<Uuid> = spans.iter().filter_map(NewLabel::span_uuid).collect();
        let mut counts = persistor.add_labels(&spans)?;

        // read the spans back by the uuids they were inserted with
        let originals: Vec<&SpanLabel> = self
            .records
            .iter()
            .flat_map(|record| record.select_label(LabelClass::Span))
            .filter_map(Label::as_span)
            .collect();
        let persisted = persistor.spans_by_uuid(&uuids)?;
        let span_map = SpanIdentityMap::build(&originals, &persisted)?;
        debug!(spans = span_map.len(), "span identities resolved");

        let relations = self.extract_labels(
            user,
            examples,
            &relation_mapping,
            Some(LabelClass::Relation),
            Some(&span_map),
        )?;
        counts += persistor.add_labels(&relations)?;
        Ok(counts)
    }
}

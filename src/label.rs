//! Transient labels attached to a record before anything is persisted.
//!
//! A [`Label`] is one of a closed set of variants. Every variant knows how to
//! materialise the label type it implies ([`Label::create_type`]) and the
//! durable row it becomes once its example exists ([`Label::create`]).
//! Labels are immutable after construction: fields are private and only
//! exposed through getters, so cleaning always builds a new list.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{CommitError, Result};
use crate::identity::SpanIdentityMap;
use crate::label_type::{LabelTypeMapping, NewLabelType};

// ------------- Identities -------------
// All durable identities are assigned by the store (SQLite rowids).
pub type ProjectId = i64;
pub type UserId = i64;
pub type ExampleId = i64;
pub type LabelTypeId = i64;
pub type SpanId = i64;

// ------------- Kinds -------------
/// The concrete label variant, used to filter a record's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelClass {
    Category,
    Span,
    Text,
    Relation,
}
impl fmt::Display for LabelClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LabelClass::Category => "category",
            LabelClass::Span => "span",
            LabelClass::Text => "text",
            LabelClass::Relation => "relation",
        };
        write!(f, "{}", name)
    }
}

/// The kinds of label type a project can define. Text labels have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelTypeKind {
    Category,
    Span,
    Relation,
}
impl LabelTypeKind {
    pub const ALL: [LabelTypeKind; 3] = [
        LabelTypeKind::Category,
        LabelTypeKind::Span,
        LabelTypeKind::Relation,
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelTypeKind::Category => "category",
            LabelTypeKind::Span => "span",
            LabelTypeKind::Relation => "relation",
        }
    }
}
impl fmt::Display for LabelTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ------------- Variants -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    name: String,
}
impl CategoryLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanLabel {
    // the transient identity, carried verbatim into the durable span
    #[serde(default = "Uuid::new_v4")]
    uuid: Uuid,
    name: String,
    start_offset: usize,
    end_offset: usize,
}
impl SpanLabel {
    pub fn new(name: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        Self::with_uuid(Uuid::new_v4(), name, start_offset, end_offset)
    }
    pub fn with_uuid(
        uuid: Uuid,
        name: impl Into<String>,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            start_offset,
            end_offset,
        }
    }
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLabel {
    content: String,
}
impl TextLabel {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A typed, directed link between two spans of the same batch, referenced
/// by their transient uuids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationLabel {
    from_uuid: Uuid,
    to_uuid: Uuid,
    type_name: String,
}
impl RelationLabel {
    pub fn new(from_uuid: Uuid, to_uuid: Uuid, type_name: impl Into<String>) -> Self {
        Self {
            from_uuid,
            to_uuid,
            type_name: type_name.into(),
        }
    }
    pub fn between(from: &SpanLabel, to: &SpanLabel, type_name: impl Into<String>) -> Self {
        Self::new(from.uuid(), to.uuid(), type_name)
    }
    pub fn from_uuid(&self) -> Uuid {
        self.from_uuid
    }
    pub fn to_uuid(&self) -> Uuid {
        self.to_uuid
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

// ------------- Label -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Label {
    Category(CategoryLabel),
    Span(SpanLabel),
    Text(TextLabel),
    Relation(RelationLabel),
}

impl Label {
    pub fn class(&self) -> LabelClass {
        match self {
            Label::Category(_) => LabelClass::Category,
            Label::Span(_) => LabelClass::Span,
            Label::Text(_) => LabelClass::Text,
            Label::Relation(_) => LabelClass::Relation,
        }
    }
    pub fn type_kind(&self) -> Option<LabelTypeKind> {
        match self {
            Label::Category(_) => Some(LabelTypeKind::Category),
            Label::Span(_) => Some(LabelTypeKind::Span),
            Label::Text(_) => None,
            Label::Relation(_) => Some(LabelTypeKind::Relation),
        }
    }
    /// The label type this label refers to, if its variant carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Category(category) => Some(category.name()),
            Label::Span(span) => Some(span.name()),
            Label::Text(_) => None,
            Label::Relation(relation) => Some(relation.type_name()),
        }
    }
    pub fn has_name(&self) -> bool {
        self.name().is_some()
    }
    pub fn as_span(&self) -> Option<&SpanLabel> {
        match self {
            Label::Span(span) => Some(span),
            _ => None,
        }
    }

    /// The label type implied by this label, or `None` for text labels and
    /// labels with an empty name.
    pub fn create_type(&self, project: ProjectId) -> Option<NewLabelType> {
        let kind = self.type_kind()?;
        match self.name() {
            Some(name) if !name.is_empty() => Some(NewLabelType::new(project, kind, name)),
            _ => None,
        }
    }

    /// Materialises the durable row for this label. Typed labels resolve
    /// their name through `mapping`; relations additionally resolve both
    /// endpoints through `spans`.
    pub fn create(
        &self,
        user: UserId,
        example: ExampleId,
        mapping: &LabelTypeMapping,
        spans: Option<&SpanIdentityMap>,
    ) -> Result<NewLabel> {
        let label = match self {
            Label::Category(category) => NewLabel::Category(NewCategory {
                example,
                user,
                label_type: mapping.resolve(LabelTypeKind::Category, category.name())?,
            }),
            Label::Span(span) => NewLabel::Span(NewSpan {
                uuid: span.uuid(),
                example,
                user,
                label_type: mapping.resolve(LabelTypeKind::Span, span.name())?,
                start_offset: span.start_offset(),
                end_offset: span.end_offset(),
            }),
            Label::Text(text) => NewLabel::Text(NewTextLabel {
                example,
                user,
                content: text.content().to_owned(),
            }),
            Label::Relation(relation) => {
                let spans = spans.ok_or_else(|| {
                    CommitError::Invariant(format!(
                        "relation '{}' created without a span identity map",
                        relation.type_name()
                    ))
                })?;
                NewLabel::Relation(NewRelation {
                    example,
                    user,
                    from_span: spans.resolve(relation.from_uuid(), relation.type_name())?,
                    to_span: spans.resolve(relation.to_uuid(), relation.type_name())?,
                    label_type: mapping.resolve(LabelTypeKind::Relation, relation.type_name())?,
                })
            }
        };
        Ok(label)
    }

    /// Plain data rendering, used for diagnostics.
    pub fn to_value(&self) -> Value {
        match self {
            Label::Category(category) => json!({ "label": category.name() }),
            Label::Span(span) => json!({
                "uuid": span.uuid().to_string(),
                "label": span.name(),
                "start_offset": span.start_offset(),
                "end_offset": span.end_offset(),
            }),
            Label::Text(text) => json!({ "text": text.content() }),
            Label::Relation(relation) => json!({
                "from_uuid": relation.from_uuid().to_string(),
                "to_uuid": relation.to_uuid().to_string(),
                "type": relation.type_name(),
            }),
        }
    }
}
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::Category(category) => write!(f, "{}", category.name()),
            Label::Span(span) => write!(
                f,
                "{}[{}, {})",
                span.name(),
                span.start_offset(),
                span.end_offset()
            ),
            Label::Text(text) => write!(f, "\"{}\"", text.content()),
            Label::Relation(relation) => write!(
                f,
                "{} -{}-> {}",
                relation.from_uuid(),
                relation.type_name(),
                relation.to_uuid()
            ),
        }
    }
}
impl From<CategoryLabel> for Label {
    fn from(label: CategoryLabel) -> Self {
        Label::Category(label)
    }
}
impl From<SpanLabel> for Label {
    fn from(label: SpanLabel) -> Self {
        Label::Span(label)
    }
}
impl From<TextLabel> for Label {
    fn from(label: TextLabel) -> Self {
        Label::Text(label)
    }
}
impl From<RelationLabel> for Label {
    fn from(label: RelationLabel) -> Self {
        Label::Relation(label)
    }
}

// ------------- Durable drafts -------------
// Rows ready for insertion; the store assigns their identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpan {
    pub uuid: Uuid,
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTextLabel {
    pub example: ExampleId,
    pub user: UserId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelation {
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
    pub from_span: SpanId,
    pub to_span: SpanId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewLabel {
    Category(NewCategory),
    Span(NewSpan),
    Text(NewTextLabel),
    Relation(NewRelation),
}
impl NewLabel {
    pub fn span_uuid(&self) -> Option<Uuid> {
        match self {
            NewLabel::Span(span) => Some(span.uuid),
            _ => None,
        }
    }
}

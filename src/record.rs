use std::fmt;

use serde_json::{Map, Value};

use crate::cleaner::{Cleaner, ParseWarning};
use crate::data::{Data, NewExample};
use crate::error::Result;
use crate::identity::SpanIdentityMap;
use crate::label::{ExampleId, Label, LabelClass, NewLabel, ProjectId, UserId};
use crate::label_type::{LabelTypeMapping, NewLabelType};

/// One document and its unpersisted labels, as read from a source file.
/// A record is a staging object: its content is projected into durable
/// examples and labels, the record itself is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    data: Data,
    labels: Vec<Label>,
    meta: Map<String, Value>,
    line_num: Option<usize>,
}

impl Record {
    pub fn new(
        data: Data,
        labels: Vec<Label>,
        meta: Map<String, Value>,
        line_num: Option<usize>,
    ) -> Self {
        Self {
            data,
            labels,
            meta,
            line_num,
        }
    }
    pub fn data(&self) -> &Data {
        &self.data
    }
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }
    pub fn line_num(&self) -> Option<usize> {
        self.line_num
    }

    /// Replaces the labels with the cleaner's output and reports a warning
    /// when that dropped anything.
    pub fn clean(&mut self, cleaner: &dyn Cleaner) -> Option<ParseWarning> {
        let cleaned = cleaner.clean(&self.labels);
        let dropped = cleaned.len() < self.labels.len();
        self.labels = cleaned;
        dropped.then(|| ParseWarning {
            filename: self.data.filename().to_owned(),
            line_num: self.line_num,
            message: cleaner.message().to_owned(),
        })
    }

    pub fn create_data(&self, project: ProjectId) -> NewExample {
        self.data.create(project, &self.meta)
    }

    pub fn create_label_type(&self, project: ProjectId) -> Vec<NewLabelType> {
        self.labels
            .iter()
            .filter_map(|label| label.create_type(project))
            .collect()
    }

    pub fn create_label(
        &self,
        user: UserId,
        example: ExampleId,
        mapping: &LabelTypeMapping,
        label_class: Option<LabelClass>,
        spans: Option<&SpanIdentityMap>,
    ) -> Result<Vec<NewLabel>> {
        self.labels
            .iter()
            .filter(|label| label_class.is_none_or(|class| label.class() == class))
            .map(|label| label.create(user, example, mapping, spans))
            .collect()
    }

    pub fn select_label(&self, label_class: LabelClass) -> Vec<&Label> {
        self.labels
            .iter()
            .filter(|label| label.class() == label_class)
            .collect()
    }

    /// The named labels rendered as plain data.
    pub fn label(&self) -> Vec<Value> {
        self.labels
            .iter()
            .filter(|label| label.name().is_some_and(|name| !name.is_empty()))
            .map(Label::to_value)
            .collect()
    }
}
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let labels: Vec<String> = self.labels.iter().map(|label| label.to_string()).collect();
        write!(f, "{}\t[{}]", self.data, labels.join(", "))
    }
}

//! Per-record cleaning rules.
//!
//! A [`Cleaner`] returns a filtered copy of a record's labels; it never
//! adds labels. When a record loses labels the record reports a
//! [`ParseWarning`], which is collected and shown to the user but does not
//! stop the record from being committed.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::label::{Label, SpanLabel};

pub trait Cleaner {
    fn clean(&self, labels: &[Label]) -> Vec<Label>;
    fn message(&self) -> &str;
}

/// Keeps every label.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;
impl Cleaner for PassThrough {
    fn clean(&self, labels: &[Label]) -> Vec<Label> {
        labels.to_vec()
    }
    fn message(&self) -> &str {
        ""
    }
}

/// Drops spans overlapping an earlier kept span, unless the project allows
/// overlapping spans. Other labels pass through.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanCleaner {
    allow_overlapping: bool,
}
impl SpanCleaner {
    pub fn new(allow_overlapping: bool) -> Self {
        Self { allow_overlapping }
    }
}
impl Cleaner for SpanCleaner {
    fn clean(&self, labels: &[Label]) -> Vec<Label> {
        if self.allow_overlapping {
            return labels.to_vec();
        }
        let mut spans: Vec<&SpanLabel> = labels.iter().filter_map(Label::as_span).collect();
        spans.sort_by_key(|span| span.start_offset());
        let mut last_end: Option<usize> = None;
        let mut kept = HashSet::new();
        for span in spans {
            if last_end.is_none_or(|end| span.start_offset() >= end) {
                last_end = Some(span.end_offset());
                kept.insert(span.uuid());
            }
        }
        labels
            .iter()
            .filter(|label| match label {
                Label::Span(span) => kept.contains(&span.uuid()),
                _ => true,
            })
            .cloned()
            .collect()
    }
    fn message(&self) -> &str {
        "This project does not allow overlapping spans. Overlapping spans in your file were skipped."
    }
}

/// In single-class projects only the first category of a record is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryCleaner {
    exclusive: bool,
}
impl CategoryCleaner {
    pub fn new(exclusive: bool) -> Self {
        Self { exclusive }
    }
}
impl Cleaner for CategoryCleaner {
    fn clean(&self, labels: &[Label]) -> Vec<Label> {
        if !self.exclusive {
            return labels.to_vec();
        }
        let mut seen_category = false;
        labels
            .iter()
            .filter(|label| match label {
                Label::Category(_) if seen_category => false,
                Label::Category(_) => {
                    seen_category = true;
                    true
                }
                _ => true,
            })
            .cloned()
            .collect()
    }
    fn message(&self) -> &str {
        "This project allows only one category per example. The other categories were dropped."
    }
}

// ------------- Warnings -------------
/// Labels were dropped from a record while cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub filename: String,
    pub line_num: Option<usize>,
    pub message: String,
}
impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line_num {
            Some(line) => write!(f, "{}, line {}: {}", self.filename, line, self.message),
            None => write!(f, "{}: {}", self.filename, self.message),
        }
    }
}
impl std::error::Error for ParseWarning {}

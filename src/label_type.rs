//! Label-type derivation and lookup.
//!
//! Before any label can be persisted, the label types implied by a batch
//! are derived from its records, bucketed per kind and inserted with
//! conflicts on `(project, kind, text)` ignored. Labels then resolve their
//! names through a [`LabelTypeMapping`] that is read back from the store, so
//! it also reflects types written by earlier or concurrent batches.

use core::hash::BuildHasherDefault;
use std::collections::HashMap;

use seahash::SeaHasher;
use tracing::debug;

use crate::error::{CommitError, Result};
use crate::label::{LabelTypeId, LabelTypeKind, ProjectId};
use crate::persist::Persistor;
use crate::record::Record;

// names are short strings, so a fast non-cryptographic hasher is enough
pub type NameHasher = BuildHasherDefault<SeaHasher>;

pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// An unsaved label type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewLabelType {
    pub project: ProjectId,
    pub kind: LabelTypeKind,
    pub text: String,
    pub background_color: String,
    pub text_color: String,
}
impl NewLabelType {
    pub fn new(project: ProjectId, kind: LabelTypeKind, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            project,
            kind,
            background_color: background_color(&text),
            text,
            text_color: DEFAULT_TEXT_COLOR.to_owned(),
        }
    }
}

/// A stable `#rrggbb` colour for a label type name.
pub fn background_color(text: &str) -> String {
    format!("#{:06x}", seahash::hash(text.as_bytes()) & 0x00ff_ffff)
}

// ------------- Derivation -------------
/// The label types implied by a batch, one bucket per kind.
#[derive(Debug, Default)]
pub struct LabelTypeBuckets {
    categories: Vec<NewLabelType>,
    spans: Vec<NewLabelType>,
    relations: Vec<NewLabelType>,
}
impl LabelTypeBuckets {
    pub fn from_records(records: &[Record], project: ProjectId) -> Self {
        let mut buckets = Self::default();
        for label_type in records
            .iter()
            .flat_map(|record| record.create_label_type(project))
        {
            buckets.push(label_type);
        }
        buckets
    }
    pub fn push(&mut self, label_type: NewLabelType) {
        match label_type.kind {
            LabelTypeKind::Category => self.categories.push(label_type),
            LabelTypeKind::Span => self.spans.push(label_type),
            LabelTypeKind::Relation => self.relations.push(label_type),
        }
    }
    pub fn bucket(&self, kind: LabelTypeKind) -> &[NewLabelType] {
        match kind {
            LabelTypeKind::Category => &self.categories,
            LabelTypeKind::Span => &self.spans,
            LabelTypeKind::Relation => &self.relations,
        }
    }
    pub fn len(&self) -> usize {
        self.categories.len() + self.spans.len() + self.relations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// One insert-or-ignore bulk insert per non-empty bucket. Returns the
    /// number of label types that did not exist before.
    pub fn persist(&self, persistor: &Persistor) -> Result<usize> {
        let mut inserted = 0;
        for kind in LabelTypeKind::ALL {
            let bucket = self.bucket(kind);
            if bucket.is_empty() {
                continue;
            }
            let added = persistor.add_label_types_ignoring_conflicts(bucket)?;
            debug!(%kind, implied = bucket.len(), added, "label types persisted");
            inserted += added;
        }
        Ok(inserted)
    }
}

// ------------- Mapping -------------
/// Label type name to identity, for one kind within one project.
#[derive(Debug, Clone, Default)]
pub struct LabelTypeMapping {
    kind: Option<LabelTypeKind>,
    ids: HashMap<String, LabelTypeId, NameHasher>,
}
impl LabelTypeMapping {
    /// A mapping that resolves nothing, for batches whose labels carry no type.
    pub fn empty() -> Self {
        Self::default()
    }
    pub fn load(persistor: &Persistor, project: ProjectId, kind: LabelTypeKind) -> Result<Self> {
        let mut ids = HashMap::default();
        for label_type in persistor.label_types(project, kind)? {
            ids.insert(label_type.text, label_type.id);
        }
        debug!(%kind, project, size = ids.len(), "label type mapping built");
        Ok(Self {
            kind: Some(kind),
            ids,
        })
    }
    pub fn kind(&self) -> Option<LabelTypeKind> {
        self.kind
    }
    pub fn get(&self, name: &str) -> Option<LabelTypeId> {
        self.ids.get(name).copied()
    }
    pub fn resolve(&self, kind: LabelTypeKind, name: &str) -> Result<LabelTypeId> {
        if self.kind != Some(kind) {
            return Err(CommitError::Invariant(format!(
                "{} label '{}' resolved against a {} mapping",
                kind,
                name,
                self.kind.map_or("empty", |k| k.as_str())
            )));
        }
        self.get(name).ok_or_else(|| CommitError::UnknownLabelType {
            kind,
            name: name.to_owned(),
        })
    }
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

//! Transient to durable span identities.
//!
//! Relation labels point at spans by uuid. The uuid is copied verbatim into
//! the durable span row, so once a batch's spans are inserted they can be
//! read back by uuid and every relation endpoint resolves through one
//! explicit table.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{CommitError, Result};
use crate::label::{SpanId, SpanLabel};
use crate::persist::SpanRow;

#[derive(Debug, Default)]
pub struct SpanIdentityMap {
    durable: HashMap<Uuid, SpanId>,
}
impl SpanIdentityMap {
    /// Pairs every original span of the batch with the durable row sharing
    /// its uuid. An original span without a durable row means the insert
    /// and the read-back disagree.
    pub fn build(originals: &[&SpanLabel], persisted: &[SpanRow]) -> Result<Self> {
        let by_uuid: HashMap<Uuid, SpanId> =
            persisted.iter().map(|span| (span.uuid, span.id)).collect();
        let mut durable = HashMap::with_capacity(originals.len());
        for original in originals {
            let id = by_uuid.get(&original.uuid()).ok_or_else(|| {
                CommitError::Invariant(format!(
                    "span {} was inserted but could not be read back",
                    original.uuid()
                ))
            })?;
            durable.insert(original.uuid(), *id);
        }
        Ok(Self { durable })
    }
    pub fn get(&self, uuid: &Uuid) -> Option<SpanId> {
        self.durable.get(uuid).copied()
    }
    pub fn resolve(&self, uuid: Uuid, type_name: &str) -> Result<SpanId> {
        self.get(&uuid).ok_or_else(|| CommitError::UnresolvedSpan {
            uuid,
            type_name: type_name.to_owned(),
        })
    }
    pub fn len(&self) -> usize {
        self.durable.len()
    }
    pub fn is_empty(&self) -> bool {
        self.durable.is_empty()
    }
}

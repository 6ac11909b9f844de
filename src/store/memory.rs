use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, RecordFilter, ReferenceLookup, StoredRecord};
use crate::core::{StoreError, StoreResult};
use crate::models::EntityKind;
use crate::numbering::compare_references;
use crate::pagination::Page;

/// Process-local store. Enforces the same `(kind, reference)` uniqueness
/// as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, BTreeMap<Uuid, StoredRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn reference_taken(
    table: &BTreeMap<Uuid, StoredRecord>,
    record: &StoredRecord,
) -> Option<String> {
    let reference = record.index.reference.as_deref()?;
    table
        .values()
        .filter(|existing| existing.id != record.id)
        .any(|existing| existing.index.reference.as_deref() == Some(reference))
        .then(|| reference.to_string())
}

#[async_trait]
impl ReferenceLookup for MemoryStore {
    async fn last_reference(&self, kind: EntityKind, prefix: &str) -> StoreResult<Option<String>> {
        let tables = self.tables.read().await;
        let last = tables.get(&kind).and_then(|table| {
            table
                .values()
                .filter_map(|record| record.index.reference.as_deref())
                .filter(|reference| reference.starts_with(prefix))
                .max_by(|left, right| compare_references(left, right))
                .map(str::to_string)
        });
        Ok(last)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, record: StoredRecord) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(record.kind).or_default();

        if table.contains_key(&record.id) {
            return Err(StoreError::DuplicateId {
                kind: record.kind,
                id: record.id,
            });
        }
        if let Some(reference) = reference_taken(table, &record) {
            return Err(StoreError::DuplicateReference {
                kind: record.kind,
                reference,
            });
        }

        table.insert(record.id, record);
        Ok(())
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).and_then(|table| table.get(&id)).cloned())
    }

    async fn replace(&self, record: StoredRecord) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&record.kind) else {
            return Ok(false);
        };
        if !table.contains_key(&record.id) {
            return Ok(false);
        }
        if let Some(reference) = reference_taken(table, &record) {
            return Err(StoreError::DuplicateReference {
                kind: record.kind,
                reference,
            });
        }

        table.insert(record.id, record);
        Ok(true)
    }

    async fn remove(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(&kind)
            .and_then(|table| table.remove(&id))
            .is_some())
    }

    async fn list(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        page: Page,
    ) -> StoreResult<Vec<StoredRecord>> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&kind) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<&StoredRecord> = table
            .values()
            .filter(|record| filter.matches(&record.index))
            .collect();
        matches.sort_by_key(|record| (Reverse(record.created_at), Reverse(record.id)));

        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(page.take).unwrap_or(usize::MAX);
        Ok(matches.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn count(&self, kind: EntityKind, filter: &RecordFilter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        let count = tables.get(&kind).map_or(0, |table| {
            table
                .values()
                .filter(|record| filter.matches(&record.index))
                .count()
        });
        Ok(count as u64)
    }
}

//! Persistence behind the handlers.
//!
//! Records of every kind share one shape: a JSON body plus the filterable
//! columns of [`RecordIndex`]. [`DocumentStore`] is the injected capability;
//! [`Collection`] is the typed view used by the service layer.

pub mod memory;
pub mod postgres;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::core::{StoreError, StoreResult};
use crate::models::{Entity, EntityKind, RecordIndex};
use crate::pagination::Page;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: EntityKind,
    pub id: Uuid,
    pub index: RecordIndex,
    pub body: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn from_entity<E: Entity>(entity: &E) -> StoreResult<Self> {
        Ok(Self {
            kind: E::KIND,
            id: entity.id(),
            index: entity.index(),
            body: serde_json::to_value(entity)?,
            created_at: entity.created_at(),
            updated_at: entity.updated_at(),
        })
    }

    pub fn into_entity<E: Entity>(self) -> StoreResult<E> {
        let (kind, id) = (self.kind, self.id);
        serde_json::from_value(self.body).map_err(|err| StoreError::Corrupt {
            kind,
            id,
            message: err.to_string(),
        })
    }
}

/// Conjunction of optional equality filters plus a substring search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub statut: Option<String>,
    pub client_id: Option<Uuid>,
    pub technicien_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn by_client(client_id: Uuid) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn by_technicien(technicien_id: Uuid) -> Self {
        Self {
            technicien_id: Some(technicien_id),
            ..Self::default()
        }
    }

    pub fn by_mission(mission_id: Uuid) -> Self {
        Self {
            mission_id: Some(mission_id),
            ..Self::default()
        }
    }

    /// Search term lowercased and trimmed; blank terms are ignored.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
    }

    pub fn matches(&self, index: &RecordIndex) -> bool {
        if let Some(statut) = self.statut.as_deref()
            && index.statut.as_deref() != Some(statut)
        {
            return false;
        }
        if self.client_id.is_some() && index.client_id != self.client_id {
            return false;
        }
        if self.technicien_id.is_some() && index.technicien_id != self.technicien_id {
            return false;
        }
        if self.mission_id.is_some() && index.mission_id != self.mission_id {
            return false;
        }
        match self.search_term() {
            Some(term) => index.search.contains(&term),
            None => true,
        }
    }
}

/// Prefix lookup used by sequential numbering.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Highest reference of `kind` starting with `prefix`, ordered by
    /// [`crate::numbering::compare_references`].
    async fn last_reference(&self, kind: EntityKind, prefix: &str) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait DocumentStore: ReferenceLookup {
    async fn init(&self) -> StoreResult<()>;

    /// Fails with [`StoreError::DuplicateReference`] when the reference is taken.
    async fn insert(&self, record: StoredRecord) -> StoreResult<()>;

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<StoredRecord>>;

    /// Returns `false` when no record with that id exists.
    async fn replace(&self, record: StoredRecord) -> StoreResult<bool>;

    async fn remove(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool>;

    /// Newest first, windowed by `page`.
    async fn list(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        page: Page,
    ) -> StoreResult<Vec<StoredRecord>>;

    async fn count(&self, kind: EntityKind, filter: &RecordFilter) -> StoreResult<u64>;
}

/// Typed access to the records of one entity kind.
pub struct Collection<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Collection<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn insert(&self, entity: &E) -> StoreResult<()> {
        self.store.insert(StoredRecord::from_entity(entity)?).await
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<E>> {
        self.store
            .fetch(E::KIND, id)
            .await?
            .map(StoredRecord::into_entity)
            .transpose()
    }

    pub async fn replace(&self, entity: &E) -> StoreResult<bool> {
        self.store.replace(StoredRecord::from_entity(entity)?).await
    }

    pub async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        self.store.remove(E::KIND, id).await
    }

    pub async fn count(&self, filter: &RecordFilter) -> StoreResult<u64> {
        self.store.count(E::KIND, filter).await
    }

    /// One page of matches plus the total match count.
    pub async fn list(&self, filter: &RecordFilter, page: Page) -> StoreResult<(Vec<E>, u64)> {
        let (records, total) = futures::try_join!(
            self.store.list(E::KIND, filter, page),
            self.store.count(E::KIND, filter),
        )?;

        let items = records
            .into_iter()
            .map(StoredRecord::into_entity)
            .collect::<StoreResult<Vec<E>>>()?;
        Ok((items, total))
    }
}

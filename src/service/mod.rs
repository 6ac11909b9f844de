//! Domain operations behind the HTTP handlers: validation, cross-record
//! checks and numbered document creation.

mod billing;
mod error;
mod missions;
mod parties;
mod rapports;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::StoreError;
use crate::models::Entity;
use crate::numbering::{DocumentKind, NumberGenerator, Reference};
use crate::pagination::{Page, PageMeta};
use crate::store::{Collection, DocumentStore, RecordFilter};

pub use error::{ServiceError, ServiceResult};

pub const DEFAULT_REFERENCE_ATTEMPTS: u32 = 3;

/// One page of records with its pagination metadata.
#[derive(Debug, Clone)]
pub struct Listing<E> {
    pub items: Vec<E>,
    pub meta: PageMeta,
}

pub struct FieldService {
    store: Arc<dyn DocumentStore>,
    numbers: NumberGenerator,
    reference_attempts: u32,
    /// Held while a devis/facture link is read and rewritten.
    invoicing: Mutex<()>,
}

impl FieldService {
    pub fn new(store: Arc<dyn DocumentStore>, numbers: NumberGenerator) -> Self {
        Self {
            store,
            numbers,
            reference_attempts: DEFAULT_REFERENCE_ATTEMPTS,
            invoicing: Mutex::new(()),
        }
    }

    /// Total insert attempts for a numbered document before a reference
    /// collision is reported as a conflict. Clamped to at least one.
    pub fn with_reference_attempts(mut self, attempts: u32) -> Self {
        self.reference_attempts = attempts.max(1);
        self
    }

    pub fn collection<E: Entity>(&self) -> Collection<E> {
        Collection::new(Arc::clone(&self.store))
    }

    pub async fn get<E: Entity>(&self, id: Uuid) -> ServiceResult<E> {
        self.collection::<E>()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(E::KIND.as_str(), id))
    }

    pub async fn list<E: Entity>(&self, filter: &RecordFilter, page: Page) -> ServiceResult<Listing<E>> {
        let (items, total) = self.collection::<E>().list(filter, page).await?;
        Ok(Listing {
            items,
            meta: page.summarize(total),
        })
    }

    /// Fails with a validation error when a referenced record is missing.
    async fn require<E: Entity>(&self, field: &str, id: Uuid) -> ServiceResult<E> {
        self.collection::<E>().get(id).await?.ok_or_else(|| {
            ServiceError::validation(format!("{field} refers to unknown {} {id}", E::KIND))
        })
    }

    async fn save<E: Entity>(&self, entity: &E) -> ServiceResult<()> {
        if self.collection::<E>().replace(entity).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(E::KIND.as_str(), entity.id()))
        }
    }

    async fn remove<E: Entity>(&self, id: Uuid) -> ServiceResult<()> {
        if self.collection::<E>().remove(id).await? {
            info!(kind = %E::KIND, %id, "record deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found(E::KIND.as_str(), id))
        }
    }

    /// Conflict when any `D` record matches `filter`.
    async fn ensure_unreferenced<D: Entity>(
        &self,
        filter: &RecordFilter,
        owner: &str,
    ) -> ServiceResult<()> {
        let count = self.collection::<D>().count(filter).await?;
        if count > 0 {
            return Err(ServiceError::conflict(format!(
                "{owner} is still referenced by {count} {}",
                D::KIND
            )));
        }
        Ok(())
    }

    /// Generates a reference, builds the document and inserts it, regenerating
    /// when the store reports the reference as already taken.
    async fn insert_numbered<E, F>(&self, kind: DocumentKind, build: F) -> ServiceResult<E>
    where
        E: Entity,
        F: Fn(Reference, DateTime<Utc>) -> E,
    {
        let collection = self.collection::<E>();
        let mut attempt = 1;

        loop {
            let reference = self.numbers.generate(kind).await?;
            let entity = build(reference, Utc::now());

            match collection.insert(&entity).await {
                Ok(()) => {
                    info!(kind = %kind, id = %entity.id(), attempt, "numbered document created");
                    return Ok(entity);
                }
                Err(StoreError::DuplicateReference { reference, .. })
                    if attempt < self.reference_attempts =>
                {
                    warn!(kind = %kind, %reference, attempt, "reference already taken, regenerating");
                    attempt += 1;
                }
                Err(StoreError::DuplicateReference { reference, .. }) => {
                    return Err(ServiceError::conflict(format!(
                        "could not allocate a unique {kind} reference (last tried {reference})"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{DocumentStore, RecordFilter, ReferenceLookup, StoredRecord};
use crate::core::{StoreError, StoreResult};
use crate::models::{EntityKind, RecordIndex};
use crate::pagination::Page;

const UNIQUE_VIOLATION: &str = "23505";
const PRIMARY_KEY_CONSTRAINT: &str = "documents_pkey";

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        reference,
        client_id,
        technicien_id,
        mission_id,
        statut,
        search,
        body,
        created_at,
        updated_at
    FROM documents
    WHERE kind = "#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    reference: Option<String>,
    client_id: Option<Uuid>,
    technicien_id: Option<Uuid>,
    mission_id: Option<Uuid>,
    statut: Option<String>,
    search: String,
    body: Json<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_record(self, kind: EntityKind) -> StoredRecord {
        StoredRecord {
            kind,
            id: self.id,
            index: RecordIndex {
                reference: self.reference,
                client_id: self.client_id,
                technicien_id: self.technicien_id,
                mission_id: self.mission_id,
                statut: self.statut,
                search: self.search,
            },
            body: self.body.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl ReferenceLookup for PgStore {
    async fn last_reference(&self, kind: EntityKind, prefix: &str) -> StoreResult<Option<String>> {
        let last = sqlx::query_scalar::<_, String>(
            r#"
            SELECT reference
            FROM documents
            WHERE kind = $1
              AND reference IS NOT NULL
              AND left(reference, char_length($2)) = $2
            ORDER BY char_length(reference) DESC, reference COLLATE "C" DESC
            LIMIT 1
            "#,
        )
        .bind(kind.as_str())
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn init(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("document schema is up to date");
        Ok(())
    }

    async fn insert(&self, record: StoredRecord) -> StoreResult<()> {
        let (kind, id, reference) = (record.kind, record.id, record.index.reference.clone());

        sqlx::query(
            r#"
            INSERT INTO documents (
                kind, id, reference, client_id, technicien_id, mission_id,
                statut, search, body, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.kind.as_str())
        .bind(record.id)
        .bind(record.index.reference)
        .bind(record.index.client_id)
        .bind(record.index.technicien_id)
        .bind(record.index.mission_id)
        .bind(record.index.statut)
        .bind(record.index.search)
        .bind(Json(record.body))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_unique_violation(err, kind, id, reference))?;

        Ok(())
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<StoredRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push_bind(kind.as_str());
        builder.push(" AND id = ").push_bind(id);

        let row = builder
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.into_record(kind)))
    }

    async fn replace(&self, record: StoredRecord) -> StoreResult<bool> {
        let (kind, id, reference) = (record.kind, record.id, record.index.reference.clone());

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET reference = $3,
                client_id = $4,
                technicien_id = $5,
                mission_id = $6,
                statut = $7,
                search = $8,
                body = $9,
                updated_at = $10
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(record.kind.as_str())
        .bind(record.id)
        .bind(record.index.reference)
        .bind(record.index.client_id)
        .bind(record.index.technicien_id)
        .bind(record.index.mission_id)
        .bind(record.index.statut)
        .bind(record.index.search)
        .bind(Json(record.body))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_unique_violation(err, kind, id, reference))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        page: Page,
    ) -> StoreResult<Vec<StoredRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push_bind(kind.as_str());
        push_filters(&mut builder, filter);

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::try_from(page.take).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.skip).unwrap_or(i64::MAX));

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_record(kind)).collect())
    }

    async fn count(&self, kind: EntityKind, filter: &RecordFilter) -> StoreResult<u64> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*)::BIGINT FROM documents WHERE kind = ");
        builder.push_bind(kind.as_str());
        push_filters(&mut builder, filter);

        let (total,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    if let Some(statut) = filter.statut.clone() {
        builder.push(" AND statut = ").push_bind(statut);
    }
    if let Some(client_id) = filter.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(technicien_id) = filter.technicien_id {
        builder.push(" AND technicien_id = ").push_bind(technicien_id);
    }
    if let Some(mission_id) = filter.mission_id {
        builder.push(" AND mission_id = ").push_bind(mission_id);
    }
    if let Some(term) = filter.search_term() {
        builder
            .push(" AND search LIKE ")
            .push_bind(format!("%{}%", escape_like(&term)));
    }
}

/// Escapes LIKE metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn map_unique_violation(
    err: sqlx::Error,
    kind: EntityKind,
    id: Uuid,
    reference: Option<String>,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
    {
        return match (db_err.constraint(), reference) {
            (Some(PRIMARY_KEY_CONSTRAINT), _) | (_, None) => StoreError::DuplicateId { kind, id },
            (_, Some(reference)) => StoreError::DuplicateReference { kind, reference },
        };
    }
    err.into()
}

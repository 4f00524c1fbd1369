//! Postgres-backed document store.
//!
//! All collections share one `documents` table keyed by
//! `(collection, id)`; the record itself lives in a JSONB `body`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |
//!
//! Inside [`PgLedger::commit_adjustment`], any failure after the item row is
//! locked is reported as `CommitFailed`; the transaction is rolled back.

use std::marker::PhantomData;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use outpost_auth::UserRecord;
use outpost_inventory::{InventoryItem, ProtocolLogEntry, StockAdjustment, StockChange};

use super::{Collection, Document, ListOrder, Mutation, StockLedger, StoreError, UserStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT        NOT NULL,
    id          UUID        NOT NULL,
    seq         BIGSERIAL,
    unique_key  TEXT,
    created_at  TIMESTAMPTZ NOT NULL,
    body        JSONB       NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE UNIQUE INDEX IF NOT EXISTS documents_unique_key
    ON documents (collection, unique_key) WHERE unique_key IS NOT NULL;
CREATE INDEX IF NOT EXISTS documents_created
    ON documents (collection, created_at, seq);
"#;

/// Connection pool plus schema bootstrap.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `documents` table and its indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collections
// ─────────────────────────────────────────────────────────────────────────────

/// One collection in the shared `documents` table.
pub struct PgCollection<D> {
    pool: PgPool,
    _doc: PhantomData<fn() -> D>,
}

impl<D> PgCollection<D> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _doc: PhantomData,
        }
    }
}

impl<D> Clone for PgCollection<D> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

fn decode<D: Document>(row: &PgRow) -> Result<D, StoreError> {
    row.try_get::<Json<D>, _>("body")
        .map(|Json(doc)| doc)
        .map_err(|e| StoreError::backend(format!("failed to decode {}: {e}", D::KIND)))
}

async fn lock_row<D: Document>(
    tx: &mut Transaction<'_, Postgres>,
    id: D::Id,
) -> Result<Option<D>, StoreError> {
    let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE")
        .bind(D::COLLECTION)
        .bind(Into::<Uuid>::into(id))
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_row", e))?;
    row.as_ref().map(decode::<D>).transpose()
}

async fn write_body<D: Document>(
    tx: &mut Transaction<'_, Postgres>,
    doc: &D,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE documents SET body = $3, unique_key = $4 WHERE collection = $1 AND id = $2",
    )
    .bind(D::COLLECTION)
    .bind(Into::<Uuid>::into(doc.id()))
    .bind(Json(doc))
    .bind(doc.unique_key())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_doc<'e, D, E>(executor: E, doc: &'e D) -> Result<(), sqlx::Error>
where
    D: Document,
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, unique_key, created_at, body)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(D::COLLECTION)
    .bind(Into::<Uuid>::into(doc.id()))
    .bind(doc.unique_key())
    .bind(doc.created_at())
    .bind(Json(doc))
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl<D: Document> Collection<D> for PgCollection<D> {
    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn list(&self, order: ListOrder, limit: usize) -> Result<Vec<D>, StoreError> {
        let sql = match order {
            ListOrder::Oldest => {
                r#"
                SELECT body FROM documents
                WHERE collection = $1
                ORDER BY created_at ASC, seq ASC
                LIMIT $2
                "#
            }
            ListOrder::Newest => {
                r#"
                SELECT body FROM documents
                WHERE collection = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
                "#
            }
        };
        let rows = sqlx::query(sql)
            .bind(D::COLLECTION)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        rows.iter().map(decode::<D>).collect()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(Into::<Uuid>::into(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(decode::<D>).transpose()
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, id = %doc.id()), err)]
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        insert_doc(&self.pool, &doc)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(doc)
    }

    #[instrument(skip(self, mutate), fields(collection = D::COLLECTION), err)]
    async fn update(&self, id: D::Id, mutate: Mutation<D>) -> Result<D, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Dropping `tx` on an early return rolls it back.
        let mut doc = lock_row::<D>(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound(D::KIND))?;
        mutate(&mut doc)?;

        write_body(&mut tx, &doc)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(doc)
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn delete(&self, id: D::Id) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(Into::<Uuid>::into(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl UserStore for PgCollection<UserRecord> {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND unique_key = $2",
        )
        .bind(UserRecord::COLLECTION)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.as_ref().map(decode::<UserRecord>).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// Stock ledger running each adjustment in one transaction.
///
/// The item row is locked with `FOR UPDATE`, so concurrent adjustments of
/// the same item serialize and each one decides against committed stock.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StockLedger for PgLedger {
    #[instrument(
        skip(self, adjustment),
        fields(item_id = %adjustment.item_id, delta = adjustment.delta),
        err
    )]
    async fn commit_adjustment(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<StockChange, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let item = lock_row::<InventoryItem>(&mut tx, adjustment.item_id)
            .await?
            .ok_or(StoreError::NotFound(InventoryItem::KIND))?;
        let change = item.adjust_stock(&adjustment)?;

        write_body(&mut tx, &change.item)
            .await
            .map_err(|e| StoreError::CommitFailed(format!("item update: {e}")))?;
        insert_doc::<ProtocolLogEntry, _>(&mut *tx, &change.entry)
            .await
            .map_err(|e| StoreError::CommitFailed(format!("protocol insert: {e}")))?;
        tx.commit()
            .await
            .map_err(|e| StoreError::CommitFailed(format!("commit: {e}")))?;

        Ok(change)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

use async_trait::async_trait;
use common::{ItemId, OrderId, RequestId, UserId};
use domain::{
    Aggregate, CatalogItem, EventRecord, Money, Order, Request, Store, StoreError, StoreResult,
    UnitOfWork,
};
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

/// Maps sqlx errors into store errors.
///
/// Unique violations become [`StoreError::Conflict`] so callers can tell a
/// lost race from a broken connection.
trait DbResultExt<T> {
    fn db(self) -> StoreResult<T>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn db(self) -> StoreResult<T> {
        self.map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict(
                    db_err
                        .constraint()
                        .map(|c| format!("constraint {c} violated"))
                        .unwrap_or_else(|| db_err.message().to_string()),
                );
            }
            StoreError::database(e)
        })
    }
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(url).await.db()?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

fn row_to_item(row: PgRow) -> StoreResult<CatalogItem> {
    Ok(CatalogItem {
        id: ItemId::new(row.try_get::<String, _>("id").db()?),
        name: row.try_get("name").db()?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents").db()?),
        stock: row.try_get("stock").db()?,
    })
}

fn row_to_document<T: DeserializeOwned>(row: PgRow) -> StoreResult<T> {
    let document: serde_json::Value = row.try_get("document").db()?;
    Ok(serde_json::from_value(document)?)
}

fn row_to_event(row: PgRow) -> StoreResult<EventRecord> {
    Ok(EventRecord {
        aggregate_id: row.try_get("aggregate_id").db()?,
        aggregate_type: row.try_get("aggregate_type").db()?,
        event_type: row.try_get("event_type").db()?,
        version: row.try_get::<i64, _>("version").db()? as u64,
        payload: row.try_get("payload").db()?,
        recorded_at: row.try_get("recorded_at").db()?,
    })
}

#[async_trait]
impl Store for PostgresStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> StoreResult<PostgresUnitOfWork> {
        let tx = self.pool.begin().await.db()?;
        Ok(PostgresUnitOfWork { tx })
    }

    async fn get_item(&self, id: &ItemId) -> StoreResult<Option<CatalogItem>> {
        sqlx::query("SELECT id, name, unit_price_cents, stock FROM catalog_items WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(row_to_item)
            .transpose()
    }

    async fn upsert_item(&self, item: CatalogItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, name, unit_price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                unit_price_cents = EXCLUDED.unit_price_cents,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(item.unit_price.cents())
        .bind(item.stock)
        .execute(&self.pool)
        .await
        .db()?;

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(row_to_document)
            .transpose()
    }

    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM orders
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner.map(|u| u.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.into_iter().map(row_to_document).collect()
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<Request>> {
        sqlx::query("SELECT document FROM requests WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(row_to_document)
            .transpose()
    }

    async fn list_requests(&self, owner: Option<UserId>) -> StoreResult<Vec<Request>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM requests
            WHERE NOT deleted AND ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner.map(|u| u.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.into_iter().map(row_to_document).collect()
    }

    async fn events_for(&self, aggregate_id: Uuid) -> StoreResult<Vec<EventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT aggregate_id, aggregate_type, event_type, version, payload, recorded_at
            FROM events
            WHERE aggregate_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.into_iter().map(row_to_event).collect()
    }
}

/// Unit of work backed by one database transaction.
///
/// Row locks taken with `FOR UPDATE` are held until the transaction ends.
/// Dropping the unit of work rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_items(&mut self, ids: &[ItemId]) -> StoreResult<Vec<CatalogItem>> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        // Byte-order collation keeps the lock order identical to ItemId's Ord
        let rows = sqlx::query(
            r#"
            SELECT id, name, unit_price_cents, stock
            FROM catalog_items
            WHERE id = ANY($1)
            ORDER BY id COLLATE "C"
            FOR UPDATE
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .db()?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn decrement_stock(&mut self, id: &ItemId, quantity: u32) -> StoreResult<Option<i64>> {
        sqlx::query_scalar(
            r#"
            UPDATE catalog_items
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&mut *self.tx)
        .await
        .db()
    }

    async fn lock_order(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        sqlx::query("SELECT document FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .db()?
            .map(row_to_document)
            .transpose()
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, approval_status, fulfillment_status, payment_status,
                                stock_reserved, total_cents, version, created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.approval_status().as_str())
        .bind(order.fulfillment_status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.stock_reserved())
        .bind(order.total_amount().cents())
        .bind(order.version() as i64)
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(serde_json::to_value(order)?)
        .execute(&mut *self.tx)
        .await
        .db()?;

        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                approval_status = $2,
                fulfillment_status = $3,
                payment_status = $4,
                stock_reserved = $5,
                version = $6,
                updated_at = $7,
                document = $8
            WHERE id = $1
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.approval_status().as_str())
        .bind(order.fulfillment_status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.stock_reserved())
        .bind(order.version() as i64)
        .bind(order.updated_at())
        .bind(serde_json::to_value(order)?)
        .execute(&mut *self.tx)
        .await
        .db()?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRecord {
                entity: "order",
                id: order.id().to_string(),
            });
        }
        Ok(())
    }

    async fn active_request_for_order(
        &mut self,
        order_id: OrderId,
    ) -> StoreResult<Option<Request>> {
        sqlx::query("SELECT document FROM requests WHERE order_id = $1 AND NOT deleted")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .db()?
            .map(row_to_document)
            .transpose()
    }

    async fn lock_request(&mut self, id: RequestId) -> StoreResult<Option<Request>> {
        sqlx::query("SELECT document FROM requests WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .db()?
            .map(row_to_document)
            .transpose()
    }

    async fn insert_request(&mut self, request: &Request) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO requests (id, order_id, user_id, kind, status, deleted, version,
                                  created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.order_id().as_uuid())
        .bind(request.user_id().as_uuid())
        .bind(request.kind().as_str())
        .bind(request.status().as_str())
        .bind(request.is_deleted())
        .bind(request.version() as i64)
        .bind(request.created_at())
        .bind(request.updated_at())
        .bind(serde_json::to_value(request)?)
        .execute(&mut *self.tx)
        .await
        .db()?;

        Ok(())
    }

    async fn update_request(&mut self, request: &Request) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE requests SET
                status = $2,
                deleted = $3,
                version = $4,
                updated_at = $5,
                document = $6
            WHERE id = $1
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.status().as_str())
        .bind(request.is_deleted())
        .bind(request.version() as i64)
        .bind(request.updated_at())
        .bind(serde_json::to_value(request)?)
        .execute(&mut *self.tx)
        .await
        .db()?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRecord {
                entity: "request",
                id: request.id().to_string(),
            });
        }
        Ok(())
    }

    async fn append_events(&mut self, records: Vec<EventRecord>) -> StoreResult<()> {
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO events (aggregate_id, aggregate_type, event_type, version, payload, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(record.aggregate_id)
            .bind(&record.aggregate_type)
            .bind(&record.event_type)
            .bind(record.version as i64)
            .bind(&record.payload)
            .bind(record.recorded_at)
            .execute(&mut *self.tx)
            .await
            .db()?;
        }
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.db()
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.db()
    }
}

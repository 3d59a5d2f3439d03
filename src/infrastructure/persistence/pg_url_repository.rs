//! PostgreSQL implementation of the url repository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use std::sync::Arc;

use crate::domain::entities::{Destination, Url};
use crate::domain::query::UrlQuery;
use crate::domain::repositories::{StorageError, StorageResult, UrlRepository, UrlTransaction};

/// Columns of the `urls` table, aliased for the `u` relation.
const URL_COLUMNS: &str =
    "u.id, u.url_path, u.presenter, u.action, u.internal_id, u.redirect_to, u.filters, u.parameters";

/// Redirect-target columns for the self-joined `rt` relation.
const TARGET_COLUMNS: &str = "rt.id AS rt_id, rt.url_path AS rt_url_path, \
     rt.presenter AS rt_presenter, rt.action AS rt_action, \
     rt.internal_id AS rt_internal_id, rt.redirect_to AS rt_redirect_to, \
     rt.filters AS rt_filters, rt.parameters AS rt_parameters";

/// PostgreSQL repository for url storage and retrieval.
///
/// Queries are bound at runtime so no live database is needed at build
/// time; the schema lives in the crate's `migrations/` directory.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Applies the crate's embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns the underlying migration error unchanged.
    pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn begin(&self) -> StorageResult<Box<dyn UrlTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Box::new(PgUrlTransaction { tx: Some(tx) }))
    }

    async fn find_one(&self, query: UrlQuery) -> StorageResult<Option<Url>> {
        let mut builder = build_select(&query);
        builder.push(" LIMIT 1");

        let row = builder
            .build()
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        row.map(|r| url_from_row(&r, query.with_redirect_target))
            .transpose()
    }

    async fn find_many(&self, query: UrlQuery) -> StorageResult<Vec<Url>> {
        let mut builder = build_select(&query);

        let rows = builder
            .build()
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|r| url_from_row(r, query.with_redirect_target))
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Url>> {
        let row = sqlx::query(&format!(
            "SELECT {URL_COLUMNS} FROM urls u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| url_from_row(&r, false)).transpose()
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        // Referencing rows fall back to canonical via ON DELETE SET NULL.
        sqlx::query("DELETE FROM urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

/// One unit of work over a pooled connection. Dropping it without a commit
/// rolls back, which is what resets the session after a failure.
pub struct PgUrlTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUrlTransaction {
    fn tx(&mut self) -> StorageResult<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or(StorageError::SessionClosed)
    }
}

#[async_trait]
impl UrlTransaction for PgUrlTransaction {
    async fn insert(&mut self, url: &Url) -> StorageResult<Url> {
        let tx = self.tx()?;

        let row = sqlx::query(
            "INSERT INTO urls (url_path, presenter, action, internal_id, redirect_to, filters, parameters) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(url.path())
        .bind(url.presenter())
        .bind(url.action())
        .bind(url.internal_id())
        .bind(url.redirect_to_id())
        .bind(url.filters_raw())
        .bind(url.parameters_raw())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        let id: i64 = column(&row, "id")?;
        Ok(url.clone().with_id(id))
    }

    async fn update(&mut self, url: &Url) -> StorageResult<()> {
        let Some(id) = url.id() else {
            return Err(StorageError::Backend(
                "cannot flush a record without an identifier".to_string(),
            ));
        };

        let tx = self.tx()?;
        sqlx::query(
            "UPDATE urls \
             SET url_path = $2, presenter = $3, action = $4, internal_id = $5, \
                 redirect_to = $6, filters = $7, parameters = $8 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(url.path())
        .bind(url.presenter())
        .bind(url.action())
        .bind(url.internal_id())
        .bind(url.redirect_to_id())
        .bind(url.filters_raw())
        .bind(url.parameters_raw())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_redirecting_to(&mut self, target_id: i64) -> StorageResult<Vec<Url>> {
        let tx = self.tx()?;

        let rows = sqlx::query(&format!(
            "SELECT {URL_COLUMNS} FROM urls u WHERE u.redirect_to = $1"
        ))
        .bind(target_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(|r| url_from_row(r, false)).collect()
    }

    async fn set_redirect_target(&mut self, id: i64, target_id: i64) -> StorageResult<()> {
        let tx = self.tx()?;

        sqlx::query("UPDATE urls SET redirect_to = $2 WHERE id = $1")
            .bind(id)
            .bind(target_id)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn commit(&mut self) -> StorageResult<()> {
        let tx = self.tx.take().ok_or(StorageError::SessionClosed)?;
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        let tx = self.tx.take().ok_or(StorageError::SessionClosed)?;
        tx.rollback().await.map_err(map_sqlx_error)
    }
}

/// Builds the filtered SELECT for a [`UrlQuery`]. Predicates are
/// conjunctive; the eager-load flag switches in the self-join.
fn build_select(query: &UrlQuery) -> QueryBuilder<'_, Postgres> {
    let mut sql = format!("SELECT {URL_COLUMNS}");
    if query.with_redirect_target {
        sql.push_str(", ");
        sql.push_str(TARGET_COLUMNS);
    }
    sql.push_str(" FROM urls u");
    if query.with_redirect_target {
        sql.push_str(" LEFT JOIN urls rt ON rt.id = u.redirect_to");
    }

    let mut builder = QueryBuilder::new(sql);
    let mut has_where = false;

    if let Some(path) = &query.path {
        push_keyword(&mut builder, &mut has_where);
        builder.push("u.url_path = ").push_bind(path.as_str());
    }
    if let Some(presenter) = &query.presenter {
        push_keyword(&mut builder, &mut has_where);
        builder.push("u.presenter = ").push_bind(presenter.as_str());
    }
    if let Some(action) = &query.action {
        push_keyword(&mut builder, &mut has_where);
        builder.push("u.action = ").push_bind(action.as_str());
    }
    if let Some(internal_id) = &query.internal_id {
        push_keyword(&mut builder, &mut has_where);
        builder.push("u.internal_id = ").push_bind(internal_id.as_str());
    }

    builder
}

fn push_keyword(builder: &mut QueryBuilder<'_, Postgres>, has_where: &mut bool) {
    if *has_where {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_where = true;
    }
}

fn url_from_row(row: &PgRow, with_redirect_target: bool) -> StorageResult<Url> {
    let target = if with_redirect_target {
        let target_id: Option<i64> = column(row, "rt_id")?;
        match target_id {
            Some(id) => Some(Url::from_storage(
                id,
                column(row, "rt_url_path")?,
                Destination::from_storage_parts(
                    column(row, "rt_presenter")?,
                    column(row, "rt_action")?,
                ),
                column(row, "rt_internal_id")?,
                column(row, "rt_redirect_to")?,
                None,
                column(row, "rt_filters")?,
                column(row, "rt_parameters")?,
            )),
            None => None,
        }
    } else {
        None
    };

    Ok(Url::from_storage(
        column(row, "id")?,
        column(row, "url_path")?,
        Destination::from_storage_parts(column(row, "presenter")?, column(row, "action")?),
        column(row, "internal_id")?,
        column(row, "redirect_to")?,
        target,
        column(row, "filters")?,
        column(row, "parameters")?,
    ))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StorageError::Backend(e.to_string()))
}

/// Maps a driver failure onto the storage taxonomy. A unique violation on
/// the path constraint becomes the dedicated duplicate-path condition.
fn map_sqlx_error(e: sqlx::Error) -> StorageError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() && matches!(db.constraint(), Some("urls_url_path_key")) {
            return StorageError::DuplicatePath;
        }
    }

    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Connection(e.to_string())
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

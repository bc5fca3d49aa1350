//! Typed CRUD and upsert over the relational store (C2, spec.md §4.2).
//!
//! Grounded on the teacher's `StoreObject`/`StorableObject` abstraction
//! (`common/src/store/etcd.rs`, `common/src/types/v0/store/pool.rs`): the
//! repository is polymorphic over a capability set rather than any
//! particular driver, generalized here from an etcd key-builder to a SQL
//! table/column mapping (`o2ims_common::Storable`) built with
//! `sqlx::QueryBuilder`.

mod error;
mod schema;

pub use error::RepositoryError;

use futures::future::BoxFuture;
use o2ims_common::Storable;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{QueryBuilder, Row, Transaction};
use uuid::Uuid;

/// A generic repository over one [`Storable`] entity type.
pub struct PgRepository<T> {
    pool: PgPool,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> PgRepository<T>
where
    T: Storable + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _marker: std::marker::PhantomData }
    }

    /// SELECT-one by primary key. Not-found returns `None`, not an error
    /// (spec.md §4.2).
    #[tracing::instrument(skip(self), fields(table = T::TABLE))]
    pub async fn find(&self, id: Uuid) -> Result<Option<T>, RepositoryError> {
        let sql = format!("SELECT * FROM {} WHERE {} = $1", T::TABLE, T::PK_COLUMN);
        Ok(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    /// `Get`-style wrapper: translates an empty `Find` result into
    /// `RepositoryError::NotFound` (spec.md §4.2).
    pub async fn get(&self, id: Uuid) -> Result<T, RepositoryError> {
        self.find(id).await?.ok_or_else(|| RepositoryError::NotFound { resource: format!("{}({id})", T::TABLE) })
    }

    /// SELECT-all.
    #[tracing::instrument(skip(self), fields(table = T::TABLE))]
    pub async fn find_all(&self) -> Result<Vec<T>, RepositoryError> {
        let sql = format!("SELECT * FROM {}", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?)
    }

    /// `find_all`, run against an already-open transaction rather than the
    /// pool — so a reconcile pass can read rows it has itself just upserted
    /// but not yet committed (spec.md §4.3 step 3).
    pub async fn find_all_in_tx(&self, tx: &mut Transaction<'_, Postgres>) -> Result<Vec<T>, RepositoryError> {
        let sql = format!("SELECT * FROM {}", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(&mut **tx).await?)
    }

    /// SELECT-where, with the caller appending the `WHERE` clause's
    /// predicates and binds directly onto the builder (spec.md §4.2's
    /// `Search(expr)`).
    pub async fn search<F>(&self, build_where: F) -> Result<Vec<T>, RepositoryError>
    where
        F: FnOnce(&mut QueryBuilder<'_, Postgres>),
    {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE ", T::TABLE));
        build_where(&mut builder);
        Ok(builder.build_query_as::<T>().fetch_all(&self.pool).await?)
    }

    /// `search`, run against an already-open transaction.
    pub async fn search_in_tx<F>(&self, tx: &mut Transaction<'_, Postgres>, build_where: F) -> Result<Vec<T>, RepositoryError>
    where
        F: FnOnce(&mut QueryBuilder<'_, Postgres>),
    {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE ", T::TABLE));
        build_where(&mut builder);
        Ok(builder.build_query_as::<T>().fetch_all(&mut **tx).await?)
    }

    /// INSERT, returning the stored row with server-side defaults applied
    /// (spec.md §4.2).
    pub async fn create(&self, entity: &T) -> Result<T, RepositoryError> {
        let builder = Self::build_insert_query(entity);
        Ok(builder.build_query_as::<T>().fetch_one(&self.pool).await?)
    }

    /// `create`, run against an already-open transaction.
    pub async fn create_in_tx(&self, tx: &mut Transaction<'_, Postgres>, entity: &T) -> Result<T, RepositoryError> {
        let builder = Self::build_insert_query(entity);
        Ok(builder.build_query_as::<T>().fetch_one(&mut **tx).await?)
    }

    fn build_insert_query(entity: &T) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        entity.push_insert_values(&mut builder);
        builder.push(") RETURNING *");
        builder
    }

    /// UPDATE by primary key, returning the row (spec.md §4.2). Callers
    /// must re-read before a second `Update` when concurrent writers exist
    /// (spec.md §4.2 invariant).
    pub async fn update(&self, id: Uuid, entity: &T) -> Result<T, RepositoryError> {
        let builder = Self::build_update_query(id, entity);
        Ok(builder.build_query_as::<T>().fetch_one(&self.pool).await?)
    }

    /// `update`, run against an already-open transaction.
    pub async fn update_in_tx(&self, tx: &mut Transaction<'_, Postgres>, id: Uuid, entity: &T) -> Result<T, RepositoryError> {
        let builder = Self::build_update_query(id, entity);
        Ok(builder.build_query_as::<T>().fetch_one(&mut **tx).await?)
    }

    fn build_update_query(id: Uuid, entity: &T) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
        entity.push_update_assignments(&mut builder);
        builder.push(format!(" WHERE {} = ", T::PK_COLUMN)).push_bind(id);
        builder.push(" RETURNING *");
        builder
    }

    /// `INSERT … ON CONFLICT (target) DO UPDATE`, returning all affected
    /// rows (spec.md §4.2). Requires `T::CONFLICT_COLUMNS`/`T::UPDATE_COLUMNS`.
    pub async fn upsert(&self, entities: &[T]) -> Result<Vec<T>, RepositoryError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let builder = Self::build_upsert_query(entities)?;
        Ok(builder.build_query_as::<T>().fetch_all(&self.pool).await?)
    }

    /// `upsert`, run against an already-open transaction.
    pub async fn upsert_in_tx(&self, tx: &mut Transaction<'_, Postgres>, entities: &[T]) -> Result<Vec<T>, RepositoryError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let builder = Self::build_upsert_query(entities)?;
        Ok(builder.build_query_as::<T>().fetch_all(&mut **tx).await?)
    }

    /// Builds the shared `ON CONFLICT DO UPDATE SET` clause from
    /// `T::UPDATE_COLUMNS` rather than every non-conflict/non-PK column, so
    /// an upsert never overwrites a column an entity's curated update path
    /// deliberately excludes (e.g. `created_at`). The clause references
    /// `EXCLUDED.<column>`, which stays correct per-row even when the
    /// `INSERT` batches several entities in one statement.
    fn build_upsert_query(entities: &[T]) -> Result<QueryBuilder<'_, Postgres>, RepositoryError> {
        let Some(conflict_columns) = T::CONFLICT_COLUMNS else {
            return Err(RepositoryError::Conflict {
                details: format!("{} has no conflict target configured for upsert", T::TABLE),
            });
        };
        let Some(update_columns) = T::UPDATE_COLUMNS else {
            return Err(RepositoryError::Conflict {
                details: format!("{} has no update-column list configured for upsert", T::TABLE),
            });
        };

        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES ",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        for (index, entity) in entities.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push("(");
            entity.push_insert_values(&mut builder);
            builder.push(")");
        }
        builder.push(format!(" ON CONFLICT ({}) DO UPDATE SET ", conflict_columns.join(", ")));
        for (index, column) in update_columns.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(format!("{column} = EXCLUDED.{column}"));
        }
        builder.push(" RETURNING *");
        Ok(builder)
    }

    /// DELETE rows where `scope_column = scope_value` and the primary key
    /// is not in `keep` — the generation-based stale-row sweep of
    /// spec.md §4.3 step 4. Returns the affected row count.
    #[tracing::instrument(skip(self, keep), fields(table = T::TABLE, kept = keep.len()))]
    pub async fn delete_not_in(&self, scope_column: &str, scope_value: Uuid, keep: &[Uuid]) -> Result<u64, RepositoryError> {
        let builder = Self::build_delete_not_in_query(scope_column, scope_value, keep);
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// `delete_not_in`, run against an already-open transaction.
    pub async fn delete_not_in_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        scope_column: &str,
        scope_value: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, RepositoryError> {
        let builder = Self::build_delete_not_in_query(scope_column, scope_value, keep);
        let result = builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    fn build_delete_not_in_query(scope_column: &str, scope_value: Uuid, keep: &[Uuid]) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("DELETE FROM {} WHERE {scope_column} = ", T::TABLE));
        builder.push_bind(scope_value);
        if keep.is_empty() {
            // No survivors this generation: every row in scope is stale.
        } else {
            builder.push(format!(" AND {} NOT IN (", T::PK_COLUMN));
            let mut separated = builder.separated(", ");
            for id in keep {
                separated.push_bind(*id);
            }
            builder.push(")");
        }
        builder
    }

    /// Run `f` atomically: commit on `Ok`, roll back on `Err`
    /// (spec.md §4.2).
    pub async fn with_transaction<R>(
        &self,
        f: impl for<'t> FnOnce(&'t mut Transaction<'_, Postgres>) -> BoxFuture<'t, Result<R, RepositoryError>> + Send,
    ) -> Result<R, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                let _ = tx.rollback().await;
                Err(error)
            }
        }
    }
}

/// Returns the next value of `alarm_sequence_seq` (spec.md §6), exposed for
/// callers that need to mint a sequence number outside of a trigger path
/// (`o2ims-notifier`'s catch-up reconciliation).
pub async fn next_alarm_sequence(pool: &PgPool) -> Result<i64, RepositoryError> {
    let row = sqlx::query("SELECT nextval('alarm_sequence_seq') AS seq").fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>("seq")?)
}

#[cfg(test)]
mod tests {
    use o2ims_common::model::DataSource;
    use uuid::Uuid;

    use super::*;

    /// No live Postgres is assumed at test time (SPEC_FULL.md §2 ambient
    /// stack): these tests exercise the query-builder planning logic, not a
    /// live connection.
    #[test]
    fn insert_builds_expected_column_list() {
        let source = DataSource { data_source_id: Uuid::nil(), kind: "hub-cluster".into(), current_generation: 0 };
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            DataSource::TABLE,
            DataSource::COLUMNS.join(", ")
        ));
        source.push_insert_values(&mut builder);
        builder.push(") RETURNING *");
        assert!(builder.sql().starts_with("INSERT INTO data_source (data_source_id, kind, current_generation) VALUES ("));
        assert!(builder.sql().ends_with(") RETURNING *"));
    }

    #[test]
    fn delete_not_in_omits_exclusion_clause_when_keep_is_empty() {
        let mut builder = QueryBuilder::new(format!("DELETE FROM {} WHERE data_source_id = ", DataSource::TABLE));
        builder.push_bind(Uuid::nil());
        // Mirrors the empty-`keep` branch in `delete_not_in`: every row in
        // scope is stale when a run produces zero survivors.
        assert!(!builder.sql().contains("NOT IN"));
    }
}
